use crate::dprintln;
use crate::error::{Access, Fault};

/// A full 16-bit address space.
pub const MEMORY_MAX: usize = 0x10000;

/// Returned by reads that fall outside of memory.
pub const BYTE_SENTINEL: u8 = 0xFF;
pub const WORD_SENTINEL: u16 = 0xFFFF;

/// Flat, bounds checked byte memory. Words are stored big-endian.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_MAX)
    }

    /// Memory smaller than the address space. Capacity is clamped to `1..=MEMORY_MAX`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MEMORY_MAX);
        Memory {
            bytes: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn contains(&self, address: usize) -> bool {
        address < self.capacity()
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn try_read(&self, address: u16) -> Result<u8, Fault> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(Fault::MemoryOutOfRange {
                address: address as usize,
                access: Access::ReadByte,
            })
    }

    pub fn try_write(&mut self, address: u16, value: u8) -> Result<(), Fault> {
        match self.bytes.get_mut(address as usize) {
            Some(byte) => {
                *byte = value;
                Ok(())
            }
            None => Err(Fault::MemoryOutOfRange {
                address: address as usize,
                access: Access::WriteByte,
            }),
        }
    }

    pub fn try_read_word(&self, address: u16) -> Result<u16, Fault> {
        let address = address as usize;
        if address + 1 >= self.capacity() {
            return Err(Fault::MemoryOutOfRange {
                address,
                access: Access::ReadWord,
            });
        }
        Ok(u16::from_be_bytes([self.bytes[address], self.bytes[address + 1]]))
    }

    pub fn try_write_word(&mut self, address: u16, value: u16) -> Result<(), Fault> {
        let address = address as usize;
        if address + 1 >= self.capacity() {
            return Err(Fault::MemoryOutOfRange {
                address,
                access: Access::WriteWord,
            });
        }
        self.bytes[address..address + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Read a byte, or [`BYTE_SENTINEL`] if out of range.
    pub fn read_byte(&self, address: u16) -> u8 {
        self.try_read(address).unwrap_or_else(|fault| {
            dprintln!(Always, "{}", fault);
            BYTE_SENTINEL
        })
    }

    /// Write a byte. Out of range writes are dropped.
    pub fn write_byte(&mut self, address: u16, value: u8) {
        if let Err(fault) = self.try_write(address, value) {
            dprintln!(Always, "{}", fault);
        }
    }

    /// Read a big-endian word, or [`WORD_SENTINEL`] if either byte is out of range.
    pub fn read_word(&self, address: u16) -> u16 {
        self.try_read_word(address).unwrap_or_else(|fault| {
            dprintln!(Always, "{}", fault);
            WORD_SENTINEL
        })
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        if let Err(fault) = self.try_write_word(address, value) {
            dprintln!(Always, "{}", fault);
        }
    }

    /// Copy `bytes` in starting at `start`.
    ///
    /// Stops at the end of memory, returning the first address that did not fit.
    pub fn load(&mut self, bytes: &[u8], start: u16) -> Result<(), Fault> {
        let start = start as usize;
        let fits = self.capacity().saturating_sub(start).min(bytes.len());
        if fits > 0 {
            self.bytes[start..start + fits].copy_from_slice(&bytes[..fits]);
        }
        if fits < bytes.len() {
            return Err(Fault::MemoryOutOfRange {
                address: start + fits,
                access: Access::WriteByte,
            });
        }
        Ok(())
    }

    /// Hex and ASCII view of memory, 16 bytes per line.
    ///
    /// Stops early at the end of memory.
    pub fn dump(&self, start: u16, lines: usize) -> String {
        const BYTES_PER_LINE: usize = 16;
        let start = start as usize;
        let end = start
            .saturating_add(lines.saturating_mul(BYTES_PER_LINE))
            .min(self.capacity());
        let mut out = String::new();
        if start >= end {
            return out;
        }
        for (i, chunk) in self.bytes[start..end].chunks(BYTES_PER_LINE).enumerate() {
            let hex = chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&b| match b {
                    0x20..=0x7E => b as char,
                    _ => '.',
                })
                .collect();
            out.push_str(&format!(
                "{:04X}: {:<width$}  {}\n",
                start + i * BYTES_PER_LINE,
                hex,
                ascii,
                width = BYTES_PER_LINE * 3 - 1,
            ));
        }
        out
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_address_is_valid() {
        let mut mem = Memory::new();
        mem.write_byte(0xFFFF, 0xAB);
        assert_eq!(mem.try_read(0xFFFF), Ok(0xAB));
        assert_eq!(mem.read_byte(0xFFFF), 0xAB);
    }

    #[test]
    fn out_of_range_byte() {
        let mut mem = Memory::with_capacity(0x100);
        assert_eq!(mem.read_byte(0x100), BYTE_SENTINEL);
        assert_eq!(
            mem.try_read(0x1234),
            Err(Fault::MemoryOutOfRange {
                address: 0x1234,
                access: Access::ReadByte
            })
        );
        mem.write_byte(0x100, 0x12);
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn words_are_big_endian() {
        let mut mem = Memory::new();
        mem.write_word(0x0010, 0x1234);
        assert_eq!(mem.read_byte(0x0010), 0x12);
        assert_eq!(mem.read_byte(0x0011), 0x34);
        assert_eq!(mem.read_word(0x0010), 0x1234);
    }

    #[test]
    fn word_straddling_end_is_refused() {
        let mut mem = Memory::new();
        assert_eq!(mem.read_word(0xFFFF), WORD_SENTINEL);
        mem.write_word(0xFFFF, 0xBEEF);
        assert_eq!(mem.read_byte(0xFFFF), 0x00);
        assert_eq!(mem.read_word(0xFFFE), 0x0000);
    }

    #[test]
    fn load_truncates_at_capacity() {
        let mut mem = Memory::with_capacity(4);
        let result = mem.load(&[1, 2, 3], 2);
        assert_eq!(
            result,
            Err(Fault::MemoryOutOfRange {
                address: 4,
                access: Access::WriteByte
            })
        );
        assert_eq!(mem.as_slice(), &[0, 0, 1, 2]);
        assert_eq!(mem.load(&[9], 3), Ok(()));
        assert_eq!(mem.load(&[], 0x7000), Ok(()));
    }

    #[test]
    fn dump_format() {
        let mut mem = Memory::new();
        mem.load(b"Hi\x00\x7F", 0x0050).unwrap();
        let dump = mem.dump(0x0050, 1);
        assert_eq!(
            dump,
            format!("0050: 48 69 00 7F {}  Hi..{}\n", "00 ".repeat(11) + "00", ".".repeat(12))
        );
        assert_eq!(mem.dump(0xFFF8, 4).lines().count(), 1);
    }

    #[test]
    fn dump_with_huge_line_count_stops_at_end() {
        let mem = Memory::new();
        assert_eq!(mem.dump(0xFFF0, usize::MAX).lines().count(), 1);
        assert_eq!(mem.dump(0x0000, usize::MAX / 8).lines().count(), 0x1000);
    }
}
