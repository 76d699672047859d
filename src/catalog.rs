use std::fmt;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::dprintln;
use crate::error::CatalogWarning;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Descriptor shipped with the toolchain, covering every instruction the emulator executes.
pub const BUILTIN_DESCRIPTOR: &str = include_str!("instructions.txt");

/// How an instruction's operand bytes are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AddressingMode {
    None,
    /// Literal value follows the opcode
    Immediate,
    /// One byte address in page zero
    Direct,
    /// No operand
    Implied,
    /// Two byte absolute address
    Extended,
    Indexed,
    Relative,
}

impl AddressingMode {
    /// Parse a descriptor mode name. `None` for names that are not recognised.
    pub fn from_descriptor(name: &str) -> Option<Self> {
        let mode = match name {
            "-" | "NONE" => AddressingMode::None,
            "IMMEDIATE" => AddressingMode::Immediate,
            "DIRECT" => AddressingMode::Direct,
            "IMPLIED" | "ACCUMULATOR" => AddressingMode::Implied,
            "EXTENDED" => AddressingMode::Extended,
            "INDEXED" => AddressingMode::Indexed,
            "RELATIVE" => AddressingMode::Relative,
            _ => return None,
        };
        Some(mode)
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressingMode::None => "none",
            AddressingMode::Immediate => "immediate",
            AddressingMode::Direct => "direct",
            AddressingMode::Implied => "implied",
            AddressingMode::Extended => "extended",
            AddressingMode::Indexed => "indexed",
            AddressingMode::Relative => "relative",
        };
        f.write_str(name)
    }
}

/// One encoding of a mnemonic.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CatalogEntry {
    pub mnemonic: String,
    pub opcode: u8,
    /// Total encoded length including the opcode
    pub length: u8,
    pub mode: AddressingMode,
}

/// Every known (mnemonic, addressing mode) pair. Immutable once loaded.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: FxMap<(String, AddressingMode), CatalogEntry>,
    warnings: Vec<CatalogWarning>,
}

impl Catalog {
    /// Catalog from [`BUILTIN_DESCRIPTOR`].
    pub fn builtin() -> Self {
        Self::load(BUILTIN_DESCRIPTOR)
    }

    /// Load a catalog from descriptor text.
    ///
    /// Each line reads `mnemonic opcodeHex length modeName`. Blank lines and lines starting
    /// with `;` are ignored. Malformed lines are skipped with a warning, and unrecognised mode
    /// names are treated as [`AddressingMode::None`].
    pub fn load(descriptor: &str) -> Self {
        let mut catalog = Catalog::default();

        for (i, line) in descriptor.lines().enumerate() {
            let line_number = i + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[mnemonic, opcode, length, mode, ..] = fields.as_slice() else {
                catalog.warn(line_number, line, "expected `mnemonic opcode length mode`");
                continue;
            };

            let Some(opcode) = parse_opcode(opcode) else {
                catalog.warn(line_number, line, &format!("invalid opcode value '{opcode}'"));
                continue;
            };
            let Ok(length) = length.parse::<u8>() else {
                catalog.warn(line_number, line, &format!("invalid length '{length}'"));
                continue;
            };
            let mode = match AddressingMode::from_descriptor(mode) {
                Some(mode) => mode,
                None => {
                    catalog.warn(
                        line_number,
                        line,
                        &format!("unrecognised addressing mode '{mode}', using NONE"),
                    );
                    AddressingMode::None
                }
            };

            let key = (mnemonic.to_string(), mode);
            if catalog.entries.contains_key(&key) {
                catalog.warn(
                    line_number,
                    line,
                    &format!("duplicate {mode} variant of '{mnemonic}' ignored"),
                );
                continue;
            }
            catalog.entries.insert(
                key,
                CatalogEntry {
                    mnemonic: mnemonic.to_string(),
                    opcode,
                    length,
                    mode,
                },
            );
        }
        catalog
    }

    fn warn(&mut self, line: usize, text: &str, reason: &str) {
        let warning = CatalogWarning {
            line,
            text: text.to_string(),
            reason: reason.to_string(),
        };
        dprintln!(Always, "{}", warning);
        self.warnings.push(warning);
    }

    pub fn is_known(&self, mnemonic: &str) -> bool {
        self.entries.keys().any(|(name, _)| name == mnemonic)
    }

    /// Every variant of a mnemonic, in descriptor order.
    pub fn variants_of<'a>(&'a self, mnemonic: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.values().filter(move |entry| entry.mnemonic == mnemonic)
    }

    pub fn lookup(&self, mnemonic: &str, mode: AddressingMode) -> Option<&CatalogEntry> {
        self.entries.get(&(mnemonic.to_string(), mode))
    }

    pub fn has_mode(&self, mnemonic: &str, mode: AddressingMode) -> bool {
        self.lookup(mnemonic, mode).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Lines skipped or coerced while loading.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }
}

fn parse_opcode(text: &str) -> Option<u8> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
        .unwrap_or(text);
    u8::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_executable_set() {
        let catalog = Catalog::builtin();
        assert!(catalog.warnings().is_empty());
        let expected = [
            ("NOP", AddressingMode::Implied, 0x01, 1),
            ("LDAA", AddressingMode::Immediate, 0x86, 2),
            ("LDAA", AddressingMode::Extended, 0xB6, 3),
            ("STAA", AddressingMode::Direct, 0x97, 2),
            ("STAA", AddressingMode::Extended, 0xB7, 3),
            ("JMP", AddressingMode::Extended, 0x7E, 3),
            ("INCA", AddressingMode::Implied, 0x4C, 1),
            ("SWI", AddressingMode::Implied, 0x3F, 1),
        ];
        for (mnemonic, mode, opcode, length) in expected {
            let entry = catalog.lookup(mnemonic, mode).unwrap();
            assert_eq!(entry.opcode, opcode, "{mnemonic} {mode}");
            assert_eq!(entry.length, length, "{mnemonic} {mode}");
        }
    }

    #[test]
    fn parses_fields_and_aliases() {
        let catalog = Catalog::load(
            "; comment\n\
             \n\
             LDAA 86 2 IMMEDIATE\n\
             INCA 4C 1 ACCUMULATOR\n\
             FOO 0x10 1 -\n\
             BAR $11 1 NONE\n",
        );
        assert_eq!(catalog.len(), 4);
        assert!(catalog.has_mode("INCA", AddressingMode::Implied));
        assert_eq!(catalog.lookup("FOO", AddressingMode::None).unwrap().opcode, 0x10);
        assert_eq!(catalog.lookup("BAR", AddressingMode::None).unwrap().opcode, 0x11);
        assert!(catalog.warnings().is_empty());
    }

    #[test]
    fn skips_malformed_lines() {
        let catalog = Catalog::load(
            "LDAA 86 2\n\
             LDAA ZZ 2 IMMEDIATE\n\
             LDAA 186 2 IMMEDIATE\n\
             LDAA 86 two IMMEDIATE\n\
             STAA 97 2 DIRECT\n",
        );
        assert_eq!(catalog.len(), 1);
        assert!(catalog.is_known("STAA"));
        assert!(!catalog.is_known("LDAA"));
        let lines: Vec<usize> = catalog.warnings().iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_mode_becomes_none() {
        let catalog = Catalog::load("LDAA 86 2 SIDEWAYS\n");
        let entry = catalog.lookup("LDAA", AddressingMode::None).unwrap();
        assert_eq!(entry.opcode, 0x86);
        assert!(!catalog.has_mode("LDAA", AddressingMode::Immediate));
        assert_eq!(catalog.warnings().len(), 1);
    }

    #[test]
    fn variants_keep_descriptor_order() {
        let catalog = Catalog::load(
            "STAA B7 3 EXTENDED\n\
             LDAA 86 2 IMMEDIATE\n\
             STAA 97 2 DIRECT\n",
        );
        let modes: Vec<_> = catalog.variants_of("STAA").map(|e| e.mode).collect();
        assert_eq!(modes, vec![AddressingMode::Extended, AddressingMode::Direct]);
        assert_eq!(catalog.variants_of("JMP").count(), 0);
    }

    #[test]
    fn duplicate_pair_keeps_first() {
        let catalog = Catalog::load("NOP 01 1 IMPLIED\nNOP 02 1 IMPLIED\n");
        assert_eq!(catalog.lookup("NOP", AddressingMode::Implied).unwrap().opcode, 0x01);
        assert_eq!(catalog.warnings().len(), 1);
    }
}
