use crate::air::Air;
use crate::cpu::{CpuState, Flag};
use crate::dprintln;
use crate::error::Fault;
use crate::memory::Memory;

/// Result of executing a single instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    Executed,
    /// `SWI` was executed, now or on an earlier step. Nothing runs until reset.
    Halted,
    /// Program counter is past the end of memory.
    EndOfMemory,
    /// Only the program counter moved.
    Fault(Fault),
}

/// Why [`Emulator::run`] stopped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stop {
    Halted,
    EndOfMemory,
    Fault(Fault),
    StepLimit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RunSummary {
    /// Instructions executed, including a final `SWI`
    pub steps: usize,
    pub stop: Stop,
}

/// Handler table entry.
#[derive(Clone, Copy)]
struct Op {
    mnemonic: &'static str,
    exec: fn(&mut Emulator),
}

impl Op {
    const fn new(mnemonic: &'static str, exec: fn(&mut Emulator)) -> Option<Op> {
        Some(Op { mnemonic, exec })
    }
}

/// Complete machine state during runtime.
#[derive(Clone, Debug)]
pub struct Emulator {
    cpu: CpuState,
    memory: Memory,
    halted: bool,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// Emulator with a full 64 KiB of zeroed memory.
    pub fn new() -> Self {
        Self::with_memory(Memory::new())
    }

    pub fn with_memory(memory: Memory) -> Self {
        Emulator {
            cpu: CpuState::new(),
            memory,
            halted: false,
        }
    }

    /// Clear memory and reset the processor.
    pub fn initialize(&mut self) {
        self.memory.clear();
        self.reset();
    }

    /// Reset the processor. Memory is left alone.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.halted = false;
    }

    /// Copy `bytes` into memory at `start` and point the program counter there.
    ///
    /// Bytes that do not fit are dropped and the first address that failed is returned as an
    /// error. The program counter is set either way.
    pub fn load_program(&mut self, bytes: &[u8], start: u16) -> Result<(), Fault> {
        let result = self.memory.load(bytes, start);
        if let Err(fault) = &result {
            dprintln!(
                Always,
                "Program of {} bytes at ${:04X} does not fit in memory: {}",
                bytes.len(),
                start,
                fault
            );
        }
        self.cpu.pc = start;
        self.halted = false;
        result
    }

    /// Load every emitted run of bytes at its assembled address, and start at the origin.
    pub fn load_air(&mut self, air: &Air) -> Result<(), Fault> {
        let mut result = Ok(());
        for (address, bytes) in air.segments() {
            let loaded = self.load_program(&bytes, address);
            result = result.and(loaded);
        }
        self.cpu.pc = air.load_address();
        result
    }

    pub fn state(&self) -> CpuState {
        self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuState {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read a byte. Out of range reads are logged and return `0xFF`.
    pub fn read_memory(&self, address: u16) -> u8 {
        self.memory.read_byte(address)
    }

    /// Write a byte. Out of range writes are logged and dropped.
    pub fn write_memory(&mut self, address: u16, value: u8) {
        self.memory.write_byte(address, value);
    }

    pub fn dump(&self, start: u16, lines: usize) -> String {
        self.memory.dump(start, lines)
    }

    #[rustfmt::skip]
    const OP_TABLE: [Option<Op>; 256] = {
        let mut table: [Option<Op>; 256] = [None; 256];
        table[0x01] = Op::new("NOP",  Self::nop);
        table[0x3F] = Op::new("SWI",  Self::swi);
        table[0x4C] = Op::new("INCA", Self::inca);
        table[0x7E] = Op::new("JMP",  Self::jmp_ext);
        table[0x86] = Op::new("LDAA", Self::ldaa_imm);
        // 0x96 is treated as a second direct store
        table[0x96] = Op::new("STAA", Self::staa_dir);
        table[0x97] = Op::new("STAA", Self::staa_dir);
        table[0xB6] = Op::new("LDAA", Self::ldaa_ext);
        table[0xB7] = Op::new("STAA", Self::staa_ext);
        table
    };

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }

        let pc = self.cpu.pc;
        if !self.memory.contains(pc as usize) {
            dprintln!(Sometimes, "End of program memory reached at ${:04X}", pc);
            return StepOutcome::EndOfMemory;
        }

        let opcode = self.fetch_byte();
        let Some(op) = Self::OP_TABLE[opcode as usize] else {
            let fault = Fault::UnknownOpcode { opcode, pc };
            dprintln!(Always, "{}", fault);
            return StepOutcome::Fault(fault);
        };

        (op.exec)(self);
        dprintln!(
            Trace,
            "${:04X}  {:02X}  {:<4}  A={:02X} PC={:04X} CCR={:08b}",
            pc,
            opcode,
            op.mnemonic,
            self.cpu.acc_a,
            self.cpu.pc,
            self.cpu.ccr
        );

        if self.halted {
            StepOutcome::Halted
        } else {
            StepOutcome::Executed
        }
    }

    /// Step until halted, out of memory, faulted, or `max_steps` instructions have run.
    pub fn run(&mut self, max_steps: usize) -> RunSummary {
        let mut steps = 0;
        let stop = loop {
            if steps == max_steps {
                break Stop::StepLimit;
            }
            let was_halted = self.halted;
            match self.step() {
                StepOutcome::Executed => steps += 1,
                StepOutcome::Halted => {
                    if !was_halted {
                        steps += 1;
                    }
                    break Stop::Halted;
                }
                StepOutcome::EndOfMemory => break Stop::EndOfMemory,
                StepOutcome::Fault(fault) => break Stop::Fault(fault),
            }
        };
        RunSummary { steps, stop }
    }

    #[inline]
    fn fetch_byte(&mut self) -> u8 {
        let value = self.memory.read_byte(self.cpu.pc);
        self.cpu.pc = self.cpu.pc.wrapping_add(1);
        value
    }

    #[inline]
    fn fetch_word(&mut self) -> u16 {
        let value = self.memory.read_word(self.cpu.pc);
        self.cpu.pc = self.cpu.pc.wrapping_add(2);
        value
    }

    /// Flags after a load or store of accumulator A.
    #[inline]
    fn set_load_flags(&mut self) {
        self.cpu.set_nz(self.cpu.acc_a);
        self.cpu.set_flag(Flag::V, false);
    }

    fn nop(&mut self) {}

    fn ldaa_imm(&mut self) {
        self.cpu.acc_a = self.fetch_byte();
        self.set_load_flags();
    }

    fn ldaa_ext(&mut self) {
        let address = self.fetch_word();
        self.cpu.acc_a = self.memory.read_byte(address);
        self.set_load_flags();
    }

    fn staa_dir(&mut self) {
        let address = self.fetch_byte() as u16;
        self.memory.write_byte(address, self.cpu.acc_a);
        self.set_load_flags();
    }

    fn staa_ext(&mut self) {
        let address = self.fetch_word();
        self.memory.write_byte(address, self.cpu.acc_a);
        self.set_load_flags();
    }

    fn jmp_ext(&mut self) {
        self.cpu.pc = self.fetch_word();
    }

    fn inca(&mut self) {
        let value = self.cpu.acc_a;
        let result = value.wrapping_add(1);
        self.cpu.acc_a = result;
        self.cpu.set_nz(result);
        self.cpu.set_flag(Flag::V, value == 0x7F);
    }

    fn swi(&mut self) {
        self.halted = true;
    }
}
