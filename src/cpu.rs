/// Bits 7 and 6 of the condition code register, which always read as set.
pub const CCR_FIXED: u8 = 0b1100_0000;

/// Named bits of the condition code register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    /// Half carry
    H = 5,
    /// Interrupt mask
    I = 4,
    /// Negative
    N = 3,
    /// Zero
    Z = 2,
    /// Overflow
    V = 1,
    /// Carry
    C = 0,
}

impl Flag {
    /// Most significant first, as they appear in the register.
    pub const ALL: [Flag; 6] = [Flag::H, Flag::I, Flag::N, Flag::Z, Flag::V, Flag::C];

    pub fn mask(self) -> u8 {
        1 << self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::H => "H",
            Flag::I => "I",
            Flag::N => "N",
            Flag::Z => "Z",
            Flag::V => "V",
            Flag::C => "C",
        }
    }
}

/// Register file of the processor.
///
/// The layout is shared with the C host interface, see [`crate::ffi`].
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CpuState {
    /// Program counter
    pub pc: u16,
    /// Stack pointer
    pub sp: u16,
    /// Index register
    pub ix: u16,
    /// Accumulator A
    pub acc_a: u8,
    /// Accumulator B
    pub acc_b: u8,
    /// Condition code register, `11HINZVC`
    pub ccr: u8,
}

impl CpuState {
    pub const RESET_SP: u16 = 0x01FF;

    /// State after power on or reset: interrupts masked and zero set.
    pub fn new() -> Self {
        let mut state = CpuState {
            pc: 0x0000,
            sp: Self::RESET_SP,
            ix: 0x0000,
            acc_a: 0x00,
            acc_b: 0x00,
            ccr: CCR_FIXED,
        };
        state.set_flag(Flag::I, true);
        state.set_flag(Flag::Z, true);
        state
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.ccr & flag.mask() != 0
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.ccr |= flag.mask();
        } else {
            self.ccr &= !flag.mask();
        }
        self.ccr |= CCR_FIXED;
    }

    /// Set N and Z from a result stored in an accumulator.
    pub fn set_nz(&mut self, result: u8) {
        self.set_flag(Flag::N, result & 0x80 != 0);
        self.set_flag(Flag::Z, result == 0);
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}
