//! C host interface.
//!
//! Each thread owns one emulator, created on first use. Every function is safe to call in any
//! order and any number of times.

use std::cell::RefCell;
use std::slice;

use crate::cpu::CpuState;
use crate::runtime::{Emulator, StepOutcome};

thread_local! {
    static ENGINE: RefCell<Option<Emulator>> = const { RefCell::new(None) };
}

fn with_engine<F, R>(callback: F) -> R
where
    F: FnOnce(&mut Emulator) -> R,
{
    ENGINE.with(|engine| {
        let mut engine = engine.borrow_mut();
        callback(engine.get_or_insert_with(Emulator::new))
    })
}

/// Step result codes returned by [`m6800_step`].
pub const STEP_EXECUTED: i32 = 0;
pub const STEP_HALTED: i32 = 1;
pub const STEP_END_OF_MEMORY: i32 = 2;
pub const STEP_FAULT: i32 = -1;

/// Clear memory and reset the processor.
#[no_mangle]
pub extern "C" fn m6800_initialize() {
    with_engine(Emulator::initialize);
}

/// Reset the processor, keeping memory.
#[no_mangle]
pub extern "C" fn m6800_reset() {
    with_engine(Emulator::reset);
}

/// Copy `len` bytes from `bytes` into memory at `start`.
///
/// Returns `0` on success and `-1` when the program was truncated at the end of memory.
/// A null `bytes` loads nothing but still moves the program counter.
///
/// # Safety
///
/// Unless null, `bytes` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn m6800_load_program(bytes: *const u8, len: usize, start: u16) -> i32 {
    let program: &[u8] = if bytes.is_null() || len == 0 {
        &[]
    } else {
        // SAFETY: caller guarantees `bytes` points to `len` readable bytes
        unsafe { slice::from_raw_parts(bytes, len) }
    };
    match with_engine(|emu| emu.load_program(program, start)) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Execute one instruction. See the `STEP_*` constants.
#[no_mangle]
pub extern "C" fn m6800_step() -> i32 {
    match with_engine(Emulator::step) {
        StepOutcome::Executed => STEP_EXECUTED,
        StepOutcome::Halted => STEP_HALTED,
        StepOutcome::EndOfMemory => STEP_END_OF_MEMORY,
        StepOutcome::Fault(_) => STEP_FAULT,
    }
}

/// Copy of the register file.
#[no_mangle]
pub extern "C" fn m6800_state() -> CpuState {
    with_engine(|emu| emu.state())
}

/// Byte at `address`, `0xFF` when out of range.
#[no_mangle]
pub extern "C" fn m6800_read_memory(address: u16) -> u8 {
    with_engine(|emu| emu.read_memory(address))
}

#[no_mangle]
pub extern "C" fn m6800_write_memory(address: u16, value: u8) {
    with_engine(|emu| emu.write_memory(address, value));
}
