// Assembling
mod lexer;
mod parser;
pub use parser::{parse_line, Statement, SyntaxError, Word};
pub mod catalog;
pub use catalog::{AddressingMode, Catalog, CatalogEntry};
mod symbol;
pub use symbol::{DuplicateSymbol, SymbolTable};
pub mod literal;
mod resolver;
pub use resolver::{resolve, Operand, ResolveError};
mod assembler;
pub use assembler::{assemble, Assembler};
pub mod air;
pub use air::{from_bit_text, to_bit_text, Air, AsmLine, BitTextError, LineKind};

// Running
pub mod cpu;
pub use cpu::{CpuState, Flag};
pub mod memory;
pub use memory::Memory;
mod runtime;
pub use runtime::{Emulator, RunSummary, StepOutcome, Stop};
pub mod ffi;

#[macro_use]
pub mod output;
mod error;
pub use error::{Access, CatalogWarning, Diagnostic, ErrorKind, Fault};
pub mod span;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 0;
