use std::fmt;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

// Assembler errors

/// Kinds of problems reported while assembling a line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    DuplicateSymbol,
    InvalidInstruction,
    InvalidOperand,
    UnresolvedSymbol,
    OpcodeModeMismatch,
    SyntaxError,
    InvalidDirectiveValue,
    /// More operand bytes than the encoding has room for. Only a warning.
    OperandOverflow,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DuplicateSymbol => "asm::duplicate_symbol",
            ErrorKind::InvalidInstruction => "asm::invalid_instruction",
            ErrorKind::InvalidOperand => "asm::invalid_operand",
            ErrorKind::UnresolvedSymbol => "asm::unresolved_symbol",
            ErrorKind::OpcodeModeMismatch => "asm::mode_mismatch",
            ErrorKind::SyntaxError => "parse::syntax",
            ErrorKind::InvalidDirectiveValue => "asm::directive_value",
            ErrorKind::OperandOverflow => "asm::operand_overflow",
        }
    }

    fn help(self) -> &'static str {
        match self {
            ErrorKind::DuplicateSymbol => "labels may only be defined once per file",
            ErrorKind::InvalidInstruction => "check the instruction descriptor for available mnemonics",
            ErrorKind::InvalidOperand => {
                "operands look like #12, #$0C, $0C, $1000 or a label defined earlier in the file"
            }
            ErrorKind::UnresolvedSymbol => "labels must be defined before they are used",
            ErrorKind::OpcodeModeMismatch => {
                "this instruction has no encoding for the addressing mode of the operand"
            }
            ErrorKind::SyntaxError => "lines look like `label: MNEMONIC operand ; comment`",
            ErrorKind::InvalidDirectiveValue => "ORG expects a hex address such as $0100",
            ErrorKind::OperandOverflow => "extra operand bytes were still emitted",
        }
    }

    /// Short tag used in assembly listings.
    pub fn listing_tag(self) -> &'static str {
        match self {
            ErrorKind::DuplicateSymbol => "Duplicate Symbol",
            ErrorKind::InvalidInstruction => "Invalid Instruction",
            ErrorKind::InvalidOperand => "Invalid Operand",
            ErrorKind::UnresolvedSymbol => "Unresolved Symbol",
            ErrorKind::OpcodeModeMismatch => "Opcode/Mode Mismatch",
            ErrorKind::SyntaxError => "Syntax",
            ErrorKind::InvalidDirectiveValue => "Invalid Directive Value",
            ErrorKind::OperandOverflow => "Operand Overflow",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::OperandOverflow => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A problem found on one source line. Assembly always continues past these.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    /// 1-based line number
    pub line: usize,
    /// Source line with surrounding whitespace removed
    pub text: String,
    /// Offending part of `text`
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, line: usize, text: &str, span: Span, message: String) -> Self {
        Diagnostic {
            kind,
            line,
            text: text.to_string(),
            span,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind.severity() == Severity::Error
    }

    pub fn report(&self) -> Report {
        let label = match self.kind {
            ErrorKind::DuplicateSymbol => "duplicate label",
            ErrorKind::InvalidInstruction => "unknown mnemonic",
            ErrorKind::InvalidOperand | ErrorKind::OperandOverflow => "operand",
            ErrorKind::UnresolvedSymbol => "undefined label",
            ErrorKind::OpcodeModeMismatch => "no matching encoding",
            ErrorKind::SyntaxError => "unexpected token",
            ErrorKind::InvalidDirectiveValue => "bad value",
        };
        miette!(
            severity = self.kind.severity(),
            code = self.kind.code(),
            help = self.kind.help(),
            labels = vec![LabeledSpan::at(self.span, label)],
            "Line {}: {}",
            self.line,
            self.message,
        )
        .with_source_code(self.text.clone())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error (Line {}): {}: '{}'", self.line, self.message, self.text)
    }
}

// Emulator errors

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Access {
    ReadByte,
    WriteByte,
    ReadWord,
    WriteWord,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::ReadByte => write!(f, "read"),
            Access::WriteByte => write!(f, "write"),
            Access::ReadWord => write!(f, "word read"),
            Access::WriteWord => write!(f, "word write"),
        }
    }
}

/// Problems raised while executing. None of these stop the emulator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    MemoryOutOfRange { address: usize, access: Access },
    UnknownOpcode { opcode: u8, pc: u16 },
}

impl std::error::Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::MemoryOutOfRange { address, access } => {
                write!(f, "Invalid memory {} at address ${:04X}", access, address)
            }
            Fault::UnknownOpcode { opcode, pc } => {
                write!(f, "Unknown or unimplemented opcode ${:02X} at PC ${:04X}", opcode, pc)
            }
        }
    }
}

// Catalog warnings

/// A descriptor line that was skipped or coerced while loading the catalog.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CatalogWarning {
    pub line: usize,
    pub text: String,
    pub reason: String,
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning (descriptor line {}): {}: '{}'",
            self.line, self.reason, self.text
        )
    }
}
