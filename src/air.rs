use std::fmt;

use crate::error::{Diagnostic, ErrorKind};
use crate::symbol::SymbolTable;

/// Assembly intermediate representation: emitted bytes, listing, origin and everything that
/// went wrong along the way.
#[derive(Clone, Debug, Default)]
pub struct Air {
    /// First address set with `ORG`
    origin: Option<u16>,
    /// Bytes in emission order
    bytes: Vec<u8>,
    lines: Vec<AsmLine>,
    diagnostics: Vec<Diagnostic>,
    symbols: SymbolTable,
}

impl Air {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an `ORG` value. Only the first one becomes the origin.
    pub fn set_origin(&mut self, address: u16) {
        if self.origin.is_none() {
            self.origin = Some(address);
        }
    }

    pub fn origin(&self) -> Option<u16> {
        self.origin
    }

    /// Address the byte buffer is meant to be loaded at.
    pub fn load_address(&self) -> u16 {
        self.origin.unwrap_or(0)
    }

    pub fn add_line(&mut self, line: AsmLine) {
        if let LineKind::Code {
            opcode, operands, ..
        } = &line.kind
        {
            self.bytes.push(*opcode);
            self.bytes.extend_from_slice(operands);
        }
        self.lines.push(line);
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn set_symbols(&mut self, symbols: SymbolTable) {
        self.symbols = symbols;
    }

    /// Program byte buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn lines(&self) -> &[AsmLine] {
        &self.lines
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Number of diagnostics of `kind`.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Emitted bytes grouped into runs of consecutive addresses.
    pub fn segments(&self) -> Vec<(u16, Vec<u8>)> {
        let mut segments: Vec<(u16, Vec<u8>)> = Vec::new();
        for line in &self.lines {
            let LineKind::Code {
                opcode, operands, ..
            } = &line.kind
            else {
                continue;
            };
            let continues = segments.last().is_some_and(|(start, bytes)| {
                start.wrapping_add(bytes.len() as u16) == line.address
            });
            if !continues {
                segments.push((line.address, Vec::new()));
            }
            if let Some((_, bytes)) = segments.last_mut() {
                bytes.push(*opcode);
                bytes.extend_from_slice(operands);
            }
        }
        segments
    }

    /// Listing of every processed line, one per line.
    pub fn listing(&self) -> String {
        self.lines.iter().map(|line| format!("{line}\n")).collect()
    }

    /// Byte buffer as text, one byte per line written as eight binary digits.
    pub fn to_bit_text(&self) -> String {
        to_bit_text(&self.bytes)
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AsmLine;
    type IntoIter = std::slice::Iter<'a, AsmLine>;
    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// One processed source line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AsmLine {
    /// 1-based source line number
    pub number: usize,
    /// Location counter when the line was reached
    pub address: u16,
    /// Source text with the comment and surrounding whitespace removed
    pub text: String,
    pub kind: LineKind,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LineKind {
    /// Emitted instruction
    Code {
        opcode: u8,
        operands: Vec<u8>,
        /// Operand bytes the encoding expects but the operand did not provide.
        /// Only shown in the listing, never emitted.
        missing: usize,
    },
    Directive,
    /// Label defined on a line of its own
    Label(u16),
    Error(ErrorKind),
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.text)?;
        match &self.kind {
            LineKind::Code {
                opcode,
                operands,
                missing,
            } => {
                write!(f, " {:02X}", opcode)?;
                for byte in operands {
                    write!(f, " {:02X}", byte)?;
                }
                for _ in 0..*missing {
                    write!(f, " XX")?;
                }
                Ok(())
            }
            LineKind::Directive => write!(f, " (Directive)"),
            LineKind::Label(address) => write!(f, " (Label Definition at ${:04X})", address),
            LineKind::Error(kind) => write!(f, " ERROR ({})", kind.listing_tag()),
        }
    }
}

/// Write bytes as text, one byte per line as eight binary digits.
pub fn to_bit_text(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:08b}\n", b)).collect()
}

/// Line of a bit text file that is not eight binary digits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitTextError {
    pub line: usize,
    pub text: String,
}

impl std::error::Error for BitTextError {}

impl fmt::Display for BitTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} is not an 8 digit binary byte: '{}'",
            self.line, self.text
        )
    }
}

/// Read bytes back from [`to_bit_text`] output. Blank lines are ignored.
pub fn from_bit_text(text: &str) -> Result<Vec<u8>, BitTextError> {
    let mut bytes = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let is_bits = line.len() == 8 && line.chars().all(|c| c == '0' || c == '1');
        let byte = is_bits
            .then(|| u8::from_str_radix(line, 2).ok())
            .flatten()
            .ok_or_else(|| BitTextError {
                line: i + 1,
                text: line.to_string(),
            })?;
        bytes.push(byte);
    }
    Ok(bytes)
}
