use crate::air::{Air, AsmLine, LineKind};
use crate::catalog::Catalog;
use crate::dprintln;
use crate::error::{Diagnostic, ErrorKind};
use crate::literal::parse_hex_address;
use crate::parser::{parse_line, Statement, Word};
use crate::resolver::{resolve, ResolveError};
use crate::span::Span;
use crate::symbol::SymbolTable;

const ORG: &str = "ORG";
const END: &str = "END";

/// Older two letter accumulator mnemonics and what they stand for, when the catalog has it.
const ALIASES: [(&str, &str); 2] = [("LDA", "LDAA"), ("STA", "STAA")];

/// Assemble a whole source file in a single pass.
pub fn assemble(src: &str, catalog: &Catalog) -> Air {
    let mut asm = Assembler::new(catalog);
    for line in src.lines() {
        asm.assemble_line(line);
    }
    asm.finish()
}

/// Single pass assembler session.
///
/// Labels must be defined before use, except for `JMP` targets which assemble with
/// placeholder bytes and an error.
pub struct Assembler<'a> {
    catalog: &'a Catalog,
    symbols: SymbolTable,
    location_counter: u16,
    /// Number of lines seen so far
    line_number: usize,
    air: Air,
}

/// Line currently being assembled.
struct Line<'s> {
    number: usize,
    /// Source text without leading or trailing whitespace
    text: &'s str,
    /// Source text without its comment
    code: &'s str,
}

impl<'a> Assembler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Assembler {
            catalog,
            symbols: SymbolTable::new(),
            location_counter: 0,
            line_number: 0,
            air: Air::new(),
        }
    }

    pub fn location_counter(&self) -> u16 {
        self.location_counter
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn finish(mut self) -> Air {
        self.air.set_symbols(self.symbols);
        self.air
    }

    /// Assemble the next source line. Problems are recorded and never stop assembly.
    pub fn assemble_line(&mut self, raw: &str) {
        self.line_number += 1;

        let text = raw.trim();
        let code = match text.find(';') {
            Some(i) => text[..i].trim_end(),
            None => text,
        };
        let line = Line {
            number: self.line_number,
            text,
            code,
        };

        // Spans from the parser are relative to `text`
        let stmt = match parse_line(text) {
            Ok(stmt) => stmt,
            Err(err) => {
                let message = format!("Expected {}, found {}", err.expected, err.found);
                self.error(&line, ErrorKind::SyntaxError, err.span, message);
                return;
            }
        };
        if stmt.is_blank() {
            return;
        }

        let address = self.location_counter;
        if let Some(label) = &stmt.label {
            if let Err(dup) = self.symbols.define(&label.text, address) {
                let message = format!(
                    "Duplicate symbol '{}' (first defined at ${:04X})",
                    label.text, dup.existing
                );
                if stmt.mnemonic.is_none() {
                    self.error(&line, ErrorKind::DuplicateSymbol, label.span, message);
                    return;
                }
                self.report(&line, ErrorKind::DuplicateSymbol, label.span, message);
            } else if stmt.mnemonic.is_none() {
                self.push_line(&line, address, LineKind::Label(address));
                return;
            }
        }

        let Some(mnemonic) = &stmt.mnemonic else {
            return;
        };
        match mnemonic.text.as_str() {
            ORG => self.origin(&line, &stmt, mnemonic),
            END => self.push_line(&line, address, LineKind::Directive),
            _ => self.instruction(&line, &stmt, mnemonic),
        }
    }

    fn origin(&mut self, line: &Line, stmt: &Statement, mnemonic: &Word) {
        let value = stmt.value_operand();
        match value.and_then(|word| parse_hex_address(&word.text)) {
            Some(address) => {
                self.location_counter = address;
                self.air.set_origin(address);
                self.push_line(line, address, LineKind::Directive);
            }
            None => {
                let (span, message) = match value {
                    Some(word) => (word.span, format!("Invalid ORG address '{}'", word.text)),
                    None => (mnemonic.span, "ORG requires an address".to_string()),
                };
                self.error(line, ErrorKind::InvalidDirectiveValue, span, message);
            }
        }
    }

    fn instruction(&mut self, line: &Line, stmt: &Statement, word: &Word) {
        let catalog = self.catalog;
        let mnemonic = ALIASES
            .iter()
            .find(|(alias, target)| *alias == word.text && catalog.is_known(target))
            .map_or(word.text.as_str(), |(_, target)| *target);

        if !catalog.is_known(mnemonic) {
            let message = format!("Invalid instruction '{}'", word.text);
            self.error(line, ErrorKind::InvalidInstruction, word.span, message);
            return;
        }

        let value = stmt.value_operand();
        let operand_span = value.map_or(word.span, |w| w.span);
        let operand_text = value.map(|w| w.text.as_str());

        let operand = match resolve(mnemonic, operand_text, catalog, &self.symbols) {
            Ok(operand) => operand,
            Err(ResolveError { kind, message }) => {
                self.error(line, kind, operand_span, message);
                self.skip(mnemonic);
                return;
            }
        };
        if let Some(ResolveError { kind, message }) = &operand.unresolved {
            self.report(line, *kind, operand_span, message.clone());
        }

        let Some(entry) = catalog.lookup(mnemonic, operand.mode) else {
            let message = match operand_text {
                Some(text) => format!("'{mnemonic}' has no {} form for '{text}'", operand.mode),
                None => format!("'{mnemonic}' has no {} form", operand.mode),
            };
            self.error(line, ErrorKind::OpcodeModeMismatch, operand_span, message);
            self.skip(mnemonic);
            return;
        };

        let expected = (entry.length as usize).saturating_sub(1);
        let provided = operand.bytes.len();
        if provided > expected {
            let message = format!(
                "Operand '{}' gives {provided} bytes but '{mnemonic}' takes {expected}",
                operand_text.unwrap_or_default()
            );
            self.report(line, ErrorKind::OperandOverflow, operand_span, message);
        }

        let address = self.location_counter;
        let length = entry.length as u16;
        let kind = LineKind::Code {
            opcode: entry.opcode,
            operands: operand.bytes,
            missing: expected.saturating_sub(provided),
        };
        self.push_line(line, address, kind);
        self.location_counter = address.wrapping_add(length);
    }

    /// Advance past an instruction that could not be encoded, as if its first variant was used.
    fn skip(&mut self, mnemonic: &str) {
        let length = self
            .catalog
            .variants_of(mnemonic)
            .next()
            .map_or(1, |entry| entry.length as u16);
        self.location_counter = self.location_counter.wrapping_add(length);
    }

    fn push_line(&mut self, line: &Line, address: u16, kind: LineKind) {
        self.air.add_line(AsmLine {
            number: line.number,
            address,
            text: line.code.to_string(),
            kind,
        });
    }

    /// Record a diagnostic and mark the line as failed in the listing.
    fn error(&mut self, line: &Line, kind: ErrorKind, span: Span, message: String) {
        self.report(line, kind, span, message);
        let address = self.location_counter;
        self.push_line(line, address, LineKind::Error(kind));
    }

    /// Record a diagnostic without touching the listing.
    fn report(&mut self, line: &Line, kind: ErrorKind, span: Span, message: String) {
        let diagnostic = Diagnostic::new(kind, line.number, line.text, span, message);
        dprintln!(Always, "{:?}", diagnostic.report());
        self.air.add_diagnostic(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PLACEHOLDER;

    fn asm(src: &str) -> Air {
        assemble(src, &Catalog::builtin())
    }

    fn kinds(air: &Air) -> Vec<ErrorKind> {
        air.diagnostics().iter().map(|d| d.kind).collect()
    }

    #[test]
    fn small_program() {
        let air = asm("ORG $0010\nLDAA #$05\nINCA\nSTAA $0060\nSWI\n");
        assert!(air.diagnostics().is_empty());
        assert_eq!(air.origin(), Some(0x10));
        assert_eq!(
            air.bytes(),
            &[0x86, 0x05, 0x4C, 0xB7, 0x00, 0x60, 0x3F]
        );
        let addresses: Vec<u16> = air.lines().iter().map(|l| l.address).collect();
        assert_eq!(addresses, vec![0x10, 0x10, 0x12, 0x13, 0x16]);
    }

    #[test]
    fn listing_output() {
        let air = asm("ORG $0050\nSTART: LDAA #10 ; ten\nLOOP:\nJMP LOOP\nEND\n");
        assert_eq!(
            air.listing(),
            "ORG $0050 -> (Directive)\n\
             START: LDAA #10 -> 86 0A\n\
             LOOP: -> (Label Definition at $0052)\n\
             JMP LOOP -> 7E 00 52\n\
             END -> (Directive)\n"
        );
    }

    #[test]
    fn blank_and_comment_lines_only_count() {
        let air = asm("\n   \n; nothing here\nNOP\nFOO\n");
        assert_eq!(air.lines().len(), 2);
        assert_eq!(air.diagnostics()[0].line, 5);
    }

    #[test]
    fn labels_take_location_counter() {
        let air = asm("ORG $0100\nSTART: NOP\nNEXT: NOP\nLAST:\n");
        let symbols: Vec<_> = air.symbols().iter().collect();
        assert_eq!(
            symbols,
            vec![("START", 0x0100), ("NEXT", 0x0101), ("LAST", 0x0102)]
        );
    }

    #[test]
    fn duplicate_label_keeps_first_address() {
        let air = asm("LOOP: NOP\nNOP\nLOOP: INCA\nLOOP:\n");
        assert_eq!(air.count(ErrorKind::DuplicateSymbol), 2);
        assert_eq!(air.symbols().resolve("LOOP"), Some(0));
        // Instruction on a duplicate label line is still emitted
        assert_eq!(air.bytes(), &[0x01, 0x01, 0x4C]);
    }

    #[test]
    fn duplicate_label_reported_once() {
        let air = asm("LOOP: NOP\nLOOP: NOP\n");
        assert_eq!(kinds(&air), vec![ErrorKind::DuplicateSymbol]);
        assert_eq!(air.diagnostics()[0].line, 2);
    }

    #[test]
    fn org_moves_location_counter() {
        let air = asm("NOP\nORG $0040\nNOP\nORG $0080\nINCA\n");
        assert_eq!(air.origin(), Some(0x40));
        assert_eq!(
            air.segments(),
            vec![(0x00, vec![0x01]), (0x40, vec![0x01]), (0x80, vec![0x4C])]
        );
    }

    #[test]
    fn org_errors() {
        let air = asm("ORG START\nORG\nORG $10000\nNOP\n");
        assert_eq!(air.count(ErrorKind::InvalidDirectiveValue), 3);
        assert_eq!(air.origin(), None);
        assert_eq!(air.lines()[3].address, 0);
    }

    #[test]
    fn aliases() {
        let air = asm("LDA #$01\nSTA $0060\n");
        assert!(air.diagnostics().is_empty());
        assert_eq!(air.bytes(), &[0x86, 0x01, 0xB7, 0x00, 0x60]);
    }

    #[test]
    fn qualifier_is_ignored() {
        let air = asm("LDA A, #$07\nLDAA A #$08\n");
        assert!(air.diagnostics().is_empty());
        assert_eq!(air.bytes(), &[0x86, 0x07, 0x86, 0x08]);
    }

    #[test]
    fn unknown_mnemonic() {
        let air = asm("FOO #1\nNOP\n");
        assert_eq!(kinds(&air), vec![ErrorKind::InvalidInstruction]);
        assert_eq!(air.lines()[0].kind, LineKind::Error(ErrorKind::InvalidInstruction));
        // Unknown mnemonics take no space
        assert_eq!(air.lines()[1].address, 0);
    }

    #[test]
    fn mnemonics_are_case_sensitive() {
        let air = asm("nop\n");
        assert_eq!(kinds(&air), vec![ErrorKind::InvalidInstruction]);
    }

    #[test]
    fn bad_operand_advances_by_first_variant() {
        let air = asm("LDAA #$123\nNOP\n");
        assert_eq!(kinds(&air), vec![ErrorKind::InvalidOperand]);
        assert_eq!(air.bytes(), &[0x01]);
        assert_eq!(air.lines()[1].address, 2);
    }

    #[test]
    fn mode_mismatch() {
        let air = asm("STAA #5\nINCA $10\nNOP\n");
        assert_eq!(
            kinds(&air),
            vec![ErrorKind::OpcodeModeMismatch, ErrorKind::OpcodeModeMismatch]
        );
        // STAA's first variant is two bytes long, INCA's is one
        assert_eq!(air.lines()[2].address, 3);
        assert_eq!(air.bytes(), &[0x01]);
    }

    #[test]
    fn label_used_before_definition() {
        let air = asm("LDAA LATER\nLATER: NOP\n");
        assert_eq!(kinds(&air), vec![ErrorKind::UnresolvedSymbol]);
        assert_eq!(air.symbols().resolve("LATER"), Some(3));
    }

    #[test]
    fn forward_jump_assembles_placeholder() {
        let air = asm("JMP AHEAD\nAHEAD: SWI\n");
        assert_eq!(kinds(&air), vec![ErrorKind::UnresolvedSymbol]);
        assert_eq!(air.bytes(), &[0x7E, PLACEHOLDER, PLACEHOLDER, 0x3F]);
        assert_eq!(air.lines()[0].to_string(), "JMP AHEAD -> 7E EE EE");
    }

    #[test]
    fn short_operand_is_padded_in_listing_only() {
        let catalog = Catalog::load("STX FF 3 DIRECT\n");
        let air = assemble("STX $10\n", &catalog);
        assert!(air.diagnostics().is_empty());
        assert_eq!(air.bytes(), &[0xFF, 0x10]);
        assert_eq!(air.lines()[0].to_string(), "STX $10 -> FF 10 XX");
    }

    #[test]
    fn long_operand_warns() {
        let catalog = Catalog::load("LDX CE 2 EXTENDED\nNOP 01 1 IMPLIED\n");
        let air = assemble("LDX $1234\nNOP\n", &catalog);
        assert_eq!(kinds(&air), vec![ErrorKind::OperandOverflow]);
        assert_eq!(air.error_count(), 0);
        assert_eq!(air.bytes(), &[0xCE, 0x12, 0x34, 0x01]);
        // Location counter still follows the declared length
        assert_eq!(air.lines()[1].address, 2);
    }

    #[test]
    fn syntax_errors() {
        let air = asm("LDAA #$05 junk extra\nLDAA #\n: NOP\nNOP\n");
        assert_eq!(air.count(ErrorKind::SyntaxError), 3);
        assert_eq!(air.bytes(), &[0x01]);
        assert_eq!(air.lines()[0].kind, LineKind::Error(ErrorKind::SyntaxError));
    }

    #[test]
    fn diagnostic_spans_follow_trimmed_text() {
        let air = asm("    LDAA NOWHERE ; missing\n");
        let diag = &air.diagnostics()[0];
        assert_eq!(diag.text, "LDAA NOWHERE ; missing");
        assert_eq!(&diag.text[diag.span.as_range()], "NOWHERE");
        assert_eq!(diag.line, 1);
    }

    #[test]
    fn unicode_whitespace_is_trimmed() {
        let air = asm("NOP\u{a0}\nLDAA #$05\u{3000}\n");
        assert_eq!(air.error_count(), 0);
        assert_eq!(air.bytes(), &[0x01, 0x86, 0x05]);

        let air = asm("\u{3000}LDAA @5\u{a0}\n");
        let diag = &air.diagnostics()[0];
        assert_eq!(diag.kind, ErrorKind::SyntaxError);
        assert_eq!(diag.text, "LDAA @5");
        assert_eq!(&diag.text[diag.span.as_range()], "@");
    }

    #[test]
    fn errors_do_not_stop_assembly() {
        let air = asm("FOO\nBAR\nNOP\nBAZ\nSWI\n");
        assert_eq!(air.error_count(), 3);
        assert_eq!(air.bytes(), &[0x01, 0x3F]);
    }
}
