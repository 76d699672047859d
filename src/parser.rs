use std::iter::Peekable;
use std::vec::IntoIter;

use crate::lexer::{tokenize, Token, TokenKind};
use crate::span::Span;

/// A word taken from a source line, along with where it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Word {
    pub text: String,
    pub span: Span,
}

impl Word {
    fn new(line: &str, span: Span) -> Self {
        Word {
            text: line[span.as_range()].to_string(),
            span,
        }
    }
}

/// Structured form of a single source line.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Statement {
    pub label: Option<Word>,
    pub mnemonic: Option<Word>,
    /// At most two operand groups. The last one carries the value.
    pub operands: Vec<Word>,
    pub comment: Option<String>,
}

impl Statement {
    /// Line holds nothing but whitespace and comments.
    pub fn is_blank(&self) -> bool {
        self.label.is_none() && self.mnemonic.is_none()
    }

    /// The operand that is resolved into bytes, if any.
    pub fn value_operand(&self) -> Option<&Word> {
        self.operands.last()
    }

    /// Register qualifier preceding the value operand, as in `LDA A, #1`.
    pub fn qualifier(&self) -> Option<&Word> {
        if self.operands.len() == 2 {
            self.operands.first()
        } else {
            None
        }
    }
}

/// Line did not match the statement grammar.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SyntaxError {
    pub expected: &'static str,
    pub found: TokenKind,
    pub span: Span,
}

const MAX_OPERANDS: usize = 2;
/// Operand groups allow up to this many `#`/`$` prefix characters.
const MAX_PREFIXES: usize = 2;

/// Parse one source line.
///
/// Grammar: `[label:] [mnemonic [operand [(,|ws) operand]]] [; comment]`, where an operand is
/// up to two `#`/`$` characters followed by a word.
pub fn parse_line(line: &str) -> Result<Statement, SyntaxError> {
    LineParser::new(line).parse()
}

struct LineParser<'a> {
    line: &'a str,
    toks: Peekable<IntoIter<Token>>,
}

impl<'a> LineParser<'a> {
    fn new(line: &'a str) -> Self {
        LineParser {
            line,
            toks: tokenize(line).into_iter().peekable(),
        }
    }

    fn parse(mut self) -> Result<Statement, SyntaxError> {
        let mut stmt = Statement::default();
        self.skip_ws();

        if let Some(first) = self.eat(TokenKind::Ident) {
            self.skip_ws();
            if self.eat(TokenKind::Colon).is_some() {
                stmt.label = Some(Word::new(self.line, first.span));
                self.skip_ws();
                if let Some(mnemonic) = self.eat(TokenKind::Ident) {
                    stmt.mnemonic = Some(Word::new(self.line, mnemonic.span));
                }
            } else {
                stmt.mnemonic = Some(Word::new(self.line, first.span));
            }
        }

        if stmt.mnemonic.is_some() {
            self.parse_operands(&mut stmt)?;
        }

        self.skip_ws();
        let tok = self.next();
        match tok.kind {
            TokenKind::Comment => {
                let text = &self.line[tok.span.start() + 1..tok.span.end()];
                stmt.comment = Some(text.trim().to_string());
                Ok(stmt)
            }
            TokenKind::Eof => Ok(stmt),
            _ => Err(self.unexpected(
                if stmt.mnemonic.is_some() {
                    "operand or end of line"
                } else {
                    "label or mnemonic"
                },
                tok,
            )),
        }
    }

    fn parse_operands(&mut self, stmt: &mut Statement) -> Result<(), SyntaxError> {
        while stmt.operands.len() < MAX_OPERANDS {
            let had_ws = self.skip_ws();
            let comma = if stmt.operands.is_empty() {
                None
            } else {
                let comma = self.eat(TokenKind::Comma);
                self.skip_ws();
                comma
            };

            match self.peek().kind {
                kind @ (TokenKind::Hash | TokenKind::Dollar | TokenKind::Ident) => {
                    // Words must be separated, a prefix such as `LDAA#5` is enough on its own
                    if kind == TokenKind::Ident && !had_ws && comma.is_none() {
                        let tok = self.next();
                        return Err(self.unexpected("whitespace or ','", tok));
                    }
                    let operand = self.parse_operand()?;
                    stmt.operands.push(operand);
                }
                _ => {
                    if comma.is_some() {
                        let tok = self.next();
                        return Err(self.unexpected("operand", tok));
                    }
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn parse_operand(&mut self) -> Result<Word, SyntaxError> {
        let mut span: Option<Span> = None;
        let mut prefixes = 0;
        while matches!(self.peek().kind, TokenKind::Hash | TokenKind::Dollar) {
            if prefixes == MAX_PREFIXES {
                let tok = self.next();
                return Err(self.unexpected("identifier", tok));
            }
            let tok = self.next();
            span = Some(span.map_or(tok.span, |s| s.join(tok.span)));
            prefixes += 1;
        }
        let tok = self.next();
        if tok.kind != TokenKind::Ident {
            return Err(self.unexpected("identifier", tok));
        }
        let span = span.map_or(tok.span, |s| s.join(tok.span));
        Ok(Word::new(self.line, span))
    }

    fn peek(&mut self) -> Token {
        // Token stream always ends in `Eof`
        *self
            .toks
            .peek()
            .unwrap_or(&Token::new(TokenKind::Eof, Span::default()))
    }

    fn next(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.toks.next();
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.next())
        } else {
            None
        }
    }

    /// Returns whether any whitespace was skipped
    fn skip_ws(&mut self) -> bool {
        self.eat(TokenKind::Whitespace).is_some()
    }

    fn unexpected(&self, expected: &'static str, found: Token) -> SyntaxError {
        SyntaxError {
            expected,
            found: found.kind,
            span: found.span,
        }
    }
}
