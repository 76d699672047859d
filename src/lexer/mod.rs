use crate::lexer::cursor::Cursor;
use crate::span::{Idx, Span};

pub mod cursor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Labels, mnemonics and the body of operands
    Ident,
    /// Terminates a prefix label
    Colon,
    /// Immediate operand prefix
    Hash,
    /// Hex operand prefix
    Dollar,
    Comma,
    Whitespace,
    /// Everything from `;` to the end of the line
    Comment,
    Unknown,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Colon => "':'",
            TokenKind::Hash => "'#'",
            TokenKind::Dollar => "'$'",
            TokenKind::Comma => "','",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Unknown => "unknown character",
            TokenKind::Eof => "end of line",
        };
        f.write_str(name)
    }
}

/// Split a single source line into tokens. The final token is always [`TokenKind::Eof`].
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut cursor = Cursor::new(line);
    let mut toks = Vec::new();
    loop {
        let tok = cursor.advance_token();
        toks.push(tok);
        if tok.kind == TokenKind::Eof {
            break;
        }
    }
    toks
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c')
}

/// Test if a character can appear in an identifier.
pub(crate) fn is_id(c: char) -> bool {
    // Numbers are words too, operands like `$1F` lex as `$` followed by an identifier.
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

impl Cursor<'_> {
    pub fn advance_token(&mut self) -> Token {
        let first_char = match self.bump() {
            Some(c) => c,
            None => {
                return Token::new(TokenKind::Eof, Span::new(Idx(self.token_start() as u32), 0))
            }
        };
        let token_kind = match first_char {
            ';' => {
                self.take_while(|_| true);
                TokenKind::Comment
            }
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                TokenKind::Whitespace
            }
            c if is_id(c) => {
                self.take_while(is_id);
                TokenKind::Ident
            }
            ':' => TokenKind::Colon,
            '#' => TokenKind::Hash,
            '$' => TokenKind::Dollar,
            ',' => TokenKind::Comma,
            _ => TokenKind::Unknown,
        };
        let span = Span::new(Idx(self.token_start() as u32), self.pos_in_token() as u16);
        self.reset_pos();
        Token::new(token_kind, span)
    }
}
