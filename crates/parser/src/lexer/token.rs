//! Token definition and types.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A positioned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Token { kind, span }
    }

    pub fn start(&self) -> TextSize {
        self.span.start()
    }

    pub fn end(&self) -> TextSize {
        self.span.end()
    }

    /// Slice the token's text out of the source buffer.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span]
    }
}

/// Lexical token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `[a-zA-Z][a-zA-Z0-9_]*`: mnemonics, labels, register names, symbols.
    Ident,
    /// `[0-9][0-9A-Fa-f]*H?`, where a trailing `H` marks a hexadecimal
    /// literal.
    Number,
    /// String literal delimited by matching `'` or `"`. No escapes.
    Str,
    /// `$`, the program counter symbol.
    Dollar,
    Comma,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Colon,
    /// Sentinel terminating an instruction's operand list.
    Newline,
    /// A character sequence the lexer could not match; becomes a garbage operand.
    Error,
    Eof,
}

/// Logos-based lexer token enum, run over one line at a time.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
pub enum LogosToken {
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,

    // Hex digits are permitted in the body; whether the literal actually
    // parses as decimal or hex is decided later from the trailing H.
    #[regex(r"[0-9][0-9A-Fa-f]*[Hh]?")]
    Number,

    // Strings are line-terminated and escape-free.
    #[regex(r#""[^"\n]*"|'[^'\n]*'"#)]
    Str,

    #[token("$")]
    Dollar,
    #[token(",")]
    Comma,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token(":")]
    Colon,

    #[regex(r";[^\n]*")]
    Comment,
}
