//! Warnings for non-fatal issues found while lexing and parsing.
//!
//! Nothing in here aborts the pipeline: stray characters become garbage
//! operands, malformed lines are dropped, and every case is reported as a
//! warning the caller can print.

use std::fmt;
use text_size::TextRange;

/// A non-fatal diagnostic with a source span.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub enum WarningKind {
    /// Input the lexer could not match against any token.
    InvalidToken { text: String },
    /// An operand that did not follow the operand grammar.
    BadOperand { message: String },
    /// A line that does not start with a label or a mnemonic.
    MalformedLine { message: String },
}

impl Warning {
    pub fn new(kind: WarningKind, span: TextRange) -> Self {
        Warning { kind, span }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset: u32 = self.span.start().into();
        match &self.kind {
            WarningKind::InvalidToken { text } => {
                write!(f, "invalid token {:?} at offset {}", text, offset)
            }
            WarningKind::BadOperand { message } => {
                write!(f, "bad operand at offset {}: {}", offset, message)
            }
            WarningKind::MalformedLine { message } => {
                write!(f, "malformed line at offset {}: {}", offset, message)
            }
        }
    }
}
