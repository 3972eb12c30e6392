//! Low-level cursor for tokenizing individual lines.

use super::token::{LogosToken, Token, TokenKind};
use crate::error::{Warning, WarningKind};
use logos::Logos;
use smallvec::SmallVec;
use text_size::{TextRange, TextSize};

/// A comment found while scanning a line, not yet attached to an anchor.
#[derive(Debug, Clone)]
pub struct RawComment {
    /// Comment text without the `;`.
    pub text: String,
    pub span: TextRange,
}

/// A cursor for tokenizing a single line of source code.
pub struct LineCursor {
    line_start_offset: usize,
}

impl LineCursor {
    /// Create a new line cursor with the given offset into the source.
    pub fn new(line_start_offset: usize) -> Self {
        LineCursor { line_start_offset }
    }

    /// Tokenize a single line. Comments are returned out-of-band; unmatched
    /// input becomes an `Error` token plus a warning so that the operand
    /// parser can degrade to a garbage operand instead of failing the line.
    pub fn tokenize_line(
        &self,
        line: &str,
    ) -> (Vec<Token>, SmallVec<[RawComment; 1]>, Vec<Warning>) {
        let mut tokens = Vec::new();
        let mut comments = SmallVec::new();
        let mut warnings = Vec::new();
        let mut lexer = LogosToken::lexer(line);

        while let Some(tok_result) = lexer.next() {
            let local = lexer.span();
            let start = TextSize::from((self.line_start_offset + local.start) as u32);
            let end = TextSize::from((self.line_start_offset + local.end) as u32);
            let span = TextRange::new(start, end);

            match tok_result {
                Ok(LogosToken::Comment) => {
                    let text = lexer.slice()[1..].trim().to_string();
                    comments.push(RawComment { text, span });
                }
                Ok(tok) => tokens.push(Token::new(Self::convert(tok), span)),
                Err(()) => {
                    warnings.push(Warning::new(
                        WarningKind::InvalidToken {
                            text: lexer.slice().to_string(),
                        },
                        span,
                    ));
                    tokens.push(Token::new(TokenKind::Error, span));
                }
            }
        }

        (tokens, comments, warnings)
    }

    fn convert(tok: LogosToken) -> TokenKind {
        match tok {
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Number => TokenKind::Number,
            LogosToken::Str => TokenKind::Str,
            LogosToken::Dollar => TokenKind::Dollar,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Comment => unreachable!("comments are routed out-of-band"),
        }
    }
}
