//! Main lexer implementation.
//!
//! Tokenizes line by line. The buffer is truncated at the first control-Z
//! byte, the historic end-of-file marker, before any scanning. After each
//! line a `Newline` sentinel is emitted so the parser can terminate operand
//! lists; the stream ends with `Eof`.

use super::comments::{CommentKind, CommentMap};
use super::cursor::{LineCursor, RawComment};
use super::token::{Token, TokenKind};
use crate::error::Warning;
use text_size::{TextRange, TextSize};

pub struct Lexer<'s> {
    input: &'s str,
}

impl<'s> Lexer<'s> {
    /// Create a new lexer for the given source. Everything from the first
    /// control-Z byte onwards is discarded.
    pub fn new(source: &'s str) -> Self {
        let end = source.find('\x1a').unwrap_or(source.len());
        Lexer {
            input: &source[..end],
        }
    }

    /// The source text after end-of-file truncation.
    pub fn source(&self) -> &'s str {
        self.input
    }

    /// Tokenize the entire input.
    ///
    /// Comments never enter the token stream: a comment on a line that
    /// already produced tokens becomes a trailing comment of the most recent
    /// token, any other comment becomes a leading comment of the next token
    /// produced (or stays anchored to `Eof` when no token follows).
    pub fn tokenize(&self) -> (Vec<Token>, CommentMap, Vec<Warning>) {
        let mut tokens = Vec::new();
        let mut comments = CommentMap::new();
        let mut warnings = Vec::new();
        let mut pending: Vec<RawComment> = Vec::new();

        let mut offset = 0usize;
        let mut lines = self.input.split('\n').peekable();
        while let Some(line) = lines.next() {
            let cursor = LineCursor::new(offset);
            let (line_tokens, line_comments, line_warnings) = cursor.tokenize_line(line);
            warnings.extend(line_warnings);

            if !line_tokens.is_empty() {
                for raw in pending.drain(..) {
                    comments.add_comment(raw.text, raw.span, CommentKind::Leading, tokens.len());
                }
            }
            let produced = !line_tokens.is_empty();
            tokens.extend(line_tokens);

            for raw in line_comments {
                if produced {
                    comments.add_comment(raw.text, raw.span, CommentKind::Trailing, tokens.len() - 1);
                } else {
                    pending.push(raw);
                }
            }

            offset += line.len();
            if lines.peek().is_some() {
                let pos = TextSize::from(offset as u32);
                tokens.push(Token::new(TokenKind::Newline, TextRange::new(pos, pos)));
                offset += 1;
            }
        }

        let eof_pos = TextSize::from(self.input.len() as u32);
        for raw in pending.drain(..) {
            comments.add_comment(raw.text, raw.span, CommentKind::Leading, tokens.len());
        }
        tokens.push(Token::new(
            TokenKind::Eof,
            TextRange::new(eof_pos, eof_pos),
        ));
        (tokens, comments, warnings)
    }
}
