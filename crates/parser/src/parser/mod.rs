//! Line parser for the assembly dialect.
//!
//! Three shapes are recognised: `IDENT ':'` (label), `IDENT <directive> …`
//! (label with a storage directive; the label is emitted without consuming
//! the directive), and `MNEMONIC operand, …` (instruction). Operand errors
//! never fail a line: they produce garbage operands carrying a diagnostic.

mod operands;
pub mod structured;

use crate::ast::{GenericInst, Inst, InstLine, LabelLine, Line, Operand};
use crate::error::{Warning, WarningKind};
use crate::lexer::{CommentMap, Token, TokenKind};
use smallvec::SmallVec;
use thin_vec::ThinVec;

/// Directives that make `IDENT <directive>` a label definition.
const STORAGE_DIRECTIVES: [&str; 5] = ["equ", "db", "dw", "ds", "dm"];

pub struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    comments: CommentMap,
    pos: usize,
    warnings: Vec<Warning>,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, tokens: Vec<Token>, comments: CommentMap) -> Self {
        Parser {
            source,
            tokens,
            comments,
            pos: 0,
            warnings: Vec::new(),
        }
    }

    /// Parse the whole token stream into lines. Returns the lines, any
    /// comments left dangling at end of file, and the collected warnings.
    pub fn parse(mut self) -> (Vec<Line>, ThinVec<String>, Vec<Warning>) {
        let mut lines = Vec::new();
        loop {
            while self.at(TokenKind::Newline) {
                self.advance();
            }
            if self.at(TokenKind::Eof) {
                break;
            }
            self.parse_line(&mut lines);
        }

        let eof_index = self.tokens.len() - 1;
        let tail: ThinVec<String> = self
            .comments
            .leading_for(eof_index)
            .map(|c| c.text.clone())
            .collect();
        (lines, tail, self.warnings)
    }

    /// Parse one source line (everything up to the next newline sentinel).
    fn parse_line(&mut self, out: &mut Vec<Line>) {
        let line_start = self.pos;
        let mut leading: Option<ThinVec<String>> = Some(
            self.comments
                .leading_for(line_start)
                .map(|c| c.text.clone())
                .collect(),
        );
        let mut produced: Vec<Line> = Vec::new();

        // Labels: `name:`. Several may share a line.
        while self.at(TokenKind::Ident) && self.peek_next() == TokenKind::Colon {
            let name = self.current_text().to_string();
            self.advance();
            self.advance();
            produced.push(Line::Label(LabelLine {
                name,
                leading: leading.take().unwrap_or_default(),
                trailing: ThinVec::new(),
            }));
        }

        // Label with storage directive: the directive stays in the stream.
        if self.at(TokenKind::Ident)
            && self.peek_next() == TokenKind::Ident
            && is_storage_directive(self.peek_next_text())
        {
            let name = self.current_text().to_string();
            self.advance();
            produced.push(Line::Label(LabelLine {
                name,
                leading: leading.take().unwrap_or_default(),
                trailing: ThinVec::new(),
            }));
        }

        if !self.at_line_end() {
            if self.at(TokenKind::Ident) {
                let inst = self.parse_instruction();
                produced.push(Line::Inst(InstLine {
                    inst,
                    leading: leading.take().unwrap_or_default(),
                    trailing: ThinVec::new(),
                }));
            } else {
                let span = self.current().span;
                self.warnings.push(Warning::new(
                    WarningKind::MalformedLine {
                        message: format!("expected a mnemonic, found {:?}", self.current_text()),
                    },
                    span,
                ));
                while !self.at_line_end() {
                    self.advance();
                }
            }
        }

        // Trailing comments of the source line attach to the last element it
        // produced.
        let trailing: ThinVec<String> = self
            .comments
            .trailing_in(line_start..self.pos)
            .map(|c| c.text.clone())
            .collect();
        if !trailing.is_empty() {
            match produced.last_mut() {
                Some(Line::Inst(il)) => il.trailing = trailing,
                Some(Line::Label(l)) => l.trailing = trailing,
                None => {}
            }
        }

        out.extend(produced);
    }

    fn parse_instruction(&mut self) -> Inst {
        let mnemonic = self.current_text().to_ascii_lowercase();
        self.advance();

        let mut operands: SmallVec<[Operand; 2]> = SmallVec::new();
        if !self.at_line_end() {
            operands.push(self.parse_operand());
            while !self.at_line_end() {
                if self.at(TokenKind::Comma) {
                    self.advance();
                    operands.push(self.parse_operand());
                } else {
                    let span = self.current().span;
                    let text = self.current_text().to_string();
                    self.warnings.push(Warning::new(
                        WarningKind::BadOperand {
                            message: format!("unexpected {:?} after operand", text),
                        },
                        span,
                    ));
                    operands.push(Operand::Garbage(format!("unexpected {:?}", text)));
                    self.advance();
                }
            }
        }

        Inst::Generic(GenericInst { mnemonic, operands })
    }

    // Token access helpers.

    pub(super) fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    pub(super) fn current_text(&self) -> &str {
        self.current().text(self.source)
    }

    fn peek_next(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn peek_next_text(&self) -> &str {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.text(self.source))
            .unwrap_or("")
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(super) fn at_line_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof)
    }

    pub(super) fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(super) fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

fn is_storage_directive(text: &str) -> bool {
    STORAGE_DIRECTIVES
        .iter()
        .any(|d| text.eq_ignore_ascii_case(d))
}
