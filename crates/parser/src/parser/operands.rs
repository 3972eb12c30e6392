//! Operand grammar: left-associative `+`/`-` over primaries.

use super::Parser;
use crate::ast::{ArithOp, Operand, Radix, Reg};
use crate::error::{Warning, WarningKind};
use crate::lexer::TokenKind;

impl<'s> Parser<'s> {
    /// Parse one operand. Never fails: unparsable input yields a garbage
    /// operand carrying the diagnostic.
    pub(super) fn parse_operand(&mut self) -> Operand {
        self.parse_arith()
    }

    fn parse_arith(&mut self) -> Operand {
        let mut lhs = self.parse_primary();
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_primary();
            lhs = Operand::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_primary(&mut self) -> Operand {
        match self.current().kind {
            TokenKind::LBracket => {
                self.advance();
                let inner = self.parse_arith();
                if self.at(TokenKind::RBracket) {
                    self.advance();
                    Operand::Mem(Box::new(inner))
                } else {
                    self.bad_operand("missing ']' in memory operand".to_string())
                }
            }
            TokenKind::Plus => {
                self.advance();
                Operand::Unary {
                    op: ArithOp::Add,
                    operand: Box::new(self.parse_primary()),
                }
            }
            TokenKind::Minus => {
                self.advance();
                Operand::Unary {
                    op: ArithOp::Sub,
                    operand: Box::new(self.parse_primary()),
                }
            }
            TokenKind::Ident => {
                let text = self.current_text().to_string();
                self.advance();
                match Reg::from_operand_name(&text) {
                    Some(reg) => Operand::Register(reg),
                    None => Operand::Symbol(text),
                }
            }
            TokenKind::Number => {
                let text = self.current_text().to_string();
                self.advance();
                self.parse_number(&text)
            }
            TokenKind::Str => {
                let text = self.current_text();
                let body = text[1..text.len() - 1].to_string();
                self.advance();
                Operand::Str(body)
            }
            TokenKind::Dollar => {
                self.advance();
                Operand::Here
            }
            TokenKind::Error => {
                let text = self.current_text().to_string();
                self.advance();
                self.bad_operand(format!("unrecognised input {:?}", text))
            }
            _ => {
                let text = self.current_text().to_string();
                let garbage = self.bad_operand(format!("expected an operand, found {:?}", text));
                // Leave the offending token for the caller's recovery loop.
                garbage
            }
        }
    }

    fn parse_number(&mut self, text: &str) -> Operand {
        let (digits, radix) = match text.as_bytes().last() {
            Some(b'h') | Some(b'H') => (&text[..text.len() - 1], Radix::Hex),
            _ => (text, Radix::Dec),
        };
        let parsed = match radix {
            Radix::Hex => i64::from_str_radix(digits, 16),
            Radix::Dec => digits.parse::<i64>(),
        };
        match parsed {
            Ok(value) => Operand::Number { value, radix },
            Err(_) => self.bad_operand(format!("invalid number {:?}", text)),
        }
    }

    fn bad_operand(&mut self, message: String) -> Operand {
        let span = self.current().span;
        self.warn(Warning::new(
            WarningKind::BadOperand {
                message: message.clone(),
            },
            span,
        ));
        Operand::Garbage(message)
    }
}
