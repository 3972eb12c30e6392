//! Frozen program model: the instruction stream, label index tables, and
//! extracted constants.
//!
//! Control-flow edges are never embedded in instruction records; every
//! analysis works from the instruction array plus the two label side tables.

use crate::ast::{Inst, InstLine, LabelLine, Line, Operand};
use crate::parser::structured;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use thin_vec::ThinVec;

/// A `NAME EQU value` pair lifted out of the line stream.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub value: Operand,
    pub comments: ThinVec<String>,
}

/// The parsed program, frozen for analysis.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Instructions indexed 0..N-1.
    pub instructions: Vec<InstLine>,
    /// Label name to the index of the next following instruction. Labels at
    /// the very end of the stream map to N.
    pub labels: IndexMap<String, usize>,
    /// Inverse multi-mapping: index to the labels attached there.
    pub labels_at: BTreeMap<usize, Vec<LabelLine>>,
    /// Extracted EQU constants, in source order.
    pub constants: Vec<Constant>,
    /// Comments dangling at end of file.
    pub tail_comments: ThinVec<String>,
}

impl Program {
    /// Assemble a program from parsed lines: run structured-instruction
    /// recognition, lift EQU constants out, and build the label tables.
    pub fn from_lines(mut lines: Vec<Line>, tail_comments: ThinVec<String>) -> Program {
        structured::structure_lines(&mut lines);
        let (lines, constants) = extract_constants(lines);

        let mut program = Program {
            constants,
            tail_comments,
            ..Program::default()
        };

        let mut pending: Vec<LabelLine> = Vec::new();
        for line in lines {
            match line {
                Line::Label(label) => pending.push(label),
                Line::Inst(inst) => {
                    let index = program.instructions.len();
                    for label in pending.drain(..) {
                        program.labels.entry(label.name.clone()).or_insert(index);
                        program.labels_at.entry(index).or_default().push(label);
                    }
                    program.instructions.push(inst);
                }
            }
        }
        let end = program.instructions.len();
        for label in pending {
            program.labels.entry(label.name.clone()).or_insert(end);
            program.labels_at.entry(end).or_default().push(label);
        }

        program
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn inst(&self, index: usize) -> &Inst {
        &self.instructions[index].inst
    }

    /// Resolve a label name to its instruction index.
    pub fn label_target(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

/// Lift `NAME EQU value` pairs out of the stream: a label immediately
/// followed by an `equ` instruction becomes a constant and both lines are
/// removed. Everything else keeps its order.
fn extract_constants(lines: Vec<Line>) -> (Vec<Line>, Vec<Constant>) {
    let mut out = Vec::with_capacity(lines.len());
    let mut constants = Vec::new();
    let mut iter = lines.into_iter().peekable();

    while let Some(line) = iter.next() {
        let label = match line {
            Line::Label(label) => {
                let next_is_equ = matches!(
                    iter.peek(),
                    Some(Line::Inst(il)) if il.inst.mnemonic() == "equ"
                );
                if !next_is_equ {
                    out.push(Line::Label(label));
                    continue;
                }
                label
            }
            other => {
                out.push(other);
                continue;
            }
        };

        let equ = match iter.next() {
            Some(Line::Inst(il)) => il,
            _ => unreachable!(),
        };
        let value = match &equ.inst {
            Inst::Generic(g) => g
                .operands
                .first()
                .cloned()
                .unwrap_or_else(|| Operand::Garbage("missing EQU value".to_string())),
            _ => Operand::Garbage("missing EQU value".to_string()),
        };

        let mut comments: ThinVec<String> = ThinVec::new();
        comments.extend(label.leading.iter().cloned());
        comments.extend(label.trailing.iter().cloned());
        comments.extend(equ.leading.iter().cloned());
        comments.extend(equ.trailing.iter().cloned());

        constants.push(Constant {
            name: label.name,
            value,
            comments,
        });
    }

    (out, constants)
}
