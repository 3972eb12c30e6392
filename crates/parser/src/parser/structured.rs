//! Structured-instruction recognition.
//!
//! A post-pass over generic instructions that types `mov` and the jump
//! family. Any shape mismatch silently retains the generic form, which the
//! analyses treat conservatively.

use crate::ast::{
    ArithOp, CondJumpInst, Condition, GenericInst, Inst, JumpInst, MemRef, MoveArg, MoveInst,
    Operand, Reg,
};

/// Convert a generic instruction into its structured form where one applies.
pub fn structure(generic: GenericInst) -> Inst {
    match generic.mnemonic.as_str() {
        "mov" if generic.operands.len() == 2 => {
            let dst = classify(&generic.operands[0]);
            let src = classify(&generic.operands[1]);
            match (dst, src) {
                (Some(dst @ MoveArg::Reg(_)), Some(src))
                | (Some(dst @ MoveArg::Mem(_)), Some(src)) => Inst::Move(MoveInst { dst, src }),
                _ => Inst::Generic(generic),
            }
        }
        "jmp" if generic.operands.len() == 1 => Inst::Jump(JumpInst {
            target: generic.operands[0].clone(),
        }),
        mnemonic => match Condition::from_mnemonic(mnemonic) {
            Some(cond) if generic.operands.len() == 1 => Inst::CondJump(CondJumpInst {
                mnemonic: mnemonic.to_string(),
                cond,
                target: generic.operands[0].clone(),
            }),
            _ => Inst::Generic(generic),
        },
    }
}

/// Run the post-pass over every instruction line in place.
pub fn structure_lines(lines: &mut [crate::ast::Line]) {
    for line in lines {
        if let crate::ast::Line::Inst(il) = line {
            if let Inst::Generic(g) = &il.inst {
                il.inst = structure(g.clone());
            }
        }
    }
}

fn classify(operand: &Operand) -> Option<MoveArg> {
    match operand {
        Operand::Register(r) => Some(MoveArg::Reg(*r)),
        Operand::Mem(inner) => classify_mem(inner).map(MoveArg::Mem),
        Operand::Garbage(_) => None,
        other => Some(MoveArg::Imm(other.clone())),
    }
}

/// Split a memory address expression into base (`bx`/`bp`), index (`si`/`di`)
/// and an immediate displacement. Any other register role fails.
fn classify_mem(expr: &Operand) -> Option<MemRef> {
    let mut terms = Vec::new();
    if !flatten(expr, true, &mut terms) {
        return None;
    }

    let mut base = None;
    let mut index = None;
    let mut disp: Option<Operand> = None;
    for (positive, term) in terms {
        if let Operand::Register(r) = term {
            if !positive {
                return None;
            }
            match r {
                Reg::Bx | Reg::Bp if base.is_none() => base = Some(*r),
                Reg::Si | Reg::Di if index.is_none() => index = Some(*r),
                _ => return None,
            }
        } else {
            let signed = if positive {
                term.clone()
            } else {
                Operand::Unary {
                    op: ArithOp::Sub,
                    operand: Box::new(term.clone()),
                }
            };
            disp = Some(match disp {
                None => signed,
                Some(acc) => Operand::Binary {
                    op: ArithOp::Add,
                    lhs: Box::new(acc),
                    rhs: Box::new(signed),
                },
            });
        }
    }
    Some(MemRef { base, index, disp })
}

/// Flatten an address expression into sign-annotated leaf terms.
fn flatten<'a>(expr: &'a Operand, positive: bool, out: &mut Vec<(bool, &'a Operand)>) -> bool {
    match expr {
        Operand::Binary { op, lhs, rhs } => {
            let rhs_sign = match op {
                ArithOp::Add => positive,
                ArithOp::Sub => !positive,
            };
            flatten(lhs, positive, out) && flatten(rhs, rhs_sign, out)
        }
        Operand::Unary { op, operand } => {
            let sign = match op {
                ArithOp::Add => positive,
                ArithOp::Sub => !positive,
            };
            flatten(operand, sign, out)
        }
        Operand::Garbage(_) => false,
        leaf => {
            out.push((positive, leaf));
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn generic(mnemonic: &str, operands: Vec<Operand>) -> GenericInst {
        GenericInst {
            mnemonic: mnemonic.to_string(),
            operands: operands.into(),
        }
    }

    #[test]
    fn structures_register_move() {
        let inst = structure(generic(
            "mov",
            vec![Operand::Register(Reg::Ax), Operand::Register(Reg::Bx)],
        ));
        match inst {
            Inst::Move(m) => {
                assert_eq!(m.dst, MoveArg::Reg(Reg::Ax));
                assert_eq!(m.src, MoveArg::Reg(Reg::Bx));
            }
            other => panic!("expected a structured move, got {:?}", other),
        }
    }

    #[test]
    fn classifies_based_indexed_memory() {
        let addr = Operand::Binary {
            op: ArithOp::Add,
            lhs: Box::new(Operand::Register(Reg::Bp)),
            rhs: Box::new(Operand::Register(Reg::Si)),
        };
        let inst = structure(generic(
            "mov",
            vec![
                Operand::Mem(Box::new(addr)),
                Operand::Register(Reg::Ax),
            ],
        ));
        match inst {
            Inst::Move(MoveInst {
                dst: MoveArg::Mem(m),
                ..
            }) => {
                assert_eq!(m.base, Some(Reg::Bp));
                assert_eq!(m.index, Some(Reg::Si));
                assert_eq!(m.disp, None);
            }
            other => panic!("expected a memory move, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unsupported_base_register() {
        let addr = Operand::Register(Reg::Ax);
        let inst = structure(generic(
            "mov",
            vec![
                Operand::Mem(Box::new(addr)),
                Operand::Register(Reg::Bx),
            ],
        ));
        assert!(matches!(inst, Inst::Generic(_)));
    }

    #[test]
    fn structures_jump_family() {
        let inst = structure(generic("jz", vec![Operand::Symbol("loop1".into())]));
        match inst {
            Inst::CondJump(c) => {
                assert_eq!(c.mnemonic, "jz");
                assert_eq!(c.cond, Condition::E);
            }
            other => panic!("expected a conditional jump, got {:?}", other),
        }

        let inst = structure(generic("jmp", vec![Operand::Symbol("exit".into())]));
        assert!(matches!(inst, Inst::Jump(_)));
    }

    #[test]
    fn keeps_generic_on_operand_count_mismatch() {
        let inst = structure(generic("mov", vec![Operand::Register(Reg::Ax)]));
        assert!(matches!(inst, Inst::Generic(_)));
    }
}
