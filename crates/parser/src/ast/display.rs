//! Canonical text rendering of operands and instructions, used for the
//! `asm("…")` escapes in the emitted transcription.

use super::instruction::{CondJumpInst, GenericInst, Inst, JumpInst, MemRef, MoveArg, MoveInst};
use super::operand::{ArithOp, Operand, Radix};
use std::fmt;

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Number { value, radix } => match radix {
                Radix::Dec => write!(f, "{}", value),
                Radix::Hex => {
                    let digits = format!("{:X}", value);
                    // Historic spelling: a hex literal starts with a digit.
                    if digits.as_bytes()[0].is_ascii_alphabetic() {
                        write!(f, "0{}H", digits)
                    } else {
                        write!(f, "{}H", digits)
                    }
                }
            },
            Operand::Str(s) => write!(f, "'{}'", s),
            Operand::Symbol(name) => f.write_str(name),
            Operand::Mem(inner) => write!(f, "[{}]", inner),
            Operand::Binary { op, lhs, rhs } => write!(f, "{}{}{}", lhs, op.as_str(), rhs),
            Operand::Unary { op, operand } => write!(f, "{}{}", op.as_str(), operand),
            Operand::Here => f.write_str("$"),
            Operand::Garbage(_) => f.write_str("?"),
        }
    }
}

impl fmt::Display for MemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut first = true;
        if let Some(base) = self.base {
            write!(f, "{}", base)?;
            first = false;
        }
        if let Some(index) = self.index {
            if !first {
                f.write_str("+")?;
            }
            write!(f, "{}", index)?;
            first = false;
        }
        if let Some(disp) = &self.disp {
            if first {
                write!(f, "{}", disp)?;
            } else {
                match disp {
                    Operand::Unary {
                        op: ArithOp::Sub,
                        operand,
                    } => write!(f, "-{}", operand)?,
                    _ => write!(f, "+{}", disp)?,
                }
            }
        }
        f.write_str("]")
    }
}

impl fmt::Display for MoveArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveArg::Reg(r) => write!(f, "{}", r),
            MoveArg::Mem(m) => write!(f, "{}", m),
            MoveArg::Imm(op) => write!(f, "{}", op),
        }
    }
}

impl fmt::Display for GenericInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                f.write_str(" ")?;
            } else {
                f.write_str(", ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

impl fmt::Display for MoveInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mov {}, {}", self.dst, self.src)
    }
}

impl fmt::Display for JumpInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jmp {}", self.target)
    }
}

impl fmt::Display for CondJumpInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mnemonic, self.target)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Generic(g) => write!(f, "{}", g),
            Inst::Move(m) => write!(f, "{}", m),
            Inst::Jump(j) => write!(f, "{}", j),
            Inst::CondJump(c) => write!(f, "{}", c),
        }
    }
}
