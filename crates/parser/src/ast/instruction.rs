//! Instruction and line AST nodes.

use super::operand::Operand;
use super::registers::Reg;
use smallvec::SmallVec;
use thin_vec::ThinVec;

/// A generic instruction: lowercased mnemonic plus operand list.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericInst {
    pub mnemonic: String,
    pub operands: SmallVec<[Operand; 2]>,
}

/// One side of a structured data move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveArg {
    Reg(Reg),
    Mem(MemRef),
    Imm(Operand),
}

impl MoveArg {
    pub fn as_reg(&self) -> Option<Reg> {
        match self {
            MoveArg::Reg(r) => Some(*r),
            _ => None,
        }
    }
}

/// A classified memory operand: base restricted to `bx`/`bp`, index to
/// `si`/`di`, displacement an immediate expression.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRef {
    pub base: Option<Reg>,
    pub index: Option<Reg>,
    pub disp: Option<Operand>,
}

/// Structured `mov`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveInst {
    pub dst: MoveArg,
    pub src: MoveArg,
}

/// Structured unconditional jump.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpInst {
    pub target: Operand,
}

/// Structured conditional jump. The original mnemonic is retained so the
/// emitter reproduces the source spelling (`jz` vs `je`).
#[derive(Debug, Clone, PartialEq)]
pub struct CondJumpInst {
    pub mnemonic: String,
    pub cond: Condition,
    pub target: Operand,
}

/// Condition codes of the 8086 conditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    O,
    No,
    B,
    Nb,
    E,
    Ne,
    Be,
    Nbe,
    S,
    Ns,
    P,
    Np,
    L,
    Nl,
    Le,
    Nle,
    Cxz,
}

impl Condition {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Condition> {
        Some(match mnemonic {
            "jo" => Condition::O,
            "jno" => Condition::No,
            "jb" | "jc" | "jnae" => Condition::B,
            "jnb" | "jnc" | "jae" => Condition::Nb,
            "je" | "jz" => Condition::E,
            "jne" | "jnz" => Condition::Ne,
            "jbe" | "jna" => Condition::Be,
            "jnbe" | "ja" => Condition::Nbe,
            "js" => Condition::S,
            "jns" => Condition::Ns,
            "jp" | "jpe" => Condition::P,
            "jnp" | "jpo" => Condition::Np,
            "jl" | "jnge" => Condition::L,
            "jnl" | "jge" => Condition::Nl,
            "jle" | "jng" => Condition::Le,
            "jnle" | "jg" => Condition::Nle,
            "jcxz" => Condition::Cxz,
            _ => return None,
        })
    }

    /// The machine state this condition reads: exactly the flag bits the
    /// condition tests, or `cx` for `jcxz`.
    pub fn uses(self) -> &'static [Reg] {
        match self {
            Condition::O | Condition::No => &[Reg::Of],
            Condition::B | Condition::Nb => &[Reg::Cf],
            Condition::E | Condition::Ne => &[Reg::Zf],
            Condition::Be | Condition::Nbe => &[Reg::Cf, Reg::Zf],
            Condition::S | Condition::Ns => &[Reg::Sf],
            Condition::P | Condition::Np => &[Reg::Pf],
            Condition::L | Condition::Nl => &[Reg::Of, Reg::Sf],
            Condition::Le | Condition::Nle => &[Reg::Of, Reg::Sf, Reg::Zf],
            Condition::Cxz => &[Reg::Cx],
        }
    }
}

/// An instruction in one of its recognised forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Generic(GenericInst),
    Move(MoveInst),
    Jump(JumpInst),
    CondJump(CondJumpInst),
}

impl Inst {
    pub fn mnemonic(&self) -> &str {
        match self {
            Inst::Generic(g) => &g.mnemonic,
            Inst::Move(_) => "mov",
            Inst::Jump(_) => "jmp",
            Inst::CondJump(c) => &c.mnemonic,
        }
    }

}

/// A label attached to the instruction stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLine {
    pub name: String,
    pub leading: ThinVec<String>,
    pub trailing: ThinVec<String>,
}

/// An instruction with its source comments.
#[derive(Debug, Clone, PartialEq)]
pub struct InstLine {
    pub inst: Inst,
    pub leading: ThinVec<String>,
    pub trailing: ThinVec<String>,
}

/// One parsed line element.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Label(LabelLine),
    Inst(InstLine),
}
