//! AST types: registers, operands, instructions, lines.

pub mod display;
pub mod instruction;
pub mod operand;
pub mod registers;

pub use instruction::{
    CondJumpInst, Condition, GenericInst, Inst, InstLine, JumpInst, LabelLine, Line, MemRef,
    MoveArg, MoveInst,
};
pub use operand::{ArithOp, Operand, Radix};
pub use registers::{
    decompose_coverings, expand_aliases, expand_coverings, expand_subregs, Reg, RegSet,
};
