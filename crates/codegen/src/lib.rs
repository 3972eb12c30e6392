//! lift86-codegen: whole-program static analyses over a parsed assembly
//! stream, and the annotated pseudo-C emitter.
//!
//! Three interacting fixpoint analyses share one register aliasing algebra:
//!
//! - **write analysis**: per instruction, what the suffix starting there
//!   does to registers if reached, with stack-slot provenance
//! - **function discovery**: which labelled indices behave like function
//!   entries, seeded from `call` targets and grown by stack-pointer
//!   reasoning
//! - **liveness**: which registers are live on entry to each instruction,
//!   with inter-procedural return propagation
//!
//! The analyses are deliberately conservative: whenever precision cannot be
//! proved, the most permissive abstract value wins.

pub mod analysis;
pub mod emit;

pub use analysis::{analyze, Analysis, Liveness, SpDelta, SuffixWrites, WriteSummary, WriteVal};
pub use emit::emit;
