//! Write analysis: a backward fixpoint over suffixes of the instruction
//! stream.
//!
//! For every index i the analysis computes what the suffix starting at i does
//! to registers if it is ever reached: which registers are clobbered, which
//! end up holding another register's entry value, which end up holding bytes
//! that lay on the stack at entry, at which indices the suffix can execute a
//! `ret`, and the abstract stack-pointer delta.
//!
//! The value lattice has three levels per binding, absent < Reg/Stack < Any,
//! and cells only move upward, so the reverse-index sweep terminates.

use super::io::instruction_io;
use lift86_parser::ast::{expand_aliases, Inst, MoveArg, Operand, Reg, RegSet};
use lift86_parser::program::Program;
use std::collections::{BTreeMap, BTreeSet};

/// Abstract value a written register ends up holding, relative to entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteVal {
    /// Holds the value another register had on entry to the suffix.
    Reg(Reg),
    /// Holds the `size` bytes that lay at stack offset `idx` on entry.
    Stack { idx: i32, size: u8 },
    /// Clobbered to an unknown value.
    Any,
}

/// Abstract stack-pointer delta from suffix entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpDelta {
    Known(i32),
    Any,
}

impl SpDelta {
    fn shift(self, delta: i32) -> SpDelta {
        match self {
            SpDelta::Known(v) => SpDelta::Known(v + delta),
            SpDelta::Any => SpDelta::Any,
        }
    }
}

/// Register effects of a suffix that can run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixWrites {
    pub writes: BTreeMap<Reg, WriteVal>,
    /// Indices at which the suffix can execute a `ret`. Empty when control
    /// simply falls off the end of the stream.
    pub returns_at: BTreeSet<usize>,
    pub sp: SpDelta,
}

impl SuffixWrites {
    fn empty() -> Self {
        SuffixWrites {
            writes: BTreeMap::new(),
            returns_at: BTreeSet::new(),
            sp: SpDelta::Known(0),
        }
    }
}

/// Write summary of the suffix starting at an instruction.
///
/// `NoReturn` is the lattice bottom: the suffix never hands control back
/// (initial value of the fixpoint, jumps to unresolved targets, infinite
/// loops). It carries no writes by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteSummary {
    NoReturn,
    Returns(SuffixWrites),
}

impl WriteSummary {
    pub fn is_no_return(&self) -> bool {
        matches!(self, WriteSummary::NoReturn)
    }

    pub fn suffix(&self) -> Option<&SuffixWrites> {
        match self {
            WriteSummary::NoReturn => None,
            WriteSummary::Returns(s) => Some(s),
        }
    }

    /// The registers this suffix writes at all.
    pub fn writes_domain(&self) -> RegSet {
        match self {
            WriteSummary::NoReturn => RegSet::new(),
            WriteSummary::Returns(s) => s.writes.keys().copied().collect(),
        }
    }

    /// Whether index `i` is one of this suffix's return sites.
    pub fn returns_through(&self, i: usize) -> bool {
        match self {
            WriteSummary::NoReturn => false,
            WriteSummary::Returns(s) => s.returns_at.contains(&i),
        }
    }

    /// True when the suffix can never execute a `ret`.
    pub fn never_returns(&self) -> bool {
        match self {
            WriteSummary::NoReturn => true,
            WriteSummary::Returns(s) => s.returns_at.is_empty(),
        }
    }

    /// Whether the abstract stack pointer here is consistent with a function
    /// entry (delta 0 or unknown).
    pub fn sp_entry_compatible(&self) -> bool {
        match self {
            WriteSummary::NoReturn => true,
            WriteSummary::Returns(s) => matches!(s.sp, SpDelta::Any | SpDelta::Known(0)),
        }
    }
}

/// Run the backward fixpoint and return one summary per instruction.
pub fn analyze_writes(program: &Program) -> Vec<WriteSummary> {
    let n = program.len();
    let mut summaries = vec![WriteSummary::NoReturn; n];

    loop {
        let mut changed = false;
        for i in (0..n).rev() {
            let new = transfer(program, &summaries, i);
            if new != summaries[i] {
                summaries[i] = new;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    summaries
}

/// Summary of the suffix starting at `index`; past the end of the stream the
/// suffix is empty and completes immediately.
fn summary_at(summaries: &[WriteSummary], index: usize) -> WriteSummary {
    summaries
        .get(index)
        .cloned()
        .unwrap_or(WriteSummary::Returns(SuffixWrites::empty()))
}

fn ret_summary(index: usize) -> WriteSummary {
    WriteSummary::Returns(SuffixWrites {
        writes: BTreeMap::new(),
        returns_at: BTreeSet::from([index]),
        sp: SpDelta::Known(0),
    })
}

fn transfer(program: &Program, summaries: &[WriteSummary], i: usize) -> WriteSummary {
    let succ = summary_at(summaries, i + 1);
    match program.inst(i) {
        Inst::Move(m) => transfer_move(&m.dst, &m.src, succ),
        Inst::Jump(j) => jump_summary(program, summaries, &j.target, i),
        Inst::CondJump(c) => {
            let taken = jump_summary(program, summaries, &c.target, i);
            merge(&taken, &succ)
        }
        Inst::Generic(g) => match g.mnemonic.as_str() {
            "push" => {
                let pushed = g.operands.first().and_then(Operand::as_register);
                pop_through(&succ, 2, pushed)
            }
            "pop" => {
                let shifted = push_through(&succ, 2);
                match g.operands.first().and_then(Operand::as_register) {
                    Some(reg) => {
                        // The destination now holds the popped word; slot
                        // offsets are relative to entry, before the pop.
                        let mut dmap = BTreeMap::new();
                        dmap.insert(reg, WriteVal::Stack { idx: 0, size: 2 });
                        if let Some((hi, lo)) = reg.covering() {
                            dmap.insert(lo, WriteVal::Stack { idx: 0, size: 1 });
                            dmap.insert(hi, WriteVal::Stack { idx: 1, size: 1 });
                        }
                        seq(&shifted, &dmap)
                    }
                    None => shifted,
                }
            }
            "ret" => ret_summary(i),
            // A known simplification carried over from the original: calls
            // and interrupts fall through as if they defined nothing.
            "call" | "int" => succ,
            _ => {
                let io = instruction_io(program.inst(i));
                let mut dmap = BTreeMap::new();
                for reg in expand_aliases(&io.defines) {
                    dmap.insert(reg, WriteVal::Any);
                }
                seq(&succ, &dmap)
            }
        },
    }
}

fn transfer_move(dst: &MoveArg, src: &MoveArg, succ: WriteSummary) -> WriteSummary {
    if dst.as_reg() == Some(Reg::Sp) {
        // Resetting sp severs all stack aliasing in the suffix.
        return match succ {
            WriteSummary::NoReturn => WriteSummary::NoReturn,
            WriteSummary::Returns(s) => WriteSummary::Returns(SuffixWrites {
                writes: s
                    .writes
                    .into_iter()
                    .map(|(k, v)| match v {
                        WriteVal::Stack { .. } => (k, WriteVal::Any),
                        other => (k, other),
                    })
                    .collect(),
                returns_at: s.returns_at,
                sp: SpDelta::Any,
            }),
        };
    }

    let dst_reg = match dst.as_reg() {
        Some(r) => r,
        // Stores to memory leave every register untouched.
        None => return succ,
    };

    let mut dmap: BTreeMap<Reg, WriteVal> = BTreeMap::new();
    for alias in expand_aliases(&RegSet::from([dst_reg])) {
        dmap.insert(alias, WriteVal::Any);
    }
    if let Some(src_reg) = src.as_reg() {
        dmap.insert(dst_reg, WriteVal::Reg(src_reg));
        if let (Some((dh, dl)), Some((sh, sl))) = (dst_reg.covering(), src_reg.covering()) {
            dmap.insert(dh, WriteVal::Reg(sh));
            dmap.insert(dl, WriteVal::Reg(sl));
        }
    }
    dmap.retain(|k, v| *v != WriteVal::Reg(*k));
    seq(&succ, &dmap)
}

/// Sequence an instruction that subtracts `delta` from sp (in entry-relative
/// terms, stack aliases sink deeper) before `next`.
fn push_through(next: &WriteSummary, delta: i32) -> WriteSummary {
    let s = match next.suffix() {
        Some(s) => s,
        None => return WriteSummary::NoReturn,
    };
    WriteSummary::Returns(SuffixWrites {
        writes: s
            .writes
            .iter()
            .map(|(&k, &v)| match v {
                WriteVal::Stack { idx, size } => (
                    k,
                    WriteVal::Stack {
                        idx: idx + delta,
                        size,
                    },
                ),
                other => (k, other),
            })
            .collect(),
        returns_at: s.returns_at.clone(),
        sp: s.sp.shift(delta),
    })
}

/// Sequence a read-from-top-of-stack before `next`: stack aliases within the
/// consumed word are restored against `result`, aliases below it become
/// garbage, the rest move up.
fn pop_through(next: &WriteSummary, delta: i32, result: Option<Reg>) -> WriteSummary {
    let s = match next.suffix() {
        Some(s) => s,
        None => return WriteSummary::NoReturn,
    };
    let mut writes = BTreeMap::new();
    for (&k, &v) in &s.writes {
        let nv = match v {
            WriteVal::Stack { idx, size } if idx >= delta => WriteVal::Stack {
                idx: idx - delta,
                size,
            },
            WriteVal::Stack { idx, size } if idx + i32::from(size) <= delta => {
                restore(result, idx, size)
            }
            WriteVal::Stack { .. } => WriteVal::Any,
            other => other,
        };
        if nv != WriteVal::Reg(k) {
            writes.insert(k, nv);
        }
    }
    WriteSummary::Returns(SuffixWrites {
        writes,
        returns_at: s.returns_at.clone(),
        sp: s.sp.shift(-delta),
    })
}

/// Map a stack slice of the consumed word back onto the register whose push
/// produced it: the whole word, or the matching covering byte.
fn restore(result: Option<Reg>, idx: i32, size: u8) -> WriteVal {
    let reg = match result {
        Some(r) => r,
        None => return WriteVal::Any,
    };
    match (idx, size) {
        (0, 2) => WriteVal::Reg(reg),
        (_, 1) => match reg.covering() {
            Some((hi, lo)) => WriteVal::Reg(if idx == 0 { lo } else { hi }),
            None => WriteVal::Any,
        },
        _ => WriteVal::Any,
    }
}

/// Sequence a single-instruction write map before `next`.
fn seq(next: &WriteSummary, dmap: &BTreeMap<Reg, WriteVal>) -> WriteSummary {
    let s = match next.suffix() {
        Some(s) => s,
        None => return WriteSummary::NoReturn,
    };
    let mut writes = BTreeMap::new();
    for (&k, &v) in &s.writes {
        let nv = match v {
            // The suffix keeps r's entry value, but this instruction just
            // defined r: compose.
            WriteVal::Reg(r) => dmap.get(&r).copied().unwrap_or(WriteVal::Reg(r)),
            other => other,
        };
        if nv != WriteVal::Reg(k) {
            writes.insert(k, nv);
        }
    }
    for (&k, &v) in dmap {
        if !s.writes.contains_key(&k) && v != WriteVal::Reg(k) {
            writes.insert(k, v);
        }
    }
    WriteSummary::Returns(SuffixWrites {
        writes,
        returns_at: s.returns_at.clone(),
        sp: s.sp,
    })
}

/// Summary along a jump edge: the target's suffix for a resolved label, a
/// fresh return edge for the conditional-return idiom `j<cc> ret`, bottom
/// otherwise.
fn jump_summary(
    program: &Program,
    summaries: &[WriteSummary],
    target: &Operand,
    i: usize,
) -> WriteSummary {
    match target.as_label() {
        Some(name) => match program.label_target(name) {
            Some(t) => summary_at(summaries, t),
            None if name.eq_ignore_ascii_case("ret") => ret_summary(i),
            None => WriteSummary::NoReturn,
        },
        None => WriteSummary::NoReturn,
    }
}

/// Join two suffix summaries reaching the same instruction.
fn merge(a: &WriteSummary, b: &WriteSummary) -> WriteSummary {
    let (sa, sb) = match (a.suffix(), b.suffix()) {
        (None, _) => return b.clone(),
        (_, None) => return a.clone(),
        (Some(sa), Some(sb)) => (sa, sb),
    };

    let mut keys: BTreeSet<Reg> = sa.writes.keys().copied().collect();
    keys.extend(sb.writes.keys().copied());
    let writes = keys
        .into_iter()
        .map(|k| {
            let v = match (sa.writes.get(&k), sb.writes.get(&k)) {
                (Some(&x), Some(&y)) if x == y => x,
                _ => WriteVal::Any,
            };
            (k, v)
        })
        .collect();

    WriteSummary::Returns(SuffixWrites {
        writes,
        returns_at: sa.returns_at.union(&sb.returns_at).copied().collect(),
        sp: if sa.sp == sb.sp { sa.sp } else { SpDelta::Any },
    })
}
