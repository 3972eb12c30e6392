//! Liveness analysis.
//!
//! Backward dataflow computing, per instruction, the registers live on
//! entry. Runs after the write analysis and function discovery: calls
//! propagate liveness through the callee entry, and `ret` instructions pick
//! up the registers their function's callers actually consume.
//!
//! Live sets are stored covering-decomposed (never `ax` where `ah`/`al`
//! would do); `expand_coverings` restores the closure for consumers.

use super::functions::call_target;
use super::io::instruction_io;
use super::writes::WriteSummary;
use lift86_parser::ast::{decompose_coverings, expand_aliases, Inst, Operand, RegSet};
use lift86_parser::program::Program;
use std::collections::{BTreeMap, BTreeSet};

/// Result of the liveness pass.
#[derive(Debug, Clone)]
pub struct Liveness {
    /// Registers live on entry, per instruction index.
    pub live_before: Vec<RegSet>,
    /// Per function entry, the registers its callers might consume of the
    /// ones the function writes.
    pub function_returns: BTreeMap<usize, RegSet>,
}

pub fn analyze_liveness(
    program: &Program,
    writes: &[WriteSummary],
    entries: &BTreeSet<usize>,
) -> Liveness {
    let n = program.len();
    // Index n stands for the (empty) state past the end of the stream.
    let mut live: Vec<RegSet> = vec![RegSet::new(); n + 1];

    let mut call_origins: BTreeMap<usize, Vec<usize>> =
        entries.iter().map(|&e| (e, Vec::new())).collect();
    for i in 0..n {
        if let Some(target) = call_target(program, i) {
            if let Some(origins) = call_origins.get_mut(&target) {
                origins.push(i);
            }
        }
    }

    let mut function_returns = BTreeMap::new();
    loop {
        // function_returns depends on the live sets, so it is refreshed at
        // the top of every outer iteration.
        function_returns = compute_function_returns(&call_origins, writes, &live);

        let mut changed = false;
        for i in (0..n).rev() {
            let new = transfer(program, writes, &function_returns, &live, i);
            if !new.is_subset(&live[i]) {
                live[i].extend(new);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    live.truncate(n);
    Liveness {
        live_before: live,
        function_returns,
    }
}

/// `function_returns[e]`: union over every call origin c of
/// `live_before(c+1) ∩ dom(writes_from[e])`. The intersection restricts the
/// set to registers the callee actually writes; everything else passes
/// through a call unchanged and need not be considered returned.
fn compute_function_returns(
    call_origins: &BTreeMap<usize, Vec<usize>>,
    writes: &[WriteSummary],
    live: &[RegSet],
) -> BTreeMap<usize, RegSet> {
    call_origins
        .iter()
        .map(|(&entry, origins)| {
            let domain = writes[entry].writes_domain();
            let mut returned = RegSet::new();
            for &origin in origins {
                returned.extend(live[origin + 1].intersection(&domain).copied());
            }
            (entry, returned)
        })
        .collect()
}

fn transfer(
    program: &Program,
    writes: &[WriteSummary],
    function_returns: &BTreeMap<usize, RegSet>,
    live: &[RegSet],
    i: usize,
) -> RegSet {
    match program.inst(i) {
        Inst::Jump(j) => match resolve(program, &j.target) {
            Target::Index(t) => live[t].clone(),
            Target::RetLiteral => return_site_live(writes, function_returns, i),
            Target::Unknown => RegSet::new(),
        },
        Inst::CondJump(c) => {
            let mut set = live[i + 1].clone();
            set.extend(c.cond.uses());
            match resolve(program, &c.target) {
                Target::Index(t) => set.extend(live[t].iter().copied()),
                Target::RetLiteral => {
                    set.extend(return_site_live(writes, function_returns, i));
                }
                Target::Unknown => {}
            }
            decompose_coverings(&set)
        }
        Inst::Generic(g) if g.mnemonic == "ret" => return_site_live(writes, function_returns, i),
        Inst::Generic(g) if g.mnemonic == "call" => match call_target(program, i) {
            Some(target) => {
                // Only registers the callee writes can change across the
                // call; the rest of the fall-through state passes through.
                let domain = writes[target].writes_domain();
                let mut set = live[target].clone();
                set.extend(
                    live[i + 1]
                        .iter()
                        .copied()
                        .filter(|r| !domain.contains(r)),
                );
                set
            }
            None => live[i + 1].clone(),
        },
        inst => {
            let io = instruction_io(inst);
            let mut set = decompose_coverings(&live[i + 1]);
            let killed = expand_aliases(&io.defines);
            set.retain(|r| !killed.contains(r));
            set.extend(io.uses);
            decompose_coverings(&set)
        }
    }
}

/// Live state at a return site: everything any owning function's callers
/// consume.
fn return_site_live(
    writes: &[WriteSummary],
    function_returns: &BTreeMap<usize, RegSet>,
    i: usize,
) -> RegSet {
    let mut set = RegSet::new();
    for (&entry, returned) in function_returns {
        if writes[entry].returns_through(i) {
            set.extend(returned.iter().copied());
        }
    }
    set
}

enum Target {
    Index(usize),
    RetLiteral,
    Unknown,
}

fn resolve(program: &Program, target: &Operand) -> Target {
    match target.as_label() {
        Some(name) => match program.label_target(name) {
            Some(t) => Target::Index(t),
            None if name.eq_ignore_ascii_case("ret") => Target::RetLiteral,
            None => Target::Unknown,
        },
        None => Target::Unknown,
    }
}
