//! Function discovery.
//!
//! Entries are seeded from `call` targets, then grown: a labelled node
//! reachable from two different entries whose abstract stack pointer is
//! consistent with an entry (delta 0 or unknown) must itself be a function.

use super::writes::WriteSummary;
use lift86_parser::ast::{Inst, Operand};
use lift86_parser::program::Program;
use std::collections::{BTreeMap, BTreeSet};

/// The resolved target of a `call` instruction, when it names a known label
/// of an existing instruction.
pub fn call_target(program: &Program, index: usize) -> Option<usize> {
    match program.inst(index) {
        Inst::Generic(g) if g.mnemonic == "call" => {
            let name = g.operands.first().and_then(Operand::as_label)?;
            let target = program.label_target(name)?;
            (target < program.len()).then_some(target)
        }
        _ => None,
    }
}

/// Discover function entry indices.
pub fn discover_entries(program: &Program, writes: &[WriteSummary]) -> BTreeSet<usize> {
    let mut entries: BTreeSet<usize> = (0..program.len())
        .filter_map(|i| call_target(program, i))
        .collect();
    if entries.is_empty() {
        return entries;
    }

    let graph = label_graph(program);

    loop {
        let mut owner: BTreeMap<usize, usize> = BTreeMap::new();
        let mut promoted: BTreeSet<usize> = BTreeSet::new();

        for &entry in &entries {
            owner.insert(entry, entry);
            let mut seen: BTreeSet<usize> = BTreeSet::from([entry]);
            let mut stack = vec![entry];
            while let Some(node) = stack.pop() {
                let Some(succs) = graph.get(&node) else {
                    continue;
                };
                for &succ in succs {
                    // Never cross another entry.
                    if entries.contains(&succ) {
                        continue;
                    }
                    if !seen.insert(succ) {
                        continue;
                    }
                    match owner.get(&succ) {
                        Some(&other) if other != entry => {
                            if writes[succ].sp_entry_compatible() {
                                promoted.insert(succ);
                                continue;
                            }
                            // Shared but ineligible code: keep walking.
                            stack.push(succ);
                        }
                        _ => {
                            owner.insert(succ, entry);
                            stack.push(succ);
                        }
                    }
                }
            }
        }

        promoted.retain(|p| !entries.contains(p));
        if promoted.is_empty() {
            break;
        }
        entries.extend(promoted);
    }

    entries
}

/// Adjacency over labelled indices: fall-through to the next labelled index
/// unless a `ret` or unconditional jump intervenes, plus every jump target
/// inside the region.
fn label_graph(program: &Program) -> BTreeMap<usize, BTreeSet<usize>> {
    let n = program.len();
    let nodes: Vec<usize> = program
        .labels_at
        .keys()
        .copied()
        .filter(|&i| i < n)
        .collect();

    let mut graph: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (pos, &node) in nodes.iter().enumerate() {
        let region_end = nodes.get(pos + 1).copied().unwrap_or(n);
        let edges = graph.entry(node).or_default();
        let mut falls_through = true;

        for i in node..region_end {
            match program.inst(i) {
                Inst::Jump(j) => {
                    if let Some(t) = resolve(program, &j.target) {
                        edges.insert(t);
                    }
                    falls_through = false;
                }
                Inst::CondJump(c) => {
                    if let Some(t) = resolve(program, &c.target) {
                        edges.insert(t);
                    }
                }
                Inst::Generic(g) if g.mnemonic == "ret" => falls_through = false,
                _ => {}
            }
        }

        if falls_through && region_end < n {
            edges.insert(region_end);
        }
    }

    graph
}

fn resolve(program: &Program, target: &Operand) -> Option<usize> {
    let t = target
        .as_label()
        .and_then(|name| program.label_target(name))?;
    (t < program.len()).then_some(t)
}
