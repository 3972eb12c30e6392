//! The three interacting static analyses and the shared IO model.
//!
//! They run in a fixed order: write summaries first, then function
//! discovery (which needs the abstract stack pointer), then liveness (which
//! needs both).

pub mod functions;
pub mod io;
pub mod liveness;
pub mod writes;

use lift86_parser::program::Program;
use std::collections::BTreeSet;

pub use functions::discover_entries;
pub use io::{instruction_io, InstIo};
pub use liveness::{analyze_liveness, Liveness};
pub use writes::{analyze_writes, SpDelta, SuffixWrites, WriteSummary, WriteVal};

/// Everything the emitter needs to annotate a program.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub writes: Vec<WriteSummary>,
    pub entries: BTreeSet<usize>,
    pub liveness: Liveness,
    /// Unknown-mnemonic reports, one per mnemonic.
    pub warnings: Vec<String>,
}

/// Run the whole pipeline over a frozen program.
pub fn analyze(program: &Program) -> Analysis {
    let writes = analyze_writes(program);
    let entries = discover_entries(program, &writes);
    let liveness = analyze_liveness(program, &writes, &entries);

    let mut unknown = BTreeSet::new();
    for index in 0..program.len() {
        let inst = program.inst(index);
        if !instruction_io(inst).known {
            unknown.insert(inst.mnemonic().to_string());
        }
    }
    let warnings = unknown
        .into_iter()
        .map(|m| format!("unknown mnemonic '{}' treated as having no effect", m))
        .collect();

    Analysis {
        writes,
        entries,
        liveness,
        warnings,
    }
}
