//! Command-line interface for lift86.

use clap::Parser;
use std::path::PathBuf;

/// lift86 - annotate historic 8086 assembly as pseudo-C
///
/// Reads an assembly source file, runs the whole-program static analyses
/// (register write-effects, function discovery, liveness), and writes a
/// pseudo-C transcription in which every instruction is preserved inside an
/// asm("…") escape with its analysis results as comments.
#[derive(Parser)]
#[command(name = "lift86")]
#[command(author, version, about)]
pub struct Cli {
    /// Input assembly file
    #[arg(default_value = "asm.s86")]
    pub input: PathBuf,

    /// Output file (defaults to the input path with a .c extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Resolve the output path.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.input.with_extension("c"),
        }
    }
}
