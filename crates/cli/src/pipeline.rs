//! Pipeline for processing one assembly file.
//!
//! Read → lex → parse → analyse → emit → write. Only the two I/O steps can
//! fail; everything in between degrades to warnings and garbage markers in
//! the output.

use lift86_codegen::{analyze, emit};
use lift86_parser::{Lexer, Parser, Program};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read {path}: {source}")]
    ReadInput {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    WriteOutput {
        path: String,
        source: std::io::Error,
    },
}

/// Run the whole pipeline. Warnings go to stderr; they never affect the
/// exit status.
pub fn run(input: &Path, output: &Path) -> PipelineResult<()> {
    // The historic format marks end-of-file with a control-Z byte and may
    // carry arbitrary bytes after it, so the buffer is truncated before any
    // text decoding.
    let raw = fs::read(input).map_err(|source| PipelineError::ReadInput {
        path: input.display().to_string(),
        source,
    })?;
    let end = raw
        .iter()
        .position(|&b| b == 0x1a)
        .unwrap_or(raw.len());
    let source = String::from_utf8_lossy(&raw[..end]).into_owned();

    let lexer = Lexer::new(&source);
    let (tokens, comments, lex_warnings) = lexer.tokenize();
    let parser = Parser::new(lexer.source(), tokens, comments);
    let (lines, tail_comments, parse_warnings) = parser.parse();
    let program = Program::from_lines(lines, tail_comments);

    let analysis = analyze(&program);

    for warning in lex_warnings.iter().chain(parse_warnings.iter()) {
        eprintln!("warning: {}", warning);
    }
    for warning in &analysis.warnings {
        eprintln!("warning: {}", warning);
    }

    let rendered = emit(&program, &analysis);
    fs::write(output, rendered).map_err(|source| PipelineError::WriteOutput {
        path: output.display().to_string(),
        source,
    })?;

    Ok(())
}
