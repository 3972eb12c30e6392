//! Annotated pseudo-C emission.
//!
//! The transcription keeps every instruction inside an `asm("…");` escape and
//! surrounds it with the analysis results: a `// writes:` summary per
//! instruction, `// function` / `// returns:` markers per discovered entry,
//! and the original source comments as `//` comments.

use crate::analysis::{Analysis, SuffixWrites, WriteSummary, WriteVal};
use lift86_parser::ast::{expand_coverings, Operand, Radix, Reg, RegSet};
use lift86_parser::program::Program;
use std::fmt::Write;

/// Render the annotated pseudo-C file.
pub fn emit(program: &Program, analysis: &Analysis) -> String {
    let mut out = String::new();

    for constant in &program.constants {
        for comment in &constant.comments {
            let _ = writeln!(out, "// {}", comment);
        }
        let _ = writeln!(
            out,
            "const int {} = {};",
            constant.name,
            constant_value(&constant.value)
        );
    }
    if !program.constants.is_empty() {
        out.push('\n');
    }

    out.push_str("int main(){\n");

    for index in 0..=program.len() {
        emit_labels(&mut out, program, analysis, index);
        if index < program.len() {
            emit_instruction(&mut out, program, analysis, index);
        }
    }

    for comment in &program.tail_comments {
        let _ = writeln!(out, "// {}", comment);
    }

    out.push_str("}\n");
    out
}

fn emit_labels(out: &mut String, program: &Program, analysis: &Analysis, index: usize) {
    let Some(labels) = program.labels_at.get(&index) else {
        return;
    };
    for (pos, label) in labels.iter().enumerate() {
        for comment in &label.leading {
            let _ = writeln!(out, "// {}", comment);
        }
        if pos == 0 && analysis.entries.contains(&index) {
            let _ = writeln!(out, "// function");
            let returned = analysis
                .liveness
                .function_returns
                .get(&index)
                .cloned()
                .unwrap_or_default();
            let _ = writeln!(out, "// returns:{}", register_list(&returned));
        }
        let _ = write!(out, "{}:", label.name);
        for comment in &label.trailing {
            let _ = write!(out, " // {}", comment);
        }
        out.push('\n');
    }
}

fn emit_instruction(out: &mut String, program: &Program, analysis: &Analysis, index: usize) {
    let line = &program.instructions[index];
    for comment in &line.leading {
        let _ = writeln!(out, "  // {}", comment);
    }
    let _ = writeln!(out, "  // writes:{}", writes_summary(&analysis.writes[index]));

    let rendered = line.inst.to_string();
    let _ = write!(out, "  asm(\"{}\");", escape_c(&rendered));
    for comment in &line.trailing {
        let _ = write!(out, " // {}", comment);
    }
    out.push('\n');
}

/// `// writes:` payload: bindings in sorted key order, then `no return` when
/// the suffix can never execute a `ret`.
fn writes_summary(summary: &WriteSummary) -> String {
    let mut text = String::new();
    if let WriteSummary::Returns(suffix) = summary {
        for part in write_parts(suffix) {
            text.push(' ');
            text.push_str(&part);
        }
    }
    if summary.never_returns() {
        text.push_str(" no return");
    }
    text
}

fn write_parts(suffix: &SuffixWrites) -> Vec<String> {
    let mut keys: Vec<Reg> = suffix.writes.keys().copied().collect();
    keys.sort_by_key(|r| r.name());
    keys.into_iter()
        .map(|reg| match suffix.writes[&reg] {
            WriteVal::Any => reg.name().to_string(),
            WriteVal::Reg(src) => format!("{}={}", reg, src),
            WriteVal::Stack { idx, .. } => format!("{}=[sp+{}]", reg, idx),
        })
        .collect()
}

/// Render a returned-register set for humans: close it under coverings, then
/// show the whole register instead of both of its halves.
fn register_list(set: &RegSet) -> String {
    let expanded = expand_coverings(set);
    let mut regs: Vec<Reg> = expanded
        .iter()
        .copied()
        .filter(|r| {
            !r.super_regs()
                .iter()
                .any(|s| s.covering().is_some() && expanded.contains(s))
        })
        .collect();
    regs.sort_by_key(|r| r.name());

    let mut text = String::new();
    for reg in regs {
        text.push(' ');
        text.push_str(reg.name());
    }
    text
}

fn constant_value(value: &Operand) -> String {
    match value {
        Operand::Number {
            value,
            radix: Radix::Hex,
        } => format!("0x{:X}", value),
        Operand::Number {
            value,
            radix: Radix::Dec,
        } => value.to_string(),
        other => other.to_string(),
    }
}

fn escape_c(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
