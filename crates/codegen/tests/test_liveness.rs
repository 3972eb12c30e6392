use lift86_codegen::analysis::functions::discover_entries;
use lift86_codegen::analysis::liveness::{analyze_liveness, Liveness};
use lift86_codegen::analysis::writes::analyze_writes;
use lift86_parser::ast::{expand_coverings, Reg, RegSet};
use lift86_parser::{Lexer, Parser, Program};

fn parse(source: &str) -> Program {
    let lexer = Lexer::new(source);
    let (tokens, comments, _) = lexer.tokenize();
    let parser = Parser::new(lexer.source(), tokens, comments);
    let (lines, tail, warnings) = parser.parse();
    assert!(warnings.is_empty(), "parse warnings: {:?}", warnings);
    Program::from_lines(lines, tail)
}

fn analyze(source: &str) -> Liveness {
    let program = parse(source);
    let writes = analyze_writes(&program);
    let entries = discover_entries(&program, &writes);
    analyze_liveness(&program, &writes, &entries)
}

fn closed(set: &RegSet) -> RegSet {
    expand_coverings(set)
}

#[test]
fn straight_line_uses_become_live() {
    let liveness = analyze("mov ax, bx\n");
    let live = closed(&liveness.live_before[0]);
    assert!(live.contains(&Reg::Bx));
    assert!(!live.contains(&Reg::Ax));
}

#[test]
fn defs_kill_liveness_upstream() {
    // bx is written before the copy reads it, so nothing is live on entry.
    let liveness = analyze("mov bx, 1\nmov ax, bx\n");
    assert!(liveness.live_before[0].is_empty());
    assert!(closed(&liveness.live_before[1]).contains(&Reg::Bx));
}

#[test]
fn flags_are_live_between_compare_and_jump() {
    let liveness = analyze("cmp ax, bx\njz l\nmov cx, dx\nl: ret\n");
    let at_cmp = closed(&liveness.live_before[0]);
    assert!(at_cmp.contains(&Reg::Ax));
    assert!(at_cmp.contains(&Reg::Bx));
    // The compare defines zf before the jump consumes it.
    assert!(!at_cmp.contains(&Reg::Zf));

    let at_jz = closed(&liveness.live_before[1]);
    assert!(at_jz.contains(&Reg::Zf));
    assert!(at_jz.contains(&Reg::Dx));
}

#[test]
fn a_partial_register_write_keeps_the_other_half_live() {
    let liveness = analyze("mov ah, 1\nmov cx, ax\n");
    let live = closed(&liveness.live_before[0]);
    assert!(live.contains(&Reg::Al));
    assert!(!live.contains(&Reg::Ah));
}

#[test]
fn trivial_function_returns_nothing() {
    let liveness = analyze("call f\nret\nf: ret\n");
    assert_eq!(liveness.function_returns[&2], RegSet::new());
    assert!(liveness.live_before[0].is_empty());
}

#[test]
fn caller_consumption_propagates_into_the_callee() {
    let liveness = analyze("call f\nmov bx, ax\nret\nf: mov ax, 1\nret\n");
    // The caller reads ax after the call and f writes ax: f returns ax.
    let returned = closed(&liveness.function_returns[&3]);
    assert!(returned.contains(&Reg::Ax));
    // Inside f, ax is live at the ret because the caller consumes it.
    let at_ret = closed(&liveness.live_before[4]);
    assert!(at_ret.contains(&Reg::Ax));
    // And dead before the body writes it.
    assert!(!closed(&liveness.live_before[3]).contains(&Reg::Ax));
}

#[test]
fn registers_the_callee_never_writes_pass_through_calls() {
    // si flows through f untouched; it must be live before the call, and f
    // must not be credited with returning it.
    let liveness = analyze("call f\nmov ax, si\nret\nf: mov ax, 1\nret\n");
    assert!(closed(&liveness.live_before[0]).contains(&Reg::Si));
    assert!(!closed(&liveness.function_returns[&3]).contains(&Reg::Si));
}

#[test]
fn conditional_return_feeds_function_returns() {
    // f returns via the `jnz ret` edge; the caller reads ax afterwards.
    let liveness = analyze("call f\nmov bx, ax\nret\nf: mov ax, 1\njnz ret\nret\n");
    let returned = closed(&liveness.function_returns[&3]);
    assert!(returned.contains(&Reg::Ax));
    // At the conditional return the flag and the returned register are live.
    let at_jnz = closed(&liveness.live_before[4]);
    assert!(at_jnz.contains(&Reg::Ax));
    assert!(at_jnz.contains(&Reg::Zf));
}

#[test]
fn live_sets_stay_covering_decomposed() {
    let source = "call f\nmov bx, ax\nret\nf: mov ax, si\nadd ax, bx\nret\n";
    let liveness = analyze(source);
    for (index, live) in liveness.live_before.iter().enumerate() {
        for reg in live {
            assert!(
                reg.covering().is_none(),
                "live set at {} holds undecomposed {}",
                index,
                reg
            );
        }
    }
}

#[test]
fn jump_propagates_target_liveness() {
    let liveness = analyze("jmp l\nmov si, di\nl: mov ax, cx\n");
    let live = closed(&liveness.live_before[0]);
    assert!(live.contains(&Reg::Cx));
    assert!(!live.contains(&Reg::Di));
}
