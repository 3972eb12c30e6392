use lift86_codegen::analysis::functions::discover_entries;
use lift86_codegen::analysis::writes::analyze_writes;
use lift86_parser::{Lexer, Parser, Program};
use std::collections::BTreeSet;

fn parse(source: &str) -> Program {
    let lexer = Lexer::new(source);
    let (tokens, comments, _) = lexer.tokenize();
    let parser = Parser::new(lexer.source(), tokens, comments);
    let (lines, tail, warnings) = parser.parse();
    assert!(warnings.is_empty(), "parse warnings: {:?}", warnings);
    Program::from_lines(lines, tail)
}

fn entries(source: &str) -> BTreeSet<usize> {
    let program = parse(source);
    let writes = analyze_writes(&program);
    discover_entries(&program, &writes)
}

#[test]
fn call_targets_seed_the_entry_set() {
    let found = entries("call f\nret\nf: ret\n");
    assert_eq!(found, BTreeSet::from([2]));
}

#[test]
fn no_calls_means_no_entries() {
    let found = entries("start: mov ax, bx\n jmp start\n");
    assert!(found.is_empty());
}

#[test]
fn unresolved_call_targets_are_ignored() {
    let found = entries("call external\nret\n");
    assert!(found.is_empty());
}

#[test]
fn shared_eligible_code_is_promoted_to_an_entry() {
    // Both a and b tail-jump into c with a balanced stack; c must be a
    // function of its own.
    let source = "\
call a
call b
ret
a: jmp c
b: jmp c
c: ret
";
    let found = entries(source);
    assert_eq!(found, BTreeSet::from([3, 4, 5]));
}

#[test]
fn shared_code_with_pending_stack_stays_shared() {
    // c pops a word both callers pushed: its sp delta is +2, which is not
    // consistent with a function entry.
    let source = "\
call a
call b
ret
a: push ax
jmp c
b: push bx
jmp c
c: pop dx
ret
";
    let found = entries(source);
    assert_eq!(found, BTreeSet::from([3, 5]));
}

#[test]
fn entries_satisfy_the_stack_pointer_invariant() {
    let source = "\
call a
call b
ret
a: push ax
pop ax
jmp c
b: jmp c
c: ret
";
    let program = parse(source);
    let writes = analyze_writes(&program);
    let found = discover_entries(&program, &writes);
    assert!(!found.is_empty());
    for &entry in &found {
        assert!(
            writes[entry].sp_entry_compatible(),
            "entry {} has an incompatible stack delta",
            entry
        );
    }
}

#[test]
fn fall_through_joins_adjacent_labelled_regions() {
    // f falls through into g, so g is owned by f's traversal; only when h
    // also reaches it does it become an entry.
    let source = "\
call f
call h
ret
f: mov ax, bx
g: mov bx, cx
ret
h: jz g
ret
";
    let found = entries(source);
    assert_eq!(found, BTreeSet::from([3, 4, 6]));
}
