use lift86_codegen::{analyze, emit};
use lift86_parser::{Lexer, Parser, Program};

fn parse(source: &str) -> Program {
    let lexer = Lexer::new(source);
    let (tokens, comments, _) = lexer.tokenize();
    let parser = Parser::new(lexer.source(), tokens, comments);
    let (lines, tail, _) = parser.parse();
    Program::from_lines(lines, tail)
}

fn transcribe(source: &str) -> String {
    let program = parse(source);
    let analysis = analyze(&program);
    emit(&program, &analysis)
}

#[test]
fn renders_a_single_instruction_program() {
    let output = transcribe("mov ax, bx\n");
    assert_eq!(
        output,
        "int main(){\n  // writes: ah=bh al=bl ax=bx no return\n  asm(\"mov ax, bx\");\n}\n"
    );
}

#[test]
fn renders_constants_ahead_of_main() {
    let output = transcribe("WIDTH equ 80\nDEPTH equ 10H\n  ret\n");
    assert!(output.starts_with(
        "const int WIDTH = 80;\nconst int DEPTH = 0x10;\n\nint main(){\n"
    ));
}

#[test]
fn annotates_discovered_functions() {
    let output = transcribe("call f\nmov bx, ax\nret\nf: mov ax, 1\nret\n");
    assert!(output.contains("// function\n"));
    assert!(output.contains("// returns: ax\n"));
    assert!(output.contains("f:\n"));
}

#[test]
fn preserves_source_comments() {
    let output = transcribe("; entry point\nstart: push bp ; save frame\n  ret\n");
    assert!(output.contains("// entry point\n"));
    assert!(output.contains("asm(\"push bp\"); // save frame\n"));
}

#[test]
fn marks_stack_slot_bindings() {
    let output = transcribe("pop ax\nret\n");
    assert!(output.contains("// writes: ah=[sp+1] al=[sp+0] ax=[sp+0]\n"));
}

#[test]
fn labels_keep_their_original_names() {
    let output = transcribe("Restart: jmp Restart\n");
    assert!(output.contains("Restart:\n"));
    assert!(output.contains("asm(\"jmp Restart\");"));
}

#[test]
fn emission_is_idempotent() {
    let source = "\
COUNT equ 5
; main program
start: mov cx, COUNT
again: call work
dec cx
jnz again
ret
work: add ax, cx
ret
";
    let first = transcribe(source);
    let second = transcribe(source);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn garbage_operands_surface_as_markers() {
    let program = parse("mov ax, 1AB\n");
    let analysis = analyze(&program);
    let output = emit(&program, &analysis);
    assert!(output.contains("asm(\"mov ax, ?\");"));
}
