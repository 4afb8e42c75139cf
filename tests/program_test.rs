mod common;
use common::*;

use subc::lang::ErrorCode;
use subc::mach::{compile, Listing, Opcode, Program, Runtime, Word};

#[test]
fn test_compilation_is_deterministic() {
    let src = "
        int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
        int main() { return fib(7); }";
    assert_eq!(compile(src).unwrap(), compile(src).unwrap());
}

#[test]
fn test_listing_walks_operands() {
    let program = compile("int main() { return 1 + 2; }").unwrap();
    let listing = Listing::new(&program).to_string();
    assert!(listing.contains("; entry"));
    assert!(listing.contains("ENT"));
    assert!(listing.contains("PUSH"));
    assert!(listing.contains("ADD"));
    assert!(listing.contains("LEV"));
    // No operand word leaks out as its own line.
    assert!(!listing.contains('?'));
}

#[test]
fn test_text_starts_with_halt_thunk() {
    let program = compile("int main() { return 0; }").unwrap();
    assert_eq!(program.text()[0], Word::Op(Opcode::Push));
    assert_eq!(program.text()[1], Word::Op(Opcode::Exit));
    assert!(program.entry().unwrap() >= 2);
}

#[test]
fn test_operand_word_in_opcode_position() {
    let mut program = Program::new();
    program.emit_val(5).unwrap();
    program.set_entry(2);
    let mut runtime = Runtime::new(program, &[]).unwrap();
    let error = runtime.run().unwrap_err();
    assert_eq!(error.code(), ErrorCode::IllegalInstruction);
}

#[test]
fn test_opcode_missing_its_operand() {
    let mut program = Program::new();
    program.emit_op(Opcode::Imm).unwrap();
    program.emit_op(Opcode::Exit).unwrap();
    program.set_entry(2);
    let mut runtime = Runtime::new(program, &[]).unwrap();
    let error = runtime.run().unwrap_err();
    assert_eq!(error.code(), ErrorCode::IllegalInstruction);
}

#[test]
fn test_running_off_the_end() {
    let mut program = Program::new();
    program.emit_op(Opcode::Imm).unwrap();
    program.emit_val(1).unwrap();
    program.set_entry(2);
    let mut runtime = Runtime::new(program, &[]).unwrap();
    let error = runtime.run().unwrap_err();
    assert_eq!(error.code(), ErrorCode::IllegalInstruction);
}

fn has_sequence(text: &[Word], needle: &[Word]) -> bool {
    text.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_pointer_add_scales_and_int_add_does_not() {
    let scaled = [
        Word::Op(Opcode::Push),
        Word::Op(Opcode::Imm),
        Word::Val(8),
        Word::Op(Opcode::Mul),
        Word::Op(Opcode::Add),
    ];
    let program = compile("int main() { int *p; p = p + 1; return 0; }").unwrap();
    assert!(has_sequence(program.text(), &scaled));
    let program = compile("int main() { int n; n = n + 1; return 0; }").unwrap();
    assert!(!has_sequence(program.text(), &scaled));
}

#[test]
fn test_division_by_zero() {
    let error = run_err("int main() { return 1 / 0; }");
    assert_eq!(error.code(), ErrorCode::ArithmeticError);
    let error = run_err("int main() { return 1 % 0; }");
    assert_eq!(error.code(), ErrorCode::ArithmeticError);
}

#[test]
fn test_wild_pointer_faults() {
    let error = run_err("int main() { int *p; p = 0 - 1; return *p; }");
    assert_eq!(error.code(), ErrorCode::MemoryFault);
}

#[test]
fn test_deep_recursion_is_an_error_not_a_crash() {
    // Exhausts machine memory long before any host resource.
    let src = "
        int spin(int n) { return spin(n + 1); }
        int main() { return spin(0); }";
    let error = run_err(src);
    assert_eq!(error.code(), ErrorCode::MemoryFault);
}
