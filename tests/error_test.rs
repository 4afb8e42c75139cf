mod common;
use common::*;

use subc::lang::ErrorCode;

#[test]
fn test_missing_main() {
    let error = compile_err("int helper() { return 0; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert_eq!(error.to_string(), "SEMANTIC ERROR; MAIN NOT DEFINED");
}

#[test]
fn test_missing_semicolon() {
    let error = compile_err("int main() { return 1 }");
    assert_eq!(error.code(), ErrorCode::SyntaxError);
    assert_eq!(error.line(), Some(1));
}

#[test]
fn test_error_reports_line() {
    let error = compile_err("int main() {\n  int x;\n  x = ;\n  return x;\n}");
    assert_eq!(error.code(), ErrorCode::SyntaxError);
    assert_eq!(error.line(), Some(3));
}

#[test]
fn test_undefined_variable() {
    let error = compile_err("int main() { return nope; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert!(error.to_string().contains("UNDEFINED VARIABLE"));
}

#[test]
fn test_calling_an_undeclared_function() {
    let error = compile_err("int main() { return nope(); }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert!(error.to_string().contains("BAD FUNCTION CALL"));
}

#[test]
fn test_duplicate_global() {
    let error = compile_err("int x; int x; int main() { return 0; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert!(error.to_string().contains("DUPLICATE GLOBAL"));
}

#[test]
fn test_duplicate_local() {
    let error = compile_err("int main() { int x; int x; return 0; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
}

#[test]
fn test_duplicate_parameter() {
    let error = compile_err("int f(int a, int a) { return a; } int main() { return 0; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
}

#[test]
fn test_bad_lvalue() {
    let error = compile_err("int main() { 3 = 4; return 0; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert!(error.to_string().contains("LVALUE"));
}

#[test]
fn test_bad_dereference() {
    let error = compile_err("int main() { int x; return *x; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
}

#[test]
fn test_bad_address_of() {
    let error = compile_err("int main() { return &3; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
}

#[test]
fn test_indexing_a_plain_int() {
    let error = compile_err("int main() { int x; return x[0]; }");
    assert_eq!(error.code(), ErrorCode::SemanticError);
    assert!(error.to_string().contains("POINTER"));
}

#[test]
fn test_bad_enum_initializer() {
    let error = compile_err("enum { A = B }; int main() { return 0; }");
    assert_eq!(error.code(), ErrorCode::SyntaxError);
}

#[test]
fn test_unexpected_end_of_input() {
    let error = compile_err("int main() { return 1 +");
    assert_eq!(error.code(), ErrorCode::SyntaxError);
}

#[test]
fn test_unknown_character_rejected_by_parser() {
    let error = compile_err("int main() { return 1 @ 2; }");
    assert_eq!(error.code(), ErrorCode::SyntaxError);
}

#[test]
fn test_exit_codes_are_stable() {
    assert_eq!(ErrorCode::SyntaxError as i32, 2);
    assert_eq!(ErrorCode::SemanticError as i32, 3);
    assert_eq!(ErrorCode::OutOfMemory as i32, 7);
    assert_eq!(ErrorCode::ArithmeticError as i32, 11);
    assert_eq!(ErrorCode::IllegalInstruction as i32, 30);
    assert_eq!(ErrorCode::MemoryFault as i32, 31);
}
