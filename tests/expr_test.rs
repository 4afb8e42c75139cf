mod common;
use common::*;

#[test]
fn test_precedence() {
    assert_eq!(status("int main() { return 2 + 3 * 4; }"), 14);
    assert_eq!(status("int main() { return (2 + 3) * 4; }"), 20);
    assert_eq!(status("int main() { return 20 - 8 / 2; }"), 16);
    assert_eq!(status("int main() { return 17 % 5; }"), 2);
}

#[test]
fn test_unary() {
    assert_eq!(status("int main() { return -5 + 10; }"), 5);
    assert_eq!(status("int main() { int x; x = 3; return -x + 10; }"), 7);
    assert_eq!(status("int main() { return !0; }"), 1);
    assert_eq!(status("int main() { return !5; }"), 0);
    assert_eq!(status("int main() { return ~0 + 2; }"), 1);
    assert_eq!(status("int main() { return +7; }"), 7);
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(status("int main() { return 12 & 10; }"), 8);
    assert_eq!(status("int main() { return 12 | 10; }"), 14);
    assert_eq!(status("int main() { return 12 ^ 10; }"), 6);
    assert_eq!(status("int main() { return 1 << 6; }"), 64);
    assert_eq!(status("int main() { return 64 >> 3; }"), 8);
}

#[test]
fn test_comparisons() {
    assert_eq!(status("int main() { return 1 < 2; }"), 1);
    assert_eq!(status("int main() { return 2 <= 1; }"), 0);
    assert_eq!(status("int main() { return 3 > 2; }"), 1);
    assert_eq!(status("int main() { return 2 >= 3; }"), 0);
    assert_eq!(status("int main() { return 5 == 5; }"), 1);
    assert_eq!(status("int main() { return 5 != 5; }"), 0);
}

#[test]
fn test_logical_yield_operand_values() {
    // || and && pass the deciding operand through unchanged.
    assert_eq!(status("int main() { return 2 || 9; }"), 2);
    assert_eq!(status("int main() { return 0 || 9; }"), 9);
    assert_eq!(status("int main() { return 2 && 3; }"), 3);
    assert_eq!(status("int main() { return 0 && 3; }"), 0);
}

#[test]
fn test_short_circuit_skips_side_effects() {
    let src = "
        int hits;
        int bump() { hits = hits + 1; return 1; }
        int main() {
            hits = 0;
            0 && bump();
            1 || bump();
            return hits;
        }";
    assert_eq!(status(src), 0);
}

#[test]
fn test_ternary() {
    assert_eq!(status("int main() { return 1 ? 10 : 20; }"), 10);
    assert_eq!(status("int main() { return 0 ? 10 : 20; }"), 20);
    assert_eq!(
        status("int main() { int x; x = 5; return x > 3 ? x : 3; }"),
        5
    );
}

#[test]
fn test_assignment_chains_and_value() {
    assert_eq!(
        status("int main() { int a; int b; a = b = 6; return a + b; }"),
        12
    );
}

#[test]
fn test_pre_and_post_increment() {
    assert_eq!(status("int main() { int x; x = 5; return ++x; }"), 6);
    assert_eq!(status("int main() { int x; x = 5; return --x; }"), 4);
    assert_eq!(status("int main() { int x; x = 5; return x++; }"), 5);
    assert_eq!(status("int main() { int x; x = 5; x++; return x; }"), 6);
    assert_eq!(status("int main() { int x; x = 5; x--; return x; }"), 4);
}

#[test]
fn test_sizeof() {
    assert_eq!(status("int main() { return sizeof(char); }"), 1);
    assert_eq!(status("int main() { return sizeof(int); }"), 8);
    assert_eq!(status("int main() { return sizeof(int*); }"), 8);
    assert_eq!(status("int main() { return sizeof(char*); }"), 8);
}

#[test]
fn test_char_store_truncates() {
    assert_eq!(status("int main() { char c; return c = 321; }"), 65);
    assert_eq!(
        status("int main() { char c; c = 321; return c; }"),
        65
    );
}

#[test]
fn test_char_literals_in_arithmetic() {
    assert_eq!(status("int main() { return 'a' - 'A'; }"), 32);
}
