mod common;
use common::*;

#[test]
fn test_address_of_and_deref() {
    let src = "
        int main() {
            int x; int *p;
            x = 11;
            p = &x;
            *p = *p + 1;
            return x;
        }";
    assert_eq!(status(src), 12);
}

#[test]
fn test_pointer_to_pointer() {
    let src = "
        int main() {
            int x; int *p; int **pp;
            x = 5;
            p = &x;
            pp = &p;
            **pp = 9;
            return x;
        }";
    assert_eq!(status(src), 9);
}

#[test]
fn test_int_pointer_arithmetic_strides_by_word() {
    let src = "
        int main() {
            int *p; int *q;
            p = (int*)malloc(sizeof(int) * 4);
            q = p + 3;
            return q - p;
        }";
    assert_eq!(status(src), 3);
}

#[test]
fn test_char_pointer_arithmetic_strides_by_byte() {
    let src = "
        int main() {
            char *s;
            s = \"abc\";
            return *(s + 1);
        }";
    assert_eq!(status(src), 'b' as i64);
}

#[test]
fn test_indexing() {
    let src = "
        int main() {
            int *a;
            a = (int*)malloc(sizeof(int) * 3);
            a[0] = 7;
            a[1] = 8;
            a[2] = a[0] + a[1];
            return a[2];
        }";
    assert_eq!(status(src), 15);
}

#[test]
fn test_char_indexing() {
    let src = "
        int main() {
            char *s;
            s = \"hello\";
            return s[4];
        }";
    assert_eq!(status(src), 'o' as i64);
}

#[test]
fn test_string_literal_is_terminated() {
    let src = "
        int len(char *s) {
            int n;
            n = 0;
            while (s[n]) n++;
            return n;
        }
        int main() { return len(\"four\"); }";
    assert_eq!(status(src), 4);
}

#[test]
fn test_pointer_decrement() {
    let src = "
        int main() {
            int *a; int *p;
            a = (int*)malloc(sizeof(int) * 2);
            a[0] = 4;
            a[1] = 6;
            p = a + 1;
            p--;
            return *p;
        }";
    assert_eq!(status(src), 4);
}

#[test]
fn test_malloc_returns_distinct_regions() {
    let src = "
        int main() {
            int *a; int *b;
            a = (int*)malloc(sizeof(int));
            b = (int*)malloc(sizeof(int));
            *a = 1;
            *b = 2;
            return *a + *b;
        }";
    assert_eq!(status(src), 3);
}

#[test]
fn test_memset_and_memcmp() {
    let src = "
        int main() {
            char *p; char *q;
            p = (char*)malloc(8);
            q = (char*)malloc(8);
            memset(p, 'A', 8);
            memset(q, 'A', 8);
            if (memcmp(p, q, 8) != 0) return 1;
            q[3] = 'B';
            if (memcmp(p, q, 8) >= 0) return 2;
            return 0;
        }";
    assert_eq!(status(src), 0);
}

#[test]
fn test_no_object_at_address_zero() {
    let src = "
        int g;
        int main() {
            char *s;
            s = \"x\";
            if (&g == 0) return 1;
            if (s == 0) return 2;
            return 0;
        }";
    assert_eq!(status(src), 0);
}

#[test]
fn test_pointer_comparison_with_zero() {
    let src = "
        int main() {
            char *p;
            p = 0;
            if (!p) return 1;
            return 0;
        }";
    assert_eq!(status(src), 1);
}
