//! # subc
//!
//! A compiler and stack machine for a small dialect of C: characters,
//! integers, pointers of any depth, enums, `if`, `while`, `return`,
//! and a handful of built-in calls. Source compiles in a single pass
//! to word-oriented bytecode which the runtime executes in a flat
//! memory with the data segment at the bottom and the stack at the
//! top.
//!
//! ```no_run
//! use subc::mach::{compile, Runtime};
//!
//! let program = compile("int main() { return 6 * 7; }").unwrap();
//! let mut runtime = Runtime::new(program, &[]).unwrap();
//! assert_eq!(runtime.run().unwrap(), 42);
//! ```

pub mod lang;
pub mod mach;
