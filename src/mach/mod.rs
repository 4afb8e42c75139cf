/*!
# Machine Module

The compiler and virtual machine for the C subset: the instruction set,
the code/data segments with their emit-and-backpatch API, the
single-pass code-generating parser, flat program memory, the
fetch-decode-execute runtime, and a disassembler.

*/

/// Index into the code segment.
pub type Address = usize;

/// Machine word size in bytes. Uniform across pointers, `int`, and
/// stack slots.
pub const WORD: i64 = 8;

mod compile;
mod listing;
mod memory;
mod opcode;
mod program;
mod runtime;

pub use compile::compile;
pub use listing::Listing;
pub use memory::Memory;
pub use opcode::Opcode;
pub use opcode::Word;
pub use program::Program;
pub use program::HALT;
pub use runtime::Runtime;
