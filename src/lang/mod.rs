/*!
# Language Module

Lexical analysis for the compiled C subset: tokens, the symbol table,
and the pull-model lexer that feeds the compiler in `crate::mach`.

*/

#[macro_use]
mod error;
mod lex;
mod symbol;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::Lexer;
pub use symbol::{hash_name, Base, Class, Symbol, Symbols, Type};
pub use token::Token;
