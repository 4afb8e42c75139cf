use super::Token;

/// ## Symbol table
///
/// One `Symbol` exists per distinct spelling ever seen in the source.
/// Lookup is a linear scan in insertion order, gated by a rolling hash
/// and always confirmed by an exact name compare. The lexer inserts;
/// the compiler resolves and rewrites classes.

/// Storage class of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Seen in the source but not declared.
    Undefined,
    /// Reserved word; the symbol's token field names which one.
    Keyword,
    /// Built-in system call; value is the call number.
    Sys,
    /// Enum constant; value is the constant.
    EnumConst,
    /// Global variable; value is its data-segment address.
    Global,
    /// Local variable or parameter; value is its frame slot.
    Local,
    /// Function; value is its code-segment address.
    Func,
}

/// Value type of an expression or declared name: a base type behind
/// `ptr` levels of indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Type {
    pub base: Base,
    pub ptr: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Char,
    Int,
}

impl Type {
    pub const CHAR: Type = Type {
        base: Base::Char,
        ptr: 0,
    };
    pub const INT: Type = Type {
        base: Base::Int,
        ptr: 0,
    };

    pub fn ptr_to(self) -> Type {
        Type {
            base: self.base,
            ptr: self.ptr + 1,
        }
    }

    pub fn deref(self) -> Option<Type> {
        if self.ptr == 0 {
            None
        } else {
            Some(Type {
                base: self.base,
                ptr: self.ptr - 1,
            })
        }
    }

    pub fn is_ptr(self) -> bool {
        self.ptr > 0
    }

    /// True when pointer arithmetic on this type moves by whole words.
    /// A `char*` moves by bytes; every deeper pointer, and `int*`,
    /// moves by the word size.
    pub fn word_stride(self) -> bool {
        self.ptr >= 2 || (self.ptr == 1 && self.base == Base::Int)
    }

    /// True when loads and stores of this type are single bytes.
    pub fn is_byte(self) -> bool {
        self == Type::CHAR
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub hash: i64,
    /// `Token::Id(index)` for ordinary names, or the keyword token.
    pub token: Token,
    pub class: Class,
    pub ty: Type,
    pub value: i64,
    /// Saved (class, type, value) of a global binding while a local of
    /// the same name shadows it. Never more than one level deep: the
    /// language has no nested functions.
    shadowed: Option<(Class, Type, i64)>,
}

#[derive(Debug, Default)]
pub struct Symbols {
    syms: Vec<Symbol>,
}

/// Rolling hash used as a pre-filter for the linear scan.
pub fn hash_name(name: &str) -> i64 {
    let mut hash: i64 = 0;
    for byte in name.bytes() {
        hash = hash.wrapping_mul(147).wrapping_add(byte as i64);
    }
    hash
}

impl Symbols {
    pub fn new() -> Symbols {
        Symbols::default()
    }

    pub fn get(&self, index: usize) -> &Symbol {
        &self.syms[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Symbol {
        &mut self.syms[index]
    }

    /// Find the symbol for `name`, creating it on first sight. The
    /// hash check alone never decides a match; colliding spellings are
    /// separated by the byte compare.
    pub fn lookup(&mut self, name: &str) -> usize {
        let hash = hash_name(name);
        for (index, sym) in self.syms.iter().enumerate() {
            if sym.hash == hash && sym.name == name {
                return index;
            }
        }
        let index = self.syms.len();
        self.syms.push(Symbol {
            name: name.to_string(),
            hash,
            token: Token::Id(index),
            class: Class::Undefined,
            ty: Type::INT,
            value: 0,
            shadowed: None,
        });
        index
    }

    /// Seed a reserved word. Its token is returned by the lexer in
    /// place of `Id`.
    pub fn define_keyword(&mut self, name: &str, token: Token) {
        let index = self.lookup(name);
        let sym = &mut self.syms[index];
        sym.token = token;
        sym.class = Class::Keyword;
    }

    /// Seed a built-in system call.
    pub fn define_sys(&mut self, name: &str, value: i64) {
        let index = self.lookup(name);
        let sym = &mut self.syms[index];
        sym.class = Class::Sys;
        sym.ty = Type::INT;
        sym.value = value;
    }

    /// Rebind `index` as a local, saving the current triple so the
    /// outer binding survives the function body.
    pub fn shadow_local(&mut self, index: usize, ty: Type, slot: i64) {
        let sym = &mut self.syms[index];
        debug_assert!(sym.class != Class::Local);
        sym.shadowed = Some((sym.class, sym.ty, sym.value));
        sym.class = Class::Local;
        sym.ty = ty;
        sym.value = slot;
    }

    /// Undo every live local binding at function exit.
    pub fn unwind_locals(&mut self) {
        for sym in self.syms.iter_mut() {
            if sym.class == Class::Local {
                let (class, ty, value) = sym
                    .shadowed
                    .take()
                    .unwrap_or((Class::Undefined, Type::INT, 0));
                sym.class = class;
                sym.ty = ty;
                sym.value = value;
            }
        }
    }
}
