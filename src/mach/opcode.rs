/// ## Virtual machine instruction set
///
/// A single-accumulator stack machine. Operands follow their opcode as
/// separate words; interpretation is positional, decided by the opcode
/// in front. `a = b * 2` compiles to
/// `[Imm &a, Push, Imm &b, Li, Push, Imm 2, Mul, Si]`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Accumulator = frame base + operand words.
    Lea,
    /// Accumulator = next code word.
    Imm,
    /// Unconditional branch to the operand address.
    Jmp,
    /// Push the return address, branch to the operand address.
    Call,
    /// Branch to the operand address if the accumulator is zero.
    Jz,
    /// Branch to the operand address if the accumulator is not zero.
    Jnz,
    /// Enter a frame: push base, base = stack, reserve operand words.
    Ent,
    /// Discard operand argument words from the stack.
    Adj,
    /// Leave a frame and return.
    Lev,
    /// Load the word at the accumulator address.
    Li,
    /// Load the byte at the accumulator address.
    Lc,
    /// Store the accumulator word at the popped address.
    Si,
    /// Store the accumulator byte at the popped address.
    Sc,
    /// Push the accumulator.
    Push,

    // Binary operations: pop the left operand, combine with the
    // accumulator, leave the result in the accumulator.
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Built-in system calls, bridged to the host.
    Open,
    Read,
    Clos,
    Prtf,
    Malc,
    Mset,
    Mcmp,
    Exit,
}

impl Opcode {
    /// Words of trailing operand data.
    pub fn operands(self) -> usize {
        use Opcode::*;
        match self {
            Lea | Imm | Jmp | Call | Jz | Jnz | Ent | Adj => 1,
            _ => 0,
        }
    }

    /// The built-ins that resolve through the symbol table, in call
    /// number order matching their seeding in the compiler.
    pub const SYS: [Opcode; 8] = [
        Opcode::Open,
        Opcode::Read,
        Opcode::Clos,
        Opcode::Prtf,
        Opcode::Malc,
        Opcode::Mset,
        Opcode::Mcmp,
        Opcode::Exit,
    ];
}

/// One word of the code segment: an opcode or inline operand data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Op(Opcode),
    Val(i64),
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        let s = match self {
            Lea => "LEA",
            Imm => "IMM",
            Jmp => "JMP",
            Call => "CALL",
            Jz => "JZ",
            Jnz => "JNZ",
            Ent => "ENT",
            Adj => "ADJ",
            Lev => "LEV",
            Li => "LI",
            Lc => "LC",
            Si => "SI",
            Sc => "SC",
            Push => "PUSH",
            Or => "OR",
            Xor => "XOR",
            And => "AND",
            Eq => "EQ",
            Ne => "NE",
            Lt => "LT",
            Gt => "GT",
            Le => "LE",
            Ge => "GE",
            Shl => "SHL",
            Shr => "SHR",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Open => "OPEN",
            Read => "READ",
            Clos => "CLOS",
            Prtf => "PRTF",
            Malc => "MALC",
            Mset => "MSET",
            Mcmp => "MCMP",
            Exit => "EXIT",
        };
        f.pad(s)
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Word::Op(op) => write!(f, "{}", op),
            Word::Val(v) => write!(f, "{}", v),
        }
    }
}
