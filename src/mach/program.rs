use super::{Address, Opcode, Word, WORD};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Compiled program
///
/// The code segment (a sequence of `Word`s) and the data segment (raw
/// bytes for string literals and global slots). Both are append-only
/// while the compiler runs; the only mutation ever applied afterward
/// is backpatching a recorded placeholder. Segments are fixed-capacity
/// and overflow with an explicit error.

const TEXT_LIMIT: usize = 0x10000;
const DATA_LIMIT: usize = 0x10000;

/// Address of the loader thunk that every program begins with: a
/// natural return from the entry function lands here, pushes the
/// accumulator, and exits with it.
pub const HALT: Address = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    text: Vec<Word>,
    data: Vec<u8>,
    entry: Option<Address>,
}

impl Default for Program {
    fn default() -> Program {
        Program::new()
    }
}

impl Program {
    pub fn new() -> Program {
        Program {
            text: vec![Word::Op(Opcode::Push), Word::Op(Opcode::Exit)],
            // One reserved zero word so no object lives at address 0.
            data: vec![0; WORD as usize],
            entry: None,
        }
    }

    pub fn text(&self) -> &[Word] {
        &self.text
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn entry(&self) -> Option<Address> {
        self.entry
    }

    pub fn set_entry(&mut self, addr: Address) {
        self.entry = Some(addr);
    }

    /// Next code address to be emitted; recorded for jump targets and
    /// placeholders.
    pub fn here(&self) -> Address {
        self.text.len()
    }

    pub fn emit(&mut self, word: Word) -> Result<()> {
        if self.text.len() >= TEXT_LIMIT {
            return Err(error!(OutOfMemory; "TEXT SEGMENT OVERFLOW"));
        }
        self.text.push(word);
        Ok(())
    }

    pub fn emit_op(&mut self, op: Opcode) -> Result<()> {
        self.emit(Word::Op(op))
    }

    pub fn emit_val(&mut self, val: i64) -> Result<()> {
        self.emit(Word::Val(val))
    }

    /// Emit a placeholder operand and hand back its address for a
    /// later `patch`.
    pub fn emit_hole(&mut self) -> Result<Address> {
        let addr = self.here();
        self.emit(Word::Val(0))?;
        Ok(addr)
    }

    /// Backpatch a placeholder with the now-known target.
    pub fn patch(&mut self, hole: Address, target: Address) {
        debug_assert!(matches!(self.text.get(hole), Some(Word::Val(_))));
        self.text[hole] = Word::Val(target as i64);
    }

    pub fn last(&self) -> Option<Word> {
        self.text.last().copied()
    }

    /// Rewrite the last emitted word; used to turn a load into a push
    /// of the address it would have loaded through.
    pub fn rewrite_last(&mut self, word: Word) {
        if let Some(last) = self.text.last_mut() {
            *last = word;
        }
    }

    /// Retract the last emitted word; used by address-of, which keeps
    /// the address a load would have consumed.
    pub fn retract(&mut self) {
        self.text.pop();
    }

    /// Current data cursor, embedded in code as a literal address.
    pub fn data_addr(&self) -> i64 {
        self.data.len() as i64
    }

    pub fn emit_data(&mut self, byte: u8) -> Result<()> {
        if self.data.len() >= DATA_LIMIT {
            return Err(error!(OutOfMemory; "DATA SEGMENT OVERFLOW"));
        }
        self.data.push(byte);
        Ok(())
    }

    /// Round the data cursor up past the next word boundary, padding
    /// with zeros. The padding is what terminates the preceding string
    /// run; at least one zero byte always follows.
    pub fn align_data(&mut self) -> Result<()> {
        let next = (self.data.len() + WORD as usize) & !(WORD as usize - 1);
        while self.data.len() < next {
            self.emit_data(0)?;
        }
        Ok(())
    }

    /// Reserve one zeroed word-sized slot for a global variable.
    pub fn global_slot(&mut self) -> Result<i64> {
        let addr = self.data_addr();
        for _ in 0..WORD {
            self.emit_data(0)?;
        }
        Ok(addr)
    }
}
