use std::fs::File;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{Memory, Opcode, Program, Word, HALT, WORD};
use crate::error;
use crate::lang::Error;
use log::debug;

type Result<T> = std::result::Result<T, Error>;

/// Flat machine memory, data at the bottom and the stack at the top.
const MEMORY_SIZE: usize = 1 << 20;
/// Heap allocations refuse to approach the stack closer than this.
const STACK_RESERVE: usize = 64 * 1024;
/// Interrupt flag poll interval in instructions.
const POLL_MASK: u64 = 0x3ff;

/// ## Runtime
///
/// The stack machine. One accumulator, a program counter into the code
/// words, and stack/base pointers into the byte memory. The caller's
/// arguments are materialized into machine memory so the entry function
/// sees a conventional `(argc, argv)` pair, with the halt thunk as its
/// return address.
pub struct Runtime {
    text: Vec<Word>,
    memory: Memory,
    pc: usize,
    sp: i64,
    bp: i64,
    acc: i64,
    files: Vec<Option<File>>,
    output: Box<dyn Write + Send>,
    interrupt: Option<Arc<AtomicBool>>,
    cycles: u64,
}

impl Runtime {
    pub fn new(program: Program, args: &[String]) -> Result<Runtime> {
        let entry = match program.entry() {
            Some(addr) => addr,
            None => return Err(error!(InternalError; "PROGRAM HAS NO ENTRY")),
        };
        let mut memory = Memory::new(program.data(), MEMORY_SIZE)?;
        let mut sp = MEMORY_SIZE as i64;

        // Copy the argument strings and the pointer vector into the
        // heap so the program can address them.
        let mut ptrs: Vec<i64> = Vec::with_capacity(args.len());
        for arg in args {
            let addr = memory.alloc(arg.len() as i64 + 1, STACK_RESERVE)?;
            memory
                .slice_mut(addr, arg.len())?
                .copy_from_slice(arg.as_bytes());
            ptrs.push(addr);
        }
        let argv = memory.alloc(args.len() as i64 * WORD, STACK_RESERVE)?;
        for (slot, ptr) in ptrs.iter().enumerate() {
            memory.write_word(argv + slot as i64 * WORD, *ptr)?;
        }

        // The frame a Call would have built: arguments left to right,
        // then the return address.
        for val in [args.len() as i64, argv, HALT as i64] {
            sp -= WORD;
            memory.write_word(sp, val)?;
        }

        Ok(Runtime {
            text: program.text().to_vec(),
            memory,
            pc: entry,
            sp,
            bp: sp,
            acc: 0,
            files: Vec::new(),
            output: Box::new(std::io::stdout()),
            interrupt: None,
            cycles: 0,
        })
    }

    /// Redirect the program's output stream.
    pub fn set_output(&mut self, output: Box<dyn Write + Send>) {
        self.output = output;
    }

    /// Install a flag that stops execution when set.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    /// Run to completion and return the exit status.
    pub fn run(&mut self) -> Result<i64> {
        loop {
            self.cycles += 1;
            if self.cycles & POLL_MASK == 0 {
                if let Some(flag) = &self.interrupt {
                    if flag.load(Ordering::SeqCst) {
                        return Err(error!(Interrupted));
                    }
                }
            }
            let op = match self.fetch()? {
                Word::Op(op) => op,
                Word::Val(_) => {
                    return Err(error!(IllegalInstruction;
                        format!("AT ADDRESS {}", self.pc - 1)))
                }
            };
            match op {
                Opcode::Imm => self.acc = self.operand()?,
                Opcode::Lea => {
                    let offset = self.operand()?;
                    self.acc = self.bp + offset * WORD;
                }
                Opcode::Jmp => self.pc = self.target()?,
                Opcode::Call => {
                    let target = self.target()?;
                    self.push(self.pc as i64)?;
                    self.pc = target;
                }
                Opcode::Jz => {
                    let target = self.target()?;
                    if self.acc == 0 {
                        self.pc = target;
                    }
                }
                Opcode::Jnz => {
                    let target = self.target()?;
                    if self.acc != 0 {
                        self.pc = target;
                    }
                }
                Opcode::Ent => {
                    let locals = self.operand()?;
                    self.push(self.bp)?;
                    self.bp = self.sp;
                    self.sp -= locals * WORD;
                }
                Opcode::Adj => {
                    let words = self.operand()?;
                    self.sp += words * WORD;
                }
                Opcode::Lev => {
                    self.sp = self.bp;
                    self.bp = self.pop()?;
                    let ret = self.pop()?;
                    if ret < 0 || ret as usize >= self.text.len() {
                        return Err(error!(IllegalInstruction;
                            format!("BAD RETURN ADDRESS {}", ret)));
                    }
                    self.pc = ret as usize;
                }
                Opcode::Li => self.acc = self.memory.read_word(self.acc)?,
                Opcode::Lc => self.acc = self.memory.read_byte(self.acc)?,
                Opcode::Si => {
                    let addr = self.pop()?;
                    self.memory.write_word(addr, self.acc)?;
                }
                Opcode::Sc => {
                    let addr = self.pop()?;
                    self.memory.write_byte(addr, self.acc)?;
                    self.acc = (self.acc as u8) as i64;
                }
                Opcode::Push => self.push(self.acc)?,
                Opcode::Or => self.acc = self.pop()? | self.acc,
                Opcode::Xor => self.acc = self.pop()? ^ self.acc,
                Opcode::And => self.acc = self.pop()? & self.acc,
                Opcode::Eq => self.acc = (self.pop()? == self.acc) as i64,
                Opcode::Ne => self.acc = (self.pop()? != self.acc) as i64,
                Opcode::Lt => self.acc = (self.pop()? < self.acc) as i64,
                Opcode::Gt => self.acc = (self.pop()? > self.acc) as i64,
                Opcode::Le => self.acc = (self.pop()? <= self.acc) as i64,
                Opcode::Ge => self.acc = (self.pop()? >= self.acc) as i64,
                Opcode::Shl => self.acc = self.pop()?.wrapping_shl(self.acc as u32),
                Opcode::Shr => self.acc = self.pop()?.wrapping_shr(self.acc as u32),
                Opcode::Add => self.acc = self.pop()?.wrapping_add(self.acc),
                Opcode::Sub => self.acc = self.pop()?.wrapping_sub(self.acc),
                Opcode::Mul => self.acc = self.pop()?.wrapping_mul(self.acc),
                Opcode::Div => {
                    if self.acc == 0 {
                        return Err(error!(ArithmeticError));
                    }
                    self.acc = self.pop()?.wrapping_div(self.acc);
                }
                Opcode::Mod => {
                    if self.acc == 0 {
                        return Err(error!(ArithmeticError));
                    }
                    self.acc = self.pop()?.wrapping_rem(self.acc);
                }
                Opcode::Open => self.open()?,
                Opcode::Read => self.read()?,
                Opcode::Clos => self.close()?,
                Opcode::Prtf => self.printf()?,
                Opcode::Malc => {
                    let size = self.sysarg(1, 0)?;
                    self.acc = self.memory.alloc(size, STACK_RESERVE)?;
                }
                Opcode::Mset => self.memset()?,
                Opcode::Mcmp => self.memcmp()?,
                Opcode::Exit => {
                    let status = self.memory.read_word(self.sp)?;
                    debug!("exit {} after {} instructions", status, self.cycles);
                    return Ok(status);
                }
            }
        }
    }

    fn fetch(&mut self) -> Result<Word> {
        match self.text.get(self.pc) {
            Some(word) => {
                self.pc += 1;
                Ok(*word)
            }
            None => Err(error!(IllegalInstruction;
                format!("PC {} OUT OF RANGE", self.pc))),
        }
    }

    fn operand(&mut self) -> Result<i64> {
        match self.fetch()? {
            Word::Val(val) => Ok(val),
            Word::Op(_) => Err(error!(IllegalInstruction;
                format!("MISSING OPERAND AT {}", self.pc - 1))),
        }
    }

    fn target(&mut self) -> Result<usize> {
        let val = self.operand()?;
        if val < 0 || val as usize >= self.text.len() {
            return Err(error!(IllegalInstruction;
                format!("BAD JUMP TARGET {}", val)));
        }
        Ok(val as usize)
    }

    fn push(&mut self, val: i64) -> Result<()> {
        self.sp -= WORD;
        self.memory.write_word(self.sp, val)
    }

    fn pop(&mut self) -> Result<i64> {
        let val = self.memory.read_word(self.sp)?;
        self.sp += WORD;
        Ok(val)
    }

    /// Argument `index` of a built-in that was called with `count`
    /// arguments; they sit on the stack in push order.
    fn sysarg(&self, count: i64, index: i64) -> Result<i64> {
        self.memory.read_word(self.sp + (count - 1 - index) * WORD)
    }

    fn open(&mut self) -> Result<()> {
        let path = self.sysarg(2, 0)?;
        let path = String::from_utf8_lossy(self.memory.c_str(path)?).into_owned();
        // Files open read-only; the mode argument is accepted and
        // ignored.
        self.acc = match File::open(&path) {
            Ok(file) => {
                let slot = self.files.iter().position(|f| f.is_none());
                match slot {
                    Some(slot) => {
                        self.files[slot] = Some(file);
                        slot as i64 + 3
                    }
                    None => {
                        self.files.push(Some(file));
                        self.files.len() as i64 + 2
                    }
                }
            }
            Err(_) => -1,
        };
        Ok(())
    }

    fn read(&mut self) -> Result<()> {
        let fd = self.sysarg(3, 0)?;
        let buf = self.sysarg(3, 1)?;
        let count = self.sysarg(3, 2)?;
        if count < 0 {
            self.acc = -1;
            return Ok(());
        }
        let slice = self.memory.slice_mut(buf, count as usize)?;
        self.acc = if fd == 0 {
            match std::io::stdin().read(slice) {
                Ok(n) => n as i64,
                Err(_) => -1,
            }
        } else {
            match self.files.get_mut((fd - 3) as usize) {
                Some(Some(file)) => match file.read(slice) {
                    Ok(n) => n as i64,
                    Err(_) => -1,
                },
                _ => -1,
            }
        };
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let fd = self.sysarg(1, 0)?;
        self.acc = match self.files.get_mut((fd - 3) as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                0
            }
            _ => -1,
        };
        Ok(())
    }

    /// The argument count comes from the `Adj` that follows the call;
    /// a bare `printf()` has no `Adj` and prints nothing.
    fn printf(&mut self) -> Result<()> {
        let argc = match (self.text.get(self.pc), self.text.get(self.pc + 1)) {
            (Some(Word::Op(Opcode::Adj)), Some(Word::Val(n))) => *n,
            _ => 0,
        };
        if argc == 0 {
            self.acc = 0;
            return Ok(());
        }
        let fmt = self.memory.c_str(self.sysarg(argc, 0)?)?.to_vec();
        let mut arg: i64 = 1;
        let mut out: Vec<u8> = Vec::new();
        let mut bytes = fmt.iter().copied();
        while let Some(b) = bytes.next() {
            if b != b'%' {
                out.push(b);
                continue;
            }
            match bytes.next() {
                Some(b'%') => out.push(b'%'),
                Some(b'd') => {
                    let val = self.printf_arg(argc, &mut arg)?;
                    out.extend_from_slice(val.to_string().as_bytes());
                }
                Some(b'x') => {
                    let val = self.printf_arg(argc, &mut arg)?;
                    out.extend_from_slice(format!("{:x}", val).as_bytes());
                }
                Some(b'c') => {
                    let val = self.printf_arg(argc, &mut arg)?;
                    out.push(val as u8);
                }
                Some(b's') => {
                    let ptr = self.printf_arg(argc, &mut arg)?;
                    let s = self.memory.c_str(ptr)?;
                    out.extend_from_slice(s);
                }
                Some(other) => {
                    out.push(b'%');
                    out.push(other);
                }
                None => out.push(b'%'),
            }
        }
        self.output
            .write_all(&out)
            .and_then(|_| self.output.flush())
            .map_err(|e| error!(IoError; e.to_string()))?;
        self.acc = out.len() as i64;
        Ok(())
    }

    fn printf_arg(&self, argc: i64, arg: &mut i64) -> Result<i64> {
        if *arg >= argc {
            return Err(error!(IoError; "MISSING PRINTF ARGUMENT"));
        }
        let val = self.sysarg(argc, *arg)?;
        *arg += 1;
        Ok(val)
    }

    fn memset(&mut self) -> Result<()> {
        let ptr = self.sysarg(3, 0)?;
        let val = self.sysarg(3, 1)?;
        let len = self.sysarg(3, 2)?;
        if len < 0 {
            return Err(error!(MemoryFault; format!("BAD LENGTH {}", len)));
        }
        self.memory
            .slice_mut(ptr, len as usize)?
            .fill(val as u8);
        self.acc = ptr;
        Ok(())
    }

    fn memcmp(&mut self) -> Result<()> {
        let a = self.sysarg(3, 0)?;
        let b = self.sysarg(3, 1)?;
        let len = self.sysarg(3, 2)?;
        if len < 0 {
            return Err(error!(MemoryFault; format!("BAD LENGTH {}", len)));
        }
        let lhs = self.memory.slice(a, len as usize)?.to_vec();
        let rhs = self.memory.slice(b, len as usize)?;
        self.acc = 0;
        for (x, y) in lhs.iter().zip(rhs) {
            if x != y {
                self.acc = *x as i64 - *y as i64;
                break;
            }
        }
        Ok(())
    }
}
