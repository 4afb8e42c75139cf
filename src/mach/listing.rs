use super::{Program, Word};

/// ## Listing
///
/// Human-readable rendering of a compiled program, one instruction per
/// line. Opcodes that carry an operand consume the following word, so
/// the listing walks the text the same way the runtime does.
pub struct Listing<'a> {
    program: &'a Program,
}

impl<'a> Listing<'a> {
    pub fn new(program: &'a Program) -> Listing<'a> {
        Listing { program }
    }
}

impl std::fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = self.program.text();
        let mut addr = 0;
        while addr < text.len() {
            if let Some(entry) = self.program.entry() {
                if addr == entry {
                    writeln!(f, "; entry")?;
                }
            }
            match text[addr] {
                Word::Op(op) => {
                    if op.operands() == 1 {
                        let operand = match text.get(addr + 1) {
                            Some(Word::Val(val)) => *val,
                            _ => 0,
                        };
                        writeln!(f, "{:6}  {:4} {}", addr, op, operand)?;
                        addr += 2;
                    } else {
                        writeln!(f, "{:6}  {}", addr, op)?;
                        addr += 1;
                    }
                }
                Word::Val(val) => {
                    // Stray operand word; render it so the listing
                    // stays aligned with the text.
                    writeln!(f, "{:6}  ?    {}", addr, val)?;
                    addr += 1;
                }
            }
        }
        writeln!(f, "; {} data bytes", self.program.data().len())?;
        Ok(())
    }
}
