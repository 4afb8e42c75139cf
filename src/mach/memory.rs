use super::WORD;
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Program memory
///
/// One flat byte space shared by the data segment (at address zero),
/// a bump-allocated heap after it, and the stack at the top growing
/// down. A single space keeps pointer arithmetic honest: addresses of
/// globals, locals, string bytes, and `malloc` blocks all live on the
/// same number line.

pub struct Memory {
    bytes: Vec<u8>,
    brk: usize,
}

impl Memory {
    /// Lay out `data` at the base and reserve `size` total bytes.
    pub fn new(data: &[u8], size: usize) -> Result<Memory> {
        if data.len() + 64 * WORD as usize > size {
            return Err(error!(OutOfMemory; "DATA SEGMENT EXCEEDS MEMORY"));
        }
        let mut bytes = vec![0u8; size];
        bytes[..data.len()].copy_from_slice(data);
        // Heap starts at the first word boundary past the data.
        let brk = (data.len() + WORD as usize - 1) & !(WORD as usize - 1);
        Ok(Memory { bytes, brk })
    }

    fn check(&self, addr: i64, len: usize) -> Result<usize> {
        let addr = addr as usize;
        if addr.checked_add(len).map_or(true, |end| end > self.bytes.len()) {
            return Err(error!(MemoryFault; format!("ADDRESS {} OUT OF BOUNDS", addr as i64)));
        }
        Ok(addr)
    }

    pub fn read_word(&self, addr: i64) -> Result<i64> {
        let at = self.check(addr, WORD as usize)?;
        let mut buf = [0u8; WORD as usize];
        buf.copy_from_slice(&self.bytes[at..at + WORD as usize]);
        Ok(i64::from_le_bytes(buf))
    }

    pub fn write_word(&mut self, addr: i64, val: i64) -> Result<()> {
        let at = self.check(addr, WORD as usize)?;
        self.bytes[at..at + WORD as usize].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    pub fn read_byte(&self, addr: i64) -> Result<i64> {
        let at = self.check(addr, 1)?;
        Ok(self.bytes[at] as i64)
    }

    pub fn write_byte(&mut self, addr: i64, val: i64) -> Result<()> {
        let at = self.check(addr, 1)?;
        self.bytes[at] = val as u8;
        Ok(())
    }

    pub fn slice(&self, addr: i64, len: usize) -> Result<&[u8]> {
        let at = self.check(addr, len)?;
        Ok(&self.bytes[at..at + len])
    }

    pub fn slice_mut(&mut self, addr: i64, len: usize) -> Result<&mut [u8]> {
        let at = self.check(addr, len)?;
        Ok(&mut self.bytes[at..at + len])
    }

    /// Bytes from `addr` up to the first NUL; the tail of every C
    /// string in this machine.
    pub fn c_str(&self, addr: i64) -> Result<&[u8]> {
        let at = self.check(addr, 1)?;
        let end = self.bytes[at..]
            .iter()
            .position(|&b| b == 0)
            .map(|p| at + p)
            .unwrap_or(self.bytes.len());
        Ok(&self.bytes[at..end])
    }

    /// Bump-allocate `len` zeroed bytes, word aligned. Fails when the
    /// heap would run into the stack reserve at the top.
    pub fn alloc(&mut self, len: i64, stack_reserve: usize) -> Result<i64> {
        if len < 0 {
            return Err(error!(MemoryFault; "NEGATIVE ALLOCATION"));
        }
        let len = ((len as usize) + WORD as usize - 1) & !(WORD as usize - 1);
        if self.brk + len > self.bytes.len().saturating_sub(stack_reserve) {
            return Err(error!(OutOfMemory; "HEAP EXHAUSTED"));
        }
        let addr = self.brk as i64;
        self.brk += len;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_round_trip() {
        let mut m = Memory::new(&[0; 16], 4096).unwrap();
        m.write_word(16, -5).unwrap();
        assert_eq!(m.read_word(16).unwrap(), -5);
        m.write_byte(24, 0x41).unwrap();
        assert_eq!(m.read_byte(24).unwrap(), 0x41);
    }

    #[test]
    fn test_bounds() {
        let m = Memory::new(&[], 4096).unwrap();
        assert!(m.read_word(4090).is_err());
        assert!(m.read_word(-8).is_err());
        assert!(m.read_word(4088).is_ok());
    }

    #[test]
    fn test_alloc_and_c_str() {
        let mut m = Memory::new(b"hi\0", 4096).unwrap();
        assert_eq!(m.c_str(0).unwrap(), b"hi");
        let a = m.alloc(3, 64).unwrap();
        let b = m.alloc(3, 64).unwrap();
        assert_eq!(a % WORD, 0);
        assert!(b >= a + WORD);
    }
}
