/// ## Compiler and runtime errors
///
/// Every fatal condition in the pipeline is an `Error` carrying a code,
/// the best-known source line, and an optional detail message. Lexical
/// anomalies are never fatal; unknown input degrades to a raw character
/// token and the compiler reports the mismatch.

pub struct Error {
    code: ErrorCode,
    line: Option<u32>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line($line)
            .message($msg)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxError = 2,
    SemanticError = 3,
    ArithmeticError = 11,
    IllegalInstruction = 30,
    MemoryFault = 31,
    OutOfMemory = 7,
    IoError = 57,
    InternalError = 51,
    Interrupted = 130,
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line: None,
            message: String::new(),
        }
    }

    pub fn in_line(mut self, line: u32) -> Error {
        debug_assert!(self.line.is_none());
        self.line = Some(line);
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Error {
        debug_assert!(self.message.is_empty());
        self.message = message.into();
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            ErrorCode::SyntaxError => "SYNTAX ERROR",
            ErrorCode::SemanticError => "SEMANTIC ERROR",
            ErrorCode::ArithmeticError => "DIVISION BY ZERO",
            ErrorCode::IllegalInstruction => "ILLEGAL INSTRUCTION",
            ErrorCode::MemoryFault => "MEMORY FAULT",
            ErrorCode::OutOfMemory => "OUT OF MEMORY",
            ErrorCode::IoError => "I/O ERROR",
            ErrorCode::InternalError => "INTERNAL ERROR",
            ErrorCode::Interrupted => "BREAK",
        };
        write!(f, "{}", code_str)?;
        if let Some(line) = self.line {
            write!(f, " IN LINE {}", line)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::new(ErrorCode::SyntaxError)
            .in_line(12)
            .message("EXPECTED ;");
        assert_eq!(e.to_string(), "SYNTAX ERROR IN LINE 12; EXPECTED ;");
        let e = Error::new(ErrorCode::OutOfMemory);
        assert_eq!(e.to_string(), "OUT OF MEMORY");
    }
}
