use super::{symbol::Class, Symbols, Token};

/// ## Lexer
///
/// Pull-model tokenizer over an immutable source buffer. The compiler
/// asks for one token at a time with `advance()`; there is never more
/// than one current token. The lexer owns the symbol table and inserts
/// every identifier it sees; it never raises errors itself.

pub struct Lexer {
    src: Vec<u8>,
    pos: usize,
    line: u32,
    symbols: Symbols,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            src: source.as_bytes().to_vec(),
            pos: 0,
            line: 1,
            symbols: Symbols::new(),
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut Symbols {
        &mut self.symbols
    }

    fn peek(&self) -> u8 {
        *self.src.get(self.pos).unwrap_or(&0)
    }

    fn bump(&mut self) -> u8 {
        let b = self.peek();
        if b != 0 {
            self.pos += 1;
        }
        b
    }

    fn skip_to_eol(&mut self) {
        while self.peek() != 0 && self.peek() != b'\n' {
            self.pos += 1;
        }
    }

    /// Produce the next token. Exhausted input yields `Eof` forever.
    pub fn advance(&mut self) -> Token {
        loop {
            let b = self.bump();
            match b {
                0 => return Token::Eof,
                b'\n' => {
                    self.line += 1;
                }
                b'#' => {
                    // No preprocessor; the directive line is skipped.
                    self.skip_to_eol();
                }
                _ if is_ident_start(b) => return self.identifier(b),
                b'0'..=b'9' => return self.number(b),
                b'"' | b'\'' => return self.quoted(b),
                b'/' => {
                    if self.peek() == b'/' {
                        self.skip_to_eol();
                    } else {
                        return Token::Div;
                    }
                }
                b'=' => return self.two(b'=', Token::Eq, Token::Assign),
                b'+' => return self.two(b'+', Token::Inc, Token::Add),
                b'-' => return self.two(b'-', Token::Dec, Token::Sub),
                b'!' => return self.two(b'=', Token::Ne, Token::Not),
                b'<' => {
                    return match self.peek() {
                        b'=' => {
                            self.pos += 1;
                            Token::Le
                        }
                        b'<' => {
                            self.pos += 1;
                            Token::Shl
                        }
                        _ => Token::Lt,
                    }
                }
                b'>' => {
                    return match self.peek() {
                        b'=' => {
                            self.pos += 1;
                            Token::Ge
                        }
                        b'>' => {
                            self.pos += 1;
                            Token::Shr
                        }
                        _ => Token::Gt,
                    }
                }
                b'|' => return self.two(b'|', Token::Lor, Token::Or),
                b'&' => return self.two(b'&', Token::Lan, Token::And),
                b'^' => return Token::Xor,
                b'%' => return Token::Mod,
                b'*' => return Token::Mul,
                b'[' => return Token::Brak,
                b'?' => return Token::Cond,
                b'~' => return Token::Tilde,
                b';' => return Token::Semicolon,
                b',' => return Token::Comma,
                b':' => return Token::Colon,
                b'(' => return Token::LParen,
                b')' => return Token::RParen,
                b'{' => return Token::LBrace,
                b'}' => return Token::RBrace,
                b']' => return Token::RBrak,
                b' ' | b'\t' | b'\r' => {}
                _ => return Token::Unknown(b as char),
            }
        }
    }

    fn two(&mut self, second: u8, matched: Token, single: Token) -> Token {
        if self.peek() == second {
            self.pos += 1;
            matched
        } else {
            single
        }
    }

    fn identifier(&mut self, first: u8) -> Token {
        let start = self.pos - 1;
        debug_assert!(is_ident_start(first));
        while is_ident_byte(self.peek()) {
            self.pos += 1;
        }
        let name = std::str::from_utf8(&self.src[start..self.pos])
            .unwrap_or_default()
            .to_string();
        let index = self.symbols.lookup(&name);
        let sym = self.symbols.get(index);
        if sym.class == Class::Keyword {
            sym.token.clone()
        } else {
            Token::Id(index)
        }
    }

    fn number(&mut self, first: u8) -> Token {
        let mut value = (first - b'0') as i64;
        if value > 0 {
            // Decimal never starts with '0'. Literals past i64 wrap,
            // as all machine arithmetic here does.
            while self.peek().is_ascii_digit() {
                value = value
                    .wrapping_mul(10)
                    .wrapping_add((self.bump() - b'0') as i64);
            }
        } else if self.peek() == b'x' || self.peek() == b'X' {
            self.pos += 1;
            while self.peek().is_ascii_hexdigit() {
                let d = self.bump();
                value = value
                    .wrapping_mul(16)
                    .wrapping_add((d & 15) as i64 + if d >= b'A' { 9 } else { 0 });
            }
        } else {
            while (b'0'..=b'7').contains(&self.peek()) {
                value = value
                    .wrapping_mul(8)
                    .wrapping_add((self.bump() - b'0') as i64);
            }
        }
        Token::Num(value)
    }

    /// String and character literals share one scan; only `\n` is a
    /// recognized escape, any other escaped byte passes through.
    fn quoted(&mut self, quote: u8) -> Token {
        let mut bytes: Vec<u8> = vec![];
        let mut last: i64 = 0;
        while self.peek() != 0 && self.peek() != quote {
            let mut b = self.bump();
            if b == b'\\' {
                b = self.bump();
                if b == b'n' {
                    b = b'\n';
                }
            }
            last = b as i64;
            if quote == b'"' {
                bytes.push(b);
            }
        }
        self.pos += 1;
        if quote == b'"' {
            Token::Str(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            Token::Num(last)
        }
    }
}
