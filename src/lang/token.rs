/// ## Lexical tokens
///
/// Binary and postfix operator tokens are ordered by binding strength;
/// `precedence()` derives the climbing threshold from that order, so
/// there is no separate precedence table.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of input.
    Eof,
    /// Numeric or character literal.
    Num(i64),
    /// String literal; the compiler copies the bytes into the data
    /// segment when it consumes the token.
    Str(String),
    /// Identifier, resolved to an index in the symbol table.
    Id(usize),
    /// A character matching no lexical rule. Never fatal in the lexer;
    /// the compiler rejects it wherever it turns up.
    Unknown(char),

    // Keywords.
    Char,
    Else,
    Enum,
    If,
    Int,
    Return,
    Sizeof,
    While,

    // Binary and postfix operators, weakest binding first.
    Assign,
    Cond,
    Lor,
    Lan,
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
    Inc,
    Dec,
    Brak,

    // Remaining punctuation.
    Not,
    Tilde,
    Semicolon,
    Comma,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    RBrak,
}

impl Token {
    /// Binding strength for the expression climb. `None` for tokens
    /// that can never continue an expression.
    pub fn precedence(&self) -> Option<u32> {
        use Token::*;
        let p = match self {
            Assign => 1,
            Cond => 2,
            Lor => 3,
            Lan => 4,
            Or => 5,
            Xor => 6,
            And => 7,
            Eq => 8,
            Ne => 9,
            Lt => 10,
            Gt => 11,
            Le => 12,
            Ge => 13,
            Shl => 14,
            Shr => 15,
            Add => 16,
            Sub => 17,
            Mul => 18,
            Div => 19,
            Mod => 20,
            Inc => 21,
            Dec => 22,
            Brak => 23,
            _ => return None,
        };
        Some(p)
    }

    /// True when a `level` climb should consume this token.
    pub fn binds_at(&self, level: &Token) -> bool {
        match (self.precedence(), level.precedence()) {
            (Some(op), Some(min)) => op >= min,
            _ => false,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Eof => write!(f, "END OF INPUT"),
            Num(n) => write!(f, "{}", n),
            Str(s) => write!(f, "\"{}\"", s.escape_default()),
            Id(_) => write!(f, "IDENTIFIER"),
            Unknown(c) => write!(f, "{}", c),
            Char => write!(f, "char"),
            Else => write!(f, "else"),
            Enum => write!(f, "enum"),
            If => write!(f, "if"),
            Int => write!(f, "int"),
            Return => write!(f, "return"),
            Sizeof => write!(f, "sizeof"),
            While => write!(f, "while"),
            Assign => write!(f, "="),
            Cond => write!(f, "?"),
            Lor => write!(f, "||"),
            Lan => write!(f, "&&"),
            Or => write!(f, "|"),
            Xor => write!(f, "^"),
            And => write!(f, "&"),
            Eq => write!(f, "=="),
            Ne => write!(f, "!="),
            Lt => write!(f, "<"),
            Gt => write!(f, ">"),
            Le => write!(f, "<="),
            Ge => write!(f, ">="),
            Shl => write!(f, "<<"),
            Shr => write!(f, ">>"),
            Add => write!(f, "+"),
            Sub => write!(f, "-"),
            Mul => write!(f, "*"),
            Div => write!(f, "/"),
            Mod => write!(f, "%"),
            Inc => write!(f, "++"),
            Dec => write!(f, "--"),
            Brak => write!(f, "["),
            Not => write!(f, "!"),
            Tilde => write!(f, "~"),
            Semicolon => write!(f, ";"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            RBrak => write!(f, "]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_order() {
        // The climb relies on this exact ordering.
        let ops = [
            Token::Assign,
            Token::Cond,
            Token::Lor,
            Token::Lan,
            Token::Or,
            Token::Xor,
            Token::And,
            Token::Eq,
            Token::Ne,
            Token::Lt,
            Token::Gt,
            Token::Le,
            Token::Ge,
            Token::Shl,
            Token::Shr,
            Token::Add,
            Token::Sub,
            Token::Mul,
            Token::Div,
            Token::Mod,
            Token::Inc,
            Token::Dec,
            Token::Brak,
        ];
        for pair in ops.windows(2) {
            assert!(pair[0].precedence() < pair[1].precedence());
        }
        assert_eq!(Token::Semicolon.precedence(), None);
        assert!(Token::Mul.binds_at(&Token::Add));
        assert!(!Token::Add.binds_at(&Token::Mul));
    }
}
