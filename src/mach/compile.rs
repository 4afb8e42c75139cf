use super::{Opcode, Program, Word, WORD};
use crate::error;
use crate::lang::{Class, Error, Lexer, Token, Type};
use log::debug;

type Result<T> = std::result::Result<T, Error>;

/// Compile a source buffer into a `Program`.
pub fn compile(source: &str) -> Result<Program> {
    Compiler::new(source).compile()
}

/// ## Compiler
///
/// Single-pass recursive descent: every grammar rule validates the
/// token stream and emits code as it goes; there is no syntax tree.
/// The running `expr_type` is what a rule's enclosing operator consults
/// to pick load/store widths and pointer scaling; it must be updated by
/// every expression form.
struct Compiler {
    lexer: Lexer,
    token: Token,
    program: Program,
    /// Value type of the most recently compiled (sub)expression.
    expr_type: Type,
    /// Frame slot count between the base pointer and the first
    /// parameter; local offsets hang off this.
    index_of_bp: i64,
}

impl Compiler {
    fn new(source: &str) -> Compiler {
        let mut lexer = Lexer::new(source);
        let symbols = lexer.symbols_mut();
        symbols.define_keyword("char", Token::Char);
        symbols.define_keyword("else", Token::Else);
        symbols.define_keyword("enum", Token::Enum);
        symbols.define_keyword("if", Token::If);
        symbols.define_keyword("int", Token::Int);
        symbols.define_keyword("return", Token::Return);
        symbols.define_keyword("sizeof", Token::Sizeof);
        symbols.define_keyword("while", Token::While);
        // `void` is accepted and treated as `char`.
        symbols.define_keyword("void", Token::Char);
        for (call, name) in [
            "open", "read", "close", "printf", "malloc", "memset", "memcmp", "exit",
        ]
        .iter()
        .enumerate()
        {
            symbols.define_sys(name, call as i64);
        }
        Compiler {
            lexer,
            token: Token::Eof,
            program: Program::new(),
            expr_type: Type::INT,
            index_of_bp: 0,
        }
    }

    fn compile(mut self) -> Result<Program> {
        self.next();
        while self.token != Token::Eof {
            self.global_declaration()?;
        }
        let main = self.lexer.symbols_mut().lookup("main");
        let main = self.lexer.symbols().get(main);
        if main.class != Class::Func {
            return Err(error!(SemanticError; "MAIN NOT DEFINED"));
        }
        self.program.set_entry(main.value as usize);
        debug!(
            "compiled {} code words, {} data bytes, entry at {}",
            self.program.text().len(),
            self.program.data().len(),
            main.value
        );
        Ok(self.program)
    }

    fn line(&self) -> u32 {
        self.lexer.line()
    }

    fn next(&mut self) {
        self.token = self.lexer.advance();
    }

    /// Consume the expected token or fail the whole compilation.
    fn expect(&mut self, want: Token) -> Result<()> {
        if self.token == want {
            self.next();
            Ok(())
        } else {
            Err(error!(SyntaxError, self.line();
                format!("EXPECTED {} GOT {}", want, self.token)))
        }
    }

    fn ident(&mut self, what: &'static str) -> Result<usize> {
        match self.token {
            Token::Id(index) => {
                self.next();
                Ok(index)
            }
            _ => Err(error!(SyntaxError, self.line(); what)),
        }
    }

    /// Parse one `(int|char) {'*'}` type prefix; `int` is assumed when
    /// no base keyword is present.
    fn type_prefix(&mut self) -> Type {
        let mut ty = Type::INT;
        if self.token == Token::Int {
            self.next();
        } else if self.token == Token::Char {
            ty = Type::CHAR;
            self.next();
        }
        while self.token == Token::Mul {
            self.next();
            ty = ty.ptr_to();
        }
        ty
    }

    // *** Declarations

    fn global_declaration(&mut self) -> Result<()> {
        if self.token == Token::Enum {
            self.next();
            if self.token != Token::LBrace {
                self.ident("BAD ENUM NAME")?;
            }
            // A named enum may omit the body entirely.
            if self.token == Token::LBrace {
                self.next();
                self.enum_declaration()?;
                self.expect(Token::RBrace)?;
            }
            self.expect(Token::Semicolon)?;
            return Ok(());
        }

        let base = match self.token {
            Token::Int => {
                self.next();
                Type::INT
            }
            Token::Char => {
                self.next();
                Type::CHAR
            }
            _ => Type::INT,
        };

        while self.token != Token::Semicolon && self.token != Token::RBrace {
            let mut ty = base;
            while self.token == Token::Mul {
                self.next();
                ty = ty.ptr_to();
            }
            let index = self.ident("BAD GLOBAL DECLARATION")?;
            if self.lexer.symbols().get(index).class != Class::Undefined {
                return Err(error!(SemanticError, self.line();
                    format!("DUPLICATE GLOBAL DECLARATION OF {}",
                        self.lexer.symbols().get(index).name)));
            }
            if self.token == Token::LParen {
                let addr = self.program.here() as i64;
                let sym = self.lexer.symbols_mut().get_mut(index);
                sym.class = Class::Func;
                sym.ty = ty;
                sym.value = addr;
                self.function_declaration()?;
            } else {
                let slot = self.program.global_slot()?;
                let sym = self.lexer.symbols_mut().get_mut(index);
                sym.class = Class::Global;
                sym.ty = ty;
                sym.value = slot;
            }
            if self.token == Token::Comma {
                self.next();
            }
        }
        // The terminating ';', or the '}' that closed a function body.
        self.next();
        Ok(())
    }

    fn enum_declaration(&mut self) -> Result<()> {
        let mut value: i64 = 0;
        while self.token != Token::RBrace {
            let index = self.ident("BAD ENUM IDENTIFIER")?;
            if self.token == Token::Assign {
                self.next();
                match self.token {
                    Token::Num(n) => {
                        value = n;
                        self.next();
                    }
                    _ => return Err(error!(SyntaxError, self.line(); "BAD ENUM INITIALIZER")),
                }
            }
            let sym = self.lexer.symbols_mut().get_mut(index);
            sym.class = Class::EnumConst;
            sym.ty = Type::INT;
            sym.value = value;
            value += 1;
            if self.token == Token::Comma {
                self.next();
            }
        }
        Ok(())
    }

    fn function_declaration(&mut self) -> Result<()> {
        self.expect(Token::LParen)?;
        self.function_parameter()?;
        self.expect(Token::RParen)?;
        self.expect(Token::LBrace)?;
        self.function_body()?;
        // The closing '}' is left for global_declaration's loop.
        self.lexer.symbols_mut().unwind_locals();
        Ok(())
    }

    fn function_parameter(&mut self) -> Result<()> {
        let mut params: i64 = 0;
        while self.token != Token::RParen {
            let ty = self.type_prefix();
            let index = self.ident("BAD PARAMETER DECLARATION")?;
            if self.lexer.symbols().get(index).class == Class::Local {
                return Err(error!(SemanticError, self.line(); "DUPLICATE PARAMETER DECLARATION"));
            }
            self.lexer.symbols_mut().shadow_local(index, ty, params);
            params += 1;
            if self.token == Token::Comma {
                self.next();
            }
        }
        // One saved-return-address word sits between the base pointer
        // and the last parameter slot.
        self.index_of_bp = params + 1;
        Ok(())
    }

    fn function_body(&mut self) -> Result<()> {
        let mut pos_local = self.index_of_bp;
        while self.token == Token::Int || self.token == Token::Char {
            let base = if self.token == Token::Int {
                Type::INT
            } else {
                Type::CHAR
            };
            self.next();
            while self.token != Token::Semicolon {
                let mut ty = base;
                while self.token == Token::Mul {
                    self.next();
                    ty = ty.ptr_to();
                }
                let index = self.ident("BAD LOCAL DECLARATION")?;
                if self.lexer.symbols().get(index).class == Class::Local {
                    return Err(error!(SemanticError, self.line(); "DUPLICATE LOCAL DECLARATION"));
                }
                pos_local += 1;
                self.lexer.symbols_mut().shadow_local(index, ty, pos_local);
                if self.token == Token::Comma {
                    self.next();
                }
            }
            self.expect(Token::Semicolon)?;
        }

        self.program.emit_op(Opcode::Ent)?;
        self.program.emit_val(pos_local - self.index_of_bp)?;

        while self.token != Token::RBrace {
            self.statement()?;
        }
        self.program.emit_op(Opcode::Lev)?;
        Ok(())
    }

    // *** Statements

    fn statement(&mut self) -> Result<()> {
        match self.token {
            Token::If => {
                self.next();
                self.expect(Token::LParen)?;
                self.expression(Token::Assign)?;
                self.expect(Token::RParen)?;
                self.program.emit_op(Opcode::Jz)?;
                let skip_then = self.program.emit_hole()?;
                self.statement()?;
                if self.token == Token::Else {
                    self.next();
                    self.program.emit_op(Opcode::Jmp)?;
                    let skip_else = self.program.emit_hole()?;
                    self.program.patch(skip_then, self.program.here());
                    self.statement()?;
                    self.program.patch(skip_else, self.program.here());
                } else {
                    self.program.patch(skip_then, self.program.here());
                }
                Ok(())
            }
            Token::While => {
                self.next();
                let test = self.program.here();
                self.expect(Token::LParen)?;
                self.expression(Token::Assign)?;
                self.expect(Token::RParen)?;
                self.program.emit_op(Opcode::Jz)?;
                let done = self.program.emit_hole()?;
                self.statement()?;
                self.program.emit_op(Opcode::Jmp)?;
                self.program.emit_val(test as i64)?;
                self.program.patch(done, self.program.here());
                Ok(())
            }
            Token::Return => {
                self.next();
                if self.token != Token::Semicolon {
                    self.expression(Token::Assign)?;
                }
                self.expect(Token::Semicolon)?;
                self.program.emit_op(Opcode::Lev)
            }
            Token::LBrace => {
                self.next();
                while self.token != Token::RBrace {
                    self.statement()?;
                }
                self.expect(Token::RBrace)
            }
            Token::Semicolon => {
                self.next();
                Ok(())
            }
            _ => {
                self.expression(Token::Assign)?;
                self.expect(Token::Semicolon)
            }
        }
    }

    // *** Expressions

    /// Emit the load matching the current expression type.
    fn emit_load(&mut self) -> Result<()> {
        self.program.emit_op(if self.expr_type.is_byte() {
            Opcode::Lc
        } else {
            Opcode::Li
        })
    }

    /// Emit the store matching the current expression type.
    fn emit_store(&mut self) -> Result<()> {
        self.program.emit_op(if self.expr_type.is_byte() {
            Opcode::Sc
        } else {
            Opcode::Si
        })
    }

    /// Increment/decrement step for the current type: pointers with a
    /// word stride move by a word, everything else by one.
    fn step(&self) -> i64 {
        if self.expr_type.word_stride() {
            WORD
        } else {
            1
        }
    }

    /// Turn a just-emitted load into a push of its address followed by
    /// the same load, so the value and its location are both at hand.
    fn dup_load_address(&mut self, what: &'static str) -> Result<()> {
        match self.program.last() {
            Some(Word::Op(op @ (Opcode::Li | Opcode::Lc))) => {
                self.program.rewrite_last(Word::Op(Opcode::Push));
                self.program.emit_op(op)
            }
            _ => Err(error!(SemanticError, self.line(); what)),
        }
    }

    /// Precedence-climbing expression compiler. `level` is the weakest
    /// operator this call may consume; recursion passes the operator
    /// token whose binding strength opens the tier above the current
    /// one, exactly mirroring the token ordering.
    fn expression(&mut self, level: Token) -> Result<()> {
        self.unary()?;

        while self.token.binds_at(&level) {
            let lhs_type = self.expr_type;
            match self.token.clone() {
                Token::Assign => {
                    self.next();
                    match self.program.last() {
                        Some(Word::Op(Opcode::Li)) | Some(Word::Op(Opcode::Lc)) => {
                            self.program.rewrite_last(Word::Op(Opcode::Push));
                        }
                        _ => {
                            return Err(error!(SemanticError, self.line();
                                "BAD LVALUE IN ASSIGNMENT"))
                        }
                    }
                    self.expression(Token::Assign)?;
                    self.expr_type = lhs_type;
                    self.emit_store()?;
                }
                Token::Cond => {
                    self.next();
                    self.program.emit_op(Opcode::Jz)?;
                    let alt = self.program.emit_hole()?;
                    self.expression(Token::Assign)?;
                    self.expect(Token::Colon)?;
                    self.program.emit_op(Opcode::Jmp)?;
                    let done = self.program.emit_hole()?;
                    self.program.patch(alt, self.program.here());
                    self.expression(Token::Cond)?;
                    self.program.patch(done, self.program.here());
                }
                Token::Lor => {
                    self.next();
                    self.program.emit_op(Opcode::Jnz)?;
                    let done = self.program.emit_hole()?;
                    self.expression(Token::Lan)?;
                    self.program.patch(done, self.program.here());
                    self.expr_type = Type::INT;
                }
                Token::Lan => {
                    self.next();
                    self.program.emit_op(Opcode::Jz)?;
                    let done = self.program.emit_hole()?;
                    self.expression(Token::Or)?;
                    self.program.patch(done, self.program.here());
                    self.expr_type = Type::INT;
                }
                Token::Or => self.binary(Token::Xor, Opcode::Or)?,
                Token::Xor => self.binary(Token::And, Opcode::Xor)?,
                Token::And => self.binary(Token::Eq, Opcode::And)?,
                Token::Eq => self.binary(Token::Ne, Opcode::Eq)?,
                Token::Ne => self.binary(Token::Lt, Opcode::Ne)?,
                Token::Lt => self.binary(Token::Shl, Opcode::Lt)?,
                Token::Gt => self.binary(Token::Shl, Opcode::Gt)?,
                Token::Le => self.binary(Token::Shl, Opcode::Le)?,
                Token::Ge => self.binary(Token::Shl, Opcode::Ge)?,
                Token::Shl => self.binary(Token::Add, Opcode::Shl)?,
                Token::Shr => self.binary(Token::Add, Opcode::Shr)?,
                Token::Add => {
                    self.next();
                    self.program.emit_op(Opcode::Push)?;
                    self.expression(Token::Mul)?;
                    self.expr_type = lhs_type;
                    if lhs_type.word_stride() {
                        // Scale the offset to elements of a word.
                        self.program.emit_op(Opcode::Push)?;
                        self.program.emit_op(Opcode::Imm)?;
                        self.program.emit_val(WORD)?;
                        self.program.emit_op(Opcode::Mul)?;
                    }
                    self.program.emit_op(Opcode::Add)?;
                }
                Token::Sub => {
                    self.next();
                    self.program.emit_op(Opcode::Push)?;
                    self.expression(Token::Mul)?;
                    if lhs_type.word_stride() && lhs_type == self.expr_type {
                        // Pointer difference: raw bytes down to elements.
                        self.program.emit_op(Opcode::Sub)?;
                        self.program.emit_op(Opcode::Push)?;
                        self.program.emit_op(Opcode::Imm)?;
                        self.program.emit_val(WORD)?;
                        self.program.emit_op(Opcode::Div)?;
                        self.expr_type = Type::INT;
                    } else if lhs_type.word_stride() {
                        // Pointer movement: scale the subtrahend.
                        self.program.emit_op(Opcode::Push)?;
                        self.program.emit_op(Opcode::Imm)?;
                        self.program.emit_val(WORD)?;
                        self.program.emit_op(Opcode::Mul)?;
                        self.program.emit_op(Opcode::Sub)?;
                        self.expr_type = lhs_type;
                    } else {
                        self.program.emit_op(Opcode::Sub)?;
                        self.expr_type = lhs_type;
                    }
                }
                Token::Mul => self.binary(Token::Inc, Opcode::Mul)?,
                Token::Div => self.binary(Token::Inc, Opcode::Div)?,
                Token::Mod => self.binary(Token::Inc, Opcode::Mod)?,
                op @ (Token::Inc | Token::Dec) => {
                    // Store the adjusted value, then compensate so the
                    // expression yields the pre-adjusted one.
                    self.dup_load_address("BAD LVALUE IN INCREMENT")?;
                    self.program.emit_op(Opcode::Push)?;
                    self.program.emit_op(Opcode::Imm)?;
                    self.program.emit_val(self.step())?;
                    self.program.emit_op(if op == Token::Inc {
                        Opcode::Add
                    } else {
                        Opcode::Sub
                    })?;
                    self.emit_store()?;
                    self.program.emit_op(Opcode::Push)?;
                    self.program.emit_op(Opcode::Imm)?;
                    self.program.emit_val(self.step())?;
                    self.program.emit_op(if op == Token::Inc {
                        Opcode::Sub
                    } else {
                        Opcode::Add
                    })?;
                    self.next();
                }
                Token::Brak => {
                    self.next();
                    self.program.emit_op(Opcode::Push)?;
                    self.expression(Token::Assign)?;
                    self.expect(Token::RBrak)?;
                    if lhs_type.word_stride() {
                        self.program.emit_op(Opcode::Push)?;
                        self.program.emit_op(Opcode::Imm)?;
                        self.program.emit_val(WORD)?;
                        self.program.emit_op(Opcode::Mul)?;
                    } else if !lhs_type.is_ptr() {
                        return Err(error!(SemanticError, self.line(); "POINTER TYPE EXPECTED"));
                    }
                    self.expr_type = lhs_type.deref().unwrap_or(Type::INT);
                    self.program.emit_op(Opcode::Add)?;
                    self.emit_load()?;
                }
                _ => return Err(error!(InternalError; "UNHANDLED OPERATOR")),
            }
        }
        Ok(())
    }

    /// Shared shape of the simple binary tiers: push the left operand,
    /// compile the right side one tier up, combine.
    fn binary(&mut self, right_level: Token, op: Opcode) -> Result<()> {
        let lhs_type = self.expr_type;
        self.next();
        self.program.emit_op(Opcode::Push)?;
        self.expression(right_level)?;
        self.program.emit_op(op)?;
        self.expr_type = match op {
            Opcode::Mul | Opcode::Div | Opcode::Mod => lhs_type,
            _ => Type::INT,
        };
        Ok(())
    }

    /// Unary and primary forms, the head of every expression.
    fn unary(&mut self) -> Result<()> {
        match self.token.clone() {
            Token::Eof => {
                Err(error!(SyntaxError, self.line(); "UNEXPECTED END OF INPUT IN EXPRESSION"))
            }
            Token::Num(n) => {
                self.next();
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(n)?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Token::Str(s) => {
                let addr = self.program.data_addr();
                for b in s.bytes() {
                    self.program.emit_data(b)?;
                }
                self.next();
                // Adjacent string literals concatenate.
                while let Token::Str(more) = self.token.clone() {
                    for b in more.bytes() {
                        self.program.emit_data(b)?;
                    }
                    self.next();
                }
                self.program.align_data()?;
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(addr)?;
                self.expr_type = Type::CHAR.ptr_to();
                Ok(())
            }
            Token::Sizeof => {
                self.next();
                self.expect(Token::LParen)?;
                let ty = self.type_prefix();
                self.expect(Token::RParen)?;
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(if ty.is_byte() { 1 } else { WORD })?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Token::Id(index) => {
                self.next();
                if self.token == Token::LParen {
                    self.call(index)
                } else {
                    self.variable(index)
                }
            }
            Token::LParen => {
                self.next();
                if self.token == Token::Int || self.token == Token::Char {
                    // A cast binds like the other prefix operators.
                    let ty = self.type_prefix();
                    self.expect(Token::RParen)?;
                    self.expression(Token::Inc)?;
                    self.expr_type = ty;
                } else {
                    self.expression(Token::Assign)?;
                    self.expect(Token::RParen)?;
                }
                Ok(())
            }
            Token::Mul => {
                self.next();
                self.expression(Token::Inc)?;
                match self.expr_type.deref() {
                    Some(ty) => self.expr_type = ty,
                    None => {
                        return Err(error!(SemanticError, self.line(); "BAD DEREFERENCE"))
                    }
                }
                self.emit_load()
            }
            Token::And => {
                self.next();
                self.expression(Token::Inc)?;
                match self.program.last() {
                    Some(Word::Op(Opcode::Li)) | Some(Word::Op(Opcode::Lc)) => {
                        self.program.retract();
                    }
                    _ => return Err(error!(SemanticError, self.line(); "BAD ADDRESS OF")),
                }
                self.expr_type = self.expr_type.ptr_to();
                Ok(())
            }
            Token::Not => {
                self.next();
                self.expression(Token::Inc)?;
                self.program.emit_op(Opcode::Push)?;
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(0)?;
                self.program.emit_op(Opcode::Eq)?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Token::Tilde => {
                self.next();
                self.expression(Token::Inc)?;
                self.program.emit_op(Opcode::Push)?;
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(-1)?;
                self.program.emit_op(Opcode::Xor)?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Token::Add => {
                self.next();
                self.expression(Token::Inc)?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Token::Sub => {
                self.next();
                if let Token::Num(n) = self.token {
                    // Literal negation folds into the constant.
                    self.next();
                    self.program.emit_op(Opcode::Imm)?;
                    self.program.emit_val(-n)?;
                } else {
                    self.program.emit_op(Opcode::Imm)?;
                    self.program.emit_val(-1)?;
                    self.program.emit_op(Opcode::Push)?;
                    self.expression(Token::Inc)?;
                    self.program.emit_op(Opcode::Mul)?;
                }
                self.expr_type = Type::INT;
                Ok(())
            }
            op @ (Token::Inc | Token::Dec) => {
                self.next();
                self.expression(Token::Inc)?;
                self.dup_load_address("BAD LVALUE IN PRE-INCREMENT")?;
                self.program.emit_op(Opcode::Push)?;
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(self.step())?;
                self.program.emit_op(if op == Token::Inc {
                    Opcode::Add
                } else {
                    Opcode::Sub
                })?;
                self.emit_store()
            }
            other => {
                Err(error!(SyntaxError, self.line(); format!("UNEXPECTED TOKEN {}", other)))
            }
        }
    }

    /// Call through a resolved name: built-ins emit their own opcode,
    /// functions a `Call`; arguments are pushed left to right and
    /// discarded with one `Adj` after the call.
    fn call(&mut self, index: usize) -> Result<()> {
        self.expect(Token::LParen)?;
        let mut args: i64 = 0;
        while self.token != Token::RParen {
            self.expression(Token::Assign)?;
            self.program.emit_op(Opcode::Push)?;
            args += 1;
            if self.token == Token::Comma {
                self.next();
            }
        }
        self.expect(Token::RParen)?;
        let sym = self.lexer.symbols().get(index);
        let (class, ty, value) = (sym.class, sym.ty, sym.value);
        match class {
            Class::Sys => {
                self.program.emit_op(Opcode::SYS[value as usize])?;
            }
            Class::Func => {
                self.program.emit_op(Opcode::Call)?;
                self.program.emit_val(value)?;
            }
            _ => return Err(error!(SemanticError, self.line(); "BAD FUNCTION CALL")),
        }
        if args > 0 {
            self.program.emit_op(Opcode::Adj)?;
            self.program.emit_val(args)?;
        }
        self.expr_type = ty;
        Ok(())
    }

    /// A bare name: enum constant, global, or local; variables load
    /// their value immediately (the climb rewrites the load when the
    /// name turns out to be an lvalue).
    fn variable(&mut self, index: usize) -> Result<()> {
        let sym = self.lexer.symbols().get(index);
        let (class, ty, value) = (sym.class, sym.ty, sym.value);
        match class {
            Class::EnumConst => {
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(value)?;
                self.expr_type = Type::INT;
                Ok(())
            }
            Class::Local => {
                self.program.emit_op(Opcode::Lea)?;
                self.program.emit_val(self.index_of_bp - value)?;
                self.expr_type = ty;
                self.emit_load()
            }
            Class::Global => {
                self.program.emit_op(Opcode::Imm)?;
                self.program.emit_val(value)?;
                self.expr_type = ty;
                self.emit_load()
            }
            _ => Err(error!(SemanticError, self.line();
                format!("UNDEFINED VARIABLE {}", self.lexer.symbols().get(index).name))),
        }
    }
}
