//! Recursive-descent parser: `Vec<Token>` → `ast::CompUnit`.
//!
//! One method per grammar production, following the expression precedence
//! cascade in SPEC_FULL.md §3.1: `lor` → `land` → `eq` → `rel` → `add` → `mul` →
//! `unary` → `primary`. Each method consumes what it can and returns a `Result`,
//! mirroring the teacher's `Parser` shape in spirit (owned cursor over a token
//! buffer, one method per production) though SysY's grammar is simpler than
//! Seq's.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::lexer::{Tok, Token};

pub struct Parser {
    toks: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(toks: Vec<Token>) -> Self {
        Parser { toks, pos: 0 }
    }

    fn cur(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn loc(&self) -> (usize, usize) {
        let t = &self.toks[self.pos];
        (t.line, t.col)
    }

    fn bump(&mut self) -> Tok {
        let t = self.toks[self.pos].tok.clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, tok: Tok) -> CompileResult<()> {
        if *self.cur() == tok {
            self.bump();
            Ok(())
        } else {
            let (line, col) = self.loc();
            Err(CompileError::Parse {
                line,
                col,
                message: format!("expected {:?}, found {:?}", tok, self.cur()),
            })
        }
    }

    fn expect_ident(&mut self) -> CompileResult<String> {
        match self.cur().clone() {
            Tok::Ident(name) => {
                self.bump();
                Ok(name)
            }
            other => {
                let (line, col) = self.loc();
                Err(CompileError::Parse {
                    line,
                    col,
                    message: format!("expected identifier, found {:?}", other),
                })
            }
        }
    }

    /// True if the upcoming tokens look like `Ident '('` — distinguishes a
    /// function definition from a variable declaration at top level, both of
    /// which start with a type then an identifier.
    fn looks_like_func_def(&self) -> bool {
        matches!(self.toks.get(self.pos + 1).map(|t| &t.tok), Some(Tok::LParen))
    }

    pub fn parse_comp_unit(mut self) -> CompileResult<CompUnit> {
        let mut items = Vec::new();
        while *self.cur() != Tok::Eof {
            items.push(self.parse_global_item()?);
        }
        Ok(CompUnit { items })
    }

    fn parse_global_item(&mut self) -> CompileResult<GlobalItem> {
        let is_const = *self.cur() == Tok::Const;
        if is_const {
            return Ok(GlobalItem::Decl(Decl::Const(self.parse_const_decl()?)));
        }
        // `int`/`void` followed by `ident (` is a function; `int`/`void ident` (no
        // paren) followed by `;`/`[`/`=`/`,` is a variable declaration. `void` can
        // only start a function.
        if *self.cur() == Tok::Void {
            return Ok(GlobalItem::FuncDef(self.parse_func_def()?));
        }
        self.expect(Tok::Int)?;
        let name = self.expect_ident()?;
        if *self.cur() == Tok::LParen {
            let func = self.parse_func_def_rest(FuncType::Int, name)?;
            return Ok(GlobalItem::FuncDef(func));
        }
        let decl = Decl::Var(self.parse_var_decl_rest(name)?);
        Ok(GlobalItem::Decl(decl))
    }

    fn parse_func_def(&mut self) -> CompileResult<FuncDef> {
        let ret_ty = match self.bump() {
            Tok::Int => FuncType::Int,
            Tok::Void => FuncType::Void,
            other => {
                let (line, col) = self.loc();
                return Err(CompileError::Parse {
                    line,
                    col,
                    message: format!("expected function return type, found {:?}", other),
                });
            }
        };
        let name = self.expect_ident()?;
        self.parse_func_def_rest(ret_ty, name)
    }

    fn parse_func_def_rest(&mut self, ret_ty: FuncType, name: String) -> CompileResult<FuncDef> {
        self.expect(Tok::LParen)?;
        let mut params = Vec::new();
        if *self.cur() != Tok::RParen {
            params.push(self.parse_func_fparam()?);
            while *self.cur() == Tok::Comma {
                self.bump();
                params.push(self.parse_func_fparam()?);
            }
        }
        self.expect(Tok::RParen)?;
        let body = self.parse_block()?;
        Ok(FuncDef { ret_ty, name, params, body })
    }

    fn parse_func_fparam(&mut self) -> CompileResult<FuncFParam> {
        self.expect(Tok::Int)?;
        let name = self.expect_ident()?;
        if *self.cur() == Tok::LBracket {
            self.bump();
            self.expect(Tok::RBracket)?;
            let mut dims = Vec::new();
            while *self.cur() == Tok::LBracket {
                self.bump();
                dims.push(self.parse_expr()?);
                self.expect(Tok::RBracket)?;
            }
            return Ok(FuncFParam { name, dims: Some(dims) });
        }
        Ok(FuncFParam { name, dims: None })
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        self.expect(Tok::LBrace)?;
        let mut items = Vec::new();
        while *self.cur() != Tok::RBrace {
            items.push(self.parse_block_item()?);
        }
        self.expect(Tok::RBrace)?;
        Ok(Block { items })
    }

    fn parse_block_item(&mut self) -> CompileResult<BlockItem> {
        match self.cur() {
            Tok::Const => Ok(BlockItem::Decl(Decl::Const(self.parse_const_decl()?))),
            Tok::Int => Ok(BlockItem::Decl(Decl::Var(self.parse_var_decl()?))),
            _ => Ok(BlockItem::Stmt(self.parse_stmt()?)),
        }
    }

    fn parse_const_decl(&mut self) -> CompileResult<ConstDecl> {
        self.expect(Tok::Const)?;
        self.expect(Tok::Int)?;
        let mut defs = vec![self.parse_const_def()?];
        while *self.cur() == Tok::Comma {
            self.bump();
            defs.push(self.parse_const_def()?);
        }
        self.expect(Tok::Semi)?;
        Ok(ConstDecl { defs })
    }

    fn parse_const_def(&mut self) -> CompileResult<ConstDef> {
        let name = self.expect_ident()?;
        let dims = self.parse_array_dims()?;
        self.expect(Tok::Assign)?;
        let init = self.parse_const_init_val()?;
        Ok(ConstDef { name, dims, init })
    }

    fn parse_const_init_val(&mut self) -> CompileResult<ConstInitVal> {
        if *self.cur() == Tok::LBrace {
            self.bump();
            let mut list = Vec::new();
            if *self.cur() != Tok::RBrace {
                list.push(self.parse_const_init_val()?);
                while *self.cur() == Tok::Comma {
                    self.bump();
                    list.push(self.parse_const_init_val()?);
                }
            }
            self.expect(Tok::RBrace)?;
            return Ok(ConstInitVal::List(list));
        }
        Ok(ConstInitVal::Exp(self.parse_expr()?))
    }

    fn parse_var_decl(&mut self) -> CompileResult<VarDecl> {
        self.expect(Tok::Int)?;
        let name = self.expect_ident()?;
        self.parse_var_decl_rest(name)
    }

    fn parse_var_decl_rest(&mut self, first_name: String) -> CompileResult<VarDecl> {
        let mut defs = vec![self.parse_var_def(first_name)?];
        while *self.cur() == Tok::Comma {
            self.bump();
            let name = self.expect_ident()?;
            defs.push(self.parse_var_def(name)?);
        }
        self.expect(Tok::Semi)?;
        Ok(VarDecl { defs })
    }

    fn parse_var_def(&mut self, name: String) -> CompileResult<VarDef> {
        let dims = self.parse_array_dims()?;
        let init = if *self.cur() == Tok::Assign {
            self.bump();
            Some(self.parse_init_val()?)
        } else {
            None
        };
        Ok(VarDef { name, dims, init })
    }

    fn parse_init_val(&mut self) -> CompileResult<InitVal> {
        if *self.cur() == Tok::LBrace {
            self.bump();
            let mut list = Vec::new();
            if *self.cur() != Tok::RBrace {
                list.push(self.parse_init_val()?);
                while *self.cur() == Tok::Comma {
                    self.bump();
                    list.push(self.parse_init_val()?);
                }
            }
            self.expect(Tok::RBrace)?;
            return Ok(InitVal::List(list));
        }
        Ok(InitVal::Exp(self.parse_expr()?))
    }

    fn parse_array_dims(&mut self) -> CompileResult<Vec<Expr>> {
        let mut dims = Vec::new();
        while *self.cur() == Tok::LBracket {
            self.bump();
            dims.push(self.parse_expr()?);
            self.expect(Tok::RBracket)?;
        }
        Ok(dims)
    }

    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        match self.cur().clone() {
            Tok::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Tok::If => {
                self.bump();
                self.expect(Tok::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Tok::RParen)?;
                let then = Box::new(self.parse_stmt()?);
                let els = if *self.cur() == Tok::Else {
                    self.bump();
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If(cond, then, els))
            }
            Tok::While => {
                self.bump();
                self.expect(Tok::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Tok::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While(cond, body))
            }
            Tok::Break => {
                self.bump();
                self.expect(Tok::Semi)?;
                Ok(Stmt::Break)
            }
            Tok::Continue => {
                self.bump();
                self.expect(Tok::Semi)?;
                Ok(Stmt::Continue)
            }
            Tok::Return => {
                self.bump();
                let value = if *self.cur() == Tok::Semi {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(Tok::Semi)?;
                Ok(Stmt::Return(value))
            }
            Tok::Semi => {
                self.bump();
                Ok(Stmt::Exp(None))
            }
            _ => self.parse_assign_or_exp_stmt(),
        }
    }

    /// `LVal '=' Exp ';'` and `Exp ';'` share the same leading tokens, so this
    /// speculatively parses the `LVal`-shaped prefix and only commits to an
    /// assignment if `=` actually follows; otherwise the whole thing is
    /// re-parsed as a general expression from the start.
    fn parse_assign_or_exp_stmt(&mut self) -> CompileResult<Stmt> {
        if let Tok::Ident(_) = self.cur().clone() {
            let checkpoint = self.pos;
            if let Ok(lval) = self.try_parse_lval() {
                if *self.cur() == Tok::Assign {
                    self.bump();
                    let rhs = self.parse_expr()?;
                    self.expect(Tok::Semi)?;
                    return Ok(Stmt::Assign(lval, rhs));
                }
            }
            self.pos = checkpoint;
        }
        let exp = self.parse_expr()?;
        self.expect(Tok::Semi)?;
        Ok(Stmt::Exp(Some(exp)))
    }

    fn try_parse_lval(&mut self) -> CompileResult<LVal> {
        let name = self.expect_ident()?;
        let indices = self.parse_array_dims()?;
        Ok(LVal { name, indices })
    }

    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        self.parse_lor_exp()
    }

    fn parse_lor_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_land_exp()?;
        while *self.cur() == Tok::OrOr {
            self.bump();
            let rhs = self.parse_land_exp()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_land_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_eq_exp()?;
        while *self.cur() == Tok::AndAnd {
            self.bump();
            let rhs = self.parse_eq_exp()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_eq_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_rel_exp()?;
        loop {
            let op = match self.cur() {
                Tok::Eq => BinaryOp::Eq,
                Tok::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_rel_exp()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_rel_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_add_exp()?;
        loop {
            let op = match self.cur() {
                Tok::Lt => BinaryOp::Lt,
                Tok::Le => BinaryOp::Le,
                Tok::Gt => BinaryOp::Gt,
                Tok::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_add_exp()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_add_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_mul_exp()?;
        loop {
            let op = match self.cur() {
                Tok::Plus => BinaryOp::Add,
                Tok::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_mul_exp()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul_exp(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_unary_exp()?;
        loop {
            let op = match self.cur() {
                Tok::Star => BinaryOp::Mul,
                Tok::Slash => BinaryOp::Div,
                Tok::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary_exp()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary_exp(&mut self) -> CompileResult<Expr> {
        match self.cur() {
            Tok::Plus => {
                self.bump();
                Ok(Expr::Unary(UnaryOp::Pos, Box::new(self.parse_unary_exp()?)))
            }
            Tok::Minus => {
                self.bump();
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary_exp()?)))
            }
            Tok::Not => {
                self.bump();
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary_exp()?)))
            }
            Tok::Ident(_) if self.next_is_call() => self.parse_call(),
            _ => self.parse_primary_exp(),
        }
    }

    fn next_is_call(&self) -> bool {
        matches!(self.toks.get(self.pos + 1).map(|t| &t.tok), Some(Tok::LParen))
    }

    fn parse_call(&mut self) -> CompileResult<Expr> {
        let name = self.expect_ident()?;
        self.expect(Tok::LParen)?;
        let mut args = Vec::new();
        if *self.cur() != Tok::RParen {
            args.push(self.parse_expr()?);
            while *self.cur() == Tok::Comma {
                self.bump();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Tok::RParen)?;
        Ok(Expr::Call(name, args))
    }

    fn parse_primary_exp(&mut self) -> CompileResult<Expr> {
        match self.cur().clone() {
            Tok::LParen => {
                self.bump();
                let e = self.parse_expr()?;
                self.expect(Tok::RParen)?;
                Ok(e)
            }
            Tok::Number(n) => {
                self.bump();
                Ok(Expr::Number(n))
            }
            Tok::Ident(_) => {
                let lval = self.try_parse_lval()?;
                Ok(Expr::LVal(lval))
            }
            other => {
                let (line, col) = self.loc();
                Err(CompileError::Parse {
                    line,
                    col,
                    message: format!("expected expression, found {:?}", other),
                })
            }
        }
    }
}

pub fn parse(src: &str) -> CompileResult<CompUnit> {
    let toks = crate::lexer::Lexer::new(src).tokenize()?;
    Parser::new(toks).parse_comp_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_main() {
        let unit = parse("int main() { return 0; }").unwrap();
        assert_eq!(unit.items.len(), 1);
        match &unit.items[0] {
            GlobalItem::FuncDef(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.ret_ty, FuncType::Int);
            }
            _ => panic!("expected func def"),
        }
    }

    #[test]
    fn parses_array_param_and_call() {
        let unit = parse("int f(int a[]) { return a[0]; } int main() { int x[2] = {3, 4}; return f(x); }").unwrap();
        assert_eq!(unit.items.len(), 2);
    }

    #[test]
    fn assignment_disambiguates_from_expression_statement() {
        let unit = parse("int main() { int a; a = 1; a + 1; return a; }").unwrap();
        match &unit.items[0] {
            GlobalItem::FuncDef(f) => {
                assert_eq!(f.body.items.len(), 4);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_precedence() {
        // 1 + 2 * 3 should parse as Add(1, Mul(2, 3))
        let unit = parse("int main() { return 1 + 2 * 3; }").unwrap();
        let GlobalItem::FuncDef(f) = &unit.items[0] else { panic!() };
        let BlockItem::Stmt(Stmt::Return(Some(Expr::Binary(BinaryOp::Add, lhs, rhs)))) =
            &f.body.items[0]
        else {
            panic!("expected Add at top level")
        };
        assert!(matches!(**lhs, Expr::Number(1)));
        assert!(matches!(**rhs, Expr::Binary(BinaryOp::Mul, _, _)));
    }
}
