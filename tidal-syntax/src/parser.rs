/// Recursive descent parser with precedence climbing for Tidal.
///
/// Names are resolved against a stack of lexical scopes while parsing, so the
/// resulting AST already distinguishes locals (by `LocalId`) from globals.
use std::collections::HashMap;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{parse_number, Lexer};
use crate::token::{Token, TokenKind};

/// Parse a complete source string into a `Program`.
///
/// ```
/// use tidal_syntax::parse_program;
///
/// let prog = parse_program("local m = math\nprint(m.sqrt(4))").unwrap();
/// assert_eq!(prog.body.stmts.len(), 2);
/// assert_eq!(prog.locals.len(), 1);
/// ```
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    parser.do_parse_program()
}

const UNARY_PRIORITY: u8 = 8;

fn binary_priority(kind: &TokenKind) -> Option<(BinOp, u8, u8)> {
    // (op, left priority, right priority); right < left means right-associative
    let entry = match kind {
        TokenKind::Or => (BinOp::Or, 1, 1),
        TokenKind::And => (BinOp::And, 2, 2),
        TokenKind::EqEq => (BinOp::Eq, 3, 3),
        TokenKind::Neq => (BinOp::Ne, 3, 3),
        TokenKind::Lt => (BinOp::Lt, 3, 3),
        TokenKind::Le => (BinOp::Le, 3, 3),
        TokenKind::Gt => (BinOp::Gt, 3, 3),
        TokenKind::Ge => (BinOp::Ge, 3, 3),
        TokenKind::DotDot => (BinOp::Concat, 5, 4),
        TokenKind::Plus => (BinOp::Add, 6, 6),
        TokenKind::Minus => (BinOp::Sub, 6, 6),
        TokenKind::Star => (BinOp::Mul, 7, 7),
        TokenKind::Slash => (BinOp::Div, 7, 7),
        TokenKind::SlashSlash => (BinOp::IDiv, 7, 7),
        TokenKind::Percent => (BinOp::Mod, 7, 7),
        TokenKind::Caret => (BinOp::Pow, 10, 9),
        _ => return None,
    };
    Some(entry)
}

fn compound_op(kind: &TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::PlusAssign => BinOp::Add,
        TokenKind::MinusAssign => BinOp::Sub,
        TokenKind::StarAssign => BinOp::Mul,
        TokenKind::SlashAssign => BinOp::Div,
        TokenKind::SlashSlashAssign => BinOp::IDiv,
        TokenKind::PercentAssign => BinOp::Mod,
        TokenKind::CaretAssign => BinOp::Pow,
        TokenKind::DotDotAssign => BinOp::Concat,
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    locals: Vec<LocalDecl>,
    scopes: Vec<HashMap<String, LocalId>>,
    function_depth: u32,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            locals: Vec::new(),
            scopes: Vec::new(),
            function_depth: 0,
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn span(&self) -> Span {
        self.peek().span.clone()
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let tok = self.peek();
        ParseError::new(message, tok.span.line, tok.span.col)
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            let found = match self.peek_kind() {
                TokenKind::Eof => "<eof>".to_string(),
                _ => self.peek().lexeme.clone(),
            };
            Err(self.error_here(format!("expected {}, found `{}`", what, found)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        Ok(self.expect(&TokenKind::Ident, "identifier")?.lexeme)
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Allocates a fresh binding; it becomes visible once `bind` is called.
    fn new_local(&mut self, name: String, span: Span) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalDecl {
            name,
            span,
            function_depth: self.function_depth,
        });
        id
    }

    fn bind(&mut self, id: LocalId) {
        let name = self.locals[id.0 as usize].name.clone();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, id);
        }
    }

    fn lookup(&self, name: &str) -> Option<LocalId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    // ========================================================================
    // Program / Block
    // ========================================================================

    fn do_parse_program(&mut self) -> Result<Program, ParseError> {
        let body = self.parse_block()?;
        if !self.at(&TokenKind::Eof) {
            return Err(self.error_here(format!("unexpected `{}`", self.peek().lexeme)));
        }
        Ok(Program {
            body,
            locals: std::mem::take(&mut self.locals),
        })
    }

    fn block_follows(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Eof | TokenKind::End | TokenKind::Else | TokenKind::ElseIf | TokenKind::Until
        )
    }

    /// Parses statements in a fresh scope until a block terminator.
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.push_scope();
        let block = self.parse_block_body();
        self.pop_scope();
        block
    }

    fn parse_block_body(&mut self) -> Result<Block, ParseError> {
        let span = self.span();
        let mut stmts = Vec::new();
        while !self.block_follows() {
            let is_last = matches!(self.peek_kind(), TokenKind::Return | TokenKind::Break);
            stmts.push(self.parse_stmt()?);
            self.eat(&TokenKind::Semicolon);
            if is_last {
                break;
            }
        }
        Ok(Block { stmts, span })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Local => {
                self.advance();
                if self.eat(&TokenKind::Function) {
                    self.parse_local_function(span)
                } else {
                    self.parse_local(span)
                }
            }
            TokenKind::Function => self.parse_function_stmt(span),
            TokenKind::Do => {
                self.advance();
                let body = self.parse_block()?;
                self.expect(&TokenKind::End, "`end`")?;
                Ok(Stmt::Do(body))
            }
            TokenKind::If => self.parse_if(span),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expr()?;
                self.expect(&TokenKind::Do, "`do`")?;
                let body = self.parse_block()?;
                self.expect(&TokenKind::End, "`end`")?;
                Ok(Stmt::While {
                    condition,
                    body,
                    span,
                })
            }
            TokenKind::Repeat => {
                self.advance();
                // the condition sees the body's locals
                self.push_scope();
                let body = self.parse_block_body();
                let rest = body.and_then(|body| {
                    self.expect(&TokenKind::Until, "`until`")?;
                    let condition = self.parse_expr()?;
                    Ok(Stmt::Repeat {
                        body,
                        condition,
                        span,
                    })
                });
                self.pop_scope();
                rest
            }
            TokenKind::For => self.parse_for(span),
            TokenKind::Return => {
                self.advance();
                let values = if self.block_follows() || self.at(&TokenKind::Semicolon) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                Ok(Stmt::Return { values, span })
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::Break { span })
            }
            _ => self.parse_expr_stmt(span),
        }
    }

    fn parse_local(&mut self, span: Span) -> Result<Stmt, ParseError> {
        let mut vars = Vec::new();
        loop {
            let var_span = self.span();
            let name = self.expect_ident()?;
            vars.push(self.new_local(name, var_span));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let values = if self.eat(&TokenKind::Assign) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        // initializers are evaluated before the new names come into scope
        for &var in &vars {
            self.bind(var);
        }
        Ok(Stmt::Local { vars, values, span })
    }

    fn parse_local_function(&mut self, span: Span) -> Result<Stmt, ParseError> {
        let name_span = self.span();
        let name = self.expect_ident()?;
        let var = self.new_local(name, name_span);
        // visible inside its own body for recursion
        self.bind(var);
        let func = self.parse_function_body(span.clone(), None)?;
        Ok(Stmt::LocalFunction { var, func, span })
    }

    fn parse_function_stmt(&mut self, span: Span) -> Result<Stmt, ParseError> {
        self.advance();
        let name_span = self.span();
        let name = self.expect_ident()?;
        let mut target = self.name_expr(name, name_span);
        let mut is_method = false;
        loop {
            if self.eat(&TokenKind::Dot) {
                let member = self.expect_ident()?;
                target = Expr::IndexName {
                    object: Box::new(target),
                    member,
                    span: span.clone(),
                };
            } else if self.eat(&TokenKind::Colon) {
                let member = self.expect_ident()?;
                target = Expr::IndexName {
                    object: Box::new(target),
                    member,
                    span: span.clone(),
                };
                is_method = true;
                break;
            } else {
                break;
            }
        }
        let self_name = is_method.then(|| "self".to_string());
        let func = self.parse_function_body(span.clone(), self_name)?;
        Ok(Stmt::Function { target, func, span })
    }

    fn parse_if(&mut self, span: Span) -> Result<Stmt, ParseError> {
        self.advance();
        let mut branches = Vec::new();
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::Then, "`then`")?;
        branches.push((condition, self.parse_block()?));
        let mut else_block = None;
        loop {
            if self.eat(&TokenKind::ElseIf) {
                let condition = self.parse_expr()?;
                self.expect(&TokenKind::Then, "`then`")?;
                branches.push((condition, self.parse_block()?));
            } else if self.eat(&TokenKind::Else) {
                else_block = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }
        self.expect(&TokenKind::End, "`end`")?;
        Ok(Stmt::If {
            branches,
            else_block,
            span,
        })
    }

    fn parse_for(&mut self, span: Span) -> Result<Stmt, ParseError> {
        self.advance();
        let first_span = self.span();
        let first = self.expect_ident()?;
        if self.eat(&TokenKind::Assign) {
            let start = self.parse_expr()?;
            self.expect(&TokenKind::Comma, "`,`")?;
            let limit = self.parse_expr()?;
            let step = if self.eat(&TokenKind::Comma) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(&TokenKind::Do, "`do`")?;
            self.push_scope();
            let var = self.new_local(first, first_span);
            self.bind(var);
            let body = self.parse_block();
            self.pop_scope();
            let body = body?;
            self.expect(&TokenKind::End, "`end`")?;
            return Ok(Stmt::NumericFor {
                var,
                start,
                limit,
                step,
                body,
                span,
            });
        }

        let mut names = vec![(first, first_span)];
        while self.eat(&TokenKind::Comma) {
            let s = self.span();
            names.push((self.expect_ident()?, s));
        }
        self.expect(&TokenKind::In, "`in`")?;
        let values = self.parse_expr_list()?;
        self.expect(&TokenKind::Do, "`do`")?;
        self.push_scope();
        let vars: Vec<LocalId> = names
            .into_iter()
            .map(|(name, s)| {
                let id = self.new_local(name, s);
                self.bind(id);
                id
            })
            .collect();
        let body = self.parse_block();
        self.pop_scope();
        let body = body?;
        self.expect(&TokenKind::End, "`end`")?;
        Ok(Stmt::GenericFor {
            vars,
            values,
            body,
            span,
        })
    }

    fn parse_expr_stmt(&mut self, span: Span) -> Result<Stmt, ParseError> {
        let first = self.parse_suffixed_expr()?;

        if let Some(op) = compound_op(self.peek_kind()) {
            self.advance();
            check_assignable(&first)?;
            let value = self.parse_expr()?;
            return Ok(Stmt::CompoundAssign {
                op,
                target: first,
                value,
                span,
            });
        }

        if self.at(&TokenKind::Assign) || self.at(&TokenKind::Comma) {
            let mut targets = vec![first];
            while self.eat(&TokenKind::Comma) {
                targets.push(self.parse_suffixed_expr()?);
            }
            self.expect(&TokenKind::Assign, "`=`")?;
            for target in &targets {
                check_assignable(target)?;
            }
            let values = self.parse_expr_list()?;
            return Ok(Stmt::Assign {
                targets,
                values,
                span,
            });
        }

        if !matches!(first, Expr::Call { .. }) {
            return Err(ParseError::new(
                "syntax error: expression is not a statement",
                span.line,
                span.col,
            ));
        }
        Ok(Stmt::Expr(first))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_subexpr(0)
    }

    fn parse_subexpr(&mut self, limit: u8) -> Result<Expr, ParseError> {
        let span = self.span();
        let unary = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Hash => Some(UnaryOp::Len),
            _ => None,
        };

        let mut lhs = if let Some(op) = unary {
            self.advance();
            let operand = self.parse_subexpr(UNARY_PRIORITY)?;
            Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            }
        } else {
            self.parse_simple_expr()?
        };

        while let Some((op, left, right)) = binary_priority(self.peek_kind()) {
            if left <= limit {
                break;
            }
            let op_span = self.span();
            self.advance();
            let rhs = self.parse_subexpr(right)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span: op_span,
            };
        }
        Ok(lhs)
    }

    fn parse_simple_expr(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Number => {
                let tok = self.advance();
                let value = parse_number(&tok.lexeme)
                    .ok_or_else(|| ParseError::new("malformed number", span.line, span.col))?;
                Ok(Expr::Number { value, span })
            }
            TokenKind::StringLit => {
                let tok = self.advance();
                Ok(Expr::Str {
                    value: tok.lexeme,
                    span,
                })
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil { span })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool { value: true, span })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool { value: false, span })
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Expr::Varargs { span })
            }
            TokenKind::LBrace => self.parse_table(),
            TokenKind::Function => {
                self.advance();
                self.parse_function_body(span, None)
            }
            _ => self.parse_suffixed_expr(),
        }
    }

    fn name_expr(&self, name: String, span: Span) -> Expr {
        match self.lookup(&name) {
            Some(local) => Expr::Local { local, span },
            None => Expr::Global { name, span },
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Ident => {
                let name = self.advance().lexeme;
                Ok(self.name_expr(name, span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(Expr::Group {
                    inner: Box::new(inner),
                    span,
                })
            }
            _ => Err(self.error_here(format!("unexpected symbol `{}`", self.peek().lexeme))),
        }
    }

    fn parse_suffixed_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            let span = self.span();
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_ident()?;
                    expr = Expr::IndexName {
                        object: Box::new(expr),
                        member,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    expr = Expr::IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Colon => {
                    self.advance();
                    let member = self.expect_ident()?;
                    let callee = Expr::IndexName {
                        object: Box::new(expr),
                        member,
                        span: span.clone(),
                    };
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        callee: Box::new(callee),
                        args,
                        method: true,
                        span,
                    };
                }
                TokenKind::LParen | TokenKind::StringLit | TokenKind::LBrace => {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        method: false,
                        span,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::StringLit => {
                let tok = self.advance();
                Ok(vec![Expr::Str {
                    value: tok.lexeme,
                    span,
                }])
            }
            TokenKind::LBrace => Ok(vec![self.parse_table()?]),
            _ => {
                self.expect(&TokenKind::LParen, "`(`")?;
                if self.eat(&TokenKind::RParen) {
                    return Ok(Vec::new());
                }
                let args = self.parse_expr_list()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(args)
            }
        }
    }

    fn parse_table(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut items = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.eat(&TokenKind::LBracket) {
                let key = self.parse_expr()?;
                self.expect(&TokenKind::RBracket, "`]`")?;
                self.expect(&TokenKind::Assign, "`=`")?;
                items.push(TableItem::Keyed(key, self.parse_expr()?));
            } else if self.at(&TokenKind::Ident) && self.tokens[self.pos + 1].kind == TokenKind::Assign {
                let name = self.advance().lexeme;
                self.advance();
                items.push(TableItem::Named(name, self.parse_expr()?));
            } else {
                items.push(TableItem::Positional(self.parse_expr()?));
            }
            if !self.eat(&TokenKind::Comma) && !self.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Expr::Table { items, span })
    }

    /// Parses `(params) body end`; `self_name` prepends an implicit `self`.
    fn parse_function_body(&mut self, span: Span, self_name: Option<String>) -> Result<Expr, ParseError> {
        self.function_depth += 1;
        self.push_scope();
        let result = self.parse_function_inner(span, self_name);
        self.pop_scope();
        self.function_depth -= 1;
        result
    }

    fn parse_function_inner(&mut self, span: Span, self_name: Option<String>) -> Result<Expr, ParseError> {
        let mut params = Vec::new();
        if let Some(name) = self_name {
            let id = self.new_local(name, span.clone());
            self.bind(id);
            params.push(id);
        }
        let mut vararg = false;
        self.expect(&TokenKind::LParen, "`(`")?;
        if !self.at(&TokenKind::RParen) {
            loop {
                if self.eat(&TokenKind::Ellipsis) {
                    vararg = true;
                    break;
                }
                let param_span = self.span();
                let name = self.expect_ident()?;
                let id = self.new_local(name, param_span);
                self.bind(id);
                params.push(id);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        let body = self.parse_block_body()?;
        self.expect(&TokenKind::End, "`end`")?;
        Ok(Expr::Function {
            params,
            vararg,
            body,
            span,
        })
    }
}

fn check_assignable(expr: &Expr) -> Result<(), ParseError> {
    match expr {
        Expr::Local { .. } | Expr::Global { .. } | Expr::IndexName { .. } | Expr::IndexExpr { .. } => Ok(()),
        other => {
            let span = other.span();
            Err(ParseError::new("cannot assign to this expression", span.line, span.col))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_initializer_sees_outer_binding() {
        let prog = parse_program("local x = 1\nlocal x = x").unwrap();
        let Stmt::Local { vars, values, .. } = &prog.body.stmts[1] else {
            panic!("expected local");
        };
        assert_eq!(vars[0], LocalId(1));
        assert!(matches!(values[0], Expr::Local { local: LocalId(0), .. }));
    }

    #[test]
    fn test_nested_scope_shadows_without_leaking() {
        let prog = parse_program("local a = 1\ndo local a = 2 end\nprint(a)").unwrap();
        let Stmt::Expr(Expr::Call { args, .. }) = &prog.body.stmts[2] else {
            panic!("expected call");
        };
        assert!(matches!(args[0], Expr::Local { local: LocalId(0), .. }));
        assert_eq!(prog.locals.len(), 2);
    }

    #[test]
    fn test_unknown_names_are_globals() {
        let prog = parse_program("math.sqrt(4)").unwrap();
        let Stmt::Expr(Expr::Call { callee, method, .. }) = &prog.body.stmts[0] else {
            panic!("expected call");
        };
        assert!(!method);
        let Expr::IndexName { object, member, .. } = callee.as_ref() else {
            panic!("expected index name");
        };
        assert_eq!(member, "sqrt");
        assert!(matches!(object.as_ref(), Expr::Global { name, .. } if name == "math"));
    }

    #[test]
    fn test_method_call_is_flagged() {
        let prog = parse_program("local s = 'x'\ns:len()").unwrap();
        assert!(matches!(&prog.body.stmts[1], Stmt::Expr(Expr::Call { method: true, .. })));
    }

    #[test]
    fn test_precedence() {
        let prog = parse_program("x = 1 + 2 * 3 ^ 2 ^ 1").unwrap();
        let Stmt::Assign { values, .. } = &prog.body.stmts[0] else {
            panic!("expected assignment");
        };
        let Expr::Binary { op: BinOp::Add, rhs, .. } = &values[0] else {
            panic!("expected add at the root");
        };
        let Expr::Binary { op: BinOp::Mul, rhs: pow, .. } = rhs.as_ref() else {
            panic!("expected mul");
        };
        let Expr::Binary { op: BinOp::Pow, rhs: inner, .. } = pow.as_ref() else {
            panic!("expected pow");
        };
        assert!(matches!(inner.as_ref(), Expr::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn test_function_statement_targets() {
        let prog = parse_program("function g() end\nfunction t.a:b() return self end").unwrap();
        assert!(matches!(&prog.body.stmts[0], Stmt::Function { target: Expr::Global { .. }, .. }));
        let Stmt::Function { func: Expr::Function { params, .. }, .. } = &prog.body.stmts[1] else {
            panic!("expected method definition");
        };
        assert_eq!(params.len(), 1);
        assert_eq!(prog.locals[params[0].0 as usize].name, "self");
    }

    #[test]
    fn test_rejects_non_call_expression_statement() {
        assert!(parse_program("x + 1").is_err());
        assert!(parse_program("f() = 1").is_err());
    }
}
