/// Owned AST types for the Tidal language.
///
/// Identifiers are resolved while parsing: a name bound by `local`, a
/// function parameter or a loop header becomes `Expr::Local` carrying the
/// `LocalId` of that exact binding, anything else becomes `Expr::Global`.
/// A redeclaration (even with the same name) always gets a fresh `LocalId`.

/// Source location for error reporting.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// Identity of one local binding within a `Program`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

/// Declaration site of a local binding.
#[derive(Clone, Debug)]
pub struct LocalDecl {
    pub name: String,
    pub span: Span,
    /// Nesting depth of function literals at the declaration (0 = main chunk).
    pub function_depth: u32,
}

/// A complete compilation unit.
#[derive(Clone, Debug)]
pub struct Program {
    pub body: Block,
    /// Every local declared in the unit, indexed by `LocalId`.
    pub locals: Vec<LocalDecl>,
}

impl Program {
    pub fn local(&self, id: LocalId) -> Option<&LocalDecl> {
        self.locals.get(id.0 as usize)
    }
}

/// A sequence of statements with its own lexical scope.
#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    /// `local a, b = e1, e2`
    Local {
        vars: Vec<LocalId>,
        values: Vec<Expr>,
        span: Span,
    },
    /// `local function f(...) ... end`
    LocalFunction {
        var: LocalId,
        func: Expr,
        span: Span,
    },
    /// `function g(...) end` / `function a.b(...) end` / `function a:m(...) end`
    Function {
        target: Expr,
        func: Expr,
        span: Span,
    },
    /// `t1, t2 = e1, e2`
    Assign {
        targets: Vec<Expr>,
        values: Vec<Expr>,
        span: Span,
    },
    /// `t += e` and friends.
    CompoundAssign {
        op: BinOp,
        target: Expr,
        value: Expr,
        span: Span,
    },
    /// A call used as a statement.
    Expr(Expr),
    Do(Block),
    If {
        branches: Vec<(Expr, Block)>,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Block,
        span: Span,
    },
    Repeat {
        body: Block,
        condition: Expr,
        span: Span,
    },
    NumericFor {
        var: LocalId,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
        span: Span,
    },
    GenericFor {
        vars: Vec<LocalId>,
        values: Vec<Expr>,
        body: Block,
        span: Span,
    },
    Return {
        values: Vec<Expr>,
        span: Span,
    },
    Break {
        span: Span,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Len,
}

#[derive(Clone, Debug)]
pub enum TableItem {
    /// `{ e }`
    Positional(Expr),
    /// `{ name = e }`
    Named(String, Expr),
    /// `{ [k] = e }`
    Keyed(Expr, Expr),
}

#[derive(Clone, Debug)]
pub enum Expr {
    Nil {
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    Number {
        value: f64,
        span: Span,
    },
    Str {
        value: String,
        span: Span,
    },
    Varargs {
        span: Span,
    },
    Local {
        local: LocalId,
        span: Span,
    },
    Global {
        name: String,
        span: Span,
    },
    /// `object.member`
    IndexName {
        object: Box<Expr>,
        member: String,
        span: Span,
    },
    /// `object[index]`
    IndexExpr {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// `callee(args)`; for `obj:m(args)` the callee is `obj.m` and `method` is set.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        method: bool,
        span: Span,
    },
    Function {
        params: Vec<LocalId>,
        vararg: bool,
        body: Block,
        span: Span,
    },
    Table {
        items: Vec<TableItem>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// `( inner )`, which also truncates multiple results to one.
    Group {
        inner: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Nil { span }
            | Expr::Bool { span, .. }
            | Expr::Number { span, .. }
            | Expr::Str { span, .. }
            | Expr::Varargs { span }
            | Expr::Local { span, .. }
            | Expr::Global { span, .. }
            | Expr::IndexName { span, .. }
            | Expr::IndexExpr { span, .. }
            | Expr::Call { span, .. }
            | Expr::Function { span, .. }
            | Expr::Table { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Group { span, .. } => span,
        }
    }

    /// Expressions that can produce a variable number of values.
    pub fn is_multi_value(&self) -> bool {
        matches!(self, Expr::Call { .. } | Expr::Varargs { .. })
    }
}
