use golite_common::Span;
use serde::{Deserialize, Serialize};

/// Identity of an expression node, unique within one `Program`.
///
/// Assigned by the producer of the tree (the external parser, or
/// [`super::Builder`]); the type checker keys its annotation map on it.
pub type NodeId = u32;

// ============================================================================
// Program (top-level)
// ============================================================================

/// A complete GoLite program, as handed over by the external parser.
///
/// The analyzer only reads this tree; it never rewrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<TopDecl>,
    pub span: Span,
}

/// A top-level declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TopDecl {
    Var(VarDecl),
    Type(TypeDecl),
    Func(FuncDecl),
}

// ============================================================================
// Identifiers
// ============================================================================

/// An identifier token. The blank identifier `_` is an ordinary `Ident`
/// whose special meaning is enforced by the weeder and resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// `var` declaration, possibly grouping several specifications:
///
/// ```golite
/// var (
///     x, y int = 1, 2
///     s string
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub specs: Vec<VarSpec>,
    pub span: Span,
}

/// One variable specification: names, an optional declared type, and the
/// initializing expressions (possibly none for a type-only declaration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarSpec {
    pub names: Vec<Ident>,
    pub declared: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// `type` declaration, possibly grouping several specifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub specs: Vec<TypeSpec>,
    pub span: Span,
}

/// One type alias specification: `type Name TypeExpr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A function declaration.
///
/// ```golite
/// func name(a, b int, s string) float64 { body }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    pub params: Vec<ParamGroup>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A grouped parameter list: `a, b int` declares two parameters of the
/// group's type, in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGroup {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

// ============================================================================
// Type expressions
// ============================================================================

/// A type expression in the source: the syntactic form, resolved to a
/// semantic `Type` by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeExprKind {
    Bool,
    Int,
    Float64,
    Rune,
    String,

    /// Reference to a declared type alias: `T`.
    Named(String),

    /// `[bound]elem`; the bound must be an integer literal (weeded).
    Array {
        bound: Box<Expr>,
        elem: Box<TypeExpr>,
    },

    /// `[]elem`
    Slice(Box<TypeExpr>),

    /// `struct { fields }`
    Struct(Vec<FieldSpec>),
}

/// One field specification inside a struct type: `a, b int`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn bool(span: Span) -> Self {
        Self::new(TypeExprKind::Bool, span)
    }

    pub fn int(span: Span) -> Self {
        Self::new(TypeExprKind::Int, span)
    }

    pub fn float64(span: Span) -> Self {
        Self::new(TypeExprKind::Float64, span)
    }

    pub fn rune(span: Span) -> Self {
        Self::new(TypeExprKind::Rune, span)
    }

    pub fn string(span: Span) -> Self {
        Self::new(TypeExprKind::String, span)
    }

    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self::new(TypeExprKind::Named(name.into()), span)
    }

    pub fn array(bound: Expr, elem: TypeExpr, span: Span) -> Self {
        Self::new(
            TypeExprKind::Array {
                bound: Box::new(bound),
                elem: Box::new(elem),
            },
            span,
        )
    }

    pub fn slice(elem: TypeExpr, span: Span) -> Self {
        Self::new(TypeExprKind::Slice(Box::new(elem)), span)
    }

    pub fn struct_(fields: Vec<FieldSpec>, span: Span) -> Self {
        Self::new(TypeExprKind::Struct(fields), span)
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Empty(Span),

    /// An expression evaluated for effect; must be a function call (weeded).
    Expr(Expr),

    /// Short declaration: `a, b := 1, 2`.
    ShortDecl {
        targets: Vec<Ident>,
        values: Vec<Expr>,
        span: Span,
    },

    Var(VarDecl),
    Type(TypeDecl),

    /// Multi-assignment: `a, s.f = 1, 2`.
    Assign {
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
        span: Span,
    },

    /// `x++` / `x--`.
    IncDec {
        target: Expr,
        is_decrement: bool,
        span: Span,
    },

    /// `print(...)` / `println(...)`.
    Print {
        args: Vec<Expr>,
        newline: bool,
        span: Span,
    },

    Return {
        value: Option<Expr>,
        span: Span,
    },

    Block {
        stmts: Vec<Stmt>,
        span: Span,
    },

    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
        span: Span,
    },

    Switch {
        init: Option<Box<Stmt>>,
        subject: Option<Expr>,
        cases: Vec<CaseClause>,
        span: Span,
    },

    /// Three-part `for`; `while`-style and infinite loops leave parts unset.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
        span: Span,
    },

    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Empty(span) | Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Expr(e) => e.span,
            Stmt::ShortDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::IncDec { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Switch { span, .. }
            | Stmt::For { span, .. } => *span,
            Stmt::Var(d) => d.span,
            Stmt::Type(d) => d.span,
        }
    }
}

/// One case of a switch statement. `guards` is `None` for the default case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseClause {
    pub guards: Option<Vec<Expr>>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl CaseClause {
    pub fn is_default(&self) -> bool {
        self.guards.is_none()
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Self { id, kind, span }
    }

    /// Whether this expression denotes a mutable place: an identifier, a
    /// field access, or an index access.
    pub fn is_place(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. }
        )
    }
}

/// All expression variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal (decimal, octal, or hexadecimal; the parser decodes
    /// the base).
    IntLit(i64),
    FloatLit(f64),
    RuneLit(char),
    /// Interpreted or raw string literal, already unescaped.
    StringLit(String),

    Ident(String),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// `f(a, b)`. A call whose callee names a type alias is a conversion.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Cast to a syntactic type: `int(x)`, `float64(n)`.
    Cast {
        target: TypeExpr,
        operand: Box<Expr>,
    },

    /// `append(s, v)`
    Append {
        slice: Box<Expr>,
        value: Box<Expr>,
    },

    /// `obj.field`
    Field {
        object: Box<Expr>,
        field: String,
    },

    /// `obj[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    BitComp,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitComp => "^",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitClear,
    Shl,
    Shr,
    // Comparison
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitClear => "&^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}
