//! Typed syntax tree handed to code generation.
//!
//! Every [`Expr`] carries the [`Type`] the checking pass resolved for it;
//! code generation reads these annotations and never infers types itself.
//! Blocks that open a scope (`if`, `loop`, function and main bodies) carry
//! the [`ScopeId`] of their scope in the [`SymbolTable`].
//!
//! [`SymbolTable`]: crate::SymbolTable

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::symbols::ScopeId;
use crate::types::Type;

/// A whole program: the entry unit plus every declared function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub main: MainDecl,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// The entry unit's body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainDecl {
    pub body: Vec<Stmt>,
    pub scope: ScopeId,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub args: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

/// A declared name with its type (function parameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `target op= value` or `target[index] op= value`.
    Assign(Assign),

    /// `if cond ... else ... end`. Only the first condition is used.
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        #[serde(default)]
        else_body: Vec<Stmt>,
        #[serde(default)]
        scope: Option<ScopeId>,
    },

    /// `loop do ... end`: runs until a `break` leaves it.
    Loop {
        body: Vec<Stmt>,
        #[serde(default)]
        scope: Option<ScopeId>,
    },

    Break,

    /// Jump back to the start of the innermost loop.
    Next,

    Return(Option<Expr>),

    /// `puts expr`: print a value followed by a newline.
    Put(Expr),

    /// An expression evaluated for its side effects.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    /// The assigned identifier, typed with the variable's type.
    pub target: Expr,
    /// Element index when assigning into a list.
    #[serde(default)]
    pub index: Option<Expr>,
    pub op: AssignOp,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
}

impl AssignOp {
    /// Binary operator a compound assignment desugars to.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
        }
    }
}

/// An expression node with its resolved type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self {
            kind,
            ty,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The name, if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Int(i32),
    Bool(bool),
    /// String literal, without quotes.
    Str(String),

    /// A variable, or a function named without calling it.
    Ident(String),

    /// `&name`: explicit function pointer literal.
    FnPtr(String),

    /// `[a, b, c]`.
    List(Vec<Expr>),

    /// `base(args)` or `base[index]`.
    Access { base: Box<Expr>, access: Access },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `len(expr)` on a string or list.
    Len(Box<Expr>),

    /// `chop(expr)`: the string without its last character.
    Chop(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Access {
    Call(Vec<Expr>),
    Index(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `++x`
    Inc,
    /// `--x`
    Dec,
}
