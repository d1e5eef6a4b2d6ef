//! Shorthand constructors for typed trees.
//!
//! Stands in for the front end when assembling programs by hand: the
//! helpers attach the types the checking pass would have resolved, and
//! [`ProgramBuilder`] fills in the symbol table (functions, parameters and
//! every assigned local) and the reachability set.

use crate::CheckedProgram;
use crate::ast::{
    Access, Assign, AssignOp, BinaryOp, Expr, ExprKind, FunctionDecl,
    MainDecl, Program, Stmt, StmtKind, UnaryOp, VarDecl,
};
use crate::span::Span;
use crate::symbols::{ScopeId, SymbolTable};
use crate::types::Type;

pub fn int(value: i32) -> Expr {
    Expr::new(ExprKind::Int(value), Type::Int)
}

pub fn boolean(value: bool) -> Expr {
    Expr::new(ExprKind::Bool(value), Type::Bool)
}

pub fn string(text: &str) -> Expr {
    Expr::new(ExprKind::Str(text.to_string()), Type::String)
}

/// An identifier; `ty` is the variable's type, or the function pointer type
/// when the name denotes a function.
pub fn ident(name: &str, ty: Type) -> Expr {
    Expr::new(ExprKind::Ident(name.to_string()), ty)
}

pub fn fn_ptr(name: &str, ty: Type) -> Expr {
    Expr::new(ExprKind::FnPtr(name.to_string()), ty)
}

pub fn list(element: Type, elements: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::List(elements), Type::list(element))
}

/// Call `callee` by name; `ret` is the callee's return type.
pub fn call(callee: &str, args: Vec<Expr>, ret: Type) -> Expr {
    let base = Expr::new(ExprKind::Ident(callee.to_string()), Type::Void);
    Expr::new(
        ExprKind::Access {
            base: Box::new(base),
            access: Access::Call(args),
        },
        ret,
    )
}

pub fn index(base: Expr, at: Expr) -> Expr {
    let ty = base.ty.element().cloned().unwrap_or(Type::Void);
    Expr::new(
        ExprKind::Access {
            base: Box::new(base),
            access: Access::Index(vec![at]),
        },
        ty,
    )
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let ty = if op.is_arithmetic() { Type::Int } else { Type::Bool };
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
    )
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    let ty = if op == UnaryOp::Not { Type::Bool } else { Type::Int };
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        ty,
    )
}

pub fn len(operand: Expr) -> Expr {
    Expr::new(ExprKind::Len(Box::new(operand)), Type::Int)
}

pub fn chop(operand: Expr) -> Expr {
    Expr::new(ExprKind::Chop(Box::new(operand)), Type::String)
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    compound(target, AssignOp::Assign, value)
}

pub fn compound(target: Expr, op: AssignOp, value: Expr) -> Stmt {
    Stmt::new(StmtKind::Assign(Assign {
        target,
        index: None,
        op,
        value,
    }))
}

pub fn assign_index(
    target: Expr,
    at: Expr,
    op: AssignOp,
    value: Expr,
) -> Stmt {
    Stmt::new(StmtKind::Assign(Assign {
        target,
        index: Some(at),
        op,
        value,
    }))
}

pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::If {
        cond,
        then_body,
        else_body,
        scope: None,
    })
}

pub fn loop_do(body: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Loop { body, scope: None })
}

pub fn break_() -> Stmt {
    Stmt::new(StmtKind::Break)
}

pub fn next() -> Stmt {
    Stmt::new(StmtKind::Next)
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::new(StmtKind::Return(value))
}

pub fn put(value: Expr) -> Stmt {
    Stmt::new(StmtKind::Put(value))
}

pub fn expr(value: Expr) -> Stmt {
    Stmt::new(StmtKind::Expr(value))
}

/// Assembles a [`CheckedProgram`] the way the checking pass would.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    symbols: SymbolTable,
    functions: Vec<FunctionDecl>,
    reachable: Vec<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function and mark it reachable.
    pub fn function(
        mut self,
        name: &str,
        args: &[(&str, Type)],
        ret: Type,
        body: Vec<Stmt>,
    ) -> Self {
        self.declare(name, args, ret, body);
        self.reachable.push(name.to_string());
        self
    }

    /// Add a function the reachability analysis did not retain.
    pub fn unreachable_function(
        mut self,
        name: &str,
        args: &[(&str, Type)],
        ret: Type,
        body: Vec<Stmt>,
    ) -> Self {
        self.declare(name, args, ret, body);
        self
    }

    pub fn finish(mut self, main_body: Vec<Stmt>) -> CheckedProgram {
        let scope = self.symbols.add_scope(ScopeId::GLOBAL);
        declare_locals(&mut self.symbols, scope, &main_body);
        CheckedProgram {
            program: Program {
                main: MainDecl {
                    body: main_body,
                    scope,
                    span: Span::default(),
                },
                functions: self.functions,
            },
            symbols: self.symbols,
            reachable: self.reachable,
        }
    }

    fn declare(
        &mut self,
        name: &str,
        args: &[(&str, Type)],
        ret: Type,
        body: Vec<Stmt>,
    ) {
        let scope = self.symbols.define_function(name, args, ret);
        declare_locals(&mut self.symbols, scope, &body);
        self.functions.push(FunctionDecl {
            name: name.to_string(),
            args: args
                .iter()
                .map(|(arg, ty)| VarDecl {
                    name: arg.to_string(),
                    ty: ty.clone(),
                })
                .collect(),
            body,
            span: Span::default(),
        });
    }
}

fn declare_locals(symbols: &mut SymbolTable, scope: ScopeId, body: &[Stmt]) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Assign(assign) => {
                let Some(name) = assign.target.as_ident() else {
                    continue;
                };
                let known = symbols
                    .scope(scope)
                    .is_some_and(|s| s.lookup_local(name).is_some());
                if !known {
                    let ty = assign.target.ty.clone();
                    symbols.define_variable(scope, name, ty);
                }
            }
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                declare_locals(symbols, scope, then_body);
                declare_locals(symbols, scope, else_body);
            }
            StmtKind::Loop { body, .. } => {
                declare_locals(symbols, scope, body);
            }
            _ => {}
        }
    }
}
