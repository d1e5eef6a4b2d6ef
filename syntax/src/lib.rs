pub mod ast;
pub mod builder;
pub mod span;
pub mod symbols;
pub mod types;

pub use ast::{
    Access, Assign, AssignOp, BinaryOp, Expr, ExprKind, FunctionDecl,
    MainDecl, Program, Stmt, StmtKind, UnaryOp, VarDecl,
};
pub use span::{Pos, Span};
pub use symbols::{
    Binding, FunctionBinding, Scope, ScopeError, ScopeId, SymbolTable,
    VariableBinding,
};
pub use types::{Signature, Type};

use serde::{Deserialize, Serialize};

/// Everything code generation needs from the front end: the typed tree,
/// its symbol table and the names of the functions to emit, in emission
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedProgram {
    pub program: Program,
    pub symbols: SymbolTable,
    pub reachable: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    fn sample() -> CheckedProgram {
        let x = || ident("x", Type::Int);
        ProgramBuilder::new()
            .function(
                "inc",
                &[("x", Type::Int)],
                Type::Int,
                vec![ret(Some(binary(BinaryOp::Add, x(), int(1))))],
            )
            .unreachable_function("dead", &[], Type::Void, vec![])
            .finish(vec![
                assign(ident("y", Type::Int), call("inc", vec![int(4)], Type::Int)),
                put(ident("y", Type::Int)),
            ])
    }

    #[test]
    fn builder_fills_symbols_and_reachability() {
        let checked = sample();
        assert_eq!(checked.reachable, vec!["inc".to_string()]);
        assert_eq!(checked.program.functions.len(), 2);

        let main = checked.symbols.scope(checked.program.main.scope).unwrap();
        assert_eq!(main.variable("y").unwrap().ty, Type::Int);
        let inc = main.function("inc").unwrap();
        assert_eq!(inc.arg_types, vec![Type::Int]);
        assert!(main.function("dead").is_some());
    }

    #[test]
    fn index_takes_element_type() {
        let xs = ident("xs", Type::list(Type::list(Type::Bool)));
        assert_eq!(index(xs, int(0)).ty, Type::list(Type::Bool));
    }

    #[test]
    fn checked_program_survives_json() {
        let checked = sample();
        let json = serde_json::to_string_pretty(&checked).unwrap();
        let back: CheckedProgram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checked);
    }

    #[test]
    fn spans_are_optional_in_json() {
        let json = r#"{ "kind": { "Int": 3 }, "ty": "Int" }"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(expr, int(3));
        assert!(!expr.span.is_known());
    }
}
