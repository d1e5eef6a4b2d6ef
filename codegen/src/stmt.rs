use syntax::{
    Access, Assign, AssignOp, Expr, ExprKind, Scope, ScopeId, Stmt, StmtKind,
    Type,
};

use crate::error::{CodegenError, Result};
use crate::lowering::{FunctionLowering, LoopLabels};
use crate::runtime;

impl FunctionLowering<'_> {
    pub fn lower_block(
        &mut self,
        body: &[Stmt],
        scope: Scope<'_>,
    ) -> Result<()> {
        for stmt in body {
            self.lower_stmt(stmt, scope)?;
        }
        Ok(())
    }

    /// Lower one statement. Apart from `return`, the emitted code leaves
    /// the operand stack as it found it.
    pub fn lower_stmt(&mut self, stmt: &Stmt, scope: Scope<'_>) -> Result<()> {
        match &stmt.kind {
            StmtKind::Assign(assign) => self.lower_assign(assign, scope)?,
            StmtKind::If {
                cond,
                then_body,
                else_body,
                scope: block,
            } => {
                let inner = enter(scope, *block);
                expect_bool(cond)?;
                self.lower_value(cond, scope)?;
                runtime::unbox(&mut self.code, &Type::Bool);

                let else_label = self.fresh_label();
                let exit = self.fresh_label();
                self.code.if_false(else_label);
                self.lower_block(then_body, inner)?;
                if !self.code.ends_with_return() {
                    self.code.goto(exit);
                }
                self.code.bind(else_label);
                self.lower_block(else_body, inner)?;
                self.code.bind(exit);
            }
            StmtKind::Loop { body, scope: block } => {
                let inner = enter(scope, *block);
                let labels = LoopLabels {
                    start: self.fresh_label(),
                    exit: self.fresh_label(),
                };
                self.loops.push(labels);
                self.code.bind(labels.start);
                let lowered = self.lower_block(body, inner);
                self.loops.pop();
                lowered?;
                self.code.goto(labels.start);
                self.code.bind(labels.exit);
            }
            StmtKind::Break => {
                let labels = self.innermost_loop(stmt, "break")?;
                self.code.goto(labels.exit);
            }
            StmtKind::Next => {
                let labels = self.innermost_loop(stmt, "next")?;
                self.code.goto(labels.start);
            }
            StmtKind::Return(None) => self.code.return_void(),
            StmtKind::Return(Some(value)) => {
                self.lower_value(value, scope)?;
                self.code.return_value();
            }
            StmtKind::Put(value) => self.lower_put(value, scope)?,
            StmtKind::Expr(value) => {
                let leaves_value = self.produces_value(value, scope);
                self.lower_expr(value, scope)?;
                if leaves_value {
                    self.code.pop();
                }
            }
        }
        Ok(())
    }

    fn innermost_loop(&self, stmt: &Stmt, what: &str) -> Result<LoopLabels> {
        self.loops.innermost().ok_or_else(|| {
            CodegenError::shape(format!("{what} outside a loop"), stmt.span)
        })
    }

    fn lower_assign(
        &mut self,
        assign: &Assign,
        scope: Scope<'_>,
    ) -> Result<()> {
        let Some(name) = assign.target.as_ident() else {
            return Err(CodegenError::shape(
                "assignment target must be a variable",
                assign.target.span,
            ));
        };
        let slot = self.var_slot(name);

        let Some(at) = &assign.index else {
            let value = desugar(assign.op, &assign.target, &assign.value);
            self.lower_value(&value, scope)?;
            self.code.astore(slot);
            return Ok(());
        };

        let Some(element) = assign.target.ty.element() else {
            return Err(CodegenError::shape(
                format!("indexed assignment into a {} value", assign.target.ty),
                assign.target.span,
            ));
        };
        if at.ty != Type::Int {
            return Err(CodegenError::shape(
                format!("list index expects int, found {}", at.ty),
                at.span,
            ));
        }
        self.code.aload(slot);
        self.code.checkcast(runtime::LIST);
        self.lower_value(at, scope)?;
        runtime::unbox(&mut self.code, &Type::Int);
        let current = Expr::new(
            ExprKind::Access {
                base: Box::new(assign.target.clone()),
                access: Access::Index(vec![at.clone()]),
            },
            element.clone(),
        )
        .with_span(assign.target.span);
        let value = desugar(assign.op, &current, &assign.value);
        self.lower_value(&value, scope)?;
        self.code.invokevirtual(runtime::LIST_SET);
        Ok(())
    }

    fn lower_put(&mut self, value: &Expr, scope: Scope<'_>) -> Result<()> {
        self.code.getstatic(runtime::SYSTEM_OUT);
        self.lower_value(value, scope)?;
        let println = match &value.ty {
            Type::Int => runtime::PRINTLN_INT,
            Type::Bool => runtime::PRINTLN_BOOL,
            Type::String => runtime::PRINTLN_STRING,
            Type::List(_) | Type::Fptr(_) => runtime::PRINTLN_OBJECT,
            Type::Void => {
                return Err(CodegenError::shape(
                    "printing a value of type void",
                    value.span,
                ));
            }
        };
        runtime::downcast(&mut self.code, &value.ty);
        runtime::unbox(&mut self.code, &value.ty);
        self.code.invokevirtual(println);
        Ok(())
    }
}

/// `target op= value` as the plain value to store.
fn desugar(op: AssignOp, target: &Expr, value: &Expr) -> Expr {
    let Some(op) = op.binary() else {
        return value.clone();
    };
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(target.clone()),
            rhs: Box::new(value.clone()),
        },
        Type::Int,
    )
    .with_span(value.span)
}

/// Scope of a nested block; a block the table does not know falls back to
/// the enclosing scope.
fn enter<'s>(scope: Scope<'s>, block: Option<ScopeId>) -> Scope<'s> {
    match block {
        Some(id) => scope.enter(id).unwrap_or_else(|| {
            log::debug!("scope {id:?} missing, using the enclosing one");
            scope
        }),
        None => scope,
    }
}

fn expect_bool(cond: &Expr) -> Result<()> {
    if cond.ty == Type::Bool {
        Ok(())
    } else {
        Err(CodegenError::shape(
            format!("condition must be bool, found {}", cond.ty),
            cond.span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use bytecode::stack::analyze;
    use bytecode::{ClassFile, Instruction, Label};
    use syntax::builder::*;
    use syntax::{BinaryOp, SymbolTable, UnaryOp};
    use vm::{VM, Value};

    use super::*;
    use crate::labels::LabelAllocator;
    use crate::lowering::ReturnTypeTable;
    use crate::slots::SlotAllocator;

    struct Lowered {
        code: Vec<Instruction>,
        balance: (usize, usize),
        labels: u32,
    }

    fn lower(body: &[Stmt], table: &SymbolTable) -> Result<Lowered> {
        let mut labels = LabelAllocator::new();
        let mut slots = SlotAllocator::new();
        let returns = ReturnTypeTable::new();
        let mut lowering =
            FunctionLowering::new(&mut labels, &mut slots, &returns);
        lowering.lower_block(body, table.global())?;
        let balance = lowering.loops().balance();
        let code = lowering.into_code();
        Ok(Lowered {
            code,
            balance,
            labels: labels.issued(),
        })
    }

    fn run(code: &[Instruction]) -> (Vec<String>, Vec<Value>) {
        let class = ClassFile::new("Main", "java/lang/Object");
        let mut vm = VM::new(&class);
        let this = vm.instance();
        let outcome = vm.run_code(code, vec![this]).unwrap();
        assert!(outcome.stack.is_empty(), "{:?}", outcome.stack);
        (vm.into_output(), outcome.locals)
    }

    fn x() -> Expr {
        ident("x", Type::Int)
    }

    #[test]
    fn compound_assignment_desugars() {
        let body = [
            assign(x(), int(10)),
            compound(x(), AssignOp::Sub, int(3)),
            compound(x(), AssignOp::Mul, int(2)),
            compound(x(), AssignOp::Mod, int(5)),
            put(x()),
        ];
        let lowered = lower(&body, &SymbolTable::new()).unwrap();
        let (output, locals) = run(&lowered.code);
        assert_eq!(output, ["4"]);
        assert_eq!(locals[1], Value::Integer(4));
    }

    #[test]
    fn indexed_assignment() {
        let xs = || ident("xs", Type::list(Type::Int));
        let body = [
            assign(xs(), list(Type::Int, vec![int(1), int(2)])),
            assign_index(xs(), int(1), AssignOp::Assign, int(7)),
            assign_index(xs(), int(0), AssignOp::Add, int(40)),
            put(index(xs(), int(0))),
            put(xs()),
        ];
        let lowered = lower(&body, &SymbolTable::new()).unwrap();
        let set = Instruction::Invokevirtual(runtime::LIST_SET);
        assert!(lowered.code.contains(&set));
        let (output, _) = run(&lowered.code);
        assert_eq!(output, ["41", "[41, 7]"]);
    }

    #[test]
    fn if_else_takes_one_branch() {
        let branch = |cond| {
            vec![if_else(
                cond,
                vec![put(string("then"))],
                vec![put(string("else"))],
            )]
        };
        let table = SymbolTable::new();
        let taken = lower(&branch(boolean(true)), &table).unwrap();
        assert_eq!(run(&taken.code).0, ["then"]);
        let skipped = lower(&branch(boolean(false)), &table).unwrap();
        assert_eq!(run(&skipped.code).0, ["else"]);
        // two for the if, none for the literal condition
        assert_eq!(taken.labels, 2);
    }

    #[test]
    fn then_branch_ending_in_return_skips_the_jump() {
        let body = [if_else(
            boolean(true),
            vec![ret(Some(int(1)))],
            vec![ret(Some(int(0)))],
        )];
        let code = lower(&body, &SymbolTable::new()).unwrap().code;
        let gotos = code
            .iter()
            .filter(|i| matches!(i, Instruction::Goto(_)))
            .count();
        assert_eq!(gotos, 0);

        let body = [if_else(boolean(true), vec![put(int(1))], vec![])];
        let code = lower(&body, &SymbolTable::new()).unwrap().code;
        assert!(code.contains(&Instruction::Goto(Label::new(1))));
    }

    #[test]
    fn loop_with_break_counts_to_three() {
        let body = [
            assign(x(), int(0)),
            loop_do(vec![
                assign(x(), binary(BinaryOp::Add, x(), int(1))),
                if_else(
                    binary(BinaryOp::Eq, x(), int(3)),
                    vec![break_()],
                    vec![],
                ),
            ]),
        ];
        let lowered = lower(&body, &SymbolTable::new()).unwrap();
        assert_eq!(lowered.balance, (1, 1));
        let (_, locals) = run(&lowered.code);
        assert_eq!(locals[1], Value::Integer(3));
    }

    #[test]
    fn break_and_next_bind_to_innermost_loop() {
        let body = [loop_do(vec![
            loop_do(vec![break_(), next()]),
            next(),
            break_(),
        ])];
        let lowered = lower(&body, &SymbolTable::new()).unwrap();
        assert_eq!(lowered.balance, (2, 2));
        let (outer_start, outer_exit) = (Label::new(0), Label::new(1));
        let (inner_start, inner_exit) = (Label::new(2), Label::new(3));
        let jumps: Vec<_> = lowered
            .code
            .iter()
            .filter_map(|i| match i {
                Instruction::Goto(target) => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(
            jumps,
            vec![
                inner_exit,
                inner_start,
                inner_start,
                outer_start,
                outer_exit,
                outer_start,
            ]
        );
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let err = lower(&[break_()], &SymbolTable::new()).err();
        assert!(matches!(err, Some(CodegenError::Shape { .. })));
        let err = lower(&[next()], &SymbolTable::new()).err();
        assert!(matches!(err, Some(CodegenError::Shape { .. })));
    }

    #[test]
    fn statements_are_stack_neutral() {
        let body = [
            assign(x(), int(1)),
            expr(unary(UnaryOp::Inc, x())),
            expr(binary(BinaryOp::Gt, x(), int(0))),
            put(binary(BinaryOp::Ne, x(), int(2))),
            put(string("s")),
            put(list(Type::Bool, vec![boolean(true)])),
            loop_do(vec![
                compound(x(), AssignOp::Add, int(1)),
                if_else(
                    binary(BinaryOp::Ge, x(), int(5)),
                    vec![break_()],
                    vec![next()],
                ),
            ]),
        ];
        let lowered = lower(&body, &SymbolTable::new()).unwrap();
        let profile = analyze(&lowered.code).unwrap();
        assert_eq!(profile.exit_depth, Some(0));
        let (output, locals) = run(&lowered.code);
        assert_eq!(output, ["false", "s", "[true]"]);
        assert_eq!(locals[1], Value::Integer(5));
    }

    #[test]
    fn print_uses_the_typed_overload() {
        let code = lower(&[put(boolean(false))], &SymbolTable::new())
            .unwrap()
            .code;
        assert_eq!(
            &code[code.len() - 3..],
            &[
                Instruction::Checkcast {
                    class: runtime::BOOLEAN.into()
                },
                Instruction::Invokevirtual(runtime::BOOLEAN_VALUE),
                Instruction::Invokevirtual(runtime::PRINTLN_BOOL),
            ]
        );
    }

    #[test]
    fn non_bool_condition_is_rejected() {
        let body = [if_else(int(1), vec![], vec![])];
        let err = lower(&body, &SymbolTable::new()).err();
        assert!(matches!(err, Some(CodegenError::Shape { .. })));
    }
}
