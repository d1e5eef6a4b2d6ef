use bytecode::{Cond, Instruction};
use syntax::{Access, BinaryOp, Binding, Expr, ExprKind, Scope, Type, UnaryOp};

use crate::error::{CodegenError, Result};
use crate::lowering::FunctionLowering;
use crate::runtime;
use crate::slots::SlotKey;

impl FunctionLowering<'_> {
    /// Lower `expr`, leaving its boxed value on the stack. A call to a void
    /// function leaves nothing.
    pub fn lower_expr(&mut self, expr: &Expr, scope: Scope<'_>) -> Result<()> {
        match &expr.kind {
            ExprKind::Int(value) => {
                self.code.ldc_int(*value);
                runtime::box_raw(&mut self.code, &Type::Int);
            }
            ExprKind::Bool(value) => {
                self.code.ldc_int(*value as i32);
                runtime::box_raw(&mut self.code, &Type::Bool);
            }
            ExprKind::Str(text) => self.code.ldc_string(text.as_str()),
            ExprKind::Ident(name) => self.lower_ident(name, &expr.ty, scope),
            ExprKind::FnPtr(name) => self.new_fptr(name),
            ExprKind::List(elements) => {
                let backing = self.list_literal_slot();
                self.build_array(backing, elements, scope)?;
                self.code.new_object(runtime::LIST);
                self.code.dup();
                self.code.aload(backing);
                self.code.invokespecial(runtime::LIST_INIT);
            }
            ExprKind::Access {
                base,
                access: Access::Call(args),
            } => self.lower_call(expr, base, args, scope)?,
            ExprKind::Access {
                base,
                access: Access::Index(indices),
            } => self.lower_index(base, indices, scope)?,
            ExprKind::Binary { op, lhs, rhs } => {
                self.lower_binary(expr, *op, lhs, rhs, scope)?
            }
            ExprKind::Unary { op, operand } => {
                self.lower_unary(*op, operand, scope)?
            }
            ExprKind::Len(operand) => {
                self.lower_value(operand, scope)?;
                match &operand.ty {
                    Type::String => {
                        self.code.invokevirtual(runtime::STRING_LENGTH)
                    }
                    Type::List(_) => {
                        self.code.invokevirtual(runtime::LIST_SIZE)
                    }
                    other => {
                        return Err(CodegenError::shape(
                            format!("len of a {other} value"),
                            operand.span,
                        ));
                    }
                }
                runtime::box_raw(&mut self.code, &Type::Int);
            }
            ExprKind::Chop(operand) => {
                expect(operand, &Type::String, "chop")?;
                self.lower_value(operand, scope)?;
                self.code.dup();
                self.code.invokevirtual(runtime::STRING_LENGTH);
                self.code.ldc_int(1);
                self.code.emit(Instruction::Isub);
                self.code.iconst_0();
                self.code.swap();
                self.code.invokevirtual(runtime::STRING_SUBSTRING);
            }
        }
        Ok(())
    }

    /// Like [`lower_expr`](Self::lower_expr), but the expression must
    /// produce a value.
    pub fn lower_value(&mut self, expr: &Expr, scope: Scope<'_>) -> Result<()> {
        if !self.produces_value(expr, scope) {
            return Err(CodegenError::shape(
                "a call to a void function used as a value",
                expr.span,
            ));
        }
        self.lower_expr(expr, scope)
    }

    /// Whether lowering `expr` leaves a value on the stack.
    pub fn produces_value(&self, expr: &Expr, scope: Scope<'_>) -> bool {
        match &expr.kind {
            ExprKind::Access {
                base,
                access: Access::Call(_),
            } => base.as_ident().is_none_or(|callee| {
                !self.call_type(callee, expr, scope).is_void()
            }),
            _ => true,
        }
    }

    /// Result type of calling `callee`: the recorded return type of a
    /// known function, else the call's annotation.
    fn call_type(&self, callee: &str, call: &Expr, scope: Scope<'_>) -> Type {
        let recorded = match scope.lookup(callee) {
            Some(Binding::Function(_)) => self.returns.get(callee),
            _ => None,
        };
        recorded.unwrap_or(&call.ty).clone()
    }

    fn lower_ident(&mut self, name: &str, annotated: &Type, scope: Scope<'_>) {
        match scope.lookup(name) {
            Some(Binding::Function(_)) => self.new_fptr(name),
            Some(Binding::Variable(var)) => self.load_var(name, &var.ty),
            None => {
                log::debug!("`{name}` is not in scope, loading it as {annotated}");
                self.load_var(name, annotated);
            }
        }
    }

    fn load_var(&mut self, name: &str, ty: &Type) {
        let slot = self.var_slot(name);
        self.code.aload(slot);
        runtime::downcast(&mut self.code, ty);
    }

    /// Fill a fresh `ArrayList` stored in `slot` with `elements`. Nested
    /// lists are copied into a new wrapper before being added.
    fn build_array(
        &mut self,
        slot: u16,
        elements: &[Expr],
        scope: Scope<'_>,
    ) -> Result<()> {
        self.code.new_object(runtime::ARRAY_LIST);
        self.code.dup();
        self.code.invokespecial(runtime::ARRAY_LIST_INIT);
        self.code.astore(slot);
        for element in elements {
            self.code.aload(slot);
            let nested = matches!(element.ty, Type::List(_));
            if nested {
                self.code.new_object(runtime::LIST);
                self.code.dup();
            }
            self.lower_value(element, scope)?;
            if nested {
                self.code.invokespecial(runtime::LIST_COPY);
            }
            self.code.invokevirtual(runtime::ARRAY_LIST_ADD);
            self.code.pop();
        }
        Ok(())
    }

    fn lower_call(
        &mut self,
        call: &Expr,
        base: &Expr,
        args: &[Expr],
        scope: Scope<'_>,
    ) -> Result<()> {
        let Some(callee) = base.as_ident() else {
            return Err(CodegenError::shape(
                "call target must be a name",
                base.span,
            ));
        };
        match scope.lookup(callee) {
            Some(Binding::Function(_)) => self.new_fptr(callee),
            _ => {
                let slot = self.var_slot(callee);
                self.code.aload(slot);
                self.code.checkcast(runtime::FPTR);
            }
        }

        let key = SlotKey::CallArgs(callee.to_string(), self.call_depth);
        let packed = self.slots.slot(key);
        self.call_depth += 1;
        let built = self.build_array(packed, args, scope);
        self.call_depth -= 1;
        built?;

        self.code.aload(packed);
        self.code.invokevirtual(runtime::FPTR_INVOKE);
        let ret = self.call_type(callee, call, scope);
        if ret.is_void() {
            self.code.pop();
        } else {
            runtime::downcast(&mut self.code, &ret);
        }
        Ok(())
    }

    fn lower_index(
        &mut self,
        base: &Expr,
        indices: &[Expr],
        scope: Scope<'_>,
    ) -> Result<()> {
        let [index] = indices else {
            return Err(CodegenError::shape(
                format!("list access takes one index, found {}", indices.len()),
                base.span,
            ));
        };
        let Some(element) = base.ty.element() else {
            return Err(CodegenError::shape(
                format!("indexing a {} value", base.ty),
                base.span,
            ));
        };
        expect(index, &Type::Int, "list index")?;
        self.lower_value(base, scope)?;
        self.lower_value(index, scope)?;
        runtime::unbox(&mut self.code, &Type::Int);
        self.code.invokevirtual(runtime::LIST_GET);
        if !matches!(element, Type::List(_)) {
            runtime::downcast(&mut self.code, element);
        }
        Ok(())
    }

    fn lower_operand(&mut self, operand: &Expr, scope: Scope<'_>) -> Result<()> {
        self.lower_value(operand, scope)?;
        runtime::unbox(&mut self.code, &operand.ty);
        Ok(())
    }

    fn lower_binary(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        scope: Scope<'_>,
    ) -> Result<()> {
        let Some(cond) = comparison(op) else {
            expect(lhs, &Type::Int, "arithmetic")?;
            expect(rhs, &Type::Int, "arithmetic")?;
            self.lower_operand(lhs, scope)?;
            self.lower_operand(rhs, scope)?;
            self.code.emit(match op {
                BinaryOp::Add => Instruction::Iadd,
                BinaryOp::Sub => Instruction::Isub,
                BinaryOp::Mul => Instruction::Imul,
                BinaryOp::Div => Instruction::Idiv,
                _ => Instruction::Irem,
            });
            runtime::box_raw(&mut self.code, &Type::Int);
            return Ok(());
        };

        let equal = op == BinaryOp::Eq;
        match (&lhs.ty, &rhs.ty) {
            (Type::Int, Type::Int) => {}
            (Type::Bool, Type::Bool) if op.is_equality() => {}
            (Type::String, Type::String) if op.is_equality() => {
                self.lower_value(lhs, scope)?;
                self.lower_value(rhs, scope)?;
                self.code.invokevirtual(runtime::STRING_EQUALS);
                self.materialize_bool(|code, when_true| {
                    if equal {
                        code.if_true(when_true)
                    } else {
                        code.if_false(when_true)
                    }
                });
                return Ok(());
            }
            (
                Type::List(_) | Type::Fptr(_),
                Type::List(_) | Type::Fptr(_),
            ) if op.is_equality() => {
                self.lower_value(lhs, scope)?;
                self.lower_value(rhs, scope)?;
                self.materialize_bool(|code, when_true| {
                    code.if_acmp(equal, when_true)
                });
                return Ok(());
            }
            (l, r) => {
                return Err(CodegenError::shape(
                    format!("cannot compare {l} with {r} using {op:?}"),
                    expr.span,
                ));
            }
        }

        self.lower_operand(lhs, scope)?;
        self.lower_operand(rhs, scope)?;
        self.materialize_bool(|code, when_true| code.if_icmp(cond, when_true));
        Ok(())
    }

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        scope: Scope<'_>,
    ) -> Result<()> {
        match op {
            UnaryOp::Neg => {
                expect(operand, &Type::Int, "negation")?;
                self.lower_operand(operand, scope)?;
                self.code.emit(Instruction::Ineg);
                runtime::box_raw(&mut self.code, &Type::Int);
            }
            UnaryOp::Not => {
                expect(operand, &Type::Bool, "logical not")?;
                self.lower_operand(operand, scope)?;
                self.code.ldc_int(1);
                self.code.emit(Instruction::Ixor);
                runtime::box_raw(&mut self.code, &Type::Bool);
            }
            UnaryOp::Inc | UnaryOp::Dec => {
                let Some(name) = operand.as_ident() else {
                    return Err(CodegenError::shape(
                        format!("{op:?} needs a variable operand"),
                        operand.span,
                    ));
                };
                expect(operand, &Type::Int, "increment")?;
                self.lower_operand(operand, scope)?;
                self.code.ldc_int(1);
                self.code.emit(if op == UnaryOp::Inc {
                    Instruction::Iadd
                } else {
                    Instruction::Isub
                });
                runtime::box_raw(&mut self.code, &Type::Int);
                self.code.dup();
                let slot = self.var_slot(name);
                self.code.astore(slot);
            }
        }
        Ok(())
    }
}

/// Branch condition of a comparison operator; `None` for arithmetic.
fn comparison(op: BinaryOp) -> Option<Cond> {
    match op {
        BinaryOp::Eq => Some(Cond::Eq),
        BinaryOp::Ne => Some(Cond::Ne),
        BinaryOp::Gt => Some(Cond::Gt),
        BinaryOp::Ge => Some(Cond::Ge),
        BinaryOp::Lt => Some(Cond::Lt),
        BinaryOp::Le => Some(Cond::Le),
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod => None,
    }
}

fn expect(expr: &Expr, ty: &Type, what: &str) -> Result<()> {
    if expr.ty == *ty {
        Ok(())
    } else {
        Err(CodegenError::shape(
            format!("{what} expects {ty}, found {}", expr.ty),
            expr.span,
        ))
    }
}
