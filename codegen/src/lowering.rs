use std::collections::HashMap;

use bytecode::{CodeBuilder, Instruction, Label};
use syntax::Type;

use crate::labels::LabelAllocator;
use crate::runtime;
use crate::slots::{SlotAllocator, SlotKey};

/// Declared return type of every function lowered so far in the run.
#[derive(Debug, Default)]
pub struct ReturnTypeTable {
    types: HashMap<String, Type>,
}

impl ReturnTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, function: &str, ty: Type) {
        self.types.insert(function.to_string(), ty);
    }

    pub fn get(&self, function: &str) -> Option<&Type> {
        self.types.get(function)
    }
}

/// Jump targets of an enclosing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLabels {
    pub start: Label,
    pub exit: Label,
}

/// Loops being lowered, innermost last. Each loop pushes once on entry
/// and pops once on exit; `break` and `next` only look at the top.
#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopLabels>,
    pushes: usize,
    pops: usize,
}

impl LoopStack {
    pub fn push(&mut self, labels: LoopLabels) {
        log::trace!("enter loop {} .. {}", labels.start, labels.exit);
        self.frames.push(labels);
        self.pushes += 1;
    }

    pub fn pop(&mut self) -> Option<LoopLabels> {
        let labels = self.frames.pop()?;
        log::trace!("leave loop {} .. {}", labels.start, labels.exit);
        self.pops += 1;
        Some(labels)
    }

    pub fn innermost(&self) -> Option<LoopLabels> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Total `(pushes, pops)` over the stack's lifetime.
    pub fn balance(&self) -> (usize, usize) {
        (self.pushes, self.pops)
    }
}

/// State for lowering one function body.
///
/// Expression lowering lives in `expr.rs`, statement lowering in
/// `stmt.rs`; both append to the same instruction buffer.
pub struct FunctionLowering<'a> {
    pub(crate) labels: &'a mut LabelAllocator,
    pub(crate) slots: &'a mut SlotAllocator,
    pub(crate) returns: &'a ReturnTypeTable,
    pub(crate) loops: LoopStack,
    pub(crate) code: CodeBuilder,
    list_literals: usize,
    pub(crate) call_depth: usize,
}

impl<'a> FunctionLowering<'a> {
    pub fn new(
        labels: &'a mut LabelAllocator,
        slots: &'a mut SlotAllocator,
        returns: &'a ReturnTypeTable,
    ) -> Self {
        Self {
            labels,
            slots,
            returns,
            loops: LoopStack::default(),
            code: CodeBuilder::new(),
            list_literals: 0,
            call_depth: 0,
        }
    }

    pub fn code(&self) -> &CodeBuilder {
        &self.code
    }

    pub fn loops(&self) -> &LoopStack {
        &self.loops
    }

    pub fn into_code(self) -> Vec<Instruction> {
        self.code.into_code()
    }

    pub(crate) fn fresh_label(&mut self) -> Label {
        self.labels.fresh()
    }

    pub(crate) fn var_slot(&mut self, name: &str) -> u16 {
        self.slots.slot(SlotKey::var(name))
    }

    pub(crate) fn list_literal_slot(&mut self) -> u16 {
        let key = SlotKey::ListLiteral(self.list_literals);
        self.list_literals += 1;
        self.slots.slot(key)
    }

    /// A closure over `this` for the function `name`.
    pub(crate) fn new_fptr(&mut self, name: &str) {
        self.code.new_object(runtime::FPTR);
        self.code.dup();
        self.code.aload(0);
        self.code.ldc_string(name);
        self.code.invokespecial(runtime::FPTR_INIT);
    }

    /// Push a boolean computed by a conditional jump: `branch` receives the
    /// label to take when the result is `true`.
    pub(crate) fn materialize_bool(
        &mut self,
        branch: impl FnOnce(&mut CodeBuilder, Label),
    ) {
        let when_true = self.fresh_label();
        let exit = self.fresh_label();
        branch(&mut self.code, when_true);
        self.code.ldc_int(0);
        self.code.invokestatic(runtime::BOOLEAN_VALUE_OF);
        self.code.goto(exit);
        self.code.bind(when_true);
        self.code.ldc_int(1);
        self.code.invokestatic(runtime::BOOLEAN_VALUE_OF);
        self.code.bind(exit);
    }
}
