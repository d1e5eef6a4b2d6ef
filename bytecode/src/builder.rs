use std::borrow::Cow;

use crate::instruction::{
    Constant, Cond, FieldRef, Instruction, Label, MethodRef,
};

/// Builds a flat instruction sequence.
///
/// Thin typed layer over `Vec<Instruction>`; every emit helper appends
/// exactly one instruction. Sequences built separately can be spliced
/// together with [`append`](Self::append).
#[derive(Debug, Default, Clone)]
pub struct CodeBuilder {
    code: Vec<Instruction>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.code
    }

    pub fn into_code(self) -> Vec<Instruction> {
        self.code
    }

    /// Last emitted instruction, label definitions included.
    pub fn last(&self) -> Option<&Instruction> {
        self.code.last()
    }

    /// Whether the sequence currently ends in `return` or `areturn`.
    pub fn ends_with_return(&self) -> bool {
        self.last().is_some_and(Instruction::is_return)
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub fn append(&mut self, code: impl IntoIterator<Item = Instruction>) {
        self.code.extend(code);
    }

    // ── locals ─────────────────────────────────────────────────────

    /// `aload <slot>`: push a local reference.
    pub fn aload(&mut self, slot: u16) {
        self.emit(Instruction::Aload { slot });
    }

    /// `astore <slot>`: pop into a local slot.
    pub fn astore(&mut self, slot: u16) {
        self.emit(Instruction::Astore { slot });
    }

    // ── constants ──────────────────────────────────────────────────

    pub fn ldc_int(&mut self, value: i32) {
        self.emit(Instruction::Ldc(Constant::Int(value)));
    }

    pub fn ldc_string(&mut self, text: impl Into<String>) {
        self.emit(Instruction::Ldc(Constant::String(text.into())));
    }

    pub fn iconst_0(&mut self) {
        self.emit(Instruction::Iconst0);
    }

    // ── objects ────────────────────────────────────────────────────

    pub fn new_object(&mut self, class: impl Into<Cow<'static, str>>) {
        self.emit(Instruction::New {
            class: class.into(),
        });
    }

    pub fn checkcast(&mut self, class: impl Into<Cow<'static, str>>) {
        self.emit(Instruction::Checkcast {
            class: class.into(),
        });
    }

    pub fn getstatic(&mut self, field: FieldRef) {
        self.emit(Instruction::Getstatic(field));
    }

    pub fn invokevirtual(&mut self, method: MethodRef) {
        self.emit(Instruction::Invokevirtual(method));
    }

    pub fn invokespecial(&mut self, method: MethodRef) {
        self.emit(Instruction::Invokespecial(method));
    }

    pub fn invokestatic(&mut self, method: MethodRef) {
        self.emit(Instruction::Invokestatic(method));
    }

    // ── stack ──────────────────────────────────────────────────────

    pub fn dup(&mut self) {
        self.emit(Instruction::Dup);
    }

    pub fn pop(&mut self) {
        self.emit(Instruction::Pop);
    }

    pub fn swap(&mut self) {
        self.emit(Instruction::Swap);
    }

    // ── control flow ───────────────────────────────────────────────

    /// Define `label` at the current position.
    pub fn bind(&mut self, label: Label) {
        self.emit(Instruction::Label(label));
    }

    pub fn goto(&mut self, target: Label) {
        self.emit(Instruction::Goto(target));
    }

    /// Jump when the raw integer on top of the stack is zero.
    pub fn if_false(&mut self, target: Label) {
        self.emit(Instruction::Ifeq(target));
    }

    /// Jump when the raw integer on top of the stack is non-zero.
    pub fn if_true(&mut self, target: Label) {
        self.emit(Instruction::Ifne(target));
    }

    pub fn if_icmp(&mut self, cond: Cond, target: Label) {
        self.emit(Instruction::IfIcmp { cond, target });
    }

    pub fn if_acmp(&mut self, equal: bool, target: Label) {
        self.emit(Instruction::IfAcmp { equal, target });
    }

    pub fn return_void(&mut self) {
        self.emit(Instruction::Return);
    }

    pub fn return_value(&mut self) {
        self.emit(Instruction::Areturn);
    }
}

impl From<CodeBuilder> for Vec<Instruction> {
    fn from(builder: CodeBuilder) -> Self {
        builder.into_code()
    }
}
