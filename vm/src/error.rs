use bytecode::stack::StackError;
use bytecode::Label;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("operand stack underflow in {method}")]
    StackUnderflow { method: String },
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("cannot cast {found} to {class}")]
    ClassCast { class: String, found: String },
    #[error("no such method: {0}")]
    UnknownMethod(String),
    #[error("no such field: {0}")]
    UnknownField(String),
    #[error("jump to undefined {0}")]
    UnknownLabel(Label),
    #[error("malformed code: {0}")]
    Malformed(#[from] StackError),
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i32, len: usize },
    #[error("string index out of range: {begin}..{end} of {len}")]
    StringIndex { begin: i32, end: i32, len: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("null reference in {0}")]
    NullReference(String),
    #[error("call depth exceeded {0} frames")]
    StackOverflow(usize),
    #[error("step limit of {0} instructions exceeded")]
    StepLimit(u64),
    #[error("class has no static main method")]
    NoEntryPoint,
}
