//! Lowers a type-checked program into stack-machine assembly.
//!
//! The input is a [`syntax::CheckedProgram`]. Every reachable function
//! becomes a method of one class, the entry unit becomes its constructor
//! and a static `main` trampoline instantiates it. All values travel on
//! the operand stack boxed; arithmetic unboxes, computes and re-boxes.

pub mod config;
pub mod error;
mod expr;
pub mod labels;
pub mod lowering;
pub mod runtime;
pub mod slots;
mod stmt;
pub mod unit;

pub use config::CodegenConfig;
pub use error::{CodegenError, RefKind, Result};
pub use labels::LabelAllocator;
pub use lowering::{FunctionLowering, LoopLabels, LoopStack, ReturnTypeTable};
pub use slots::{SlotAllocator, SlotKey};
pub use unit::{UnitAssembler, assemble, write_program};
