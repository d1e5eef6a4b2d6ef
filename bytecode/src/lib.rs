mod op;
mod instruction;
mod builder;
mod class;
pub mod stack;
pub mod writer;

pub use op::Op;
pub use instruction::{Constant, Cond, FieldRef, Instruction, Label, MethodRef};
pub use builder::CodeBuilder;
pub use class::{Access, ClassFile, Method};
pub use writer::AssemblyWriter;
