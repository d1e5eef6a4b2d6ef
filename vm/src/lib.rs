//! Reference evaluator for assembled classes.
//!
//! Interprets the structured instruction stream directly, with a small
//! native library standing in for the JVM classes generated code links
//! against. Printed lines are captured so callers can inspect them.

mod error;
mod interpreter;
mod primitives;
mod value;

pub use error::VmError;
pub use interpreter::{Outcome, VM};
pub use value::{Object, Value};
