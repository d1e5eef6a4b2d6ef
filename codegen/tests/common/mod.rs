#![allow(dead_code)]

use bytecode::{ClassFile, Label};
use codegen::{CodegenConfig, assemble};
use syntax::CheckedProgram;
use vm::{VM, Value};

pub fn compile(checked: &CheckedProgram) -> ClassFile {
    assemble(checked, CodegenConfig::default()).expect("lowering failed")
}

/// Run the program through its `main` trampoline, returning printed lines.
pub fn run(checked: &CheckedProgram) -> Vec<String> {
    let class = compile(checked);
    let mut vm = VM::new(&class);
    vm.run_main().expect("program failed");
    vm.into_output()
}

/// Call one lowered function on a fresh instance.
pub fn invoke(
    checked: &CheckedProgram,
    function: &str,
    args: Vec<Value>,
) -> Option<Value> {
    let class = compile(checked);
    let mut vm = VM::new(&class);
    let this = vm.instance();
    vm.invoke(this, function, args).expect("call failed")
}

/// Every label definition in the class, in order.
pub fn defined_labels(class: &ClassFile) -> Vec<Label> {
    class
        .methods
        .iter()
        .flat_map(|m| m.code.iter())
        .filter_map(|i| match i {
            bytecode::Instruction::Label(label) => Some(*label),
            _ => None,
        })
        .collect()
}

pub fn branch_targets(class: &ClassFile) -> Vec<Label> {
    class
        .methods
        .iter()
        .flat_map(|m| m.code.iter())
        .filter_map(|i| i.branch_target())
        .collect()
}
