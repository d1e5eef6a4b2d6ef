mod common;

use syntax::builder::*;
use syntax::{AssignOp, BinaryOp, Expr, Type};
use vm::Value;

use common::{compile, invoke, run};

fn x() -> Expr {
    ident("x", Type::Int)
}

#[test]
fn increment_function() {
    let checked = ProgramBuilder::new()
        .function(
            "f",
            &[("x", Type::Int)],
            Type::Int,
            vec![ret(Some(binary(BinaryOp::Add, x(), int(1))))],
        )
        .finish(vec![put(call_f(4))]);

    assert_eq!(run(&checked), ["5"]);
    assert_eq!(
        invoke(&checked, "f", vec![Value::Integer(4)]),
        Some(Value::Integer(5))
    );
}

fn call_f(arg: i32) -> Expr {
    call("f", vec![int(arg)], Type::Int)
}

#[test]
fn if_else_takes_the_else_branch() {
    let a = || ident("a", Type::Int);
    let b = || ident("b", Type::Int);
    let checked = ProgramBuilder::new()
        .function(
            "pick",
            &[("a", Type::Int), ("b", Type::Int)],
            Type::Int,
            vec![if_else(
                binary(BinaryOp::Gt, a(), b()),
                vec![ret(Some(int(1)))],
                vec![ret(Some(int(0)))],
            )],
        )
        .finish(vec![]);

    let args = vec![Value::Integer(3), Value::Integer(5)];
    assert_eq!(invoke(&checked, "pick", args), Some(Value::Integer(0)));
    let args = vec![Value::Integer(5), Value::Integer(3)];
    assert_eq!(invoke(&checked, "pick", args), Some(Value::Integer(1)));
}

#[test]
fn list_literal_index() {
    let items = list(Type::Int, vec![int(1), int(2), int(3)]);
    let checked = ProgramBuilder::new().finish(vec![put(index(items, int(1)))]);
    assert_eq!(run(&checked), ["2"]);
}

#[test]
fn loop_with_break_counts_to_three() {
    let checked = ProgramBuilder::new().finish(vec![
        assign(x(), int(0)),
        loop_do(vec![
            assign(x(), binary(BinaryOp::Add, x(), int(1))),
            if_else(binary(BinaryOp::Eq, x(), int(3)), vec![break_()], vec![]),
        ]),
        put(x()),
    ]);
    assert_eq!(run(&checked), ["3"]);
}

#[test]
fn recursion_through_closures() {
    let n = || ident("n", Type::Int);
    let fact = |arg| call("fact", vec![arg], Type::Int);
    let checked = ProgramBuilder::new()
        .function(
            "fact",
            &[("n", Type::Int)],
            Type::Int,
            vec![
                if_else(
                    binary(BinaryOp::Le, n(), int(1)),
                    vec![ret(Some(int(1)))],
                    vec![],
                ),
                ret(Some(binary(
                    BinaryOp::Mul,
                    n(),
                    fact(binary(BinaryOp::Sub, n(), int(1))),
                ))),
            ],
        )
        .finish(vec![put(fact(int(5)))]);
    assert_eq!(run(&checked), ["120"]);
}

#[test]
fn nested_calls_to_one_callee_keep_their_arguments() {
    let a = || ident("a", Type::Int);
    let b = || ident("b", Type::Int);
    let add = |l, r| call("add", vec![l, r], Type::Int);
    let checked = ProgramBuilder::new()
        .function(
            "add",
            &[("a", Type::Int), ("b", Type::Int)],
            Type::Int,
            vec![ret(Some(binary(BinaryOp::Add, a(), b())))],
        )
        .finish(vec![put(add(int(1), add(int(10), int(100))))]);
    assert_eq!(run(&checked), ["111"]);
}

#[test]
fn function_pointer_variables() {
    let sig = Type::fptr(vec![Type::Int], Type::Int);
    let checked = ProgramBuilder::new()
        .function(
            "double",
            &[("x", Type::Int)],
            Type::Int,
            vec![ret(Some(binary(BinaryOp::Mul, x(), int(2))))],
        )
        .finish(vec![
            assign(ident("g", sig.clone()), fn_ptr("double", sig.clone())),
            put(call("g", vec![int(21)], Type::Int)),
        ]);
    assert_eq!(run(&checked), ["42"]);
}

#[test]
fn strings_and_lists_print_through_their_overloads() {
    let xs = || ident("xs", Type::list(Type::Int));
    let s = || ident("s", Type::String);
    let checked = ProgramBuilder::new().finish(vec![
        assign(s(), string("hello")),
        put(chop(s())),
        put(len(s())),
        put(binary(BinaryOp::Eq, s(), string("hello"))),
        assign(xs(), list(Type::Int, vec![int(4), int(5)])),
        assign_index(xs(), int(0), AssignOp::Add, int(10)),
        put(xs()),
        put(len(xs())),
    ]);
    assert_eq!(run(&checked), ["hell", "5", "true", "[14, 5]", "2"]);
}

#[test]
fn void_function_gets_an_implicit_return() {
    let checked = ProgramBuilder::new()
        .function("greet", &[], Type::Void, vec![put(string("hi"))])
        .finish(vec![
            expr(call("greet", vec![], Type::Void)),
            expr(call("greet", vec![], Type::Void)),
        ]);
    assert_eq!(run(&checked), ["hi", "hi"]);

    let class = compile(&checked);
    let greet = class.method("greet").unwrap();
    let returns = greet.code.iter().filter(|i| i.is_return()).count();
    assert_eq!(returns, 1);
    assert!(greet.code.last().unwrap().is_return());
}

#[test]
fn explicit_void_return_is_not_duplicated() {
    let checked = ProgramBuilder::new()
        .function("quiet", &[], Type::Void, vec![ret(None)])
        .finish(vec![]);
    let class = compile(&checked);
    let quiet = &class.method("quiet").unwrap().code;
    assert_eq!(quiet, &[bytecode::Instruction::Return]);
}
