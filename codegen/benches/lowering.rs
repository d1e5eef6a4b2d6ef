use codegen::{CodegenConfig, assemble};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use syntax::builder::*;
use syntax::{BinaryOp, CheckedProgram, Type};

/// `functions` copies of a small counting loop, all called from the
/// entry unit.
fn synthetic(functions: usize) -> CheckedProgram {
    let i = || ident("i", Type::Int);
    let mut builder = ProgramBuilder::new();
    let mut main = Vec::new();
    for n in 0..functions {
        let name = format!("count{n}");
        builder = builder.function(
            &name,
            &[("limit", Type::Int)],
            Type::Int,
            vec![
                assign(i(), int(0)),
                loop_do(vec![
                    if_else(
                        binary(BinaryOp::Ge, i(), ident("limit", Type::Int)),
                        vec![break_()],
                        vec![],
                    ),
                    assign(i(), binary(BinaryOp::Add, i(), int(1))),
                ]),
                ret(Some(list_sum(i()))),
            ],
        );
        main.push(put(call(&name, vec![int(n as i32)], Type::Int)));
    }
    builder.finish(main)
}

fn list_sum(value: syntax::Expr) -> syntax::Expr {
    let items = list(Type::Int, vec![value, int(1), int(2)]);
    binary(BinaryOp::Add, index(items, int(0)), int(0))
}

fn bench_lowering(c: &mut Criterion) {
    for size in [10, 100] {
        let checked = synthetic(size);
        c.bench_function(&format!("lower_{size}_functions"), |b| {
            b.iter(|| {
                let class = assemble(black_box(&checked), CodegenConfig::default())
                    .expect("lowering failed");
                black_box(class);
            })
        });
    }
}

fn bench_run(c: &mut Criterion) {
    let checked = synthetic(20);
    let class = assemble(&checked, CodegenConfig::default()).expect("lowering failed");
    c.bench_function("run_20_functions", |b| {
        b.iter(|| {
            let mut vm = vm::VM::new(&class);
            vm.run_main().expect("program failed");
            black_box(vm.into_output());
        })
    });
}

criterion_group!(benches, bench_lowering, bench_run);
criterion_main!(benches);
