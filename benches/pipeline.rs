//! Benchmarks for the vector reduction pipeline.
//!
//! Runs on synthetic straight-line functions where every other vector add reads
//! a loaded (divergent) value, so both passes have work to do:
//! - Divergence analysis alone
//! - Scalarization alone
//! - The full pipeline (scalarization + restitch)

extern crate vreduce;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use vreduce::{
    analysis::{DivergenceAnalysis, DivergenceOracle},
    compiler::{CompilerContext, PassScheduler},
    ir::{Function, Instruction, Opcode, Program, Type},
};

/// Builds a function with `chains` uniform/divergent vadd pairs.
fn synthetic_function(chains: usize) -> Function {
    let mut instrs = vec![
        Instruction::constant("p", Type::Int, 0).into(),
        Instruction::value("m", Type::Vector, Opcode::Vload, ["p"]).into(),
    ];

    let mut previous = "seed".to_string();
    for i in 0..chains {
        let uniform = format!("u{i}");
        let divergent = format!("d{i}");
        instrs.push(
            Instruction::value(&uniform, Type::Vector, Opcode::Vadd, [&previous, &previous]).into(),
        );
        instrs.push(
            Instruction::value(&divergent, Type::Vector, Opcode::Vadd, [uniform.as_str(), "m"])
                .into(),
        );
        previous = uniform;
    }
    instrs.push(Instruction::effect(Opcode::Ret, Vec::<String>::new()).into());

    Function::new("bench", instrs)
}

fn bench_divergence(c: &mut Criterion) {
    let func = synthetic_function(200);

    c.bench_function("divergence_200", |b| {
        b.iter(|| black_box(DivergenceAnalysis.analyze(black_box(&func)).unwrap()));
    });
}

fn bench_scalarize_only(c: &mut Criterion) {
    let program = Program::new(vec![synthetic_function(200)]);

    c.bench_function("scalarize_200", |b| {
        b.iter_batched(
            || program.clone(),
            |mut program| {
                let ctx = CompilerContext::new().unwrap();
                PassScheduler::scalarize_only()
                    .run(&mut program, &ctx)
                    .unwrap();
                black_box(program)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let program = Program::new(vec![synthetic_function(200)]);

    c.bench_function("reduce_200", |b| {
        b.iter_batched(
            || program.clone(),
            |mut program| {
                vreduce::reduce_program(&mut program).unwrap();
                black_box(program)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_divergence,
    bench_scalarize_only,
    bench_full_pipeline,
);
criterion_main!(benches);
