//! Benchmarks for fuzznum norm evaluation and executor operations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fuzznum::{
    scalar_attrs, Fuzznum, FuzznumRegistry, NormFamily, NormParams, OperationExecutor,
    OperationTNorm, VerifyOptions,
};

fn norm_evaluation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("t_norm");

    for family in [
        NormFamily::Algebraic,
        NormFamily::Einstein,
        NormFamily::Frank,
        NormFamily::Dombi,
    ] {
        let op = OperationTNorm::with_options(
            family,
            2,
            NormParams::default(),
            &VerifyOptions {
                enabled: false,
                ..VerifyOptions::default()
            },
        )
        .unwrap();
        group.bench_with_input(
            BenchmarkId::new("pairwise", family.name()),
            &op,
            |b, op| {
                b.iter(|| {
                    let mut acc = 0.0;
                    for i in 1..50 {
                        let a = i as f64 / 50.0;
                        acc += op.t_norm(black_box(a), black_box(1.0 - a));
                    }
                    acc
                });
            },
        );
    }
    group.finish();
}

fn norm_construction_benchmark(c: &mut Criterion) {
    c.bench_function("construct_verified_norm", |b| {
        b.iter(|| {
            OperationTNorm::new(
                black_box(NormFamily::Algebraic),
                black_box(2),
                NormParams::default(),
            )
            .unwrap()
        });
    });
}

fn executor_benchmark(c: &mut Criterion) {
    let registry = Arc::new(FuzznumRegistry::with_builtins().unwrap());
    let executor = OperationExecutor::new(registry.clone());
    let a = Fuzznum::create_in(
        &registry,
        "qrofn",
        2,
        scalar_attrs(&[("md", 0.6), ("nmd", 0.3)]),
    )
    .unwrap();
    let b_operand = Fuzznum::create_in(
        &registry,
        "qrofn",
        2,
        scalar_attrs(&[("md", 0.5), ("nmd", 0.4)]),
    )
    .unwrap();

    let mut group = c.benchmark_group("executor");

    group.bench_function("addition_cached", |b| {
        b.iter(|| executor.addition(black_box(&a), black_box(&b_operand)).unwrap());
    });

    group.bench_function("addition_uncached", |b| {
        executor.set_cache_enabled(false);
        b.iter(|| executor.addition(black_box(&a), black_box(&b_operand)).unwrap());
        executor.set_cache_enabled(true);
    });

    group.finish();
}

criterion_group!(
    benches,
    norm_evaluation_benchmark,
    norm_construction_benchmark,
    executor_benchmark
);
criterion_main!(benches);
