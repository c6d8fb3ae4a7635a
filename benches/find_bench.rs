use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use selectra::{
    default_solvers, find_best, rank_applicable, ConvolutionDescriptor, DataType, InvokeParams,
    MemPerfDb, PerfDb, ProblemDescriptor, TensorDescriptor, TensorLayout,
};

fn resnet_conv3x3() -> ProblemDescriptor {
    ProblemDescriptor::conv2d_fwd(
        DataType::Float,
        TensorLayout::NCHW,
        8,
        64,
        56,
        56,
        64,
        3,
        3,
        ConvolutionDescriptor::new_2d(1, 1, 1),
    )
    .unwrap()
}

fn bench_find(c: &mut Criterion) {
    let problem = resnet_conv3x3();
    let handles = default_solvers();
    let invoke = InvokeParams::default();

    let empty_db = MemPerfDb::new();
    c.bench_function("find_best_untuned", |b| {
        b.iter(|| find_best(black_box(&handles), black_box(&problem), &empty_db, &invoke))
    });

    let mut tuned_db = MemPerfDb::new();
    tuned_db.store(
        &problem.signature(),
        "gemm_fwd",
        "{\"tile_m\":64,\"tile_n\":64,\"tile_k\":16}",
    );
    c.bench_function("find_best_tuned", |b| {
        b.iter(|| find_best(black_box(&handles), black_box(&problem), &tuned_db, &invoke))
    });

    c.bench_function("rank_applicable", |b| {
        b.iter(|| rank_applicable(black_box(&handles), black_box(&problem), &empty_db))
    });
}

fn bench_tensor(c: &mut Criterion) {
    let problem = resnet_conv3x3();
    c.bench_function("problem_signature", |b| {
        b.iter(|| black_box(&problem).signature())
    });

    let t = TensorDescriptor::with_layout(DataType::Int8x4, TensorLayout::NCHWc4, vec![8, 64, 56, 56]);
    c.bench_function("flat_index_vectorized", |b| {
        b.iter(|| black_box(&t).flat_index(black_box(&[2, 3, 7, 21, 40])))
    });
}

criterion_group!(benches, bench_find, bench_tensor);
criterion_main!(benches);
