use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use packmat::eval::funs::{Add, Exp, MulAdd, Sqrt};
use packmat::eval::{self, tag};
use packmat::random::{Normal, Uniform, rand_fill};
use packmat::simd::{DefaultKind, ScalarKind};
use packmat::{DynMatrix, Matrix};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_dyn(nrows: usize, ncols: usize, seed: u64) -> DynMatrix<f32> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut m = DynMatrix::zeros(nrows, ncols, 0.0);
    rand_fill(&mut m, Uniform::new(0.5, 2.0).unwrap(), &mut rng);
    m
}

// ---------------------------------------------------------------------------
// Elementwise evaluation: scalar vs vector policy
// ---------------------------------------------------------------------------

fn muladd_policies(c: &mut Criterion) {
    let mut g = c.benchmark_group("muladd_sqrt");
    for n in [15, 64, 1000, 100_000] {
        let a = random_dyn(n, 1, 1);
        let b = random_dyn(n, 1, 2);
        let mut out = DynMatrix::zeros(n, 1, 0.0);

        g.bench_with_input(BenchmarkId::new("scalar", n), &n, |bench, _| {
            bench.iter(|| {
                eval::evaluate_with::<ScalarKind, tag::ScalarLinear, _, _>(
                    eval::map3(MulAdd, black_box(&a), &b, eval::map(Sqrt, &a)),
                    &mut out,
                )
                .unwrap();
            });
        });
        g.bench_with_input(BenchmarkId::new("simd", n), &n, |bench, _| {
            bench.iter(|| {
                eval::evaluate_with::<DefaultKind, tag::SimdLinear, _, _>(
                    eval::map3(MulAdd, black_box(&a), &b, eval::map(Sqrt, &a)),
                    &mut out,
                )
                .unwrap();
            });
        });
    }
    g.finish();
}

fn block_view(c: &mut Criterion) {
    let a = random_dyn(256, 256, 3);
    let mut out = DynMatrix::zeros(250, 250, 0.0);
    c.bench_function("block_view_add_250", |bench| {
        bench.iter(|| {
            eval::evaluate(
                eval::map2(Add, black_box(a.view((3, 3), (250, 250))), a.view((0, 0), (250, 250))),
                &mut out,
            );
        });
    });
}

fn small_fixed(c: &mut Criterion) {
    let a: Matrix<f32, 3, 3> = Matrix::from_fn(|i, j| (i + j) as f32);
    let mut out: Matrix<f32, 3, 3> = Matrix::zeros();
    c.bench_function("fixed_3x3_add", |bench| {
        bench.iter(|| eval::evaluate(eval::map2(Add, black_box(&a), &a), &mut out));
    });
}

fn emulated(c: &mut Criterion) {
    let a = random_dyn(10_000, 1, 4);
    let mut out = DynMatrix::zeros(10_000, 1, 0.0);
    c.bench_function("exp_10000", |bench| {
        bench.iter(|| eval::evaluate(eval::map(Exp, black_box(&a)), &mut out));
    });
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

fn reductions(c: &mut Criterion) {
    let mut g = c.benchmark_group("reduce");
    for n in [64, 10_000] {
        let a = random_dyn(n, 1, 5);
        g.bench_with_input(BenchmarkId::new("sum", n), &n, |bench, _| {
            bench.iter(|| eval::sum(black_box(&a)));
        });
        g.bench_with_input(BenchmarkId::new("norm_l2", n), &n, |bench, _| {
            bench.iter(|| eval::norm_l2(black_box(&a)));
        });
    }
    let a = random_dyn(1000, 100, 7);
    let mut rows = DynMatrix::zeros(1000, 1, 0.0);
    g.bench_function("rows_1000x100", |bench| {
        bench.iter(|| eval::reduce_rows(eval::Sum, black_box(&a), &mut rows));
    });
    g.finish();
}

fn random_fill(c: &mut Criterion) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
    let mut m = DynMatrix::zeros(1000, 100, 0.0_f64);
    let u = Uniform::new(-1.0, 1.0).unwrap();
    c.bench_function("rand_fill_100k", |bench| {
        bench.iter(|| rand_fill(&mut m, u, &mut rng));
    });
    let n = Normal::new(0.0, 1.0).unwrap();
    c.bench_function("rand_fill_normal_100k", |bench| {
        bench.iter(|| rand_fill(&mut m, n, &mut rng));
    });
}

criterion_group!(benches, muladd_policies, block_view, small_fixed, emulated, reductions, random_fill);
criterion_main!(benches);
