#![cfg(feature = "alloc")]

use packmat::eval::funs::{
    Abs, Add, Gt, IsNan, Lt, Max, Min, Mul, MulAdd, Round, Scale, Sqr, Sqrt, Sub,
};
use packmat::eval::{self, Policy, tag};
use packmat::simd::{DefaultKind, ScalarKind};
use packmat::{DimensionMismatch, DynMatrix, Matrix};

fn ramp(nrows: usize, ncols: usize) -> DynMatrix<f64> {
    DynMatrix::from_fn(nrows, ncols, |i, j| (i as f64 - 3.5) * 0.75 + j as f64 * 1.25)
}

fn bits(m: &DynMatrix<f64>) -> Vec<u64> {
    m.iter().map(|x| x.to_bits()).collect()
}

// ── End-to-end evaluation ───────────────────────────────────────────

#[test]
fn chained_expression_every_shape() {
    for nrows in [0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17] {
        for ncols in [0, 1, 3] {
            let a = ramp(nrows, ncols);
            let b = DynMatrix::fill(nrows, ncols, 0.5);
            let mut c = DynMatrix::zeros(nrows, ncols, 0.0);
            eval::evaluate(eval::map3(MulAdd, &a, &b, eval::map(Sqr, &a)), &mut c);
            for j in 0..ncols {
                for i in 0..nrows {
                    let x = a[(i, j)];
                    assert_eq!(c[(i, j)], x * 0.5 + x * x, "({i}, {j}) of {nrows}x{ncols}");
                }
            }
        }
    }
}

#[test]
fn forced_policies_bit_identical() {
    let a = ramp(13, 5);
    let b = ramp(13, 5);
    let expr = || eval::map2(Max, eval::map(Sqrt, eval::map(Abs, &a)), eval::map2(Mul, &a, &b));

    let mut reference = DynMatrix::zeros(13, 5, 0.0);
    eval::evaluate_with::<ScalarKind, tag::ScalarLinear, _, _>(expr(), &mut reference).unwrap();

    let mut out = DynMatrix::zeros(13, 5, 0.0);
    eval::evaluate_with::<ScalarKind, tag::ScalarPercol, _, _>(expr(), &mut out).unwrap();
    assert_eq!(bits(&out), bits(&reference));
    eval::evaluate_with::<DefaultKind, tag::SimdLinear, _, _>(expr(), &mut out).unwrap();
    assert_eq!(bits(&out), bits(&reference));
    eval::evaluate_with::<DefaultKind, tag::SimdPercol, _, _>(expr(), &mut out).unwrap();
    assert_eq!(bits(&out), bits(&reference));
}

#[test]
fn center_rows_with_repeated_means() {
    let a = ramp(11, 6);
    let mut sums = DynMatrix::zeros(11, 1, 0.0);
    eval::reduce_rows(eval::Sum, &a, &mut sums);
    let mut means = DynMatrix::zeros(11, 1, 0.0);
    eval::evaluate(eval::map(Scale(1.0 / 6.0), &sums), &mut means);

    let centered = || eval::map2(Sub, &a, eval::repeat_col(&means, 6));
    let mut reference = DynMatrix::zeros(11, 6, 0.0);
    eval::evaluate_with::<ScalarKind, tag::ScalarLinear, _, _>(centered(), &mut reference).unwrap();
    let mut out = DynMatrix::zeros(11, 6, 0.0);
    eval::evaluate_with::<DefaultKind, tag::SimdLinear, _, _>(centered(), &mut out).unwrap();
    assert_eq!(bits(&out), bits(&reference));
    eval::evaluate_with::<DefaultKind, tag::SimdPercol, _, _>(centered(), &mut out).unwrap();
    assert_eq!(bits(&out), bits(&reference));

    let mut residual = DynMatrix::zeros(11, 1, 0.0);
    eval::reduce_rows(eval::Sum, &reference, &mut residual);
    assert!(residual.iter().all(|r| r.abs() < 1e-12));

    let offsets = DynMatrix::from_fn(1, 6, |_, j| j as f64);
    let mut shifted = DynMatrix::zeros(11, 6, 0.0);
    eval::evaluate(eval::map2(Add, &a, eval::repeat_row(&offsets, 11)), &mut shifted);
    assert_eq!(shifted[(4, 3)], a[(4, 3)] + 3.0);
    assert_eq!(shifted[(10, 0)], a[(10, 0)]);

    let err = eval::try_evaluate(eval::map2(Add, &a, eval::repeat_col(&means, 5)), &mut shifted)
        .unwrap_err();
    assert_eq!(err, DimensionMismatch { expected: (11, 6), got: (11, 5) });
}

#[test]
fn views_and_transposes() {
    let a = ramp(6, 6);
    let mut out = DynMatrix::zeros(4, 3, 0.0);
    eval::evaluate(eval::map(Scale(2.0), a.view((1, 2), (4, 3))), &mut out);
    assert_eq!(out[(0, 0)], 2.0 * a[(1, 2)]);
    assert_eq!(out[(3, 2)], 2.0 * a[(4, 4)]);

    let mut t = DynMatrix::zeros(6, 6, 0.0);
    eval::evaluate(a.transpose_view(), &mut t);
    for i in 0..6 {
        for j in 0..6 {
            assert_eq!(t[(i, j)], a[(j, i)]);
        }
    }

    // writing into a block leaves the rest untouched
    let mut big = DynMatrix::fill(6, 6, -1.0);
    let src = DynMatrix::fill(2, 5, 3.0);
    eval::evaluate(&src, &mut big.view_mut((3, 1), (2, 5)));
    assert_eq!(eval::count_of(eval::test2(Gt, &big, eval::constant(0.0, 6, 6))), 10);
    assert_eq!(big[(2, 1)], -1.0);
    assert_eq!(big[(3, 1)], 3.0);
}

#[test]
fn select_with_rounding() {
    let a = Matrix::new([[0.5_f32, 1.5, 2.5, -0.5, -1.5]]);
    let zero = eval::constant(0.0_f32, 1, 5);
    let mut c: Matrix<f32, 1, 5> = Matrix::zeros();
    eval::evaluate(eval::select(eval::test2(Lt, &a, zero), zero, eval::map(Round, &a)), &mut c);
    assert_eq!(c.as_slice(), &[0.0, 2.0, 2.0, 0.0, 0.0]);
}

#[test]
fn accumulate_into_fixed() {
    let a: Matrix<f64, 3, 3> = Matrix::eye();
    let mut c: Matrix<f64, 3, 3> = Matrix::fill(1.0);
    eval::accumulate(&a, &mut c);
    eval::accumulate(eval::map2(Add, &a, &a), &mut c);
    assert_eq!(c[(1, 1)], 4.0);
    assert_eq!(c[(0, 2)], 1.0);
}

#[test]
fn mismatch_reported_before_writing() {
    let a = ramp(3, 3);
    let b = ramp(3, 4);
    let mut c = DynMatrix::fill(3, 3, 7.0);
    let err = eval::try_evaluate(eval::map2(Min, &a, &b), &mut c).unwrap_err();
    assert_eq!(err, DimensionMismatch { expected: (3, 3), got: (3, 4) });
    assert!(c.iter().all(|&x| x == 7.0));
    assert_eq!(err.to_string(), "dimension mismatch: expected 3x3, got 3x4");
}

#[test]
#[should_panic(expected = "dimension mismatch")]
fn evaluate_panics_on_mismatch() {
    let a = ramp(2, 2);
    let mut c = DynMatrix::zeros(2, 3, 0.0);
    eval::evaluate(&a, &mut c);
}

#[test]
fn static_policy_choice() {
    // 3x3 = 9 elements, shorter than the cut-over and not a pack multiple
    assert!(!eval::policy_for::<Matrix<f32, 3, 3>, Matrix<f32, 3, 3>>().is_simd());
    // runtime shapes vectorize when the kind has lanes
    let wide = <packmat::PackOf<f32, DefaultKind> as packmat::Pack>::WIDTH > 1;
    assert_eq!(
        eval::policy_for::<DynMatrix<f32>, DynMatrix<f32>>() == Policy::SimdLinear,
        wide
    );
}

// ── Reductions ──────────────────────────────────────────────────────

#[test]
fn reductions_end_to_end() {
    let a = Matrix::new([[1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]]);
    assert_eq!(eval::sum(&a), 28.0);
    assert_eq!(eval::minimum(&a), 1.0);
    assert_eq!(eval::maximum(&a), 7.0);
    assert_eq!(eval::mean(&a), 4.0);
    assert_eq!(eval::sum_sqr(&a), 140.0);
    assert_eq!(eval::norm_linf(eval::map(Scale(-1.0), &a)), 7.0);

    let d = ramp(17, 3);
    let exact: f64 = d.iter().sum();
    assert!((eval::sum(&d) - exact).abs() < 1e-12);
    assert!(!eval::any_of(eval::test(IsNan, &d)));
}

#[test]
fn column_reduction_of_view() {
    let d = ramp(8, 4);
    let mut s = DynMatrix::zeros(1, 3, 0.0);
    eval::reduce_cols(eval::MaxOf, d.view((0, 1), (8, 3)), &mut s);
    for j in 0..3 {
        assert_eq!(s[(0, j)], d[(7, j + 1)]);
    }
}
