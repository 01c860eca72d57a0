//! Elementwise evaluation engine.
//!
//! [`evaluate`] writes an expression into a destination; [`accumulate`] adds
//! it in. Each call:
//!
//! 1. picks a [`Policy`] at compile time from the expression's operation
//!    classes, layout and static shape (see [`policy::select_policy`]),
//! 2. checks runtime shapes once, before anything is written,
//! 3. runs the linear or per-column loop with full packs, then finishes the
//!    remainder with the width-1 [`Single`] pack through the same reader and
//!    kernel code.
//!
//! Scalar policies are the same loops instantiated with `Single`.
//!
//! # Example
//!
//! ```
//! use packmat::{Matrix, eval};
//! use packmat::eval::funs::{Add, Sqrt};
//!
//! let a = Matrix::new([[1.0_f32, 4.0, 9.0], [16.0, 25.0, 36.0]]);
//! let b = Matrix::new([[1.0_f32, 1.0, 1.0], [1.0, 1.0, 1.0]]);
//! let mut c: Matrix<f32, 2, 3> = Matrix::zeros();
//!
//! eval::evaluate(eval::map2(Add, eval::map(Sqrt, &a), &b), &mut c);
//! assert_eq!(c[(1, 2)], 7.0);
//!
//! eval::accumulate(&b, &mut c);
//! assert_eq!(c[(0, 0)], 3.0);
//! ```

pub mod accessor;
pub mod expr;
pub mod funs;
pub mod policy;
pub mod reduce;

pub use expr::{
    Const, MaskExpr, MatExpr, MatSink, RepeatCol, RepeatRow, constant, map, map2, map3,
    repeat_col, repeat_row, select, test, test_and, test_not, test_or, test2,
};
pub use policy::{AccessPolicy, Layout, Policy, SMALL_STATIC_LEN, preferred_policy, tag};
pub use reduce::{
    MaxOf, MinOf, Reductor, Sum, all_of, any_of, count_of, dot, maximum, mean, minimum, norm_l2,
    norm_linf, reduce, reduce_cols, reduce_in, reduce_rows, sum, sum_abs, sum_sqr, try_reduce,
    try_reduce_cols, try_reduce_rows,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DimensionMismatch;
use crate::simd::{DefaultKind, Element, Pack, PackElement, PackOf, Single, SimdKind, has_vector_form};

use accessor::{VecReader, VecWriter};
use policy::merge_dim;

/// How a computed pack lands in the destination.
trait Update {
    /// # Safety
    ///
    /// Same bound as [`VecWriter::write`].
    unsafe fn apply<P: Pack, W: VecWriter<Elem = P::Elem>>(out: &mut W, i: usize, v: P);
}

/// `dst = v`
struct Assign;

/// `dst += v`
struct Accumulate;

impl Update for Assign {
    #[inline(always)]
    unsafe fn apply<P: Pack, W: VecWriter<Elem = P::Elem>>(out: &mut W, i: usize, v: P) {
        unsafe { out.write(i, v) }
    }
}

impl Update for Accumulate {
    #[inline(always)]
    unsafe fn apply<P: Pack, W: VecWriter<Elem = P::Elem>>(out: &mut W, i: usize, v: P) {
        unsafe {
            let cur: P = out.read(i);
            out.write(i, cur + v)
        }
    }
}

/// Process `n` elements: pairs of full packs, one more full pack if it fits,
/// then single lanes.
///
/// # Safety
///
/// `src` and `out` must both cover `n` elements.
#[inline(always)]
unsafe fn run_span<P, R, W, U>(src: &R, out: &mut W, n: usize)
where
    P: Pack,
    R: VecReader<Elem = P::Elem>,
    W: VecWriter<Elem = P::Elem>,
    U: Update,
{
    let w = P::WIDTH;
    let mut i = 0;
    unsafe {
        if w > 1 {
            while i + 2 * w <= n {
                let a: P = src.read(i);
                let b: P = src.read(i + w);
                U::apply(out, i, a);
                U::apply(out, i + w, b);
                i += 2 * w;
            }
        }
        if i + w <= n {
            let a: P = src.read(i);
            U::apply(out, i, a);
            i += w;
        }
        while i < n {
            let s: Single<P::Elem> = src.read(i);
            U::apply(out, i, s);
            i += 1;
        }
    }
}

fn linear_loop<P, E, D, U>(expr: &E, dst: &mut D)
where
    P: Pack<Elem = E::Elem>,
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    U: Update,
{
    let n = dst.nrows() * dst.ncols();
    let src = expr.linear();
    let mut out = dst.linear_mut();
    // SAFETY: shapes were checked against `dst`, so both cover `n` elements.
    unsafe { run_span::<P, _, _, U>(&src, &mut out, n) }
}

fn percol_loop<P, E, D, U>(expr: &E, dst: &mut D)
where
    P: Pack<Elem = E::Elem>,
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    U: Update,
{
    let (nrows, ncols) = (dst.nrows(), dst.ncols());
    for j in 0..ncols {
        let src = expr.column(j);
        let mut out = dst.column_mut(j);
        // SAFETY: every column has `nrows` elements.
        unsafe { run_span::<P, _, _, U>(&src, &mut out, nrows) }
    }
}

fn dispatch<K, E, D, U>(expr: &E, dst: &mut D, policy: Policy)
where
    K: SimdKind,
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: PackElement<K>,
    U: Update,
{
    match policy {
        Policy::ScalarLinear => linear_loop::<Single<E::Elem>, E, D, U>(expr, dst),
        Policy::ScalarPercol => percol_loop::<Single<E::Elem>, E, D, U>(expr, dst),
        Policy::SimdLinear => linear_loop::<PackOf<E::Elem, K>, E, D, U>(expr, dst),
        Policy::SimdPercol => percol_loop::<PackOf<E::Elem, K>, E, D, U>(expr, dst),
    }
}

/// Check shapes, then run `policy`. Nothing is written on error.
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(dims = %format!("{}x{}", dst.nrows(), dst.ncols())))
)]
fn run_checked<K, E, D, U>(expr: &E, dst: &mut D, policy: Policy) -> Result<(), DimensionMismatch>
where
    K: SimdKind,
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: PackElement<K>,
    U: Update,
{
    expr.check_dims()?;
    let expected = (dst.nrows(), dst.ncols());
    let got = (expr.nrows(), expr.ncols());
    if expected != got {
        return Err(DimensionMismatch { expected, got });
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(?policy, kind = K::NAME, "elementwise evaluation");
    if expected.0 == 0 || expected.1 == 0 {
        return Ok(());
    }
    dispatch::<K, E, D, U>(expr, dst, policy);
    Ok(())
}

/// `dst = expr`, or the shape mismatch.
pub fn try_evaluate<E, D>(expr: E, dst: &mut D) -> Result<(), DimensionMismatch>
where
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: Element,
{
    let policy = const { preferred_policy::<E, D, DefaultKind>() };
    run_checked::<DefaultKind, E, D, Assign>(&expr, dst, policy)
}

/// `dst = expr`.
///
/// Panics if the runtime shapes of `expr` and `dst` differ; nothing is
/// written in that case. Static shape conflicts fail to build.
pub fn evaluate<E, D>(expr: E, dst: &mut D)
where
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: Element,
{
    if let Err(e) = try_evaluate(expr, dst) {
        panic!("{e}");
    }
}

/// `dst += expr`, or the shape mismatch.
pub fn try_accumulate<E, D>(expr: E, dst: &mut D) -> Result<(), DimensionMismatch>
where
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: Element,
{
    let policy = const { preferred_policy::<E, D, DefaultKind>() };
    run_checked::<DefaultKind, E, D, Accumulate>(&expr, dst, policy)
}

/// `dst += expr`. Panics on a shape mismatch, like [`evaluate`].
pub fn accumulate<E, D>(expr: E, dst: &mut D)
where
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: Element,
{
    if let Err(e) = try_accumulate(expr, dst) {
        panic!("{e}");
    }
}

/// `dst = expr` with pack kind `K` and policy `Pol` chosen by the caller.
///
/// Forcing a vector policy on an expression that uses an operation with no
/// vector form for `K`, or whose layout does not allow the traversal, fails
/// to build.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::eval::{funs::Mul, tag};
/// use packmat::simd::Portable;
///
/// let a = Matrix::new([[1.0_f64, 2.0, 3.0]]);
/// let mut b: Matrix<f64, 1, 3> = Matrix::zeros();
/// eval::evaluate_with::<Portable, tag::SimdLinear, _, _>(eval::map2(Mul, &a, &a), &mut b)
///     .unwrap();
/// assert_eq!(b[(0, 2)], 9.0);
/// ```
pub fn evaluate_with<K, Pol, E, D>(expr: E, dst: &mut D) -> Result<(), DimensionMismatch>
where
    K: SimdKind,
    Pol: AccessPolicy,
    E: MatExpr,
    D: MatSink<Elem = E::Elem>,
    E::Elem: PackElement<K>,
{
    const {
        merge_dim(E::ROWS, D::ROWS);
        merge_dim(E::COLS, D::COLS);
        if Pol::POLICY.is_simd() {
            assert!(
                has_vector_form::<E::Elem, K>(E::OPS.union(D::OPS)),
                "expression uses an operation with no vector form for this pack kind"
            );
            let layout = E::LAYOUT.and(D::LAYOUT);
            assert!(
                layout.percol && (layout.linear || !Pol::POLICY.is_linear()),
                "layout does not support the requested vector traversal"
            );
        }
    }
    run_checked::<K, E, D, Assign>(&expr, dst, Pol::POLICY)
}

/// Policy [`evaluate`] uses for `E` into `D`.
pub const fn policy_for<E, D>() -> Policy
where
    E: MatExpr,
    D: MatExpr<Elem = E::Elem>,
    E::Elem: Element,
{
    preferred_policy::<E, D, DefaultKind>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use crate::simd::{Portable, ScalarKind};
    use expr::{Map1, Map2};
    use funs::{Add, Clamp, Div, Exp, Gt, IsNan, Max, Mul, MulAdd, Neg, Sqrt, Sub};

    #[cfg(feature = "alloc")]
    use crate::DynMatrix;

    fn seq<const M: usize, const N: usize>(offset: f32) -> Matrix<f32, M, N> {
        Matrix::from_fn(|i, j| offset + (j * M + i) as f32)
    }

    #[test]
    fn linear_add() {
        let a: Matrix<f32, 4, 5> = seq(0.0);
        let b: Matrix<f32, 4, 5> = seq(100.0);
        let mut c: Matrix<f32, 4, 5> = Matrix::zeros();
        evaluate(map2(Add, &a, &b), &mut c);
        for (k, &x) in c.iter().enumerate() {
            assert_eq!(x, 100.0 + 2.0 * k as f32);
        }
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn tail_every_length() {
        for n in [0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17] {
            let a = DynMatrix::from_fn(n, 1, |i, _| i as f32 + 0.5);
            let mut out = DynMatrix::fill(n, 1, f32::NAN);
            evaluate(map(Neg, &a), &mut out);
            for i in 0..n {
                assert_eq!(out[(i, 0)], -(i as f32 + 0.5), "n = {n}, i = {i}");
            }
        }
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn every_policy_agrees() {
        for (r, c) in [(1, 1), (3, 3), (5, 2), (8, 3), (9, 4), (17, 2)] {
            let a = DynMatrix::from_fn(r, c, |i, j| (i as f64 - 2.0) * 0.75 + j as f64);
            let b = DynMatrix::from_fn(r, c, |i, j| 1.0 + (i * c + j) as f64 * 0.125);
            let e = map3(MulAdd, &a, &b, map2(Max, &a, &b));

            let mut r0 = DynMatrix::zeros(r, c, 0.0);
            let mut r1 = r0.clone();
            let mut r2 = r0.clone();
            let mut r3 = r0.clone();
            evaluate_with::<ScalarKind, tag::ScalarLinear, _, _>(&e, &mut r0).unwrap();
            evaluate_with::<ScalarKind, tag::ScalarPercol, _, _>(&e, &mut r1).unwrap();
            evaluate_with::<DefaultKind, tag::SimdLinear, _, _>(&e, &mut r2).unwrap();
            evaluate_with::<DefaultKind, tag::SimdPercol, _, _>(&e, &mut r3).unwrap();
            assert_eq!(r0, r1);
            assert_eq!(r0, r2);
            assert_eq!(r0, r3);
        }
    }

    #[test]
    fn block_view_per_column() {
        let src: Matrix<f32, 6, 5> = seq(0.0);
        let mut dst: Matrix<f32, 6, 5> = Matrix::zeros();
        {
            let v = src.view((1, 1), (5, 3));
            let mut w = dst.view_mut((0, 2), (5, 3));
            evaluate(map(Sqrt, map2(Mul, v, v)), &mut w);
        }
        for j in 0..3 {
            for i in 0..5 {
                assert_eq!(dst[(i, j + 2)], src[(i + 1, j + 1)]);
            }
        }
        assert_eq!(dst[(5, 2)], 0.0);
        assert_eq!(dst[(0, 1)], 0.0);
    }

    #[test]
    fn transpose_into() {
        let a: Matrix<f64, 3, 5> = Matrix::from_fn(|i, j| (10 * i + j) as f64);
        let mut t: Matrix<f64, 5, 3> = Matrix::zeros();
        evaluate(a.transpose_view(), &mut t);
        for i in 0..5 {
            for j in 0..3 {
                assert_eq!(t[(i, j)], a[(j, i)]);
            }
        }
        let mut back: Matrix<f64, 3, 5> = Matrix::zeros();
        {
            let mut tv = back.transpose_view_mut();
            evaluate(&t, &mut tv);
        }
        assert_eq!(back, a);
    }

    #[test]
    fn select_expression() {
        let a = Matrix::new([[1.0_f32, f32::NAN, -3.0, 4.0, 5.0]]);
        let mut out: Matrix<f32, 1, 5> = Matrix::zeros();
        let zero = constant(0.0, 1, 5);
        evaluate(select(test(IsNan, &a), zero, map2(Max, &a, zero)), &mut out);
        assert_eq!(out.as_slice(), &[1.0, 0.0, 0.0, 4.0, 5.0]);

        let lim = constant(2.0, 1, 5);
        evaluate(select(test2(Gt, &a, lim), lim, &a), &mut out);
        assert_eq!(out[(0, 0)], 1.0);
        assert_eq!(out[(0, 4)], 2.0);
        assert!(out[(0, 1)].is_nan());
    }

    #[test]
    fn accumulate_adds() {
        let a: Matrix<f32, 3, 7> = seq(1.0);
        let mut acc: Matrix<f32, 3, 7> = Matrix::fill(0.5);
        accumulate(&a, &mut acc);
        accumulate(map(Neg, constant(0.5, 3, 7)), &mut acc);
        assert_eq!(acc, a);
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn mismatch_writes_nothing() {
        let a = DynMatrix::zeros(2, 3, 0.0_f32);
        let b = DynMatrix::zeros(3, 2, 0.0_f32);
        let mut out = DynMatrix::fill(2, 3, 9.0_f32);
        let err = try_evaluate(map2(Sub, &a, &b), &mut out).unwrap_err();
        assert_eq!(err, DimensionMismatch { expected: (2, 3), got: (3, 2) });
        assert!(out.iter().all(|&x| x == 9.0));

        let mut small = DynMatrix::zeros(2, 2, 0.0_f32);
        let err = try_accumulate(&a, &mut small).unwrap_err();
        assert_eq!(err.expected, (2, 2));
    }

    #[test]
    #[cfg(feature = "alloc")]
    #[should_panic(expected = "dimension mismatch: expected 1x1, got 2x3")]
    fn evaluate_panics_on_mismatch() {
        let a = DynMatrix::zeros(2, 3, 0.0_f64);
        let mut out = DynMatrix::zeros(1, 1, 0.0_f64);
        evaluate(&a, &mut out);
    }

    #[test]
    fn clamp_and_divide() {
        let a = Matrix::new([[-4.0_f64, -1.0, 0.0, 2.0, 8.0]]);
        let mut out: Matrix<f64, 1, 5> = Matrix::zeros();
        evaluate(
            map3(Clamp, map2(Div, &a, constant(2.0, 1, 5)), constant(-1.0, 1, 5), constant(1.0, 1, 5)),
            &mut out,
        );
        assert_eq!(out.as_slice(), &[-1.0, -0.5, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn static_policies() {
        type M3 = Matrix<f32, 3, 3>;
        type M4 = Matrix<f32, 4, 4>;
        type M32 = Matrix<f32, 32, 3>;
        assert_eq!(policy_for::<&M3, M3>(), Policy::ScalarLinear);
        assert_eq!(policy_for::<Map2<Add, &M4, &M4>, M4>(), Policy::SimdLinear);
        assert_eq!(policy_for::<Map1<Exp, &M32>, M32>(), Policy::ScalarLinear);
        assert_eq!(
            preferred_policy::<Map1<Exp, &M4>, M4, Portable>(),
            Policy::ScalarLinear
        );
        assert_eq!(
            preferred_policy::<crate::matrix::MatrixView<'static, f32>, M4, Portable>(),
            Policy::SimdPercol
        );
        assert_eq!(
            preferred_policy::<crate::matrix::StridedView<'static, f32>, M4, Portable>(),
            Policy::ScalarPercol
        );
    }

    #[test]
    fn emulated_runs_scalar_and_matches() {
        let a: Matrix<f32, 4, 8> = Matrix::from_fn(|i, j| (i as f32 - j as f32) * 0.1);
        let mut out: Matrix<f32, 4, 8> = Matrix::zeros();
        evaluate(map(Exp, &a), &mut out);
        for (x, y) in a.iter().zip(out.iter()) {
            assert_eq!(*y, x.exp());
        }
    }
}
