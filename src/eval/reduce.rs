//! Reductions: fold an expression to one scalar, or each column to one.
//!
//! The vector path keeps two pack accumulators, combines them, and collapses
//! the result with the pack's horizontal reduction; leftover elements are
//! folded one at a time. Floating-point results therefore depend on the pack
//! width and may differ from strict left-to-right order by rounding.
//!
//! ```
//! use packmat::{Matrix, eval};
//!
//! let a = Matrix::new([[1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]]);
//! assert_eq!(eval::sum(&a), 28.0);
//! assert_eq!(eval::maximum(&a), 7.0);
//! assert_eq!(eval::dot(&a, &a), 140.0);
//! ```

use num_traits::{Float, Zero};

use crate::error::DimensionMismatch;
use crate::simd::{
    DefaultKind, Element, MaskPack, OpSet, Pack, PackElement, PackOf, Single, SimdKind,
    has_vector_form,
};
use crate::traits::Real;

use super::accessor::{MaskReader, VecReader, VecWriter};
use super::expr::{MaskExpr, MatExpr, MatSink, map, map2};
use super::funs::{Abs, Mul, Sqr};
use super::policy::{Layout, Policy, reduce_policy, select_policy};

/// Associative combiner with an identity element.
pub trait Reductor<T: Real> {
    const OPS: OpSet;

    /// Result of reducing nothing.
    fn identity(&self) -> T;

    fn combine<P: Pack<Elem = T>>(&self, a: P, b: P) -> P;

    /// Collapse one pack.
    fn horizontal<P: Pack<Elem = T>>(&self, a: P) -> T;
}

/// `a + b`, identity `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

/// Lane min, identity `+inf`. A NaN lane yields the other operand.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinOf;

/// Lane max, identity `-inf`. A NaN lane yields the other operand.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxOf;

impl<T: Real> Reductor<T> for Sum {
    const OPS: OpSet = OpSet::ARITH;

    #[inline]
    fn identity(&self) -> T {
        T::zero()
    }

    #[inline(always)]
    fn combine<P: Pack<Elem = T>>(&self, a: P, b: P) -> P {
        a + b
    }

    #[inline(always)]
    fn horizontal<P: Pack<Elem = T>>(&self, a: P) -> T {
        a.hsum()
    }
}

impl<T: Real> Reductor<T> for MinOf {
    const OPS: OpSet = OpSet::MINMAX;

    #[inline]
    fn identity(&self) -> T {
        T::infinity()
    }

    #[inline(always)]
    fn combine<P: Pack<Elem = T>>(&self, a: P, b: P) -> P {
        a.min(b)
    }

    #[inline(always)]
    fn horizontal<P: Pack<Elem = T>>(&self, a: P) -> T {
        a.hmin()
    }
}

impl<T: Real> Reductor<T> for MaxOf {
    const OPS: OpSet = OpSet::MINMAX;

    #[inline]
    fn identity(&self) -> T {
        T::neg_infinity()
    }

    #[inline(always)]
    fn combine<P: Pack<Elem = T>>(&self, a: P, b: P) -> P {
        a.max(b)
    }

    #[inline(always)]
    fn horizontal<P: Pack<Elem = T>>(&self, a: P) -> T {
        a.hmax()
    }
}

/// Fold `n` elements of `src` into `acc`.
///
/// # Safety
///
/// `src` must cover `n` elements.
#[inline(always)]
unsafe fn fold_run<P, R, Red>(red: &Red, src: &R, n: usize, acc: P::Elem) -> P::Elem
where
    P: Pack,
    R: VecReader<Elem = P::Elem>,
    Red: Reductor<P::Elem>,
{
    let w = P::WIDTH;
    let mut i = 0;
    let mut total = Single::splat(acc);
    unsafe {
        if w > 1 && n >= w {
            let id = P::splat(red.identity());
            let (mut a0, mut a1) = (id, id);
            while i + 2 * w <= n {
                a0 = red.combine(a0, src.read::<P>(i));
                a1 = red.combine(a1, src.read::<P>(i + w));
                i += 2 * w;
            }
            if i + w <= n {
                a0 = red.combine(a0, src.read::<P>(i));
                i += w;
            }
            let part = red.horizontal(red.combine(a0, a1));
            total = red.combine(total, Single::splat(part));
        }
        while i < n {
            total = red.combine(total, src.read::<Single<P::Elem>>(i));
            i += 1;
        }
    }
    total.to_scalar()
}

fn reduce_with<P, E, Red>(red: &Red, expr: &E, policy: Policy) -> E::Elem
where
    P: Pack<Elem = E::Elem>,
    E: MatExpr,
    Red: Reductor<E::Elem>,
{
    let (nrows, ncols) = (expr.nrows(), expr.ncols());
    let mut acc = red.identity();
    if nrows == 0 || ncols == 0 {
        return acc;
    }
    // SAFETY: readers built from `expr` cover its own shape.
    unsafe {
        if policy.is_linear() {
            acc = fold_run::<P, _, _>(red, &expr.linear(), nrows * ncols, acc);
        } else {
            for j in 0..ncols {
                acc = fold_run::<P, _, _>(red, &expr.column(j), nrows, acc);
            }
        }
    }
    acc
}

/// Fold `expr` with `red`, or the shape mismatch between its operands.
pub fn try_reduce<Red, E>(red: Red, expr: E) -> Result<E::Elem, DimensionMismatch>
where
    E: MatExpr,
    E::Elem: Element,
    Red: Reductor<E::Elem>,
{
    expr.check_dims()?;
    let policy = const { reduce_policy::<E, DefaultKind>(Red::OPS) };
    #[cfg(feature = "tracing")]
    tracing::trace!(?policy, rows = expr.nrows(), cols = expr.ncols(), "reduce");
    Ok(if policy.is_simd() {
        reduce_with::<PackOf<E::Elem, DefaultKind>, E, Red>(&red, &expr, policy)
    } else {
        reduce_with::<Single<E::Elem>, E, Red>(&red, &expr, policy)
    })
}

/// Fold `expr` with `red`. Panics if the operands' shapes differ.
pub fn reduce<Red, E>(red: Red, expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
    Red: Reductor<E::Elem>,
{
    match try_reduce(red, expr) {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    }
}

/// Same as [`reduce`] with pack kind `K` and policy `policy`, for comparing
/// traversal strategies.
pub fn reduce_in<K, Red, E>(red: Red, expr: E, policy: Policy) -> E::Elem
where
    K: SimdKind,
    E: MatExpr,
    E::Elem: PackElement<K>,
    Red: Reductor<E::Elem>,
{
    if let Err(e) = expr.check_dims() {
        panic!("{e}");
    }
    if policy.is_simd() {
        reduce_with::<PackOf<E::Elem, K>, E, Red>(&red, &expr, policy)
    } else {
        reduce_with::<Single<E::Elem>, E, Red>(&red, &expr, policy)
    }
}

/// Sum of all elements. `0` when empty.
pub fn sum<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    reduce(Sum, expr)
}

/// Smallest element. `+inf` when empty.
///
/// NaN is not propagated. Lane min returns its second operand when either is
/// NaN, so a NaN element discards the running minimum it is combined with and
/// the result is the minimum of a subset of the elements. Check with
/// [`any_of`] over [`IsNan`](super::funs::IsNan) first when the input may
/// hold NaN.
pub fn minimum<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    reduce(MinOf, expr)
}

/// Largest element. `-inf` when empty.
///
/// NaN is not propagated; see [`minimum`].
pub fn maximum<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    reduce(MaxOf, expr)
}

/// Sum of elementwise products. Panics if the shapes differ.
pub fn dot<A, B>(a: A, b: B) -> A::Elem
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: Element,
{
    reduce(Sum, map2(Mul, a, b))
}

/// Arithmetic mean. NaN when empty.
pub fn mean<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    let n = expr.nrows() * expr.ncols();
    let s = sum(expr);
    match <E::Elem as num_traits::NumCast>::from(n) {
        Some(count) if n > 0 => s / count,
        _ => E::Elem::nan(),
    }
}

/// Sum of absolute values (L1 norm).
pub fn sum_abs<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    reduce(Sum, map(Abs, expr))
}

/// Sum of squares.
pub fn sum_sqr<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    reduce(Sum, map(Sqr, expr))
}

/// Euclidean (Frobenius) norm.
pub fn norm_l2<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    sum_sqr(expr).sqrt()
}

/// Largest absolute value. `0` when empty.
pub fn norm_linf<E>(expr: E) -> E::Elem
where
    E: MatExpr,
    E::Elem: Element,
{
    if expr.nrows() == 0 || expr.ncols() == 0 {
        return E::Elem::zero();
    }
    reduce(MaxOf, map(Abs, expr))
}

// ── Column-wise ─────────────────────────────────────────────────────

/// Reduce each column of `expr` into the matching element of the `1 x ncols`
/// destination, or the shape mismatch.
pub fn try_reduce_cols<Red, E, D>(red: Red, expr: E, dst: &mut D) -> Result<(), DimensionMismatch>
where
    E: MatExpr,
    E::Elem: Element,
    D: MatSink<Elem = E::Elem>,
    Red: Reductor<E::Elem>,
{
    expr.check_dims()?;
    let (nrows, ncols) = (expr.nrows(), expr.ncols());
    let got = (dst.nrows(), dst.ncols());
    if got != (1, ncols) {
        return Err(DimensionMismatch { expected: (1, ncols), got });
    }
    let vector = const {
        let width = <PackOf<E::Elem, DefaultKind> as Pack>::WIDTH;
        let p = select_policy(
            has_vector_form::<E::Elem, DefaultKind>(E::OPS.union(Red::OPS)),
            Layout { linear: false, percol: E::LAYOUT.percol },
            E::ROWS,
            None,
            width,
        );
        p.is_simd()
    };
    let mut out = dst.linear_mut();
    for j in 0..ncols {
        // SAFETY: column `j` has `nrows` elements; `out` has `ncols`.
        unsafe {
            let v = if vector {
                fold_run::<PackOf<E::Elem, DefaultKind>, _, _>(&red, &expr.column(j), nrows, red.identity())
            } else {
                fold_run::<Single<E::Elem>, _, _>(&red, &expr.column(j), nrows, red.identity())
            };
            out.write(j, Single::splat(v));
        }
    }
    Ok(())
}

/// Column-wise [`reduce`]. Panics on a shape mismatch.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::eval::reduce::Sum;
/// use packmat::matrix::aliases::RowVector;
///
/// let a = Matrix::new([[1.0_f64, 2.0], [3.0, 4.0], [5.0, 6.0]]);
/// let mut s: RowVector<f64, 2> = Matrix::zeros();
/// eval::reduce_cols(Sum, &a, &mut s);
/// assert_eq!(s.as_slice(), &[9.0, 12.0]);
/// ```
pub fn reduce_cols<Red, E, D>(red: Red, expr: E, dst: &mut D)
where
    E: MatExpr,
    E::Elem: Element,
    D: MatSink<Elem = E::Elem>,
    Red: Reductor<E::Elem>,
{
    if let Err(e) = try_reduce_cols(red, expr, dst) {
        panic!("{e}");
    }
}

// ── Row-wise ────────────────────────────────────────────────────────

/// `acc[i] = red(acc[i], src[i])` over `n` elements.
///
/// # Safety
///
/// `src` and `acc` must cover `n` elements.
#[inline(always)]
unsafe fn combine_run<P, R, W, Red>(red: &Red, src: &R, acc: &mut W, n: usize)
where
    P: Pack,
    R: VecReader<Elem = P::Elem>,
    W: VecWriter<Elem = P::Elem>,
    Red: Reductor<P::Elem>,
{
    let w = P::WIDTH;
    let mut i = 0;
    unsafe {
        if w > 1 {
            while i + w <= n {
                let v = red.combine(acc.read::<P>(i), src.read::<P>(i));
                acc.write(i, v);
                i += w;
            }
        }
        while i < n {
            let v = red.combine(acc.read::<Single<P::Elem>>(i), src.read::<Single<P::Elem>>(i));
            acc.write(i, v);
            i += 1;
        }
    }
}

/// Reduce each row of `expr` into the matching element of the `nrows x 1`
/// destination, or the shape mismatch.
///
/// Columns are folded in order into the destination, so every element is a
/// left-to-right fold of its row and the vector path matches the scalar one
/// exactly.
pub fn try_reduce_rows<Red, E, D>(red: Red, expr: E, dst: &mut D) -> Result<(), DimensionMismatch>
where
    E: MatExpr,
    E::Elem: Element,
    D: MatSink<Elem = E::Elem>,
    Red: Reductor<E::Elem>,
{
    expr.check_dims()?;
    let (nrows, ncols) = (expr.nrows(), expr.ncols());
    let got = (dst.nrows(), dst.ncols());
    if got != (nrows, 1) {
        return Err(DimensionMismatch { expected: (nrows, 1), got });
    }
    let vector = const {
        let width = <PackOf<E::Elem, DefaultKind> as Pack>::WIDTH;
        let p = select_policy(
            has_vector_form::<E::Elem, DefaultKind>(E::OPS.union(Red::OPS)),
            Layout { linear: false, percol: E::LAYOUT.percol && D::LAYOUT.percol },
            E::ROWS,
            None,
            width,
        );
        p.is_simd()
    };
    #[cfg(feature = "tracing")]
    tracing::trace!(vector, rows = nrows, cols = ncols, "reduce rows");
    let mut out = dst.column_mut(0);
    // SAFETY: `out` and every column of `expr` have `nrows` elements.
    unsafe {
        for i in 0..nrows {
            out.write(i, Single::splat(red.identity()));
        }
        for j in 0..ncols {
            let col = expr.column(j);
            if vector {
                combine_run::<PackOf<E::Elem, DefaultKind>, _, _, _>(&red, &col, &mut out, nrows);
            } else {
                combine_run::<Single<E::Elem>, _, _, _>(&red, &col, &mut out, nrows);
            }
        }
    }
    Ok(())
}

/// Row-wise [`reduce`]. Panics on a shape mismatch.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::eval::reduce::Sum;
/// use packmat::matrix::aliases::ColumnVector;
///
/// let a = Matrix::new([[1.0_f64, 2.0], [3.0, 4.0], [5.0, 6.0]]);
/// let mut s: ColumnVector<f64, 3> = Matrix::zeros();
/// eval::reduce_rows(Sum, &a, &mut s);
/// assert_eq!(s.as_slice(), &[3.0, 7.0, 11.0]);
/// ```
pub fn reduce_rows<Red, E, D>(red: Red, expr: E, dst: &mut D)
where
    E: MatExpr,
    E::Elem: Element,
    D: MatSink<Elem = E::Elem>,
    Red: Reductor<E::Elem>,
{
    if let Err(e) = try_reduce_rows(red, expr, dst) {
        panic!("{e}");
    }
}

// ── Mask reductions ─────────────────────────────────────────────────

/// Visit the masks of `expr` until `f` returns `false`.
fn scan_masks<C, F>(expr: &C, mut f: F) -> Result<(), DimensionMismatch>
where
    C: MaskExpr,
    C::Elem: Element,
    F: FnMut(MaskChunk) -> bool,
{
    expr.check_dims()?;
    let (nrows, ncols) = (expr.nrows(), expr.ncols());
    if nrows == 0 || ncols == 0 {
        return Ok(());
    }
    let policy = const {
        select_policy(
            has_vector_form::<C::Elem, DefaultKind>(C::OPS),
            C::LAYOUT,
            C::ROWS,
            C::COLS,
            <PackOf<C::Elem, DefaultKind> as Pack>::WIDTH,
        )
    };
    // SAFETY: readers built from `expr` cover its own shape.
    unsafe {
        if policy.is_linear() {
            let r = expr.linear();
            if policy.is_simd() {
                scan_run::<PackOf<C::Elem, DefaultKind>, _, _>(&r, nrows * ncols, &mut f);
            } else {
                scan_run::<Single<C::Elem>, _, _>(&r, nrows * ncols, &mut f);
            }
        } else {
            for j in 0..ncols {
                let r = expr.column(j);
                let done = if policy.is_simd() {
                    !scan_run::<PackOf<C::Elem, DefaultKind>, _, _>(&r, nrows, &mut f)
                } else {
                    !scan_run::<Single<C::Elem>, _, _>(&r, nrows, &mut f)
                };
                if done {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Truth count of one mask pack.
#[derive(Clone, Copy, Debug)]
struct MaskChunk {
    lanes: usize,
    set: usize,
}

/// Returns `false` if `f` asked to stop.
///
/// # Safety
///
/// `r` must cover `n` elements.
unsafe fn scan_run<P, R, F>(r: &R, n: usize, f: &mut F) -> bool
where
    P: Pack,
    R: MaskReader<Elem = P::Elem>,
    F: FnMut(MaskChunk) -> bool,
{
    let w = P::WIDTH;
    let mut i = 0;
    unsafe {
        while i + w <= n {
            let m = r.read_mask::<P>(i);
            if !f(MaskChunk { lanes: w, set: m.count() }) {
                return false;
            }
            i += w;
        }
        while i < n {
            let m = r.read_mask::<Single<P::Elem>>(i);
            if !f(MaskChunk { lanes: 1, set: m.count() }) {
                return false;
            }
            i += 1;
        }
    }
    true
}

/// Whether every element satisfies the mask expression. `true` when empty.
///
/// Stops at the first pack containing a false lane.
pub fn all_of<C>(expr: C) -> bool
where
    C: MaskExpr,
    C::Elem: Element,
{
    let mut all = true;
    let res = scan_masks(&expr, |c| {
        all = c.set == c.lanes;
        all
    });
    match res {
        Ok(()) => all,
        Err(e) => panic!("{e}"),
    }
}

/// Whether any element satisfies the mask expression. `false` when empty.
pub fn any_of<C>(expr: C) -> bool
where
    C: MaskExpr,
    C::Elem: Element,
{
    let mut any = false;
    let res = scan_masks(&expr, |c| {
        any = c.set > 0;
        !any
    });
    match res {
        Ok(()) => any,
        Err(e) => panic!("{e}"),
    }
}

/// Number of elements satisfying the mask expression.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::eval::funs::Lt;
///
/// let a = Matrix::new([[1.0_f32, -2.0, 3.0], [-4.0, 5.0, -6.0]]);
/// let zero = eval::constant(0.0, 2, 3);
/// assert_eq!(eval::count_of(eval::test2(Lt, &a, zero)), 3);
/// assert!(eval::any_of(eval::test2(Lt, &a, zero)));
/// assert!(!eval::all_of(eval::test2(Lt, &a, zero)));
/// ```
pub fn count_of<C>(expr: C) -> usize
where
    C: MaskExpr,
    C::Elem: Element,
{
    let mut count = 0;
    let res = scan_masks(&expr, |c| {
        count += c.set;
        true
    });
    match res {
        Ok(()) => count,
        Err(e) => panic!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::expr::{constant, test, test2};
    use crate::eval::funs::{Ge, IsFinite, IsNan};
    use crate::matrix::Matrix;
    use crate::simd::{Portable, ScalarKind};

    #[cfg(feature = "alloc")]
    use crate::DynMatrix;

    #[test]
    fn seven_element_sum() {
        let a = Matrix::new([[1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]]);
        // width-4 pack: first pack sums to 10, tail adds 5 + 6 + 7
        assert_eq!(reduce_in::<Portable, _, _>(Sum, &a, Policy::SimdLinear), 28.0);
        assert_eq!(reduce_in::<ScalarKind, _, _>(Sum, &a, Policy::ScalarLinear), 28.0);
        assert_eq!(sum(&a), 28.0);
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn policies_agree_within_tolerance() {
        for n in [0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 100, 257] {
            let a = DynMatrix::from_fn(n, 3, |i, j| ((i * 7 + j * 13) % 17) as f32 * 0.37 - 2.0);
            let scalar = reduce_in::<ScalarKind, _, _>(Sum, &a, Policy::ScalarLinear);
            let linear = reduce_in::<DefaultKind, _, _>(Sum, &a, Policy::SimdLinear);
            let percol = reduce_in::<DefaultKind, _, _>(Sum, &a, Policy::SimdPercol);
            let mag = sum_abs(&a).max(1.0);
            let width = <PackOf<f32, DefaultKind> as Pack>::WIDTH as f32;
            let tol = 4.0 * width * f32::EPSILON * mag;
            assert!((scalar - linear).abs() <= tol, "n = {n}");
            assert!((scalar - percol).abs() <= tol, "n = {n}");

            // min and max are exact under any order
            let lo = reduce_in::<ScalarKind, _, _>(MinOf, &a, Policy::ScalarLinear);
            let hi = reduce_in::<ScalarKind, _, _>(MaxOf, &a, Policy::ScalarPercol);
            assert_eq!(lo, minimum(&a), "n = {n}");
            assert_eq!(hi, maximum(&a), "n = {n}");
        }
    }

    #[test]
    fn empty_identities() {
        let e: Matrix<f64, 0, 3> = Matrix::zeros();
        assert_eq!(sum(&e), 0.0);
        assert_eq!(minimum(&e), f64::INFINITY);
        assert_eq!(maximum(&e), f64::NEG_INFINITY);
        assert!(mean(&e).is_nan());
        assert_eq!(norm_linf(&e), 0.0);
        assert_eq!(norm_l2(&e), 0.0);
        assert!(all_of(test(IsFinite, &e)));
        assert!(!any_of(test(IsFinite, &e)));
        assert_eq!(count_of(test(IsFinite, &e)), 0);
    }

    #[test]
    fn norms() {
        let a = Matrix::new([[3.0_f64, -4.0], [0.0, 12.0]]);
        assert_eq!(sum_abs(&a), 19.0);
        assert_eq!(sum_sqr(&a), 169.0);
        assert_eq!(norm_l2(&a), 13.0);
        assert_eq!(norm_linf(&a), 12.0);
        assert_eq!(mean(&a), 2.75);
        assert_eq!(dot(&a, &a), 169.0);
    }

    #[test]
    fn column_sums() {
        let a: Matrix<f32, 9, 3> = Matrix::from_fn(|i, j| (i + 10 * j) as f32);
        let mut s: Matrix<f32, 1, 3> = Matrix::zeros();
        reduce_cols(Sum, &a, &mut s);
        assert_eq!(s.as_slice(), &[36.0, 126.0, 216.0]);
        let mut m: Matrix<f32, 1, 3> = Matrix::zeros();
        reduce_cols(MinOf, &a, &mut m);
        assert_eq!(m.as_slice(), &[0.0, 10.0, 20.0]);

        // strided columns: row i of `a` becomes column i
        let mut t: Matrix<f32, 1, 9> = Matrix::zeros();
        reduce_cols(MaxOf, a.transpose_view(), &mut t);
        assert_eq!(t[(0, 4)], 24.0);
    }

    #[test]
    fn column_shape_mismatch() {
        let a: Matrix<f32, 2, 3> = Matrix::zeros();
        let mut bad: Matrix<f32, 1, 2> = Matrix::zeros();
        let err = try_reduce_cols(Sum, &a, &mut bad).unwrap_err();
        assert_eq!(err, DimensionMismatch { expected: (1, 3), got: (1, 2) });
    }

    #[test]
    fn row_sums() {
        let a: Matrix<f32, 9, 3> = Matrix::from_fn(|i, j| (i + 10 * j) as f32);
        let mut s: Matrix<f32, 9, 1> = Matrix::zeros();
        reduce_rows(Sum, &a, &mut s);
        for i in 0..9 {
            assert_eq!(s[(i, 0)], (3 * i + 30) as f32);
        }
        let mut m: Matrix<f32, 9, 1> = Matrix::zeros();
        reduce_rows(MaxOf, &a, &mut m);
        assert_eq!(m[(4, 0)], 24.0);

        // strided source: column j of `a` becomes row j
        let mut t: Matrix<f32, 3, 1> = Matrix::zeros();
        reduce_rows(MinOf, a.transpose_view(), &mut t);
        assert_eq!(t.as_slice(), &[0.0, 10.0, 20.0]);
    }

    #[test]
    fn row_fold_is_left_to_right() {
        // values whose sum depends on order
        let a: Matrix<f32, 13, 4> =
            Matrix::from_fn(|i, j| [1.0e8, 1.0, -1.0e8, 0.3][j] * (1.0 + i as f32 * 0.01));
        let mut s: Matrix<f32, 13, 1> = Matrix::zeros();
        reduce_rows(Sum, &a, &mut s);
        for i in 0..13 {
            let expected = (0..4).fold(0.0_f32, |acc, j| acc + a[(i, j)]);
            assert_eq!(s[(i, 0)].to_bits(), expected.to_bits(), "row {i}");
        }
    }

    #[test]
    fn row_reduction_edges() {
        let a: Matrix<f64, 2, 3> = Matrix::zeros();
        let mut bad: Matrix<f64, 3, 1> = Matrix::zeros();
        let err = try_reduce_rows(Sum, &a, &mut bad).unwrap_err();
        assert_eq!(err, DimensionMismatch { expected: (2, 1), got: (3, 1) });

        // no columns: identity in every row
        let e: Matrix<f64, 4, 0> = Matrix::zeros();
        let mut lo: Matrix<f64, 4, 1> = Matrix::fill(7.0);
        reduce_rows(MinOf, &e, &mut lo);
        assert!(lo.iter().all(|&x| x == f64::INFINITY));
    }

    #[test]
    fn nan_discards_running_minimum() {
        let a = Matrix::new([[5.0_f64, f64::NAN, 6.0]]);
        assert_eq!(minimum(&a), 6.0);
        assert_eq!(maximum(&a), 6.0);
        assert!(any_of(test(IsNan, &a)));
        let b = Matrix::new([[f64::NAN, 5.0, 6.0]]);
        assert_eq!(minimum(&b), 5.0);
    }

    #[test]
    fn mask_reductions() {
        let mut data = [1.0_f64; 19];
        data[17] = f64::NAN;
        let a = Matrix::<f64, 19, 1>::from_slice(&data);
        assert!(!all_of(test(IsFinite, &a)));
        assert!(any_of(test(IsNan, &a)));
        assert_eq!(count_of(test(IsNan, &a)), 1);
        assert_eq!(count_of(test2(Ge, &a, constant(1.0, 19, 1))), 18);
    }

    #[test]
    #[cfg(feature = "alloc")]
    #[should_panic(expected = "dimension mismatch")]
    fn dot_shape_mismatch() {
        let a = DynMatrix::zeros(2, 2, 0.0_f32);
        let b = DynMatrix::zeros(4, 1, 0.0_f32);
        let _ = dot(&a, &b);
    }
}
