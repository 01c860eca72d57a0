//! Kernel functions applied lane-wise by the evaluator.
//!
//! Each function is a tag type implementing [`Fun1`], [`Fun2`] or [`Fun3`]
//! (or [`Pred1`] / [`Pred2`] for predicates). The same `call` body runs for
//! every pack width, including the width-1 pack of scalar paths and tails,
//! so there is no separate remainder kernel. `OPS` names the operation
//! classes a kernel needs, which decides whether a vector policy is allowed.
//!
//! Transcendental functions have no vector form; they run lane by lane
//! through [`Pack::map_lanes`] and report [`OpSet::EMULATED`].

use num_traits::Float;

use crate::simd::{OpSet, Pack};
use crate::traits::Real;

/// Unary kernel.
pub trait Fun1<T: Real> {
    const OPS: OpSet;
    fn call<P: Pack<Elem = T>>(&self, a: P) -> P;
}

/// Binary kernel.
pub trait Fun2<T: Real> {
    const OPS: OpSet;
    fn call<P: Pack<Elem = T>>(&self, a: P, b: P) -> P;
}

/// Ternary kernel.
pub trait Fun3<T: Real> {
    const OPS: OpSet;
    fn call<P: Pack<Elem = T>>(&self, a: P, b: P, c: P) -> P;
}

/// Unary predicate.
pub trait Pred1<T: Real> {
    const OPS: OpSet;
    fn test<P: Pack<Elem = T>>(&self, a: P) -> P::Mask;
}

/// Binary predicate.
pub trait Pred2<T: Real> {
    const OPS: OpSet;
    fn test<P: Pack<Elem = T>>(&self, a: P, b: P) -> P::Mask;
}

macro_rules! fun1 {
    ($($(#[$doc:meta])* $name:ident, $ops:ident, |$a:ident| $body:expr;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<T: Real> Fun1<T> for $name {
            const OPS: OpSet = OpSet::$ops;

            #[inline(always)]
            fn call<P: Pack<Elem = T>>(&self, $a: P) -> P {
                $body
            }
        }
    )*};
}

macro_rules! fun2 {
    ($($(#[$doc:meta])* $name:ident, $ops:ident, |$a:ident, $b:ident| $body:expr;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<T: Real> Fun2<T> for $name {
            const OPS: OpSet = OpSet::$ops;

            #[inline(always)]
            fn call<P: Pack<Elem = T>>(&self, $a: P, $b: P) -> P {
                $body
            }
        }
    )*};
}

macro_rules! pred {
    ($($(#[$doc:meta])* $name:ident, $ops:ident, |$a:ident| $body:expr;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<T: Real> Pred1<T> for $name {
            const OPS: OpSet = OpSet::$ops;

            #[inline(always)]
            fn test<P: Pack<Elem = T>>(&self, $a: P) -> P::Mask {
                $body
            }
        }
    )*};
}

macro_rules! pred2 {
    ($($(#[$doc:meta])* $name:ident, |$a:ident, $b:ident| $body:expr;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<T: Real> Pred2<T> for $name {
            const OPS: OpSet = OpSet::COMPARE;

            #[inline(always)]
            fn test<P: Pack<Elem = T>>(&self, $a: P, $b: P) -> P::Mask {
                $body
            }
        }
    )*};
}

// ── Arithmetic ──────────────────────────────────────────────────────

fun1! {
    /// `-a`
    Neg, ARITH, |a| -a;
    /// `|a|`
    Abs, ARITH, |a| a.abs();
    /// `a * a`
    Sqr, ARITH, |a| a.sqr();
    /// `a * a * a`
    Cube, ARITH, |a| a.cube();
    /// Exact `1 / a`.
    Rcp, ARITH, |a| a.rcp();
    Sqrt, SQRT, |a| a.sqrt();
    /// Exact `1 / sqrt(a)`.
    Rsqrt, SQRT, |a| a.rsqrt();
    /// Fast reciprocal. Within 1.5 * 2^-12 relative error where a hardware
    /// estimate is used, exact otherwise.
    ApproxRcp, APPROX, |a| a.approx_rcp();
    /// Fast reciprocal square root, same accuracy as [`ApproxRcp`].
    ApproxRsqrt, APPROX, |a| a.approx_rsqrt();
    Floor, ROUND, |a| a.floor();
    Ceil, ROUND, |a| a.ceil();
    /// Round to nearest, ties to even.
    Round, ROUND, |a| a.round();
    Trunc, ROUND, |a| a.trunc();
}

fun2! {
    Add, ARITH, |a, b| a + b;
    Sub, ARITH, |a, b| a - b;
    Mul, ARITH, |a, b| a * b;
    Div, ARITH, |a, b| a / b;
    /// `if a < b { a } else { b }`
    Min, MINMAX, |a, b| a.min(b);
    /// `if a > b { a } else { b }`
    Max, MINMAX, |a, b| a.max(b);
}

/// `a * b + c`, rounded twice.
#[derive(Clone, Copy, Debug, Default)]
pub struct MulAdd;

impl<T: Real> Fun3<T> for MulAdd {
    const OPS: OpSet = OpSet::ARITH;

    #[inline(always)]
    fn call<P: Pack<Elem = T>>(&self, a: P, b: P, c: P) -> P {
        a.mul_add(b, c)
    }
}

/// `a` clamped to `[lo, hi]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clamp;

impl<T: Real> Fun3<T> for Clamp {
    const OPS: OpSet = OpSet::MINMAX;

    #[inline(always)]
    fn call<P: Pack<Elem = T>>(&self, a: P, lo: P, hi: P) -> P {
        a.clamp(lo, hi)
    }
}

/// Multiply by a constant.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scale<T>(pub T);

impl<T: Real> Fun1<T> for Scale<T> {
    const OPS: OpSet = OpSet::ARITH;

    #[inline(always)]
    fn call<P: Pack<Elem = T>>(&self, a: P) -> P {
        a * P::splat(self.0)
    }
}

/// Add a constant.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offset<T>(pub T);

impl<T: Real> Fun1<T> for Offset<T> {
    const OPS: OpSet = OpSet::ARITH;

    #[inline(always)]
    fn call<P: Pack<Elem = T>>(&self, a: P) -> P {
        a + P::splat(self.0)
    }
}

// ── Emulated ────────────────────────────────────────────────────────

fun1! {
    Exp, EMULATED, |a| a.map_lanes(<P::Elem as Float>::exp);
    /// Natural logarithm.
    Ln, EMULATED, |a| a.map_lanes(<P::Elem as Float>::ln);
    Log2, EMULATED, |a| a.map_lanes(<P::Elem as Float>::log2);
    Log10, EMULATED, |a| a.map_lanes(<P::Elem as Float>::log10);
    Sin, EMULATED, |a| a.map_lanes(<P::Elem as Float>::sin);
    Cos, EMULATED, |a| a.map_lanes(<P::Elem as Float>::cos);
    Tan, EMULATED, |a| a.map_lanes(<P::Elem as Float>::tan);
    Tanh, EMULATED, |a| a.map_lanes(<P::Elem as Float>::tanh);
    Atan, EMULATED, |a| a.map_lanes(<P::Elem as Float>::atan);
    Cbrt, EMULATED, |a| a.map_lanes(<P::Elem as Float>::cbrt);
}

fun2! {
    /// `a` raised to `b`.
    Pow, EMULATED, |a, b| a.zip_lanes(b, <P::Elem as Float>::powf);
    /// `sqrt(a^2 + b^2)` without intermediate overflow.
    Hypot, EMULATED, |a, b| a.zip_lanes(b, <P::Elem as Float>::hypot);
    /// Four-quadrant arctangent of `a / b`.
    Atan2, EMULATED, |a, b| a.zip_lanes(b, <P::Elem as Float>::atan2);
}

/// Arbitrary scalar closure, applied lane by lane.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::eval::funs::ScalarFn;
///
/// let a = Matrix::new([[1.0_f64, 2.0], [3.0, 4.0]]);
/// let mut b: Matrix<f64, 2, 2> = Matrix::zeros();
/// eval::evaluate(eval::map(ScalarFn(|x: f64| x * 10.0 + 1.0), &a), &mut b);
/// assert_eq!(b[(1, 0)], 31.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ScalarFn<F>(pub F);

impl<T: Real, F: Fn(T) -> T> Fun1<T> for ScalarFn<F> {
    const OPS: OpSet = OpSet::EMULATED;

    #[inline]
    fn call<P: Pack<Elem = T>>(&self, a: P) -> P {
        a.map_lanes(&self.0)
    }
}

/// Arbitrary binary scalar closure, applied lane by lane.
#[derive(Clone, Copy, Debug)]
pub struct ScalarFn2<F>(pub F);

impl<T: Real, F: Fn(T, T) -> T> Fun2<T> for ScalarFn2<F> {
    const OPS: OpSet = OpSet::EMULATED;

    #[inline]
    fn call<P: Pack<Elem = T>>(&self, a: P, b: P) -> P {
        a.zip_lanes(b, &self.0)
    }
}

// ── Predicates ──────────────────────────────────────────────────────

pred! {
    IsNan, CLASSIFY, |a| a.is_nan();
    IsInf, CLASSIFY, |a| a.is_inf();
    IsFinite, CLASSIFY, |a| a.is_finite();
    /// Sign bit set, including `-0.0` and negative NaNs.
    IsNeg, CLASSIFY, |a| a.is_neg();
}

pred2! {
    Eq, |a, b| a.cmp_eq(b);
    /// True for unordered operands.
    Ne, |a, b| a.cmp_ne(b);
    Lt, |a, b| a.cmp_lt(b);
    Le, |a, b| a.cmp_le(b);
    Gt, |a, b| a.cmp_gt(b);
    Ge, |a, b| a.cmp_ge(b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{ArrayPack, MaskPack, Single};

    type P4 = ArrayPack<f32, 4>;

    fn p(v: [f32; 4]) -> P4 {
        P4::from_array(v)
    }

    #[test]
    fn arithmetic_tags() {
        let a = p([1.0, -2.0, 3.0, -4.0]);
        let b = p([2.0, 2.0, 2.0, 2.0]);
        assert_eq!(Add.call(a, b).to_array(), [3.0, 0.0, 5.0, -2.0]);
        assert_eq!(Sub.call(a, b).to_array(), [-1.0, -4.0, 1.0, -6.0]);
        assert_eq!(Mul.call(a, b).to_array(), [2.0, -4.0, 6.0, -8.0]);
        assert_eq!(Div.call(a, b).to_array(), [0.5, -1.0, 1.5, -2.0]);
        assert_eq!(Min.call(a, b).to_array(), [1.0, -2.0, 2.0, -4.0]);
        assert_eq!(Max.call(a, b).to_array(), [2.0, 2.0, 3.0, 2.0]);
        assert_eq!(Abs.call(a).to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Cube.call(a).to_array(), [1.0, -8.0, 27.0, -64.0]);
        assert_eq!(Scale(0.5).call(a).to_array(), [0.5, -1.0, 1.5, -2.0]);
        assert_eq!(Offset(1.0).call(a).to_array(), [2.0, -1.0, 4.0, -3.0]);
        assert_eq!(MulAdd.call(a, b, b).to_array(), [4.0, -2.0, 8.0, -6.0]);
        assert_eq!(Clamp.call(a, p([-1.0; 4]), p([2.0; 4])).to_array(), [1.0, -1.0, 2.0, -1.0]);
    }

    #[test]
    fn rounding_tags() {
        let a = p([0.5, 1.5, -2.5, 2.7]);
        assert_eq!(Round.call(a).to_array(), [0.0, 2.0, -2.0, 3.0]);
        assert_eq!(Floor.call(a).to_array(), [0.0, 1.0, -3.0, 2.0]);
        assert_eq!(Ceil.call(a).to_array(), [1.0, 2.0, -2.0, 3.0]);
        assert_eq!(Trunc.call(a).to_array(), [0.0, 1.0, -2.0, 2.0]);
    }

    #[test]
    fn emulated_matches_scalar() {
        let xs = [0.25_f64, 1.0, 2.5, 7.0];
        let a = ArrayPack::<f64, 4>::from_array(xs);
        let e = Exp.call(a).to_array();
        let l = Ln.call(a).to_array();
        let h = Hypot.call(a, a).to_array();
        for (i, &x) in xs.iter().enumerate() {
            assert_eq!(e[i], x.exp());
            assert_eq!(l[i], x.ln());
            assert_eq!(h[i], x.hypot(x));
            let s: Single<f64> = Sin.call(Single::from_array([x]));
            assert_eq!(s.to_scalar(), x.sin());
        }
    }

    #[test]
    fn scalar_closure() {
        let a = p([1.0, 2.0, 3.0, 4.0]);
        let f = ScalarFn(|x: f32| 2.0 * x - 1.0);
        assert_eq!(f.call(a).to_array(), [1.0, 3.0, 5.0, 7.0]);
        let g = ScalarFn2(|x: f32, y: f32| x * 10.0 + y);
        assert_eq!(g.call(a, a).to_array(), [11.0, 22.0, 33.0, 44.0]);
    }

    #[test]
    fn predicates() {
        let a = p([f32::NAN, f32::INFINITY, -1.0, 0.0]);
        let b = p([0.0; 4]);
        let lanes = |m: <P4 as Pack>::Mask| [m.lane(0), m.lane(1), m.lane(2), m.lane(3)];
        assert_eq!(lanes(IsNan.test(a)), [true, false, false, false]);
        assert_eq!(lanes(IsInf.test(a)), [false, true, false, false]);
        assert_eq!(lanes(IsFinite.test(a)), [false, false, true, true]);
        assert_eq!(lanes(IsNeg.test(a)), [false, false, true, false]);
        assert_eq!(lanes(Lt.test(a, b)), [false, false, true, false]);
        assert_eq!(lanes(Ge.test(a, b)), [false, true, false, true]);
        assert_eq!(lanes(Ne.test(a, b)), [true, true, true, false]);
        assert_eq!(lanes(Eq.test(a, b)), [false, false, false, true]);
    }

    #[test]
    fn op_classes() {
        assert_eq!(<Add as Fun2<f32>>::OPS, OpSet::ARITH);
        assert_eq!(<Sqrt as Fun1<f64>>::OPS, OpSet::SQRT);
        assert_eq!(<Round as Fun1<f32>>::OPS, OpSet::ROUND);
        assert_eq!(<Exp as Fun1<f32>>::OPS, OpSet::EMULATED);
        assert_eq!(<Lt as Pred2<f32>>::OPS, OpSet::COMPARE);
    }
}
