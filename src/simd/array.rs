//! Array-backed packs.
//!
//! `ArrayPack<T, W>` stores `W` lanes in a plain array and implements every
//! pack operation lane by lane with the scalar definitions from [`Real`].
//! `Single<T>` (`W = 1`) is the pack every scalar path runs on, so scalar
//! evaluation and the tail of vector evaluation share one code path.

use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Sub,
    SubAssign,
};

use num_traits::{Float, Zero};

use super::{MaskPack, Pack};
use crate::traits::Real;

/// `W` lanes of `T` in an array. `W` must be a power of two.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct ArrayPack<T, const W: usize> {
    lanes: [T; W],
}

/// Width-1 pack used by scalar policies and vector tails.
pub type Single<T> = ArrayPack<T, 1>;

/// Truth lanes for [`ArrayPack`], one all-ones or all-zeros bit pattern per
/// lane.
#[repr(C)]
pub struct ArrayMask<T: Real, const W: usize> {
    bits: [T::Bits; W],
}

impl<T: Real, const W: usize> ArrayPack<T, W> {
    const POW2: () = assert!(W.is_power_of_two(), "pack width must be a power of two");

    #[inline]
    pub fn from_array(lanes: [T; W]) -> Self {
        let () = Self::POW2;
        Self { lanes }
    }

    #[inline]
    pub fn to_array(self) -> [T; W] {
        self.lanes
    }

    #[inline]
    fn zip(self, rhs: Self, f: impl Fn(T, T) -> T) -> Self {
        Self::from_array(core::array::from_fn(|i| f(self.lanes[i], rhs.lanes[i])))
    }

    #[inline]
    fn map(self, f: impl Fn(T) -> T) -> Self {
        Self::from_array(core::array::from_fn(|i| f(self.lanes[i])))
    }

    #[inline]
    fn test(self, f: impl Fn(T) -> bool) -> ArrayMask<T, W> {
        ArrayMask::from_fn(|i| f(self.lanes[i]))
    }

    #[inline]
    fn test2(self, rhs: Self, f: impl Fn(T, T) -> bool) -> ArrayMask<T, W> {
        ArrayMask::from_fn(|i| f(self.lanes[i], rhs.lanes[i]))
    }

    /// Pairwise tree: `x[i] = f(x[i], x[i + w/2])`, halving `w` until one
    /// lane remains.
    #[inline]
    fn fold_tree(self, f: impl Fn(T, T) -> T) -> T {
        let mut x = self.lanes;
        let mut w = W;
        while w > 1 {
            let h = w / 2;
            for i in 0..h {
                x[i] = f(x[i], x[i + h]);
            }
            w = h;
        }
        x[0]
    }
}

macro_rules! impl_array_binop {
    ($($tr:ident, $method:ident, $atr:ident, $amethod:ident, $op:tt);* $(;)?) => {
        $(
            impl<T: Real, const W: usize> $tr for ArrayPack<T, W> {
                type Output = Self;

                #[inline]
                fn $method(self, rhs: Self) -> Self {
                    self.zip(rhs, |a, b| a $op b)
                }
            }

            impl<T: Real, const W: usize> $atr for ArrayPack<T, W> {
                #[inline]
                fn $amethod(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

impl_array_binop! {
    Add, add, AddAssign, add_assign, +;
    Sub, sub, SubAssign, sub_assign, -;
    Mul, mul, MulAssign, mul_assign, *;
    Div, div, DivAssign, div_assign, /;
}

impl<T: Real, const W: usize> Neg for ArrayPack<T, W> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<T: Real, const W: usize> Pack for ArrayPack<T, W> {
    type Elem = T;
    type Mask = ArrayMask<T, W>;
    const WIDTH: usize = W;

    #[inline]
    fn splat(v: T) -> Self {
        Self::from_array([v; W])
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> T>(f: F) -> Self {
        Self::from_array(core::array::from_fn(f))
    }

    #[inline]
    fn extract(self, i: usize) -> T {
        self.lanes[i]
    }

    #[inline]
    fn to_scalar(self) -> T {
        self.lanes[0]
    }

    #[inline]
    unsafe fn load(ptr: *const T) -> Self {
        Self::from_fn(|i| unsafe { ptr.add(i).read_unaligned() })
    }

    #[inline]
    unsafe fn load_aligned(ptr: *const T) -> Self {
        Self::from_fn(|i| unsafe { ptr.add(i).read() })
    }

    #[inline]
    unsafe fn load_partial(n: usize, ptr: *const T) -> Self {
        debug_assert!(n <= W);
        Self::from_fn(|i| if i < n { unsafe { ptr.add(i).read_unaligned() } } else { T::zero() })
    }

    #[inline]
    unsafe fn store(self, ptr: *mut T) {
        for (i, &v) in self.lanes.iter().enumerate() {
            unsafe { ptr.add(i).write_unaligned(v) };
        }
    }

    #[inline]
    unsafe fn store_aligned(self, ptr: *mut T) {
        for (i, &v) in self.lanes.iter().enumerate() {
            unsafe { ptr.add(i).write(v) };
        }
    }

    #[inline]
    unsafe fn store_partial(self, n: usize, ptr: *mut T) {
        debug_assert!(n <= W);
        for (i, &v) in self.lanes.iter().take(n).enumerate() {
            unsafe { ptr.add(i).write_unaligned(v) };
        }
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        self.zip(other, T::lane_min)
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        self.zip(other, T::lane_max)
    }

    #[inline]
    fn abs(self) -> Self {
        self.map(Float::abs)
    }

    #[inline]
    fn sqrt(self) -> Self {
        self.map(Float::sqrt)
    }

    #[inline]
    fn floor(self) -> Self {
        self.map(Float::floor)
    }

    #[inline]
    fn ceil(self) -> Self {
        self.map(Float::ceil)
    }

    #[inline]
    fn round(self) -> Self {
        self.map(T::round_even)
    }

    #[inline]
    fn trunc(self) -> Self {
        self.map(Float::trunc)
    }

    #[inline]
    fn cmp_eq(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a == b)
    }

    #[inline]
    fn cmp_ne(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a != b)
    }

    #[inline]
    fn cmp_lt(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a < b)
    }

    #[inline]
    fn cmp_le(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a <= b)
    }

    #[inline]
    fn cmp_gt(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a > b)
    }

    #[inline]
    fn cmp_ge(self, other: Self) -> ArrayMask<T, W> {
        self.test2(other, |a, b| a >= b)
    }

    #[inline]
    fn is_neg(self) -> ArrayMask<T, W> {
        self.test(Float::is_sign_negative)
    }

    #[inline]
    fn is_finite(self) -> ArrayMask<T, W> {
        self.test(Float::is_finite)
    }

    #[inline]
    fn is_inf(self) -> ArrayMask<T, W> {
        self.test(Float::is_infinite)
    }

    #[inline]
    fn is_nan(self) -> ArrayMask<T, W> {
        self.test(Float::is_nan)
    }

    /// `(mask & a) | (!mask & b)` on the bit patterns.
    #[inline]
    fn select(mask: ArrayMask<T, W>, a: Self, b: Self) -> Self {
        Self::from_fn(|i| {
            let m = mask.bits[i];
            T::from_bits((m & a.lanes[i].to_bits()) | (!m & b.lanes[i].to_bits()))
        })
    }

    #[inline]
    fn hsum(self) -> T {
        self.fold_tree(|a, b| a + b)
    }

    #[inline]
    fn hmin(self) -> T {
        self.fold_tree(T::lane_min)
    }

    #[inline]
    fn hmax(self) -> T {
        self.fold_tree(T::lane_max)
    }
}

// ── ArrayMask ───────────────────────────────────────────────────────

impl<T: Real, const W: usize> ArrayMask<T, W> {
    #[inline]
    fn lane_bits(v: bool) -> T::Bits {
        if v { !T::Bits::zero() } else { T::Bits::zero() }
    }

    #[inline]
    fn zip(self, rhs: Self, f: impl Fn(T::Bits, T::Bits) -> T::Bits) -> Self {
        Self { bits: core::array::from_fn(|i| f(self.bits[i], rhs.bits[i])) }
    }
}

impl<T: Real, const W: usize> Clone for ArrayMask<T, W> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Real, const W: usize> Copy for ArrayMask<T, W> {}

impl<T: Real, const W: usize> PartialEq for ArrayMask<T, W> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T: Real, const W: usize> core::fmt::Debug for ArrayMask<T, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries((0..W).map(|i| self.lane(i))).finish()
    }
}

impl<T: Real, const W: usize> Not for ArrayMask<T, W> {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self { bits: self.bits.map(|b| !b) }
    }
}

impl<T: Real, const W: usize> BitAnd for ArrayMask<T, W> {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a & b)
    }
}

impl<T: Real, const W: usize> BitOr for ArrayMask<T, W> {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a | b)
    }
}

impl<T: Real, const W: usize> BitXor for ArrayMask<T, W> {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a ^ b)
    }
}

impl<T: Real, const W: usize> MaskPack for ArrayMask<T, W> {
    const WIDTH: usize = W;

    #[inline]
    fn all_true() -> Self {
        Self { bits: [Self::lane_bits(true); W] }
    }

    #[inline]
    fn all_false() -> Self {
        Self { bits: [Self::lane_bits(false); W] }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        Self { bits: core::array::from_fn(|i| Self::lane_bits(f(i))) }
    }

    #[inline]
    fn lane(self, i: usize) -> bool {
        self.bits[i] != T::Bits::zero()
    }

    #[inline]
    fn all(self) -> bool {
        self.bits.iter().all(|b| !b.is_zero())
    }

    #[inline]
    fn any(self) -> bool {
        self.bits.iter().any(|b| !b.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_tree_order() {
        // ((a0 + a2) + (a1 + a3)): 1e8 + 1 is lost in f32, so the grouping
        // is observable.
        let p = ArrayPack::from_array([1.0e8_f32, 1.0, -1.0e8, 1.0]);
        assert_eq!(p.hsum(), 2.0);
        let left_to_right = ((1.0e8_f32 + 1.0) + -1.0e8) + 1.0;
        assert_eq!(left_to_right, 1.0);
    }

    #[test]
    fn mask_bit_patterns() {
        let m = ArrayMask::<f32, 4>::from_bools(&[true, false, true, false]);
        assert_eq!(m.bits, [u32::MAX, 0, u32::MAX, 0]);
        let n = !m;
        assert_eq!(n.bits, [0, u32::MAX, 0, u32::MAX]);
        assert!(!m.all() && m.any());
        assert!(ArrayMask::<f64, 2>::all_true().all());
        assert!(ArrayMask::<f64, 2>::all_false().none());
    }

    #[test]
    fn select_preserves_bits() {
        let m = ArrayMask::<f64, 2>::from_bools(&[true, false]);
        let a = ArrayPack::from_array([-0.0_f64, 1.0]);
        let b = ArrayPack::from_array([2.0_f64, f64::NAN]);
        let r = ArrayPack::select(m, a, b);
        assert!(r.extract(0) == 0.0 && r.extract(0).is_sign_negative());
        assert!(r.extract(1).is_nan());
    }

    #[test]
    fn single_is_scalar() {
        let a = Single::splat(3.0_f64);
        let b = Single::splat(4.0_f64);
        assert_eq!((a * a + b * b).sqrt().to_scalar(), 5.0);
        assert_eq!(Single::<f32>::WIDTH, 1);
        assert_eq!(a.hsum(), 3.0);
        assert_eq!(a.cmp_lt(b).count(), 1);
    }

    #[test]
    fn partial_store_leaves_tail() {
        let p = ArrayPack::from_array([1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut out = [0.0_f32; 8];
        unsafe { p.store_partial(5, out.as_mut_ptr()) };
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0]);
    }
}
