//! AVX f64 packs for x86_64.
//!
//! AVX provides 256-bit registers → 4×f64 lanes. Horizontal reductions fold
//! the high 128-bit half onto the low half, then finish with the SSE
//! shuffle sequence.

use core::arch::x86_64::*;
use core::fmt;
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Sub,
    SubAssign,
};

use super::{MaskPack, Pack};

/// 4×f64 in an `__m256d`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct F64x4(__m256d);

/// Truth lanes for [`F64x4`].
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct M64x4(__m256d);

impl F64x4 {
    #[inline]
    pub fn from_array(a: [f64; 4]) -> Self {
        unsafe { Self(_mm256_loadu_pd(a.as_ptr())) }
    }

    #[inline]
    pub fn to_array(self) -> [f64; 4] {
        let mut out = [0.0_f64; 4];
        unsafe { _mm256_storeu_pd(out.as_mut_ptr(), self.0) };
        out
    }

    #[inline]
    fn halves(self) -> (__m128d, __m128d) {
        unsafe { (_mm256_castpd256_pd128(self.0), _mm256_extractf128_pd(self.0, 1)) }
    }

    #[inline]
    fn cmp<const IMM: i32>(self, other: Self) -> M64x4 {
        unsafe { M64x4(_mm256_cmp_pd::<IMM>(self.0, other.0)) }
    }
}

impl fmt::Debug for F64x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("F64x4").field(&self.to_array()).finish()
    }
}

impl PartialEq for F64x4 {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

macro_rules! impl_binop {
    ($($tr:ident, $method:ident, $atr:ident, $amethod:ident, $intr:ident);* $(;)?) => {
        $(
            impl $tr for F64x4 {
                type Output = Self;

                #[inline]
                fn $method(self, rhs: Self) -> Self {
                    unsafe { Self($intr(self.0, rhs.0)) }
                }
            }

            impl $atr for F64x4 {
                #[inline]
                fn $amethod(&mut self, rhs: Self) {
                    *self = $tr::$method(*self, rhs);
                }
            }
        )*
    };
}

impl_binop! {
    Add, add, AddAssign, add_assign, _mm256_add_pd;
    Sub, sub, SubAssign, sub_assign, _mm256_sub_pd;
    Mul, mul, MulAssign, mul_assign, _mm256_mul_pd;
    Div, div, DivAssign, div_assign, _mm256_div_pd;
}

impl Neg for F64x4 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        unsafe { Self(_mm256_xor_pd(self.0, _mm256_set1_pd(-0.0))) }
    }
}

impl Pack for F64x4 {
    type Elem = f64;
    type Mask = M64x4;
    const WIDTH: usize = 4;

    #[inline]
    fn splat(v: f64) -> Self {
        unsafe { Self(_mm256_set1_pd(v)) }
    }

    #[inline]
    fn zeros() -> Self {
        unsafe { Self(_mm256_setzero_pd()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> f64>(f: F) -> Self {
        Self::from_array(core::array::from_fn(f))
    }

    #[inline]
    fn extract(self, i: usize) -> f64 {
        self.to_array()[i]
    }

    #[inline]
    fn to_scalar(self) -> f64 {
        unsafe { _mm256_cvtsd_f64(self.0) }
    }

    #[inline]
    unsafe fn load(ptr: *const f64) -> Self {
        unsafe { Self(_mm256_loadu_pd(ptr)) }
    }

    #[inline]
    unsafe fn load_aligned(ptr: *const f64) -> Self {
        unsafe { Self(_mm256_load_pd(ptr)) }
    }

    #[inline]
    unsafe fn load_partial(n: usize, ptr: *const f64) -> Self {
        debug_assert!(n <= 4);
        let mut buf = [0.0_f64; 4];
        unsafe {
            core::ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr(), n);
            Self(_mm256_loadu_pd(buf.as_ptr()))
        }
    }

    #[inline]
    unsafe fn store(self, ptr: *mut f64) {
        unsafe { _mm256_storeu_pd(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_aligned(self, ptr: *mut f64) {
        unsafe { _mm256_store_pd(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_partial(self, n: usize, ptr: *mut f64) {
        debug_assert!(n <= 4);
        let buf = self.to_array();
        unsafe { core::ptr::copy_nonoverlapping(buf.as_ptr(), ptr, n) }
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        unsafe { Self(_mm256_min_pd(self.0, other.0)) }
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        unsafe { Self(_mm256_max_pd(self.0, other.0)) }
    }

    #[inline]
    fn abs(self) -> Self {
        unsafe { Self(_mm256_andnot_pd(_mm256_set1_pd(-0.0), self.0)) }
    }

    #[inline]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm256_sqrt_pd(self.0)) }
    }

    #[inline]
    fn floor(self) -> Self {
        unsafe { Self(_mm256_floor_pd(self.0)) }
    }

    #[inline]
    fn ceil(self) -> Self {
        unsafe { Self(_mm256_ceil_pd(self.0)) }
    }

    #[inline]
    fn round(self) -> Self {
        unsafe { Self(_mm256_round_pd(self.0, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC)) }
    }

    #[inline]
    fn trunc(self) -> Self {
        unsafe { Self(_mm256_round_pd(self.0, _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC)) }
    }

    #[inline]
    fn cmp_eq(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_EQ_OQ>(other)
    }

    #[inline]
    fn cmp_ne(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_NEQ_UQ>(other)
    }

    #[inline]
    fn cmp_lt(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_LT_OQ>(other)
    }

    #[inline]
    fn cmp_le(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_LE_OQ>(other)
    }

    #[inline]
    fn cmp_gt(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_GT_OQ>(other)
    }

    #[inline]
    fn cmp_ge(self, other: Self) -> M64x4 {
        self.cmp::<_CMP_GE_OQ>(other)
    }

    /// Blend all-ones where the sign bit is set.
    #[inline]
    fn is_neg(self) -> M64x4 {
        unsafe { M64x4(_mm256_blendv_pd(_mm256_setzero_pd(), M64x4::all_true().0, self.0)) }
    }

    #[inline]
    fn is_finite(self) -> M64x4 {
        self.abs().cmp::<_CMP_LT_OQ>(Self::splat(f64::INFINITY))
    }

    #[inline]
    fn is_inf(self) -> M64x4 {
        self.abs().cmp::<_CMP_EQ_OQ>(Self::splat(f64::INFINITY))
    }

    #[inline]
    fn is_nan(self) -> M64x4 {
        self.cmp::<_CMP_UNORD_Q>(self)
    }

    #[inline]
    fn select(mask: M64x4, a: Self, b: Self) -> Self {
        unsafe { Self(_mm256_blendv_pd(b.0, a.0, mask.0)) }
    }

    #[inline]
    fn hsum(self) -> f64 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_add_pd(lo, hi);
            let h = _mm_unpackhi_pd(v, v);
            _mm_cvtsd_f64(_mm_add_sd(v, h))
        }
    }

    #[inline]
    fn hmin(self) -> f64 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_min_pd(lo, hi);
            let h = _mm_unpackhi_pd(v, v);
            _mm_cvtsd_f64(_mm_min_sd(v, h))
        }
    }

    #[inline]
    fn hmax(self) -> f64 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_max_pd(lo, hi);
            let h = _mm_unpackhi_pd(v, v);
            _mm_cvtsd_f64(_mm_max_sd(v, h))
        }
    }
}

// ── M64x4 ───────────────────────────────────────────────────────────

impl M64x4 {
    #[inline]
    fn bitmask(self) -> i32 {
        unsafe { _mm256_movemask_pd(self.0) }
    }
}

impl fmt::Debug for M64x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..4).map(|i| self.lane(i))).finish()
    }
}

impl Not for M64x4 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        unsafe { Self(_mm256_xor_pd(self.0, Self::all_true().0)) }
    }
}

impl BitAnd for M64x4 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_and_pd(self.0, rhs.0)) }
    }
}

impl BitOr for M64x4 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_or_pd(self.0, rhs.0)) }
    }
}

impl BitXor for M64x4 {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_xor_pd(self.0, rhs.0)) }
    }
}

impl MaskPack for M64x4 {
    const WIDTH: usize = 4;

    #[inline]
    fn all_true() -> Self {
        unsafe { Self(_mm256_castsi256_pd(_mm256_set1_epi64x(-1))) }
    }

    #[inline]
    fn all_false() -> Self {
        unsafe { Self(_mm256_setzero_pd()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        let l: [i64; 4] = core::array::from_fn(|i| -(f(i) as i64));
        unsafe { Self(_mm256_castsi256_pd(_mm256_setr_epi64x(l[0], l[1], l[2], l[3]))) }
    }

    #[inline]
    fn lane(self, i: usize) -> bool {
        assert!(i < 4, "mask lane {i} out of range for width 4");
        (self.bitmask() >> i) & 1 != 0
    }

    #[inline]
    fn all(self) -> bool {
        self.bitmask() == 0xF
    }

    #[inline]
    fn any(self) -> bool {
        self.bitmask() != 0
    }

    #[inline]
    fn count(self) -> usize {
        self.bitmask().count_ones() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsum_folds_halves_first() {
        let p = F64x4::from_array([1.0e17, 1.0, -1.0e17, 1.0]);
        assert_eq!(p.hsum(), 2.0);
        assert_eq!(p.hmin(), -1.0e17);
        assert_eq!(p.hmax(), 1.0e17);
    }

    #[test]
    fn is_neg_sign_bit() {
        let p = F64x4::from_array([-0.0, 0.0, f64::NEG_INFINITY, f64::NAN]);
        assert_eq!(p.is_neg().bitmask(), 0b0101);
    }

    #[test]
    fn mask_ops() {
        let m = M64x4::from_fn(|i| i == 0 || i == 3);
        assert_eq!(m.bitmask(), 0b1001);
        assert_eq!((!m).count(), 2);
        assert!((m ^ !m).all());
    }
}
