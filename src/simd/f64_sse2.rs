//! SSE2 f64 packs for x86_64.
//!
//! SSE2 provides 128-bit registers → 2×f64 lanes.

use core::arch::x86_64::*;
use core::fmt;
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Sub,
    SubAssign,
};

#[cfg(not(target_feature = "sse4.1"))]
use num_traits::Float;

use super::{MaskPack, Pack};
#[cfg(not(target_feature = "sse4.1"))]
use crate::traits::Real;

/// 2×f64 in an `__m128d`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct F64x2(__m128d);

/// Truth lanes for [`F64x2`].
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct M64x2(__m128d);

impl F64x2 {
    #[inline]
    pub fn from_array(a: [f64; 2]) -> Self {
        unsafe { Self(_mm_loadu_pd(a.as_ptr())) }
    }

    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        let mut out = [0.0_f64; 2];
        unsafe { _mm_storeu_pd(out.as_mut_ptr(), self.0) };
        out
    }
}

impl fmt::Debug for F64x2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("F64x2").field(&self.to_array()).finish()
    }
}

impl PartialEq for F64x2 {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

macro_rules! impl_binop {
    ($($tr:ident, $method:ident, $atr:ident, $amethod:ident, $intr:ident);* $(;)?) => {
        $(
            impl $tr for F64x2 {
                type Output = Self;

                #[inline]
                fn $method(self, rhs: Self) -> Self {
                    unsafe { Self($intr(self.0, rhs.0)) }
                }
            }

            impl $atr for F64x2 {
                #[inline]
                fn $amethod(&mut self, rhs: Self) {
                    *self = $tr::$method(*self, rhs);
                }
            }
        )*
    };
}

impl_binop! {
    Add, add, AddAssign, add_assign, _mm_add_pd;
    Sub, sub, SubAssign, sub_assign, _mm_sub_pd;
    Mul, mul, MulAssign, mul_assign, _mm_mul_pd;
    Div, div, DivAssign, div_assign, _mm_div_pd;
}

impl Neg for F64x2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        unsafe { Self(_mm_xor_pd(self.0, _mm_set1_pd(-0.0))) }
    }
}

impl Pack for F64x2 {
    type Elem = f64;
    type Mask = M64x2;
    const WIDTH: usize = 2;

    #[inline]
    fn splat(v: f64) -> Self {
        unsafe { Self(_mm_set1_pd(v)) }
    }

    #[inline]
    fn zeros() -> Self {
        unsafe { Self(_mm_setzero_pd()) }
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
        unsafe { _mm_cvtsd_f64(self.0) }
    }

    #[inline]
    unsafe fn load(ptr: *const f64) -> Self {
        unsafe { Self(_mm_loadu_pd(ptr)) }
    }

    #[inline]
    unsafe fn load_aligned(ptr: *const f64) -> Self {
        unsafe { Self(_mm_load_pd(ptr)) }
    }

    #[inline]
    unsafe fn load_partial(n: usize, ptr: *const f64) -> Self {
        debug_assert!(n <= 2);
        unsafe {
            match n {
                0 => Self(_mm_setzero_pd()),
                1 => Self(_mm_load_sd(ptr)),
                _ => Self(_mm_loadu_pd(ptr)),
            }
        }
    }

    #[inline]
    unsafe fn store(self, ptr: *mut f64) {
        unsafe { _mm_storeu_pd(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_aligned(self, ptr: *mut f64) {
        unsafe { _mm_store_pd(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_partial(self, n: usize, ptr: *mut f64) {
        debug_assert!(n <= 2);
        unsafe {
            match n {
                0 => {}
                1 => _mm_store_sd(ptr, self.0),
                _ => _mm_storeu_pd(ptr, self.0),
            }
        }
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        unsafe { Self(_mm_min_pd(self.0, other.0)) }
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        unsafe { Self(_mm_max_pd(self.0, other.0)) }
    }

    #[inline]
    fn abs(self) -> Self {
        unsafe { Self(_mm_andnot_pd(_mm_set1_pd(-0.0), self.0)) }
    }

    #[inline]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm_sqrt_pd(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn floor(self) -> Self {
        unsafe { Self(_mm_floor_pd(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn ceil(self) -> Self {
        unsafe { Self(_mm_ceil_pd(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn round(self) -> Self {
        unsafe { Self(_mm_round_pd(self.0, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn trunc(self) -> Self {
        unsafe { Self(_mm_round_pd(self.0, _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC)) }
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn floor(self) -> Self {
        self.map_lanes(Float::floor)
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn ceil(self) -> Self {
        self.map_lanes(Float::ceil)
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn round(self) -> Self {
        self.map_lanes(Real::round_even)
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn trunc(self) -> Self {
        self.map_lanes(Float::trunc)
    }

    #[inline]
    fn cmp_eq(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmpeq_pd(self.0, other.0)) }
    }

    #[inline]
    fn cmp_ne(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmpneq_pd(self.0, other.0)) }
    }

    #[inline]
    fn cmp_lt(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmplt_pd(self.0, other.0)) }
    }

    #[inline]
    fn cmp_le(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmple_pd(self.0, other.0)) }
    }

    #[inline]
    fn cmp_gt(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmpgt_pd(self.0, other.0)) }
    }

    #[inline]
    fn cmp_ge(self, other: Self) -> M64x2 {
        unsafe { M64x2(_mm_cmpge_pd(self.0, other.0)) }
    }

    /// SSE2 has no 64-bit arithmetic shift: shift the high dwords, then
    /// broadcast each into its lane.
    #[inline]
    fn is_neg(self) -> M64x2 {
        unsafe {
            let hi = _mm_srai_epi32(_mm_castpd_si128(self.0), 31);
            M64x2(_mm_castsi128_pd(_mm_shuffle_epi32(hi, 0b11_11_01_01)))
        }
    }

    #[inline]
    fn is_finite(self) -> M64x2 {
        unsafe { M64x2(_mm_cmplt_pd(self.abs().0, _mm_set1_pd(f64::INFINITY))) }
    }

    #[inline]
    fn is_inf(self) -> M64x2 {
        unsafe { M64x2(_mm_cmpeq_pd(self.abs().0, _mm_set1_pd(f64::INFINITY))) }
    }

    #[inline]
    fn is_nan(self) -> M64x2 {
        unsafe { M64x2(_mm_cmpunord_pd(self.0, self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn select(mask: M64x2, a: Self, b: Self) -> Self {
        unsafe { Self(_mm_blendv_pd(b.0, a.0, mask.0)) }
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn select(mask: M64x2, a: Self, b: Self) -> Self {
        unsafe { Self(_mm_or_pd(_mm_and_pd(mask.0, a.0), _mm_andnot_pd(mask.0, b.0))) }
    }

    #[inline]
    fn hsum(self) -> f64 {
        unsafe {
            let hi = _mm_unpackhi_pd(self.0, self.0);
            _mm_cvtsd_f64(_mm_add_sd(self.0, hi))
        }
    }

    #[inline]
    fn hmin(self) -> f64 {
        unsafe {
            let hi = _mm_unpackhi_pd(self.0, self.0);
            _mm_cvtsd_f64(_mm_min_sd(self.0, hi))
        }
    }

    #[inline]
    fn hmax(self) -> f64 {
        unsafe {
            let hi = _mm_unpackhi_pd(self.0, self.0);
            _mm_cvtsd_f64(_mm_max_sd(self.0, hi))
        }
    }
}

// ── M64x2 ───────────────────────────────────────────────────────────

impl M64x2 {
    #[inline]
    fn bitmask(self) -> i32 {
        unsafe { _mm_movemask_pd(self.0) }
    }
}

impl fmt::Debug for M64x2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..2).map(|i| self.lane(i))).finish()
    }
}

impl Not for M64x2 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        unsafe { Self(_mm_xor_pd(self.0, Self::all_true().0)) }
    }
}

impl BitAnd for M64x2 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm_and_pd(self.0, rhs.0)) }
    }
}

impl BitOr for M64x2 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_or_pd(self.0, rhs.0)) }
    }
}

impl BitXor for M64x2 {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_xor_pd(self.0, rhs.0)) }
    }
}

impl MaskPack for M64x2 {
    const WIDTH: usize = 2;

    #[inline]
    fn all_true() -> Self {
        unsafe { Self(_mm_castsi128_pd(_mm_set1_epi32(-1))) }
    }

    #[inline]
    fn all_false() -> Self {
        unsafe { Self(_mm_setzero_pd()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        let l0 = f(0);
        let l1 = f(1);
        unsafe { Self(_mm_castsi128_pd(_mm_set_epi64x(-(l1 as i64), -(l0 as i64)))) }
    }

    #[inline]
    fn lane(self, i: usize) -> bool {
        assert!(i < 2, "mask lane {i} out of range for width 2");
        (self.bitmask() >> i) & 1 != 0
    }

    #[inline]
    fn all(self) -> bool {
        self.bitmask() == 0b11
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
