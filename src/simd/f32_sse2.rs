//! SSE2 f32 packs for x86_64.
//!
//! SSE2 provides 128-bit registers → 4×f32 lanes. Rounding and blends use
//! SSE4.1 instructions when that target feature is enabled and fall back to
//! lane emulation / bitwise select otherwise.

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

/// 4×f32 in an `__m128`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct F32x4(__m128);

/// Truth lanes for [`F32x4`].
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct M32x4(__m128);

impl F32x4 {
    #[inline]
    pub fn from_array(a: [f32; 4]) -> Self {
        unsafe { Self(_mm_loadu_ps(a.as_ptr())) }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        let mut out = [0.0_f32; 4];
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.0) };
        out
    }
}

impl fmt::Debug for F32x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("F32x4").field(&self.to_array()).finish()
    }
}

impl PartialEq for F32x4 {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

macro_rules! impl_binop {
    ($($tr:ident, $method:ident, $atr:ident, $amethod:ident, $intr:ident);* $(;)?) => {
        $(
            impl $tr for F32x4 {
                type Output = Self;

                #[inline]
                fn $method(self, rhs: Self) -> Self {
                    unsafe { Self($intr(self.0, rhs.0)) }
                }
            }

            impl $atr for F32x4 {
                #[inline]
                fn $amethod(&mut self, rhs: Self) {
                    *self = $tr::$method(*self, rhs);
                }
            }
        )*
    };
}

impl_binop! {
    Add, add, AddAssign, add_assign, _mm_add_ps;
    Sub, sub, SubAssign, sub_assign, _mm_sub_ps;
    Mul, mul, MulAssign, mul_assign, _mm_mul_ps;
    Div, div, DivAssign, div_assign, _mm_div_ps;
}

impl Neg for F32x4 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, _mm_set1_ps(-0.0))) }
    }
}

impl Pack for F32x4 {
    type Elem = f32;
    type Mask = M32x4;
    const WIDTH: usize = 4;

    #[inline]
    fn splat(v: f32) -> Self {
        unsafe { Self(_mm_set1_ps(v)) }
    }

    #[inline]
    fn zeros() -> Self {
        unsafe { Self(_mm_setzero_ps()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> f32>(f: F) -> Self {
        Self::from_array(core::array::from_fn(f))
    }

    #[inline]
    fn extract(self, i: usize) -> f32 {
        self.to_array()[i]
    }

    #[inline]
    fn to_scalar(self) -> f32 {
        unsafe { _mm_cvtss_f32(self.0) }
    }

    #[inline]
    unsafe fn load(ptr: *const f32) -> Self {
        unsafe { Self(_mm_loadu_ps(ptr)) }
    }

    #[inline]
    unsafe fn load_aligned(ptr: *const f32) -> Self {
        unsafe { Self(_mm_load_ps(ptr)) }
    }

    #[inline]
    unsafe fn load_partial(n: usize, ptr: *const f32) -> Self {
        debug_assert!(n <= 4);
        let mut buf = [0.0_f32; 4];
        unsafe {
            core::ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr(), n);
            Self(_mm_loadu_ps(buf.as_ptr()))
        }
    }

    #[inline]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { _mm_storeu_ps(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_aligned(self, ptr: *mut f32) {
        unsafe { _mm_store_ps(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_partial(self, n: usize, ptr: *mut f32) {
        debug_assert!(n <= 4);
        let buf = self.to_array();
        unsafe { core::ptr::copy_nonoverlapping(buf.as_ptr(), ptr, n) }
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        unsafe { Self(_mm_min_ps(self.0, other.0)) }
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        unsafe { Self(_mm_max_ps(self.0, other.0)) }
    }

    #[inline]
    fn abs(self) -> Self {
        unsafe { Self(_mm_andnot_ps(_mm_set1_ps(-0.0), self.0)) }
    }

    #[inline]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm_sqrt_ps(self.0)) }
    }

    #[inline]
    fn approx_rcp(self) -> Self {
        unsafe { Self(_mm_rcp_ps(self.0)) }
    }

    #[inline]
    fn approx_rsqrt(self) -> Self {
        unsafe { Self(_mm_rsqrt_ps(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn floor(self) -> Self {
        unsafe { Self(_mm_floor_ps(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn ceil(self) -> Self {
        unsafe { Self(_mm_ceil_ps(self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn round(self) -> Self {
        unsafe { Self(_mm_round_ps(self.0, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn trunc(self) -> Self {
        unsafe { Self(_mm_round_ps(self.0, _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC)) }
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
    fn cmp_eq(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmpeq_ps(self.0, other.0)) }
    }

    #[inline]
    fn cmp_ne(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmpneq_ps(self.0, other.0)) }
    }

    #[inline]
    fn cmp_lt(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmplt_ps(self.0, other.0)) }
    }

    #[inline]
    fn cmp_le(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmple_ps(self.0, other.0)) }
    }

    #[inline]
    fn cmp_gt(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmpgt_ps(self.0, other.0)) }
    }

    #[inline]
    fn cmp_ge(self, other: Self) -> M32x4 {
        unsafe { M32x4(_mm_cmpge_ps(self.0, other.0)) }
    }

    /// Arithmetic shift of the sign bit across the lane.
    #[inline]
    fn is_neg(self) -> M32x4 {
        unsafe { M32x4(_mm_castsi128_ps(_mm_srai_epi32(_mm_castps_si128(self.0), 31))) }
    }

    #[inline]
    fn is_finite(self) -> M32x4 {
        unsafe { M32x4(_mm_cmplt_ps(self.abs().0, _mm_set1_ps(f32::INFINITY))) }
    }

    #[inline]
    fn is_inf(self) -> M32x4 {
        unsafe { M32x4(_mm_cmpeq_ps(self.abs().0, _mm_set1_ps(f32::INFINITY))) }
    }

    #[inline]
    fn is_nan(self) -> M32x4 {
        unsafe { M32x4(_mm_cmpunord_ps(self.0, self.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline]
    fn select(mask: M32x4, a: Self, b: Self) -> Self {
        unsafe { Self(_mm_blendv_ps(b.0, a.0, mask.0)) }
    }

    #[cfg(not(target_feature = "sse4.1"))]
    #[inline]
    fn select(mask: M32x4, a: Self, b: Self) -> Self {
        unsafe { Self(_mm_or_ps(_mm_and_ps(mask.0, a.0), _mm_andnot_ps(mask.0, b.0))) }
    }

    #[inline]
    fn hsum(self) -> f32 {
        unsafe {
            let shuf = _mm_movehl_ps(self.0, self.0);
            let sums = _mm_add_ps(self.0, shuf);
            let shuf2 = _mm_shuffle_ps(sums, sums, 1);
            _mm_cvtss_f32(_mm_add_ss(sums, shuf2))
        }
    }

    #[inline]
    fn hmin(self) -> f32 {
        unsafe {
            let shuf = _mm_movehl_ps(self.0, self.0);
            let mins = _mm_min_ps(self.0, shuf);
            let shuf2 = _mm_shuffle_ps(mins, mins, 1);
            _mm_cvtss_f32(_mm_min_ss(mins, shuf2))
        }
    }

    #[inline]
    fn hmax(self) -> f32 {
        unsafe {
            let shuf = _mm_movehl_ps(self.0, self.0);
            let maxs = _mm_max_ps(self.0, shuf);
            let shuf2 = _mm_shuffle_ps(maxs, maxs, 1);
            _mm_cvtss_f32(_mm_max_ss(maxs, shuf2))
        }
    }
}

// ── M32x4 ───────────────────────────────────────────────────────────

impl M32x4 {
    #[inline]
    fn bitmask(self) -> i32 {
        unsafe { _mm_movemask_ps(self.0) }
    }
}

impl fmt::Debug for M32x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..4).map(|i| self.lane(i))).finish()
    }
}

impl Not for M32x4 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, Self::all_true().0)) }
    }
}

impl BitAnd for M32x4 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for M32x4 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for M32x4 {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, rhs.0)) }
    }
}

impl MaskPack for M32x4 {
    const WIDTH: usize = 4;

    #[inline]
    fn all_true() -> Self {
        unsafe { Self(_mm_castsi128_ps(_mm_set1_epi32(-1))) }
    }

    #[inline]
    fn all_false() -> Self {
        unsafe { Self(_mm_setzero_ps()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        let l: [bool; 4] = core::array::from_fn(|i| f(i));
        unsafe {
            Self(_mm_castsi128_ps(_mm_setr_epi32(
                -(l[0] as i32),
                -(l[1] as i32),
                -(l[2] as i32),
                -(l[3] as i32),
            )))
        }
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
