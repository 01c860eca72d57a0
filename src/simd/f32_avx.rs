//! AVX f32 packs for x86_64.
//!
//! AVX provides 256-bit registers → 8×f32 lanes. Horizontal reductions fold
//! the high 128-bit half onto the low half, then finish with the SSE
//! shuffle sequence.

use core::arch::x86_64::*;
use core::fmt;
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Sub,
    SubAssign,
};

use super::{MaskPack, Pack};

/// 8×f32 in an `__m256`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct F32x8(__m256);

/// Truth lanes for [`F32x8`].
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct M32x8(__m256);

impl F32x8 {
    #[inline]
    pub fn from_array(a: [f32; 8]) -> Self {
        unsafe { Self(_mm256_loadu_ps(a.as_ptr())) }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 8] {
        let mut out = [0.0_f32; 8];
        unsafe { _mm256_storeu_ps(out.as_mut_ptr(), self.0) };
        out
    }

    #[inline]
    fn halves(self) -> (__m128, __m128) {
        unsafe { (_mm256_castps256_ps128(self.0), _mm256_extractf128_ps(self.0, 1)) }
    }

    #[inline]
    fn cmp<const IMM: i32>(self, other: Self) -> M32x8 {
        unsafe { M32x8(_mm256_cmp_ps::<IMM>(self.0, other.0)) }
    }
}

impl fmt::Debug for F32x8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("F32x8").field(&self.to_array()).finish()
    }
}

impl PartialEq for F32x8 {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

macro_rules! impl_binop {
    ($($tr:ident, $method:ident, $atr:ident, $amethod:ident, $intr:ident);* $(;)?) => {
        $(
            impl $tr for F32x8 {
                type Output = Self;

                #[inline]
                fn $method(self, rhs: Self) -> Self {
                    unsafe { Self($intr(self.0, rhs.0)) }
                }
            }

            impl $atr for F32x8 {
                #[inline]
                fn $amethod(&mut self, rhs: Self) {
                    *self = $tr::$method(*self, rhs);
                }
            }
        )*
    };
}

impl_binop! {
    Add, add, AddAssign, add_assign, _mm256_add_ps;
    Sub, sub, SubAssign, sub_assign, _mm256_sub_ps;
    Mul, mul, MulAssign, mul_assign, _mm256_mul_ps;
    Div, div, DivAssign, div_assign, _mm256_div_ps;
}

impl Neg for F32x8 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, _mm256_set1_ps(-0.0))) }
    }
}

impl Pack for F32x8 {
    type Elem = f32;
    type Mask = M32x8;
    const WIDTH: usize = 8;

    #[inline]
    fn splat(v: f32) -> Self {
        unsafe { Self(_mm256_set1_ps(v)) }
    }

    #[inline]
    fn zeros() -> Self {
        unsafe { Self(_mm256_setzero_ps()) }
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
        unsafe { _mm256_cvtss_f32(self.0) }
    }

    #[inline]
    unsafe fn load(ptr: *const f32) -> Self {
        unsafe { Self(_mm256_loadu_ps(ptr)) }
    }

    #[inline]
    unsafe fn load_aligned(ptr: *const f32) -> Self {
        unsafe { Self(_mm256_load_ps(ptr)) }
    }

    #[inline]
    unsafe fn load_partial(n: usize, ptr: *const f32) -> Self {
        debug_assert!(n <= 8);
        let mut buf = [0.0_f32; 8];
        unsafe {
            core::ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr(), n);
            Self(_mm256_loadu_ps(buf.as_ptr()))
        }
    }

    #[inline]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { _mm256_storeu_ps(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_aligned(self, ptr: *mut f32) {
        unsafe { _mm256_store_ps(ptr, self.0) }
    }

    #[inline]
    unsafe fn store_partial(self, n: usize, ptr: *mut f32) {
        debug_assert!(n <= 8);
        let buf = self.to_array();
        unsafe { core::ptr::copy_nonoverlapping(buf.as_ptr(), ptr, n) }
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        unsafe { Self(_mm256_min_ps(self.0, other.0)) }
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        unsafe { Self(_mm256_max_ps(self.0, other.0)) }
    }

    #[inline]
    fn abs(self) -> Self {
        unsafe { Self(_mm256_andnot_ps(_mm256_set1_ps(-0.0), self.0)) }
    }

    #[inline]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm256_sqrt_ps(self.0)) }
    }

    #[inline]
    fn approx_rcp(self) -> Self {
        unsafe { Self(_mm256_rcp_ps(self.0)) }
    }

    #[inline]
    fn approx_rsqrt(self) -> Self {
        unsafe { Self(_mm256_rsqrt_ps(self.0)) }
    }

    #[inline]
    fn floor(self) -> Self {
        unsafe { Self(_mm256_floor_ps(self.0)) }
    }

    #[inline]
    fn ceil(self) -> Self {
        unsafe { Self(_mm256_ceil_ps(self.0)) }
    }

    #[inline]
    fn round(self) -> Self {
        unsafe { Self(_mm256_round_ps(self.0, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC)) }
    }

    #[inline]
    fn trunc(self) -> Self {
        unsafe { Self(_mm256_round_ps(self.0, _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC)) }
    }

    #[inline]
    fn cmp_eq(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_EQ_OQ>(other)
    }

    #[inline]
    fn cmp_ne(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_NEQ_UQ>(other)
    }

    #[inline]
    fn cmp_lt(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_LT_OQ>(other)
    }

    #[inline]
    fn cmp_le(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_LE_OQ>(other)
    }

    #[inline]
    fn cmp_gt(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_GT_OQ>(other)
    }

    #[inline]
    fn cmp_ge(self, other: Self) -> M32x8 {
        self.cmp::<_CMP_GE_OQ>(other)
    }

    /// Blend all-ones where the sign bit is set.
    #[inline]
    fn is_neg(self) -> M32x8 {
        unsafe { M32x8(_mm256_blendv_ps(_mm256_setzero_ps(), M32x8::all_true().0, self.0)) }
    }

    #[inline]
    fn is_finite(self) -> M32x8 {
        self.abs().cmp::<_CMP_LT_OQ>(Self::splat(f32::INFINITY))
    }

    #[inline]
    fn is_inf(self) -> M32x8 {
        self.abs().cmp::<_CMP_EQ_OQ>(Self::splat(f32::INFINITY))
    }

    #[inline]
    fn is_nan(self) -> M32x8 {
        self.cmp::<_CMP_UNORD_Q>(self)
    }

    #[inline]
    fn select(mask: M32x8, a: Self, b: Self) -> Self {
        unsafe { Self(_mm256_blendv_ps(b.0, a.0, mask.0)) }
    }

    #[inline]
    fn hsum(self) -> f32 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_add_ps(lo, hi);
            let shuf = _mm_movehl_ps(v, v);
            let sums = _mm_add_ps(v, shuf);
            let shuf2 = _mm_shuffle_ps(sums, sums, 1);
            _mm_cvtss_f32(_mm_add_ss(sums, shuf2))
        }
    }

    #[inline]
    fn hmin(self) -> f32 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_min_ps(lo, hi);
            let shuf = _mm_movehl_ps(v, v);
            let mins = _mm_min_ps(v, shuf);
            let shuf2 = _mm_shuffle_ps(mins, mins, 1);
            _mm_cvtss_f32(_mm_min_ss(mins, shuf2))
        }
    }

    #[inline]
    fn hmax(self) -> f32 {
        unsafe {
            let (lo, hi) = self.halves();
            let v = _mm_max_ps(lo, hi);
            let shuf = _mm_movehl_ps(v, v);
            let maxs = _mm_max_ps(v, shuf);
            let shuf2 = _mm_shuffle_ps(maxs, maxs, 1);
            _mm_cvtss_f32(_mm_max_ss(maxs, shuf2))
        }
    }
}

// ── M32x8 ───────────────────────────────────────────────────────────

impl M32x8 {
    #[inline]
    fn bitmask(self) -> i32 {
        unsafe { _mm256_movemask_ps(self.0) }
    }
}

impl fmt::Debug for M32x8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..8).map(|i| self.lane(i))).finish()
    }
}

impl Not for M32x8 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, Self::all_true().0)) }
    }
}

impl BitAnd for M32x8 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for M32x8 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for M32x8 {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, rhs.0)) }
    }
}

impl MaskPack for M32x8 {
    const WIDTH: usize = 8;

    #[inline]
    fn all_true() -> Self {
        unsafe { Self(_mm256_castsi256_ps(_mm256_set1_epi32(-1))) }
    }

    #[inline]
    fn all_false() -> Self {
        unsafe { Self(_mm256_setzero_ps()) }
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        let l: [i32; 8] = core::array::from_fn(|i| -(f(i) as i32));
        unsafe {
            Self(_mm256_castsi256_ps(_mm256_setr_epi32(
                l[0], l[1], l[2], l[3], l[4], l[5], l[6], l[7],
            )))
        }
    }

    #[inline]
    fn lane(self, i: usize) -> bool {
        assert!(i < 8, "mask lane {i} out of range for width 8");
        (self.bitmask() >> i) & 1 != 0
    }

    #[inline]
    fn all(self) -> bool {
        self.bitmask() == 0xFF
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
