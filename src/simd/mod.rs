//! Packs: fixed-width lane groups with compile-time architecture dispatch.
//!
//! A [`Pack`] is `WIDTH` lanes of one [`Real`] element type processed
//! together; a [`MaskPack`] is the parallel group of truth lanes produced by
//! comparisons. Three backings exist:
//!
//! | Kind         | Backing                       | f32 lanes | f64 lanes |
//! |--------------|-------------------------------|-----------|-----------|
//! | `ScalarKind` | `[T; 1]` ([`Single`])         | 1         | 1         |
//! | `Portable`   | `[T; W]` ([`ArrayPack`])      | 4         | 2         |
//! | `Sse`        | `__m128` / `__m128d`          | 4         | 2         |
//! | `Avx`        | `__m256` / `__m256d`          | 8         | 4         |
//!
//! ## Dispatch strategy
//!
//! The vector kind is fixed at compile time: [`DefaultKind`] is `Avx` when the
//! `avx` target feature is enabled, `Sse` on other x86_64 targets and
//! `Portable` everywhere else. Enable via `-C target-cpu=native` or
//! `-C target-feature=+avx` etc. `sse4.1` additionally enables native SSE
//! rounding and blends.
//!
//! Each (element, kind) pair advertises the operation classes it executes
//! natively through [`PackElement::CAPS`]. The evaluator only picks a
//! vector policy when every class an expression uses is covered.

mod array;

#[cfg(target_arch = "x86_64")]
mod f32_sse2;
#[cfg(target_arch = "x86_64")]
mod f64_sse2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
mod f32_avx;
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
mod f64_avx;

pub use array::{ArrayMask, ArrayPack, Single};

#[cfg(target_arch = "x86_64")]
pub use f32_sse2::{F32x4, M32x4};
#[cfg(target_arch = "x86_64")]
pub use f64_sse2::{F64x2, M64x2};

#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
pub use f32_avx::{F32x8, M32x8};
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
pub use f64_avx::{F64x4, M64x4};

use core::fmt::Debug;
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Sub,
    SubAssign,
};

use crate::traits::Real;

// ── Capability sets ─────────────────────────────────────────────────

/// Set of operation classes.
///
/// Kernels declare the classes they use; pack kinds declare the classes
/// they execute natively. Both are compile-time constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpSet(u16);

impl OpSet {
    pub const NONE: OpSet = OpSet(0);
    /// `+ - * /`, negation, splat.
    pub const ARITH: OpSet = OpSet(1 << 0);
    /// Lane-wise min / max, abs.
    pub const MINMAX: OpSet = OpSet(1 << 1);
    /// Comparisons and lane select.
    pub const COMPARE: OpSet = OpSet(1 << 2);
    pub const SQRT: OpSet = OpSet(1 << 3);
    /// Reduced-precision reciprocal / reciprocal square root.
    pub const APPROX: OpSet = OpSet(1 << 4);
    /// floor / ceil / round / trunc.
    pub const ROUND: OpSet = OpSet(1 << 5);
    /// is_neg / is_finite / is_inf / is_nan.
    pub const CLASSIFY: OpSet = OpSet(1 << 6);
    /// Lane-by-lane emulation through scalar code (transcendentals, user
    /// closures). No vector kind claims it.
    pub const EMULATED: OpSet = OpSet(1 << 7);
    pub const ALL: OpSet = OpSet(0xFF);

    /// Classes every vector backing supports.
    pub const VECTOR_BASE: OpSet = OpSet(
        Self::ARITH.0 | Self::MINMAX.0 | Self::COMPARE.0 | Self::SQRT.0 | Self::APPROX.0 | Self::CLASSIFY.0,
    );

    #[inline]
    pub const fn union(self, other: OpSet) -> OpSet {
        OpSet(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: OpSet) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

// ── Pack kinds ──────────────────────────────────────────────────────

/// Compile-time marker for one hardware backing.
pub trait SimdKind: Copy + Default + Debug + Send + Sync + 'static {
    const NAME: &'static str;
    /// Register width in bits (the element width for `ScalarKind`).
    const REGISTER_BITS: usize;
    /// Operation classes this backing executes natively.
    const CAPS: OpSet;
}

/// One lane; every scalar path runs on this kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScalarKind;

/// Array-backed 128-bit packs, available on every target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Portable;

/// SSE2 128-bit registers.
#[cfg(target_arch = "x86_64")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sse;

/// AVX 256-bit registers.
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Avx;

impl SimdKind for ScalarKind {
    const NAME: &'static str = "scalar";
    const REGISTER_BITS: usize = 0;
    const CAPS: OpSet = OpSet::ALL;
}

impl SimdKind for Portable {
    const NAME: &'static str = "portable";
    const REGISTER_BITS: usize = 128;
    const CAPS: OpSet = OpSet::VECTOR_BASE.union(OpSet::ROUND);
}

#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
const SSE_ROUND: OpSet = OpSet::ROUND;
#[cfg(all(target_arch = "x86_64", not(target_feature = "sse4.1")))]
const SSE_ROUND: OpSet = OpSet::NONE;

#[cfg(target_arch = "x86_64")]
impl SimdKind for Sse {
    const NAME: &'static str = "sse";
    const REGISTER_BITS: usize = 128;
    const CAPS: OpSet = OpSet::VECTOR_BASE.union(SSE_ROUND);
}

#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
impl SimdKind for Avx {
    const NAME: &'static str = "avx";
    const REGISTER_BITS: usize = 256;
    const CAPS: OpSet = OpSet::VECTOR_BASE.union(OpSet::ROUND);
}

/// Widest vector kind enabled for this build.
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
pub type DefaultKind = Avx;
/// Widest vector kind enabled for this build.
#[cfg(all(target_arch = "x86_64", not(target_feature = "avx")))]
pub type DefaultKind = Sse;
/// Widest vector kind enabled for this build.
#[cfg(not(target_arch = "x86_64"))]
pub type DefaultKind = Portable;

/// Maps an element type to its pack type for kind `K`.
pub trait PackElement<K: SimdKind>: Real {
    type Pack: Pack<Elem = Self>;

    /// Operation classes with a native form for this (element, width) pair.
    const CAPS: OpSet = K::CAPS;
}

/// Pack of `T` for kind `K`.
pub type PackOf<T, K> = <T as PackElement<K>>::Pack;

/// Element types usable with every kind compiled into this build.
pub trait Element:
    Real + PackElement<ScalarKind> + PackElement<Portable> + PackElement<DefaultKind>
{
}

impl<T> Element for T where
    T: Real + PackElement<ScalarKind> + PackElement<Portable> + PackElement<DefaultKind>
{
}

impl PackElement<ScalarKind> for f32 {
    type Pack = Single<f32>;
}
impl PackElement<ScalarKind> for f64 {
    type Pack = Single<f64>;
}
impl PackElement<Portable> for f32 {
    type Pack = ArrayPack<f32, 4>;
}
impl PackElement<Portable> for f64 {
    type Pack = ArrayPack<f64, 2>;
}
#[cfg(target_arch = "x86_64")]
impl PackElement<Sse> for f32 {
    type Pack = F32x4;
}
#[cfg(target_arch = "x86_64")]
impl PackElement<Sse> for f64 {
    type Pack = F64x2;
}
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
impl PackElement<Avx> for f32 {
    type Pack = F32x8;
}
#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
impl PackElement<Avx> for f64 {
    type Pack = F64x4;
}

/// Whether every class in `ops` has a native form for `T` on kind `K`.
#[inline]
pub const fn has_vector_form<T: PackElement<K>, K: SimdKind>(ops: OpSet) -> bool {
    <T as PackElement<K>>::CAPS.contains(ops)
}

// ── Pack ────────────────────────────────────────────────────────────

/// Fixed-width group of `WIDTH` lanes of `Elem`.
///
/// All full-width operations are lane-independent: lane `i` of a result
/// depends only on lane `i` of each operand. Horizontal reductions combine
/// lanes pairwise as a tree (`x[i] op x[i + w/2]`, halving `w`), which is the
/// order of the register shuffle sequences.
///
/// Loads and stores take raw pointers; the `*_partial` variants touch only
/// the first `n` lanes of memory. Safe slice wrappers are provided.
pub trait Pack:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    type Elem: Real;
    type Mask: MaskPack;
    const WIDTH: usize;

    #[inline]
    fn width() -> usize {
        Self::WIDTH
    }

    /// All lanes set to `v`.
    fn splat(v: Self::Elem) -> Self;

    #[inline]
    fn zeros() -> Self {
        Self::splat(num_traits::zero())
    }

    #[inline]
    fn ones() -> Self {
        Self::splat(num_traits::one())
    }

    /// Lane `i` is `f(i)`; `f` is called in lane order.
    fn from_fn<F: FnMut(usize) -> Self::Elem>(f: F) -> Self;

    /// Lane `i`. Panics if `i >= WIDTH`.
    fn extract(self, i: usize) -> Self::Elem;

    /// Lane 0.
    fn to_scalar(self) -> Self::Elem;

    /// Unaligned load of `WIDTH` elements.
    ///
    /// # Safety
    /// `ptr` must be valid for `WIDTH` reads.
    unsafe fn load(ptr: *const Self::Elem) -> Self;

    /// # Safety
    /// As [`Pack::load`], and `ptr` must be aligned to the pack's byte width.
    unsafe fn load_aligned(ptr: *const Self::Elem) -> Self;

    /// Load the first `n` lanes, zero the rest.
    ///
    /// # Safety
    /// `n <= WIDTH` and `ptr` valid for `n` reads.
    unsafe fn load_partial(n: usize, ptr: *const Self::Elem) -> Self;

    /// # Safety
    /// `ptr` must be valid for `WIDTH` writes.
    unsafe fn store(self, ptr: *mut Self::Elem);

    /// # Safety
    /// As [`Pack::store`], and `ptr` must be aligned to the pack's byte width.
    unsafe fn store_aligned(self, ptr: *mut Self::Elem);

    /// Store the first `n` lanes. Memory past `n` is not touched.
    ///
    /// # Safety
    /// `n <= WIDTH` and `ptr` valid for `n` writes.
    unsafe fn store_partial(self, n: usize, ptr: *mut Self::Elem);

    /// Load from the front of `src`. Panics if `src.len() < WIDTH`.
    #[inline]
    fn from_slice(src: &[Self::Elem]) -> Self {
        assert!(
            src.len() >= Self::WIDTH,
            "slice of {} elements is shorter than pack width {}",
            src.len(),
            Self::WIDTH
        );
        unsafe { Self::load(src.as_ptr()) }
    }

    /// Load all of `src` into the low lanes. Panics if `src.len() > WIDTH`.
    #[inline]
    fn from_slice_partial(src: &[Self::Elem]) -> Self {
        assert!(
            src.len() <= Self::WIDTH,
            "slice of {} elements exceeds pack width {}",
            src.len(),
            Self::WIDTH
        );
        unsafe { Self::load_partial(src.len(), src.as_ptr()) }
    }

    /// Store to the front of `dst`. Panics if `dst.len() < WIDTH`.
    #[inline]
    fn write_to_slice(self, dst: &mut [Self::Elem]) {
        assert!(
            dst.len() >= Self::WIDTH,
            "slice of {} elements is shorter than pack width {}",
            dst.len(),
            Self::WIDTH
        );
        unsafe { self.store(dst.as_mut_ptr()) }
    }

    /// Store the low `dst.len()` lanes. Panics if `dst.len() > WIDTH`.
    #[inline]
    fn write_to_slice_partial(self, dst: &mut [Self::Elem]) {
        assert!(
            dst.len() <= Self::WIDTH,
            "slice of {} elements exceeds pack width {}",
            dst.len(),
            Self::WIDTH
        );
        unsafe { self.store_partial(dst.len(), dst.as_mut_ptr()) }
    }

    /// Lane-wise [`Real::lane_min`].
    fn min(self, other: Self) -> Self;
    /// Lane-wise [`Real::lane_max`].
    fn max(self, other: Self) -> Self;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;

    /// Exact `1 / x`.
    #[inline]
    fn rcp(self) -> Self {
        Self::ones() / self
    }

    /// Exact `1 / sqrt(x)`.
    #[inline]
    fn rsqrt(self) -> Self {
        Self::ones() / self.sqrt()
    }

    /// Reciprocal with relative error at most `1.5 * 2^-12` on packs with a
    /// hardware estimate; exact elsewhere.
    #[inline]
    fn approx_rcp(self) -> Self {
        self.rcp()
    }

    /// Reciprocal square root, same error bound as [`Pack::approx_rcp`].
    #[inline]
    fn approx_rsqrt(self) -> Self {
        self.rsqrt()
    }

    #[inline]
    fn sqr(self) -> Self {
        self * self
    }

    #[inline]
    fn cube(self) -> Self {
        self * self * self
    }

    /// `self * a + b`, rounded twice (not fused).
    #[inline]
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }

    /// `min(max(self, lo), hi)`.
    #[inline]
    fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    /// Round to nearest, ties to even.
    fn round(self) -> Self;
    fn trunc(self) -> Self;

    fn cmp_eq(self, other: Self) -> Self::Mask;
    /// True where the lanes differ or either is NaN.
    fn cmp_ne(self, other: Self) -> Self::Mask;
    fn cmp_lt(self, other: Self) -> Self::Mask;
    fn cmp_le(self, other: Self) -> Self::Mask;
    fn cmp_gt(self, other: Self) -> Self::Mask;
    fn cmp_ge(self, other: Self) -> Self::Mask;

    /// Sign bit set (includes `-0.0`).
    fn is_neg(self) -> Self::Mask;
    fn is_finite(self) -> Self::Mask;
    fn is_inf(self) -> Self::Mask;
    fn is_nan(self) -> Self::Mask;

    /// Lane-wise `if mask { a } else { b }`. Both operands are fully
    /// evaluated by the caller.
    fn select(mask: Self::Mask, a: Self, b: Self) -> Self;

    /// Sum of all lanes.
    fn hsum(self) -> Self::Elem;
    /// Minimum of all lanes.
    fn hmin(self) -> Self::Elem;
    /// Maximum of all lanes.
    fn hmax(self) -> Self::Elem;

    /// Apply a scalar function to each lane.
    #[inline]
    fn map_lanes<F: FnMut(Self::Elem) -> Self::Elem>(self, mut f: F) -> Self {
        Self::from_fn(|i| f(self.extract(i)))
    }

    /// Apply a scalar function to each pair of lanes.
    #[inline]
    fn zip_lanes<F: FnMut(Self::Elem, Self::Elem) -> Self::Elem>(self, other: Self, mut f: F) -> Self {
        Self::from_fn(|i| f(self.extract(i), other.extract(i)))
    }
}

// ── MaskPack ────────────────────────────────────────────────────────

/// Group of truth lanes parallel to a [`Pack`].
///
/// Every lane is either all bits set or all bits clear. Mask arithmetic is
/// bitwise only.
pub trait MaskPack:
    Copy
    + Debug
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
{
    const WIDTH: usize;

    /// Every lane true.
    fn all_true() -> Self;

    /// Every lane false.
    fn all_false() -> Self;

    /// Lane `i` is `f(i)`.
    fn from_fn<F: FnMut(usize) -> bool>(f: F) -> Self;

    /// Panics if `lanes.len() != WIDTH`.
    #[inline]
    fn from_bools(lanes: &[bool]) -> Self {
        assert_eq!(
            lanes.len(),
            Self::WIDTH,
            "expected {} mask lanes, got {}",
            Self::WIDTH,
            lanes.len()
        );
        Self::from_fn(|i| lanes[i])
    }

    /// Lane `i`. Panics if `i >= WIDTH`.
    fn lane(self, i: usize) -> bool;

    /// Every lane true.
    fn all(self) -> bool;

    /// At least one lane true.
    fn any(self) -> bool;

    #[inline]
    fn none(self) -> bool {
        !self.any()
    }

    /// Number of true lanes.
    #[inline]
    fn count(self) -> usize {
        (0..Self::WIDTH).filter(|&i| self.lane(i)).count()
    }
}

/// Whether every lane of `m` is true.
#[inline]
pub fn all_true<M: MaskPack>(m: M) -> bool {
    m.all()
}

/// Whether any lane of `m` is true.
#[inline]
pub fn any_true<M: MaskPack>(m: M) -> bool {
    m.any()
}

// ── CPU feature report ──────────────────────────────────────────────

/// Vector instruction sets relevant to the pack kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub sse41: bool,
    pub avx: bool,
    pub avx2: bool,
    pub fma: bool,
}

impl CpuFeatures {
    /// Features this build was compiled to assume.
    pub const fn compiled() -> Self {
        Self {
            sse2: cfg!(target_feature = "sse2"),
            sse41: cfg!(target_feature = "sse4.1"),
            avx: cfg!(target_feature = "avx"),
            avx2: cfg!(target_feature = "avx2"),
            fma: cfg!(target_feature = "fma"),
        }
    }

    /// Whether the running CPU provides every feature the build assumes.
    pub fn covers(&self, required: &CpuFeatures) -> bool {
        (!required.sse2 || self.sse2)
            && (!required.sse41 || self.sse41)
            && (!required.avx || self.avx)
            && (!required.avx2 || self.avx2)
            && (!required.fma || self.fma)
    }

    #[cfg(all(feature = "std", target_arch = "x86_64"))]
    fn detect() -> Self {
        Self {
            sse2: std::arch::is_x86_feature_detected!("sse2"),
            sse41: std::arch::is_x86_feature_detected!("sse4.1"),
            avx: std::arch::is_x86_feature_detected!("avx"),
            avx2: std::arch::is_x86_feature_detected!("avx2"),
            fma: std::arch::is_x86_feature_detected!("fma"),
        }
    }

    #[cfg(all(feature = "std", not(target_arch = "x86_64")))]
    fn detect() -> Self {
        Self::default()
    }
}

/// Features of the running CPU, detected once per process.
#[cfg(feature = "std")]
pub fn cpu_features() -> &'static CpuFeatures {
    static FEATURES: std::sync::OnceLock<CpuFeatures> = std::sync::OnceLock::new();
    FEATURES.get_or_init(|| {
        let detected = CpuFeatures::detect();
        #[cfg(feature = "tracing")]
        tracing::debug!(?detected, kind = DefaultKind::NAME, "detected cpu features");
        detected
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;

    fn check_lane_ops<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let w = P::WIDTH;
        let e = |x: f32| -> P::Elem { x.into() };
        let a = P::from_fn(|i| e(i as f32 * 1.5 - 2.0));
        let b = P::from_fn(|i| e(3.0 - i as f32));
        let sum = a + b;
        let diff = a - b;
        let prod = a * b;
        let quot = a / b;
        let mn = a.min(b);
        let mx = a.max(b);
        for i in 0..w {
            let (x, y) = (a.extract(i), b.extract(i));
            assert_eq!(sum.extract(i), x + y);
            assert_eq!(diff.extract(i), x - y);
            assert_eq!(prod.extract(i), x * y);
            assert_eq!(Real::to_bits(quot.extract(i)), Real::to_bits(x / y));
            assert_eq!(mn.extract(i), x.lane_min(y));
            assert_eq!(mx.extract(i), x.lane_max(y));
            assert_eq!((-a).extract(i), -x);
        }
    }

    fn check_partial<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let w = P::WIDTH;
        let sentinel: P::Elem = (-99.0_f32).into();
        for n in 0..=w {
            let src: Vec<P::Elem> = (0..n).map(|i| ((i + 1) as f32).into()).collect();
            let p = P::from_slice_partial(&src);
            for i in 0..w {
                let want = if i < n { src[i] } else { (0.0_f32).into() };
                assert_eq!(p.extract(i), want, "load_partial n={n} lane={i}");
            }
            let mut dst = vec![sentinel; w + 1];
            p.write_to_slice_partial(&mut dst[..n]);
            assert_eq!(&dst[..n], &src[..]);
            assert!(dst[n..].iter().all(|&x| x == sentinel), "store_partial n={n} wrote past end");
        }
    }

    fn check_horizontal<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let p = P::from_fn(|i| ((i as f32) - 1.0).into());
        let w = P::WIDTH as f32;
        let want_sum: f32 = (0..P::WIDTH).map(|i| i as f32 - 1.0).sum();
        assert_eq!(p.hsum(), want_sum.into());
        assert_eq!(p.hmin(), (-1.0_f32).into());
        assert_eq!(p.hmax(), (w - 2.0).into());
        assert_eq!(p.to_scalar(), (-1.0_f32).into());
    }

    fn check_select<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let m = <P::Mask as MaskPack>::from_fn(|i| i % 2 == 0);
        let a = P::from_fn(|i| ((i + 1) as f32).into());
        let b = P::from_fn(|i| ((i + 1) as f32 * 10.0).into());
        let r = P::select(m, a, b);
        for i in 0..P::WIDTH {
            let want = if i % 2 == 0 { a.extract(i) } else { b.extract(i) };
            assert_eq!(r.extract(i), want);
        }
        assert!(all_true(<P::Mask as MaskPack>::all_true()));
        assert!(!any_true(<P::Mask as MaskPack>::all_false()));
        assert_eq!(m.count(), P::WIDTH.div_ceil(2));
        assert_eq!((!m).count(), P::WIDTH / 2);
        assert_eq!((m | !m).count(), P::WIDTH);
        assert_eq!((m & !m).count(), 0);
        assert_eq!((m ^ m).count(), 0);
    }

    fn check_classify<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let specials: [f32; 8] = [-0.0, 0.0, -1.0, f32::INFINITY, f32::NEG_INFINITY, f32::NAN, 2.5, -f32::NAN];
        for chunk in specials.chunks(1) {
            let x: P::Elem = chunk[0].into();
            let p = P::splat(x);
            assert_eq!(p.is_neg().lane(0), x.is_sign_negative(), "is_neg({x:?})");
            assert_eq!(p.is_finite().lane(0), x.is_finite(), "is_finite({x:?})");
            assert_eq!(p.is_inf().lane(0), x.is_infinite(), "is_inf({x:?})");
            assert_eq!(p.is_nan().lane(0), x.is_nan(), "is_nan({x:?})");
            assert_eq!(Real::to_bits(p.abs().extract(0)), Real::to_bits(x.abs()));
        }
    }

    fn check_rounding<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        let xs: [f32; 9] = [-2.5, -1.5, -0.5, 0.5, 1.5, 2.5, 2.7, -2.7, 3.0];
        for &x in &xs {
            let v: P::Elem = x.into();
            let p = P::splat(v);
            assert_eq!(p.floor().extract(0), v.floor(), "floor({x})");
            assert_eq!(Real::to_bits(p.ceil().extract(0)), Real::to_bits(v.ceil()), "ceil({x})");
            assert_eq!(Real::to_bits(p.trunc().extract(0)), Real::to_bits(v.trunc()), "trunc({x})");
            assert_eq!(Real::to_bits(p.round().extract(0)), Real::to_bits(v.round_even()), "round({x})");
        }
    }

    fn check_all<P: Pack>()
    where
        P::Elem: From<f32>,
    {
        check_lane_ops::<P>();
        check_partial::<P>();
        check_horizontal::<P>();
        check_select::<P>();
        check_classify::<P>();
        check_rounding::<P>();
    }

    #[test]
    fn single_packs() {
        check_all::<Single<f32>>();
        check_all::<Single<f64>>();
    }

    #[test]
    fn portable_packs() {
        check_all::<PackOf<f32, Portable>>();
        check_all::<PackOf<f64, Portable>>();
        check_all::<ArrayPack<f32, 8>>();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn sse_packs() {
        check_all::<F32x4>();
        check_all::<F64x2>();
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
    #[test]
    fn avx_packs() {
        check_all::<F32x8>();
        check_all::<F64x4>();
    }

    #[test]
    fn mask_select_concrete() {
        // mask=[T,F,T,F], a=[1,2,3,4], b=[10,20,30,40] -> [1,20,3,40]
        fn run<P: Pack<Elem = f32>>() {
            let m = P::Mask::from_bools(&[true, false, true, false]);
            let a = P::from_slice(&[1.0, 2.0, 3.0, 4.0]);
            let b = P::from_slice(&[10.0, 20.0, 30.0, 40.0]);
            let mut out = [0.0_f32; 4];
            P::select(m, a, b).write_to_slice(&mut out);
            assert_eq!(out, [1.0, 20.0, 3.0, 40.0]);
        }
        run::<ArrayPack<f32, 4>>();
        #[cfg(target_arch = "x86_64")]
        run::<F32x4>();
    }

    #[test]
    fn default_kind_widths() {
        let bits = <DefaultKind as SimdKind>::REGISTER_BITS;
        assert_eq!(<PackOf<f32, DefaultKind> as Pack>::WIDTH, bits / 32);
        assert_eq!(<PackOf<f64, DefaultKind> as Pack>::WIDTH, bits / 64);
        assert_eq!(<PackOf<f64, ScalarKind> as Pack>::WIDTH, 1);
    }

    #[test]
    fn capability_sets() {
        assert!(has_vector_form::<f32, DefaultKind>(OpSet::ARITH.union(OpSet::SQRT)));
        assert!(!has_vector_form::<f64, DefaultKind>(OpSet::EMULATED));
        assert!(has_vector_form::<f64, ScalarKind>(OpSet::EMULATED));
        assert!(OpSet::ALL.contains(OpSet::VECTOR_BASE));
        assert!(!OpSet::NONE.contains(OpSet::ARITH));
        #[cfg(all(target_arch = "x86_64", not(target_feature = "sse4.1")))]
        assert!(!has_vector_form::<f32, Sse>(OpSet::ROUND));
    }

    #[test]
    fn approx_within_bound() {
        fn run<P: Pack<Elem = f32>>() {
            for x in [0.1_f32, 1.0, 3.0, 7.5, 1234.5] {
                let p = P::splat(x);
                let r = p.approx_rcp().extract(0);
                let s = p.approx_rsqrt().extract(0);
                let tol = 1.5 / 4096.0 + 1e-6;
                assert!(((r - 1.0 / x) * x).abs() <= tol, "approx_rcp({x}) = {r}");
                assert!(((s - 1.0 / x.sqrt()) * x.sqrt()).abs() <= tol, "approx_rsqrt({x}) = {s}");
            }
        }
        run::<Single<f32>>();
        #[cfg(target_arch = "x86_64")]
        run::<F32x4>();
        #[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
        run::<F32x8>();
    }

    #[cfg(feature = "std")]
    #[test]
    fn cpu_supports_build() {
        let detected = cpu_features();
        assert!(detected.covers(&CpuFeatures::compiled()));
        assert!(core::ptr::eq(detected, cpu_features()));
    }
}
