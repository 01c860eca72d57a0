use core::fmt::Debug;
use num_traits::{Float, Num, One, PrimInt, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for floating-point matrix elements.
///
/// Required by operations that need `sqrt`, `abs`, rounding, etc.
pub trait FloatScalar: Scalar + Float {}

impl<T: Scalar + Float> FloatScalar for T {}

/// Element type that can live in a pack lane.
///
/// Implemented for `f32` and `f64`. Integer matrices can be stored and
/// indexed, but only `Real` element types can be evaluated or reduced.
///
/// The default methods define the lane semantics every pack backing must
/// reproduce bit for bit, so the scalar path and the register paths agree.
pub trait Real: FloatScalar + Default + Send + Sync + 'static {
    /// Unsigned integer with the same width, used for mask lanes and bit
    /// manipulation.
    type Bits: PrimInt + Debug + Default + Send + Sync + 'static;

    /// Raw IEEE-754 bit pattern.
    fn to_bits(self) -> Self::Bits;

    /// Inverse of [`Real::to_bits`].
    fn from_bits(bits: Self::Bits) -> Self;

    /// Round to nearest, ties to even.
    ///
    /// `Float::round` breaks ties away from zero; hardware rounding breaks
    /// them towards the even neighbour. This is the hardware behaviour.
    #[inline]
    fn round_even(self) -> Self {
        let r = self.round();
        let two = Self::one() + Self::one();
        if (r - self).abs() == two.recip() {
            (self / two).round() * two
        } else {
            r
        }
    }

    /// `if self < other { self } else { other }`.
    ///
    /// Returns `other` when either operand is NaN and when comparing `-0.0`
    /// with `+0.0`, matching `minps`.
    #[inline]
    fn lane_min(self, other: Self) -> Self {
        if self < other { self } else { other }
    }

    /// `if self > other { self } else { other }`, matching `maxps`.
    #[inline]
    fn lane_max(self, other: Self) -> Self {
        if self > other { self } else { other }
    }
}

impl Real for f32 {
    type Bits = u32;

    #[inline]
    fn to_bits(self) -> u32 {
        f32::to_bits(self)
    }

    #[inline]
    fn from_bits(bits: u32) -> f32 {
        f32::from_bits(bits)
    }
}

impl Real for f64 {
    type Bits = u64;

    #[inline]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    #[inline]
    fn from_bits(bits: u64) -> f64 {
        f64::from_bits(bits)
    }
}

/// Read-only access to a matrix-like type.
///
/// Implemented by [`Matrix`](crate::Matrix), [`DynMatrix`](crate::DynMatrix)
/// and the borrowed views, so element-level helpers can stay generic.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;
}

/// Mutable access to a matrix-like type.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;
}
