use num_traits::{NumCast, One};
use rand_core::RngCore;

use super::{Distribution, DistributionError, UnitFloat};
use crate::simd::{OpSet, Pack};
use crate::traits::Real;

/// Uniform on `[0, 1)`.
///
/// ```
/// use packmat::random::{Distribution, StdUniform};
/// use rand_xoshiro::Xoshiro256PlusPlus;
/// use rand_xoshiro::rand_core::SeedableRng;
///
/// let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
/// let x: f32 = StdUniform.sample(&mut rng);
/// assert!((0.0..1.0).contains(&x));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StdUniform;

impl<T: UnitFloat> Distribution<T> for StdUniform {
    const OPS: OpSet = OpSet::ARITH;

    #[inline]
    fn sample_pack<P: Pack<Elem = T>, R: RngCore + ?Sized>(&self, rng: &mut R) -> P {
        P::from_fn(|_| T::unit_sample(rng)) - P::ones()
    }
}

/// Continuous uniform distribution on `[a, b)`.
///
/// ```
/// use packmat::random::Uniform;
///
/// let u = Uniform::new(2.0_f64, 4.0).unwrap();
/// assert_eq!(u.mean(), 3.0);
/// assert!(Uniform::new(1.0_f64, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Uniform<T> {
    a: T,
    b: T,
    // unit draw c in [1, 2) maps to a + (c - 1) * span
    span: T,
    // largest float below b
    top: T,
}

impl<T: UnitFloat> Uniform<T> {
    /// Create a uniform distribution on `[a, b)`. Requires finite `a < b`
    /// with a finite width `b - a`.
    pub fn new(a: T, b: T) -> Result<Self, DistributionError> {
        if !(a < b) || !a.is_finite() || !b.is_finite() {
            return Err(DistributionError::InvalidParameter);
        }
        let span = b - a;
        if !span.is_finite() {
            return Err(DistributionError::InvalidParameter);
        }
        Ok(Self { a, b, span, top: below(b) })
    }

    pub fn low(&self) -> T {
        self.a
    }

    pub fn high(&self) -> T {
        self.b
    }

    pub fn mean(&self) -> T {
        (self.a + self.b) / (T::one() + T::one())
    }

    pub fn variance(&self) -> T {
        let twelve = <T as NumCast>::from(12.0).unwrap_or_else(T::nan);
        self.span * self.span / twelve
    }
}

impl<T: UnitFloat> Distribution<T> for Uniform<T> {
    const OPS: OpSet = OpSet::ARITH.union(OpSet::MINMAX);

    #[inline]
    fn sample_pack<P: Pack<Elem = T>, R: RngCore + ?Sized>(&self, rng: &mut R) -> P {
        let c = P::from_fn(|_| T::unit_sample(rng)) - P::ones();
        let v = c * P::splat(self.span) + P::splat(self.a);
        // the affine map can round onto either end
        v.max(P::splat(self.a)).min(P::splat(self.top))
    }
}

/// Largest finite value below `x`.
fn below<T: Real>(x: T) -> T {
    let one = <T::Bits as One>::one();
    if x > T::zero() {
        T::from_bits(x.to_bits() - one)
    } else if x < T::zero() {
        T::from_bits(x.to_bits() + one)
    } else {
        T::from_bits((-T::zero()).to_bits() | one)
    }
}
