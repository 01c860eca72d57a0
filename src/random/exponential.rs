use rand_core::RngCore;

use super::{Distribution, DistributionError, UnitFloat};
use crate::simd::{OpSet, Pack};

/// Exponential distribution with rate λ, sampled by inversion.
///
/// The logarithm has no vector form, so expressions drawing from it always
/// run a scalar policy.
///
/// ```
/// use packmat::random::Exponential;
///
/// let e = Exponential::new(2.0_f64).unwrap();
/// assert_eq!(e.mean(), 0.5);
/// assert!(Exponential::new(0.0_f64).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Exponential<T> {
    lambda: T,
    inv_lambda: T,
}

impl<T: UnitFloat> Exponential<T> {
    /// Create an exponential distribution with rate `lambda`. Requires finite `lambda > 0`.
    pub fn new(lambda: T) -> Result<Self, DistributionError> {
        if !(lambda > T::zero()) || !lambda.is_finite() {
            return Err(DistributionError::InvalidParameter);
        }
        Ok(Self { lambda, inv_lambda: lambda.recip() })
    }

    pub fn rate(&self) -> T {
        self.lambda
    }

    pub fn mean(&self) -> T {
        self.inv_lambda
    }

    pub fn variance(&self) -> T {
        self.inv_lambda * self.inv_lambda
    }
}

impl<T: UnitFloat> Distribution<T> for Exponential<T> {
    const OPS: OpSet = OpSet::ARITH.union(OpSet::EMULATED);

    #[inline]
    fn sample_pack<P: Pack<Elem = T>, R: RngCore + ?Sized>(&self, rng: &mut R) -> P {
        // 2 - c lies in (0, 1], so the log is finite
        let c = P::from_fn(|_| T::unit_sample(rng));
        let v = P::splat(T::one() + T::one()) - c;
        v.map_lanes(|x| -x.ln()) * P::splat(self.inv_lambda)
    }
}
