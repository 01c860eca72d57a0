//! Random matrices, drawn through the evaluation engine.
//!
//! A [`Distribution`] produces one value with [`Distribution::sample`] or a
//! whole pack with [`Distribution::sample_pack`]. The scalar form is the
//! width-1 pack form, and packs draw their lanes in order, so a matrix filled
//! under a scalar policy is bit-identical to one filled under a vector policy
//! from the same generator state.
//!
//! | Distribution | Parameters | Support |
//! |---|---|---|
//! | [`StdUniform`] | | [0, 1) |
//! | [`Uniform`] | lower a, upper b | [a, b) |
//! | [`Exponential`] | rate λ | [0, ∞) |
//! | [`StdNormal`] | | (-∞, ∞) |
//! | [`Normal`] | mean μ, std. dev. σ | (-∞, ∞) |
//!
//! # Example
//!
//! ```
//! use packmat::Matrix;
//! use packmat::random::{Uniform, rand_fill};
//! use rand_xoshiro::Xoshiro256PlusPlus;
//! use rand_xoshiro::rand_core::SeedableRng;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
//! let mut a: Matrix<f64, 4, 4> = Matrix::zeros();
//! rand_fill(&mut a, Uniform::new(-1.0, 1.0).unwrap(), &mut rng);
//! assert!(a.iter().all(|&x| (-1.0..1.0).contains(&x)));
//! ```

mod exponential;
mod normal;
mod uniform;


pub use exponential::Exponential;
pub use normal::{Normal, StdNormal, norm_inv};
pub use uniform::{StdUniform, Uniform};

use core::cell::RefCell;
use core::marker::PhantomData;

use rand_core::RngCore;

use crate::eval::accessor::VecReader;
use crate::eval::expr::{MatExpr, MatSink};
use crate::eval::{Layout, evaluate};
use crate::simd::{Element, OpSet, Pack, Single};
use crate::traits::Real;

/// Errors from distribution construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionError {
    /// A parameter is out of its valid range.
    InvalidParameter,
}

impl core::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DistributionError::InvalidParameter => {
                write!(f, "distribution parameter out of valid range")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DistributionError {}

/// Float that can be drawn uniformly from `[1, 2)` by filling its mantissa
/// with random bits.
pub trait UnitFloat: Real {
    fn unit_sample<R: RngCore + ?Sized>(rng: &mut R) -> Self;
}

impl UnitFloat for f32 {
    #[inline]
    fn unit_sample<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
        f32::from_bits((rng.next_u32() >> 9) | 0x3F80_0000)
    }
}

impl UnitFloat for f64 {
    #[inline]
    fn unit_sample<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
        f64::from_bits((rng.next_u64() >> 12) | 0x3FF0_0000_0000_0000)
    }
}

/// Source of random values of type `T`.
pub trait Distribution<T: Real> {
    /// Operation classes used by [`Distribution::sample_pack`].
    const OPS: OpSet;

    /// One pack. Lanes are drawn from `rng` in lane order.
    fn sample_pack<P: Pack<Elem = T>, R: RngCore + ?Sized>(&self, rng: &mut R) -> P;

    /// One value.
    #[inline]
    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> T {
        self.sample_pack::<Single<T>, R>(rng).to_scalar()
    }
}

/// Matrix-shaped expression whose elements are fresh draws.
///
/// Every read consumes the generator, so the expression must be read exactly
/// once per element in column-major order. The evaluator does that for both
/// traversal orders; composing it into nodes that read an operand twice is
/// not supported.
#[derive(Debug)]
pub struct RandExpr<'r, T, D, R> {
    distr: D,
    rng: &'r RefCell<R>,
    nrows: usize,
    ncols: usize,
    _elem: PhantomData<T>,
}

impl<'r, T, D, R> RandExpr<'r, T, D, R> {
    pub fn new(distr: D, rng: &'r RefCell<R>, nrows: usize, ncols: usize) -> Self {
        Self { distr, rng, nrows, ncols, _elem: PhantomData }
    }
}

/// Reader that draws a pack per read.
#[derive(Debug)]
pub struct RandReader<'a, T, D, R> {
    distr: &'a D,
    rng: &'a RefCell<R>,
    _elem: PhantomData<T>,
}

impl<T, D, R> VecReader for RandReader<'_, T, D, R>
where
    T: Real,
    D: Distribution<T>,
    R: RngCore,
{
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, _i: usize) -> P {
        self.distr.sample_pack(&mut *self.rng.borrow_mut())
    }
}

impl<T, D, R> MatExpr for RandExpr<'_, T, D, R>
where
    T: Real,
    D: Distribution<T>,
    R: RngCore,
{
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::CONTIGUOUS;
    const OPS: OpSet = D::OPS;

    type Linear<'a>
        = RandReader<'a, T, D, R>
    where
        Self: 'a;
    type Column<'a>
        = RandReader<'a, T, D, R>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn linear(&self) -> RandReader<'_, T, D, R> {
        RandReader { distr: &self.distr, rng: self.rng, _elem: PhantomData }
    }

    #[inline]
    fn column(&self, _j: usize) -> RandReader<'_, T, D, R> {
        RandReader { distr: &self.distr, rng: self.rng, _elem: PhantomData }
    }
}

/// Overwrite `dst` with draws from `distr`, in column-major order.
pub fn rand_fill<T, D, S, R>(dst: &mut S, distr: D, rng: &mut R)
where
    T: Element,
    D: Distribution<T>,
    S: MatSink<Elem = T>,
    R: RngCore + ?Sized,
{
    let cell = RefCell::new(rng);
    let (nrows, ncols) = (dst.nrows(), dst.ncols());
    evaluate(RandExpr::new(distr, &cell, nrows, ncols), dst);
}
