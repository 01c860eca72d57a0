//! # packmat
//!
//! Dense column-major matrices with a lane-vectorized elementwise evaluation
//! engine, no-std compatible. Every expression runs through the same kernel
//! code either one element at a time or a register-width pack at a time, and
//! both paths produce bit-identical results.
//!
//! ## Quick start
//!
//! ```
//! use packmat::{Matrix, eval};
//! use packmat::eval::funs::{Abs, Mul};
//!
//! let a = Matrix::new([[1.0_f32, -2.0, 3.0], [-4.0, 5.0, -6.0]]);
//! let b: Matrix<f32, 2, 3> = Matrix::fill(2.0);
//! let mut c: Matrix<f32, 2, 3> = Matrix::zeros();
//!
//! // c = |a| * b, evaluated with full packs plus a scalar tail
//! eval::evaluate(eval::map2(Mul, eval::map(Abs, &a), &b), &mut c);
//! assert_eq!(c[(1, 2)], 12.0);
//! assert_eq!(eval::sum(&c), 42.0);
//! ```
//!
//! ## Modules
//!
//! - [`simd`] — The pack abstraction: [`Pack`] / [`MaskPack`] over a scalar
//!   array backing (any width, including the width-1 [`Single`]), 128-bit SSE
//!   registers, and 256-bit AVX registers. The pack kind is fixed at compile
//!   time from the target features ([`DefaultKind`]).
//!
//! - [`matrix`] — Fixed-size `Matrix<T, M, N>` with const-generic dimensions
//!   and column-major storage, plus borrowed block views ([`MatrixView`],
//!   [`MatrixViewMut`]) and arbitrary-step views ([`StridedView`]).
//!
//! - [`dynmatrix`] — Heap-allocated `DynMatrix<T>` with runtime dimensions
//!   (requires `alloc` feature, included with `std`).
//!
//! - [`eval`] — Expression nodes, the static policy selector, the linear and
//!   per-column evaluation loops, and reductions.
//!
//! - [`random`] — Distributions with a vectorized sample form, and random
//!   matrix fill through the evaluator (requires `random` feature).
//!
//! - [`traits`] — Element trait hierarchy:
//!   - [`Scalar`] — all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`] — real floats (`Scalar + Float`)
//!   - [`Real`] — pack lane elements (`f32`, `f64`)
//!   - [`MatrixRef`] / [`MatrixMut`] — generic read/write element access
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Implies `alloc`. Hardware FPU via system libm |
//! | `alloc`   | via std  | `DynMatrix` (heap-allocated, runtime-sized) |
//! | `random`  | yes      | Distributions and `rand_fill` via `rand_core` |
//! | `tracing` | no       | `tracing` spans and policy events on evaluator entry points |
//! | `all`     | no       | All features |

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod dynmatrix;
pub mod error;
pub mod eval;
pub mod matrix;
#[cfg(feature = "random")]
pub mod random;
pub mod simd;
pub mod traits;

pub use error::DimensionMismatch;
pub use matrix::aliases::{ColumnVector, Matrix2, Matrix3, Matrix4, Matrix8, RowVector};
pub use matrix::{Matrix, MatrixView, MatrixViewMut, StridedView, StridedViewMut};
#[cfg(feature = "alloc")]
pub use dynmatrix::{DynMatrix, DynMatrixf32, DynMatrixf64};
pub use simd::{DefaultKind, Element, MaskPack, Pack, PackOf, Single};
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Real, Scalar};
