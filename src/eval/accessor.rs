//! Vector readers and writers: non-owning cursors into matrix storage.
//!
//! A reader hands out one pack at a time, addressed by the element index
//! within its run (the whole matrix for linear traversal, one column for
//! per-column traversal). The evaluator picks the pack type; the width-1
//! [`Single`](crate::simd::Single) pack is used for scalar policies and tails.
//!
//! Readers borrow their storage for `'a` and never outlive an evaluation.

use core::marker::PhantomData;

use crate::simd::Pack;
use crate::traits::Real;

/// Source of packs.
pub trait VecReader {
    type Elem: Real;

    /// Pack of elements `i..i + P::WIDTH` of the run.
    ///
    /// # Safety
    ///
    /// `i + P::WIDTH` must not exceed the run length the reader was built for.
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P;
}

/// Destination of packs. Also readable, for accumulating updates.
pub trait VecWriter: VecReader {
    /// Store `v` into elements `i..i + P::WIDTH` of the run.
    ///
    /// # Safety
    ///
    /// Same bound as [`VecReader::read`].
    unsafe fn write<P: Pack<Elem = Self::Elem>>(&mut self, i: usize, v: P);
}

/// Source of mask packs, produced by predicates.
pub trait MaskReader {
    type Elem: Real;

    /// Mask for elements `i..i + P::WIDTH` of the run.
    ///
    /// # Safety
    ///
    /// Same bound as [`VecReader::read`].
    unsafe fn read_mask<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P::Mask;
}

// ── Contiguous ──────────────────────────────────────────────────────

/// Reader over a contiguous slice.
#[derive(Debug, Clone, Copy)]
pub struct ContReader<'a, T> {
    ptr: *const T,
    len: usize,
    _marker: PhantomData<&'a [T]>,
}

impl<'a, T> ContReader<'a, T> {
    #[inline]
    pub fn new(data: &'a [T]) -> Self {
        Self { ptr: data.as_ptr(), len: data.len(), _marker: PhantomData }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Real> VecReader for ContReader<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        debug_assert!(i + P::WIDTH <= self.len);
        unsafe { P::load(self.ptr.add(i)) }
    }
}

/// Writer over a contiguous mutable slice.
#[derive(Debug)]
pub struct ContWriter<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> ContWriter<'a, T> {
    #[inline]
    pub fn new(data: &'a mut [T]) -> Self {
        Self { ptr: data.as_mut_ptr(), len: data.len(), _marker: PhantomData }
    }
}

impl<T: Real> VecReader for ContWriter<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        debug_assert!(i + P::WIDTH <= self.len);
        unsafe { P::load(self.ptr.add(i)) }
    }
}

impl<T: Real> VecWriter for ContWriter<'_, T> {
    #[inline(always)]
    unsafe fn write<P: Pack<Elem = T>>(&mut self, i: usize, v: P) {
        debug_assert!(i + P::WIDTH <= self.len);
        unsafe { v.store(self.ptr.add(i)) }
    }
}

// ── Stepped ─────────────────────────────────────────────────────────

/// Reader over elements `step` apart.
#[derive(Debug, Clone, Copy)]
pub struct StepReader<'a, T> {
    ptr: *const T,
    step: usize,
    _marker: PhantomData<&'a [T]>,
}

impl<'a, T> StepReader<'a, T> {
    /// Element `k` of the run is `data[k * step]`. `data` must cover the
    /// whole run.
    #[inline]
    pub fn new(data: &'a [T], step: usize) -> Self {
        Self { ptr: data.as_ptr(), step, _marker: PhantomData }
    }
}

impl<T: Real> VecReader for StepReader<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        P::from_fn(|k| unsafe { *self.ptr.add((i + k) * self.step) })
    }
}

/// Writer over elements `step` apart.
#[derive(Debug)]
pub struct StepWriter<'a, T> {
    ptr: *mut T,
    step: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> StepWriter<'a, T> {
    #[inline]
    pub fn new(data: &'a mut [T], step: usize) -> Self {
        Self { ptr: data.as_mut_ptr(), step, _marker: PhantomData }
    }
}

impl<T: Real> VecReader for StepWriter<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        P::from_fn(|k| unsafe { *self.ptr.add((i + k) * self.step) })
    }
}

impl<T: Real> VecWriter for StepWriter<'_, T> {
    #[inline(always)]
    unsafe fn write<P: Pack<Elem = T>>(&mut self, i: usize, v: P) {
        for k in 0..P::WIDTH {
            unsafe { *self.ptr.add((i + k) * self.step) = v.extract(k) };
        }
    }
}

// ── Gathered ────────────────────────────────────────────────────────

/// Linear reader over a non-contiguous 2-D layout.
///
/// Linear index `l` maps to row `l % nrows`, column `l / nrows`, stored at
/// `row * row_step + col * col_step`.
#[derive(Debug, Clone, Copy)]
pub struct GatherReader<'a, T> {
    ptr: *const T,
    nrows: usize,
    row_step: usize,
    col_step: usize,
    _marker: PhantomData<&'a [T]>,
}

#[inline(always)]
fn gather_offset(l: usize, nrows: usize, row_step: usize, col_step: usize) -> usize {
    (l % nrows) * row_step + (l / nrows) * col_step
}

impl<'a, T> GatherReader<'a, T> {
    #[inline]
    pub fn new(data: &'a [T], nrows: usize, row_step: usize, col_step: usize) -> Self {
        Self { ptr: data.as_ptr(), nrows, row_step, col_step, _marker: PhantomData }
    }
}

impl<T: Real> VecReader for GatherReader<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        P::from_fn(|k| {
            let off = gather_offset(i + k, self.nrows, self.row_step, self.col_step);
            unsafe { *self.ptr.add(off) }
        })
    }
}

/// Linear writer over a non-contiguous 2-D layout.
#[derive(Debug)]
pub struct GatherWriter<'a, T> {
    ptr: *mut T,
    nrows: usize,
    row_step: usize,
    col_step: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> GatherWriter<'a, T> {
    #[inline]
    pub fn new(data: &'a mut [T], nrows: usize, row_step: usize, col_step: usize) -> Self {
        Self { ptr: data.as_mut_ptr(), nrows, row_step, col_step, _marker: PhantomData }
    }
}

impl<T: Real> VecReader for GatherWriter<'_, T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, i: usize) -> P {
        P::from_fn(|k| {
            let off = gather_offset(i + k, self.nrows, self.row_step, self.col_step);
            unsafe { *self.ptr.add(off) }
        })
    }
}

impl<T: Real> VecWriter for GatherWriter<'_, T> {
    #[inline(always)]
    unsafe fn write<P: Pack<Elem = T>>(&mut self, i: usize, v: P) {
        for k in 0..P::WIDTH {
            let off = gather_offset(i + k, self.nrows, self.row_step, self.col_step);
            unsafe { *self.ptr.add(off) = v.extract(k) };
        }
    }
}

// ── Constant ────────────────────────────────────────────────────────

/// Reader that broadcasts one value.
#[derive(Debug, Clone, Copy)]
pub struct ConstReader<T> {
    value: T,
}

impl<T> ConstReader<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Real> VecReader for ConstReader<T> {
    type Elem = T;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = T>>(&self, _i: usize) -> P {
        P::splat(self.value)
    }
}
