//! Expression and destination traits, and the expression node types.
//!
//! A [`MatExpr`] describes a matrix-shaped value that can hand out vector
//! readers, either over its whole column-major run ([`MatExpr::linear`]) or
//! one column at a time ([`MatExpr::column`]). Both readers always exist;
//! [`MatExpr::LAYOUT`] says which of them map onto contiguous memory and is
//! what the policy selector looks at.
//!
//! Shapes are carried twice: `ROWS`/`COLS` are `Some` when known at compile
//! time (fixed-size [`Matrix`]), and [`MatExpr::nrows`]/[`MatExpr::ncols`]
//! give the runtime values. Conflicting static shapes fail to build;
//! conflicting runtime shapes are reported by [`MatExpr::check_dims`].

use crate::error::DimensionMismatch;
use crate::matrix::{Matrix, MatrixView, MatrixViewMut, StridedView, StridedViewMut};
use crate::simd::{OpSet, Pack, Single};
use crate::traits::Real;

use super::accessor::{
    ConstReader, ContReader, ContWriter, GatherReader, GatherWriter, MaskReader, StepReader,
    StepWriter, VecReader, VecWriter,
};
use super::funs::{Fun1, Fun2, Fun3, Pred1, Pred2};
use super::policy::{Layout, merge_dim};

/// Matrix-shaped source of packs.
pub trait MatExpr {
    type Elem: Real;

    /// Row count, if fixed at compile time.
    const ROWS: Option<usize>;
    /// Column count, if fixed at compile time.
    const COLS: Option<usize>;
    const LAYOUT: Layout;
    /// Operation classes used anywhere in the expression.
    const OPS: OpSet;

    type Linear<'a>: VecReader<Elem = Self::Elem>
    where
        Self: 'a;
    type Column<'a>: VecReader<Elem = Self::Elem>
    where
        Self: 'a;

    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;

    /// Verify that all operands agree on shape.
    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        Ok(())
    }

    /// Reader over all `nrows * ncols` elements in column-major order.
    fn linear(&self) -> Self::Linear<'_>;

    /// Reader over the `nrows` elements of column `j`.
    fn column(&self, j: usize) -> Self::Column<'_>;
}

/// Writable destination.
pub trait MatSink: MatExpr {
    type LinearMut<'a>: VecWriter<Elem = Self::Elem>
    where
        Self: 'a;
    type ColumnMut<'a>: VecWriter<Elem = Self::Elem>
    where
        Self: 'a;

    fn linear_mut(&mut self) -> Self::LinearMut<'_>;
    fn column_mut(&mut self, j: usize) -> Self::ColumnMut<'_>;
}

/// Matrix-shaped source of mask packs.
pub trait MaskExpr {
    type Elem: Real;

    const ROWS: Option<usize>;
    const COLS: Option<usize>;
    const LAYOUT: Layout;
    const OPS: OpSet;

    type Linear<'a>: MaskReader<Elem = Self::Elem>
    where
        Self: 'a;
    type Column<'a>: MaskReader<Elem = Self::Elem>
    where
        Self: 'a;

    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        Ok(())
    }

    fn linear(&self) -> Self::Linear<'_>;
    fn column(&self, j: usize) -> Self::Column<'_>;
}

#[inline]
fn agree(expected: (usize, usize), got: (usize, usize)) -> Result<(), DimensionMismatch> {
    if expected == got {
        Ok(())
    } else {
        Err(DimensionMismatch { expected, got })
    }
}

// ── Leaves: Matrix ──────────────────────────────────────────────────

impl<T: Real, const M: usize, const N: usize> MatExpr for Matrix<T, M, N> {
    type Elem = T;
    const ROWS: Option<usize> = Some(M);
    const COLS: Option<usize> = Some(N);
    const LAYOUT: Layout = Layout::CONTIGUOUS;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a> = ContReader<'a, T>;
    type Column<'a> = ContReader<'a, T>;

    #[inline]
    fn nrows(&self) -> usize {
        M
    }

    #[inline]
    fn ncols(&self) -> usize {
        N
    }

    #[inline]
    fn linear(&self) -> ContReader<'_, T> {
        ContReader::new(self.as_slice())
    }

    #[inline]
    fn column(&self, j: usize) -> ContReader<'_, T> {
        ContReader::new(self.col_slice(j))
    }
}

impl<T: Real, const M: usize, const N: usize> MatSink for Matrix<T, M, N> {
    type LinearMut<'a> = ContWriter<'a, T>;
    type ColumnMut<'a> = ContWriter<'a, T>;

    #[inline]
    fn linear_mut(&mut self) -> ContWriter<'_, T> {
        ContWriter::new(self.as_mut_slice())
    }

    #[inline]
    fn column_mut(&mut self, j: usize) -> ContWriter<'_, T> {
        ContWriter::new(self.col_slice_mut(j))
    }
}

// ── Leaves: DynMatrix ───────────────────────────────────────────────

#[cfg(feature = "alloc")]
impl<T: Real> MatExpr for crate::DynMatrix<T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::CONTIGUOUS;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a> = ContReader<'a, T>;
    type Column<'a> = ContReader<'a, T>;

    #[inline]
    fn nrows(&self) -> usize {
        crate::DynMatrix::nrows(self)
    }

    #[inline]
    fn ncols(&self) -> usize {
        crate::DynMatrix::ncols(self)
    }

    #[inline]
    fn linear(&self) -> ContReader<'_, T> {
        ContReader::new(self.as_slice())
    }

    #[inline]
    fn column(&self, j: usize) -> ContReader<'_, T> {
        ContReader::new(self.col_slice(j))
    }
}

#[cfg(feature = "alloc")]
impl<T: Real> MatSink for crate::DynMatrix<T> {
    type LinearMut<'a> = ContWriter<'a, T>;
    type ColumnMut<'a> = ContWriter<'a, T>;

    #[inline]
    fn linear_mut(&mut self) -> ContWriter<'_, T> {
        ContWriter::new(self.as_mut_slice())
    }

    #[inline]
    fn column_mut(&mut self, j: usize) -> ContWriter<'_, T> {
        ContWriter::new(self.col_slice_mut(j))
    }
}

// ── Leaves: views ───────────────────────────────────────────────────

impl<'v, T: Real> MatExpr for MatrixView<'v, T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::PER_COLUMN;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a>
        = GatherReader<'a, T>
    where
        Self: 'a;
    type Column<'a>
        = ContReader<'a, T>
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
    fn linear(&self) -> GatherReader<'_, T> {
        GatherReader::new(self.data, self.nrows, 1, self.col_stride)
    }

    #[inline]
    fn column(&self, j: usize) -> ContReader<'_, T> {
        ContReader::new(self.col_slice(j))
    }
}

impl<'v, T: Real> MatExpr for MatrixViewMut<'v, T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::PER_COLUMN;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a>
        = GatherReader<'a, T>
    where
        Self: 'a;
    type Column<'a>
        = ContReader<'a, T>
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
    fn linear(&self) -> GatherReader<'_, T> {
        GatherReader::new(&*self.data, self.nrows, 1, self.col_stride)
    }

    #[inline]
    fn column(&self, j: usize) -> ContReader<'_, T> {
        let start = j * self.col_stride;
        ContReader::new(&self.data[start..start + self.nrows])
    }
}

impl<'v, T: Real> MatSink for MatrixViewMut<'v, T> {
    type LinearMut<'a>
        = GatherWriter<'a, T>
    where
        Self: 'a;
    type ColumnMut<'a>
        = ContWriter<'a, T>
    where
        Self: 'a;

    #[inline]
    fn linear_mut(&mut self) -> GatherWriter<'_, T> {
        GatherWriter::new(&mut *self.data, self.nrows, 1, self.col_stride)
    }

    #[inline]
    fn column_mut(&mut self, j: usize) -> ContWriter<'_, T> {
        ContWriter::new(self.col_slice_mut(j))
    }
}

#[inline]
fn tail<T>(data: &[T], start: usize) -> &[T] {
    &data[start.min(data.len())..]
}

#[inline]
fn tail_mut<T>(data: &mut [T], start: usize) -> &mut [T] {
    let start = start.min(data.len());
    &mut data[start..]
}

impl<'v, T: Real> MatExpr for StridedView<'v, T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::STRIDED;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a>
        = GatherReader<'a, T>
    where
        Self: 'a;
    type Column<'a>
        = StepReader<'a, T>
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
    fn linear(&self) -> GatherReader<'_, T> {
        GatherReader::new(self.data, self.nrows, self.row_step, self.col_step)
    }

    #[inline]
    fn column(&self, j: usize) -> StepReader<'_, T> {
        StepReader::new(tail(self.data, j * self.col_step), self.row_step)
    }
}

impl<'v, T: Real> MatExpr for StridedViewMut<'v, T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::STRIDED;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a>
        = GatherReader<'a, T>
    where
        Self: 'a;
    type Column<'a>
        = StepReader<'a, T>
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
    fn linear(&self) -> GatherReader<'_, T> {
        GatherReader::new(self.data, self.nrows, self.row_step, self.col_step)
    }

    #[inline]
    fn column(&self, j: usize) -> StepReader<'_, T> {
        StepReader::new(tail(self.data, j * self.col_step), self.row_step)
    }
}

impl<'v, T: Real> MatSink for StridedViewMut<'v, T> {
    type LinearMut<'a>
        = GatherWriter<'a, T>
    where
        Self: 'a;
    type ColumnMut<'a>
        = StepWriter<'a, T>
    where
        Self: 'a;

    #[inline]
    fn linear_mut(&mut self) -> GatherWriter<'_, T> {
        GatherWriter::new(&mut *self.data, self.nrows, self.row_step, self.col_step)
    }

    #[inline]
    fn column_mut(&mut self, j: usize) -> StepWriter<'_, T> {
        let step = self.row_step;
        StepWriter::new(tail_mut(&mut *self.data, j * self.col_step), step)
    }
}

// ── Borrowed expressions ────────────────────────────────────────────

impl<E: MatExpr> MatExpr for &E {
    type Elem = E::Elem;
    const ROWS: Option<usize> = E::ROWS;
    const COLS: Option<usize> = E::COLS;
    const LAYOUT: Layout = E::LAYOUT;
    const OPS: OpSet = E::OPS;

    type Linear<'a>
        = E::Linear<'a>
    where
        Self: 'a;
    type Column<'a>
        = E::Column<'a>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        (**self).check_dims()
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        (**self).linear()
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        (**self).column(j)
    }
}

impl<C: MaskExpr> MaskExpr for &C {
    type Elem = C::Elem;
    const ROWS: Option<usize> = C::ROWS;
    const COLS: Option<usize> = C::COLS;
    const LAYOUT: Layout = C::LAYOUT;
    const OPS: OpSet = C::OPS;

    type Linear<'a>
        = C::Linear<'a>
    where
        Self: 'a;
    type Column<'a>
        = C::Column<'a>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        (**self).check_dims()
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        (**self).linear()
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        (**self).column(j)
    }
}

// ── Constant ────────────────────────────────────────────────────────

/// Every element equal to `value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Const<T> {
    value: T,
    nrows: usize,
    ncols: usize,
}

impl<T: Real> Const<T> {
    pub fn new(value: T, nrows: usize, ncols: usize) -> Self {
        Self { value, nrows, ncols }
    }
}

impl<T: Real> MatExpr for Const<T> {
    type Elem = T;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout::CONTIGUOUS;
    const OPS: OpSet = OpSet::NONE;

    type Linear<'a> = ConstReader<T>;
    type Column<'a> = ConstReader<T>;

    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn linear(&self) -> ConstReader<T> {
        ConstReader::new(self.value)
    }

    #[inline]
    fn column(&self, _j: usize) -> ConstReader<T> {
        ConstReader::new(self.value)
    }
}

// ── Map nodes ───────────────────────────────────────────────────────

/// `f(a)` lane-wise.
#[derive(Clone, Copy, Debug)]
pub struct Map1<F, A> {
    f: F,
    a: A,
}

/// `f(a, b)` lane-wise.
#[derive(Clone, Copy, Debug)]
pub struct Map2<F, A, B> {
    f: F,
    a: A,
    b: B,
}

/// `f(a, b, c)` lane-wise.
#[derive(Clone, Copy, Debug)]
pub struct Map3<F, A, B, C> {
    f: F,
    a: A,
    b: B,
    c: C,
}

#[derive(Debug)]
pub struct Map1Reader<'f, F, RA> {
    f: &'f F,
    a: RA,
}

#[derive(Debug)]
pub struct Map2Reader<'f, F, RA, RB> {
    f: &'f F,
    a: RA,
    b: RB,
}

#[derive(Debug)]
pub struct Map3Reader<'f, F, RA, RB, RC> {
    f: &'f F,
    a: RA,
    b: RB,
    c: RC,
}

impl<F: Fun1<RA::Elem>, RA: VecReader> VecReader for Map1Reader<'_, F, RA> {
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        let a = unsafe { self.a.read::<P>(i) };
        self.f.call(a)
    }
}

impl<F, RA, RB> VecReader for Map2Reader<'_, F, RA, RB>
where
    F: Fun2<RA::Elem>,
    RA: VecReader,
    RB: VecReader<Elem = RA::Elem>,
{
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        let (a, b) = unsafe { (self.a.read::<P>(i), self.b.read::<P>(i)) };
        self.f.call(a, b)
    }
}

impl<F, RA, RB, RC> VecReader for Map3Reader<'_, F, RA, RB, RC>
where
    F: Fun3<RA::Elem>,
    RA: VecReader,
    RB: VecReader<Elem = RA::Elem>,
    RC: VecReader<Elem = RA::Elem>,
{
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        let (a, b, c) =
            unsafe { (self.a.read::<P>(i), self.b.read::<P>(i), self.c.read::<P>(i)) };
        self.f.call(a, b, c)
    }
}

impl<F: Fun1<A::Elem>, A: MatExpr> MatExpr for Map1<F, A> {
    type Elem = A::Elem;
    const ROWS: Option<usize> = A::ROWS;
    const COLS: Option<usize> = A::COLS;
    const LAYOUT: Layout = A::LAYOUT;
    const OPS: OpSet = F::OPS.union(A::OPS);

    type Linear<'a>
        = Map1Reader<'a, F, A::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = Map1Reader<'a, F, A::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        Map1Reader { f: &self.f, a: self.a.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        Map1Reader { f: &self.f, a: self.a.column(j) }
    }
}

impl<F, A, B> MatExpr for Map2<F, A, B>
where
    F: Fun2<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    type Elem = A::Elem;
    const ROWS: Option<usize> = merge_dim(A::ROWS, B::ROWS);
    const COLS: Option<usize> = merge_dim(A::COLS, B::COLS);
    const LAYOUT: Layout = A::LAYOUT.and(B::LAYOUT);
    const OPS: OpSet = F::OPS.union(A::OPS).union(B::OPS);

    type Linear<'a>
        = Map2Reader<'a, F, A::Linear<'a>, B::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = Map2Reader<'a, F, A::Column<'a>, B::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()?;
        self.b.check_dims()?;
        agree((self.a.nrows(), self.a.ncols()), (self.b.nrows(), self.b.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        Map2Reader { f: &self.f, a: self.a.linear(), b: self.b.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        Map2Reader { f: &self.f, a: self.a.column(j), b: self.b.column(j) }
    }
}

impl<F, A, B, C> MatExpr for Map3<F, A, B, C>
where
    F: Fun3<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    C: MatExpr<Elem = A::Elem>,
{
    type Elem = A::Elem;
    const ROWS: Option<usize> = merge_dim(merge_dim(A::ROWS, B::ROWS), C::ROWS);
    const COLS: Option<usize> = merge_dim(merge_dim(A::COLS, B::COLS), C::COLS);
    const LAYOUT: Layout = A::LAYOUT.and(B::LAYOUT).and(C::LAYOUT);
    const OPS: OpSet = F::OPS.union(A::OPS).union(B::OPS).union(C::OPS);

    type Linear<'a>
        = Map3Reader<'a, F, A::Linear<'a>, B::Linear<'a>, C::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = Map3Reader<'a, F, A::Column<'a>, B::Column<'a>, C::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()?;
        self.b.check_dims()?;
        self.c.check_dims()?;
        let shape = (self.a.nrows(), self.a.ncols());
        agree(shape, (self.b.nrows(), self.b.ncols()))?;
        agree(shape, (self.c.nrows(), self.c.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        Map3Reader { f: &self.f, a: self.a.linear(), b: self.b.linear(), c: self.c.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        Map3Reader {
            f: &self.f,
            a: self.a.column(j),
            b: self.b.column(j),
            c: self.c.column(j),
        }
    }
}

// ── Select ──────────────────────────────────────────────────────────

/// Lane-wise `if cond { a } else { b }`. Both branches are evaluated.
#[derive(Clone, Copy, Debug)]
pub struct Select<C, A, B> {
    cond: C,
    a: A,
    b: B,
}

#[derive(Debug)]
pub struct SelectReader<RC, RA, RB> {
    cond: RC,
    a: RA,
    b: RB,
}

impl<RC, RA, RB> VecReader for SelectReader<RC, RA, RB>
where
    RC: MaskReader<Elem = RA::Elem>,
    RA: VecReader,
    RB: VecReader<Elem = RA::Elem>,
{
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        unsafe { P::select(self.cond.read_mask::<P>(i), self.a.read::<P>(i), self.b.read::<P>(i)) }
    }
}

impl<C, A, B> MatExpr for Select<C, A, B>
where
    C: MaskExpr<Elem = A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    type Elem = A::Elem;
    const ROWS: Option<usize> = merge_dim(merge_dim(C::ROWS, A::ROWS), B::ROWS);
    const COLS: Option<usize> = merge_dim(merge_dim(C::COLS, A::COLS), B::COLS);
    const LAYOUT: Layout = C::LAYOUT.and(A::LAYOUT).and(B::LAYOUT);
    const OPS: OpSet = C::OPS.union(A::OPS).union(B::OPS);

    type Linear<'a>
        = SelectReader<C::Linear<'a>, A::Linear<'a>, B::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = SelectReader<C::Column<'a>, A::Column<'a>, B::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.cond.check_dims()?;
        self.a.check_dims()?;
        self.b.check_dims()?;
        let shape = (self.a.nrows(), self.a.ncols());
        agree(shape, (self.cond.nrows(), self.cond.ncols()))?;
        agree(shape, (self.b.nrows(), self.b.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        SelectReader { cond: self.cond.linear(), a: self.a.linear(), b: self.b.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        SelectReader { cond: self.cond.column(j), a: self.a.column(j), b: self.b.column(j) }
    }
}

// ── Repeated vectors ────────────────────────────────────────────────

/// `nrows x ncols` matrix whose every column is the column vector `a`.
#[derive(Clone, Copy, Debug)]
pub struct RepeatCol<A> {
    a: A,
    ncols: usize,
}

/// `nrows x ncols` matrix whose every row is the row vector `a`.
#[derive(Clone, Copy, Debug)]
pub struct RepeatRow<A> {
    a: A,
    nrows: usize,
}

/// Linear reader over a repeated column: element `l` is `src[l % period]`.
#[derive(Debug)]
pub struct WrapReader<R> {
    src: R,
    period: usize,
}

impl<R: VecReader> VecReader for WrapReader<R> {
    type Elem = R::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        P::from_fn(|k| unsafe { self.src.read::<Single<R::Elem>>((i + k) % self.period).to_scalar() })
    }
}

/// Linear reader over a repeated row: element `l` is `src[l / stretch]`.
#[derive(Debug)]
pub struct StretchReader<R> {
    src: R,
    stretch: usize,
}

impl<R: VecReader> VecReader for StretchReader<R> {
    type Elem = R::Elem;

    #[inline(always)]
    unsafe fn read<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P {
        P::from_fn(|k| unsafe { self.src.read::<Single<R::Elem>>((i + k) / self.stretch).to_scalar() })
    }
}

impl<A: MatExpr> MatExpr for RepeatCol<A> {
    type Elem = A::Elem;
    const ROWS: Option<usize> = A::ROWS;
    const COLS: Option<usize> = None;
    const LAYOUT: Layout = Layout { linear: false, percol: A::LAYOUT.percol };
    const OPS: OpSet = A::OPS;

    type Linear<'a>
        = WrapReader<A::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = A::Column<'a>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()?;
        agree((self.a.nrows(), 1), (self.a.nrows(), self.a.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        WrapReader { src: self.a.linear(), period: self.a.nrows() }
    }

    #[inline]
    fn column(&self, _j: usize) -> Self::Column<'_> {
        self.a.column(0)
    }
}

impl<A: MatExpr> MatExpr for RepeatRow<A> {
    type Elem = A::Elem;
    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = A::COLS;
    const LAYOUT: Layout = Layout::PER_COLUMN;
    const OPS: OpSet = A::OPS;

    type Linear<'a>
        = StretchReader<A::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = ConstReader<A::Elem>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()?;
        agree((1, self.a.ncols()), (self.a.nrows(), self.a.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        StretchReader { src: self.a.linear(), stretch: self.nrows }
    }

    /// Broadcasts element `(0, j)` of the row. NaN if `a` has no such element.
    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        let value = if self.a.nrows() > 0 && j < self.a.ncols() {
            // SAFETY: column `j` of `a` has at least one element.
            unsafe { self.a.column(j).read::<Single<A::Elem>>(0).to_scalar() }
        } else {
            <A::Elem as num_traits::Float>::nan()
        };
        ConstReader::new(value)
    }
}

// ── Mask nodes ──────────────────────────────────────────────────────

/// `pred(a)` lane-wise.
#[derive(Clone, Copy, Debug)]
pub struct Test1<Pr, A> {
    pred: Pr,
    a: A,
}

/// `pred(a, b)` lane-wise.
#[derive(Clone, Copy, Debug)]
pub struct Test2<Pr, A, B> {
    pred: Pr,
    a: A,
    b: B,
}

#[derive(Debug)]
pub struct Test1Reader<'p, Pr, RA> {
    pred: &'p Pr,
    a: RA,
}

#[derive(Debug)]
pub struct Test2Reader<'p, Pr, RA, RB> {
    pred: &'p Pr,
    a: RA,
    b: RB,
}

impl<Pr: Pred1<RA::Elem>, RA: VecReader> MaskReader for Test1Reader<'_, Pr, RA> {
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read_mask<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P::Mask {
        let a = unsafe { self.a.read::<P>(i) };
        self.pred.test(a)
    }
}

impl<Pr, RA, RB> MaskReader for Test2Reader<'_, Pr, RA, RB>
where
    Pr: Pred2<RA::Elem>,
    RA: VecReader,
    RB: VecReader<Elem = RA::Elem>,
{
    type Elem = RA::Elem;

    #[inline(always)]
    unsafe fn read_mask<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P::Mask {
        let (a, b) = unsafe { (self.a.read::<P>(i), self.b.read::<P>(i)) };
        self.pred.test(a, b)
    }
}

impl<Pr: Pred1<A::Elem>, A: MatExpr> MaskExpr for Test1<Pr, A> {
    type Elem = A::Elem;
    const ROWS: Option<usize> = A::ROWS;
    const COLS: Option<usize> = A::COLS;
    const LAYOUT: Layout = A::LAYOUT;
    const OPS: OpSet = Pr::OPS.union(A::OPS);

    type Linear<'a>
        = Test1Reader<'a, Pr, A::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = Test1Reader<'a, Pr, A::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        Test1Reader { pred: &self.pred, a: self.a.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        Test1Reader { pred: &self.pred, a: self.a.column(j) }
    }
}

impl<Pr, A, B> MaskExpr for Test2<Pr, A, B>
where
    Pr: Pred2<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    type Elem = A::Elem;
    const ROWS: Option<usize> = merge_dim(A::ROWS, B::ROWS);
    const COLS: Option<usize> = merge_dim(A::COLS, B::COLS);
    const LAYOUT: Layout = A::LAYOUT.and(B::LAYOUT);
    const OPS: OpSet = Pr::OPS.union(A::OPS).union(B::OPS);

    type Linear<'a>
        = Test2Reader<'a, Pr, A::Linear<'a>, B::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = Test2Reader<'a, Pr, A::Column<'a>, B::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.a.ncols()
    }

    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.a.check_dims()?;
        self.b.check_dims()?;
        agree((self.a.nrows(), self.a.ncols()), (self.b.nrows(), self.b.ncols()))
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        Test2Reader { pred: &self.pred, a: self.a.linear(), b: self.b.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        Test2Reader { pred: &self.pred, a: self.a.column(j), b: self.b.column(j) }
    }
}

/// Lane-wise negation of a mask expression.
#[derive(Clone, Copy, Debug)]
pub struct TestNot<C> {
    c: C,
}

#[derive(Debug)]
pub struct NotReader<RC> {
    c: RC,
}

impl<RC: MaskReader> MaskReader for NotReader<RC> {
    type Elem = RC::Elem;

    #[inline(always)]
    unsafe fn read_mask<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P::Mask {
        !unsafe { self.c.read_mask::<P>(i) }
    }
}

impl<C: MaskExpr> MaskExpr for TestNot<C> {
    type Elem = C::Elem;
    const ROWS: Option<usize> = C::ROWS;
    const COLS: Option<usize> = C::COLS;
    const LAYOUT: Layout = C::LAYOUT;
    const OPS: OpSet = C::OPS;

    type Linear<'a>
        = NotReader<C::Linear<'a>>
    where
        Self: 'a;
    type Column<'a>
        = NotReader<C::Column<'a>>
    where
        Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.c.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.c.ncols()
    }

    #[inline]
    fn check_dims(&self) -> Result<(), DimensionMismatch> {
        self.c.check_dims()
    }

    #[inline]
    fn linear(&self) -> Self::Linear<'_> {
        NotReader { c: self.c.linear() }
    }

    #[inline]
    fn column(&self, j: usize) -> Self::Column<'_> {
        NotReader { c: self.c.column(j) }
    }
}

macro_rules! mask_binop {
    ($(#[$doc:meta])* $node:ident, $reader:ident, $op:tt) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug)]
        pub struct $node<C, D> {
            c: C,
            d: D,
        }

        #[derive(Debug)]
        pub struct $reader<RC, RD> {
            c: RC,
            d: RD,
        }

        impl<RC: MaskReader, RD: MaskReader<Elem = RC::Elem>> MaskReader for $reader<RC, RD> {
            type Elem = RC::Elem;

            #[inline(always)]
            unsafe fn read_mask<P: Pack<Elem = Self::Elem>>(&self, i: usize) -> P::Mask {
                unsafe { self.c.read_mask::<P>(i) $op self.d.read_mask::<P>(i) }
            }
        }

        impl<C: MaskExpr, D: MaskExpr<Elem = C::Elem>> MaskExpr for $node<C, D> {
            type Elem = C::Elem;
            const ROWS: Option<usize> = merge_dim(C::ROWS, D::ROWS);
            const COLS: Option<usize> = merge_dim(C::COLS, D::COLS);
            const LAYOUT: Layout = C::LAYOUT.and(D::LAYOUT);
            const OPS: OpSet = C::OPS.union(D::OPS);

            type Linear<'a>
                = $reader<C::Linear<'a>, D::Linear<'a>>
            where
                Self: 'a;
            type Column<'a>
                = $reader<C::Column<'a>, D::Column<'a>>
            where
                Self: 'a;

            #[inline]
            fn nrows(&self) -> usize {
                self.c.nrows()
            }

            #[inline]
            fn ncols(&self) -> usize {
                self.c.ncols()
            }

            fn check_dims(&self) -> Result<(), DimensionMismatch> {
                self.c.check_dims()?;
                self.d.check_dims()?;
                agree((self.c.nrows(), self.c.ncols()), (self.d.nrows(), self.d.ncols()))
            }

            #[inline]
            fn linear(&self) -> Self::Linear<'_> {
                $reader { c: self.c.linear(), d: self.d.linear() }
            }

            #[inline]
            fn column(&self, j: usize) -> Self::Column<'_> {
                $reader { c: self.c.column(j), d: self.d.column(j) }
            }
        }
    };
}

mask_binop! {
    /// Lane-wise `c && d`.
    TestAnd, AndReader, &
}

mask_binop! {
    /// Lane-wise `c || d`.
    TestOr, OrReader, |
}

// ── Builders ────────────────────────────────────────────────────────

/// `f(a)` lane-wise.
#[inline]
pub fn map<F, A>(f: F, a: A) -> Map1<F, A>
where
    F: Fun1<A::Elem>,
    A: MatExpr,
{
    Map1 { f, a }
}

/// `f(a, b)` lane-wise.
#[inline]
pub fn map2<F, A, B>(f: F, a: A, b: B) -> Map2<F, A, B>
where
    F: Fun2<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    Map2 { f, a, b }
}

/// `f(a, b, c)` lane-wise.
#[inline]
pub fn map3<F, A, B, C>(f: F, a: A, b: B, c: C) -> Map3<F, A, B, C>
where
    F: Fun3<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    C: MatExpr<Elem = A::Elem>,
{
    Map3 { f, a, b, c }
}

/// Lane-wise `if cond { a } else { b }`.
#[inline]
pub fn select<C, A, B>(cond: C, a: A, b: B) -> Select<C, A, B>
where
    C: MaskExpr<Elem = A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    Select { cond, a, b }
}

/// `pred(a)` lane-wise.
#[inline]
pub fn test<Pr, A>(pred: Pr, a: A) -> Test1<Pr, A>
where
    Pr: Pred1<A::Elem>,
    A: MatExpr,
{
    Test1 { pred, a }
}

/// `pred(a, b)` lane-wise.
#[inline]
pub fn test2<Pr, A, B>(pred: Pr, a: A, b: B) -> Test2<Pr, A, B>
where
    Pr: Pred2<A::Elem>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
{
    Test2 { pred, a, b }
}

#[inline]
pub fn test_not<C: MaskExpr>(c: C) -> TestNot<C> {
    TestNot { c }
}

#[inline]
pub fn test_and<C: MaskExpr, D: MaskExpr<Elem = C::Elem>>(c: C, d: D) -> TestAnd<C, D> {
    TestAnd { c, d }
}

#[inline]
pub fn test_or<C: MaskExpr, D: MaskExpr<Elem = C::Elem>>(c: C, d: D) -> TestOr<C, D> {
    TestOr { c, d }
}

/// Repeat the column vector `a` into `ncols` columns.
///
/// ```
/// use packmat::{Matrix, eval};
/// use packmat::matrix::aliases::ColumnVector;
///
/// let v: ColumnVector<f64, 2> = Matrix::new([[1.0], [2.0]]);
/// let mut m: Matrix<f64, 2, 3> = Matrix::zeros();
/// eval::evaluate(eval::repeat_col(&v, 3), &mut m);
/// assert_eq!(m, Matrix::new([[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]));
/// ```
#[inline]
pub fn repeat_col<A: MatExpr>(a: A, ncols: usize) -> RepeatCol<A> {
    RepeatCol { a, ncols }
}

/// Repeat the row vector `a` into `nrows` rows.
#[inline]
pub fn repeat_row<A: MatExpr>(a: A, nrows: usize) -> RepeatRow<A> {
    RepeatRow { a, nrows }
}

/// `nrows x ncols` expression with every element equal to `value`.
#[inline]
pub fn constant<T: Real>(value: T, nrows: usize, ncols: usize) -> Const<T> {
    Const::new(value, nrows, ncols)
}
