//! Borrowed, non-owning windows into column-major storage.
//!
//! - [`MatrixView`] / [`MatrixViewMut`]: a rectangular block. Each column is
//!   contiguous, but consecutive columns are `col_stride` apart, so only
//!   per-column traversal can use full packs.
//! - [`StridedView`] / [`StridedViewMut`]: arbitrary row and column steps
//!   (e.g. a transposed view). Neither traversal is contiguous.

use core::ops::{Index, IndexMut};

use crate::Matrix;
use crate::traits::{MatrixMut, MatrixRef};

/// Number of storage elements spanned by a block view.
#[inline]
pub(crate) fn block_span(nrows: usize, ncols: usize, col_stride: usize) -> usize {
    if nrows == 0 || ncols == 0 { 0 } else { (ncols - 1) * col_stride + nrows }
}

/// Number of storage elements spanned by a strided view.
#[inline]
pub(crate) fn strided_span(nrows: usize, ncols: usize, row_step: usize, col_step: usize) -> usize {
    if nrows == 0 || ncols == 0 {
        0
    } else {
        (nrows - 1) * row_step + (ncols - 1) * col_step + 1
    }
}

/// Start offset of the `nrows x ncols` block at `(row, col)` inside a
/// column-major matrix with `ld` rows and `total_cols` columns.
#[inline]
pub(crate) fn block_offset(
    ld: usize,
    total_cols: usize,
    (row, col): (usize, usize),
    (nrows, ncols): (usize, usize),
) -> usize {
    assert!(
        row + nrows <= ld && col + ncols <= total_cols,
        "block {}x{} at ({}, {}) exceeds {}x{} matrix",
        nrows,
        ncols,
        row,
        col,
        ld,
        total_cols
    );
    if nrows == 0 || ncols == 0 { 0 } else { col * ld + row }
}

// ── MatrixView ──────────────────────────────────────────────────────

/// Read-only rectangular block, columns `col_stride` elements apart.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    pub(crate) data: &'a [T],
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) col_stride: usize,
}

impl<'a, T> MatrixView<'a, T> {
    /// View `data` as `nrows x ncols`, column `j` starting at `j * col_stride`.
    ///
    /// Panics if `col_stride < nrows` (for more than one column) or `data`
    /// is too short.
    pub fn new(data: &'a [T], nrows: usize, ncols: usize, col_stride: usize) -> Self {
        assert!(ncols <= 1 || col_stride >= nrows, "column stride {col_stride} is less than {nrows} rows");
        let span = block_span(nrows, ncols, col_stride);
        assert!(
            data.len() >= span,
            "slice length {} too short for {}x{} view with stride {}",
            data.len(),
            nrows,
            ncols,
            col_stride
        );
        Self { data: &data[..span], nrows, ncols, col_stride }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Distance between the starts of consecutive columns.
    #[inline]
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Column `j` as a contiguous slice.
    #[inline]
    pub fn col_slice(&self, j: usize) -> &'a [T] {
        assert!(j < self.ncols, "column {j} out of range for {} columns", self.ncols);
        let start = j * self.col_stride;
        &self.data[start..start + self.nrows]
    }
}

impl<T> MatrixRef<T> for MatrixView<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self[(row, col)]
    }
}

impl<T> Index<(usize, usize)> for MatrixView<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &self.data[col * self.col_stride + row]
    }
}

// ── MatrixViewMut ───────────────────────────────────────────────────

/// Mutable rectangular block, columns `col_stride` elements apart.
#[derive(Debug)]
pub struct MatrixViewMut<'a, T> {
    pub(crate) data: &'a mut [T],
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) col_stride: usize,
}

impl<'a, T> MatrixViewMut<'a, T> {
    /// Mutable counterpart of [`MatrixView::new`].
    pub fn new(data: &'a mut [T], nrows: usize, ncols: usize, col_stride: usize) -> Self {
        assert!(ncols <= 1 || col_stride >= nrows, "column stride {col_stride} is less than {nrows} rows");
        let span = block_span(nrows, ncols, col_stride);
        assert!(
            data.len() >= span,
            "slice length {} too short for {}x{} view with stride {}",
            data.len(),
            nrows,
            ncols,
            col_stride
        );
        Self { data: &mut data[..span], nrows, ncols, col_stride }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_view(&self) -> MatrixView<'_, T> {
        MatrixView { data: &*self.data, nrows: self.nrows, ncols: self.ncols, col_stride: self.col_stride }
    }

    /// Column `j` as a mutable slice.
    #[inline]
    pub fn col_slice_mut(&mut self, j: usize) -> &mut [T] {
        assert!(j < self.ncols, "column {j} out of range for {} columns", self.ncols);
        let start = j * self.col_stride;
        &mut self.data[start..start + self.nrows]
    }
}

impl<T> MatrixRef<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self[(row, col)]
    }
}

impl<T> MatrixMut<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self[(row, col)]
    }
}

impl<T> Index<(usize, usize)> for MatrixViewMut<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &self.data[col * self.col_stride + row]
    }
}

impl<T> IndexMut<(usize, usize)> for MatrixViewMut<'_, T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &mut self.data[col * self.col_stride + row]
    }
}

// ── StridedView ─────────────────────────────────────────────────────

/// Read-only view with element `(i, j)` at `i * row_step + j * col_step`.
#[derive(Debug, Clone, Copy)]
pub struct StridedView<'a, T> {
    pub(crate) data: &'a [T],
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) row_step: usize,
    pub(crate) col_step: usize,
}

impl<'a, T> StridedView<'a, T> {
    /// Panics if `data` is too short for the requested shape and steps.
    pub fn new(data: &'a [T], nrows: usize, ncols: usize, row_step: usize, col_step: usize) -> Self {
        let span = strided_span(nrows, ncols, row_step, col_step);
        assert!(
            data.len() >= span,
            "slice length {} too short for {}x{} view with steps ({}, {})",
            data.len(),
            nrows,
            ncols,
            row_step,
            col_step
        );
        Self { data: &data[..span], nrows, ncols, row_step, col_step }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(row_step, col_step)`.
    #[inline]
    pub fn steps(&self) -> (usize, usize) {
        (self.row_step, self.col_step)
    }
}

impl<T> MatrixRef<T> for StridedView<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self[(row, col)]
    }
}

impl<T> Index<(usize, usize)> for StridedView<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &self.data[row * self.row_step + col * self.col_step]
    }
}

// ── StridedViewMut ──────────────────────────────────────────────────

/// Mutable view with element `(i, j)` at `i * row_step + j * col_step`.
///
/// Zero steps are rejected unless the matching dimension is 1. Other
/// overlapping step combinations are the caller's responsibility.
#[derive(Debug)]
pub struct StridedViewMut<'a, T> {
    pub(crate) data: &'a mut [T],
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) row_step: usize,
    pub(crate) col_step: usize,
}

impl<'a, T> StridedViewMut<'a, T> {
    pub fn new(data: &'a mut [T], nrows: usize, ncols: usize, row_step: usize, col_step: usize) -> Self {
        assert!(
            (nrows <= 1 || row_step > 0) && (ncols <= 1 || col_step > 0),
            "zero step would alias elements"
        );
        let span = strided_span(nrows, ncols, row_step, col_step);
        assert!(
            data.len() >= span,
            "slice length {} too short for {}x{} view with steps ({}, {})",
            data.len(),
            nrows,
            ncols,
            row_step,
            col_step
        );
        Self { data: &mut data[..span], nrows, ncols, row_step, col_step }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            data: &*self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            row_step: self.row_step,
            col_step: self.col_step,
        }
    }
}

impl<T> MatrixRef<T> for StridedViewMut<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self[(row, col)]
    }
}

impl<T> MatrixMut<T> for StridedViewMut<'_, T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self[(row, col)]
    }
}

impl<T> Index<(usize, usize)> for StridedViewMut<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &self.data[row * self.row_step + col * self.col_step]
    }
}

impl<T> IndexMut<(usize, usize)> for StridedViewMut<'_, T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        &mut self.data[row * self.row_step + col * self.col_step]
    }
}

// ── Views of Matrix ─────────────────────────────────────────────────

impl<T, const M: usize, const N: usize> Matrix<T, M, N> {
    /// Borrow the `nrows x ncols` block starting at `(row, col)`.
    ///
    /// ```
    /// use packmat::Matrix;
    /// let m: Matrix<f64, 3, 3> = Matrix::from_fn(|i, j| (3 * i + j) as f64);
    /// let v = m.view((1, 1), (2, 2));
    /// assert_eq!(v[(0, 0)], 4.0);
    /// assert_eq!(v[(1, 1)], 8.0);
    /// ```
    pub fn view(&self, (row, col): (usize, usize), (nrows, ncols): (usize, usize)) -> MatrixView<'_, T> {
        let off = block_offset(M, N, (row, col), (nrows, ncols));
        MatrixView::new(&self.as_slice()[off..], nrows, ncols, M)
    }

    /// Mutably borrow the `nrows x ncols` block starting at `(row, col)`.
    pub fn view_mut(
        &mut self,
        (row, col): (usize, usize),
        (nrows, ncols): (usize, usize),
    ) -> MatrixViewMut<'_, T> {
        let off = block_offset(M, N, (row, col), (nrows, ncols));
        MatrixViewMut::new(&mut self.as_mut_slice()[off..], nrows, ncols, M)
    }

    /// Borrow the transpose (`N x M`) without copying.
    ///
    /// ```
    /// use packmat::Matrix;
    /// let m = Matrix::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    /// let t = m.transpose_view();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 0)], 3.0);
    /// assert_eq!(t[(0, 1)], 4.0);
    /// ```
    pub fn transpose_view(&self) -> StridedView<'_, T> {
        StridedView::new(self.as_slice(), N, M, M, 1)
    }

    /// Mutably borrow the transpose (`N x M`).
    pub fn transpose_view_mut(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut::new(self.as_mut_slice(), N, M, M, 1)
    }
}
