use crate::Matrix;
use crate::traits::Scalar;

// ── Storage runs ────────────────────────────────────────────────────
//
// A fixed-size matrix is one contiguous column-major run, so both of its
// evaluator readers are plain slice cursors: `as_slice` backs the linear
// reader, `col_slice` the per-column one.

impl<T, const M: usize, const N: usize> Matrix<T, M, N> {
    /// All `M * N` elements as one column-major run.
    ///
    /// This is the run a linear policy walks, full packs first and the tail
    /// one element at a time.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_flattened()
    }

    /// Mutable form of [`as_slice`](Self::as_slice); the destination run of a
    /// linear policy.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_flattened_mut()
    }

    /// The `M` elements of column `j`, the run a per-column policy walks.
    #[inline]
    pub fn col_slice(&self, j: usize) -> &[T] {
        &self.data[j]
    }

    #[inline]
    pub fn col_slice_mut(&mut self, j: usize) -> &mut [T] {
        &mut self.data[j]
    }
}

impl<T: Scalar, const M: usize, const N: usize> Matrix<T, M, N> {
    /// Build from a column-major run of exactly `M * N` elements.
    ///
    /// Panics if the length differs.
    ///
    /// ```
    /// use packmat::Matrix;
    /// let m: Matrix<f64, 2, 3> = Matrix::from_slice(&[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    /// assert_eq!(m[(1, 0)], 4.0);
    /// assert_eq!(m[(0, 2)], 3.0);
    /// ```
    pub fn from_slice(run: &[T]) -> Self {
        assert!(
            run.len() == M * N,
            "run of {} elements cannot fill a {M}x{N} matrix",
            run.len()
        );
        let mut m = Self::zeros();
        m.as_mut_slice().copy_from_slice(run);
        m
    }
}

// ── Iterators ───────────────────────────────────────────────────────

impl<T, const M: usize, const N: usize> Matrix<T, M, N> {
    /// Elements in column-major order, the order random fills draw them in.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<'a, T, const M: usize, const N: usize> IntoIterator for &'a Matrix<T, M, N> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_are_column_major() {
        let m = Matrix::new([[1.0_f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(m.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        // each column run is a window of the linear run
        for j in 0..3 {
            assert_eq!(m.col_slice(j), &m.as_slice()[2 * j..2 * j + 2]);
        }
    }

    #[test]
    fn column_run_writes_through() {
        let mut m: Matrix<f64, 2, 3> = Matrix::zeros();
        m.col_slice_mut(1).copy_from_slice(&[7.0, 8.0]);
        assert_eq!(m.as_slice(), &[0.0, 0.0, 7.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn from_run_round_trips() {
        let run = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let m: Matrix<f64, 2, 3> = Matrix::from_slice(&run);
        assert_eq!(m.as_slice(), &run);
        assert_eq!(m[(1, 2)], 6.0);
    }

    #[test]
    #[should_panic(expected = "cannot fill a 2x2 matrix")]
    fn from_short_run() {
        let _: Matrix<f64, 2, 2> = Matrix::from_slice(&[1.0, 2.0, 3.0]);
    }

    #[test]
    fn iteration_order() {
        let mut m = Matrix::new([[1.0, 2.0], [3.0, 4.0]]);
        for x in m.iter_mut() {
            *x *= 2.0;
        }
        let seen: [f64; 4] = core::array::from_fn(|k| *m.iter().nth(k).unwrap_or(&0.0));
        assert_eq!(seen, [2.0, 6.0, 4.0, 8.0]);
        let total: f64 = (&m).into_iter().sum();
        assert_eq!(total, 20.0);
    }
}
