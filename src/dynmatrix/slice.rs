use super::DynMatrix;

impl<T> DynMatrix<T> {
    /// View the entire matrix as a flat slice in column-major order.
    ///
    /// ```
    /// use packmat::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    /// ```
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// View the entire matrix as a mutable flat slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// View column `j` as a slice.
    ///
    /// ```
    /// use packmat::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m.col_slice(0), &[1.0, 4.0]);
    /// assert_eq!(m.col_slice(2), &[3.0, 6.0]);
    /// ```
    #[inline]
    pub fn col_slice(&self, j: usize) -> &[T] {
        assert!(j < self.ncols, "column {j} out of range for {} columns", self.ncols);
        let start = j * self.nrows;
        &self.data[start..start + self.nrows]
    }

    /// View column `j` as a mutable slice.
    #[inline]
    pub fn col_slice_mut(&mut self, j: usize) -> &mut [T] {
        assert!(j < self.ncols, "column {j} out of range for {} columns", self.ncols);
        let start = j * self.nrows;
        let end = start + self.nrows;
        &mut self.data[start..end]
    }

    /// Iterate over all elements in column-major order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate mutably over all elements in column-major order.
    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<'a, T> IntoIterator for &'a DynMatrix<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynMatrix<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_mut_slice() {
        let mut m = DynMatrix::from_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        m.as_mut_slice()[1] = 99.0;
        assert_eq!(m[(1, 0)], 99.0);
    }

    #[test]
    fn col_slice_mut() {
        let mut m = DynMatrix::zeros(2, 3, 0.0_f32);
        m.col_slice_mut(1).copy_from_slice(&[7.0, 8.0]);
        assert_eq!(m[(0, 1)], 7.0);
        assert_eq!(m[(1, 1)], 8.0);
    }

    #[test]
    #[should_panic(expected = "column 3 out of range")]
    fn col_slice_out_of_range() {
        let m = DynMatrix::zeros(2, 3, 0.0_f64);
        let _ = m.col_slice(3);
    }

    #[test]
    fn iter_mut() {
        let mut m = DynMatrix::from_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        for x in m.iter_mut() {
            *x *= 2.0;
        }
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(1, 1)], 8.0);
    }

    #[test]
    fn into_iter_for_loop() {
        let m = DynMatrix::from_slice(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
        let mut sum = 0.0;
        for &x in &m {
            sum += x;
        }
        assert_eq!(sum, 10.0);
    }
}
