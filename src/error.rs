/// Dimension mismatch between an expression and its destination, between
/// two operands of one expression, or in a fallible conversion.
///
/// Detected once, before any element is written.
///
/// # Example
///
/// ```
/// use packmat::{DimensionMismatch, DynMatrix, eval};
///
/// let a = DynMatrix::zeros(2, 3, 0.0_f64);
/// let mut b = DynMatrix::zeros(3, 2, 0.0_f64);
/// let err = eval::try_evaluate(&a, &mut b).unwrap_err();
/// assert_eq!(err, DimensionMismatch { expected: (3, 2), got: (2, 3) });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    /// Expected `(rows, cols)`.
    pub expected: (usize, usize),
    /// Got `(rows, cols)`.
    pub got: (usize, usize),
}

impl core::fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "dimension mismatch: expected {}x{}, got {}x{}",
            self.expected.0, self.expected.1, self.got.0, self.got.1
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DimensionMismatch {}
