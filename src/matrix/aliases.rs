use super::Matrix;

pub type Matrix2<T> = Matrix<T, 2, 2>;
pub type Matrix3<T> = Matrix<T, 3, 3>;
pub type Matrix4<T> = Matrix<T, 4, 4>;
pub type Matrix8<T> = Matrix<T, 8, 8>;

/// `N × 1` matrix, the shape row-wise reductions write into.
pub type ColumnVector<T, const N: usize> = Matrix<T, N, 1>;

/// `1 × N` matrix, the shape column-wise reductions write into.
pub type RowVector<T, const N: usize> = Matrix<T, 1, N>;
