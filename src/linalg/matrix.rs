use std::ops::{Index, IndexMut};

#[cfg(feature = "ndarray")]
use ndarray::Array2;

/// A dense, resizable matrix of `f64` stored in column-major order.
///
/// Element `(row, col)` lives at `row + col * rows` in the backing buffer, which
/// is the layout expected by column-major linear algebra libraries.
///
/// Indexing is only checked in debug builds, and only for the row/column
/// bounds; release builds rely on the buffer bound check alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Construct a zero-filled `rows` x `cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Construct a matrix from row-major nested slices.
    ///
    /// # Panic
    /// Will panic if the rows don't all have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let n_cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut matrix = Matrix::new(rows.len(), n_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(
                row.len(),
                n_cols,
                "row {} has length {}, expected {}",
                i,
                row.len(),
                n_cols
            );
            for (j, value) in row.iter().enumerate() {
                matrix[(i, j)] = *value;
            }
        }
        matrix
    }

    /// The `n` x `n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut matrix = Matrix::new(n, n);
        for i in 0..n {
            matrix[(i, i)] = 1.0;
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Discard all values and reallocate a zero-filled `rows` x `cols` buffer.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.data.clear();
        self.data.resize(rows * cols, 0.0);
    }

    /// Swap two rows in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.cols {
            self.data.swap(a + col * self.rows, b + col * self.rows);
        }
    }

    /// Copy of row `row`.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.cols).map(|col| self[(row, col)]).collect()
    }

    /// Column `col` as a contiguous slice.
    pub fn column(&self, col: usize) -> &[f64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// The column-major backing buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable view of the column-major backing buffer, for handing the matrix
    /// to an external solver. The matrix can't be resized while it is borrowed.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// `self * other`
    ///
    /// # Panic
    /// Will panic if the inner dimensions don't match.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, other.rows,
            "cannot multiply {:?} by {:?}",
            self.shape(),
            other.shape()
        );
        let mut out = Matrix::new(self.rows, other.cols);
        for j in 0..other.cols {
            for k in 0..self.cols {
                let b = other[(k, j)];
                if b == 0.0 {
                    continue;
                }
                for i in 0..self.rows {
                    out[(i, j)] += self[(i, k)] * b;
                }
            }
        }
        out
    }

    #[cfg(feature = "ndarray")]
    /// Convert `self` into an [`ndarray::Array2`] of shape `(rows, cols)`.
    pub fn to_array(&self) -> crate::errors::Result<Array2<f64>> {
        use ndarray::ShapeBuilder;

        Ok(Array2::from_shape_vec(
            (self.rows, self.cols).f(),
            self.data.clone(),
        )?)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row + col * self.rows]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        debug_assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[row + col * self.rows]
    }
}

#[cfg(feature = "ndarray")]
impl TryFrom<Matrix> for Array2<f64> {
    type Error = crate::errors::GdalError;

    fn try_from(value: Matrix) -> Result<Self, Self::Error> {
        value.to_array()
    }
}

#[cfg(feature = "ndarray")]
impl From<Array2<f64>> for Matrix {
    fn from(value: Array2<f64>) -> Self {
        let (rows, cols) = value.dim();
        let mut matrix = Matrix::new(rows, cols);
        for ((row, col), v) in value.indexed_iter() {
            matrix[(row, col)] = *v;
        }
        matrix
    }
}
