use crate::scalar::Scalar;

/// Dense row-major matrix of field elements, 0-indexed.
///
/// Only the handful of operations the simplex engine needs: cell and
/// row/column access plus the two in-place row operations a Gauss-Jordan
/// pivot is made of. Every operation preserves the dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> Matrix<T> {
    /// An all-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Builds a matrix from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        assert!(!rows.is_empty(), "matrix needs at least one row");
        let cols = rows[0].len();
        assert!(cols > 0, "matrix needs at least one column");
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            assert_eq!(row.len(), cols, "rows must have equal length");
            data.extend(row.iter().cloned());
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        assert!(row < self.rows && col < self.cols, "cell out of bounds");
        &self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.rows && col < self.cols, "cell out of bounds");
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        assert!(row < self.rows, "row out of bounds");
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn set_row(&mut self, row: usize, values: &[T]) {
        assert!(row < self.rows, "row out of bounds");
        assert_eq!(values.len(), self.cols, "row length mismatch");
        self.data[row * self.cols..(row + 1) * self.cols].clone_from_slice(values);
    }

    pub fn column(&self, col: usize) -> Vec<T> {
        assert!(col < self.cols, "column out of bounds");
        (0..self.rows)
            .map(|row| self.data[row * self.cols + col].clone())
            .collect()
    }

    pub fn set_column(&mut self, col: usize, values: &[T]) {
        assert!(col < self.cols, "column out of bounds");
        assert_eq!(values.len(), self.rows, "column length mismatch");
        for (row, value) in values.iter().enumerate() {
            self.data[row * self.cols + col] = value.clone();
        }
    }

    /// Row `row` becomes `factor * row`, in place.
    pub fn scale_row(&mut self, row: usize, factor: &T) {
        assert!(row < self.rows, "row out of bounds");
        for cell in &mut self.data[row * self.cols..(row + 1) * self.cols] {
            *cell = factor.clone() * cell.clone();
        }
    }

    /// Row `target` becomes `target - factor * source`, in place.
    pub fn sub_mult(&mut self, target: usize, source: usize, factor: &T) {
        assert!(target < self.rows && source < self.rows, "row out of bounds");
        assert_ne!(target, source, "target and source rows must differ");
        let t0 = target * self.cols;
        let s0 = source * self.cols;
        for col in 0..self.cols {
            let delta = factor.clone() * self.data[s0 + col].clone();
            self.data[t0 + col] = self.data[t0 + col].clone() - delta;
        }
    }
}
