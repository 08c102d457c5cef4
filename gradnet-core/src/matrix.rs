use crate::error::GradNetError;
use crate::scalar::Real;
use crate::tape::Tape;
use crate::var::Var;

/// A dense matrix of [`Var`]s in row-major order.
///
/// This is the only linear-algebra surface the layer and loss code
/// needs: matrix multiply, elementwise map, row-wise map and row
/// selection. Entries are handles into a shared tape, so every
/// operation extends the same computation graph.
#[derive(Debug, Clone)]
pub struct Matrix<T: Real> {
    data: Vec<Var<T>>,
    rows: usize,
    cols: usize,
}

impl<T: Real> Matrix<T> {
    /// Builds a matrix of fresh leaf nodes from plain numbers.
    /// Rows must be non-empty and rectangular.
    pub fn from_rows(tape: &Tape<T>, rows: &[Vec<T>]) -> Result<Self, GradNetError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(GradNetError::EmptyInput {
                operation: "Matrix::from_rows".to_string(),
            });
        }
        let cols = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GradNetError::RowLengthMismatch {
                    row: i,
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend(row.iter().map(|&v| tape.var(v)));
        }
        Ok(Matrix {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Wraps existing node handles; `data` must hold exactly
    /// `rows * cols` entries.
    pub fn from_vars(data: Vec<Var<T>>, rows: usize, cols: usize) -> Result<Self, GradNetError> {
        if data.len() != rows * cols {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![rows, cols],
                actual: vec![data.len()],
                operation: "Matrix::from_vars".to_string(),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> &Var<T> {
        &self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[Var<T>] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_iter(&self) -> std::slice::Chunks<'_, Var<T>> {
        self.data.chunks(self.cols)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Var<T>> {
        self.data.iter()
    }

    /// Handle to the tape the entries live on. Matrices are never
    /// empty, so there is always a first entry to ask.
    pub fn tape(&self) -> Tape<T> {
        self.data[0].tape()
    }

    /// Graph-building matrix multiply: each output entry is the dot
    /// product of a row of `self` with a column of `rhs`.
    pub fn matmul(&self, rhs: &Matrix<T>) -> Result<Matrix<T>, GradNetError> {
        if self.cols != rhs.rows {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![self.cols],
                actual: vec![rhs.rows],
                operation: "Matrix::matmul".to_string(),
            });
        }
        let mut data = Vec::with_capacity(self.rows * rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut acc = self.get(i, 0) * rhs.get(0, j);
                for k in 1..self.cols {
                    acc = &acc + &(self.get(i, k) * rhs.get(k, j));
                }
                data.push(acc);
            }
        }
        Matrix::from_vars(data, self.rows, rhs.cols)
    }

    /// Applies `f` to every entry, keeping the shape.
    pub fn map(&self, f: impl Fn(&Var<T>) -> Var<T>) -> Matrix<T> {
        Matrix {
            data: self.data.iter().map(f).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Applies `f` to every row; `f` must preserve the row width.
    pub fn map_rows(&self, f: impl Fn(&[Var<T>]) -> Vec<Var<T>>) -> Matrix<T> {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.row_iter() {
            let mapped = f(row);
            assert_eq!(mapped.len(), self.cols, "row map must preserve width");
            data.extend(mapped);
        }
        Matrix {
            data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Reduces each row to a single node.
    pub fn reduce_rows(&self, f: impl Fn(&[Var<T>]) -> Var<T>) -> Vec<Var<T>> {
        self.row_iter().map(f).collect()
    }

    /// Gathers the given rows (handles are cloned, nodes are shared).
    pub fn select_rows(&self, indices: &[usize]) -> Matrix<T> {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Extracts plain numeric values, discarding graph structure.
    pub fn values(&self) -> Vec<Vec<T>> {
        self.row_iter()
            .map(|row| row.iter().map(|v| v.value()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(tape: &Tape<f64>, rows: &[Vec<f64>]) -> Matrix<f64> {
        Matrix::from_rows(tape, rows).unwrap()
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let tape = Tape::new();
        let err = Matrix::from_rows(&tape, &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            GradNetError::RowLengthMismatch {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn from_rows_rejects_empty_input() {
        let tape = Tape::<f64>::new();
        assert!(matches!(
            Matrix::from_rows(&tape, &[]),
            Err(GradNetError::EmptyInput { .. })
        ));
    }

    #[test]
    fn matmul_computes_dot_products() {
        let tape = Tape::new();
        let a = matrix(&tape, &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = matrix(&tape, &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.values(), vec![vec![4.0, 5.0], vec![10.0, 11.0]]);
    }

    #[test]
    fn matmul_rejects_incompatible_shapes() {
        let tape = Tape::new();
        let a = matrix(&tape, &[vec![1.0, 2.0]]);
        let b = matrix(&tape, &[vec![1.0, 2.0]]);
        let err = a.matmul(&b).unwrap_err();
        assert!(matches!(err, GradNetError::ShapeMismatch { .. }));
    }

    #[test]
    fn matmul_is_differentiable() {
        let tape = Tape::new();
        let x = matrix(&tape, &[vec![2.0, 3.0]]);
        let w = matrix(&tape, &[vec![5.0], vec![7.0]]);
        let y = x.matmul(&w).unwrap();
        y.get(0, 0).backward();
        assert_eq!(y.get(0, 0).value(), 31.0);
        assert_eq!(w.get(0, 0).grad(), 2.0);
        assert_eq!(w.get(1, 0).grad(), 3.0);
        assert_eq!(x.get(0, 0).grad(), 5.0);
        assert_eq!(x.get(0, 1).grad(), 7.0);
    }

    #[test]
    fn select_rows_shares_nodes() {
        let tape = Tape::new();
        let m = matrix(&tape, &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let picked = m.select_rows(&[2, 0]);
        assert_eq!(picked.values(), vec![vec![5.0, 6.0], vec![1.0, 2.0]]);
        picked.get(0, 0).set_value(9.0);
        assert_eq!(m.get(2, 0).value(), 9.0);
    }

    #[test]
    fn map_and_reduce_rows() {
        let tape = Tape::new();
        let m = matrix(&tape, &[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let doubled = m.map(|v| v * 2.0);
        assert_eq!(doubled.values(), vec![vec![2.0, 4.0], vec![6.0, 8.0]]);

        let sums = m.reduce_rows(|row| {
            let mut acc = row[0].clone();
            for v in &row[1..] {
                acc = &acc + v;
            }
            acc
        });
        assert_eq!(sums[0].value(), 3.0);
        assert_eq!(sums[1].value(), 7.0);
    }
}
