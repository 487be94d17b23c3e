use crate::shape::Shape;
use core::fmt;

/// Row-major 2-D matrix of f64 elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// New matrix from row-major data. Panics if `data.len() != rows * cols`.
    #[must_use]
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(data.len(), rows * cols, "matrix data does not fill {rows}x{cols}");
        Matrix { rows, cols, data }
    }

    /// Matrix with every element set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix { rows, cols, data: vec![value; rows * cols] }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Element at the given row and column.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Row-major view of the elements.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    pub(crate) fn zip(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(x, y)| f(*x, *y))
                .collect(),
        }
    }

    pub(crate) fn dot(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut data = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Matrix { rows: self.rows, cols: other.cols, data }
    }

    pub(crate) fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                data.push(self.get(row, col));
            }
        }
        Matrix { rows: self.cols, cols: self.rows, data }
    }

    pub(crate) fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }
}

/// Stored value of a tensor: a scalar, a 2-D matrix, or the side-effect-only
/// placeholder carried by group sentinels.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Placeholder yielded by group sentinels, carries no number.
    Empty,
    /// Single number.
    Scalar(f64),
    /// 2-D matrix.
    Matrix(Matrix),
}

impl Value {
    /// Shape of this value.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Value::Empty => Shape::Empty,
            Value::Scalar(_) => Shape::Scalar,
            Value::Matrix(m) => Shape::Matrix(m.rows, m.cols),
        }
    }

    /// The number held by a scalar value.
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// The matrix held by a matrix value.
    #[must_use]
    pub fn matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// Value of the given shape with every element zero.
    #[must_use]
    pub fn zeros(shape: Shape) -> Value {
        Value::splat(shape, 0.0)
    }

    /// Value of the given shape with every element one.
    #[must_use]
    pub fn ones(shape: Shape) -> Value {
        Value::splat(shape, 1.0)
    }

    fn splat(shape: Shape, value: f64) -> Value {
        match shape {
            Shape::Empty => Value::Empty,
            Shape::Scalar => Value::Scalar(value),
            Shape::Matrix(rows, cols) => Value::Matrix(Matrix::filled(rows, cols, value)),
        }
    }

    pub(crate) fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Empty => Value::Empty,
            Value::Scalar(v) => Value::Scalar(f(*v)),
            Value::Matrix(m) => Value::Matrix(m.map(f)),
        }
    }

    // Elementwise combination. A scalar operand broadcasts against a matrix;
    // matrix dimensions were validated at graph-construction time.
    pub(crate) fn zip_with(&self, other: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
        match (self, other) {
            (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(f(*x, *y)),
            (Value::Scalar(x), Value::Matrix(m)) => Value::Matrix(m.map(|y| f(*x, y))),
            (Value::Matrix(m), Value::Scalar(y)) => Value::Matrix(m.map(|x| f(x, *y))),
            (Value::Matrix(x), Value::Matrix(y)) => Value::Matrix(x.zip(y, f)),
            _ => unreachable!("elementwise operation on an empty value"),
        }
    }

    pub(crate) fn dot(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Matrix(x), Value::Matrix(y)) => Value::Matrix(x.dot(y)),
            _ => unreachable!("dot of non-matrix values"),
        }
    }

    pub(crate) fn transpose(&self) -> Value {
        match self {
            Value::Matrix(m) => Value::Matrix(m.transpose()),
            Value::Scalar(v) => Value::Scalar(*v),
            Value::Empty => unreachable!("transpose of an empty value"),
        }
    }

    pub(crate) fn mean(&self) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(*v),
            Value::Matrix(m) => Value::Scalar(m.mean()),
            Value::Empty => unreachable!("mean of an empty value"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Scalar(value)
    }
}

impl From<Matrix> for Value {
    fn from(matrix: Matrix) -> Value {
        Value::Matrix(matrix)
    }
}

impl<const R: usize, const C: usize> From<[[f64; C]; R]> for Value {
    fn from(rows: [[f64; C]; R]) -> Value {
        Value::Matrix(Matrix {
            rows: R,
            cols: C,
            data: rows.into_iter().flatten().collect(),
        })
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Scalar(v) if v == other)
    }
}

impl<const R: usize, const C: usize> PartialEq<[[f64; C]; R]> for Value {
    fn eq(&self, other: &[[f64; C]; R]) -> bool {
        match self {
            Value::Matrix(m) => {
                m.rows == R
                    && m.cols == C
                    && m.data.iter().eq(other.iter().flatten())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = if let Some(precision) = f.precision() {
            precision
        } else {
            3
        };
        match self {
            Value::Empty => f.write_str("()"),
            Value::Scalar(v) => f.write_fmt(format_args!("{v:.precision$}")),
            Value::Matrix(m) => {
                // align columns on the widest formatted element
                let mut w = 0;
                for x in &m.data {
                    let l = format!("{x:>.precision$}").len();
                    if l > w {
                        w = l;
                    }
                }
                for row in 0..m.rows {
                    f.write_str(if row == 0 { "[" } else { " " })?;
                    for col in 0..m.cols {
                        if col > 0 {
                            f.write_str(" ")?;
                        }
                        f.write_fmt(format_args!("{:>w$.precision$}", m.get(row, col)))?;
                    }
                    f.write_str(if row + 1 == m.rows { "]" } else { "\n" })?;
                }
                Ok(())
            }
        }
    }
}
