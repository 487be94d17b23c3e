use core::fmt;

/// Shape of a tensor value. This graph works with fixed 2-D matrices and
/// scalars, there is no general rank-N shape and no broadcasting beyond
/// the scalar-operand case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Shape {
    /// Shape of a group sentinel. Carries no elements and is rejected as
    /// input by every arithmetic operation.
    Empty,
    /// Single number.
    Scalar,
    /// 2-D matrix with the given number of rows and columns.
    Matrix(usize, usize),
}

impl Shape {
    /// Number of elements in a tensor with this shape.
    #[must_use]
    pub const fn numel(&self) -> usize {
        match self {
            Shape::Empty => 0,
            Shape::Scalar => 1,
            Shape::Matrix(rows, cols) => *rows * *cols,
        }
    }

    /// Shape with rows and columns swapped. Scalars transpose to themselves.
    #[must_use]
    pub const fn transposed(&self) -> Shape {
        match self {
            Shape::Matrix(rows, cols) => Shape::Matrix(*cols, *rows),
            sh => *sh,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Empty => f.write_str("()"),
            Shape::Scalar => f.write_str("scalar"),
            Shape::Matrix(rows, cols) => f.write_fmt(format_args!("{rows}x{cols}")),
        }
    }
}
