use crate::shape::Shape;
use crate::tensor::Tensor;
use core::fmt::{Display, Formatter};

/// NablaError
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NablaError {
    /// Incompatible operand shapes passed to a binary operation.
    ShapeMismatch {
        /// Operation whose contract was violated
        op: &'static str,
        /// Shape of the left operand
        left: Shape,
        /// Shape of the right operand
        right: Shape,
    },
    /// Operand shape outside a unary operation's contract.
    InvalidShape {
        /// Operation whose contract was violated
        op: &'static str,
        /// Shape of the operand
        shape: Shape,
    },
    /// Assignment aimed at a tensor that has a producer. Only leaf tensors
    /// may be mutated in place.
    NonLeafAssign {
        /// The rejected assignment target
        target: Tensor,
    },
    /// Differentiation requested through a non-differentiable operation.
    NoGradient {
        /// The non-differentiable operation
        op: &'static str,
    },
    /// Tensor found under resolution while already being resolved on the
    /// current call stack. Not constructible through the public graph API.
    Cycle {
        /// The tensor closing the cycle
        tensor: Tensor,
    },
}

impl Display for NablaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            NablaError::ShapeMismatch { op, left, right } => f.write_fmt(format_args!(
                "ShapeMismatch: {op} got incompatible operand shapes {left} and {right}."
            )),
            NablaError::InvalidShape { op, shape } => f.write_fmt(format_args!(
                "InvalidShape: {op} cannot take an operand of shape {shape}."
            )),
            NablaError::NonLeafAssign { target } => f.write_fmt(format_args!(
                "NonLeafAssign: tensor {target} has a producer and cannot be assigned to."
            )),
            NablaError::NoGradient { op } => f.write_fmt(format_args!(
                "NoGradient: {op} is not differentiable."
            )),
            NablaError::Cycle { tensor } => f.write_fmt(format_args!(
                "Cycle: tensor {tensor} depends on itself."
            )),
        }
    }
}

impl std::error::Error for NablaError {}
