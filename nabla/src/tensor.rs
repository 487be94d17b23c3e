use core::fmt;

/// Handle of a tensor: an index into the arena of the [Graph](crate::graph::Graph)
/// that created it. Ids are assigned monotonically at creation, so they double
/// as a total creation order and a topological fallback.
#[derive(Clone, Copy, PartialOrd, PartialEq, Ord, Eq, Debug, Hash)]
pub struct Tensor(usize);

/// Create new tensor handle from raw arena index.
pub(crate) const fn id(id: usize) -> Tensor {
    Tensor(id)
}

impl Tensor {
    /// Arena index of this tensor.
    #[must_use]
    pub const fn i(self) -> usize {
        self.0
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}
