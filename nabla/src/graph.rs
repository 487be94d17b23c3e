use crate::error::NablaError;
use crate::node::Node;
use crate::shape::Shape;
use crate::tensor::{self, Tensor};
use crate::value::{Matrix, Value};
use rand::distributions::Uniform;
use rand::Rng;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Append-only registry and factory of all tensors and operations.
///
/// Every tensor lives in the arena as a [Node] (its producer, or
/// [Leaf](Node::Leaf)), a [Shape] computed at construction and the currently
/// stored [Value]. An operation can only reference tensors that already
/// exist, so the node graph is acyclic by construction and ids in creation
/// order form a valid topological order.
pub struct Graph {
    nodes: Vec<Node>,
    shapes: Vec<Shape>,
    values: Vec<Option<Value>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Initialize new empty graph.
    #[must_use]
    pub fn new() -> Graph {
        Graph { nodes: Vec::new(), shapes: Vec::new(), values: Vec::new() }
    }

    /// Number of registered tensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the graph empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All registered nodes in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Shape of tensor x.
    #[must_use]
    pub fn shape(&self, x: Tensor) -> Shape {
        self.shapes[x.i()]
    }

    /// Currently stored value of tensor x. None for a derived tensor that
    /// was never resolved by a session.
    #[must_use]
    pub fn value(&self, x: Tensor) -> Option<&Value> {
        self.values[x.i()].as_ref()
    }

    pub(crate) fn node(&self, x: Tensor) -> &Node {
        &self.nodes[x.i()]
    }

    pub(crate) fn set_value(&mut self, x: Tensor, value: Value) {
        self.values[x.i()] = Some(value);
    }

    fn push(&mut self, node: Node, shape: Shape) -> Tensor {
        let id = tensor::id(self.nodes.len());
        self.nodes.push(node);
        self.shapes.push(shape);
        self.values.push(None);
        id
    }

    /// Register a new leaf tensor holding `value`.
    pub fn tensor(&mut self, value: impl Into<Value>) -> Tensor {
        let value = value.into();
        let id = self.push(Node::Leaf, value.shape());
        self.values[id.i()] = Some(value);
        id
    }

    /// Leaf matrix filled with samples drawn uniformly from `range` using the
    /// caller's generator. Seeding stays with the caller.
    pub fn uniform(
        &mut self,
        rows: usize,
        cols: usize,
        range: Range<f64>,
        rng: &mut impl Rng,
    ) -> Tensor {
        let dist = Uniform::new(range.start, range.end);
        let data = (0..rows * cols).map(|_| rng.sample(dist)).collect();
        self.tensor(Matrix::new(rows, cols, data))
    }

    // Output shape of an elementwise operation: identical shapes, or one
    // scalar operand broadcast against the other shape.
    fn elementwise(&self, op: &'static str, x: Tensor, y: Tensor) -> Result<Shape, NablaError> {
        match (self.shapes[x.i()], self.shapes[y.i()]) {
            (left @ Shape::Empty, right) | (left, right @ Shape::Empty) => {
                Err(NablaError::ShapeMismatch { op, left, right })
            }
            (sh, Shape::Scalar) | (Shape::Scalar, sh) => Ok(sh),
            (left, right) if left == right => Ok(left),
            (left, right) => Err(NablaError::ShapeMismatch { op, left, right }),
        }
    }

    fn unary(&self, op: &'static str, x: Tensor) -> Result<Shape, NablaError> {
        match self.shapes[x.i()] {
            Shape::Empty => Err(NablaError::InvalidShape { op, shape: Shape::Empty }),
            sh => Ok(sh),
        }
    }

    /// Elementwise sum of x and y.
    pub fn add(&mut self, x: Tensor, y: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.elementwise("add", x, y)?;
        Ok(self.push(Node::Add(x, y), shape))
    }

    /// Elementwise difference of x and y.
    pub fn sub(&mut self, x: Tensor, y: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.elementwise("sub", x, y)?;
        Ok(self.push(Node::Sub(x, y), shape))
    }

    /// Elementwise product of x and y.
    pub fn mul(&mut self, x: Tensor, y: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.elementwise("mul", x, y)?;
        Ok(self.push(Node::Mul(x, y), shape))
    }

    /// Matrix product of x and y. Inner dimensions must match.
    pub fn dot(&mut self, x: Tensor, y: Tensor) -> Result<Tensor, NablaError> {
        match (self.shapes[x.i()], self.shapes[y.i()]) {
            (Shape::Matrix(rows, k), Shape::Matrix(l, cols)) if k == l => {
                Ok(self.push(Node::Dot(x, y), Shape::Matrix(rows, cols)))
            }
            (left, right) => Err(NablaError::ShapeMismatch { op: "dot", left, right }),
        }
    }

    /// Transpose of x. Scalars pass through unchanged.
    pub fn transpose(&mut self, x: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.unary("transpose", x)?;
        Ok(self.push(Node::Transpose(x), shape.transposed()))
    }

    /// Elementwise logistic activation of x.
    pub fn sigmoid(&mut self, x: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.unary("sigmoid", x)?;
        Ok(self.push(Node::Sigmoid(x), shape))
    }

    /// Elementwise square of x.
    pub fn square(&mut self, x: Tensor) -> Result<Tensor, NablaError> {
        let shape = self.unary("square", x)?;
        Ok(self.push(Node::Square(x), shape))
    }

    /// Mean over all elements of x.
    pub fn mean(&mut self, x: Tensor) -> Result<Tensor, NablaError> {
        self.unary("mean", x)?;
        Ok(self.push(Node::Mean(x), Shape::Scalar))
    }

    /// Operation overwriting `target`'s stored value with `source`'s resolved
    /// value when evaluated. The new value is the operation's own output, so
    /// updates can be chained. `target` must be a leaf of `source`'s shape;
    /// this is the only mechanism that mutates a tensor in place.
    pub fn assign(&mut self, target: Tensor, source: Tensor) -> Result<Tensor, NablaError> {
        if !self.nodes[target.i()].is_leaf() {
            return Err(NablaError::NonLeafAssign { target });
        }
        let (left, right) = (self.shapes[target.i()], self.shapes[source.i()]);
        if left != right {
            return Err(NablaError::ShapeMismatch { op: "assign", left, right });
        }
        Ok(self.push(Node::Assign(target, source), left))
    }

    /// Sentinel evaluating `members` in the given order purely for their side
    /// effects. Its output carries no value and is rejected as arithmetic
    /// input; it exists so several updates can be submitted as one session
    /// target.
    pub fn group(&mut self, members: &[Tensor]) -> Tensor {
        self.push(Node::Group(members.into()), Shape::Empty)
    }

    /// Symbolic reverse-mode differentiation: build and return tensors
    /// computing the partial derivative of `loss` with respect to each entry
    /// of `wrt`, in the same order.
    ///
    /// Gradient expressions are created through the ordinary factory methods,
    /// so this extends the graph and never computes numbers by itself. A
    /// tensor feeding several consumers accumulates their contributions with
    /// [add](Graph::add). Entries of `wrt` the loss does not depend on get a
    /// zero leaf of matching shape.
    pub fn gradients(&mut self, loss: Tensor, wrt: &[Tensor]) -> Result<Vec<Tensor>, NablaError> {
        // Tensors the loss depends on. Only their gradients are meaningful.
        let mut relevant = BTreeSet::new();
        let mut params = vec![loss];
        while let Some(nid) = params.pop() {
            if relevant.insert(nid) {
                params.extend(self.nodes[nid.i()].parameters());
            }
        }

        // Tensor -> accumulated gradient, seeded at the loss with ones of
        // its own shape.
        let mut grads: BTreeMap<Tensor, Tensor> = BTreeMap::new();
        let seed = self.tensor(Value::ones(self.shapes[loss.i()]));
        grads.insert(loss, seed);

        // Ids grow only as inputs are created, so reverse creation order is
        // a valid reverse-topological order: by the time a tensor is
        // processed, every consumer has already contributed to its
        // accumulator. Nodes pushed by the backward rules get ids above
        // `loss` and are never revisited.
        for i in (0..=loss.i()).rev() {
            let nid = tensor::id(i);
            if !relevant.contains(&nid) {
                continue;
            }
            let Some(&grad) = grads.get(&nid) else {
                continue;
            };
            match self.nodes[i].clone() {
                Node::Leaf => {}
                Node::Add(x, y) => {
                    self.accumulate(&mut grads, x, grad)?;
                    self.accumulate(&mut grads, y, grad)?;
                }
                Node::Sub(x, y) => {
                    self.accumulate(&mut grads, x, grad)?;
                    let neg = self.tensor(-1.0);
                    let y_grad = self.mul(grad, neg)?;
                    self.accumulate(&mut grads, y, y_grad)?;
                }
                Node::Mul(x, y) => {
                    let x_grad = self.mul(y, grad)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                    let y_grad = self.mul(x, grad)?;
                    self.accumulate(&mut grads, y, y_grad)?;
                }
                Node::Dot(x, y) => {
                    // x_grad = grad . y^T, y_grad = x^T . grad
                    let yt = self.transpose(y)?;
                    let x_grad = self.dot(grad, yt)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                    let xt = self.transpose(x)?;
                    let y_grad = self.dot(xt, grad)?;
                    self.accumulate(&mut grads, y, y_grad)?;
                }
                Node::Transpose(x) => {
                    let x_grad = self.transpose(grad)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                }
                Node::Sigmoid(x) => {
                    // out * (1 - out) * grad
                    let one = self.tensor(1.0);
                    let complement = self.sub(one, nid)?;
                    let slope = self.mul(nid, complement)?;
                    let x_grad = self.mul(slope, grad)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                }
                Node::Square(x) => {
                    // 2 * x * grad
                    let two = self.tensor(2.0);
                    let scaled = self.mul(two, x)?;
                    let x_grad = self.mul(scaled, grad)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                }
                Node::Mean(x) => {
                    // grad / numel, broadcast back to the input's shape
                    let shape = self.shapes[x.i()];
                    let factor = self.tensor(1.0 / shape.numel() as f64);
                    let scaled = self.mul(grad, factor)?;
                    let ones = self.tensor(Value::ones(shape));
                    let x_grad = self.mul(scaled, ones)?;
                    self.accumulate(&mut grads, x, x_grad)?;
                }
                Node::Assign(..) => return Err(NablaError::NoGradient { op: "assign" }),
                Node::Group(..) => return Err(NablaError::NoGradient { op: "group" }),
            }
        }

        let mut result = Vec::with_capacity(wrt.len());
        for &x in wrt {
            result.push(match grads.get(&x) {
                Some(&grad) => grad,
                None => self.tensor(Value::zeros(self.shapes[x.i()])),
            });
        }
        Ok(result)
    }

    fn accumulate(
        &mut self,
        grads: &mut BTreeMap<Tensor, Tensor>,
        x: Tensor,
        grad: Tensor,
    ) -> Result<(), NablaError> {
        match grads.entry(x) {
            Entry::Vacant(e) => {
                e.insert(grad);
            }
            Entry::Occupied(e) => {
                let (k, prev_grad) = e.remove_entry();
                let sum = self.add(prev_grad, grad)?;
                grads.insert(k, sum);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Graph;
    use crate::error::NablaError;
    use crate::node::Node;
    use crate::session::Session;
    use crate::shape::Shape;
    use crate::tensor;

    // The public API cannot express a cycle, so the evaluator's check is
    // exercised by forging one directly in the arena.
    #[test]
    fn forged_cycle_is_detected() {
        let mut graph = Graph::new();
        let a = graph.tensor(1.0);
        let x = tensor::id(graph.nodes.len());
        graph.nodes.push(Node::Add(x, a));
        graph.shapes.push(Shape::Scalar);
        graph.values.push(None);
        let mut session = Session::new(&mut graph);
        assert_eq!(session.run(&[x]), Err(NablaError::Cycle { tensor: x }));
    }
}
