use crate::error::NablaError;
use crate::graph::Graph;
use crate::node::Node;
use crate::tensor::Tensor;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Stateless evaluator resolving tensors' current values against a [Graph].
///
/// Each [run](Session::run) call owns a fresh memo table, so within one call
/// every tensor is resolved at most once, and nothing is carried to the next
/// call except what was written back into the tensors' stored values.
pub struct Session<'g> {
    graph: &'g mut Graph,
}

impl<'g> Session<'g> {
    /// New session evaluating against `graph`.
    #[must_use]
    pub fn new(graph: &'g mut Graph) -> Session<'g> {
        Session { graph }
    }

    /// Resolve `targets` in the given order and return one value per target,
    /// positionally aligned. Group targets yield the [Value::Empty]
    /// placeholder.
    ///
    /// Targets share one per-call memo table. An assign target resolved
    /// earlier in the list mutates its target tensor's stored value, which
    /// is visible to any tensor resolved later in the same call; a tensor
    /// already memoized earlier in the call is not re-resolved even if a
    /// later assign changes one of its transitive inputs, so a stale read
    /// within one call is possible. That staleness is part of the contract,
    /// callers order their targets around it.
    pub fn run(&mut self, targets: &[Tensor]) -> Result<Vec<Value>, NablaError> {
        let mut memo = BTreeMap::new();
        let mut in_progress = BTreeSet::new();
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.resolve(*target, &mut memo, &mut in_progress)?);
        }
        Ok(results)
    }

    // Depth-first resolution: memo hit, else leaf's stored value, else
    // resolve the producer's inputs and apply its forward rule. The result
    // is memoized and written back into the tensor's stored value so later
    // reads, in this call or a future one, observe it.
    fn resolve(
        &mut self,
        x: Tensor,
        memo: &mut BTreeMap<Tensor, Value>,
        in_progress: &mut BTreeSet<Tensor>,
    ) -> Result<Value, NablaError> {
        if let Some(value) = memo.get(&x) {
            return Ok(value.clone());
        }
        if !in_progress.insert(x) {
            return Err(NablaError::Cycle { tensor: x });
        }
        let value = match self.graph.node(x).clone() {
            Node::Leaf => match self.graph.value(x) {
                Some(value) => value.clone(),
                None => unreachable!("leaf {x} has no stored value"),
            },
            Node::Add(a, b) => {
                let a = self.resolve(a, memo, in_progress)?;
                let b = self.resolve(b, memo, in_progress)?;
                a.zip_with(&b, |x, y| x + y)
            }
            Node::Sub(a, b) => {
                let a = self.resolve(a, memo, in_progress)?;
                let b = self.resolve(b, memo, in_progress)?;
                a.zip_with(&b, |x, y| x - y)
            }
            Node::Mul(a, b) => {
                let a = self.resolve(a, memo, in_progress)?;
                let b = self.resolve(b, memo, in_progress)?;
                a.zip_with(&b, |x, y| x * y)
            }
            Node::Dot(a, b) => {
                let a = self.resolve(a, memo, in_progress)?;
                let b = self.resolve(b, memo, in_progress)?;
                a.dot(&b)
            }
            Node::Transpose(a) => self.resolve(a, memo, in_progress)?.transpose(),
            Node::Sigmoid(a) => self
                .resolve(a, memo, in_progress)?
                .map(|v| 1.0 / (1.0 + (-v).exp())),
            Node::Square(a) => self.resolve(a, memo, in_progress)?.map(|v| v * v),
            Node::Mean(a) => self.resolve(a, memo, in_progress)?.mean(),
            Node::Assign(target, source) => {
                // Only the source is resolved. Reading the target here would
                // memoize its pre-assignment value and hide the update from
                // targets resolved later in the same call.
                let value = self.resolve(source, memo, in_progress)?;
                self.graph.set_value(target, value.clone());
                value
            }
            Node::Group(members) => {
                for member in members.iter() {
                    self.resolve(*member, memo, in_progress)?;
                }
                Value::Empty
            }
        };
        in_progress.remove(&x);
        self.graph.set_value(x, value.clone());
        memo.insert(x, value.clone());
        Ok(value)
    }
}
