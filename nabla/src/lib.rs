//! # nabla
//!
//! nabla builds a directed acyclic graph of numeric tensors and operations,
//! derives new graph nodes computing gradients of a scalar loss by symbolic
//! reverse-mode differentiation, and evaluates requested tensors through a
//! session that resolves dependencies and applies side-effecting updates.
//!
//! ```rust
//! use nabla::{Graph, Session};
//! # fn main() -> Result<(), nabla::NablaError> {
//! let mut graph = Graph::new();
//! let x = graph.tensor([[1.0, 2.0]]);
//! let w = graph.tensor([[1.0], [1.0]]);
//! let y = graph.dot(x, w)?;
//! let grads = graph.gradients(y, &[w])?;
//! let mut session = Session::new(&mut graph);
//! let values = session.run(&[y, grads[0]])?;
//! assert_eq!(values[0], [[3.0]]);
//! assert_eq!(values[1], [[1.0], [2.0]]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![forbid(rustdoc::broken_intra_doc_links)]
#![forbid(rustdoc::private_intra_doc_links)]
#![forbid(missing_docs)]
#![forbid(rustdoc::missing_crate_level_docs)]
#![forbid(rustdoc::private_doc_tests)]
#![forbid(rustdoc::invalid_codeblock_attributes)]
#![forbid(rustdoc::invalid_html_tags)]
#![forbid(rustdoc::invalid_rust_codeblocks)]
#![forbid(rustdoc::bare_urls)]
#![forbid(rustdoc::unescaped_backticks)]

/// See [NablaError](error::NablaError)
pub mod error;
/// See [Graph](graph::Graph)
pub mod graph;
/// See [Node](node::Node)
pub mod node;
/// See [Session](session::Session)
pub mod session;
/// See [Shape](shape::Shape)
pub mod shape;
/// See [Tensor](tensor::Tensor)
pub mod tensor;
/// See [Value](value::Value)
pub mod value;

pub use error::NablaError;
pub use graph::Graph;
pub use node::Node;
pub use session::Session;
pub use shape::Shape;
pub use tensor::Tensor;
pub use value::{Matrix, Value};
