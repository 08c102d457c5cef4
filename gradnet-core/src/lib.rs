//! Scalar reverse-mode automatic differentiation for GradNet.
//!
//! The engine records every arithmetic operation on a [`Tape`]: an
//! insertion-ordered arena of scalar nodes. Each node stores its value,
//! its accumulated gradient and a tagged [`Op`] naming the operation
//! that produced it together with the arena indices of its operands.
//! [`Var`] is a cheap handle (shared tape + node id) with operator
//! overloading, so graphs are built by writing ordinary arithmetic:
//!
//! ```
//! use gradnet_core::Tape;
//!
//! let tape = Tape::new();
//! let x = tape.var(2.0);
//! let y = tape.var(3.0);
//! let z = &(&x * &y) + &x.powf(2.0);
//!
//! z.backward();
//! assert_eq!(z.value(), 10.0);
//! assert_eq!(x.grad(), 7.0); // y + 2x
//! ```
//!
//! Because operands always precede their results in the arena, the
//! backward pass is a single reverse sweep over insertion order — no
//! explicit topological sort and no cyclic ownership.
//!
//! [`Matrix`] layers a minimal linear-algebra surface (matrix multiply,
//! elementwise map, row-wise access) over the tape; it is all the layer
//! and loss code above this crate needs.

pub mod error;
pub mod grad_check;
pub mod matrix;
pub mod scalar;
pub mod tape;
pub mod var;

pub use error::GradNetError;
pub use matrix::Matrix;
pub use scalar::Real;
pub use tape::{NodeId, Op, Tape};
pub use var::Var;

// Re-export so downstream crates can name the numeric bounds directly.
pub use num_traits;
