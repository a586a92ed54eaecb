//! The rewrite passes.
//!
//! - [`ScalarizationPass`] replaces uniform vector instructions with scalar ones
//! - [`RestitchPass`] broadcasts scalars back wherever a vector is still required
//!
//! The two run in that order; scalarization alone may leave a function
//! type-inconsistent.

mod restitch;
mod scalarize;

pub use restitch::{RestitchPass, VECTOR_SUFFIX, WIDENING_OPCODE};
pub use scalarize::{ScalarizationPass, SCALAR_SUFFIX};
