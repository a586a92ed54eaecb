//! Analyses over the vector IR.
//!
//! - [`blocks`] - basic-block formation and block successors
//! - [`divergence`] - which variables may differ across vector lanes
//! - [`cost`] - weighted operation counts for comparing programs
//!
//! The scalarization pass in [`crate::compiler`] consumes divergence facts through
//! the [`DivergenceOracle`] trait, so any analysis producing per-block exit sets can
//! replace [`DivergenceAnalysis`].

pub mod blocks;
pub mod cost;
pub mod divergence;

pub use blocks::{BasicBlock, BlockPartition};
pub use cost::{CostModel, SCALAR_OP_COST, VECTOR_OP_COST};
pub use divergence::{DivergenceAnalysis, DivergenceInfo, DivergenceOracle, DivergenceSet};
