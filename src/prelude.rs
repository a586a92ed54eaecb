//! # vreduce Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and
//! traits from the vreduce library. Import it to get quick access to the program
//! model, the analyses and the pass pipeline.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all vreduce operations
pub use crate::Error;

/// The result type used throughout vreduce
pub use crate::Result;

/// One-call pipeline entry points
pub use crate::{reduce_program, reduce_program_with};

// ================================================================================================
// Instruction Model
// ================================================================================================

/// Program document, functions and instructions
pub use crate::ir::{Code, DefIndex, Function, Instruction, Program};

/// Opcode vocabulary and value types
pub use crate::ir::{Opcode, Polarity, Predicate, Type};

// ================================================================================================
// Analysis
// ================================================================================================

/// Basic blocks
pub use crate::analysis::{BasicBlock, BlockPartition};

/// Divergence facts and the oracle interface
pub use crate::analysis::{DivergenceAnalysis, DivergenceInfo, DivergenceOracle, DivergenceSet};

/// Static cost estimation
pub use crate::analysis::CostModel;

// ================================================================================================
// Rewrite Pipeline
// ================================================================================================

/// Pass infrastructure
pub use crate::compiler::{CompilerContext, FunctionPass, PassScheduler};

/// The passes
pub use crate::compiler::{RestitchPass, ScalarizationPass};

/// Rewrite tables
pub use crate::compiler::{RewriteTables, ScalarizationTable, VectorPositionTable};

/// Event tracking
pub use crate::compiler::{DerivedStats, Event, EventKind, EventLog};
