//! Shared state for the rewrite pipeline.
//!
//! The [`CompilerContext`] owns what every pass reads but none mutates: the
//! validated rewrite tables and the divergence oracle. It also carries the
//! [`EventLog`] passes record their changes to.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{
    analysis::{DivergenceAnalysis, DivergenceOracle},
    compiler::{events::EventLog, tables::RewriteTables},
    Result,
};

/// Compiler context for the vector reduction pipeline.
pub struct CompilerContext {
    /// Scalarization and vector-position tables, validated at construction.
    pub tables: RewriteTables,

    /// Source of divergence facts for scalarization.
    pub oracle: Box<dyn DivergenceOracle>,

    /// Accumulated events from all passes.
    pub events: EventLog,

    /// When the context was created.
    start_time: Instant,
}

impl CompilerContext {
    /// Creates a context with the built-in tables and [`DivergenceAnalysis`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if a built-in table is inconsistent.
    pub fn new() -> Result<Self> {
        Ok(Self::with_tables(RewriteTables::load()?))
    }

    /// Creates a context over already-validated tables.
    #[must_use]
    pub fn with_tables(tables: RewriteTables) -> Self {
        Self {
            tables,
            oracle: Box::new(DivergenceAnalysis),
            events: EventLog::new(),
            start_time: Instant::now(),
        }
    }

    /// Replaces the divergence oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: impl DivergenceOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl fmt::Debug for CompilerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerContext")
            .field("oracle", &self.oracle.name())
            .field("scalar_forms", &self.tables.scalarization.len())
            .field("vector_consumers", &self.tables.vector_positions.len())
            .field("events", &self.events.len())
            .finish()
    }
}
