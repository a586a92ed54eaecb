//! Rewrite infrastructure for vector reduction.
//!
//! This module sits between the analyses and the program document:
//!
//! - [`crate::analysis`] - blocks, divergence, cost
//! - [`compiler`](self) - rewrite tables, passes, scheduling
//! - [`crate::ir`] - the program being rewritten
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Reduction Pipeline                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  CompilerContext              Shared, read-only during a run     │
//! │    ├─ RewriteTables           (scalar forms, vector positions)   │
//! │    ├─ DivergenceOracle        (per-block exit sets)              │
//! │    └─ EventLog                                                   │
//! │                                                                  │
//! │  PassScheduler               Each pass once over each function   │
//! │    ├─ ScalarizationPass       uniform vector op -> scalar op     │
//! │    └─ RestitchPass            scalar at vector position -> s2vb  │
//! │                                                                  │
//! │  FunctionPass trait          Interface for all passes            │
//! │  propagate_rename            Forward rename, all or vector uses  │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

mod context;
mod events;
mod pass;
mod passes;
mod rename;
mod scheduler;
mod tables;

pub use context::CompilerContext;
pub use events::{DerivedStats, Event, EventBuilder, EventKind, EventLog};
pub use pass::FunctionPass;
pub use passes::{
    RestitchPass, ScalarizationPass, SCALAR_SUFFIX, VECTOR_SUFFIX, WIDENING_OPCODE,
};
pub use rename::{propagate_rename, RenameScope};
pub use scheduler::PassScheduler;
pub use tables::{
    builtin_scalar_form, builtin_vector_positions, extended_scalar_form, RewriteTables, ScalarForm,
    ScalarizationTable, VectorPositionTable,
};
