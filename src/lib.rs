// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # vreduce
//!
//! Divergence-guided vector-to-scalar reduction for a typed, SSA-form vector IR.
//!
//! Vector instructions whose result is the same in every lane do not need the
//! vector unit. `vreduce` finds them with a divergence analysis, rewrites them to
//! scalar instructions, and then repairs the types of the program by broadcasting
//! scalars back wherever a vector operand is still required.
//!
//! ## Quick Start
//!
//! ```rust
//! use vreduce::prelude::*;
//!
//! let mut program = Program::from_json_str(r#"{
//!   "functions": [{
//!     "name": "main",
//!     "instrs": [
//!       {"op": "vload", "dest": "z", "type": "vector", "args": ["p"]},
//!       {"op": "vadd", "dest": "a", "type": "vector", "args": ["x", "y"]},
//!       {"op": "vadd", "dest": "b", "type": "vector", "args": ["a", "z"]},
//!       {"op": "print", "args": ["b"]}
//!     ]
//!   }]
//! }"#)?;
//!
//! let before = CostModel.program_cost(&program);
//! let events = vreduce::reduce_program(&mut program)?;
//!
//! assert!(CostModel.program_cost(&program) < before);
//! assert!(events.has(EventKind::WideningInserted));
//! # Ok::<(), vreduce::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - the instruction model and the JSON program document
//! - [`analysis`] - basic blocks, divergence, cost estimation
//! - [`compiler`] - rewrite tables, rename propagation, the two passes and their
//!   scheduler
//! - [`prelude`] - convenient re-exports
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Pipeline
//!
//! 1. **Scalarization**: for each block, every instruction whose destination is
//!    not in the block's exit divergence set and whose opcode has a scalar form is
//!    rewritten in place; vector results are renamed with a `_s` suffix and every
//!    later use follows.
//! 2. **Restitch**: every argument at a vector-required position whose definition
//!    is no longer vector-typed gets an `s2vb` broadcast named with a `_v` suffix,
//!    inserted right before the consumer; only later vector-required uses switch
//!    to the broadcast.
//!
//! Each pass runs once per function. Functions are independent.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use vreduce::prelude::*;
///
/// let program = Program::from_json_str(r#"{"functions": []}"#)?;
/// assert_eq!(CostModel.program_cost(&program), 0);
/// # Ok::<(), vreduce::Error>(())
/// ```
pub mod prelude;

pub mod analysis;
pub mod compiler;
pub mod ir;

/// `vreduce` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `vreduce` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use vreduce::{ir::Program, Error};
///
/// match Program::from_json_str(r#"{"functions": [{"name": "f", "instrs": [{"op": "vfoo"}]}]}"#) {
///     Ok(_) => println!("parsed"),
///     Err(Error::Json(e)) => println!("not a program: {}", e),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

use compiler::{CompilerContext, EventLog, PassScheduler};
use ir::Program;

/// Runs scalarization and restitch over every function of `program`.
///
/// Uses the built-in rewrite tables and [`analysis::DivergenceAnalysis`]. The
/// program is rewritten in place; the returned log records every change.
///
/// # Errors
///
/// Returns an error if a built-in table fails validation, if a function cannot
/// be split into blocks, or if a function violates SSA form. Functions rewritten
/// before the failure stay rewritten.
pub fn reduce_program(program: &mut Program) -> Result<EventLog> {
    let ctx = CompilerContext::new()?;
    reduce_program_with(program, &ctx, &mut PassScheduler::default())?;
    Ok(ctx.events)
}

/// Runs `scheduler` over `program` with an explicit context.
///
/// Returns `true` if any function changed.
///
/// # Errors
///
/// Returns the first error a pass reports.
pub fn reduce_program_with(
    program: &mut Program,
    ctx: &CompilerContext,
    scheduler: &mut PassScheduler,
) -> Result<bool> {
    let changed = scheduler.run(program, ctx)?;
    log::info!(
        "reduced {} functions: {}",
        program.functions.len(),
        compiler::DerivedStats::from_log(&ctx.events)
    );
    Ok(changed)
}
