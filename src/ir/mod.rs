//! Typed, SSA-form vector IR.
//!
//! This module is the instruction model the rest of the crate reads and mutates:
//!
//! - [`Program`] - the document root, an ordered list of functions
//! - [`Function`] - an ordered sequence of [`Code`] entries (labels and instructions)
//! - [`Instruction`] - a typed record: destination, [`Opcode`], arguments, [`Type`]
//!   and an optional [`Predicate`] guard
//! - [`DefIndex`] - destination name to defining position, per function
//!
//! # Invariants
//!
//! Functions are expected to be in single static assignment form: each destination
//! is defined once and every use follows its definition in program order. The
//! passes rely on this and report [`crate::Error::SsaViolation`] when they observe
//! otherwise, but they do not verify it up front.
//!
//! # Example
//!
//! ```rust
//! use vreduce::ir::{Code, Function, Instruction, Opcode, Type};
//!
//! let func = Function::new(
//!     "main",
//!     vec![
//!         Instruction::value("a", Type::Vector, Opcode::Vadd, ["x", "y"]).into(),
//!         Code::Label { label: "done".into() },
//!     ],
//! );
//! assert_eq!(func.instruction_count(), 1);
//! ```

mod function;
mod instruction;
mod opcode;
mod program;
mod types;

pub use function::{DefIndex, Function};
pub use instruction::{Code, Instruction};
pub use opcode::{Opcode, VECTOR_WIDTH};
pub use program::Program;
pub use types::{Polarity, Predicate, Type, UNCONDITIONAL};
