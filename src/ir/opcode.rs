//! The closed opcode vocabulary of the vector IR.
//!
//! Every opcode a program document may contain is a variant of [`Opcode`]. Parsing
//! rejects anything else, so the rewrite tables in [`crate::compiler`] can be written
//! as exhaustive matches instead of string comparisons.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Number of lanes in a vector register.
pub const VECTOR_WIDTH: usize = 4;

/// An IR opcode.
///
/// Serialized as the lowercase mnemonic (`vadd`, `s2vb`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    /// Load an immediate into a scalar.
    Const,
    /// Scalar addition.
    Add,
    /// Scalar multiplication.
    Mul,
    /// Scalar subtraction.
    Sub,
    /// Scalar division.
    Div,
    /// Scalar copy.
    Id,
    /// Less-than comparison.
    Lt,
    /// Less-or-equal comparison.
    Le,
    /// Greater-than comparison.
    Gt,
    /// Greater-or-equal comparison.
    Ge,
    /// Equality comparison.
    Eq,
    /// Boolean negation.
    Not,
    /// Boolean conjunction.
    And,
    /// Boolean disjunction.
    Or,
    /// Print any number of values.
    Print,
    /// Conditional branch.
    Br,
    /// Unconditional jump.
    Jmp,
    /// Return from the function.
    Ret,
    /// No operation.
    Nop,
    /// Scalar load from memory.
    Lw,
    /// Scalar store to memory.
    Sw,
    /// Merge of scalar values from several control-flow paths.
    Phi,
    /// Function call.
    Call,
    /// Lane-wise vector addition.
    Vadd,
    /// Lane-wise vector multiplication.
    Vmul,
    /// Lane-wise vector subtraction.
    Vsub,
    /// Lane-wise vector division.
    Vdiv,
    /// Load consecutive memory words into a vector.
    Vload,
    /// Store a vector to consecutive memory words.
    Vstore,
    /// Build a vector from one scalar per lane.
    S2v,
    /// Broadcast a single scalar to every lane.
    S2vb,
    /// Extract one lane of a vector into a scalar.
    V2s,
    /// Lane-wise comparison producing a predicate.
    Vcmp,
    /// Lane-wise vector copy.
    Idv,
    /// Lane-wise select between two vectors under a predicate.
    Vphi,
    /// Load one word per lane from per-lane addresses.
    Gather,
    /// Store one word per lane to per-lane addresses.
    Scatter,
}

impl Opcode {
    /// Returns the number of arguments this opcode takes, or `None` when the
    /// count is variable (or, for `const`, when the operand is an immediate).
    ///
    /// Branch arities count the target labels as arguments.
    #[must_use]
    pub const fn arity(self) -> Option<usize> {
        match self {
            Self::Const | Self::Print | Self::Phi | Self::Call => None,
            Self::Ret | Self::Nop => Some(0),
            Self::Id
            | Self::Not
            | Self::Jmp
            | Self::Lw
            | Self::Vload
            | Self::S2vb
            | Self::Idv
            | Self::Gather => Some(1),
            Self::Add
            | Self::Mul
            | Self::Sub
            | Self::Div
            | Self::Lt
            | Self::Le
            | Self::Gt
            | Self::Ge
            | Self::Eq
            | Self::And
            | Self::Or
            | Self::Sw
            | Self::Vadd
            | Self::Vmul
            | Self::Vsub
            | Self::Vdiv
            | Self::Vstore
            | Self::V2s
            | Self::Vcmp
            | Self::Scatter => Some(2),
            Self::Br | Self::Vphi => Some(3),
            Self::S2v => Some(VECTOR_WIDTH),
        }
    }

    /// Returns `true` if the instruction ends a basic block.
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        matches!(self, Self::Br | Self::Jmp | Self::Ret)
    }

    /// Returns `true` for opcodes that operate on vector registers.
    #[must_use]
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            Self::Vadd
                | Self::Vmul
                | Self::Vsub
                | Self::Vdiv
                | Self::Vload
                | Self::Vstore
                | Self::S2v
                | Self::S2vb
                | Self::V2s
                | Self::Vcmp
                | Self::Idv
                | Self::Vphi
                | Self::Gather
                | Self::Scatter
        )
    }

    /// Returns `true` if the opcode produces a value that may differ per lane
    /// regardless of whether its inputs do.
    ///
    /// `vload` and `gather` read distinct memory words per lane and `s2v`
    /// assembles a vector from independent scalars.
    #[must_use]
    pub const fn is_lane_varying_source(self) -> bool {
        matches!(self, Self::Vload | Self::Gather | Self::S2v)
    }

    /// Returns the mnemonic as written in program documents.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_mnemonic_roundtrip() {
        for op in Opcode::iter() {
            assert_eq!(Opcode::from_str(op.mnemonic()).unwrap(), op);
        }
        assert_eq!(Opcode::S2vb.to_string(), "s2vb");
        assert_eq!(Opcode::Vphi.mnemonic(), "vphi");
    }

    #[test]
    fn test_serde_uses_mnemonic() {
        let json = serde_json::to_string(&Opcode::Vadd).unwrap();
        assert_eq!(json, "\"vadd\"");

        let op: Opcode = serde_json::from_str("\"s2v\"").unwrap();
        assert_eq!(op, Opcode::S2v);

        assert!(serde_json::from_str::<Opcode>("\"vfma\"").is_err());
    }

    #[test]
    fn test_arity() {
        assert_eq!(Opcode::Add.arity(), Some(2));
        assert_eq!(Opcode::Id.arity(), Some(1));
        assert_eq!(Opcode::S2v.arity(), Some(VECTOR_WIDTH));
        assert_eq!(Opcode::Vphi.arity(), Some(3));
        assert_eq!(Opcode::Print.arity(), None);
        assert_eq!(Opcode::Ret.arity(), Some(0));
    }

    #[test]
    fn test_classification() {
        assert!(Opcode::Br.is_terminator());
        assert!(!Opcode::Vadd.is_terminator());
        assert!(Opcode::Vadd.is_vector());
        assert!(!Opcode::Add.is_vector());
        assert!(Opcode::Vload.is_lane_varying_source());
        assert!(!Opcode::S2vb.is_lane_varying_source());
    }
}
