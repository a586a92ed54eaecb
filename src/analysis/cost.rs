//! Static cost estimation.
//!
//! Scores a program by counting weighted operations: a vector-class opcode costs
//! one operation per lane, everything else costs one. Predication is ignored since
//! a predicated instruction still occupies the full vector unit. Labels are free.
//!
//! The estimate is used to check that a rewrite made a program cheaper.

use crate::ir::{Code, Function, Opcode, Program};

/// Weight of a vector-class operation.
pub const VECTOR_OP_COST: usize = 4;

/// Weight of every other operation.
pub const SCALAR_OP_COST: usize = 1;

/// The fixed weighting used to score programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostModel;

impl CostModel {
    /// Creates the cost model.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Weight of a single operation.
    ///
    /// `s2vb` is deliberately scalar-priced: one scalar write fills a whole vector
    /// register.
    #[must_use]
    pub const fn weight(&self, op: Opcode) -> usize {
        match op {
            Opcode::Vadd
            | Opcode::S2v
            | Opcode::Vphi
            | Opcode::Vload
            | Opcode::Vstore
            | Opcode::Vcmp => VECTOR_OP_COST,
            _ => SCALAR_OP_COST,
        }
    }

    /// Total weight of a function body.
    #[must_use]
    pub fn function_cost(&self, function: &Function) -> usize {
        function
            .instrs
            .iter()
            .filter_map(Code::as_instruction)
            .map(|instr| self.weight(instr.op))
            .sum()
    }

    /// Total weight of every function in a program.
    #[must_use]
    pub fn program_cost(&self, program: &Program) -> usize {
        program
            .functions
            .iter()
            .map(|func| self.function_cost(func))
            .sum()
    }
}
