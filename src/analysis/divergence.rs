//! Divergence analysis.
//!
//! A variable is *divergent* when its value may differ across the lanes of a
//! vector. The scalarization pass consumes this information through the
//! [`DivergenceOracle`] trait; [`DivergenceAnalysis`] is the default oracle.
//!
//! # Algorithm
//!
//! [`DivergenceAnalysis`] is a forward may-analysis over the basic blocks of a
//! function, solved with a worklist seeded in reverse postorder:
//!
//! 1. The entry block starts with an empty set; the meet is set union over
//!    predecessor exit sets.
//! 2. The transfer function walks the block in order. A destination becomes
//!    divergent if its opcode is a lane-varying source (`vload`, `gather`, `s2v`),
//!    if any variable argument is divergent, or if the instruction is guarded by a
//!    divergent predicate. Any other destination is removed from the set.
//! 3. Blocks whose exit set changed re-queue their successors until nothing
//!    changes.
//!
//! Sets only grow along a path, so the iteration terminates after at most
//! `blocks × variables` steps.
//!
//! # Granularity
//!
//! Results are per block: the consumer applies a block's *exit* set to every
//! instruction in that block.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    analysis::blocks::BlockPartition,
    ir::{Function, Instruction},
    Result,
};

/// A set of variable names known to be divergent at some program point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DivergenceSet {
    names: FxHashSet<String>,
}

impl DivergenceSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` may differ across lanes.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Marks `name` divergent. Returns `true` if it was not already.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Marks `name` uniform. Returns `true` if it was divergent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Adds every name of `other`.
    pub fn union_with(&mut self, other: &Self) {
        self.names.extend(other.names.iter().cloned());
    }

    /// Number of divergent names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no name is divergent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The names in lexicographic order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for DivergenceSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a [`DivergenceOracle`] reports for one function.
///
/// Block positions in `blocks` index the function as it was when analyzed.
#[derive(Debug, Clone, Default)]
pub struct DivergenceInfo {
    /// The function's basic blocks.
    pub blocks: BlockPartition,
    /// Divergent names at each block's entry, keyed by block label.
    pub entry: FxHashMap<String, DivergenceSet>,
    /// Divergent names at each block's exit, keyed by block label.
    pub exit: FxHashMap<String, DivergenceSet>,
}

impl DivergenceInfo {
    /// Exit set of the block named `label`.
    #[must_use]
    pub fn exit_set(&self, label: &str) -> Option<&DivergenceSet> {
        self.exit.get(label)
    }

    /// Entry set of the block named `label`.
    #[must_use]
    pub fn entry_set(&self, label: &str) -> Option<&DivergenceSet> {
        self.entry.get(label)
    }
}

/// Source of per-block divergence facts.
///
/// Implementations must report, for every block, the set of variables that may be
/// divergent at the block's exit. The entry sets are informational.
pub trait DivergenceOracle: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Partitions `function` into blocks and computes their divergence sets.
    ///
    /// # Errors
    ///
    /// Returns an error if the function cannot be split into blocks.
    fn analyze(&self, function: &Function) -> Result<DivergenceInfo>;
}

/// The default [`DivergenceOracle`]: a forward dataflow analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivergenceAnalysis;

impl DivergenceAnalysis {
    /// Creates the analysis.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if `instr`'s result may differ across lanes given the
    /// divergent names in `set`.
    #[must_use]
    pub fn produces_divergence(instr: &Instruction, set: &DivergenceSet) -> bool {
        instr.op.is_lane_varying_source()
            || instr.var_args().iter().any(|arg| set.contains(arg))
            || instr.predicate_var().is_some_and(|pred| set.contains(pred))
    }

    /// Applies the transfer function of one block to `state`.
    fn transfer(function: &Function, positions: &[usize], state: &mut DivergenceSet) {
        for &position in positions {
            let Some(instr) = function.instruction(position) else {
                continue;
            };
            let Some(dest) = &instr.dest else {
                continue;
            };

            if Self::produces_divergence(instr, state) {
                state.insert(dest.clone());
            } else {
                state.remove(dest);
            }
        }
    }
}

impl DivergenceOracle for DivergenceAnalysis {
    fn name(&self) -> &'static str {
        "divergence-analysis"
    }

    fn analyze(&self, function: &Function) -> Result<DivergenceInfo> {
        let blocks = BlockPartition::form(function)?;
        let count = blocks.len();

        let mut in_states = vec![DivergenceSet::new(); count];
        let mut out_states = vec![DivergenceSet::new(); count];
        let mut worklist: VecDeque<usize> = blocks.reverse_postorder().into();
        let mut in_worklist = vec![true; count];
        let mut iterations = 0usize;

        while let Some(block) = worklist.pop_front() {
            in_worklist[block] = false;
            iterations += 1;

            let mut input = DivergenceSet::new();
            for &pred in blocks.predecessors(block) {
                input.union_with(&out_states[pred]);
            }

            let mut output = input.clone();
            Self::transfer(function, &blocks.blocks()[block].positions, &mut output);
            in_states[block] = input;

            if output != out_states[block] {
                out_states[block] = output;
                for &succ in blocks.successors(block) {
                    if !in_worklist[succ] {
                        in_worklist[succ] = true;
                        worklist.push_back(succ);
                    }
                }
            }
        }

        log::trace!(
            "divergence of '{}' converged after {} block visits",
            function.name,
            iterations
        );

        let mut entry = FxHashMap::default();
        let mut exit = FxHashMap::default();
        for ((block, input), output) in blocks.blocks().iter().zip(in_states).zip(out_states) {
            entry.insert(block.label.clone(), input);
            exit.insert(block.label.clone(), output);
        }

        Ok(DivergenceInfo {
            blocks,
            entry,
            exit,
        })
    }
}
