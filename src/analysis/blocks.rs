//! Basic-block formation over a flat function body.
//!
//! Blocks are formed the classic way: a label starts a new block and names it, and
//! `br`, `jmp` and `ret` end the current one. Blocks do not own their instructions;
//! each [`BasicBlock`] records the positions of its instructions in the function's
//! code sequence, so passes can mutate the function through those positions while
//! holding the partition.
//!
//! Positions stay valid only as long as nothing is inserted into the function.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    ir::{Code, Function, Opcode},
    Result,
};

/// A maximal straight-line run of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// The block name: its label, or a generated `b<N>` name.
    pub label: String,
    /// Positions of the block's instructions in [`Function::instrs`], in order.
    /// The naming label itself is not included.
    pub positions: Vec<usize>,
}

impl BasicBlock {
    fn new(label: String) -> Self {
        Self {
            label,
            positions: Vec::new(),
        }
    }

    /// Position of the last instruction, if the block has any.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.positions.last().copied()
    }
}

/// The blocks of one function in program order, with their successors.
#[derive(Debug, Clone, Default)]
pub struct BlockPartition {
    blocks: Vec<BasicBlock>,
    by_label: FxHashMap<String, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl BlockPartition {
    /// Splits `function` into basic blocks and links them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a branch has no targets or names a
    /// label that does not exist in the function.
    pub fn form(function: &Function) -> Result<Self> {
        let real_labels: FxHashSet<&str> = function.instrs.iter().filter_map(Code::label).collect();

        let mut blocks: Vec<BasicBlock> = Vec::new();
        let mut current: Option<BasicBlock> = None;

        for (position, code) in function.instrs.iter().enumerate() {
            match code {
                Code::Label { label } => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    current = Some(BasicBlock::new(label.clone()));
                }
                Code::Instruction(instr) => {
                    let block = current.get_or_insert_with(|| {
                        BasicBlock::new(fresh_name(blocks.len(), &real_labels))
                    });
                    block.positions.push(position);

                    if instr.op.is_terminator() {
                        blocks.extend(current.take());
                    }
                }
            }
        }
        blocks.extend(current);

        let by_label = blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (block.label.clone(), index))
            .collect::<FxHashMap<_, _>>();

        let mut successors = vec![Vec::new(); blocks.len()];
        let mut predecessors = vec![Vec::new(); blocks.len()];

        for (index, block) in blocks.iter().enumerate() {
            let last = block.last().and_then(|pos| function.instruction(pos));

            let targets: Vec<usize> = match last {
                Some(instr) if matches!(instr.op, Opcode::Br | Opcode::Jmp) => {
                    let names = instr.targets();
                    if names.is_empty() {
                        return Err(malformed_error!(
                            "'{}' in block '{}' of '{}' has no targets",
                            instr.op,
                            block.label,
                            function.name
                        ));
                    }
                    names
                        .into_iter()
                        .map(|name| {
                            by_label.get(name).copied().ok_or_else(|| {
                                malformed_error!(
                                    "branch to unknown label '{}' in '{}'",
                                    name,
                                    function.name
                                )
                            })
                        })
                        .collect::<Result<_>>()?
                }
                Some(instr) if instr.op == Opcode::Ret => Vec::new(),
                _ if index + 1 < blocks.len() => vec![index + 1],
                _ => Vec::new(),
            };

            for &target in &targets {
                if !predecessors[target].contains(&index) {
                    predecessors[target].push(index);
                }
            }
            successors[index] = targets;
        }

        Ok(Self {
            blocks,
            by_label,
            successors,
            predecessors,
        })
    }

    /// The blocks in program order.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the function had no code.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Looks up a block index by name.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    /// Successor block indices of block `index`.
    #[must_use]
    pub fn successors(&self, index: usize) -> &[usize] {
        self.successors.get(index).map_or(&[], Vec::as_slice)
    }

    /// Predecessor block indices of block `index`.
    #[must_use]
    pub fn predecessors(&self, index: usize) -> &[usize] {
        self.predecessors.get(index).map_or(&[], Vec::as_slice)
    }

    /// Block indices in reverse postorder from the entry block.
    ///
    /// Blocks unreachable from the entry are appended in program order.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<usize> {
        let count = self.blocks.len();
        if count == 0 {
            return Vec::new();
        }

        let mut visited = vec![false; count];
        let mut postorder = Vec::with_capacity(count);
        // (block, next successor to visit)
        let mut stack = vec![(0usize, 0usize)];
        visited[0] = true;

        while let Some((block, next)) = stack.last_mut() {
            let succs = &self.successors[*block];
            if let Some(&succ) = succs.get(*next) {
                *next += 1;
                if !visited[succ] {
                    visited[succ] = true;
                    stack.push((succ, 0));
                }
            } else {
                postorder.push(*block);
                stack.pop();
            }
        }

        postorder.reverse();
        postorder.extend((0..count).filter(|&b| !visited[b]));
        postorder
    }
}

fn fresh_name(ordinal: usize, taken: &FxHashSet<&str>) -> String {
    let mut name = format!("b{ordinal}");
    while taken.contains(name.as_str()) {
        name.push('_');
    }
    name
}
