//! Forward rename propagation.
//!
//! After a destination is renamed, every later use has to follow. The same rewrite
//! serves both passes with a different scope:
//!
//! - scalarization renames every later use ([`RenameScope::AllUses`]);
//! - restitch renames only uses sitting at a vector-required position of their
//!   consumer ([`RenameScope::VectorPositions`]), because the same value may also
//!   be read as a scalar elsewhere.
//!
//! Callers choose the start of the rewrite by passing the tail of the function
//! body (`&mut function.instrs[start..]`). Only variable arguments are rewritten;
//! branch labels are never touched.

use crate::{
    compiler::tables::VectorPositionTable,
    ir::{Code, Opcode},
};

/// Which uses of a name a rename applies to.
#[derive(Debug, Clone, Copy)]
pub enum RenameScope<'a> {
    /// Every use.
    AllUses,
    /// Only uses at positions the table marks vector-required for the consuming
    /// opcode. Opcodes absent from the table keep the old name.
    VectorPositions(&'a VectorPositionTable),
}

impl RenameScope<'_> {
    /// Returns `true` if a use at argument `position` of an `op` instruction is
    /// rewritten under this scope.
    #[must_use]
    pub fn admits(&self, op: Opcode, position: usize) -> bool {
        match self {
            Self::AllUses => true,
            Self::VectorPositions(table) => table.requires_vector(op, position),
        }
    }
}

/// Rewrites uses of `from` to `to` in `code`, limited to `scope`.
///
/// Returns the number of argument slots rewritten.
pub fn propagate_rename(code: &mut [Code], from: &str, to: &str, scope: RenameScope<'_>) -> usize {
    let mut renamed = 0;

    for instr in code.iter_mut().filter_map(Code::as_instruction_mut) {
        let op = instr.op;
        for (position, arg) in instr.var_args_mut().iter_mut().enumerate() {
            if arg == from && scope.admits(op, position) {
                to.clone_into(arg);
                renamed += 1;
            }
        }
    }

    if renamed > 0 {
        log::trace!("renamed {renamed} uses of '{from}' to '{to}'");
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler::tables::VectorPositionTable, test::FunctionBuilder};

    #[test]
    fn test_all_uses() {
        let mut func = FunctionBuilder::new("main")
            .vector("b", Opcode::Vadd, &["a", "a"])
            .scalar("c", Opcode::Add, &["a", "x"])
            .print(&["a"])
            .build();

        let renamed = propagate_rename(&mut func.instrs, "a", "a_s", RenameScope::AllUses);
        assert_eq!(renamed, 4);
        assert_eq!(func.instruction(0).unwrap().args, vec!["a_s", "a_s"]);
        assert_eq!(func.instruction(1).unwrap().args, vec!["a_s", "x"]);
        assert_eq!(func.instruction(2).unwrap().args, vec!["a_s"]);
    }

    #[test]
    fn test_vector_positions_only() {
        let table = VectorPositionTable::load().unwrap();
        let mut func = FunctionBuilder::new("main")
            .vector("b", Opcode::Vadd, &["a", "z"])
            .scalar("c", Opcode::Add, &["a", "a"])
            .vector("d", Opcode::Vphi, &["a", "a", "z"])
            .build();

        let renamed = propagate_rename(
            &mut func.instrs,
            "a",
            "a_v",
            RenameScope::VectorPositions(&table),
        );
        assert_eq!(renamed, 2);
        assert_eq!(func.instruction(0).unwrap().args, vec!["a_v", "z"]);
        assert_eq!(func.instruction(1).unwrap().args, vec!["a", "a"]);
        // position 0 of vphi is the predicate
        assert_eq!(func.instruction(2).unwrap().args, vec!["a", "a_v", "z"]);
    }

    #[test]
    fn test_labels_untouched() {
        let mut func = FunctionBuilder::new("main")
            .branch("a", "a", "b")
            .label("a")
            .label("b")
            .build();

        let renamed = propagate_rename(&mut func.instrs, "a", "a_s", RenameScope::AllUses);
        assert_eq!(renamed, 1);
        assert_eq!(func.instruction(0).unwrap().args, vec!["a_s", "a", "b"]);
        assert_eq!(func.instrs[1].label(), Some("a"));
    }

    #[test]
    fn test_start_bound() {
        let mut func = FunctionBuilder::new("main")
            .print(&["a"])
            .print(&["a"])
            .build();

        let renamed = propagate_rename(&mut func.instrs[1..], "a", "a_s", RenameScope::AllUses);
        assert_eq!(renamed, 1);
        assert_eq!(func.instruction(0).unwrap().args, vec!["a"]);
        assert_eq!(func.instruction(1).unwrap().args, vec!["a_s"]);
    }
}
