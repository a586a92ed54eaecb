//! Type repair after scalarization.
//!
//! Scalarization can leave a scalar value feeding an argument position that must
//! be vector-typed. This pass walks the function once with an index cursor and,
//! at every such use, inserts a broadcast in front of the consumer:
//!
//! ```text
//! a_s: int = add x y
//! a_s_v: vector = s2vb a_s     // inserted
//! b: vector = vadd a_s_v z
//! print a_s                    // not a vector position: untouched
//! ```
//!
//! After inserting `name_v`, later uses of `name` are rewritten only where the
//! consuming opcode requires a vector at that position
//! ([`RenameScope::VectorPositions`]). The same scalar may legitimately feed both
//! scalar and vector consumers.
//!
//! # Cursor
//!
//! Insertions shift the remainder of the body, so the scan is driven by an
//! explicit index over the live `instrs` vector. After an insertion the cursor
//! steps over the new broadcast and lands on the consumer again; the consumer is
//! then re-read so that an argument used at two vector positions is widened once.
//!
//! Running the pass on a type-consistent function changes nothing.

use crate::{
    compiler::{
        pass::FunctionPass,
        rename::{propagate_rename, RenameScope},
        CompilerContext, EventKind,
    },
    ir::{DefIndex, Function, Instruction, Opcode, Type},
    Result,
};

/// Suffix appended to a scalar name to form its broadcast.
pub const VECTOR_SUFFIX: &str = "_v";

/// The opcode inserted to broadcast a scalar into every lane.
pub const WIDENING_OPCODE: Opcode = Opcode::S2vb;

/// Restitch pass.
pub struct RestitchPass;

impl Default for RestitchPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RestitchPass {
    /// Creates a new restitch pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Checks the argument at `slot` of the instruction at `cursor` and widens it
    /// if its definition is not vector-typed.
    ///
    /// Returns `true` if a broadcast was inserted; the consumer then sits at
    /// `cursor + 1`.
    fn widen_operand(
        function: &mut Function,
        cursor: usize,
        slot: usize,
        defs: &mut DefIndex,
        ctx: &CompilerContext,
    ) -> Result<bool> {
        let Some(consumer) = function.instruction(cursor) else {
            return Ok(false);
        };
        let Some(arg) = consumer.var_args().get(slot).cloned() else {
            return Ok(false);
        };

        let Some(def_position) = defs.get(&arg) else {
            return Ok(false);
        };
        if def_position >= cursor {
            return Err(ssa_error!(
                "'{}' is used at {} in function '{}' before its definition at {}",
                arg,
                cursor,
                function.name,
                def_position
            ));
        }

        let vector_typed = function
            .instruction(def_position)
            .is_some_and(Instruction::is_vector_typed);
        if vector_typed {
            return Ok(false);
        }

        let widened = format!("{arg}{VECTOR_SUFFIX}");
        let broadcast = Instruction::value(&widened, Type::Vector, WIDENING_OPCODE, [&arg]);
        log::debug!("{}:{}: inserting {}", function.name, cursor, broadcast);

        function.instrs.insert(cursor, broadcast.into());
        defs.insert(&widened, cursor)?;

        let uses = propagate_rename(
            &mut function.instrs[cursor + 1..],
            &arg,
            &widened,
            RenameScope::VectorPositions(&ctx.tables.vector_positions),
        );

        ctx.events
            .record(EventKind::WideningInserted)
            .at(&function.name, cursor)
            .pass("restitch")
            .message(format!("{widened} = s2vb {arg} ({uses} vector uses)"));

        Ok(true)
    }
}

impl FunctionPass for RestitchPass {
    fn name(&self) -> &'static str {
        "restitch"
    }

    fn should_run(&self, function: &Function, ctx: &CompilerContext) -> bool {
        function
            .instructions()
            .any(|instr| ctx.tables.vector_positions.positions(instr.op).is_some())
    }

    fn run_on_function(&self, function: &mut Function, ctx: &CompilerContext) -> Result<bool> {
        let positions = &ctx.tables.vector_positions;
        let mut defs = DefIndex::build(function)?;
        let mut changed = false;
        let mut cursor = 0;

        while cursor < function.instrs.len() {
            let required = function
                .instruction(cursor)
                .and_then(|instr| positions.positions(instr.op))
                .unwrap_or_default();

            for &slot in required {
                if Self::widen_operand(function, cursor, slot, &mut defs, ctx)? {
                    cursor += 1;
                    changed = true;
                }
            }

            cursor += 1;
        }

        Ok(changed)
    }

    fn description(&self) -> &'static str {
        "Broadcasts scalar values that feed vector-required argument positions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::Polarity, test::FunctionBuilder, Error};

    fn ctx() -> CompilerContext {
        CompilerContext::new().unwrap()
    }

    #[test]
    fn test_widening_inserted_before_consumer() {
        let mut func = FunctionBuilder::new("main")
            .scalar("a_s", Opcode::Add, &["x", "y"])
            .vector("b", Opcode::Vadd, &["a_s", "z"])
            .print(&["a_s"])
            .build();

        let ctx = ctx();
        assert!(RestitchPass.run_on_function(&mut func, &ctx).unwrap());

        assert_eq!(func.instrs.len(), 4);
        assert_eq!(
            func.instruction(1).unwrap().to_string(),
            "a_s_v: vector = s2vb a_s;"
        );
        assert_eq!(func.instruction(2).unwrap().args, vec!["a_s_v", "z"]);
        assert_eq!(func.instruction(3).unwrap().args, vec!["a_s"]);
        assert_eq!(ctx.events.count_kind(EventKind::WideningInserted), 1);
    }

    #[test]
    fn test_same_operand_twice_widened_once() {
        let mut func = FunctionBuilder::new("main")
            .scalar("a", Opcode::Add, &["x", "y"])
            .vector("b", Opcode::Vmul, &["a", "a"])
            .vector("c", Opcode::Vsub, &["b", "a"])
            .build();

        RestitchPass.run_on_function(&mut func, &ctx()).unwrap();

        let ops: Vec<_> = func.instructions().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![Opcode::Add, Opcode::S2vb, Opcode::Vmul, Opcode::Vsub]
        );
        assert_eq!(func.instruction(2).unwrap().args, vec!["a_v", "a_v"]);
        assert_eq!(func.instruction(3).unwrap().args, vec!["b", "a_v"]);
    }

    #[test]
    fn test_scalar_position_kept() {
        // position 0 of vphi is the predicate and stays scalar
        let mut func = FunctionBuilder::new("main")
            .constant("p", true)
            .scalar("a", Opcode::Add, &["x", "y"])
            .vector("u", Opcode::S2vb, &["a"])
            .vector("m", Opcode::Vphi, &["p", "u", "a"])
            .build();

        RestitchPass.run_on_function(&mut func, &ctx()).unwrap();

        let m = func.instruction(4).unwrap();
        assert_eq!(m.op, Opcode::Vphi);
        assert_eq!(m.args, vec!["p", "u", "a_v"]);
        assert_eq!(func.instruction(2).unwrap().args, vec!["a"]);
    }

    #[test]
    fn test_idempotent() {
        let mut func = FunctionBuilder::new("main")
            .scalar("a", Opcode::Add, &["x", "y"])
            .vector("b", Opcode::Vadd, &["a", "a"])
            .vector_predicated("c", Opcode::Vadd, &["b", "a"], "b", Polarity::positive())
            .build();

        let ctx = ctx();
        assert!(RestitchPass.run_on_function(&mut func, &ctx).unwrap());
        let once = func.clone();

        assert!(!RestitchPass.run_on_function(&mut func, &ctx).unwrap());
        assert_eq!(func, once);
        assert_eq!(ctx.events.count_kind(EventKind::WideningInserted), 1);
    }

    #[test]
    fn test_undefined_argument_is_not_an_error() {
        let mut func = FunctionBuilder::new("main")
            .vector("b", Opcode::Vadd, &["param", "param"])
            .build();

        assert!(!RestitchPass.run_on_function(&mut func, &ctx()).unwrap());
    }

    #[test]
    fn test_use_before_definition_rejected() {
        let mut func = FunctionBuilder::new("main")
            .vector("b", Opcode::Vadd, &["a", "a"])
            .scalar("a", Opcode::Add, &["x", "y"])
            .build();

        let result = RestitchPass.run_on_function(&mut func, &ctx());
        assert!(matches!(result, Err(Error::SsaViolation { .. })));
    }

    #[test]
    fn test_vphi_forward_operand_rejected() {
        // vphi selects lane-wise between values that must already exist
        let mut func = FunctionBuilder::new("main")
            .constant("p", true)
            .vector("u", Opcode::S2vb, &["x"])
            .label("loop")
            .vector("m", Opcode::Vphi, &["p", "u", "next"])
            .scalar("next", Opcode::Add, &["x", "y"])
            .branch("p", "loop", "done")
            .label("done")
            .ret()
            .build();

        let ctx = ctx();
        let result = RestitchPass.run_on_function(&mut func, &ctx);
        assert!(matches!(result, Err(Error::SsaViolation { .. })));
        assert_eq!(ctx.events.warnings().count(), 0);
    }

    #[test]
    fn test_widened_name_collision() {
        let mut func = FunctionBuilder::new("main")
            .scalar("a", Opcode::Add, &["x", "y"])
            .constant("a_v", 0)
            .vector("b", Opcode::Vadd, &["a", "z"])
            .build();

        let result = RestitchPass.run_on_function(&mut func, &ctx());
        assert!(matches!(result, Err(Error::SsaViolation { .. })));
    }
}
