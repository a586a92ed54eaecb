//! Divergence-guided scalarization.
//!
//! Rewrites vector instructions whose result is uniform across lanes into their
//! scalar equivalents, as listed in the [`crate::compiler::ScalarizationTable`].
//!
//! # Example
//!
//! Before:
//! ```text
//! a: vector = vadd x y
//! b: vector = vadd a z
//! print a
//! ```
//!
//! After (with `a` uniform):
//! ```text
//! a_s: int = add x y
//! b: vector = vadd a_s z      // type-inconsistent until restitch runs
//! print a_s
//! ```
//!
//! # Algorithm
//!
//! 1. Ask the context's [`crate::analysis::DivergenceOracle`] for the function's
//!    blocks and their exit sets.
//! 2. For every instruction, in block order: skip it if it has no destination,
//!    if the destination is in its block's *exit* set, or if its opcode has no
//!    scalar form.
//! 3. Remap the arguments, replace the opcode, set the type to `int` and clear
//!    any per-lane guard.
//! 4. If the instruction was vector-typed, rename the destination with a `_s`
//!    suffix and rewrite every later use, whatever its position.
//!
//! The exit set stands in for every instruction in the block, so a value that
//! becomes divergent only at the end of its block is never scalarized earlier in
//! the block, and a value that turns uniform late in a block still counts as
//! divergent there.

use crate::{
    compiler::{
        pass::FunctionPass,
        rename::{propagate_rename, RenameScope},
        CompilerContext, EventKind,
    },
    ir::{DefIndex, Function, Instruction, Polarity, Predicate, Type},
    Result,
};

/// Suffix appended to the destination of a scalarized vector value.
pub const SCALAR_SUFFIX: &str = "_s";

/// Scalarization pass.
///
/// Only instructions proven uniform by the oracle are touched; a predicated
/// instruction loses its guard because a uniform guard selects every lane or
/// none of them.
pub struct ScalarizationPass;

impl Default for ScalarizationPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarizationPass {
    /// Creates a new scalarization pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rewrites the instruction at `position` to scalar form.
    ///
    /// Returns `false` if the instruction is not eligible.
    fn scalarize_at(
        function: &mut Function,
        position: usize,
        defs: &mut DefIndex,
        ctx: &CompilerContext,
    ) -> Result<bool> {
        let Some(instr) = function.instruction(position) else {
            return Ok(false);
        };
        let Some(form) = ctx.tables.scalarization.get(instr.op) else {
            return Ok(false);
        };
        let Some(dest) = instr.dest.clone() else {
            return Ok(false);
        };

        // Earlier vector inputs that stayed vectors (no scalar form) will be read
        // as scalars after the rewrite.
        let vector_inputs: Vec<String> = instr
            .var_args()
            .iter()
            .filter(|arg| {
                defs.get(arg).is_some_and(|def| {
                    def < position
                        && function
                            .instruction(def)
                            .is_some_and(Instruction::is_vector_typed)
                })
            })
            .cloned()
            .collect();

        let Some(instr) = function.instruction_mut(position) else {
            return Ok(false);
        };

        let before = instr.to_string();
        let was_vector = instr.is_vector_typed();

        instr.args = form.remap_args(&instr.args)?;
        instr.op = form.scalar;
        instr.ty = Some(Type::Int);

        let cleared = instr.pred.is_some();
        if cleared {
            instr.pred = Some(Predicate::Unconditional);
            instr.neg = Some(Polarity::Unconditional);
        }

        let renamed = if was_vector {
            let new_name = format!("{dest}{SCALAR_SUFFIX}");
            defs.rename(&dest, &new_name)?;
            instr.dest = Some(new_name.clone());
            Some(new_name)
        } else {
            None
        };

        let after = instr.to_string();
        log::debug!("{}:{}: {} -> {}", function.name, position, before, after);
        ctx.events
            .record(EventKind::InstructionScalarized)
            .at(&function.name, position)
            .pass("scalarize")
            .message(format!("{before} -> {after}"));

        if cleared {
            ctx.events
                .record(EventKind::PredicateCleared)
                .at(&function.name, position)
                .pass("scalarize");
        }

        for input in &vector_inputs {
            log::warn!(
                "{}:{}: scalarized instruction reads vector '{}'",
                function.name,
                position,
                input
            );
            ctx.events
                .record(EventKind::Warning)
                .at(&function.name, position)
                .pass("scalarize")
                .message(format!("'{input}' is still a vector"));
        }

        if let Some(new_name) = renamed {
            let uses = propagate_rename(
                &mut function.instrs[position + 1..],
                &dest,
                &new_name,
                RenameScope::AllUses,
            );
            ctx.events
                .record(EventKind::ValueRenamed)
                .at(&function.name, position)
                .pass("scalarize")
                .message(format!("'{dest}' -> '{new_name}' ({uses} uses)"));
        }

        Ok(true)
    }
}

impl FunctionPass for ScalarizationPass {
    fn name(&self) -> &'static str {
        "scalarize"
    }

    fn should_run(&self, function: &Function, ctx: &CompilerContext) -> bool {
        function
            .instructions()
            .any(|instr| ctx.tables.scalarization.get(instr.op).is_some())
    }

    fn run_on_function(&self, function: &mut Function, ctx: &CompilerContext) -> Result<bool> {
        let info = ctx.oracle.analyze(function)?;
        let mut defs = DefIndex::build(function)?;
        let mut changed = false;

        for block in info.blocks.blocks() {
            let exit = info.exit_set(&block.label);

            for &position in &block.positions {
                let Some(dest) = function
                    .instruction(position)
                    .and_then(|instr| instr.dest.as_deref())
                else {
                    continue;
                };
                if exit.is_some_and(|set| set.contains(dest)) {
                    continue;
                }

                if Self::scalarize_at(function, position, &mut defs, ctx)? {
                    changed = true;
                }
            }
        }

        Ok(changed)
    }

    fn description(&self) -> &'static str {
        "Replaces uniform vector instructions with scalar equivalents"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{BlockPartition, DivergenceInfo, DivergenceOracle, DivergenceSet},
        compiler::{DerivedStats, RewriteTables},
        ir::Opcode,
        test::FunctionBuilder,
        Error,
    };

    /// Oracle reporting a fixed set of names as divergent in every block.
    struct FixedOracle(Vec<&'static str>);

    impl DivergenceOracle for FixedOracle {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn analyze(&self, function: &Function) -> Result<DivergenceInfo> {
            let blocks = BlockPartition::form(function)?;
            let exit = blocks
                .blocks()
                .iter()
                .map(|b| (b.label.clone(), self.0.iter().copied().collect::<DivergenceSet>()))
                .collect();
            Ok(DivergenceInfo {
                blocks,
                entry: Default::default(),
                exit,
            })
        }
    }

    fn ctx() -> CompilerContext {
        CompilerContext::new().unwrap()
    }

    #[test]
    fn test_uniform_vadd_scalarized_and_renamed() {
        let mut func = FunctionBuilder::new("main")
            .vector("a", Opcode::Vadd, &["x", "y"])
            .vector("b", Opcode::Vadd, &["a", "z"])
            .print(&["a"])
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec!["b"]));
        assert!(ScalarizationPass.run_on_function(&mut func, &ctx).unwrap());

        let a = func.instruction(0).unwrap();
        assert_eq!(a.to_string(), "a_s: int = add x y;");
        assert_eq!(func.instruction(1).unwrap().args, vec!["a_s", "z"]);
        assert_eq!(func.instruction(1).unwrap().op, Opcode::Vadd);
        assert_eq!(func.instruction(2).unwrap().args, vec!["a_s"]);

        assert_eq!(ctx.events.count_kind(EventKind::InstructionScalarized), 1);
        assert_eq!(ctx.events.count_kind(EventKind::ValueRenamed), 1);
    }

    #[test]
    fn test_divergent_instruction_untouched() {
        let mut func = FunctionBuilder::new("main")
            .vector("a", Opcode::Vadd, &["x", "y"])
            .build();
        let original = func.clone();

        let ctx = ctx().with_oracle(FixedOracle(vec!["a"]));
        assert!(!ScalarizationPass.run_on_function(&mut func, &ctx).unwrap());
        assert_eq!(func, original);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_ineligible_opcode_skipped() {
        let mut func = FunctionBuilder::new("main")
            .vector("m", Opcode::Vcmp, &["x", "y"])
            .scalar("s", Opcode::Add, &["x", "y"])
            .build();
        let original = func.clone();

        assert!(!ScalarizationPass.run_on_function(&mut func, &ctx()).unwrap());
        assert_eq!(func, original);
    }

    #[test]
    fn test_predicate_cleared() {
        let mut func = FunctionBuilder::new("main")
            .vector_predicated("g", Opcode::Vadd, &["a", "b"], "mask", Polarity::negated())
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec![]));
        ScalarizationPass.run_on_function(&mut func, &ctx).unwrap();

        let g = func.instruction(0).unwrap();
        assert_eq!(g.op, Opcode::Add);
        assert_eq!(g.pred, Some(Predicate::Unconditional));
        assert_eq!(g.neg, Some(Polarity::Unconditional));
        assert_eq!(ctx.events.count_kind(EventKind::PredicateCleared), 1);
    }

    #[test]
    fn test_non_vector_result_not_renamed() {
        let mut func = FunctionBuilder::new("main")
            .vector_as("w", "int", Opcode::V2s, &["v"])
            .print(&["w"])
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec![]));
        assert!(ScalarizationPass.run_on_function(&mut func, &ctx).unwrap());
        assert_eq!(func.instruction(0).unwrap().to_string(), "w: int = id v;");
        assert_eq!(func.instruction(1).unwrap().args, vec!["w"]);
        assert!(!ctx.events.has(EventKind::ValueRenamed));
    }

    #[test]
    fn test_rename_collision_is_fatal() {
        let mut func = FunctionBuilder::new("main")
            .constant("a_s", 1)
            .vector("a", Opcode::Vadd, &["x", "y"])
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec![]));
        let result = ScalarizationPass.run_on_function(&mut func, &ctx);
        assert!(matches!(result, Err(Error::SsaViolation { .. })));
    }

    #[test]
    fn test_default_oracle_keeps_loaded_values_vector() {
        let mut func = FunctionBuilder::new("main")
            .constant("p", 0)
            .vector("m", Opcode::Vload, &["p"])
            .constant("x", 1)
            .vector("u", Opcode::S2vb, &["x"])
            .vector("d", Opcode::Vadd, &["m", "u"])
            .build();

        let ctx = ctx();
        ScalarizationPass.run_on_function(&mut func, &ctx).unwrap();

        assert_eq!(func.instruction(3).unwrap().to_string(), "u_s: int = id x;");
        let d = func.instruction(4).unwrap();
        assert_eq!(d.op, Opcode::Vadd);
        assert_eq!(d.args, vec!["m", "u_s"]);
    }

    #[test]
    fn test_vector_input_without_scalar_form_warns() {
        let mut func = FunctionBuilder::new("main")
            .constant("p", true)
            .vector("u", Opcode::Vphi, &["p", "x", "y"])
            .vector("a", Opcode::Vadd, &["u", "z"])
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec![]));
        assert!(ScalarizationPass.run_on_function(&mut func, &ctx).unwrap());

        assert_eq!(func.instruction(2).unwrap().to_string(), "a_s: int = add u z;");
        assert_eq!(ctx.events.warnings().count(), 1);
        assert_eq!(DerivedStats::from_log(&ctx.events).warnings, 1);
    }

    #[test]
    fn test_scalarized_input_does_not_warn() {
        let mut func = FunctionBuilder::new("main")
            .vector("a", Opcode::Vadd, &["x", "y"])
            .vector("b", Opcode::Vadd, &["a", "a"])
            .build();

        let ctx = ctx().with_oracle(FixedOracle(vec![]));
        ScalarizationPass.run_on_function(&mut func, &ctx).unwrap();

        assert_eq!(func.instruction(1).unwrap().to_string(), "b_s: int = add a_s a_s;");
        assert_eq!(ctx.events.warnings().count(), 0);
    }

    #[test]
    fn test_extended_forms() {
        let mut func = FunctionBuilder::new("main")
            .vector("m", Opcode::Vmul, &["x", "y"])
            .vector("c", Opcode::Idv, &["m"])
            .build();

        let builtin = ctx().with_oracle(FixedOracle(vec![]));
        assert!(!ScalarizationPass.run_on_function(&mut func.clone(), &builtin).unwrap());

        let extended = CompilerContext::with_tables(RewriteTables::load_extended().unwrap())
            .with_oracle(FixedOracle(vec![]));
        assert!(ScalarizationPass.run_on_function(&mut func, &extended).unwrap());
        assert_eq!(func.instruction(0).unwrap().to_string(), "m_s: int = mul x y;");
        assert_eq!(func.instruction(1).unwrap().to_string(), "c_s: int = id m_s;");
    }

    #[test]
    fn test_should_run() {
        let scalar_only = FunctionBuilder::new("f")
            .scalar("s", Opcode::Add, &["x", "y"])
            .build();
        let with_vector = FunctionBuilder::new("g")
            .vector("v", Opcode::Vadd, &["x", "y"])
            .build();

        let ctx = ctx();
        assert!(!ScalarizationPass.should_run(&scalar_only, &ctx));
        assert!(ScalarizationPass.should_run(&with_vector, &ctx));
    }
}
