//! Pass scheduler for the vector reduction pipeline.
//!
//! The [`PassScheduler`] runs an ordered list of [`FunctionPass`]es over every
//! function of a program. Each pass visits each function exactly once; the
//! pipeline is not iterated to a fixpoint.

use crate::{
    compiler::{
        context::CompilerContext,
        events::EventKind,
        pass::FunctionPass,
        passes::{RestitchPass, ScalarizationPass},
    },
    ir::Program,
    Result,
};

/// Runs function passes in order over a program.
pub struct PassScheduler {
    /// The passes, in execution order.
    pub passes: Vec<Box<dyn FunctionPass>>,
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::vector_reduction()
    }
}

impl PassScheduler {
    /// Creates a scheduler with no passes.
    #[must_use]
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Scalarization followed by restitch.
    #[must_use]
    pub fn vector_reduction() -> Self {
        Self::new()
            .with_pass(ScalarizationPass::new())
            .with_pass(RestitchPass::new())
    }

    /// Scalarization only. The output may be type-inconsistent.
    #[must_use]
    pub fn scalarize_only() -> Self {
        Self::new().with_pass(ScalarizationPass::new())
    }

    /// Appends a pass to the pipeline.
    #[must_use]
    pub fn with_pass(mut self, pass: impl FunctionPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the scheduled passes, in order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs every pass over every function of `program`.
    ///
    /// Passes run in order; each pass finishes the whole program before the next
    /// starts. Functions are processed independently.
    ///
    /// # Returns
    ///
    /// `true` if any pass changed any function. Events are accumulated in
    /// `ctx.events`.
    ///
    /// # Errors
    ///
    /// Returns the first error any pass reports. Functions already processed stay
    /// rewritten.
    pub fn run(&mut self, program: &mut Program, ctx: &CompilerContext) -> Result<bool> {
        let mut any_changed = false;

        for pass in &mut self.passes {
            pass.initialize(ctx)?;

            for function in &mut program.functions {
                if !pass.should_run(function, ctx) {
                    log::trace!("{}: skipping '{}'", pass.name(), function.name);
                    continue;
                }

                ctx.events
                    .record(EventKind::PassStarted)
                    .function(&function.name)
                    .pass(pass.name());

                let changed = pass.run_on_function(function, ctx).inspect_err(|err| {
                    ctx.events
                        .record(EventKind::Error)
                        .function(&function.name)
                        .pass(pass.name())
                        .message(err.to_string());
                })?;

                ctx.events
                    .record(EventKind::PassCompleted)
                    .function(&function.name)
                    .pass(pass.name())
                    .message(if changed { "changed" } else { "unchanged" });

                any_changed |= changed;
            }

            pass.finalize(ctx)?;
            log::info!("{} finished after {:?}", pass.name(), ctx.elapsed());
        }

        Ok(any_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Function, Opcode},
        test::FunctionBuilder,
    };

    struct CountingPass {
        name: &'static str,
        changes_to_make: usize,
    }

    impl FunctionPass for CountingPass {
        fn name(&self) -> &'static str {
            self.name
        }

        fn should_run(&self, function: &Function, _ctx: &CompilerContext) -> bool {
            function.name != "skipped"
        }

        fn run_on_function(&self, function: &mut Function, ctx: &CompilerContext) -> Result<bool> {
            for i in 0..self.changes_to_make {
                ctx.events
                    .record(EventKind::ValueRenamed)
                    .at(&function.name, i)
                    .message("test");
            }
            Ok(self.changes_to_make > 0)
        }
    }

    #[test]
    fn test_default_pipeline() {
        let scheduler = PassScheduler::default();
        assert_eq!(scheduler.pass_names(), vec!["scalarize", "restitch"]);
        assert_eq!(
            PassScheduler::scalarize_only().pass_names(),
            vec!["scalarize"]
        );
    }

    #[test]
    fn test_runs_each_function_once() {
        let mut program = Program::new(vec![
            FunctionBuilder::new("f").ret().build(),
            FunctionBuilder::new("skipped").ret().build(),
            FunctionBuilder::new("g").ret().build(),
        ]);
        let ctx = CompilerContext::new().unwrap();

        let mut scheduler = PassScheduler::new().with_pass(CountingPass {
            name: "counting",
            changes_to_make: 2,
        });
        assert!(scheduler.run(&mut program, &ctx).unwrap());

        assert_eq!(ctx.events.count_kind(EventKind::ValueRenamed), 4);
        assert_eq!(ctx.events.count_kind(EventKind::PassStarted), 2);
        assert_eq!(ctx.events.filter_function("skipped").count(), 0);
    }

    #[test]
    fn test_unchanged_program() {
        let mut program = Program::new(vec![FunctionBuilder::new("f")
            .scalar("a", Opcode::Add, &["x", "y"])
            .ret()
            .build()]);
        let before = program.clone();
        let ctx = CompilerContext::new().unwrap();

        assert!(!PassScheduler::default().run(&mut program, &ctx).unwrap());
        assert_eq!(program, before);
    }

    #[test]
    fn test_error_recorded() {
        let mut program = Program::new(vec![FunctionBuilder::new("f")
            .vector("b", Opcode::Vcmp, &["a", "a"])
            .scalar("a", Opcode::Add, &["x", "y"])
            .build()]);
        let ctx = CompilerContext::new().unwrap();

        assert!(PassScheduler::default().run(&mut program, &ctx).is_err());
        assert!(ctx.events.has(EventKind::Error));
    }
}
