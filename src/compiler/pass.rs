//! The per-function pass trait.

use crate::{
    compiler::context::CompilerContext,
    ir::Function,
    Result,
};

/// A rewrite that operates on one function at a time.
///
/// All passes must be thread-safe (Send + Sync) so a context holding them can be
/// shared. Passes receive mutable access to the function and shared access to
/// the context; events are recorded directly to `ctx.events`.
pub trait FunctionPass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Should this pass run on a specific function?
    ///
    /// Called before `run_on_function`. Override to skip functions that have
    /// nothing for the pass to do.
    fn should_run(&self, _function: &Function, _ctx: &CompilerContext) -> bool {
        true
    }

    /// Run the pass on a single function.
    ///
    /// Returns `true` if any changes were made, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the function violates SSA form or is malformed. The
    /// function may be partially rewritten when an error is returned.
    fn run_on_function(&self, function: &mut Function, ctx: &CompilerContext) -> Result<bool>;

    /// Called once before the pass runs over a program.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    fn initialize(&mut self, _ctx: &CompilerContext) -> Result<()> {
        Ok(())
    }

    /// Called once after the pass ran over a program.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails.
    fn finalize(&mut self, _ctx: &CompilerContext) -> Result<()> {
        Ok(())
    }

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
