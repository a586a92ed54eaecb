use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// vreduce - scalarize uniform vector instructions in a vector IR program
///
/// Without a subcommand, behaves like `vreduce reduce`.
#[derive(Debug, Parser)]
#[command(name = "vreduce", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub reduce: ReduceArgs,
}

/// Options shared across all subcommands.
#[derive(Debug, Args)]
pub struct GlobalOptions {
    /// Emit reports as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments of the `reduce` command.
#[derive(Debug, Args)]
pub struct ReduceArgs {
    /// Program document to read; stdin when omitted or `-`.
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Stop after scalarization. The output may be type-inconsistent.
    #[arg(long)]
    pub skip_restitch: bool,

    /// Print rewrite statistics to stderr.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite a program and write the result to stdout (the default).
    Reduce(ReduceArgs),

    /// Print the weighted operation count of a program.
    Cost {
        /// Program document to read; stdin when omitted or `-`.
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Break the total down by function.
        #[arg(long)]
        per_function: bool,
    },

    /// Show the per-block divergence sets of every function.
    Divergence {
        /// Program document to read; stdin when omitted or `-`.
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}
