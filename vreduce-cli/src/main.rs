mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // vreduce info+ on stderr; --verbose enables debug; RUST_LOG overrides
    let level = if cli.global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("vreduce", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    match &cli.command {
        None => commands::reduce::run(&cli.reduce, &cli.global),
        Some(Command::Reduce(args)) => commands::reduce::run(args, &cli.global),
        Some(Command::Cost { path, per_function }) => {
            commands::cost::run(path.as_deref(), *per_function, &cli.global)
        }
        Some(Command::Divergence { path }) => {
            commands::divergence::run(path.as_deref(), &cli.global)
        }
    }
}
