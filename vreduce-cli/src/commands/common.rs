use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use anyhow::Context;
use vreduce::ir::Program;

/// Read a program document from `path`, or from stdin when `path` is absent or `-`.
pub fn read_program(path: Option<&Path>) -> anyhow::Result<Program> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("failed to open program: {}", path.display()))?;
            Program::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse program: {}", path.display()))
        }
        _ => Program::from_reader(io::stdin().lock()).context("failed to parse program from stdin"),
    }
}
