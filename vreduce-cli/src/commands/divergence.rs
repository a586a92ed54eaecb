use std::{io::Write, path::Path};

use anyhow::Context;
use serde::Serialize;
use vreduce::analysis::{DivergenceAnalysis, DivergenceOracle};

use crate::{
    app::GlobalOptions,
    commands::common::read_program,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct FunctionDivergence {
    pub name: String,
    pub blocks: Vec<BlockDivergence>,
}

#[derive(Debug, Serialize)]
pub struct BlockDivergence {
    pub label: String,
    pub instructions: usize,
    pub entry: Vec<String>,
    pub exit: Vec<String>,
}

fn sorted_names(set: Option<&vreduce::analysis::DivergenceSet>) -> Vec<String> {
    set.map(|s| s.sorted().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn run(path: Option<&Path>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let program = read_program(path)?;
    let oracle = DivergenceAnalysis::new();

    let mut report = Vec::with_capacity(program.functions.len());
    for func in &program.functions {
        let info = oracle
            .analyze(func)
            .with_context(|| format!("divergence analysis failed for '{}'", func.name))?;

        let blocks = info
            .blocks
            .blocks()
            .iter()
            .map(|block| BlockDivergence {
                label: block.label.clone(),
                instructions: block.positions.len(),
                entry: sorted_names(info.entry_set(&block.label)),
                exit: sorted_names(info.exit_set(&block.label)),
            })
            .collect();

        report.push(FunctionDivergence {
            name: func.name.clone(),
            blocks,
        });
    }

    print_output(&report, opts, |report, out| {
        for (i, func) in report.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "@{}", func.name)?;

            let mut tw = TabWriter::new(&[
                ("Block", Align::Left),
                ("Instrs", Align::Right),
                ("Entry", Align::Left),
                ("Exit", Align::Left),
            ])
            .indent("  ");
            for block in &func.blocks {
                tw.row(vec![
                    block.label.clone(),
                    block.instructions.to_string(),
                    block.entry.join(" "),
                    block.exit.join(" "),
                ]);
            }
            tw.write_to(out)?;
        }
        Ok(())
    })
}
