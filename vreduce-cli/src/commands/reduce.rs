use std::io::{self, Write};

use anyhow::Context;
use serde::Serialize;
use vreduce::{
    analysis::CostModel,
    compiler::{CompilerContext, DerivedStats, PassScheduler},
};

use crate::{
    app::{GlobalOptions, ReduceArgs},
    commands::common::read_program,
    output::{Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct ReduceStats {
    cost_before: usize,
    cost_after: usize,
    functions_transformed: usize,
    instructions_scalarized: usize,
    predicates_cleared: usize,
    values_renamed: usize,
    widenings_inserted: usize,
    warnings: usize,
}

impl ReduceStats {
    fn new(before: usize, after: usize, derived: &DerivedStats) -> Self {
        Self {
            cost_before: before,
            cost_after: after,
            functions_transformed: derived.functions_transformed,
            instructions_scalarized: derived.instructions_scalarized,
            predicates_cleared: derived.predicates_cleared,
            values_renamed: derived.values_renamed,
            widenings_inserted: derived.widenings_inserted,
            warnings: derived.warnings,
        }
    }

    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut tw = TabWriter::new(&[("Statistic", Align::Left), ("Value", Align::Right)]);
        let rows = [
            ("cost before", self.cost_before),
            ("cost after", self.cost_after),
            ("functions transformed", self.functions_transformed),
            ("instructions scalarized", self.instructions_scalarized),
            ("predicates cleared", self.predicates_cleared),
            ("values renamed", self.values_renamed),
            ("widenings inserted", self.widenings_inserted),
            ("warnings", self.warnings),
        ];
        for (name, value) in rows {
            tw.row(vec![name.to_string(), value.to_string()]);
        }
        tw.write_to(out)
    }
}

pub fn run(args: &ReduceArgs, opts: &GlobalOptions) -> anyhow::Result<()> {
    let mut program = read_program(args.path.as_deref())?;
    let cost_before = CostModel.program_cost(&program);

    let ctx = CompilerContext::new().context("failed to load rewrite tables")?;
    let mut scheduler = if args.skip_restitch {
        PassScheduler::scalarize_only()
    } else {
        PassScheduler::vector_reduction()
    };

    vreduce::reduce_program_with(&mut program, &ctx, &mut scheduler)
        .context("vector reduction failed")?;

    let mut stdout = io::stdout().lock();
    program
        .to_writer(&mut stdout)
        .context("failed to write program")?;
    stdout.flush()?;

    if args.stats {
        let stats = ReduceStats::new(
            cost_before,
            CostModel.program_cost(&program),
            &DerivedStats::from_log(&ctx.events),
        );
        // stdout carries the program
        let mut stderr = io::stderr().lock();
        if opts.json {
            serde_json::to_writer_pretty(&mut stderr, &stats)?;
            writeln!(stderr)?;
        } else {
            stats.render(&mut stderr)?;
        }
    }

    Ok(())
}
