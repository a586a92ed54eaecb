use std::{io::Write, path::Path};

use serde::Serialize;
use vreduce::analysis::CostModel;

use crate::{
    app::GlobalOptions,
    commands::common::read_program,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct CostReport {
    pub total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionCost>,
}

#[derive(Debug, Serialize)]
pub struct FunctionCost {
    pub name: String,
    pub instructions: usize,
    pub vector_ops: usize,
    pub cost: usize,
}

pub fn run(path: Option<&Path>, per_function: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let program = read_program(path)?;
    let model = CostModel::new();

    let functions = if per_function {
        program
            .functions
            .iter()
            .map(|func| FunctionCost {
                name: func.name.clone(),
                instructions: func.instruction_count(),
                vector_ops: func.instructions().filter(|i| i.op.is_vector()).count(),
                cost: model.function_cost(func),
            })
            .collect()
    } else {
        Vec::new()
    };

    let report = CostReport {
        total: model.program_cost(&program),
        functions,
    };

    print_output(&report, opts, |report, out| {
        if report.functions.is_empty() {
            return writeln!(out, "{}", report.total);
        }

        let mut tw = TabWriter::new(&[
            ("Function", Align::Left),
            ("Instrs", Align::Right),
            ("Vector", Align::Right),
            ("Cost", Align::Right),
        ]);
        for func in &report.functions {
            tw.row(vec![
                func.name.clone(),
                func.instructions.to_string(),
                func.vector_ops.to_string(),
                func.cost.to_string(),
            ]);
        }
        tw.row(vec![
            "total".to_string(),
            String::new(),
            String::new(),
            report.total.to_string(),
        ]);
        tw.write_to(out)
    })
}
