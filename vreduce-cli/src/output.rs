use std::io::{self, Write};

use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::app::GlobalOptions;

/// Writes `report` to stdout, as pretty JSON under `--json` and through `render`
/// otherwise.
pub fn print_output<T: Serialize>(
    report: &T,
    opts: &GlobalOptions,
    render: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if opts.json {
        serde_json::to_writer_pretty(&mut stdout, report)?;
        writeln!(stdout)?;
    } else {
        render(report, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

#[derive(Clone, Copy)]
pub enum Align {
    Left,
    Right,
}

impl From<Align> for CellAlignment {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => CellAlignment::Left,
            Align::Right => CellAlignment::Right,
        }
    }
}

/// Report table without borders; columns are separated by two spaces.
pub struct TabWriter {
    table: Table,
    indent: &'static str,
}

impl TabWriter {
    pub fn new(columns: &[(&str, Align)]) -> Self {
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(columns.iter().map(|&(name, _)| name));

        let last = columns.len().saturating_sub(1);
        for (index, &(_, align)) in columns.iter().enumerate() {
            if let Some(column) = table.column_mut(index) {
                column.set_cell_alignment(align.into());
                column.set_padding((u16::from(index > 0), u16::from(index < last)));
            }
        }

        Self { table, indent: "" }
    }

    pub fn indent(mut self, prefix: &'static str) -> Self {
        self.indent = prefix;
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.table.add_row(cells);
    }

    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        for line in self.table.to_string().lines() {
            writeln!(out, "{}{}", self.indent, line.trim_end())?;
        }
        Ok(())
    }
}
