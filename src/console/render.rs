//! Terminal rendering of command output.

use std::io::{self, Write};

use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::{Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::commands::output::{CommandOutput, ControlAction, ResultLayout};
use crate::db::QueryResult;

/// Writes `output` to `out`. Control actions are handled by the loop and
/// render nothing.
pub fn render(output: &CommandOutput, out: &mut impl Write) -> io::Result<()> {
    match output {
        CommandOutput::Info(msg) => writeln!(out, "{msg}"),
        CommandOutput::Success(msg) => writeln!(out, "{}", format!("✅ {msg}").green()),
        CommandOutput::Error(msg) => writeln!(out, "{}", msg.as_str().red()),
        CommandOutput::Table { headers, rows } => writeln!(out, "{}", format_table(headers, rows)),
        CommandOutput::ResultSet { result, layout } => {
            let body = match layout {
                ResultLayout::Table => format_result_table(result),
                ResultLayout::Vertical => format_vertical(result),
            };
            writeln!(out, "{body}")
        }
        CommandOutput::Control(ControlAction::Exit | ControlAction::ClearScreen) => Ok(()),
        CommandOutput::Multiple(outputs) => {
            for output in outputs {
                render(output, out)?;
            }
            Ok(())
        }
    }
}

/// Formats a plain string table.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(headers);
    for row in rows {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    table.to_string()
}

/// Formats a result set as a boxed table with a row-count footer.
pub fn format_result_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return footer(result);
    }

    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();
    format!(
        "{}\n{}",
        format_table(&result.column_names(), &rows),
        footer(result)
    )
}

/// Formats a result set as one block per row, for `\G`.
pub fn format_vertical(result: &QueryResult) -> String {
    let names = result.column_names();
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (i, row) in result.rows.iter().enumerate() {
        out.push_str(&format!(
            "*************************** {}. row ***************************\n",
            i + 1
        ));
        for (name, value) in names.iter().zip(row) {
            out.push_str(&format!(
                "{name:>width$}: {}\n",
                value.to_display_string()
            ));
        }
    }
    out.push_str(&footer(result));
    out
}

/// `N rows in set (X.XX sec)`, or `Empty set (X.XX sec)`.
pub fn footer(result: &QueryResult) -> String {
    let secs = result.execution_time.as_secs_f64();
    match result.row_count() {
        0 => format!("Empty set ({secs:.2} sec)"),
        1 => format!("1 row in set ({secs:.2} sec)"),
        n => format!("{n} rows in set ({secs:.2} sec)"),
    }
}
