use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::execution_log::{CommandStatus, ExecutionLog};

use super::styling::{bright, bright_green, bright_red};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn status_cell(status: CommandStatus) -> Cell {
    match status {
        CommandStatus::Success => Cell::new("Success").fg(TableColor::Green),
        CommandStatus::Failed => Cell::new("Failed").fg(TableColor::Red),
    }
}

/// Prints one row per command plus the overall job result to stderr.
pub fn print_command_table(log: &ExecutionLog) {
    eprintln!("{}", render_command_table(log));
}

fn render_command_table(log: &ExecutionLog) -> String {
    let mut table = create_table();
    table.set_header(
        ["#", "Command", "Output lines", "Status"]
            .into_iter()
            .map(|label| Cell::new(label).fg(TableColor::Cyan)),
    );

    for (i, (command, entry)) in log.commands.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(command),
            Cell::new(entry.output.len()),
            status_cell(entry.status),
        ]);
    }

    let overall = if log.job_failed() {
        bright_red(&log.overall_status)
    } else {
        bright_green(&log.overall_status)
    };

    format!("{table}\n{} {overall}\n", bright("Job result:"))
}
