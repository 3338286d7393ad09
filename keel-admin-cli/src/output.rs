use prettytable::{format, Cell, Row, Table};
use serde::Serialize;

pub(crate) fn is_json(output: &Option<String>) -> bool {
    matches!(output.as_deref(), Some("json"))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Borderless table with a header row.
pub(crate) fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));
    table
}

pub(crate) fn row(cells: Vec<String>) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}
