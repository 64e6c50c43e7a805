//! Financial statement tables

use super::header::{format_amount, NOT_AVAILABLE};
use crate::model::{FinancialStatement, StatementData, StatementKind};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

/// One row per line item, one column per fiscal period (newest first)
pub fn statement_table(statement: &FinancialStatement) -> Table {
    let periods = statement.periods();

    let mut header = vec![Cell::new("Line Item")];
    header.extend(
        periods
            .iter()
            .map(|p| Cell::new(p.format("%Y-%m-%d")).set_alignment(CellAlignment::Right)),
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header);

    for item in &statement.line_items {
        let mut row = vec![Cell::new(&item.name)];
        row.extend(periods.iter().map(|period| {
            let value = item
                .values
                .get(period)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format_amount(*v));
            Cell::new(value).set_alignment(CellAlignment::Right)
        }));
        table.add_row(row);
    }

    table
}

/// Statement tab body: title plus table, or the not-available notice
pub fn render_statement(kind: StatementKind, data: &StatementData) -> String {
    match data.as_statement() {
        Some(statement) if !statement.is_empty() => {
            format!("{}\n{}", kind.title(), statement_table(statement))
        }
        _ => format!("{}\n{}", kind.title(), kind.unavailable_notice()),
    }
}
