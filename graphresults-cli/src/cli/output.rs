// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Output formatting for cycle reports

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use graphresults::display;
use serde_json::Value;

use super::handlers::CycleReport;

pub struct ResultFormatter;

impl ResultFormatter {
    /// First page of records as a table, one column per attribute
    pub fn format_table(report: &CycleReport) -> String {
        if report.records.is_empty() {
            return "No results".to_string();
        }

        let columns = attribute_columns(report);
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let mut header = vec![Cell::new("#"), Cell::new("label")];
        header.extend(columns.iter().map(Cell::new));
        table.set_header(header);

        let shown = match report.page_size {
            Some(page_size) => display::page(&report.records, page_size),
            None => &report.records[..],
        };
        for record in shown {
            let mut row = vec![record.result_index.to_string(), record.label.clone()];
            for column in &columns {
                row.push(record.attribute(column).map(value_text).unwrap_or_default());
            }
            table.add_row(row);
        }

        format!(
            "{}\nShowing {} of {} result(s)",
            table,
            shown.len(),
            report.records.len()
        )
    }

    pub fn format_json(report: &CycleReport) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }
}

/// Attribute names in first-seen order across all records
fn attribute_columns(report: &CycleReport) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in &report.records {
        for key in record.attributes.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
