// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use querybatch::sort::cell::Cell as TableCell;
use querybatch::{ColumnConfig, Row, SortDirection};
use serde_json::Value;

use super::commands::OutputFormat;

/// Formats sorted tables
pub struct TableFormatter;

impl TableFormatter {
    pub fn format(rows: &[Row], columns: &[ColumnConfig], format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(rows, columns),
            OutputFormat::Json => Self::format_json(rows, columns),
        }
    }

    fn header(column: &ColumnConfig) -> String {
        match column.sorted {
            Some((SortDirection::Asc, priority)) => format!("{} ▲{}", column.title, priority + 1),
            Some((SortDirection::Desc, priority)) => format!("{} ▼{}", column.title, priority + 1),
            None => column.title.clone(),
        }
    }

    fn format_table(rows: &[Row], columns: &[ColumnConfig]) -> String {
        if rows.is_empty() {
            return format!("{}\n", "No rows".yellow());
        }

        let mut output = String::new();
        output.push_str(&format!("Rows: {}\n\n", rows.len()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        let header_cells: Vec<Cell> = columns
            .iter()
            .map(|column| {
                let cell = Cell::new(Self::header(column));
                if column.sorted.is_some() {
                    cell.fg(Color::Cyan)
                } else {
                    cell.fg(Color::Green)
                }
            })
            .collect();
        table.set_header(header_cells);

        for row in rows {
            let values: Vec<String> = columns
                .iter()
                .map(|column| match row.get(column.index) {
                    Some(TableCell::Null) | None => "NULL".to_string(),
                    Some(cell) => cell.to_string(),
                })
                .collect();
            table.add_row(values);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_json(rows: &[Row], columns: &[ColumnConfig]) -> String {
        let json = serde_json::json!({
            "columns": columns,
            "rows": rows,
        });
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize rows to JSON\"}".to_string()
        })
    }
}

/// Formats query payloads
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format(value: &Value, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(value),
            OutputFormat::Json => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Arrays of objects become one row per element; anything else a
    /// key/value listing
    fn format_table(value: &Value) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        match value {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                let mut keys: Vec<&String> = Vec::new();
                for item in items.iter().filter_map(Value::as_object) {
                    for key in item.keys() {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }
                table.set_header(keys.iter().map(|k| Cell::new(k).fg(Color::Green)));
                for item in items {
                    table.add_row(keys.iter().map(|k| Self::value_to_string(&item[k.as_str()])));
                }
            }
            Value::Object(map) => {
                table.set_header(vec![
                    Cell::new("key").fg(Color::Green),
                    Cell::new("value").fg(Color::Green),
                ]);
                for (key, item) in map {
                    table.add_row(vec![key.clone(), Self::value_to_string(item)]);
                }
            }
            other => return Self::value_to_string(other),
        }

        table.to_string()
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
