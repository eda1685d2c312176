// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Column type detection

use super::cell::{cell_at, CellKind, Row};
use super::ColumnType;

/// Rows inspected when detecting a column type
pub const DETECTION_SAMPLE_ROWS: usize = 100;

/// Detect the type of the column at `index` from the leading rows
///
/// A single kind across every non-null sample wins; anything else, including
/// an all-null sample, is `Mixed`.
pub fn detect_column_type(data: &[Row], index: usize) -> ColumnType {
    let mut seen: Option<CellKind> = None;

    for row in data.iter().take(DETECTION_SAMPLE_ROWS) {
        let Some(kind) = cell_at(row, index).kind() else {
            continue;
        };
        match seen {
            None => seen = Some(kind),
            Some(previous) if previous == kind => {}
            Some(_) => return ColumnType::Mixed,
        }
    }

    match seen {
        Some(CellKind::Number) => ColumnType::Number,
        Some(CellKind::Text) => ColumnType::String,
        Some(CellKind::Bool) => ColumnType::Boolean,
        Some(CellKind::Other) | None => ColumnType::Mixed,
    }
}
