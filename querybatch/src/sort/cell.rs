// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Table cell values

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One table cell
///
/// Deserializes from any JSON value: `null`, booleans, numbers and strings
/// map to their own variants, arrays and objects land in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// A table row; columns address cells by position
pub type Row = Vec<Cell>;

pub(crate) static NULL_CELL: Cell = Cell::Null;

/// Cell at `index`, treating a short row as null-padded
pub(crate) fn cell_at(row: &Row, index: usize) -> &Cell {
    row.get(index).unwrap_or(&NULL_CELL)
}

/// Broad value kind, used for type detection and mixed-column precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum CellKind {
    Number,
    Text,
    Bool,
    Other,
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null | Cell::Other(serde_json::Value::Null))
    }

    pub(crate) fn kind(&self) -> Option<CellKind> {
        match self {
            _ if self.is_null() => None,
            Cell::Number(_) => Some(CellKind::Number),
            Cell::Text(_) => Some(CellKind::Text),
            Cell::Bool(_) => Some(CellKind::Bool),
            _ => Some(CellKind::Other),
        }
    }

    /// String form for text comparison; `None` for null
    pub(crate) fn text_key(&self) -> Option<Cow<'_, str>> {
        match self {
            _ if self.is_null() => None,
            Cell::Text(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// Truthiness for boolean comparison; `None` for null
    pub(crate) fn truthy(&self) -> Option<bool> {
        match self {
            _ if self.is_null() => None,
            Cell::Bool(b) => Some(*b),
            Cell::Number(n) => Some(*n != 0.0 && !n.is_nan()),
            Cell::Text(s) => Some(!s.is_empty()),
            Cell::Other(_) => Some(true),
            Cell::Null => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Number(n) if n.is_nan() => write!(f, "NaN"),
            Cell::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}
