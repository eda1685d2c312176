// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Per-type comparators
//!
//! Each comparator is a total order and returns `Equal` only for ties, so the
//! stable sorts built on top of them are repeatable. The keyed path feeds
//! pre-extracted keys into the same `compare_*_keys` functions the cell
//! comparators use.

use std::cmp::Ordering;

use super::cell::{Cell, CellKind};
use super::{ColumnType, NullPlacement, SortDirection, SortOptions};

/// Numeric sort key: a class for the fixed tail plus the value itself
///
/// Finite numbers are class 0; then -inf, +inf, NaN, and everything that is
/// not a number. The class order never flips with direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumericKey {
    class: u8,
    value: f64,
}

impl NumericKey {
    pub fn of(cell: &Cell) -> Self {
        let (class, value) = match cell {
            Cell::Number(n) if n.is_finite() => (0, *n),
            Cell::Number(n) if *n == f64::NEG_INFINITY => (1, 0.0),
            Cell::Number(n) if *n == f64::INFINITY => (2, 0.0),
            Cell::Number(_) => (3, 0.0),
            _ => (4, 0.0),
        };
        Self { class, value }
    }
}

pub(crate) fn compare_numeric_keys(
    a: NumericKey,
    b: NumericKey,
    direction: SortDirection,
) -> Ordering {
    match a.class.cmp(&b.class) {
        Ordering::Equal if a.class == 0 => {
            direction.apply(a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        }
        other => other,
    }
}

/// Place `None` per `nulls`, compare the rest with `cmp` in `direction`
pub(crate) fn compare_nullable<T>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
    nulls: NullPlacement,
    cmp: impl FnOnce(T, T) -> Ordering,
) -> Ordering {
    let nulls_first = nulls.nulls_first(direction);
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) if nulls_first => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) if nulls_first => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => direction.apply(cmp(a, b)),
    }
}

pub(crate) fn compare_text_keys(
    a: Option<&str>,
    b: Option<&str>,
    direction: SortDirection,
    options: &SortOptions,
) -> Ordering {
    compare_nullable(a, b, direction, options.nulls, |a, b| {
        options.collation.compare_keys(a, b)
    })
}

pub(crate) fn compare_bool_keys(
    a: Option<bool>,
    b: Option<bool>,
    direction: SortDirection,
    nulls: NullPlacement,
) -> Ordering {
    compare_nullable(a, b, direction, nulls, |a, b| a.cmp(&b))
}

pub fn compare_numbers(a: &Cell, b: &Cell, direction: SortDirection) -> Ordering {
    compare_numeric_keys(NumericKey::of(a), NumericKey::of(b), direction)
}

pub fn compare_strings(
    a: &Cell,
    b: &Cell,
    direction: SortDirection,
    options: &SortOptions,
) -> Ordering {
    let a = a.text_key().map(|k| options.collation.normalize(k));
    let b = b.text_key().map(|k| options.collation.normalize(k));
    compare_text_keys(a.as_deref(), b.as_deref(), direction, options)
}

pub fn compare_booleans(
    a: &Cell,
    b: &Cell,
    direction: SortDirection,
    nulls: NullPlacement,
) -> Ordering {
    compare_bool_keys(a.truthy(), b.truthy(), direction, nulls)
}

/// Heterogeneous values: number < string < boolean < other, reversed when
/// descending; same-kind values use their own comparator
pub fn compare_mixed(
    a: &Cell,
    b: &Cell,
    direction: SortDirection,
    options: &SortOptions,
) -> Ordering {
    let (kind_a, kind_b) = match (a.kind(), b.kind()) {
        (Some(ka), Some(kb)) => (ka, kb),
        (ka, kb) => return compare_nullable(ka, kb, direction, options.nulls, |_, _| Ordering::Equal),
    };

    if kind_a != kind_b {
        return direction.apply(kind_a.cmp(&kind_b));
    }

    match kind_a {
        CellKind::Number => compare_numbers(a, b, direction),
        CellKind::Text => compare_strings(a, b, direction, options),
        CellKind::Bool => compare_booleans(a, b, direction, options.nulls),
        CellKind::Other => direction.apply(a.to_string().cmp(&b.to_string())),
    }
}

/// Compare two cells as values of `column_type`
pub fn compare_cells(
    a: &Cell,
    b: &Cell,
    column_type: ColumnType,
    direction: SortDirection,
    options: &SortOptions,
) -> Ordering {
    match column_type {
        ColumnType::Number => compare_numbers(a, b, direction),
        ColumnType::String => compare_strings(a, b, direction, options),
        ColumnType::Boolean => compare_booleans(a, b, direction, options.nulls),
        ColumnType::Mixed => compare_mixed(a, b, direction, options),
    }
}
