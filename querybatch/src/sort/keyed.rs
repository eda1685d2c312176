// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Keyed sort for large tables
//!
//! Sort keys are extracted once into one typed array per sorted column, then
//! row indices are sorted in parallel against those arrays. Orderings match
//! the comparator path exactly because both end in the same key comparators.

use rayon::prelude::*;
use std::borrow::Cow;
use std::cmp::Ordering;

use super::cell::{cell_at, Row};
use super::compare::{compare_bool_keys, compare_numeric_keys, compare_text_keys, NumericKey};
use super::{ColumnType, SortDirection, SortKey, SortOptions};

enum KeyColumn<'a> {
    Number(Vec<NumericKey>),
    Text(Vec<Option<Cow<'a, str>>>),
    Bool(Vec<Option<bool>>),
}

struct ExtractedKey<'a> {
    direction: SortDirection,
    column: KeyColumn<'a>,
}

impl<'a> ExtractedKey<'a> {
    fn extract(data: &'a [Row], key: &SortKey, options: &SortOptions) -> Option<Self> {
        let index = key.data_index;
        let column = match key.column_type {
            ColumnType::Number => KeyColumn::Number(
                data.iter()
                    .map(|row| NumericKey::of(cell_at(row, index)))
                    .collect(),
            ),
            ColumnType::String => KeyColumn::Text(
                data.iter()
                    .map(|row| {
                        cell_at(row, index)
                            .text_key()
                            .map(|k| options.collation.normalize(k))
                    })
                    .collect(),
            ),
            ColumnType::Boolean => {
                KeyColumn::Bool(data.iter().map(|row| cell_at(row, index).truthy()).collect())
            }
            ColumnType::Mixed => return None,
        };
        Some(Self {
            direction: key.direction,
            column,
        })
    }

    fn compare(&self, a: usize, b: usize, options: &SortOptions) -> Ordering {
        match &self.column {
            KeyColumn::Number(keys) => compare_numeric_keys(keys[a], keys[b], self.direction),
            KeyColumn::Text(keys) => compare_text_keys(
                keys[a].as_deref(),
                keys[b].as_deref(),
                self.direction,
                options,
            ),
            KeyColumn::Bool(keys) => {
                compare_bool_keys(keys[a], keys[b], self.direction, options.nulls)
            }
        }
    }
}

/// Whether every key can be pre-extracted into a typed array
pub(crate) fn supports(keys: &[SortKey]) -> bool {
    keys.iter().all(|k| k.column_type != ColumnType::Mixed)
}

/// Sorted permutation of `data` under `keys`
///
/// Returns `None` if any key is `Mixed`.
pub(crate) fn sorted_indices(
    data: &[Row],
    keys: &[SortKey],
    options: &SortOptions,
) -> Option<Vec<usize>> {
    let extracted = keys
        .iter()
        .map(|key| ExtractedKey::extract(data, key, options))
        .collect::<Option<Vec<_>>>()?;

    let mut indices: Vec<usize> = (0..data.len()).collect();
    // par_sort_by is stable
    indices.par_sort_by(|&a, &b| {
        extracted
            .iter()
            .map(|key| key.compare(a, b, options))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Some(indices)
}
