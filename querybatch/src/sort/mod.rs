// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Multi-key table sort
//!
//! `sort` takes rows, an ordered list of directives and the column metadata,
//! and returns a sorted copy plus updated metadata. The metadata records the
//! directives last applied, which lets a repeated sort return `None` and a
//! sort that extends the previous one re-order only the tied runs.
//!
//! Large tables whose sorted columns all have a simple type take a keyed path
//! that extracts typed key arrays and sorts row indices in parallel.

pub mod cell;
pub mod compare;
pub mod detect;
mod keyed;

pub use cell::{Cell, Row};
pub use compare::{compare_booleans, compare_cells, compare_mixed, compare_numbers, compare_strings};
pub use detect::{detect_column_type, DETECTION_SAMPLE_ROWS};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cell::cell_at;

/// Row count above which the keyed path is used
pub const DEFAULT_KEYED_THRESHOLD: usize = 5_000;

/// Tied runs up to this length are re-sorted by insertion
pub const DEFAULT_INSERTION_THRESHOLD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Orient an ascending comparison
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Sort by `columns[column]` in `direction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

/// Parses `"<column>"` or `"<column>:<asc|desc>"`
impl FromStr for SortDirective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.split_once(':') {
            Some((column, direction)) => (column, direction.parse()?),
            None => (s, SortDirection::Asc),
        };
        let column = column
            .trim()
            .parse()
            .map_err(|_| format!("Invalid column index: {}", column))?;
        Ok(Self { column, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Mixed,
}

/// Display and sort metadata for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub title: String,

    /// Position of this column's cell in each row
    pub index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,

    /// Declared type, or the type detected by the last sort
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,

    /// Direction and priority applied by the last sort
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorted: Option<(SortDirection, usize)>,
}

impl ColumnConfig {
    pub fn new(title: impl Into<String>, index: usize) -> Self {
        Self {
            title: title.into(),
            index,
            renderer: None,
            column_type: None,
            sorted: None,
        }
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }

    /// One column per position, titled by index
    pub fn for_width(width: usize) -> Vec<Self> {
        (0..width).map(|i| Self::new(i.to_string(), i)).collect()
    }
}

/// Where nulls go in string, boolean and mixed columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPlacement {
    First,
    Last,
    /// Last when ascending, first when descending
    #[default]
    Auto,
}

impl NullPlacement {
    pub fn nulls_first(self, direction: SortDirection) -> bool {
        match self {
            NullPlacement::First => true,
            NullPlacement::Last => false,
            NullPlacement::Auto => direction == SortDirection::Desc,
        }
    }
}

impl FromStr for NullPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(NullPlacement::First),
            "last" => Ok(NullPlacement::Last),
            "auto" => Ok(NullPlacement::Auto),
            _ => Err(format!("Invalid null placement: {}", s)),
        }
    }
}

pub type CollatorFn = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// How non-null strings compare
#[derive(Clone, Default)]
pub enum Collation {
    /// Byte order
    #[default]
    Ordinal,
    /// Lowercased byte order
    CaseInsensitive,
    /// Caller-supplied comparator; must be a total order
    Custom(CollatorFn),
}

impl Collation {
    /// Key form of `text` under this collation
    pub fn normalize<'a>(&self, text: Cow<'a, str>) -> Cow<'a, str> {
        match self {
            Collation::CaseInsensitive => Cow::Owned(text.to_lowercase()),
            _ => text,
        }
    }

    /// Compare two already-normalized keys
    pub fn compare_keys(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collation::Custom(cmp) => cmp(a, b),
            _ => a.cmp(b),
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let a = self.normalize(Cow::Borrowed(a));
        let b = self.normalize(Cow::Borrowed(b));
        self.compare_keys(&a, &b)
    }
}

impl fmt::Debug for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collation::Ordinal => write!(f, "Ordinal"),
            Collation::CaseInsensitive => write!(f, "CaseInsensitive"),
            Collation::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub nulls: NullPlacement,
    pub collation: Collation,
    pub keyed_threshold: usize,
    pub insertion_threshold: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            nulls: NullPlacement::Auto,
            collation: Collation::Ordinal,
            keyed_threshold: DEFAULT_KEYED_THRESHOLD,
            insertion_threshold: DEFAULT_INSERTION_THRESHOLD,
        }
    }
}

/// Sorted rows and the column metadata describing them
#[derive(Debug, Clone, PartialEq)]
pub struct SortOutcome {
    pub data: Vec<Row>,
    pub columns: Vec<ColumnConfig>,
}

/// A directive resolved against the column metadata
#[derive(Debug, Clone, Copy)]
pub(crate) struct SortKey {
    pub data_index: usize,
    pub column_type: ColumnType,
    pub direction: SortDirection,
}

fn compare_rows(a: &Row, b: &Row, keys: &[SortKey], options: &SortOptions) -> Ordering {
    keys.iter()
        .map(|key| {
            compare_cells(
                cell_at(a, key.data_index),
                cell_at(b, key.data_index),
                key.column_type,
                key.direction,
                options,
            )
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Directives recorded in the column metadata, in priority order
fn recorded_directives(columns: &[ColumnConfig]) -> Vec<SortDirective> {
    let mut recorded: Vec<(usize, SortDirective)> = columns
        .iter()
        .enumerate()
        .filter_map(|(column, config)| {
            config
                .sorted
                .map(|(direction, priority)| (priority, SortDirective { column, direction }))
        })
        .collect();
    recorded.sort_by_key(|(priority, _)| *priority);
    recorded.into_iter().map(|(_, directive)| directive).collect()
}

/// Drop directives naming unknown columns, and repeats of a column
fn usable_directives(directives: &[SortDirective], columns: &[ColumnConfig]) -> Vec<SortDirective> {
    let mut usable: Vec<SortDirective> = Vec::with_capacity(directives.len());
    for directive in directives {
        if directive.column >= columns.len() {
            log::debug!("Ignoring sort on unknown column {}", directive.column);
            continue;
        }
        if usable.iter().any(|d| d.column == directive.column) {
            continue;
        }
        usable.push(*directive);
    }
    usable
}

fn insertion_sort(rows: &mut [Row], keys: &[SortKey], options: &SortOptions) {
    for i in 1..rows.len() {
        let mut j = i;
        while j > 0 && compare_rows(&rows[j - 1], &rows[j], keys, options) == Ordering::Greater {
            rows.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Re-sort each run of rows tied on `prefix` by `rest`
fn resort_tied_runs(data: &mut [Row], prefix: &[SortKey], rest: &[SortKey], options: &SortOptions) {
    let mut start = 0;
    while start < data.len() {
        let mut end = start + 1;
        while end < data.len()
            && compare_rows(&data[start], &data[end], prefix, options) == Ordering::Equal
        {
            end += 1;
        }

        let run = &mut data[start..end];
        if run.len() > 1 {
            if run.len() <= options.insertion_threshold {
                insertion_sort(run, rest, options);
            } else {
                run.sort_by(|a, b| compare_rows(a, b, rest, options));
            }
        }
        start = end;
    }
}

fn full_sort(data: &[Row], keys: &[SortKey], options: &SortOptions) -> Vec<Row> {
    if data.len() > options.keyed_threshold && keyed::supports(keys) {
        if let Some(indices) = keyed::sorted_indices(data, keys, options) {
            log::debug!("Keyed sort of {} rows on {} keys", data.len(), keys.len());
            return indices.into_iter().map(|i| data[i].clone()).collect();
        }
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| compare_rows(a, b, keys, options));
    sorted
}

/// Sort `data` by `directives`
///
/// Returns `None` when there is nothing to do: no usable directive, at most
/// one row, or metadata showing the data is already sorted exactly this way.
/// Directives naming a column outside `columns` are ignored.
pub fn sort(
    data: &[Row],
    directives: &[SortDirective],
    columns: &[ColumnConfig],
    options: &SortOptions,
) -> Option<SortOutcome> {
    let directives = usable_directives(directives, columns);
    if directives.is_empty() || data.len() <= 1 {
        return None;
    }

    let recorded = recorded_directives(columns);
    if recorded == directives {
        return None;
    }
    let matched = recorded
        .iter()
        .zip(&directives)
        .take_while(|(r, d)| r == d)
        .count();

    let mut columns = columns.to_vec();
    let keys: Vec<SortKey> = directives
        .iter()
        .map(|directive| {
            let column = &mut columns[directive.column];
            let data_index = column.index;
            let column_type = *column
                .column_type
                .get_or_insert_with(|| detect_column_type(data, data_index));
            SortKey {
                data_index,
                column_type,
                direction: directive.direction,
            }
        })
        .collect();

    let data = if matched == directives.len() {
        // Already ordered by a longer sort; only the metadata shrinks
        data.to_vec()
    } else if matched > 0 {
        log::debug!(
            "Partial re-sort: {} of {} directives already applied",
            matched,
            directives.len()
        );
        let mut data = data.to_vec();
        resort_tied_runs(&mut data, &keys[..matched], &keys[matched..], options);
        data
    } else {
        full_sort(data, &keys, options)
    };

    for column in columns.iter_mut() {
        column.sorted = None;
    }
    for (priority, directive) in directives.iter().enumerate() {
        columns[directive.column].sorted = Some((directive.direction, priority));
    }

    Some(SortOutcome { data, columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: Vec<Vec<Cell>>) -> Vec<Row> {
        values
    }

    fn first_column(data: &[Row]) -> Vec<String> {
        data.iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn test_nothing_to_do() {
        let columns = ColumnConfig::for_width(1);
        let data = rows(vec![vec![Cell::from(2i64)], vec![Cell::from(1i64)]]);
        let options = SortOptions::default();

        assert!(sort(&data, &[], &columns, &options).is_none());
        assert!(sort(&data[..1], &[SortDirective::asc(0)], &columns, &options).is_none());
        // Unknown column only
        assert!(sort(&data, &[SortDirective::asc(7)], &columns, &options).is_none());
    }

    #[test]
    fn test_perfect_match_short_circuits() {
        let columns = ColumnConfig::for_width(1);
        let data = rows(vec![vec![Cell::from(2i64)], vec![Cell::from(1i64)]]);
        let options = SortOptions::default();
        let directives = [SortDirective::asc(0)];

        let first = sort(&data, &directives, &columns, &options).unwrap();
        assert_eq!(first_column(&first.data), ["1", "2"]);
        assert_eq!(first.columns[0].sorted, Some((SortDirection::Asc, 0)));
        assert_eq!(first.columns[0].column_type, Some(ColumnType::Number));

        assert!(sort(&first.data, &directives, &first.columns, &options).is_none());
    }

    #[test]
    fn test_metadata_is_reassigned() {
        let mut columns = ColumnConfig::for_width(3);
        columns[2].sorted = Some((SortDirection::Desc, 0));
        let data = rows(vec![
            vec![Cell::from(1i64), Cell::from("b"), Cell::Null],
            vec![Cell::from(1i64), Cell::from("a"), Cell::Null],
        ]);

        let out = sort(
            &data,
            &[SortDirective::asc(0), SortDirective::desc(1), SortDirective::asc(9)],
            &columns,
            &SortOptions::default(),
        )
        .unwrap();

        assert_eq!(out.columns[0].sorted, Some((SortDirection::Asc, 0)));
        assert_eq!(out.columns[1].sorted, Some((SortDirection::Desc, 1)));
        assert_eq!(out.columns[2].sorted, None);
        assert_eq!(out.data[0][1], Cell::from("b"));
    }

    #[test]
    fn test_partial_resort_orders_tied_runs_only() {
        let columns = ColumnConfig::for_width(2);
        let data = rows(vec![
            vec![Cell::from("x"), Cell::from(3i64)],
            vec![Cell::from("y"), Cell::from(9i64)],
            vec![Cell::from("x"), Cell::from(1i64)],
            vec![Cell::from("y"), Cell::from(2i64)],
        ]);
        let options = SortOptions::default();

        let by_group = sort(&data, &[SortDirective::asc(0)], &columns, &options).unwrap();
        let refined = sort(
            &by_group.data,
            &[SortDirective::asc(0), SortDirective::asc(1)],
            &by_group.columns,
            &options,
        )
        .unwrap();

        let pairs: Vec<String> = refined
            .data
            .iter()
            .map(|r| format!("{}{}", r[0], r[1]))
            .collect();
        assert_eq!(pairs, ["x1", "x3", "y2", "y9"]);
        assert_eq!(refined.columns[1].sorted, Some((SortDirection::Asc, 1)));
    }

    #[test]
    fn test_prefix_of_previous_sort_keeps_order() {
        let columns = ColumnConfig::for_width(2);
        let data = rows(vec![
            vec![Cell::from(1i64), Cell::from(2i64)],
            vec![Cell::from(1i64), Cell::from(1i64)],
        ]);
        let options = SortOptions::default();

        let both = sort(
            &data,
            &[SortDirective::asc(0), SortDirective::asc(1)],
            &columns,
            &options,
        )
        .unwrap();
        let prefix = sort(&both.data, &[SortDirective::asc(0)], &both.columns, &options).unwrap();
        assert_eq!(prefix.data, both.data);
        assert_eq!(prefix.columns[1].sorted, None);
    }

    #[test]
    fn test_declared_type_is_kept() {
        let columns = vec![ColumnConfig::new("n", 0).with_type(ColumnType::String)];
        let data = rows(vec![vec![Cell::from(10i64)], vec![Cell::from(9i64)]]);
        let out = sort(&data, &[SortDirective::asc(0)], &columns, &SortOptions::default()).unwrap();
        // "10" < "9" as text
        assert_eq!(first_column(&out.data), ["10", "9"]);
        assert_eq!(out.columns[0].column_type, Some(ColumnType::String));
    }

    #[test]
    fn test_directive_parsing() {
        assert_eq!("2:desc".parse::<SortDirective>(), Ok(SortDirective::desc(2)));
        assert_eq!("0".parse::<SortDirective>(), Ok(SortDirective::asc(0)));
        assert!("x:asc".parse::<SortDirective>().is_err());
        assert!("1:sideways".parse::<SortDirective>().is_err());
    }

    #[test]
    fn test_column_config_json() {
        let columns: Vec<ColumnConfig> = serde_json::from_str(
            r#"[{"title": "Name", "index": 1, "type": "string", "sorted": ["desc", 0]}]"#,
        )
        .unwrap();
        assert_eq!(columns[0].column_type, Some(ColumnType::String));
        assert_eq!(columns[0].sorted, Some((SortDirection::Desc, 0)));
    }
}
