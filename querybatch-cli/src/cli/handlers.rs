// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command handlers

use colored::*;
use querybatch::sort::Collation;
use querybatch::{
    sort, BulkQueryClient, CacheDirective, ClientConfig, ColumnConfig, NullPlacement, QueryError,
    QueryParams, QueryValue, Row, SortDirective, SortOptions,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::commands::OutputFormat;
use super::output::{ResultFormatter, TableFormatter};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

/// Sort a table file and print it
pub fn handle_sort(
    input: PathBuf,
    columns: Option<PathBuf>,
    by: Vec<SortDirective>,
    nulls: NullPlacement,
    ignore_case: bool,
    format: OutputFormat,
) -> CliResult {
    let rows: Vec<Row> = read_json(&input)?;
    let columns: Vec<ColumnConfig> = match columns {
        Some(path) => read_json(&path)?,
        None => ColumnConfig::for_width(rows.iter().map(Vec::len).max().unwrap_or(0)),
    };

    let options = SortOptions {
        nulls,
        collation: if ignore_case {
            Collation::CaseInsensitive
        } else {
            Collation::Ordinal
        },
        ..SortOptions::default()
    };

    let (rows, columns) = match sort(&rows, &by, &columns, &options) {
        Some(outcome) => (outcome.data, outcome.columns),
        None => {
            log::info!("Input already in requested order");
            (rows, columns)
        }
    };

    println!("{}", TableFormatter::format(&rows, &columns, format));
    Ok(())
}

/// Group repeated keys into list values
fn build_params(pairs: Vec<(String, String)>) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in pairs {
        match params.remove(&key) {
            None => {
                params.insert(key, QueryValue::One(value));
            }
            Some(QueryValue::One(first)) => {
                params.insert(key, QueryValue::Many(vec![first, value]));
            }
            Some(QueryValue::Many(mut values)) => {
                values.push(value);
                params.insert(key, QueryValue::Many(values));
            }
        }
    }
    params
}

/// Run one query through the client and print the payload
pub fn handle_fetch(
    config: Option<PathBuf>,
    endpoint: String,
    params: Vec<(String, String)>,
    cache: Option<CacheDirective>,
    single: bool,
    format: OutputFormat,
) -> CliResult {
    let config = match config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let params = build_params(params);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_fetch(config, endpoint, params, cache, single, format))
}

async fn run_fetch(
    config: ClientConfig,
    endpoint: String,
    params: QueryParams,
    cache: Option<CacheDirective>,
    single: bool,
    format: OutputFormat,
) -> CliResult {
    let client = BulkQueryClient::builder(config).build()?;
    log::debug!("Fetching {} with {} params", endpoint, params.len());

    let outcome = if single {
        client.fetch_single(&endpoint, params, cache).await
    } else {
        client
            .fetch_bulk(&endpoint, params, cache, None)
            .await
            .and_then(|result| match result.error {
                Some(message) => Err(QueryError::Application(message)),
                None => Ok(result.data.unwrap_or(Value::Null)),
            })
    };
    log::info!("Client stats: {:?}", client.stats());

    match outcome {
        Ok(value) => {
            println!("{}", ResultFormatter::format(&value, format));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            Err(e.into())
        }
    }
}
