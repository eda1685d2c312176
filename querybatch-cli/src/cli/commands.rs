// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use querybatch::{CacheDirective, CacheType, NullPlacement, SortDirective};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "querybatch", version, about = "Batched queries and table sorting")]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,

    /// Sort a JSON table (array of row arrays)
    Sort {
        /// Rows file
        #[arg(short, long)]
        input: PathBuf,

        /// Column metadata file; one column per row position if omitted
        #[arg(short, long)]
        columns: Option<PathBuf>,

        /// Sort directive as COLUMN[:asc|desc], repeatable, highest priority first
        #[arg(short, long = "by", value_parser = parse_directive, required = true)]
        by: Vec<SortDirective>,

        /// Null placement
        #[arg(long, default_value = "auto", value_parser = parse_nulls)]
        nulls: NullPlacement,

        /// Compare strings case-insensitively
        #[arg(long)]
        ignore_case: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run one query through the batching client
    Fetch {
        /// Client configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Endpoint name
        #[arg(short, long)]
        endpoint: String,

        /// Query parameter as KEY=VALUE, repeatable; repeated keys form a list
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Cache as TYPE[:TTL_MS], or "default" for the client defaults
        #[arg(long, value_parser = parse_cache)]
        cache: Option<CacheDirective>,

        /// Skip the batching window
        #[arg(long)]
        single: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

fn parse_directive(s: &str) -> Result<SortDirective, String> {
    s.parse()
}

fn parse_nulls(s: &str) -> Result<NullPlacement, String> {
    s.parse()
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_cache(s: &str) -> Result<CacheDirective, String> {
    if s.eq_ignore_ascii_case("default") {
        return Ok(CacheDirective::defaults());
    }

    let (cache_type, ttl) = match s.split_once(':') {
        Some((cache_type, ttl)) => (cache_type, Some(ttl)),
        None => (s, None),
    };
    let cache_type: CacheType = cache_type.parse()?;
    let ttl_ms = ttl
        .map(|ttl| {
            ttl.parse::<i64>()
                .map_err(|_| format!("Invalid TTL: {}", ttl))
        })
        .transpose()?;

    Ok(CacheDirective {
        cache_type: Some(cache_type),
        ttl_ms,
        key: None,
    })
}
