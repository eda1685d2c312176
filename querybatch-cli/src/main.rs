// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! querybatch CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // RUST_LOG can still raise it
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match cli.command {
        Commands::Version => {
            println!("{} {}", "querybatch".bold().green(), querybatch::VERSION);
            println!("Batched, cached queries and table sorting");
            Ok(())
        }

        Commands::Sort {
            input,
            columns,
            by,
            nulls,
            ignore_case,
            format,
        } => cli::handle_sort(input, columns, by, nulls, ignore_case, format),

        Commands::Fetch {
            config,
            endpoint,
            params,
            cache,
            single,
            format,
        } => cli::handle_fetch(config, endpoint, params, cache, single, format),
    }
}
