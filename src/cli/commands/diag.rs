//! Diagnostic and debugging commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::backend::Backend;
use crate::cli::Library;
use crate::cli::output::{OutputFormat, print_formatted};
use crate::config::Config;
use crate::db::Database;

#[derive(Subcommand, Debug)]
pub enum DiagCommands {
    /// Check whether the build listing is reachable
    Probe,

    /// Show config and database locations
    Paths,
}

#[derive(Serialize)]
struct ProbeResult {
    builds_url: String,
    online: bool,
}

#[derive(Serialize)]
struct PathsResult {
    config_file: String,
    database: String,
}

pub async fn run(command: DiagCommands, format: OutputFormat, _quiet: bool) -> Result<()> {
    match command {
        DiagCommands::Probe => probe(format).await,
        DiagCommands::Paths => paths(format),
    }
}

async fn probe(format: OutputFormat) -> Result<()> {
    let library = Library::open()?;
    let online = library.backend.probe_connectivity().await?;

    let result = ProbeResult {
        builds_url: library.config.downloads.builds_url.clone(),
        online,
    };
    print_formatted(&result, format, |r| {
        let status = if r.online { "[OK]" } else { "[  ]" };
        format!("{} {}", status, r.builds_url)
    });
    Ok(())
}

fn paths(format: OutputFormat) -> Result<()> {
    let display = |path: Result<std::path::PathBuf>| {
        path.map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| "<error>".to_string())
    };
    let result = PathsResult {
        config_file: display(Config::config_path()),
        database: display(Database::db_path()),
    };

    print_formatted(&result, format, |r| {
        [
            format!("Config file:  {}", r.config_file),
            format!("Database:     {}", r.database),
        ]
        .join("\n")
    });
    Ok(())
}
