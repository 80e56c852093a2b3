//! CLI module for Blendio
//!
//! Every GUI workflow is reachable from the command line; running with no
//! subcommand starts the GUI instead.

mod commands;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::backend::LocalBackend;
use crate::config::Config;

pub use output::OutputFormat;

/// Blendio - Blender version and project launcher
#[derive(Parser, Debug)]
#[command(name = "blendio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub output: OutputOptions,

    /// Run a command instead of starting the GUI
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output formatting options
#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// Output in JSON format (for machine parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl OutputOptions {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Installed Blender versions
    Versions {
        #[command(subcommand)]
        command: commands::versions::VersionCommands,
    },

    /// Project files
    Files {
        #[command(subcommand)]
        command: commands::files::FileCommands,
    },

    /// Downloadable builds
    Builds {
        #[command(subcommand)]
        command: commands::builds::BuildCommands,
    },

    /// Install locations
    Locations {
        #[command(subcommand)]
        command: commands::locations::LocationCommands,
    },

    /// Diagnostics and debugging
    Diag {
        #[command(subcommand)]
        command: commands::diag::DiagCommands,
    },
}

/// Config and backend shared by every command
pub(crate) struct Library {
    pub config: Config,
    pub backend: Arc<LocalBackend>,
}

impl Library {
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let backend = Arc::new(LocalBackend::open(&config)?);
        Ok(Self { config, backend })
    }
}

/// Run one subcommand
pub async fn run(command: Commands, options: OutputOptions) -> Result<()> {
    let format = options.format();
    let quiet = options.quiet;

    match command {
        Commands::Versions { command } => commands::versions::run(command, format, quiet).await,
        Commands::Files { command } => commands::files::run(command, format, quiet).await,
        Commands::Builds { command } => commands::builds::run(command, format, quiet).await,
        Commands::Locations { command } => commands::locations::run(command, format, quiet).await,
        Commands::Diag { command } => commands::diag::run(command, format, quiet).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["blendio"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_versions_launch_with_args() {
        let cli = Cli::try_parse_from([
            "blendio",
            "--json",
            "versions",
            "launch",
            "abc",
            "--args",
            "--factory-startup",
        ])
        .unwrap();
        assert!(cli.output.json);
        assert!(matches!(
            cli.command,
            Some(Commands::Versions {
                command: commands::versions::VersionCommands::Launch { ref id, ref args, .. }
            }) if id == "abc" && args.as_deref() == Some("--factory-startup")
        ));
    }

    #[test]
    fn test_parse_builds_install_with_dir() {
        let cli =
            Cli::try_parse_from(["blendio", "builds", "install", "2", "--dir", "/opt/blender"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Builds {
                command: commands::builds::BuildCommands::Install { index: 2, ref dir }
            }) if dir.as_deref() == Some(std::path::Path::new("/opt/blender"))
        ));
    }
}
