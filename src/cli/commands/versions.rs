//! Installed version commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::backend::Backend;
use crate::cli::Library;
use crate::cli::output::{OutputFormat, default_mark, print_formatted, print_success, table};
use crate::models::ListFilter;
use crate::workflow::LaunchInstancePayload;
use crate::workflow::resolver::{self, LaunchVersionRequest};

#[derive(Subcommand, Debug)]
pub enum VersionCommands {
    /// List installed versions (rescans install locations first)
    List,

    /// Launch a version
    Launch {
        /// Version id
        id: String,

        /// Extra command line arguments, saved for reuse
        #[arg(long, allow_hyphen_values = true)]
        args: Option<String>,

        /// Python script to run after startup
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Make a version the default
    Default {
        /// Version id
        id: String,
    },

    /// Delete a version's installation directory and forget it
    Uninstall {
        /// Version id
        id: String,
    },
}

pub async fn run(command: VersionCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    let library = Library::open()?;
    let backend = library.backend;

    match command {
        VersionCommands::List => {
            backend.reconcile_versions().await?;
            let versions = backend.list_versions(ListFilter::all()).await?;
            print_formatted(&versions, format, |versions| {
                table(
                    &["", "ID", "VERSION", "VARIANT", "PATH"],
                    versions
                        .iter()
                        .map(|v| {
                            vec![
                                default_mark(v.is_default),
                                v.id.clone(),
                                v.version.clone(),
                                v.variant_type.clone(),
                                v.installation_directory_path.clone(),
                            ]
                        })
                        .collect(),
                )
            });
        }
        VersionCommands::Launch { id, args, script } => {
            let script_id = match script {
                Some(path) => Some(backend.insert_reusable_script(&path).await?.id),
                None => None,
            };
            resolver::resolve_launch_version(
                backend,
                LaunchVersionRequest { version_id: id.clone() },
                LaunchInstancePayload {
                    script_id,
                    launch_args: args.unwrap_or_default(),
                },
            )
            .await?;
            print_success(&format!("Launched version {}", id), quiet);
        }
        VersionCommands::Default { id } => {
            backend.set_default_version(&id).await?;
            print_success(&format!("Version {} is now the default", id), quiet);
        }
        VersionCommands::Uninstall { id } => {
            backend.uninstall_version(&id).await?;
            print_success(&format!("Uninstalled version {}", id), quiet);
        }
    }

    Ok(())
}
