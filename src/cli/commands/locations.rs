//! Install location commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::backend::Backend;
use crate::cli::Library;
use crate::cli::output::{OutputFormat, default_mark, print_formatted, print_success, table};
use crate::models::ListFilter;

#[derive(Subcommand, Debug)]
pub enum LocationCommands {
    /// List install locations
    List,

    /// Add a folder to scan for installations and download into
    Add {
        path: PathBuf,
    },

    /// Make a location the default download target
    Default {
        /// Location id
        id: String,
    },

    /// Forget a location (files are left in place)
    Remove {
        /// Location id
        id: String,
    },
}

pub async fn run(command: LocationCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    let library = Library::open()?;
    let backend = library.backend;

    match command {
        LocationCommands::List => {
            let locations = backend.list_install_locations(ListFilter::all()).await?;
            print_formatted(&locations, format, |locations| {
                table(
                    &["", "ID", "PATH"],
                    locations
                        .iter()
                        .map(|l| {
                            vec![
                                default_mark(l.is_default),
                                l.id.clone(),
                                l.repo_directory_path.clone(),
                            ]
                        })
                        .collect(),
                )
            });
        }
        LocationCommands::Add { path } => {
            let location = backend.insert_install_location(&path).await?;
            print_formatted(&location, format, |l| {
                format!("Added install location {} ({})", l.repo_directory_path, l.id)
            });
        }
        LocationCommands::Default { id } => {
            backend.set_default_install_location(&id).await?;
            print_success(&format!("Location {} is now the default", id), quiet);
        }
        LocationCommands::Remove { id } => {
            backend.delete_install_location(&id).await?;
            print_success(&format!("Removed location {}", id), quiet);
        }
    }

    Ok(())
}
