//! Project file commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::backend::Backend;
use crate::cli::Library;
use crate::cli::output::{OutputFormat, print_formatted, print_success, table};
use crate::models::ListFilter;
use crate::workflow::resolver::{self, CreateProjectFileRequest, OpenProjectFileRequest};
use crate::workflow::{CreateProjectFilePayload, OpenProjectFilePayload};

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// List project files (rescans project directories first)
    List,

    /// Open a project file with a version
    Open {
        /// Project file id
        id: String,

        /// Version id to open it with
        #[arg(long)]
        version: String,

        /// Extra command line arguments, saved for reuse
        #[arg(long, allow_hyphen_values = true)]
        args: Option<String>,

        /// Python script to run after startup
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Create an empty .blend file with a version
    Create {
        /// File name; ".blend" is appended when missing
        name: String,

        /// Version id used to write the file
        #[arg(long)]
        version: String,
    },

    /// Zip a project file next to the original
    Archive {
        /// Project file id
        id: String,
    },
}

pub async fn run(command: FileCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    let library = Library::open()?;
    let backend = library.backend;

    match command {
        FileCommands::List => {
            backend.reconcile_project_files().await?;
            let files = backend.list_project_files(ListFilter::all()).await?;
            print_formatted(&files, format, |files| {
                table(
                    &["ID", "NAME", "PATH"],
                    files
                        .iter()
                        .map(|f| vec![f.id.clone(), f.file_name.clone(), f.file_path.clone()])
                        .collect(),
                )
            });
        }
        FileCommands::Open {
            id,
            version,
            args,
            script,
        } => {
            let script_id = match script {
                Some(path) => Some(backend.insert_reusable_script(&path).await?.id),
                None => None,
            };
            resolver::resolve_open_project_file(
                backend,
                OpenProjectFileRequest {
                    project_file_id: id.clone(),
                },
                OpenProjectFilePayload {
                    version_id: version,
                    script_id,
                    launch_args: args.unwrap_or_default(),
                },
            )
            .await?;
            print_success(&format!("Opened project file {}", id), quiet);
        }
        FileCommands::Create { name, version } => {
            let file = resolver::resolve_create_project_file(
                backend,
                CreateProjectFileRequest,
                CreateProjectFilePayload {
                    file_name: name,
                    version_id: version,
                },
            )
            .await?;
            print_formatted(&file, format, |f| format!("Created {}", f.file_path));
        }
        FileCommands::Archive { id } => {
            let path = backend.archive_project_file(&id).await?;
            print_success(&format!("Archived to {}", path), quiet);
        }
    }

    Ok(())
}
