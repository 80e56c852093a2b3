//! Downloadable build commands

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::cli::Library;
use crate::cli::output::{OutputFormat, print_formatted, table};
use crate::models::ListFilter;
use crate::transfer::{HttpTransfer, OperationId, TransferProgress};
use crate::workflow::DownloadPathPayload;
use crate::workflow::resolver::{self, DownloadRequest};

#[derive(Subcommand, Debug)]
pub enum BuildCommands {
    /// List builds available for this platform
    List,

    /// Download and install a build from the list
    Install {
        /// Row number shown by `builds list`
        index: usize,

        /// Target directory (defaults to the default install location)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

pub async fn run(command: BuildCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    let library = Library::open()?;
    let backend = library.backend;

    match command {
        BuildCommands::List => {
            let builds = backend.list_downloadable_builds().await?;
            print_formatted(&builds, format, |builds| {
                table(
                    &["#", "VERSION", "RISK", "BRANCH", "FILE"],
                    builds
                        .iter()
                        .enumerate()
                        .map(|(i, b)| {
                            vec![
                                i.to_string(),
                                b.version.clone(),
                                b.risk_id.clone(),
                                b.branch.clone(),
                                b.file_name.clone(),
                            ]
                        })
                        .collect(),
                )
            });
        }
        BuildCommands::Install { index, dir } => {
            let builds = backend.list_downloadable_builds().await?;
            let Some(build) = builds.into_iter().nth(index) else {
                bail!("No build at index {} (see `blendio builds list`)", index);
            };

            let directory = match dir {
                Some(dir) => dir.to_string_lossy().to_string(),
                None => backend
                    .list_install_locations(ListFilter::all())
                    .await?
                    .into_iter()
                    .find(|l| l.is_default)
                    .map(|l| l.repo_directory_path)
                    .context("No default install location; pass --dir or add one with `blendio locations add`")?,
            };

            let transfer = Arc::new(HttpTransfer::new(library.config.downloads.progress_interval_ms)?);
            let (progress_tx, progress_rx) = mpsc::unbounded_channel();
            let printer = (!quiet).then(|| tokio::spawn(print_progress(progress_rx)));

            let installed = resolver::resolve_download(
                backend,
                transfer,
                DownloadRequest {
                    build,
                    operation: OperationId::next(),
                },
                DownloadPathPayload { path: directory },
                progress_tx,
                library.config.downloads.verify_checksums,
            )
            .await;

            if let Some(printer) = printer {
                let _ = printer.await;
                eprintln!();
            }
            let installed = installed?;
            print_formatted(&installed, format, |v| {
                format!("Installed Blender {} at {}", v.display_name(), v.installation_directory_path)
            });
        }
    }

    Ok(())
}

/// Draw a one-line progress indicator on stderr until the sender is dropped
async fn print_progress(mut progress: mpsc::UnboundedReceiver<TransferProgress>) {
    while let Some(p) = progress.recv().await {
        eprint!(
            "\rDownloading... {:>3}%  ({} / {} bytes)",
            p.percent(),
            p.sent,
            p.total
        );
        let _ = std::io::stderr().flush();
    }
}
