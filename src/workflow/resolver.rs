//! Workflow resolvers.
//!
//! A resolver runs when a completion arrives for a workflow its view started:
//! it consumes the pending context, persists any new launch argument, then
//! performs the backend action proper. Views wrap each resolver in
//! [`then_refresh`](super::store::then_refresh) so the list is reloaded on
//! every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::Backend;
use crate::models::{DownloadableBuild, InstalledVersion, ProjectFile};
use crate::transfer::{self, OperationId, ProgressSink, Transfer};

use super::error::WorkflowError;
use super::slot::PendingSlot;
use super::topic::{
    CreateProjectFilePayload, DownloadPathPayload, LaunchInstancePayload, OpenProjectFilePayload,
    WorkflowTopic,
};

/// Pending context of the create-project-file workflow. Carries nothing;
/// its presence alone proves a view asked for the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectFileRequest;

/// Pending context of the open-project-file workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenProjectFileRequest {
    pub project_file_id: String,
}

/// Pending context of the launch-version workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchVersionRequest {
    pub version_id: String,
}

/// Pending context of the download workflow
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub build: DownloadableBuild,
    pub operation: OperationId,
}

/// Step 1 of every resolver: match the completion to the waiting context.
pub fn correlate<T>(slot: &mut PendingSlot<T>, topic: WorkflowTopic) -> Result<T, WorkflowError> {
    slot.take_and_clear().ok_or_else(|| {
        tracing::warn!("{} arrived with nothing pending; dropped", topic);
        WorkflowError::CorrelationMiss { topic }
    })
}

/// Persist free-text launch arguments as a reusable record.
///
/// Blank text (after trimming) never reaches the backend.
pub async fn persist_launch_argument(
    backend: &dyn Backend,
    launch_args: &str,
    project_file_id: Option<&str>,
    script_id: Option<&str>,
) -> Result<Option<String>, WorkflowError> {
    let text = launch_args.trim();
    if text.is_empty() {
        return Ok(None);
    }

    backend
        .insert_launch_argument(text, project_file_id, script_id)
        .await
        .map(Some)
        .map_err(|e| WorkflowError::backend("save launch arguments", e))
}

pub async fn resolve_create_project_file(
    backend: Arc<dyn Backend>,
    _request: CreateProjectFileRequest,
    payload: CreateProjectFilePayload,
) -> Result<ProjectFile, WorkflowError> {
    let file = backend
        .create_project_file(&payload.version_id, &payload.file_name)
        .await
        .map_err(|e| WorkflowError::backend("create project file", e))?;

    tracing::info!("Created project file {}", file.file_path);
    Ok(file)
}

pub async fn resolve_open_project_file(
    backend: Arc<dyn Backend>,
    request: OpenProjectFileRequest,
    payload: OpenProjectFilePayload,
) -> Result<(), WorkflowError> {
    let script_id = payload.script_id.as_deref();
    let launch_argument_id = persist_launch_argument(
        backend.as_ref(),
        &payload.launch_args,
        Some(&request.project_file_id),
        script_id,
    )
    .await?;

    backend
        .open_project_file(
            &request.project_file_id,
            &payload.version_id,
            script_id,
            launch_argument_id.as_deref(),
        )
        .await
        .map_err(|e| WorkflowError::backend("open project file", e))?;

    tracing::info!(
        "Opened project file {} with version {}",
        request.project_file_id,
        payload.version_id
    );
    Ok(())
}

pub async fn resolve_launch_version(
    backend: Arc<dyn Backend>,
    request: LaunchVersionRequest,
    payload: LaunchInstancePayload,
) -> Result<(), WorkflowError> {
    let script_id = payload.script_id.as_deref();
    let launch_argument_id =
        persist_launch_argument(backend.as_ref(), &payload.launch_args, None, script_id).await?;

    backend
        .launch_version(&request.version_id, launch_argument_id.as_deref(), script_id)
        .await
        .map_err(|e| WorkflowError::backend("launch version", e))?;

    tracing::info!("Launched version {}", request.version_id);
    Ok(())
}

/// Local destination of a build downloaded into `directory`
pub fn download_destination(directory: &str, build: &DownloadableBuild) -> PathBuf {
    Path::new(directory).join(&build.file_name)
}

/// Transfer the build into the chosen directory, then install it.
/// The install step never runs if the transfer or its checksum fails, and
/// nothing is transferred for an archive type that cannot be installed.
pub async fn resolve_download(
    backend: Arc<dyn Backend>,
    transfer: Arc<dyn Transfer>,
    request: DownloadRequest,
    payload: DownloadPathPayload,
    progress: ProgressSink,
    verify_checksums: bool,
) -> Result<InstalledVersion, WorkflowError> {
    let build = request.build;
    if !build.is_installable() {
        return Err(WorkflowError::transfer(
            &build.file_name,
            anyhow::anyhow!(".{} archives cannot be installed", build.file_extension),
        ));
    }
    let destination = download_destination(&payload.path, &build);

    tracing::info!("Downloading {} to {:?}", build.file_name, destination);
    transfer
        .transfer(&build.url, &destination, request.operation, progress)
        .await
        .map_err(|e| WorkflowError::transfer(&build.file_name, e))?;

    if verify_checksums && !build.checksum.trim().is_empty() {
        if let Err(e) = transfer::verify_checksum(&destination, &build.checksum).await {
            let _ = tokio::fs::remove_file(&destination).await;
            return Err(WorkflowError::transfer(&build.file_name, e));
        }
    }

    let installed = backend
        .install_downloaded_build(&destination, &build)
        .await
        .map_err(|e| WorkflowError::backend("install build", e))?;

    tracing::info!("Installed {}", installed.display_name());
    Ok(installed)
}
