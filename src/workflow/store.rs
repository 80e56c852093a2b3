//! View state store: the cached list behind a table, and the
//! refresh-after-every-mutation policy.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::backend::Backend;
use crate::models::{DownloadableBuild, InstallLocation, InstalledVersion, ListFilter, ProjectFile};

use super::error::WorkflowError;

/// Where a view's list comes from: a reconcile call (if any) followed by a
/// list call.
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn name() -> &'static str;

    fn fetch(backend: Arc<dyn Backend>) -> BoxFuture<'static, Result<Vec<Self::Item>>>;
}

pub struct VersionList;

impl ListSource for VersionList {
    type Item = InstalledVersion;

    fn name() -> &'static str {
        "installed versions"
    }

    fn fetch(backend: Arc<dyn Backend>) -> BoxFuture<'static, Result<Vec<InstalledVersion>>> {
        async move {
            backend.reconcile_versions().await?;
            backend.list_versions(ListFilter::all()).await
        }
        .boxed()
    }
}

pub struct ProjectFileList;

impl ListSource for ProjectFileList {
    type Item = ProjectFile;

    fn name() -> &'static str {
        "project files"
    }

    fn fetch(backend: Arc<dyn Backend>) -> BoxFuture<'static, Result<Vec<ProjectFile>>> {
        async move {
            backend.reconcile_project_files().await?;
            backend.list_project_files(ListFilter::all()).await
        }
        .boxed()
    }
}

pub struct BuildList;

impl ListSource for BuildList {
    type Item = DownloadableBuild;

    fn name() -> &'static str {
        "downloadable builds"
    }

    fn fetch(backend: Arc<dyn Backend>) -> BoxFuture<'static, Result<Vec<DownloadableBuild>>> {
        async move { backend.list_downloadable_builds().await }.boxed()
    }
}

pub struct InstallLocationList;

impl ListSource for InstallLocationList {
    type Item = InstallLocation;

    fn name() -> &'static str {
        "install locations"
    }

    fn fetch(backend: Arc<dyn Backend>) -> BoxFuture<'static, Result<Vec<InstallLocation>>> {
        async move { backend.list_install_locations(ListFilter::all()).await }.boxed()
    }
}

/// Outcome of a mutation together with the list re-fetched after it
#[derive(Debug)]
pub struct Refreshed<T, R> {
    pub outcome: Result<R, WorkflowError>,
    /// Taken when the reload started; a larger value saw a newer backend
    pub seq: u64,
    pub list: Result<Vec<T>, WorkflowError>,
}

static RELOAD_SEQ: AtomicU64 = AtomicU64::new(1);

/// Reload the list of `S` from the backend
pub async fn reload<S: ListSource>(backend: Arc<dyn Backend>) -> Result<Vec<S::Item>, WorkflowError> {
    S::fetch(backend).await.map_err(|e| {
        tracing::error!("Failed to load {}: {:#}", S::name(), e);
        WorkflowError::backend("reload list", e)
    })
}

/// Reload `S`, stamped with the order in which the reload started
pub async fn reload_stamped<S: ListSource>(
    backend: Arc<dyn Backend>,
) -> (u64, Result<Vec<S::Item>, WorkflowError>) {
    let seq = RELOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    (seq, reload::<S>(backend).await)
}

/// Run `step`, then reload the list no matter how the step ended.
///
/// The step reports failure by value, so there is no exit path that skips
/// the reload.
pub async fn then_refresh<S, R, F>(backend: Arc<dyn Backend>, step: F) -> Refreshed<S::Item, R>
where
    S: ListSource,
    F: Future<Output = Result<R, WorkflowError>>,
{
    let outcome = step.await;
    if let Err(e) = &outcome {
        tracing::error!("{}", e);
    }
    let (seq, list) = reload_stamped::<S>(backend).await;
    Refreshed { outcome, seq, list }
}

/// Cached list backing one table. Always replaced wholesale, never patched.
///
/// Reloads can finish in a different order than they started; a result
/// stamped older than the list on screen is dropped.
pub struct ViewStore<S: ListSource> {
    items: Vec<S::Item>,
    /// Error from the most recent reload, cleared by the next good one
    pub error: Option<String>,
    seq: u64,
    _source: PhantomData<S>,
}

impl<S: ListSource> Default for ViewStore<S> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            seq: 0,
            _source: PhantomData,
        }
    }
}

impl<S: ListSource> ViewStore<S> {
    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stamp of the list currently shown
    #[cfg(test)]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Apply a reload result stamped `seq`. A failed reload keeps the
    /// previous list and records the error.
    pub fn apply(&mut self, seq: u64, list: Result<Vec<S::Item>, WorkflowError>) -> Option<WorkflowError> {
        if seq < self.seq {
            tracing::debug!(
                "Dropped stale {} reload ({} < {})",
                S::name(),
                seq,
                self.seq
            );
            return None;
        }
        match list {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.seq = seq;
                None
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Some(e)
            }
        }
    }
}
