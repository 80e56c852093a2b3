//! Popup models.
//!
//! A popup loads its own reference data when it opens and knows nothing of
//! the view that asked for it. Confirming publishes one completion through
//! its [`PopupHandle`]; the launcher then closes the window.

mod create_project_file;
mod download_path;
mod launch_options;
mod launch_project_file;
mod launch_version;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::Backend;
use crate::task::{PollResult, poll_task};
use crate::workflow::store::{self, ListSource};
use crate::workflow::{PopupHandle, PopupRoute, WindowLauncher, WorkflowError};

pub use create_project_file::CreateProjectFilePopup;
pub use download_path::DownloadPathPopup;
pub use launch_options::LaunchOptions;
pub use launch_project_file::LaunchProjectFilePopup;
pub use launch_version::LaunchVersionPopup;

/// A list fetched once when the popup opens
pub struct Loaded<T> {
    task: Option<JoinHandle<Result<Vec<T>, WorkflowError>>>,
    pub items: Vec<T>,
    pub error: Option<String>,
}

impl<T: Send + 'static> Loaded<T> {
    pub fn fetch<S: ListSource<Item = T>>(backend: Arc<dyn Backend>) -> Self {
        Self {
            task: Some(tokio::spawn(store::reload::<S>(backend))),
            items: Vec::new(),
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.task.is_some()
    }

    /// Returns true on the tick the list arrives
    pub fn poll(&mut self) -> bool {
        match poll_task(&mut self.task) {
            PollResult::Complete(Ok(Ok(items))) => {
                self.items = items;
                true
            }
            PollResult::Complete(Ok(Err(e))) => {
                self.error = Some(e.to_string());
                false
            }
            PollResult::Complete(Err(e)) => {
                tracing::error!("Popup load task panicked: {}", e);
                self.error = Some("Loading failed".to_string());
                false
            }
            PollResult::Pending | PollResult::NoTask => false,
        }
    }
}

/// The model behind one open popup window
pub enum Popup {
    CreateProjectFile(CreateProjectFilePopup),
    LaunchProjectFile(LaunchProjectFilePopup),
    LaunchVersion(LaunchVersionPopup),
    DownloadPath(DownloadPathPopup),
}

impl Popup {
    /// Build the model for `route` and start its loads
    pub fn open(
        route: PopupRoute,
        backend: Arc<dyn Backend>,
        launcher: &WindowLauncher,
        recent_limit: usize,
    ) -> Self {
        let handle = launcher.attach(route);
        match route {
            PopupRoute::CreateProjectFile => {
                Popup::CreateProjectFile(CreateProjectFilePopup::new(backend, handle))
            }
            PopupRoute::LaunchProjectFile => Popup::LaunchProjectFile(
                LaunchProjectFilePopup::new(backend, handle, recent_limit),
            ),
            PopupRoute::LaunchVersion => {
                Popup::LaunchVersion(LaunchVersionPopup::new(backend, handle, recent_limit))
            }
            PopupRoute::DownloadPath => {
                Popup::DownloadPath(DownloadPathPopup::new(backend, handle))
            }
        }
    }

    pub fn handle(&self) -> &PopupHandle {
        match self {
            Popup::CreateProjectFile(p) => &p.handle,
            Popup::LaunchProjectFile(p) => &p.handle,
            Popup::LaunchVersion(p) => &p.handle,
            Popup::DownloadPath(p) => &p.handle,
        }
    }

    pub fn poll(&mut self) {
        match self {
            Popup::CreateProjectFile(p) => p.poll(),
            Popup::LaunchProjectFile(p) => p.poll(),
            Popup::LaunchVersion(p) => p.poll(),
            Popup::DownloadPath(p) => p.poll(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, FakeHost};
    use crate::workflow::EventChannel;

    #[tokio::test]
    async fn test_open_builds_model_for_route() {
        let fake = Arc::new(FakeBackend::default());
        let launcher = WindowLauncher::new(Arc::new(FakeHost::default()), EventChannel::new());

        for route in [
            PopupRoute::CreateProjectFile,
            PopupRoute::LaunchProjectFile,
            PopupRoute::LaunchVersion,
            PopupRoute::DownloadPath,
        ] {
            let popup = Popup::open(route, fake.clone(), &launcher, 20);
            assert_eq!(popup.handle().route(), route);
            assert_eq!(popup.handle().label(), route.label());
        }
    }
}
