use std::sync::Arc;

use crate::backend::Backend;
use crate::models::InstallLocation;
use crate::popup::Loaded;
use crate::workflow::store::InstallLocationList;
use crate::workflow::{Completion, DownloadPathPayload, PopupHandle};

pub struct DownloadPathPopup {
    pub(crate) handle: PopupHandle,
    pub locations: Loaded<InstallLocation>,
    pub selected: Option<String>,
    pub error: Option<String>,
}

impl DownloadPathPopup {
    pub fn new(backend: Arc<dyn Backend>, handle: PopupHandle) -> Self {
        Self {
            handle,
            locations: Loaded::fetch::<InstallLocationList>(backend),
            selected: None,
            error: None,
        }
    }

    pub fn poll(&mut self) {
        self.locations.poll();
    }

    /// Pick the default location, else the first one
    pub fn use_default(&mut self) {
        let items = &self.locations.items;
        self.selected = items
            .iter()
            .find(|l| l.is_default)
            .or_else(|| items.first())
            .map(|l| l.id.clone());
    }

    fn selected_path(&self) -> Option<String> {
        let id = self.selected.as_deref()?;
        self.locations
            .items
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.repo_directory_path.clone())
    }

    pub fn can_confirm(&self) -> bool {
        self.selected_path().is_some()
    }

    pub fn confirm(&mut self) -> bool {
        let Some(path) = self.selected_path() else {
            self.error = Some(if self.locations.items.is_empty() {
                "Add an install location in Settings first".to_string()
            } else {
                "Choose a location".to_string()
            });
            return false;
        };
        self.handle
            .complete(Completion::DownloadPathSelected(DownloadPathPayload { path }));
        true
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    #[cfg(test)]
    async fn loaded(&mut self) {
        while self.locations.is_loading() {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            self.poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, FakeHost};
    use crate::workflow::{EventChannel, PopupRoute, WindowLauncher, WorkflowSignal, WorkflowTopic};

    fn open(fake: Arc<FakeBackend>) -> (WindowLauncher, DownloadPathPopup) {
        let launcher = WindowLauncher::new(Arc::new(FakeHost::default()), EventChannel::new());
        let handle = launcher.open(PopupRoute::DownloadPath).unwrap();
        (launcher, DownloadPathPopup::new(fake, handle))
    }

    #[tokio::test]
    async fn test_use_default_then_confirm() {
        let fake = Arc::new(FakeBackend::default());
        fake.add_location("l1", "/srv/blender", false);
        fake.add_location("l2", "/opt/blender", true);
        let (launcher, mut popup) = open(fake);
        let mut sub = launcher
            .channel()
            .subscribe(WorkflowTopic::DownloadPathSelected);
        popup.loaded().await;

        popup.use_default();
        assert!(popup.confirm());
        assert_eq!(
            sub.drain(),
            vec![WorkflowSignal::Completed(Completion::DownloadPathSelected(
                DownloadPathPayload {
                    path: "/opt/blender".into()
                }
            ))]
        );
    }

    #[tokio::test]
    async fn test_default_falls_back_to_first() {
        let fake = Arc::new(FakeBackend::default());
        fake.add_location("l1", "/srv/blender", false);
        fake.add_location("l2", "/opt/blender", false);
        let (_launcher, mut popup) = open(fake);
        popup.loaded().await;

        popup.use_default();
        assert_eq!(popup.selected.as_deref(), Some("l1"));
    }

    #[tokio::test]
    async fn test_no_locations_cannot_confirm() {
        let fake = Arc::new(FakeBackend::default());
        let (launcher, mut popup) = open(fake);
        popup.loaded().await;

        popup.use_default();
        assert!(!popup.can_confirm());
        assert!(!popup.confirm());
        assert!(popup.error.is_some());
        assert!(launcher.is_open(PopupRoute::DownloadPath.label()));
    }
}
