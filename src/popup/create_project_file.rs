use std::sync::Arc;

use crate::backend::Backend;
use crate::models::InstalledVersion;
use crate::popup::Loaded;
use crate::workflow::store::VersionList;
use crate::workflow::{Completion, CreateProjectFilePayload, PopupHandle};

pub struct CreateProjectFilePopup {
    pub(crate) handle: PopupHandle,
    pub versions: Loaded<InstalledVersion>,
    pub file_name: String,
    pub selected_version: Option<String>,
    pub error: Option<String>,
}

impl CreateProjectFilePopup {
    pub fn new(backend: Arc<dyn Backend>, handle: PopupHandle) -> Self {
        Self {
            handle,
            versions: Loaded::fetch::<VersionList>(backend),
            file_name: String::new(),
            selected_version: None,
            error: None,
        }
    }

    pub fn poll(&mut self) {
        if self.versions.poll() && self.selected_version.is_none() {
            // Preselect the default version
            self.selected_version = self
                .versions
                .items
                .iter()
                .find(|v| v.is_default)
                .map(|v| v.id.clone());
        }
    }

    pub fn can_confirm(&self) -> bool {
        !self.file_name.trim().is_empty() && self.selected_version.is_some()
    }

    pub fn confirm(&mut self) -> bool {
        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            self.error = Some("Enter a file name".to_string());
            return false;
        }
        let Some(version_id) = self.selected_version.clone() else {
            self.error = Some("Choose a Blender version".to_string());
            return false;
        };

        self.handle.complete(Completion::CreateProjectFileConfirmed(
            CreateProjectFilePayload {
                file_name: file_name.to_string(),
                version_id,
            },
        ));
        true
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    #[cfg(test)]
    async fn loaded(&mut self) {
        while self.versions.is_loading() {
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

    #[tokio::test]
    async fn test_confirm_publishes_name_and_version() {
        let fake = Arc::new(FakeBackend::default());
        fake.add_version("7", "4.2.0");
        fake.set_default_version("7").await.unwrap();
        let launcher = WindowLauncher::new(Arc::new(FakeHost::default()), EventChannel::new());
        let mut sub = launcher
            .channel()
            .subscribe(WorkflowTopic::CreateProjectFileConfirmed);
        let handle = launcher.open(PopupRoute::CreateProjectFile).unwrap();

        let mut popup = CreateProjectFilePopup::new(fake, handle);
        popup.loaded().await;
        assert_eq!(popup.selected_version.as_deref(), Some("7"));

        popup.file_name = "  scene.blend ".into();
        assert!(popup.confirm());

        assert_eq!(
            sub.drain(),
            vec![WorkflowSignal::Completed(Completion::CreateProjectFileConfirmed(
                CreateProjectFilePayload {
                    file_name: "scene.blend".into(),
                    version_id: "7".into(),
                }
            ))]
        );
    }

    #[tokio::test]
    async fn test_blank_name_or_missing_version_cannot_confirm() {
        let fake = Arc::new(FakeBackend::default());
        fake.add_version("7", "4.2.0");
        let launcher = WindowLauncher::new(Arc::new(FakeHost::default()), EventChannel::new());
        let mut sub = launcher
            .channel()
            .subscribe(WorkflowTopic::CreateProjectFileConfirmed);
        let handle = launcher.open(PopupRoute::CreateProjectFile).unwrap();

        let mut popup = CreateProjectFilePopup::new(fake, handle);
        popup.loaded().await;

        popup.file_name = "   ".into();
        popup.selected_version = Some("7".into());
        assert!(!popup.can_confirm());
        assert!(!popup.confirm());

        popup.file_name = "scene".into();
        popup.selected_version = None;
        assert!(!popup.confirm());
        assert!(popup.error.is_some());
        assert!(sub.drain().is_empty());
    }
}
