use std::sync::Arc;

use crate::backend::Backend;
use crate::models::InstalledVersion;
use crate::popup::{LaunchOptions, Loaded};
use crate::workflow::store::VersionList;
use crate::workflow::{Completion, OpenProjectFilePayload, PopupHandle};

pub struct LaunchProjectFilePopup {
    pub(crate) handle: PopupHandle,
    pub versions: Loaded<InstalledVersion>,
    pub selected_version: Option<String>,
    pub options: LaunchOptions,
    pub error: Option<String>,
}

impl LaunchProjectFilePopup {
    pub fn new(backend: Arc<dyn Backend>, handle: PopupHandle, recent_limit: usize) -> Self {
        Self {
            handle,
            versions: Loaded::fetch::<VersionList>(backend.clone()),
            selected_version: None,
            options: LaunchOptions::load(backend, recent_limit),
            error: None,
        }
    }

    pub fn poll(&mut self) {
        self.versions.poll();
        self.options.poll();
    }

    #[cfg(test)]
    fn is_loading(&self) -> bool {
        self.versions.is_loading() || self.options.is_loading()
    }

    /// Pick the default version, else the first one listed
    pub fn use_default_version(&mut self) {
        let items = &self.versions.items;
        self.selected_version = items
            .iter()
            .find(|v| v.is_default)
            .or_else(|| items.first())
            .map(|v| v.id.clone());
    }

    pub fn can_confirm(&self) -> bool {
        self.selected_version.is_some() && self.options.validate().is_ok()
    }

    pub fn confirm(&mut self) -> bool {
        let Some(version_id) = self.selected_version.clone() else {
            self.error = Some("Choose a Blender version".to_string());
            return false;
        };
        if let Err(message) = self.options.validate() {
            self.error = Some(message);
            return false;
        }

        let (script_id, launch_args) = self.options.selection();
        self.handle.complete(Completion::OpenProjectFileConfirmed(
            OpenProjectFilePayload {
                version_id,
                script_id,
                launch_args,
            },
        ));
        true
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    #[cfg(test)]
    async fn loaded(&mut self) {
        while self.is_loading() {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            self.poll();
        }
    }
}
