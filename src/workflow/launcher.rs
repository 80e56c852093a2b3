//! Secondary window launcher.
//!
//! Asks the windowing host for a popup window and tracks it until it closes,
//! so that a popup closed without completing can be reported as dismissed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

use super::channel::EventChannel;
use super::error::WorkflowError;
use super::topic::{Completion, WorkflowTopic};

/// Internal route a popup window mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupRoute {
    CreateProjectFile,
    LaunchProjectFile,
    LaunchVersion,
    DownloadPath,
}

impl PopupRoute {
    /// Window label; unique among open windows
    pub fn label(&self) -> &'static str {
        match self {
            PopupRoute::CreateProjectFile => "create-new-project-file-popup",
            PopupRoute::LaunchProjectFile => "launch-project-file-popup",
            PopupRoute::LaunchVersion => "launch-blender-version-popup",
            PopupRoute::DownloadPath => "download-path-popup",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PopupRoute::CreateProjectFile => "Create New Project File",
            PopupRoute::LaunchProjectFile => "Launch Project File",
            PopupRoute::LaunchVersion => "Launch Blender Version",
            PopupRoute::DownloadPath => "Choose Download Location",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PopupRoute::CreateProjectFile => "popup/create-project-file",
            PopupRoute::LaunchProjectFile => "popup/launch-project-file",
            PopupRoute::LaunchVersion => "popup/launch-version",
            PopupRoute::DownloadPath => "popup/download-path",
        }
    }

    /// The only topic this popup publishes on
    pub fn topic(&self) -> WorkflowTopic {
        match self {
            PopupRoute::CreateProjectFile => WorkflowTopic::CreateProjectFileConfirmed,
            PopupRoute::LaunchProjectFile => WorkflowTopic::OpenProjectFileConfirmed,
            PopupRoute::LaunchVersion => WorkflowTopic::LaunchInstanceRequested,
            PopupRoute::DownloadPath => WorkflowTopic::DownloadPathSelected,
        }
    }
}

/// Native windowing host.
///
/// `open_window` returns once the window has been requested, not once the
/// user has acted; an `Err` means the host refused to create it.
pub trait WindowHost: Send + Sync {
    fn open_window(&self, label: &str, title: &str, route: PopupRoute) -> Result<()>;
    fn close_window(&self, label: &str);
}

struct OpenPopup {
    topic: WorkflowTopic,
    completed: bool,
}

/// Opens popups and routes their completion or dismissal onto the channel
#[derive(Clone)]
pub struct WindowLauncher {
    host: Arc<dyn WindowHost>,
    channel: EventChannel,
    open: Arc<Mutex<HashMap<String, OpenPopup>>>,
}

impl WindowLauncher {
    pub fn new(host: Arc<dyn WindowHost>, channel: EventChannel) -> Self {
        Self {
            host,
            channel,
            open: Arc::default(),
        }
    }

    fn open_popups(&self) -> MutexGuard<'_, HashMap<String, OpenPopup>> {
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// Request a popup window for `route`
    pub fn open(&self, route: PopupRoute) -> Result<PopupHandle, WorkflowError> {
        let label = route.label();
        if let Err(e) = self.host.open_window(label, route.title(), route) {
            tracing::error!("Host refused popup '{}': {:#}", label, e);
            return Err(WorkflowError::launch_request(label, e));
        }

        self.open_popups().insert(
            label.to_string(),
            OpenPopup {
                topic: route.topic(),
                completed: false,
            },
        );
        tracing::info!("Opened popup '{}' at {}", label, route.path());

        Ok(PopupHandle {
            label: label.to_string(),
            route,
            launcher: self.clone(),
        })
    }

    /// Handle for the window rendering `route`. Only meaningful while the
    /// popup is open; completing a closed popup is ignored.
    pub fn attach(&self, route: PopupRoute) -> PopupHandle {
        PopupHandle {
            label: route.label().to_string(),
            route,
            launcher: self.clone(),
        }
    }

    #[cfg(test)]
    pub fn is_open(&self, label: &str) -> bool {
        self.open_popups().contains_key(label)
    }

    /// Publish the popup's completion and close its window.
    /// Returns how many subscribers received it.
    pub fn complete(&self, label: &str, completion: Completion) -> usize {
        {
            let mut open = self.open_popups();
            let Some(popup) = open.get_mut(label) else {
                tracing::warn!("Completion from unknown popup '{}' ignored", label);
                return 0;
            };
            if popup.topic != completion.topic() {
                tracing::warn!(
                    "Popup '{}' tried to publish on {} instead of {}",
                    label,
                    completion.topic(),
                    popup.topic
                );
                return 0;
            }
            popup.completed = true;
        }

        let delivered = self.channel.publish(completion);
        self.host.close_window(label);
        delivered
    }

    /// Close a popup without completing it (Cancel button)
    pub fn cancel(&self, label: &str) {
        self.host.close_window(label);
    }

    /// Called once the host has actually closed the window `label`.
    /// A popup that never completed is reported as dismissed.
    pub fn window_closed(&self, label: &str) {
        let Some(popup) = self.open_popups().remove(label) else {
            return;
        };
        if !popup.completed {
            self.channel.publish_dismissed(popup.topic, label);
        }
    }
}

/// What a popup gets to talk back with. It knows its own topic and nothing
/// about who is waiting.
#[derive(Clone)]
pub struct PopupHandle {
    label: String,
    route: PopupRoute,
    launcher: WindowLauncher,
}

impl PopupHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn route(&self) -> PopupRoute {
        self.route
    }

    pub fn complete(&self, completion: Completion) -> usize {
        self.launcher.complete(&self.label, completion)
    }

    pub fn cancel(&self) {
        self.launcher.cancel(&self.label)
    }
}
