//! Popup workflow orchestration.
//!
//! A view opens a popup through the [`WindowLauncher`], remembers what it
//! asked for in a [`PendingSlot`], and subscribes to the popup's
//! [`WorkflowTopic`] on the shared [`EventChannel`]. When the popup confirms,
//! the view correlates the completion with its slot, runs a resolver and
//! reloads its list.

pub mod channel;
pub mod error;
pub mod launcher;
pub mod resolver;
pub mod slot;
pub mod store;
pub mod topic;

pub use channel::{EventChannel, Subscription, WorkflowSignal};
#[cfg(test)]
pub use error::ErrorKind;
pub use error::WorkflowError;
pub use launcher::{PopupHandle, PopupRoute, WindowHost, WindowLauncher};
pub use slot::PendingSlot;
pub use store::{ListSource, Refreshed, ViewStore};
pub use topic::{
    Completion, CreateProjectFilePayload, DownloadPathPayload, LaunchInstancePayload,
    OpenProjectFilePayload, WorkflowTopic,
};
