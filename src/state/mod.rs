//! Application state modules
//!
//! One state struct per primary view. Each owns its cached list, its pending
//! workflow slots, its channel subscriptions and its in-flight tasks, and
//! reports back to the app only through [`StateEvent`]s returned from `poll`.

mod downloads;
mod locations;
mod project_files;
pub mod ui;
mod versions;

pub use downloads::DownloadsState;
pub use locations::LocationsState;
pub use project_files::ProjectFilesState;
pub use versions::VersionsState;

use crate::workflow::{
    ListSource, PendingSlot, PopupRoute, Refreshed, ViewStore, WindowLauncher, WorkflowError,
};

/// Events that state poll methods can return.
/// These communicate results back to BlendioApp without direct mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// Update the status message
    StatusMessage(String),

    /// A workflow or backend step failed; shown in the error banner
    Failed(WorkflowError),

    /// Installed versions changed outside the versions view
    VersionsChanged,

    /// Blender was started from a version or a project file
    Launched,

    /// Log an info message
    LogInfo(String),
}

/// Record `context` in `slot` and open the popup for `route`.
///
/// If the host refuses, the slot goes back to what it held before. When the
/// refusal is a duplicate label, that earlier context belongs to the popup
/// still on screen and must survive for its completion to correlate.
pub(crate) fn open_popup<T>(
    launcher: &WindowLauncher,
    slot: &mut PendingSlot<T>,
    route: PopupRoute,
    context: T,
) -> Result<(), WorkflowError> {
    let previous = slot.set(context);
    match launcher.open(route) {
        Ok(_) => Ok(()),
        Err(e) => {
            slot.restore(previous);
            Err(e)
        }
    }
}

/// A mutation followed by its reload. `Ok(Some(msg))` reports success to
/// the status bar; `Ok(None)` is a plain reload.
pub(crate) type Step<T> = Refreshed<T, Option<String>>;

/// Apply a finished step to `store`, turning its outcome into events
pub(crate) fn apply_step<S: ListSource>(
    store: &mut ViewStore<S>,
    step: Result<Step<S::Item>, tokio::task::JoinError>,
    events: &mut Vec<StateEvent>,
) -> bool {
    let step = match step {
        Ok(step) => step,
        Err(e) => {
            tracing::error!("{} task panicked: {}", S::name(), e);
            events.push(StateEvent::Failed(WorkflowError::Backend {
                action: "background task",
                message: e.to_string(),
            }));
            return false;
        }
    };

    let succeeded = match step.outcome {
        Ok(Some(message)) => {
            events.push(StateEvent::StatusMessage(message.clone()));
            events.push(StateEvent::LogInfo(message));
            true
        }
        Ok(None) => true,
        Err(e) => {
            events.push(StateEvent::Failed(e));
            false
        }
    };

    if let Some(e) = store.apply(step.seq, step.list) {
        events.push(StateEvent::Failed(e));
    }
    succeeded
}

/// A plain reload wrapped as a step
pub(crate) async fn reload_step<S: ListSource>(
    backend: std::sync::Arc<dyn crate::backend::Backend>,
) -> Step<S::Item> {
    let (seq, list) = crate::workflow::store::reload_stamped::<S>(backend).await;
    Refreshed {
        outcome: Ok(None),
        seq,
        list,
    }
}
