//! Installed versions view state

use std::sync::Arc;

use crate::backend::Backend;
use crate::models::InstalledVersion;
use crate::state::{StateEvent, Step, apply_step, open_popup, reload_step};
use crate::task::TaskSet;
use crate::workflow::resolver::{self, LaunchVersionRequest};
use crate::workflow::store::{VersionList, then_refresh};
use crate::workflow::{
    Completion, PendingSlot, PopupRoute, Subscription, ViewStore, WindowLauncher, WorkflowError,
    WorkflowSignal, WorkflowTopic,
};

pub struct VersionsState {
    backend: Arc<dyn Backend>,
    launcher: WindowLauncher,
    /// Installed versions, replaced on every reload
    pub store: ViewStore<VersionList>,
    launch_slot: PendingSlot<LaunchVersionRequest>,
    launch_sub: Option<Subscription>,
    tasks: TaskSet<Step<InstalledVersion>>,
    launches: TaskSet<Step<InstalledVersion>>,
    events: Vec<StateEvent>,
    /// Version awaiting uninstall confirmation
    pub confirm_uninstall: Option<String>,
}

impl VersionsState {
    pub fn new(backend: Arc<dyn Backend>, launcher: WindowLauncher) -> Self {
        Self {
            backend,
            launcher,
            store: ViewStore::default(),
            launch_slot: PendingSlot::new("version launch"),
            launch_sub: None,
            tasks: TaskSet::default(),
            launches: TaskSet::default(),
            events: Vec::new(),
            confirm_uninstall: None,
        }
    }

    /// Subscribe to launch completions and load the list
    pub fn mount(&mut self) {
        if self.launch_sub.is_none() {
            self.launch_sub = Some(
                self.launcher
                    .channel()
                    .subscribe(WorkflowTopic::LaunchInstanceRequested),
            );
        }
        self.refresh();
    }

    /// Drop the subscription; anything already queued is never observed
    pub fn unmount(&mut self) {
        if let Some(mut sub) = self.launch_sub.take() {
            sub.unsubscribe();
        }
        self.launch_slot.clear();
    }

    pub fn is_busy(&self) -> bool {
        !self.tasks.is_empty() || !self.launches.is_empty()
    }

    pub fn refresh(&mut self) {
        self.tasks.spawn(reload_step::<VersionList>(self.backend.clone()));
    }

    pub fn pending_launch(&self) -> Option<&LaunchVersionRequest> {
        self.launch_slot.peek()
    }

    fn name_of(&self, id: &str) -> String {
        self.store
            .items()
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.display_name())
            .unwrap_or_else(|| id.to_string())
    }

    /// Ask for launch options in a popup, then launch `version_id`
    pub fn request_launch(&mut self, version_id: &str) {
        let request = LaunchVersionRequest {
            version_id: version_id.to_string(),
        };
        if let Err(e) = open_popup(
            &self.launcher,
            &mut self.launch_slot,
            PopupRoute::LaunchVersion,
            request,
        ) {
            self.events.push(StateEvent::Failed(e));
        }
    }

    /// Launch with no arguments and no script
    pub fn launch_now(&mut self, version_id: &str) {
        let backend = self.backend.clone();
        let id = version_id.to_string();
        let message = format!("Launched Blender {}", self.name_of(version_id));

        self.launches.spawn(then_refresh::<VersionList, _, _>(
            backend.clone(),
            async move {
                backend
                    .launch_version(&id, None, None)
                    .await
                    .map(|()| Some(message))
                    .map_err(|e| WorkflowError::backend("launch version", e))
            },
        ));
    }

    pub fn set_default(&mut self, version_id: &str) {
        let backend = self.backend.clone();
        let id = version_id.to_string();
        let message = format!("{} is now the default version", self.name_of(version_id));

        self.tasks.spawn(then_refresh::<VersionList, _, _>(
            backend.clone(),
            async move {
                backend
                    .set_default_version(&id)
                    .await
                    .map(|()| Some(message))
                    .map_err(|e| WorkflowError::backend("set default version", e))
            },
        ));
    }

    pub fn uninstall(&mut self, version_id: &str) {
        let backend = self.backend.clone();
        let id = version_id.to_string();
        let message = format!("Uninstalled Blender {}", self.name_of(version_id));
        self.confirm_uninstall = None;

        self.tasks.spawn(then_refresh::<VersionList, _, _>(
            backend.clone(),
            async move {
                backend
                    .uninstall_version(&id)
                    .await
                    .map(|()| Some(message))
                    .map_err(|e| WorkflowError::backend("uninstall version", e))
            },
        ));
    }

    fn handle_signal(&mut self, signal: WorkflowSignal, events: &mut Vec<StateEvent>) {
        match signal {
            WorkflowSignal::Completed(Completion::LaunchInstanceRequested(payload)) => {
                let Ok(request) =
                    resolver::correlate(&mut self.launch_slot, WorkflowTopic::LaunchInstanceRequested)
                else {
                    return;
                };
                let message = format!("Launched Blender {}", self.name_of(&request.version_id));
                let backend = self.backend.clone();

                events.push(StateEvent::StatusMessage("Launching Blender...".to_string()));
                self.launches.spawn(then_refresh::<VersionList, _, _>(
                    backend.clone(),
                    async move {
                        resolver::resolve_launch_version(backend, request, payload)
                            .await
                            .map(|()| Some(message))
                    },
                ));
            }
            WorkflowSignal::Completed(other) => {
                tracing::warn!("Versions view ignored {}", other.topic());
            }
            WorkflowSignal::Dismissed { label } => {
                if self.launch_slot.clear() {
                    tracing::debug!("Popup '{}' dismissed; pending launch cleared", label);
                }
            }
        }
    }

    /// Handle completions and finished tasks
    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = std::mem::take(&mut self.events);

        let signals = self
            .launch_sub
            .as_mut()
            .map(|sub| sub.drain())
            .unwrap_or_default();
        for signal in signals {
            self.handle_signal(signal, &mut events);
        }

        for step in self.tasks.poll() {
            apply_step(&mut self.store, step, &mut events);
        }
        for step in self.launches.poll() {
            let launched = matches!(&step, Ok(s) if s.outcome.is_ok());
            apply_step(&mut self.store, step, &mut events);
            if launched {
                events.push(StateEvent::Launched);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, FakeHost};
    use crate::workflow::{ErrorKind, EventChannel, LaunchInstancePayload};

    struct Harness {
        fake: Arc<FakeBackend>,
        host: Arc<FakeHost>,
        launcher: WindowLauncher,
        state: VersionsState,
    }

    fn harness(host: FakeHost) -> Harness {
        let fake = Arc::new(FakeBackend::default());
        fake.add_version("7", "4.2.0");
        let host = Arc::new(host);
        let launcher = WindowLauncher::new(host.clone(), EventChannel::new());
        let state = VersionsState::new(fake.clone(), launcher.clone());
        Harness {
            fake,
            host,
            launcher,
            state,
        }
    }

    async fn settle(state: &mut VersionsState) -> Vec<StateEvent> {
        let mut events = Vec::new();
        loop {
            state.tasks.settled().await;
            state.launches.settled().await;
            events.extend(state.poll());
            if !state.is_busy() {
                return events;
            }
        }
    }

    fn launch_payload(args: &str) -> Completion {
        Completion::LaunchInstanceRequested(LaunchInstancePayload {
            script_id: None,
            launch_args: args.to_string(),
        })
    }

    #[tokio::test]
    async fn test_mount_loads_list() {
        let mut h = harness(FakeHost::default());
        h.state.mount();
        settle(&mut h.state).await;

        assert_eq!(h.state.store.items().len(), 1);
        assert_eq!(h.fake.calls(), vec!["reconcile_versions", "list_versions"]);
    }

    #[tokio::test]
    async fn test_launch_workflow_persists_args_then_launches_then_refreshes() {
        let mut h = harness(FakeHost::default());
        h.state.mount();
        settle(&mut h.state).await;
        h.fake.clear_calls();

        h.state.request_launch("7");
        assert_eq!(h.host.opened()[0].0, "launch-blender-version-popup");
        assert!(h.state.pending_launch().is_some());

        let popup = h.launcher.attach(PopupRoute::LaunchVersion);
        assert_eq!(popup.complete(launch_payload(" --factory-startup ")), 1);
        let events = settle(&mut h.state).await;

        let arg_id = h.fake.launch_arguments()[0].id.clone();
        assert_eq!(
            h.fake.calls(),
            vec![
                "insert_launch_argument".to_string(),
                format!("launch_version(7, Some(\"{arg_id}\"), None)"),
                "reconcile_versions".to_string(),
                "list_versions".to_string(),
            ]
        );
        assert!(h.state.pending_launch().is_none());
        assert!(events.contains(&StateEvent::StatusMessage("Launched Blender 4.2.0 stable".into())));
    }

    #[tokio::test]
    async fn test_completion_without_request_changes_nothing() {
        let mut h = harness(FakeHost::default());
        h.state.mount();
        settle(&mut h.state).await;
        h.fake.clear_calls();
        let seq = h.state.store.seq();

        h.launcher.channel().publish(launch_payload(""));
        let events = settle(&mut h.state).await;

        assert!(events.is_empty());
        assert!(h.fake.calls().is_empty());
        assert_eq!(h.state.store.seq(), seq);
    }

    #[tokio::test]
    async fn test_failed_launch_still_refreshes() {
        let mut h = harness(FakeHost::default());
        h.state.mount();
        settle(&mut h.state).await;
        h.fake.fail_on("launch_version");
        h.fake.clear_calls();

        h.state.request_launch("7");
        h.launcher
            .attach(PopupRoute::LaunchVersion)
            .complete(launch_payload(""));
        let events = settle(&mut h.state).await;

        assert!(events.iter().any(|e| matches!(
            e,
            StateEvent::Failed(err) if err.kind() == ErrorKind::Backend
        )));
        assert_eq!(
            h.fake.calls(),
            vec!["launch_version(7, None, None)", "reconcile_versions", "list_versions"]
        );
    }

    #[tokio::test]
    async fn test_dismissed_popup_clears_slot() {
        let mut h = harness(FakeHost::default());
        h.state.mount();

        h.state.request_launch("7");
        h.launcher.cancel("launch-blender-version-popup");
        assert!(h.state.pending_launch().is_some());

        h.launcher.window_closed("launch-blender-version-popup");
        settle(&mut h.state).await;
        assert!(h.state.pending_launch().is_none());
    }

    #[tokio::test]
    async fn test_refused_popup_clears_slot_and_reports() {
        let mut h = harness(FakeHost::refusing());
        h.state.request_launch("7");

        assert!(h.state.pending_launch().is_none());
        let events = h.state.poll();
        assert!(matches!(
            events.as_slice(),
            [StateEvent::Failed(WorkflowError::LaunchRequest { .. })]
        ));
    }

    #[tokio::test]
    async fn test_second_request_while_popup_open_keeps_first_context() {
        let mut h = harness(FakeHost::default());
        h.fake.add_version("8", "4.1.0");
        h.state.mount();
        settle(&mut h.state).await;
        h.fake.clear_calls();

        h.state.request_launch("7");
        h.state.request_launch("8");
        assert_eq!(h.host.opened().len(), 1);
        assert_eq!(
            h.state.pending_launch().map(|r| r.version_id.as_str()),
            Some("7")
        );

        let events = h.state.poll();
        assert!(matches!(
            events.as_slice(),
            [StateEvent::Failed(WorkflowError::LaunchRequest { .. })]
        ));

        // The popup still on screen completes against the version it was opened for
        let delivered = h
            .launcher
            .attach(PopupRoute::LaunchVersion)
            .complete(launch_payload(""));
        assert_eq!(delivered, 1);
        settle(&mut h.state).await;

        assert_eq!(h.fake.calls()[0], "launch_version(7, None, None)");
        assert!(h.state.pending_launch().is_none());
    }

    #[tokio::test]
    async fn test_unmount_drops_queued_completion() {
        let mut h = harness(FakeHost::default());
        h.state.mount();
        settle(&mut h.state).await;
        h.fake.clear_calls();

        h.state.request_launch("7");
        h.launcher
            .attach(PopupRoute::LaunchVersion)
            .complete(launch_payload(""));
        h.state.unmount();
        settle(&mut h.state).await;

        assert!(h.fake.calls().is_empty());
        assert_eq!(
            h.launcher
                .channel()
                .subscriber_count(WorkflowTopic::LaunchInstanceRequested),
            0
        );
    }

    #[tokio::test]
    async fn test_uninstall_failure_reports_and_refreshes() {
        let mut h = harness(FakeHost::default());
        h.fake.fail_on("uninstall_version");

        h.state.uninstall("7");
        let events = settle(&mut h.state).await;

        assert!(events.iter().any(|e| matches!(e, StateEvent::Failed(_))));
        assert_eq!(h.state.store.items().len(), 1);
    }
}
