//! Downloads view state

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::Backend;
use crate::models::{DownloadableBuild, InstalledVersion};
use crate::state::{StateEvent, Step, apply_step, open_popup, reload_step};
use crate::task::{PollResult, TaskSet, poll_task};
use crate::transfer::{OperationId, Transfer, TransferProgress};
use crate::workflow::resolver::{self, DownloadRequest};
use crate::workflow::store::{BuildList, VersionList, then_refresh};
use crate::workflow::{
    Completion, PendingSlot, PopupRoute, Subscription, ViewStore, WindowLauncher, WorkflowError,
    WorkflowSignal, WorkflowTopic,
};

pub struct DownloadsState {
    backend: Arc<dyn Backend>,
    launcher: WindowLauncher,
    transfer: Arc<dyn Transfer>,
    verify_checksums: bool,
    /// Builds offered by the build server
    pub builds: ViewStore<BuildList>,
    /// Installed versions, to mark builds that are already installed
    pub installed: ViewStore<VersionList>,
    download_slot: PendingSlot<DownloadRequest>,
    download_sub: Option<Subscription>,
    build_tasks: TaskSet<Step<DownloadableBuild>>,
    /// Installed-version reloads, and downloads keyed by their transfer
    install_tasks: TaskSet<Step<InstalledVersion>, Option<OperationId>>,
    probe_task: Option<JoinHandle<anyhow::Result<bool>>>,
    progress_tx: mpsc::UnboundedSender<TransferProgress>,
    progress_rx: mpsc::UnboundedReceiver<TransferProgress>,
    /// Latest progress per running transfer
    progress: HashMap<OperationId, TransferProgress>,
    /// Running transfers by build url
    downloading: HashMap<String, OperationId>,
    /// Result of the last connectivity probe
    pub online: Option<bool>,
    events: Vec<StateEvent>,
}

impl DownloadsState {
    pub fn new(
        backend: Arc<dyn Backend>,
        launcher: WindowLauncher,
        transfer: Arc<dyn Transfer>,
        verify_checksums: bool,
    ) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            launcher,
            transfer,
            verify_checksums,
            builds: ViewStore::default(),
            installed: ViewStore::default(),
            download_slot: PendingSlot::new("build download"),
            download_sub: None,
            build_tasks: TaskSet::default(),
            install_tasks: TaskSet::default(),
            probe_task: None,
            progress_tx,
            progress_rx,
            progress: HashMap::new(),
            downloading: HashMap::new(),
            online: None,
            events: Vec::new(),
        }
    }

    pub fn mount(&mut self) {
        if self.download_sub.is_none() {
            self.download_sub = Some(
                self.launcher
                    .channel()
                    .subscribe(WorkflowTopic::DownloadPathSelected),
            );
        }
        self.check_connectivity();
        self.refresh();
    }

    pub fn unmount(&mut self) {
        if let Some(mut sub) = self.download_sub.take() {
            sub.unsubscribe();
        }
        self.download_slot.clear();
    }

    pub fn is_busy(&self) -> bool {
        !self.build_tasks.is_empty() || !self.install_tasks.is_empty() || self.probe_task.is_some()
    }

    /// Reload the build listing and the installed versions
    pub fn refresh(&mut self) {
        self.build_tasks
            .spawn(reload_step::<BuildList>(self.backend.clone()));
        self.refresh_installed();
    }

    pub fn refresh_installed(&mut self) {
        self.install_tasks
            .spawn_keyed(None, reload_step::<VersionList>(self.backend.clone()));
    }

    pub fn check_connectivity(&mut self) {
        if self.probe_task.is_some() {
            return;
        }
        let backend = self.backend.clone();
        self.probe_task = Some(tokio::spawn(async move { backend.probe_connectivity().await }));
    }

    pub fn set_verify_checksums(&mut self, verify: bool) {
        self.verify_checksums = verify;
    }

    pub fn pending_download(&self) -> Option<&DownloadRequest> {
        self.download_slot.peek()
    }

    pub fn is_installed(&self, build: &DownloadableBuild) -> bool {
        self.installed
            .items()
            .iter()
            .any(|v| v.download_url.as_deref() == Some(build.url.as_str()))
    }

    /// Progress of the running download of `build`, if any
    pub fn progress_for(&self, build: &DownloadableBuild) -> Option<TransferProgress> {
        let operation = self.downloading.get(&build.url)?;
        Some(self.progress.get(operation).copied().unwrap_or(TransferProgress {
            operation: *operation,
            sent: 0,
            total: 0,
            speed: 0,
        }))
    }

    /// Ask where to put `build`, then download and install it
    pub fn request_download(&mut self, build: &DownloadableBuild) {
        if !build.is_installable() {
            self.events.push(StateEvent::Failed(WorkflowError::transfer(
                &build.file_name,
                anyhow::anyhow!(".{} archives cannot be installed", build.file_extension),
            )));
            return;
        }

        let request = DownloadRequest {
            build: build.clone(),
            operation: OperationId::next(),
        };
        if let Err(e) = open_popup(
            &self.launcher,
            &mut self.download_slot,
            PopupRoute::DownloadPath,
            request,
        ) {
            self.events.push(StateEvent::Failed(e));
        }
    }

    fn handle_signal(&mut self, signal: WorkflowSignal, events: &mut Vec<StateEvent>) {
        match signal {
            WorkflowSignal::Completed(Completion::DownloadPathSelected(payload)) => {
                let Ok(request) =
                    resolver::correlate(&mut self.download_slot, WorkflowTopic::DownloadPathSelected)
                else {
                    return;
                };
                let operation = request.operation;
                let file_name = request.build.file_name.clone();
                self.downloading.insert(request.build.url.clone(), operation);

                let backend = self.backend.clone();
                let transfer = self.transfer.clone();
                let progress = self.progress_tx.clone();
                let verify = self.verify_checksums;

                events.push(StateEvent::StatusMessage(format!("Downloading {}...", file_name)));
                self.install_tasks.spawn_keyed(
                    Some(operation),
                    then_refresh::<VersionList, _, _>(backend.clone(), async move {
                        resolver::resolve_download(backend, transfer, request, payload, progress, verify)
                            .await
                            .map(|installed| Some(format!("Installed Blender {}", installed.display_name())))
                    }),
                );
            }
            WorkflowSignal::Completed(other) => {
                tracing::warn!("Downloads view ignored {}", other.topic());
            }
            WorkflowSignal::Dismissed { label } => {
                if self.download_slot.clear() {
                    tracing::debug!("Popup '{}' dismissed; pending download cleared", label);
                }
            }
        }
    }

    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = std::mem::take(&mut self.events);

        while let Ok(progress) = self.progress_rx.try_recv() {
            if self.downloading.values().any(|op| *op == progress.operation) {
                self.progress.insert(progress.operation, progress);
            }
        }

        let signals = self
            .download_sub
            .as_mut()
            .map(|sub| sub.drain())
            .unwrap_or_default();
        for signal in signals {
            self.handle_signal(signal, &mut events);
        }

        for step in self.build_tasks.poll() {
            apply_step(&mut self.builds, step, &mut events);
        }

        let mut crashed = false;
        for (operation, step) in self.install_tasks.poll_keyed() {
            if let Some(operation) = operation {
                self.progress.remove(&operation);
                self.downloading.retain(|_, op| *op != operation);
                crashed |= step.is_err();
            }
            let reported = matches!(&step, Ok(s) if matches!(s.outcome, Ok(Some(_))));
            if apply_step(&mut self.installed, step, &mut events) && reported {
                events.push(StateEvent::VersionsChanged);
            }
        }
        // A download that died mid-way never ran its reload
        if crashed {
            self.refresh_installed();
        }

        match poll_task(&mut self.probe_task) {
            PollResult::Complete(Ok(Ok(online))) => {
                if !online {
                    tracing::warn!("Build server is unreachable");
                }
                self.online = Some(online);
            }
            PollResult::Complete(Ok(Err(e))) => {
                tracing::warn!("Connectivity probe failed: {:#}", e);
                self.online = Some(false);
            }
            PollResult::Complete(Err(e)) => {
                tracing::error!("Connectivity probe panicked: {}", e);
            }
            PollResult::Pending | PollResult::NoTask => {}
        }

        events
    }
}
