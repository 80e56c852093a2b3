//! Project files view state

use std::sync::Arc;

use crate::backend::Backend;
use crate::models::ProjectFile;
use crate::state::{StateEvent, Step, apply_step, open_popup, reload_step};
use crate::task::TaskSet;
use crate::workflow::resolver::{self, CreateProjectFileRequest, OpenProjectFileRequest};
use crate::workflow::store::{ProjectFileList, then_refresh};
use crate::workflow::{
    Completion, PendingSlot, PopupRoute, Subscription, ViewStore, WindowLauncher, WorkflowError,
    WorkflowSignal, WorkflowTopic,
};

pub struct ProjectFilesState {
    backend: Arc<dyn Backend>,
    launcher: WindowLauncher,
    pub store: ViewStore<ProjectFileList>,
    create_slot: PendingSlot<CreateProjectFileRequest>,
    open_slot: PendingSlot<OpenProjectFileRequest>,
    subscriptions: Vec<Subscription>,
    tasks: TaskSet<Step<ProjectFile>>,
    launches: TaskSet<Step<ProjectFile>>,
    events: Vec<StateEvent>,
    /// Filter text for the table
    pub search: String,
    /// File awaiting delete confirmation
    pub confirm_delete: Option<String>,
}

impl ProjectFilesState {
    pub fn new(backend: Arc<dyn Backend>, launcher: WindowLauncher) -> Self {
        Self {
            backend,
            launcher,
            store: ViewStore::default(),
            create_slot: PendingSlot::new("project file creation"),
            open_slot: PendingSlot::new("project file open"),
            subscriptions: Vec::new(),
            tasks: TaskSet::default(),
            launches: TaskSet::default(),
            events: Vec::new(),
            search: String::new(),
            confirm_delete: None,
        }
    }

    pub fn mount(&mut self) {
        if self.subscriptions.is_empty() {
            let channel = self.launcher.channel();
            self.subscriptions = vec![
                channel.subscribe(WorkflowTopic::CreateProjectFileConfirmed),
                channel.subscribe(WorkflowTopic::OpenProjectFileConfirmed),
            ];
        }
        self.refresh();
    }

    pub fn unmount(&mut self) {
        for mut sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
        self.create_slot.clear();
        self.open_slot.clear();
    }

    pub fn is_busy(&self) -> bool {
        !self.tasks.is_empty() || !self.launches.is_empty()
    }

    pub fn refresh(&mut self) {
        self.tasks
            .spawn(reload_step::<ProjectFileList>(self.backend.clone()));
    }

    pub fn pending_create(&self) -> bool {
        self.create_slot.is_set()
    }

    pub fn pending_open(&self) -> Option<&OpenProjectFileRequest> {
        self.open_slot.peek()
    }

    /// Files whose name contains the search text
    pub fn visible(&self) -> Vec<&ProjectFile> {
        let needle = self.search.trim().to_lowercase();
        self.store
            .items()
            .iter()
            .filter(|f| needle.is_empty() || f.file_name.to_lowercase().contains(&needle))
            .collect()
    }

    fn name_of(&self, id: &str) -> String {
        self.store
            .items()
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.file_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn request_create(&mut self) {
        if let Err(e) = open_popup(
            &self.launcher,
            &mut self.create_slot,
            PopupRoute::CreateProjectFile,
            CreateProjectFileRequest,
        ) {
            self.events.push(StateEvent::Failed(e));
        }
    }

    pub fn request_open(&mut self, project_file_id: &str) {
        let request = OpenProjectFileRequest {
            project_file_id: project_file_id.to_string(),
        };
        if let Err(e) = open_popup(
            &self.launcher,
            &mut self.open_slot,
            PopupRoute::LaunchProjectFile,
            request,
        ) {
            self.events.push(StateEvent::Failed(e));
        }
    }

    pub fn delete(&mut self, file_id: &str) {
        let backend = self.backend.clone();
        let id = file_id.to_string();
        let message = format!("Deleted {}", self.name_of(file_id));
        self.confirm_delete = None;

        self.tasks.spawn(then_refresh::<ProjectFileList, _, _>(
            backend.clone(),
            async move {
                backend
                    .delete_project_file(&id)
                    .await
                    .map(|()| Some(message))
                    .map_err(|e| WorkflowError::backend("delete project file", e))
            },
        ));
    }

    pub fn reveal(&mut self, file_id: &str) {
        let backend = self.backend.clone();
        let id = file_id.to_string();

        self.tasks.spawn(then_refresh::<ProjectFileList, _, _>(
            backend.clone(),
            async move {
                backend
                    .reveal_project_file(&id)
                    .await
                    .map(|()| None)
                    .map_err(|e| WorkflowError::backend("reveal project file", e))
            },
        ));
    }

    pub fn archive(&mut self, file_id: &str) {
        let backend = self.backend.clone();
        let id = file_id.to_string();

        self.tasks.spawn(then_refresh::<ProjectFileList, _, _>(
            backend.clone(),
            async move {
                backend
                    .archive_project_file(&id)
                    .await
                    .map(|path| Some(format!("Archived to {}", path)))
                    .map_err(|e| WorkflowError::backend("archive project file", e))
            },
        ));
    }

    fn handle_signal(&mut self, signal: WorkflowSignal, events: &mut Vec<StateEvent>) {
        match signal {
            WorkflowSignal::Completed(Completion::CreateProjectFileConfirmed(payload)) => {
                let Ok(request) = resolver::correlate(
                    &mut self.create_slot,
                    WorkflowTopic::CreateProjectFileConfirmed,
                ) else {
                    return;
                };
                let backend = self.backend.clone();

                events.push(StateEvent::StatusMessage(format!(
                    "Creating {}...",
                    payload.file_name
                )));
                self.tasks.spawn(then_refresh::<ProjectFileList, _, _>(
                    backend.clone(),
                    async move {
                        resolver::resolve_create_project_file(backend, request, payload)
                            .await
                            .map(|file| Some(format!("Created {}", file.file_name)))
                    },
                ));
            }
            WorkflowSignal::Completed(Completion::OpenProjectFileConfirmed(payload)) => {
                let Ok(request) = resolver::correlate(
                    &mut self.open_slot,
                    WorkflowTopic::OpenProjectFileConfirmed,
                ) else {
                    return;
                };
                let message = format!("Opened {}", self.name_of(&request.project_file_id));
                let backend = self.backend.clone();

                self.launches.spawn(then_refresh::<ProjectFileList, _, _>(
                    backend.clone(),
                    async move {
                        resolver::resolve_open_project_file(backend, request, payload)
                            .await
                            .map(|()| Some(message))
                    },
                ));
            }
            WorkflowSignal::Completed(other) => {
                tracing::warn!("Project files view ignored {}", other.topic());
            }
            WorkflowSignal::Dismissed { label } => {
                let cleared = if label == PopupRoute::CreateProjectFile.label() {
                    self.create_slot.clear()
                } else {
                    self.open_slot.clear()
                };
                if cleared {
                    tracing::debug!("Popup '{}' dismissed; pending request cleared", label);
                }
            }
        }
    }

    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = std::mem::take(&mut self.events);

        let signals: Vec<WorkflowSignal> = self
            .subscriptions
            .iter_mut()
            .flat_map(|sub| sub.drain())
            .collect();
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
