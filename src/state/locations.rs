//! Install locations (settings) state

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::Backend;
use crate::models::InstallLocation;
use crate::state::{StateEvent, Step, apply_step, reload_step};
use crate::task::TaskSet;
use crate::workflow::store::{InstallLocationList, then_refresh};
use crate::workflow::{ViewStore, WorkflowError};

pub struct LocationsState {
    backend: Arc<dyn Backend>,
    pub store: ViewStore<InstallLocationList>,
    tasks: TaskSet<Step<InstallLocation>>,
}

impl LocationsState {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            store: ViewStore::default(),
            tasks: TaskSet::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn refresh(&mut self) {
        self.tasks
            .spawn(reload_step::<InstallLocationList>(self.backend.clone()));
    }

    pub fn add(&mut self, path: PathBuf) {
        let backend = self.backend.clone();
        self.tasks.spawn(then_refresh::<InstallLocationList, _, _>(
            backend.clone(),
            async move {
                backend
                    .insert_install_location(&path)
                    .await
                    .map(|l| Some(format!("Added install location {}", l.repo_directory_path)))
                    .map_err(|e| WorkflowError::backend("add install location", e))
            },
        ));
    }

    pub fn set_default(&mut self, id: &str) {
        let backend = self.backend.clone();
        let id = id.to_string();
        self.tasks.spawn(then_refresh::<InstallLocationList, _, _>(
            backend.clone(),
            async move {
                backend
                    .set_default_install_location(&id)
                    .await
                    .map(|()| Some("Default install location changed".to_string()))
                    .map_err(|e| WorkflowError::backend("set default install location", e))
            },
        ));
    }

    pub fn remove(&mut self, id: &str) {
        let backend = self.backend.clone();
        let id = id.to_string();
        self.tasks.spawn(then_refresh::<InstallLocationList, _, _>(
            backend.clone(),
            async move {
                backend
                    .delete_install_location(&id)
                    .await
                    .map(|()| Some("Install location removed".to_string()))
                    .map_err(|e| WorkflowError::backend("remove install location", e))
            },
        ));
    }

    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();
        let mut changed = false;
        for step in self.tasks.poll() {
            let mutation = matches!(&step, Ok(s) if matches!(s.outcome, Ok(Some(_))));
            changed |= apply_step(&mut self.store, step, &mut events) && mutation;
        }
        // New locations may hold installations the versions view has not seen
        if changed {
            events.push(StateEvent::VersionsChanged);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    async fn settle(state: &mut LocationsState) -> Vec<StateEvent> {
        state.tasks.settled().await;
        state.poll()
    }

    #[tokio::test]
    async fn test_add_then_default_then_remove() {
        let fake = Arc::new(FakeBackend::default());
        let mut state = LocationsState::new(fake.clone());

        state.add(PathBuf::from("/opt/blender"));
        settle(&mut state).await;
        state.add(PathBuf::from("/srv/blender"));
        settle(&mut state).await;
        assert_eq!(state.store.items().len(), 2);
        assert!(state.store.items()[0].is_default);

        let second = state.store.items()[1].id.clone();
        state.set_default(&second);
        settle(&mut state).await;
        assert!(state.store.items()[1].is_default);
        assert!(!state.store.items()[0].is_default);

        let first = state.store.items()[0].id.clone();
        state.remove(&first);
        let events = settle(&mut state).await;
        assert_eq!(state.store.items().len(), 1);
        assert!(events.contains(&StateEvent::VersionsChanged));
    }

    #[tokio::test]
    async fn test_failed_add_reports_and_reloads() {
        let fake = Arc::new(FakeBackend::default());
        fake.add_location("l1", "/opt/blender", true);
        fake.fail_on("insert_install_location");
        let mut state = LocationsState::new(fake.clone());

        state.add(PathBuf::from("/srv/blender"));
        let events = settle(&mut state).await;

        assert!(matches!(events.as_slice(), [StateEvent::Failed(_)]));
        assert_eq!(state.store.items().len(), 1);
        assert_eq!(fake.calls().last().unwrap(), "list_install_locations");
    }
}
