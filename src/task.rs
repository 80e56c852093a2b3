//! Task polling utilities
//!
//! Views spawn their backend work on the tokio runtime and collect the
//! results from the UI tick without ever blocking it.

use std::future::Future;

use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};

/// Result of polling a task
pub enum PollResult<T> {
    /// No task to poll (task was None)
    NoTask,
    /// Task is still running
    Pending,
    /// Task completed with result (may be Ok or join error)
    Complete(Result<T, JoinError>),
}

/// Poll an optional task handle and return its result if finished.
///
/// # Example
/// ```ignore
/// match poll_task(&mut self.probe_task) {
///     PollResult::Complete(Ok(Ok(online))) => { /* success */ }
///     PollResult::Complete(Ok(Err(e))) => { /* task returned error */ }
///     PollResult::Complete(Err(e)) => { /* task panicked */ }
///     PollResult::Pending => ctx.request_repaint(),
///     PollResult::NoTask => {}
/// }
/// ```
pub fn poll_task<T>(task: &mut Option<JoinHandle<T>>) -> PollResult<T> {
    let Some(handle) = task else {
        return PollResult::NoTask;
    };

    if !handle.is_finished() {
        return PollResult::Pending;
    }

    let Some(handle) = task.take() else {
        return PollResult::NoTask;
    };
    match handle.now_or_never() {
        Some(result) => PollResult::Complete(result),
        None => {
            // Shouldn't happen since we checked is_finished()
            tracing::warn!("Task not ready despite is_finished()");
            PollResult::Pending
        }
    }
}

/// Any number of in-flight tasks producing the same kind of result.
///
/// Each task may carry a key that comes back with its result, even when the
/// task panicked.
pub struct TaskSet<T, K = ()> {
    handles: Vec<(K, JoinHandle<T>)>,
}

impl<T, K> Default for TaskSet<T, K> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl<T: Send + 'static, K> TaskSet<T, K> {
    pub fn spawn_keyed<F>(&mut self, key: K, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.handles.push((key, tokio::spawn(future)));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Take the results of every finished task with their keys, in spawn order
    pub fn poll_keyed(&mut self) -> Vec<(K, Result<T, JoinError>)> {
        let mut finished = Vec::new();
        let mut running = Vec::with_capacity(self.handles.len());

        for (key, handle) in self.handles.drain(..) {
            if !handle.is_finished() {
                running.push((key, handle));
                continue;
            }
            let mut slot = Some(handle);
            match poll_task(&mut slot) {
                PollResult::Complete(result) => finished.push((key, result)),
                _ => running.extend(slot.map(|handle| (key, handle))),
            }
        }

        self.handles = running;
        finished
    }

    /// Wait until every task has finished, without collecting results
    #[cfg(test)]
    pub async fn settled(&self) {
        while self.handles.iter().any(|(_, h)| !h.is_finished()) {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
    }
}

impl<T: Send + 'static> TaskSet<T> {
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.spawn_keyed((), future);
    }

    /// Take the results of every finished task, in spawn order
    pub fn poll(&mut self) -> Vec<Result<T, JoinError>> {
        self.poll_keyed().into_iter().map(|(_, result)| result).collect()
    }
}
