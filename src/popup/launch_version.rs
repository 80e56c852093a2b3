use std::sync::Arc;

use crate::backend::Backend;
use crate::popup::LaunchOptions;
use crate::workflow::{Completion, LaunchInstancePayload, PopupHandle};

pub struct LaunchVersionPopup {
    pub(crate) handle: PopupHandle,
    pub options: LaunchOptions,
    pub error: Option<String>,
}

impl LaunchVersionPopup {
    pub fn new(backend: Arc<dyn Backend>, handle: PopupHandle, recent_limit: usize) -> Self {
        Self {
            handle,
            options: LaunchOptions::load(backend, recent_limit),
            error: None,
        }
    }

    pub fn poll(&mut self) {
        self.options.poll();
    }

    pub fn can_confirm(&self) -> bool {
        self.options.validate().is_ok()
    }

    pub fn confirm(&mut self) -> bool {
        if let Err(message) = self.options.validate() {
            self.error = Some(message);
            return false;
        }
        let (script_id, launch_args) = self.options.selection();
        self.handle
            .complete(Completion::LaunchInstanceRequested(LaunchInstancePayload {
                script_id,
                launch_args,
            }));
        true
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }
}
