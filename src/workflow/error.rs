use thiserror::Error;

use super::topic::WorkflowTopic;

/// Failures surfaced by the popup workflows.
///
/// None of these are fatal; the affected view stays usable and the user can
/// retry the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{topic} arrived but no request was waiting for it")]
    CorrelationMiss { topic: WorkflowTopic },
    #[error("{action} failed: {message}")]
    Backend { action: &'static str, message: String },
    #[error("could not open popup '{label}': {message}")]
    LaunchRequest { label: String, message: String },
    #[error("download of {file_name} failed: {message}")]
    Transfer { file_name: String, message: String },
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CorrelationMiss,
    Backend,
    LaunchRequest,
    Transfer,
}

impl WorkflowError {
    #[cfg(test)]
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::CorrelationMiss { .. } => ErrorKind::CorrelationMiss,
            WorkflowError::Backend { .. } => ErrorKind::Backend,
            WorkflowError::LaunchRequest { .. } => ErrorKind::LaunchRequest,
            WorkflowError::Transfer { .. } => ErrorKind::Transfer,
        }
    }

    /// Wrap a failed backend command, keeping the whole context chain
    pub fn backend(action: &'static str, err: anyhow::Error) -> Self {
        WorkflowError::Backend {
            action,
            message: format!("{:#}", err),
        }
    }

    pub fn transfer(file_name: impl Into<String>, err: anyhow::Error) -> Self {
        WorkflowError::Transfer {
            file_name: file_name.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn launch_request(label: impl Into<String>, err: anyhow::Error) -> Self {
        WorkflowError::LaunchRequest {
            label: label.into(),
            message: format!("{:#}", err),
        }
    }
}
