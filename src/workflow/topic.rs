//! Workflow topics and their completion payloads.
//!
//! Each topic has exactly one payload shape. The topic of a [`Completion`] is
//! derived from its variant, so a payload can never be published on the wrong
//! topic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One kind of popup interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowTopic {
    CreateProjectFileConfirmed,
    OpenProjectFileConfirmed,
    LaunchInstanceRequested,
    DownloadPathSelected,
}

impl WorkflowTopic {
    #[cfg(test)]
    pub fn all() -> &'static [WorkflowTopic] {
        &[
            WorkflowTopic::CreateProjectFileConfirmed,
            WorkflowTopic::OpenProjectFileConfirmed,
            WorkflowTopic::LaunchInstanceRequested,
            WorkflowTopic::DownloadPathSelected,
        ]
    }

    /// Process-wide unique wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowTopic::CreateProjectFileConfirmed => "create-project-file-confirmed",
            WorkflowTopic::OpenProjectFileConfirmed => "open-project-file-confirmed",
            WorkflowTopic::LaunchInstanceRequested => "launch-instance-requested",
            WorkflowTopic::DownloadPathSelected => "download-path-selected",
        }
    }
}

impl fmt::Display for WorkflowTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the create-project-file popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectFilePayload {
    pub file_name: String,
    pub version_id: String,
}

/// Payload of the open-project-file popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenProjectFilePayload {
    pub version_id: String,
    pub script_id: Option<String>,
    pub launch_args: String,
}

/// Payload of the launch-version popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchInstancePayload {
    pub script_id: Option<String>,
    pub launch_args: String,
}

/// Payload of the download-location popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPathPayload {
    pub path: String,
}

/// A completion published by a popup, tagged by topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "kebab-case")]
pub enum Completion {
    CreateProjectFileConfirmed(CreateProjectFilePayload),
    OpenProjectFileConfirmed(OpenProjectFilePayload),
    LaunchInstanceRequested(LaunchInstancePayload),
    DownloadPathSelected(DownloadPathPayload),
}

impl Completion {
    pub fn topic(&self) -> WorkflowTopic {
        match self {
            Completion::CreateProjectFileConfirmed(_) => WorkflowTopic::CreateProjectFileConfirmed,
            Completion::OpenProjectFileConfirmed(_) => WorkflowTopic::OpenProjectFileConfirmed,
            Completion::LaunchInstanceRequested(_) => WorkflowTopic::LaunchInstanceRequested,
            Completion::DownloadPathSelected(_) => WorkflowTopic::DownloadPathSelected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_are_unique() {
        let mut names: Vec<&str> = WorkflowTopic::all().iter().map(|t| t.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), WorkflowTopic::all().len());
    }

    #[test]
    fn test_completion_topic_matches_variant() {
        let completion = Completion::DownloadPathSelected(DownloadPathPayload {
            path: "/opt/blender".into(),
        });
        assert_eq!(completion.topic(), WorkflowTopic::DownloadPathSelected);
    }

    #[test]
    fn test_completion_wire_format_uses_topic_name() {
        let completion = Completion::CreateProjectFileConfirmed(CreateProjectFilePayload {
            file_name: "scene.blend".into(),
            version_id: "7".into(),
        });
        let json = serde_json::to_value(&completion).unwrap();
        assert_eq!(json["topic"], "create-project-file-confirmed");
        assert_eq!(json["payload"]["file_name"], "scene.blend");
    }
}
