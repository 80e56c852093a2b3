//! Script and launch-argument selection shared by the launch popups

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::task::JoinHandle;

use crate::backend::Backend;
use crate::models::{LaunchArgument, ListFilter, Script};
use crate::task::{PollResult, poll_task};

/// Argument text ending in a flag that consumes the script path
static SCRIPT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(--python|-P)\s*$").expect("valid regex"));

/// True when `args` ends with `--python` or `-P`, so a script must follow
pub fn needs_script(args: &str) -> bool {
    SCRIPT_FLAG.is_match(args)
}

type Load<T> = Option<JoinHandle<anyhow::Result<T>>>;

pub struct LaunchOptions {
    backend: Arc<dyn Backend>,
    recent_limit: usize,
    pub scripts: Vec<Script>,
    pub arguments: Vec<LaunchArgument>,
    pub selected_script: Option<String>,
    /// Free-text arguments, editable after picking a saved one
    pub argument_text: String,
    scripts_task: Load<(Vec<Script>, Option<String>)>,
    arguments_task: Load<Vec<LaunchArgument>>,
    pub error: Option<String>,
}

impl LaunchOptions {
    /// Start loading recent scripts and launch arguments
    pub fn load(backend: Arc<dyn Backend>, recent_limit: usize) -> Self {
        let mut options = Self {
            backend,
            recent_limit,
            scripts: Vec::new(),
            arguments: Vec::new(),
            selected_script: None,
            argument_text: String::new(),
            scripts_task: None,
            arguments_task: None,
            error: None,
        };
        options.reload_scripts(None);

        let backend = options.backend.clone();
        options.arguments_task = Some(tokio::spawn(async move {
            backend
                .list_launch_arguments(ListFilter::recent(recent_limit))
                .await
        }));
        options
    }

    fn reload_scripts(&mut self, register: Option<PathBuf>) {
        let backend = self.backend.clone();
        let limit = self.recent_limit;
        self.scripts_task = Some(tokio::spawn(async move {
            let selected = match register {
                Some(path) => Some(backend.insert_reusable_script(&path).await?.id),
                None => None,
            };
            let scripts = backend.list_scripts(ListFilter::recent(limit)).await?;
            Ok((scripts, selected))
        }));
    }

    /// Register a script picked from disk and select it once listed
    pub fn add_script(&mut self, path: PathBuf) {
        self.reload_scripts(Some(path));
    }

    pub fn is_loading(&self) -> bool {
        self.scripts_task.is_some() || self.arguments_task.is_some()
    }

    /// Fill the text with the default argument, else the most recent one
    pub fn use_default_argument(&mut self) {
        let chosen = self
            .arguments
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.arguments.first());
        if let Some(argument) = chosen {
            self.argument_text = argument.argument_string.clone();
            if self.selected_script.is_none() {
                self.selected_script = argument.last_used_script_id.clone();
            }
        }
    }

    pub fn select_argument(&mut self, id: &str) {
        if let Some(argument) = self.arguments.iter().find(|a| a.id == id) {
            self.argument_text = argument.argument_string.clone();
        }
    }

    pub fn needs_script(&self) -> bool {
        needs_script(&self.argument_text)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.needs_script() && self.selected_script.is_none() {
            return Err("Choose a script for --python".to_string());
        }
        Ok(())
    }

    /// Script id and trimmed argument text to publish
    pub fn selection(&self) -> (Option<String>, String) {
        (
            self.selected_script.clone(),
            self.argument_text.trim().to_string(),
        )
    }

    pub fn script_label(&self, id: &str) -> String {
        self.scripts
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.script_file_path.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn poll(&mut self) {
        match poll_task(&mut self.scripts_task) {
            PollResult::Complete(Ok(Ok((scripts, selected)))) => {
                self.scripts = scripts;
                if selected.is_some() {
                    self.selected_script = selected;
                }
            }
            PollResult::Complete(Ok(Err(e))) => {
                tracing::error!("Failed to load scripts: {:#}", e);
                self.error = Some(format!("Failed to load scripts: {:#}", e));
            }
            PollResult::Complete(Err(e)) => {
                tracing::error!("Script task panicked: {}", e);
            }
            PollResult::Pending | PollResult::NoTask => {}
        }

        match poll_task(&mut self.arguments_task) {
            PollResult::Complete(Ok(Ok(arguments))) => self.arguments = arguments,
            PollResult::Complete(Ok(Err(e))) => {
                tracing::error!("Failed to load launch arguments: {:#}", e);
                self.error = Some(format!("Failed to load launch arguments: {:#}", e));
            }
            PollResult::Complete(Err(e)) => {
                tracing::error!("Launch argument task panicked: {}", e);
            }
            PollResult::Pending | PollResult::NoTask => {}
        }
    }

    #[cfg(test)]
    pub async fn loaded(&mut self) {
        while self.is_loading() {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            self.poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[test]
    fn test_needs_script() {
        assert!(needs_script("--python"));
        assert!(needs_script("--factory-startup -P "));
        assert!(needs_script("-P"));
        assert!(!needs_script("--python-expr foo"));
        assert!(!needs_script("--python foo.py"));
        assert!(!needs_script("x-P"));
        assert!(!needs_script(""));
    }

    #[tokio::test]
    async fn test_script_required_after_python_flag() {
        let fake = Arc::new(FakeBackend::default());
        let mut options = LaunchOptions::load(fake, 20);
        options.loaded().await;

        options.argument_text = "--background --python".into();
        assert!(options.validate().is_err());

        options.selected_script = Some("s1".into());
        assert!(options.validate().is_ok());
        assert_eq!(
            options.selection(),
            (Some("s1".to_string()), "--background --python".to_string())
        );
    }

    #[tokio::test]
    async fn test_add_script_selects_it() {
        let fake = Arc::new(FakeBackend::default());
        let mut options = LaunchOptions::load(fake.clone(), 20);
        options.loaded().await;

        options.add_script(PathBuf::from("/scripts/setup.py"));
        options.loaded().await;

        assert_eq!(options.scripts.len(), 1);
        assert_eq!(
            options.selected_script.as_deref(),
            Some(options.scripts[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_default_argument_falls_back_to_most_recent() {
        let fake = Arc::new(FakeBackend::default());
        fake.insert_launch_argument("--factory-startup", None, None)
            .await
            .unwrap();
        let mut options = LaunchOptions::load(fake, 20);
        options.loaded().await;

        options.use_default_argument();
        assert_eq!(options.argument_text, "--factory-startup");
    }
}
