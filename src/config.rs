use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub downloads: DownloadConfig,
}

/// Launcher window behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Keep the launcher open after Blender starts
    #[serde(default = "default_true")]
    pub keep_open_after_launch: bool,
    /// Show popup windows above the main window
    #[serde(default = "default_true")]
    pub popup_always_on_top: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            keep_open_after_launch: true,
            popup_always_on_top: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Where project files live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directories scanned for .blend files
    #[serde(default)]
    pub project_directories: Vec<String>,
    /// Directory new project files are created in.
    /// Falls back to the first project directory.
    #[serde(default)]
    pub new_project_directory: Option<String>,
}

impl LibraryConfig {
    pub fn creation_directory(&self) -> Option<&str> {
        self.new_project_directory
            .as_deref()
            .or_else(|| self.project_directories.first().map(String::as_str))
    }
}

/// Build server and download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// JSON listing of daily builds
    #[serde(default = "default_builds_url")]
    pub builds_url: String,
    /// Minimum time between progress events of one transfer
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
    /// Compare downloads against the listed SHA-256
    #[serde(default = "default_true")]
    pub verify_checksums: bool,
    /// Rows shown in "recent" lists
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            builds_url: default_builds_url(),
            progress_interval_ms: default_progress_interval(),
            verify_checksums: true,
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_builds_url() -> String {
    "https://builder.blender.org/download/daily/?format=json&v=2".to_string()
}

fn default_progress_interval() -> u64 {
    100
}

fn default_recent_limit() -> usize {
    20
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "blendio", "Blendio")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
