//! Blender build server client.
//!
//! The daily build listing is a JSON array of build descriptors covering every
//! platform; only the builds installable on the running platform are kept.

use anyhow::{Context, Result};

use crate::models::DownloadableBuild;
use crate::transfer::USER_AGENT;

/// Platform, architecture and archive type of the builds listed for this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformTarget {
    pub platform: &'static str,
    pub architecture: &'static str,
    pub file_extension: &'static str,
}

impl PlatformTarget {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self {
                platform: "windows",
                architecture: "amd64",
                file_extension: "zip",
            }
        } else if cfg!(target_os = "macos") {
            Self {
                platform: "darwin",
                architecture: "arm64",
                file_extension: "dmg",
            }
        } else {
            Self {
                platform: "linux",
                architecture: "x86_64",
                file_extension: "xz",
            }
        }
    }

    pub fn matches(&self, build: &DownloadableBuild) -> bool {
        build.platform == self.platform
            && build.architecture == self.architecture
            && build.file_extension == self.file_extension
    }
}

/// Build server client
#[derive(Clone)]
pub struct BuildServer {
    client: reqwest::Client,
    builds_url: String,
}

impl BuildServer {
    pub fn new(builds_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            builds_url: builds_url.into(),
        })
    }

    /// Fetch the listing and keep the builds for `target`
    pub async fn fetch_builds(&self, target: PlatformTarget) -> Result<Vec<DownloadableBuild>> {
        let response = self
            .client
            .get(&self.builds_url)
            .send()
            .await
            .context("Failed to reach build server")?;

        if !response.status().is_success() {
            anyhow::bail!("Build server returned status: {}", response.status());
        }

        let builds: Vec<DownloadableBuild> = response
            .json()
            .await
            .context("Failed to parse build listing")?;

        let builds = filter_builds(builds, target);
        tracing::info!("Fetched {} builds for {}", builds.len(), target.platform);
        Ok(builds)
    }

    /// True when the build server answers a HEAD request successfully
    pub async fn probe(&self) -> bool {
        match self.client.head(&self.builds_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Connectivity probe failed: {}", e);
                false
            }
        }
    }
}

pub fn filter_builds(builds: Vec<DownloadableBuild>, target: PlatformTarget) -> Vec<DownloadableBuild> {
    builds.into_iter().filter(|b| target.matches(b)).collect()
}
