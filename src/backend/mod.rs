//! Backend command surface consumed by the views, popups and resolvers.
//!
//! The orchestration layer treats every command as a black box: success
//! returns a value of the documented shape, failure an error to report.
//! [`LocalBackend`] is the SQLite + filesystem implementation used by the app.

mod builds;
mod local;
mod process;
mod scan;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    DownloadableBuild, InstallLocation, InstalledVersion, LaunchArgument, ListFilter, ProjectFile,
    Script,
};

pub use local::LocalBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    // Installed versions
    async fn reconcile_versions(&self) -> Result<()>;
    async fn list_versions(&self, filter: ListFilter) -> Result<Vec<InstalledVersion>>;
    async fn set_default_version(&self, id: &str) -> Result<()>;
    async fn uninstall_version(&self, id: &str) -> Result<()>;
    async fn launch_version(
        &self,
        id: &str,
        launch_argument_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<()>;

    // Project files
    async fn reconcile_project_files(&self) -> Result<()>;
    async fn list_project_files(&self, filter: ListFilter) -> Result<Vec<ProjectFile>>;
    async fn create_project_file(&self, version_id: &str, file_name: &str) -> Result<ProjectFile>;
    async fn open_project_file(
        &self,
        file_id: &str,
        version_id: &str,
        script_id: Option<&str>,
        launch_argument_id: Option<&str>,
    ) -> Result<()>;
    async fn delete_project_file(&self, id: &str) -> Result<()>;
    async fn reveal_project_file(&self, id: &str) -> Result<()>;
    async fn archive_project_file(&self, id: &str) -> Result<String>;

    // Reusable launch arguments and scripts
    async fn insert_launch_argument(
        &self,
        text: &str,
        project_file_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<String>;
    async fn list_launch_arguments(&self, filter: ListFilter) -> Result<Vec<LaunchArgument>>;
    async fn insert_reusable_script(&self, path: &Path) -> Result<Script>;
    async fn list_scripts(&self, filter: ListFilter) -> Result<Vec<Script>>;

    // Install locations
    async fn list_install_locations(&self, filter: ListFilter) -> Result<Vec<InstallLocation>>;
    async fn insert_install_location(&self, path: &Path) -> Result<InstallLocation>;
    async fn set_default_install_location(&self, id: &str) -> Result<()>;
    async fn delete_install_location(&self, id: &str) -> Result<()>;

    // Downloads
    async fn list_downloadable_builds(&self) -> Result<Vec<DownloadableBuild>>;
    async fn install_downloaded_build(
        &self,
        local_path: &Path,
        build: &DownloadableBuild,
    ) -> Result<InstalledVersion>;
    async fn probe_connectivity(&self) -> Result<bool>;
}
