//! In-memory fakes for the backend, window host and transfer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::Backend;
use crate::models::{
    DownloadableBuild, InstallLocation, InstalledVersion, LaunchArgument, ListFilter, ProjectFile,
    Script,
};
use crate::transfer::{OperationId, ProgressSink, Transfer, TransferProgress};
use crate::workflow::{PopupRoute, WindowHost};

pub fn sample_build(file_name: &str) -> DownloadableBuild {
    DownloadableBuild {
        url: format!("https://builder.blender.org/download/daily/{file_name}"),
        app: "Blender".into(),
        version: "4.3.0".into(),
        risk_id: "alpha".into(),
        branch: "main".into(),
        platform: "linux".into(),
        architecture: "x86_64".into(),
        bitness: 64,
        file_name: file_name.into(),
        file_size: 1024,
        file_extension: "zip".into(),
        ..Default::default()
    }
}

fn version(id: &str, version: &str) -> InstalledVersion {
    InstalledVersion {
        id: id.into(),
        version: version.into(),
        variant_type: "stable".into(),
        download_url: None,
        is_default: false,
        installation_directory_path: format!("/opt/blender-{version}"),
        executable_file_path: format!("/opt/blender-{version}/blender"),
        created: String::new(),
        modified: String::new(),
        accessed: String::new(),
    }
}

fn project_file(id: &str, file_name: &str) -> ProjectFile {
    ProjectFile {
        id: id.into(),
        file_path: format!("/projects/{file_name}"),
        file_name: file_name.into(),
        last_used_version_id: None,
        created: String::new(),
        modified: String::new(),
        accessed: String::new(),
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    versions: Vec<InstalledVersion>,
    project_files: Vec<ProjectFile>,
    launch_arguments: Vec<LaunchArgument>,
    scripts: Vec<Script>,
    locations: Vec<InstallLocation>,
    builds: Vec<DownloadableBuild>,
}

/// Backend that records every call and keeps its records in memory
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    fn record(&self, name: &'static str, call: String) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(name) {
            anyhow::bail!("{} refused by fake backend", name);
        }
        Ok(state)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn fail_on(&self, name: &'static str) {
        self.state.lock().unwrap().failing.insert(name);
    }

    pub fn add_version(&self, id: &str, number: &str) {
        self.state.lock().unwrap().versions.push(version(id, number));
    }

    pub fn add_project_file(&self, id: &str, file_name: &str) {
        self.state
            .lock()
            .unwrap()
            .project_files
            .push(project_file(id, file_name));
    }

    pub fn add_script(&self, id: &str, path: &str) {
        self.state.lock().unwrap().scripts.push(Script {
            id: id.into(),
            script_file_path: path.into(),
            created: String::new(),
            modified: String::new(),
            accessed: String::new(),
        });
    }

    pub fn add_location(&self, id: &str, path: &str, is_default: bool) {
        self.state.lock().unwrap().locations.push(InstallLocation {
            id: id.into(),
            repo_directory_path: path.into(),
            is_default,
            created: String::new(),
            modified: String::new(),
            accessed: String::new(),
        });
    }

    pub fn add_build(&self, build: DownloadableBuild) {
        self.state.lock().unwrap().builds.push(build);
    }

    pub fn launch_arguments(&self) -> Vec<LaunchArgument> {
        self.state.lock().unwrap().launch_arguments.clone()
    }

    pub fn versions(&self) -> Vec<InstalledVersion> {
        self.state.lock().unwrap().versions.clone()
    }

    pub fn project_files(&self) -> Vec<ProjectFile> {
        self.state.lock().unwrap().project_files.clone()
    }
}

fn filtered<T: Clone>(items: &[T], filter: &ListFilter, id: impl Fn(&T) -> &str) -> Vec<T> {
    let matching = items
        .iter()
        .filter(|item| filter.id.as_deref().is_none_or(|wanted| id(item) == wanted));
    match filter.limit {
        Some(limit) => matching.take(limit).cloned().collect(),
        None => matching.cloned().collect(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn reconcile_versions(&self) -> Result<()> {
        self.record("reconcile_versions", "reconcile_versions".into())?;
        Ok(())
    }

    async fn list_versions(&self, filter: ListFilter) -> Result<Vec<InstalledVersion>> {
        let state = self.record("list_versions", "list_versions".into())?;
        Ok(filtered(&state.versions, &filter, |v| &v.id))
    }

    async fn set_default_version(&self, id: &str) -> Result<()> {
        let mut state = self.record("set_default_version", format!("set_default_version({id})"))?;
        for v in state.versions.iter_mut() {
            v.is_default = v.id == id;
        }
        Ok(())
    }

    async fn uninstall_version(&self, id: &str) -> Result<()> {
        let mut state = self.record("uninstall_version", format!("uninstall_version({id})"))?;
        state.versions.retain(|v| v.id != id);
        Ok(())
    }

    async fn launch_version(
        &self,
        id: &str,
        launch_argument_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<()> {
        self.record(
            "launch_version",
            format!("launch_version({id}, {launch_argument_id:?}, {script_id:?})"),
        )?;
        Ok(())
    }

    async fn reconcile_project_files(&self) -> Result<()> {
        self.record("reconcile_project_files", "reconcile_project_files".into())?;
        Ok(())
    }

    async fn list_project_files(&self, filter: ListFilter) -> Result<Vec<ProjectFile>> {
        let state = self.record("list_project_files", "list_project_files".into())?;
        Ok(filtered(&state.project_files, &filter, |f| &f.id))
    }

    async fn create_project_file(&self, version_id: &str, file_name: &str) -> Result<ProjectFile> {
        let mut state = self.record(
            "create_project_file",
            format!("create_project_file({version_id}, {file_name})"),
        )?;
        let mut file = project_file(&uuid::Uuid::new_v4().to_string(), file_name);
        file.last_used_version_id = Some(version_id.to_string());
        state.project_files.push(file.clone());
        Ok(file)
    }

    async fn open_project_file(
        &self,
        file_id: &str,
        version_id: &str,
        script_id: Option<&str>,
        launch_argument_id: Option<&str>,
    ) -> Result<()> {
        self.record(
            "open_project_file",
            format!("open_project_file({file_id}, {version_id}, {script_id:?}, {launch_argument_id:?})"),
        )?;
        Ok(())
    }

    async fn delete_project_file(&self, id: &str) -> Result<()> {
        let mut state = self.record("delete_project_file", format!("delete_project_file({id})"))?;
        state.project_files.retain(|f| f.id != id);
        Ok(())
    }

    async fn reveal_project_file(&self, id: &str) -> Result<()> {
        self.record("reveal_project_file", format!("reveal_project_file({id})"))?;
        Ok(())
    }

    async fn archive_project_file(&self, id: &str) -> Result<String> {
        self.record("archive_project_file", format!("archive_project_file({id})"))?;
        Ok(format!("/projects/{id}.zip"))
    }

    async fn insert_launch_argument(
        &self,
        text: &str,
        project_file_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<String> {
        let mut state = self.record("insert_launch_argument", "insert_launch_argument".into())?;
        if let Some(existing) = state.launch_arguments.iter().find(|a| a.argument_string == text) {
            return Ok(existing.id.clone());
        }
        let id = uuid::Uuid::new_v4().to_string();
        state.launch_arguments.push(LaunchArgument {
            id: id.clone(),
            is_default: false,
            argument_string: text.to_string(),
            last_used_project_file_id: project_file_id.map(str::to_string),
            last_used_script_id: script_id.map(str::to_string),
            created: String::new(),
            modified: String::new(),
            accessed: String::new(),
        });
        Ok(id)
    }

    async fn list_launch_arguments(&self, filter: ListFilter) -> Result<Vec<LaunchArgument>> {
        let state = self.record("list_launch_arguments", "list_launch_arguments".into())?;
        Ok(filtered(&state.launch_arguments, &filter, |a| &a.id))
    }

    async fn insert_reusable_script(&self, path: &Path) -> Result<Script> {
        let mut state = self.record(
            "insert_reusable_script",
            format!("insert_reusable_script({})", path.display()),
        )?;
        let script = Script {
            id: uuid::Uuid::new_v4().to_string(),
            script_file_path: path.display().to_string(),
            created: String::new(),
            modified: String::new(),
            accessed: String::new(),
        };
        state.scripts.push(script.clone());
        Ok(script)
    }

    async fn list_scripts(&self, filter: ListFilter) -> Result<Vec<Script>> {
        let state = self.record("list_scripts", "list_scripts".into())?;
        Ok(filtered(&state.scripts, &filter, |s| &s.id))
    }

    async fn list_install_locations(&self, filter: ListFilter) -> Result<Vec<InstallLocation>> {
        let state = self.record("list_install_locations", "list_install_locations".into())?;
        Ok(filtered(&state.locations, &filter, |l| &l.id))
    }

    async fn insert_install_location(&self, path: &Path) -> Result<InstallLocation> {
        let mut state = self.record(
            "insert_install_location",
            format!("insert_install_location({})", path.display()),
        )?;
        let location = InstallLocation {
            id: uuid::Uuid::new_v4().to_string(),
            repo_directory_path: path.display().to_string(),
            is_default: state.locations.is_empty(),
            created: String::new(),
            modified: String::new(),
            accessed: String::new(),
        };
        state.locations.push(location.clone());
        Ok(location)
    }

    async fn set_default_install_location(&self, id: &str) -> Result<()> {
        let mut state = self.record(
            "set_default_install_location",
            format!("set_default_install_location({id})"),
        )?;
        for l in state.locations.iter_mut() {
            l.is_default = l.id == id;
        }
        Ok(())
    }

    async fn delete_install_location(&self, id: &str) -> Result<()> {
        let mut state = self.record(
            "delete_install_location",
            format!("delete_install_location({id})"),
        )?;
        state.locations.retain(|l| l.id != id);
        Ok(())
    }

    async fn list_downloadable_builds(&self) -> Result<Vec<DownloadableBuild>> {
        let state = self.record("list_downloadable_builds", "list_downloadable_builds".into())?;
        Ok(state.builds.clone())
    }

    async fn install_downloaded_build(
        &self,
        local_path: &Path,
        build: &DownloadableBuild,
    ) -> Result<InstalledVersion> {
        let mut state = self.record(
            "install_downloaded_build",
            format!("install_downloaded_build({}, {})", local_path.display(), build.url),
        )?;
        let mut installed = version(&uuid::Uuid::new_v4().to_string(), &build.version);
        installed.variant_type = build.risk_id.clone();
        installed.download_url = Some(build.url.clone());
        state.versions.push(installed.clone());
        Ok(installed)
    }

    async fn probe_connectivity(&self) -> Result<bool> {
        self.record("probe_connectivity", "probe_connectivity".into())?;
        Ok(true)
    }
}

/// Window host that records requests; can be told to refuse them.
/// Like a real host, it refuses a label that is already showing.
#[derive(Default)]
pub struct FakeHost {
    refuse: bool,
    live: Mutex<HashSet<String>>,
    opened: Mutex<Vec<(String, String)>>,
    closed: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<(String, String)> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

impl WindowHost for FakeHost {
    fn open_window(&self, label: &str, title: &str, _route: PopupRoute) -> Result<()> {
        if self.refuse {
            anyhow::bail!("window creation refused");
        }
        if !self.live.lock().unwrap().insert(label.to_string()) {
            anyhow::bail!("a window labelled '{}' already exists", label);
        }
        self.opened
            .lock()
            .unwrap()
            .push((label.to_string(), title.to_string()));
        Ok(())
    }

    fn close_window(&self, label: &str) {
        self.live.lock().unwrap().remove(label);
        self.closed.lock().unwrap().push(label.to_string());
    }
}

/// Transfer that writes nothing; can be told to fail or to crash
#[derive(Default)]
pub struct FakeTransfer {
    fail: bool,
    panic: bool,
    destinations: Mutex<Vec<PathBuf>>,
}

impl FakeTransfer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transfer for FakeTransfer {
    async fn transfer(
        &self,
        _url: &str,
        destination: &Path,
        operation: OperationId,
        progress: ProgressSink,
    ) -> Result<u64> {
        self.destinations
            .lock()
            .unwrap()
            .push(destination.to_path_buf());
        if self.fail {
            anyhow::bail!("connection reset");
        }
        if self.panic {
            panic!("transfer task crashed");
        }
        let _ = progress.send(TransferProgress {
            operation,
            sent: 1024,
            total: 1024,
            speed: 0,
        });
        Ok(1024)
    }
}
