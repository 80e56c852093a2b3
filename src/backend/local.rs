//! SQLite + filesystem implementation of [`Backend`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::Backend;
use super::builds::{BuildServer, PlatformTarget};
use super::{process, scan};
use crate::config::{Config, LibraryConfig};
use crate::db::Database;
use crate::models::{
    DownloadableBuild, InstallLocation, InstalledVersion, LaunchArgument, ListFilter, ProjectFile,
    Script, now_timestamp,
};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The backend the launcher runs against
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Database>>,
    library: Arc<RwLock<LibraryConfig>>,
    builds: BuildServer,
}

impl LocalBackend {
    pub fn new(db: Database, config: &Config) -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            library: Arc::new(RwLock::new(config.library.clone())),
            builds: BuildServer::new(config.downloads.builds_url.clone())?,
        })
    }

    /// Open the on-disk database and build a backend for `config`
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open().context("Failed to open database")?;
        Self::new(db, config)
    }

    /// Pick up edited project directories
    pub fn set_library(&self, library: LibraryConfig) {
        match self.library.write() {
            Ok(mut guard) => *guard = library,
            Err(poisoned) => *poisoned.into_inner() = library,
        }
    }

    fn library(&self) -> LibraryConfig {
        match self.library.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Run `f` against the database on the blocking pool
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| anyhow::anyhow!("Database lock poisoned"))?;
            f(&db)
        })
        .await
        .context("Database task panicked")?
    }
}

/// Run slow filesystem or process work on the blocking pool. The database
/// lock is never held here, so other views keep loading meanwhile.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Blocking task panicked")?
}

fn require_version(db: &Database, id: &str) -> Result<InstalledVersion> {
    db.get_version(id)?
        .with_context(|| format!("No installed version with id {}", id))
}

fn require_project_file(db: &Database, id: &str) -> Result<ProjectFile> {
    db.get_project_file(id)?
        .with_context(|| format!("No project file with id {}", id))
}

/// Version, argument text and script path for a launch, touching each record
fn prepare_launch(
    db: &Database,
    version_id: &str,
    launch_argument_id: Option<&str>,
    script_id: Option<&str>,
) -> Result<(PathBuf, Option<String>, Option<PathBuf>)> {
    let version = require_version(db, version_id)?;
    db.touch_version(version_id)?;

    let args = match launch_argument_id {
        Some(id) => {
            let argument = db
                .list_launch_arguments(&ListFilter::by_id(id))?
                .into_iter()
                .next()
                .with_context(|| format!("No launch argument with id {}", id))?;
            db.touch_launch_argument(id, None, script_id)?;
            Some(argument.argument_string)
        }
        None => None,
    };

    let script = match script_id {
        Some(id) => {
            let script = db
                .get_script(id)?
                .with_context(|| format!("No script with id {}", id))?;
            db.touch_script(id)?;
            Some(PathBuf::from(script.script_file_path))
        }
        None => None,
    };

    Ok((PathBuf::from(version.executable_file_path), args, script))
}

fn insert_found_version(
    db: &Database,
    found: &scan::FoundInstallation,
    download_url: Option<String>,
) -> Result<InstalledVersion> {
    let now = now_timestamp();
    let version = InstalledVersion {
        id: new_id(),
        version: found.version.clone(),
        variant_type: found.variant_type.clone(),
        download_url,
        is_default: false,
        installation_directory_path: found.installation_directory.display().to_string(),
        executable_file_path: found.executable.display().to_string(),
        created: now.clone(),
        modified: now.clone(),
        accessed: now,
    };
    db.insert_version(&version)?;
    Ok(version)
}

#[async_trait]
impl Backend for LocalBackend {
    async fn reconcile_versions(&self) -> Result<()> {
        self.with_db(|db| {
            let known = db.list_versions(&ListFilter::all())?;

            for version in &known {
                if !Path::new(&version.executable_file_path).is_file() {
                    tracing::info!("Removing vanished version {}", version.display_name());
                    db.delete_version(&version.id)?;
                }
            }

            let known_paths: HashSet<String> = known
                .into_iter()
                .map(|v| v.executable_file_path)
                .collect();
            let mut added = 0;
            for location in db.list_locations(&ListFilter::all())? {
                for found in scan::find_installations(Path::new(&location.repo_directory_path)) {
                    if known_paths.contains(&found.executable.display().to_string()) {
                        continue;
                    }
                    insert_found_version(db, &found, None)?;
                    added += 1;
                }
            }
            if added > 0 {
                tracing::info!("Registered {} new installation(s)", added);
            }

            db.ensure_default_version()
        })
        .await
    }

    async fn list_versions(&self, filter: ListFilter) -> Result<Vec<InstalledVersion>> {
        self.with_db(move |db| db.list_versions(&filter)).await
    }

    async fn set_default_version(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| db.set_default_version(&id)).await
    }

    async fn uninstall_version(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        let version = {
            let id = id.clone();
            self.with_db(move |db| require_version(db, &id)).await?
        };

        let directory = PathBuf::from(&version.installation_directory_path);
        run_blocking(move || {
            if directory.exists() {
                remove_dir_all::remove_dir_all(&directory)
                    .with_context(|| format!("Failed to remove {:?}", directory))?;
            } else {
                tracing::warn!("Installation directory {:?} already gone", directory);
            }
            Ok(())
        })
        .await?;

        self.with_db(move |db| {
            db.delete_version(&id)?;
            db.ensure_default_version()
        })
        .await?;
        tracing::info!("Uninstalled {}", version.display_name());
        Ok(())
    }

    async fn launch_version(
        &self,
        id: &str,
        launch_argument_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<()> {
        let id = id.to_string();
        let launch_argument_id = launch_argument_id.map(str::to_string);
        let script_id = script_id.map(str::to_string);
        self.with_db(move |db| {
            let (executable, args, script) = prepare_launch(
                db,
                &id,
                launch_argument_id.as_deref(),
                script_id.as_deref(),
            )?;
            let args = process::launch_arguments(None, args.as_deref(), script.as_deref())?;
            process::spawn_detached(&executable, &args)
        })
        .await
    }

    async fn reconcile_project_files(&self) -> Result<()> {
        let library = self.library();
        let mut directories = library.project_directories.clone();
        if let Some(dir) = library.new_project_directory {
            if !directories.contains(&dir) {
                directories.push(dir);
            }
        }

        self.with_db(move |db| {
            let known = db.list_project_files(&ListFilter::all())?;
            for file in &known {
                if !Path::new(&file.file_path).is_file() {
                    tracing::info!("Removing vanished project file {}", file.file_path);
                    db.delete_project_file(&file.id)?;
                }
            }

            let known_paths: HashSet<String> = known.into_iter().map(|f| f.file_path).collect();
            for path in scan::find_blend_files(&directories) {
                let file_path = path.display().to_string();
                if known_paths.contains(&file_path) {
                    continue;
                }
                let now = now_timestamp();
                db.insert_project_file(&ProjectFile {
                    id: new_id(),
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    file_path,
                    last_used_version_id: None,
                    created: now.clone(),
                    modified: now.clone(),
                    accessed: now,
                })?;
            }
            Ok(())
        })
        .await
    }

    async fn list_project_files(&self, filter: ListFilter) -> Result<Vec<ProjectFile>> {
        self.with_db(move |db| db.list_project_files(&filter)).await
    }

    async fn create_project_file(&self, version_id: &str, file_name: &str) -> Result<ProjectFile> {
        let file_name = process::blend_file_name(file_name)?;
        let directory = self
            .library()
            .creation_directory()
            .map(PathBuf::from)
            .context("No project directory configured")?;
        let target = directory.join(&file_name);
        if target.exists() {
            anyhow::bail!("{:?} already exists", target);
        }
        let version_id = version_id.to_string();

        let version = {
            let version_id = version_id.clone();
            self.with_db(move |db| require_version(db, &version_id)).await?
        };
        let executable = PathBuf::from(&version.executable_file_path);
        let blend = target.clone();
        run_blocking(move || process::create_blend_file(&executable, &blend)).await?;

        self.with_db(move |db| {
            let now = now_timestamp();
            let file = ProjectFile {
                id: new_id(),
                file_path: target.display().to_string(),
                file_name,
                last_used_version_id: Some(version_id.clone()),
                created: now.clone(),
                modified: now.clone(),
                accessed: now,
            };
            db.insert_project_file(&file)?;
            db.touch_version(&version_id)?;
            Ok(file)
        })
        .await
    }

    async fn open_project_file(
        &self,
        file_id: &str,
        version_id: &str,
        script_id: Option<&str>,
        launch_argument_id: Option<&str>,
    ) -> Result<()> {
        let file_id = file_id.to_string();
        let version_id = version_id.to_string();
        let script_id = script_id.map(str::to_string);
        let launch_argument_id = launch_argument_id.map(str::to_string);
        self.with_db(move |db| {
            let file = require_project_file(db, &file_id)?;
            let (executable, args, script) = prepare_launch(
                db,
                &version_id,
                launch_argument_id.as_deref(),
                script_id.as_deref(),
            )?;
            db.touch_project_file(&file_id, &version_id)?;
            if let Some(id) = launch_argument_id.as_deref() {
                db.touch_launch_argument(id, Some(&file_id), None)?;
            }

            let args = process::launch_arguments(
                Some(Path::new(&file.file_path)),
                args.as_deref(),
                script.as_deref(),
            )?;
            process::spawn_detached(&executable, &args)
        })
        .await
    }

    async fn delete_project_file(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| {
            let file = require_project_file(db, &id)?;
            let path = Path::new(&file.file_path);
            if path.exists() {
                std::fs::remove_file(path).with_context(|| format!("Failed to delete {:?}", path))?;
            }
            db.delete_project_file(&id)?;
            tracing::info!("Deleted project file {}", file.file_path);
            Ok(())
        })
        .await
    }

    async fn reveal_project_file(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| {
            let file = require_project_file(db, &id)?;
            process::reveal(Path::new(&file.file_path))
        })
        .await
    }

    async fn archive_project_file(&self, id: &str) -> Result<String> {
        let id = id.to_string();
        let file = self.with_db(move |db| require_project_file(db, &id)).await?;
        let archive =
            run_blocking(move || process::archive_file(Path::new(&file.file_path))).await?;
        Ok(archive.display().to_string())
    }

    async fn insert_launch_argument(
        &self,
        text: &str,
        project_file_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<String> {
        let text = text.to_string();
        let project_file_id = project_file_id.map(str::to_string);
        let script_id = script_id.map(str::to_string);
        self.with_db(move |db| {
            if let Some(existing) = db.find_launch_argument(&text)? {
                db.touch_launch_argument(
                    &existing.id,
                    project_file_id.as_deref(),
                    script_id.as_deref(),
                )?;
                return Ok(existing.id);
            }

            let now = now_timestamp();
            let argument = LaunchArgument {
                id: new_id(),
                is_default: false,
                argument_string: text,
                last_used_project_file_id: project_file_id,
                last_used_script_id: script_id,
                created: now.clone(),
                modified: now.clone(),
                accessed: now,
            };
            db.insert_launch_argument(&argument)?;
            Ok(argument.id)
        })
        .await
    }

    async fn list_launch_arguments(&self, filter: ListFilter) -> Result<Vec<LaunchArgument>> {
        self.with_db(move |db| db.list_launch_arguments(&filter)).await
    }

    async fn insert_reusable_script(&self, path: &Path) -> Result<Script> {
        let path = path.display().to_string();
        self.with_db(move |db| {
            if let Some(existing) = db.list_scripts(&ListFilter::by_path(path.clone()))?.into_iter().next() {
                db.touch_script(&existing.id)?;
                return Ok(existing);
            }

            let now = now_timestamp();
            let script = Script {
                id: new_id(),
                script_file_path: path,
                created: now.clone(),
                modified: now.clone(),
                accessed: now,
            };
            db.insert_script(&script)?;
            Ok(script)
        })
        .await
    }

    async fn list_scripts(&self, filter: ListFilter) -> Result<Vec<Script>> {
        self.with_db(move |db| db.list_scripts(&filter)).await
    }

    async fn list_install_locations(&self, filter: ListFilter) -> Result<Vec<InstallLocation>> {
        self.with_db(move |db| db.list_locations(&filter)).await
    }

    async fn insert_install_location(&self, path: &Path) -> Result<InstallLocation> {
        let path = path.display().to_string();
        self.with_db(move |db| {
            if let Some(existing) = db.list_locations(&ListFilter::by_path(path.clone()))?.into_iter().next() {
                return Ok(existing);
            }

            let now = now_timestamp();
            let location = InstallLocation {
                id: new_id(),
                repo_directory_path: path,
                is_default: db.default_location()?.is_none(),
                created: now.clone(),
                modified: now.clone(),
                accessed: now,
            };
            db.insert_location(&location)?;
            tracing::info!("Added install location {}", location.repo_directory_path);
            Ok(location)
        })
        .await
    }

    async fn set_default_install_location(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| db.set_default_location(&id)).await
    }

    async fn delete_install_location(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| {
            db.delete_location(&id)?;
            if db.default_location()?.is_none() {
                if let Some(first) = db.list_locations(&ListFilter::recent(1))?.into_iter().next() {
                    db.set_default_location(&first.id)?;
                }
            }
            Ok(())
        })
        .await
    }

    async fn list_downloadable_builds(&self) -> Result<Vec<DownloadableBuild>> {
        self.builds.fetch_builds(PlatformTarget::current()).await
    }

    async fn install_downloaded_build(
        &self,
        local_path: &Path,
        build: &DownloadableBuild,
    ) -> Result<InstalledVersion> {
        let is_zip = local_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            anyhow::bail!("Unsupported archive format: {:?}", local_path);
        }

        let archive = local_path.to_path_buf();
        let known: HashSet<String> = self
            .with_db(|db| {
                Ok(db
                    .list_versions(&ListFilter::all())?
                    .into_iter()
                    .map(|v| v.executable_file_path)
                    .collect())
            })
            .await?;

        let mut found = run_blocking(move || {
            let destination = archive
                .parent()
                .with_context(|| format!("{:?} has no parent directory", archive))?
                .to_path_buf();
            let entries = process::extract_zip(&archive, &destination)?;
            tracing::debug!("Extracted {} entries from {:?}", entries, archive);
            std::fs::remove_file(&archive)
                .with_context(|| format!("Failed to remove {:?}", archive))?;

            scan::find_installations(&destination)
                .into_iter()
                .find(|f| !known.contains(&f.executable.display().to_string()))
                .context("No Blender executable found in the downloaded archive")
        })
        .await?;
        found.version = build.version.clone();
        found.variant_type = build.risk_id.clone();

        let url = build.url.clone();
        self.with_db(move |db| {
            let installed = insert_found_version(db, &found, Some(url))?;
            db.ensure_default_version()?;
            Ok(installed)
        })
        .await
    }

    async fn probe_connectivity(&self) -> Result<bool> {
        Ok(self.builds.probe().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn backend_with(library: LibraryConfig) -> LocalBackend {
        let config = Config {
            library,
            ..Config::default()
        };
        LocalBackend::new(Database::open_in_memory().unwrap(), &config).unwrap()
    }

    fn fake_install(root: &Path, dir_name: &str) -> PathBuf {
        let dir = root.join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        let exe = dir.join(scan::EXECUTABLE_NAME);
        std::fs::write(&exe, b"").unwrap();
        exe
    }

    #[tokio::test]
    async fn test_reconcile_versions_adds_and_removes() {
        let root = TempDir::new().unwrap();
        let backend = backend_with(LibraryConfig::default());
        backend.insert_install_location(root.path()).await.unwrap();

        fake_install(root.path(), "blender-4.2.0-stable+v42");
        let exe = fake_install(root.path(), "blender-4.3.0-alpha+main");

        backend.reconcile_versions().await.unwrap();
        let versions = backend.list_versions(ListFilter::all()).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions.iter().filter(|v| v.is_default).count(), 1);

        // Reconciling again does not duplicate
        backend.reconcile_versions().await.unwrap();
        assert_eq!(backend.list_versions(ListFilter::all()).await.unwrap().len(), 2);

        std::fs::remove_file(exe).unwrap();
        backend.reconcile_versions().await.unwrap();
        let versions = backend.list_versions(ListFilter::all()).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, "4.2.0");
        assert!(versions[0].is_default);
    }

    #[tokio::test]
    async fn test_uninstall_tolerates_missing_directory() {
        let root = TempDir::new().unwrap();
        let backend = backend_with(LibraryConfig::default());
        backend.insert_install_location(root.path()).await.unwrap();
        let exe = fake_install(root.path(), "blender-4.2.0-stable");
        backend.reconcile_versions().await.unwrap();
        let id = backend.list_versions(ListFilter::all()).await.unwrap()[0].id.clone();

        std::fs::remove_dir_all(exe.parent().unwrap()).unwrap();
        backend.uninstall_version(&id).await.unwrap();
        assert!(backend.list_versions(ListFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_launch_argument_dedup_by_text() {
        let backend = backend_with(LibraryConfig::default());
        let first = backend
            .insert_launch_argument("--factory-startup", Some("f1"), None)
            .await
            .unwrap();
        let second = backend
            .insert_launch_argument("--factory-startup", None, Some("s1"))
            .await
            .unwrap();

        assert_eq!(first, second);
        let args = backend.list_launch_arguments(ListFilter::all()).await.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].last_used_project_file_id.as_deref(), Some("f1"));
        assert_eq!(args[0].last_used_script_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_first_install_location_is_default() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let backend = backend_with(LibraryConfig::default());

        let first = backend.insert_install_location(a.path()).await.unwrap();
        let second = backend.insert_install_location(b.path()).await.unwrap();
        let again = backend.insert_install_location(a.path()).await.unwrap();

        assert!(first.is_default);
        assert!(!second.is_default);
        assert_eq!(again.id, first.id);

        backend.delete_install_location(&first.id).await.unwrap();
        let left = backend.list_install_locations(ListFilter::all()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert!(left[0].is_default);
    }

    #[tokio::test]
    async fn test_reconcile_project_files() {
        let projects = TempDir::new().unwrap();
        std::fs::write(projects.path().join("scene.blend"), b"").unwrap();
        let backend = backend_with(LibraryConfig {
            project_directories: vec![projects.path().display().to_string()],
            new_project_directory: None,
        });

        backend.reconcile_project_files().await.unwrap();
        let files = backend.list_project_files(ListFilter::all()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "scene.blend");

        backend.delete_project_file(&files[0].id).await.unwrap();
        assert!(!projects.path().join("scene.blend").exists());
        backend.reconcile_project_files().await.unwrap();
        assert!(backend.list_project_files(ListFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_project_file_rejects_existing_and_paths() {
        let projects = TempDir::new().unwrap();
        std::fs::write(projects.path().join("scene.blend"), b"").unwrap();
        let backend = backend_with(LibraryConfig {
            project_directories: vec![projects.path().display().to_string()],
            new_project_directory: None,
        });

        let existing = backend.create_project_file("7", "scene").await.unwrap_err();
        assert!(existing.to_string().contains("already exists"));
        assert!(backend.create_project_file("7", "../escape").await.is_err());

        let unconfigured = backend_with(LibraryConfig::default());
        assert!(unconfigured.create_project_file("7", "new").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_database_stays_available_while_blender_runs() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let projects = TempDir::new().unwrap();
        let backend = backend_with(LibraryConfig {
            project_directories: vec![projects.path().display().to_string()],
            new_project_directory: None,
        });
        backend.insert_install_location(root.path()).await.unwrap();
        let exe = fake_install(root.path(), "blender-4.2.0-stable");
        std::fs::write(&exe, "#!/bin/sh\nsleep 2\nexit 1\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        backend.reconcile_versions().await.unwrap();
        let id = backend.list_versions(ListFilter::all()).await.unwrap()[0].id.clone();

        let creating = tokio::spawn({
            let backend = backend.clone();
            async move { backend.create_project_file(&id, "scene").await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let listed = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            backend.list_versions(ListFilter::all()),
        )
        .await;
        assert!(listed.is_ok(), "listing waited for the Blender process");
        assert_eq!(listed.unwrap().unwrap().len(), 1);

        // The stand-in executable never writes the file
        assert!(creating.await.unwrap().is_err());
        assert!(backend.list_project_files(ListFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_downloaded_zip_registers_version() {
        let root = TempDir::new().unwrap();
        let archive = root.path().join("blender-4.3.0-alpha.zip");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file(
                format!("blender-4.3.0-alpha+main.abc/{}", scan::EXECUTABLE_NAME),
                options,
            )
            .unwrap();
            zip.write_all(b"#!/bin/sh").unwrap();
            zip.finish().unwrap();
        }

        let backend = backend_with(LibraryConfig::default());
        let build = DownloadableBuild {
            url: "https://builder.blender.org/download/daily/blender-4.3.0-alpha.zip".into(),
            version: "4.3.0".into(),
            risk_id: "alpha".into(),
            ..Default::default()
        };

        let installed = backend.install_downloaded_build(&archive, &build).await.unwrap();
        assert_eq!(installed.version, "4.3.0");
        assert_eq!(installed.variant_type, "alpha");
        assert_eq!(installed.download_url.as_deref(), Some(build.url.as_str()));
        assert!(!archive.exists());

        let dmg = root.path().join("blender.dmg");
        let err = backend.install_downloaded_build(&dmg, &build).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported archive"));
    }
}
