//! Filesystem discovery of Blender installations and .blend files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

/// How deep below an install location an installation may sit
const MAX_INSTALL_DEPTH: usize = 3;

/// Blender executable file name on this platform
#[cfg(target_os = "windows")]
pub const EXECUTABLE_NAME: &str = "blender.exe";
#[cfg(target_os = "macos")]
pub const EXECUTABLE_NAME: &str = "Blender";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const EXECUTABLE_NAME: &str = "blender";

static VERSION_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^blender-(\d+\.\d+(?:\.\d+)?)(?:-(alpha|beta|candidate|rc|stable|lts))?").expect("valid regex")
});

/// An installation found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundInstallation {
    pub version: String,
    pub variant_type: String,
    pub installation_directory: PathBuf,
    pub executable: PathBuf,
}

/// Version and variant from a build directory name.
///
/// `blender-4.2.0-alpha+main.abc-linux.x86_64-release` gives `("4.2.0", "alpha")`.
/// Names that do not look like a build directory give `("unknown", "stable")`.
pub fn parse_version_dir(name: &str) -> (String, String) {
    match VERSION_DIR.captures(name) {
        Some(caps) => {
            let version = caps[1].to_string();
            let variant = caps
                .get(2)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_else(|| "stable".to_string());
            (version, variant)
        }
        None => ("unknown".to_string(), "stable".to_string()),
    }
}

/// Executable inside an installation directory, if it has one
pub fn executable_in(directory: &Path) -> Option<PathBuf> {
    let candidates = [
        directory.join(EXECUTABLE_NAME),
        directory.join("Blender.app/Contents/MacOS/Blender"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

/// Find every installation under `root`
pub fn find_installations(root: &Path) -> Vec<FoundInstallation> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_INSTALL_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let directory = entry.path();
        let Some(executable) = executable_in(directory) else {
            continue;
        };
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (version, variant_type) = parse_version_dir(&name);

        tracing::debug!("Found Blender {} {} at {:?}", version, variant_type, executable);
        found.push(FoundInstallation {
            version,
            variant_type,
            installation_directory: directory.to_path_buf(),
            executable,
        });
    }

    found
}

/// Find every .blend file under the given directories
pub fn find_blend_files(directories: &[String]) -> Vec<PathBuf> {
    directories
        .iter()
        .flat_map(|dir| {
            WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("blend"))
                })
                .map(|e| e.into_path())
        })
        .collect()
}
