//! Records shared between the backend, the views and the popups.
//!
//! Every record is owned by the backend; views only ever hold cached copies
//! that are replaced wholesale on refresh.

use serde::{Deserialize, Serialize};

/// A Blender installation known to the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledVersion {
    pub id: String,
    /// Version string (e.g., "4.2.0")
    pub version: String,
    /// Release risk (e.g., "stable", "alpha", "candidate")
    pub variant_type: String,
    /// URL the build was downloaded from, if installed through the launcher
    pub download_url: Option<String>,
    pub is_default: bool,
    pub installation_directory_path: String,
    pub executable_file_path: String,
    pub created: String,
    pub modified: String,
    pub accessed: String,
}

impl InstalledVersion {
    /// Label used in lists and popups ("4.2.0 alpha")
    pub fn display_name(&self) -> String {
        format!("{} {}", self.version, self.variant_type)
    }
}

/// A .blend project file tracked by the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub last_used_version_id: Option<String>,
    pub created: String,
    pub modified: String,
    pub accessed: String,
}

/// A reusable launch-argument string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchArgument {
    pub id: String,
    pub is_default: bool,
    pub argument_string: String,
    pub last_used_project_file_id: Option<String>,
    pub last_used_script_id: Option<String>,
    pub created: String,
    pub modified: String,
    pub accessed: String,
}

/// A reusable Python script passed to Blender with `--python`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub script_file_path: String,
    pub created: String,
    pub modified: String,
    pub accessed: String,
}

/// A directory that Blender builds are downloaded to and installed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLocation {
    pub id: String,
    pub repo_directory_path: String,
    pub is_default: bool,
    pub created: String,
    pub modified: String,
    pub accessed: String,
}

/// A build listed by the Blender build server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadableBuild {
    pub url: String,
    pub app: String,
    pub version: String,
    pub risk_id: String,
    pub branch: String,
    pub patch: Option<String>,
    pub hash: String,
    pub platform: String,
    pub architecture: String,
    pub bitness: i32,
    pub file_mtime: i64,
    pub file_name: String,
    pub file_size: i64,
    pub file_extension: String,
    pub release_cycle: String,
    pub checksum: String,
}

impl DownloadableBuild {
    /// Only zip archives can be extracted into an install location
    pub fn is_installable(&self) -> bool {
        self.file_extension.eq_ignore_ascii_case("zip")
    }
}

/// Filter accepted by every list call.
///
/// `id` wins over `path`; `limit` applies to whatever is left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<String>,
    pub path: Option<String>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Current time as an RFC 3339 string, the format every record timestamp uses
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_deserializes_from_server_json() {
        let json = r#"{
            "url": "https://builder.blender.org/download/daily/blender-4.3.0-alpha+main.abc-windows.amd64-release.zip",
            "app": "Blender",
            "version": "4.3.0",
            "risk_id": "alpha",
            "branch": "main",
            "patch": null,
            "hash": "abc",
            "platform": "windows",
            "architecture": "amd64",
            "bitness": 64,
            "file_mtime": 1718000000,
            "file_name": "blender-4.3.0-alpha+main.abc-windows.amd64-release.zip",
            "file_size": 300000000,
            "file_extension": "zip",
            "release_cycle": "alpha",
            "checksum": "deadbeef"
        }"#;

        let build: DownloadableBuild = serde_json::from_str(json).unwrap();
        assert_eq!(build.version, "4.3.0");
        assert_eq!(build.bitness, 64);
        assert!(build.patch.is_none());
    }

    #[test]
    fn test_only_zip_builds_are_installable() {
        let build = |ext: &str| DownloadableBuild {
            file_extension: ext.into(),
            ..Default::default()
        };
        assert!(build("zip").is_installable());
        assert!(build("ZIP").is_installable());
        assert!(!build("xz").is_installable());
        assert!(!build("dmg").is_installable());
    }

    #[test]
    fn test_list_filter_constructors() {
        assert_eq!(ListFilter::by_id("a").id.as_deref(), Some("a"));
        assert_eq!(ListFilter::by_path("/x").path.as_deref(), Some("/x"));
        assert_eq!(ListFilter::recent(20).limit, Some(20));
        assert_eq!(ListFilter::all(), ListFilter::default());
    }
}
