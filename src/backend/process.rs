//! Blender processes and file operations on the user's files.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Arguments after the executable: `[file.blend] [args...] [script]`
pub fn launch_arguments(
    project_file: Option<&Path>,
    launch_args: Option<&str>,
    script: Option<&Path>,
) -> Result<Vec<String>> {
    let mut args = Vec::new();

    if let Some(file) = project_file {
        args.push(file.display().to_string());
    }
    if let Some(text) = launch_args {
        let split = shlex::split(text)
            .with_context(|| format!("Unbalanced quotes in launch arguments: {}", text))?;
        args.extend(split);
    }
    if let Some(script) = script {
        args.push(script.display().to_string());
    }

    Ok(args)
}

/// Start Blender without waiting for it
pub fn spawn_detached(executable: &Path, args: &[String]) -> Result<()> {
    let mut cmd = Command::new(executable);
    if let Some(working_dir) = executable.parent() {
        cmd.current_dir(working_dir);
    }
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        cmd.creation_flags(DETACHED_PROCESS);
    }

    tracing::info!("Launching {:?} {:?}", executable, args);
    cmd.spawn()
        .with_context(|| format!("Failed to start {:?}", executable))?;
    Ok(())
}

/// `name.blend`, refusing anything that is not a bare file name
pub fn blend_file_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("File name is empty");
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        anyhow::bail!("File name must not contain a path: {}", name);
    }
    if name.to_lowercase().ends_with(".blend") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.blend"))
    }
}

/// Python run by a background Blender to write an empty main file
fn save_expression(target: &Path) -> String {
    let escaped = target.display().to_string().replace('\\', "\\\\").replace('\'', "\\'");
    format!("import bpy; bpy.ops.wm.save_as_mainfile(filepath='{escaped}')")
}

/// Have `executable` write a fresh .blend at `target`, waiting for it to finish
pub fn create_blend_file(executable: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        anyhow::bail!("{:?} already exists", target);
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    tracing::info!("Creating {:?} with {:?}", target, executable);
    let output = Command::new(executable)
        .arg("--background")
        .arg("--factory-startup")
        .arg("--python-expr")
        .arg(save_expression(target))
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run {:?}", executable))?;

    if !output.status.success() || !target.exists() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "Blender did not create the file (status {}): {}",
            output.status,
            stderr.trim()
        );
    }
    Ok(())
}

/// Open the folder containing `path` in the file manager
pub fn reveal(path: &Path) -> Result<()> {
    let folder = path
        .parent()
        .with_context(|| format!("{:?} has no parent directory", path))?;
    open::that(folder).with_context(|| format!("Failed to open {:?}", folder))?;
    Ok(())
}

/// Write `<file>.zip` next to `file`, returning the archive path
pub fn archive_file(file: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .with_context(|| format!("{:?} has no file name", file))?
        .to_string_lossy()
        .to_string();
    let archive_path = file.with_file_name(format!("{name}.zip"));

    let mut source = File::open(file).with_context(|| format!("Failed to open {:?}", file))?;
    let out = File::create(&archive_path)
        .with_context(|| format!("Failed to create {:?}", archive_path))?;

    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    std::io::copy(&mut source, &mut zip).context("Failed to compress file")?;
    zip.finish()?.flush()?;

    tracing::info!("Archived {:?} to {:?}", file, archive_path);
    Ok(archive_path)
}

/// Extract a ZIP archive into `destination`, returning the entry count
pub fn extract_zip(zip_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(zip_path).context("Failed to open ZIP file")?;
    let mut archive = zip::ZipArchive::new(file).context("Failed to read ZIP archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("Failed to read ZIP entry")?;

        // Skip entries with unsafe paths
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let outpath = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("Failed to create directory {:?}", outpath))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory {:?}", parent))?;
        }
        let mut outfile = File::create(&outpath)
            .with_context(|| format!("Failed to create file {:?}", outpath))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract file {:?}", outpath))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(archive.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_launch_arguments_order_and_quoting() {
        let args = launch_arguments(
            Some(Path::new("/projects/scene.blend")),
            Some(r#"--python-text "my text" -P"#),
            Some(Path::new("/scripts/setup.py")),
        )
        .unwrap();

        assert_eq!(
            args,
            vec![
                "/projects/scene.blend",
                "--python-text",
                "my text",
                "-P",
                "/scripts/setup.py"
            ]
        );
        assert!(launch_arguments(None, Some("\"unclosed"), None).is_err());
        assert!(launch_arguments(None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_blend_file_name() {
        assert_eq!(blend_file_name("scene").unwrap(), "scene.blend");
        assert_eq!(blend_file_name(" scene.blend ").unwrap(), "scene.blend");
        assert!(blend_file_name("").is_err());
        assert!(blend_file_name("../scene").is_err());
        assert!(blend_file_name("a\\b").is_err());
    }

    #[test]
    fn test_save_expression_escapes_quotes() {
        let expr = save_expression(Path::new("/tmp/it's.blend"));
        assert!(expr.ends_with(r"filepath='/tmp/it\'s.blend')"));
    }

    #[test]
    fn test_archive_then_extract() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("scene.blend");
        std::fs::write(&file, b"BLENDER-v402").unwrap();

        let archive = archive_file(&file).unwrap();
        assert_eq!(archive, dir.path().join("scene.blend.zip"));

        let out = dir.path().join("out");
        assert_eq!(extract_zip(&archive, &out).unwrap(), 1);
        assert_eq!(std::fs::read(out.join("scene.blend")).unwrap(), b"BLENDER-v402");
    }
}
