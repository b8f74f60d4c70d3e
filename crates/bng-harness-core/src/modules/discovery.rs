use crate::domain::{HarnessError, HarnessResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory names under an API fixture root that never hold a test.
pub const RESERVED_DIRECTORY_NAMES: [&str; 2] = ["shared", "__pycache__"];

/// Regular files directly inside `dir` whose extension is exactly `extension`,
/// sorted by path.
pub fn discover_files(dir: &Path, extension: &str) -> HarnessResult<Vec<PathBuf>> {
    info!("Collecting tests in {}", dir.display());
    let mut files = Vec::new();
    for entry in read_directory(dir)? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Files from several directories, merged and sorted as a single sequence.
pub fn discover_files_in(dirs: &[PathBuf], extension: &str) -> HarnessResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in dirs {
        files.extend(discover_files(dir, extension)?);
    }
    files.sort();
    Ok(files)
}

/// Names of subdirectories directly inside `dir`, minus `reserved` names and
/// hidden directories, sorted by name.
pub fn discover_directories(dir: &Path, reserved: &[&str]) -> HarnessResult<Vec<String>> {
    info!("Collecting tests in {}", dir.display());
    let mut names = Vec::new();
    for entry in read_directory(dir)? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || reserved.contains(&name.as_str()) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn read_directory(dir: &Path) -> HarnessResult<Vec<fs::DirEntry>> {
    let entries = fs::read_dir(dir).map_err(|source| {
        HarnessError::discovery(
            "DISCOVERY.READ_DIR",
            format!(
                "failed to collect tests in '{}': {}",
                dir.display(),
                source
            ),
        )
    })?;

    entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| {
            HarnessError::discovery(
                "DISCOVERY.READ_ENTRY",
                format!(
                    "failed to read directory entry in '{}': {}",
                    dir.display(),
                    source
                ),
            )
        })
}
