//! Run-wide configuration shared by every suite.
//!
//! All locations are explicit here instead of being derived from where the
//! harness binary lives, so suites can be pointed at temporary trees in tests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BUILD_DIR: &str = "build/release";
pub const DEFAULT_FIXTURES_ROOT: &str = "test";
pub const DEFAULT_WORK_DIR: &str = "work";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory holding `parser/{negative,positive}` and `api/`.
    pub fixtures_root: PathBuf,
    pub build_dir: PathBuf,
    /// Scratch root; each suite recreates its own subdirectory below it.
    pub work_dir: PathBuf,
    /// Forwarded verbatim to every parser invocation.
    pub extra_args: Vec<OsString>,
    pub timeout: Duration,
    pub timeout_is_fatal: bool,
    pub echo_logs: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixtures_root: PathBuf::from(DEFAULT_FIXTURES_ROOT),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            timeout_is_fatal: true,
            echo_logs: false,
        }
    }
}

impl HarnessConfig {
    /// Anchors relative paths at `base` so subprocesses started in scratch
    /// directories still see the same files.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        self.fixtures_root = resolve_path(base, &self.fixtures_root);
        self.build_dir = resolve_path(base, &self.build_dir);
        self.work_dir = resolve_path(base, &self.work_dir);
        self
    }
}

pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Platform suffix for executables produced by the external build.
pub const fn exe_suffix() -> &'static str {
    std::env::consts::EXE_SUFFIX
}
