use crate::domain::{HarnessResult, Verdict};
use std::path::{Path, PathBuf};

/// One discovered test case within a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCase {
    /// Basename used for the per-case log file.
    pub name: String,
    /// Fixture file (parser) or test executable (API); printed in PASS/FAIL lines.
    pub path: PathBuf,
}

impl FixtureCase {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.name)
    }
}

/// A domain of fixtures run against one kind of system-under-test invocation.
pub trait FixtureSuite {
    /// Scratch subdirectory name; also keeps log paths domain scoped.
    fn name(&self) -> &'static str;

    /// Upper-case label used in the summary lines.
    fn summary_label(&self) -> &'static str;

    /// Cases in the order they must run.
    fn collect(&self) -> HarnessResult<Vec<FixtureCase>>;

    /// Checks that must hold before any case runs; failures abort the run.
    fn preflight(&self, cases: &[FixtureCase]) -> HarnessResult<()>;

    /// Runs one case with `scratch_dir` as working directory and log location.
    fn run_case(&self, case: &FixtureCase, scratch_dir: &Path) -> HarnessResult<Verdict>;
}
