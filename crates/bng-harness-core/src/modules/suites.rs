//! The two fixture domains: BNGL parser fixtures and compiled API tests.

use super::discovery::{RESERVED_DIRECTORY_NAMES, discover_directories, discover_files_in};
use super::execution::{ExecutionRequest, execute};
use super::fixture::load_fixture;
use super::traits::{FixtureCase, FixtureSuite};
use super::verdict::evaluate_log;
use crate::common::{HarnessConfig, exe_suffix};
use crate::domain::{Fixture, HarnessError, HarnessResult, Verdict};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BNGL_EXTENSION: &str = "bngl";
pub const PARSER_TEST_APP: &str = "parser_tester_libbng";
pub const PARSER_FIXTURE_SETS: [&str; 2] = ["negative", "positive"];

#[derive(Debug, Clone, Copy)]
struct RunPolicy {
    timeout: Duration,
    timeout_is_fatal: bool,
    echo_log: bool,
}

impl RunPolicy {
    fn from_config(config: &HarnessConfig) -> Self {
        Self {
            timeout: config.timeout,
            timeout_is_fatal: config.timeout_is_fatal,
            echo_log: config.echo_logs,
        }
    }

    fn apply(self, request: ExecutionRequest) -> ExecutionRequest {
        request
            .timeout(self.timeout)
            .timeout_is_fatal(self.timeout_is_fatal)
            .echo_log(self.echo_log)
    }
}

/// Runs every `.bngl` file in `parser/negative` and `parser/positive` through
/// the parser test application.
#[derive(Debug, Clone)]
pub struct ParserSuite {
    fixture_dirs: Vec<PathBuf>,
    test_app: PathBuf,
    extra_args: Vec<OsString>,
    policy: RunPolicy,
}

impl ParserSuite {
    pub fn from_config(config: &HarnessConfig) -> Self {
        let parser_root = config.fixtures_root.join("parser");
        Self {
            fixture_dirs: PARSER_FIXTURE_SETS
                .iter()
                .map(|set| parser_root.join(set))
                .collect(),
            test_app: parser_test_app_path(&config.build_dir),
            extra_args: config.extra_args.clone(),
            policy: RunPolicy::from_config(config),
        }
    }
}

pub fn parser_test_app_path(build_dir: &Path) -> PathBuf {
    build_dir
        .join("bng")
        .join(format!("{}{}", PARSER_TEST_APP, exe_suffix()))
}

impl FixtureSuite for ParserSuite {
    fn name(&self) -> &'static str {
        "parser"
    }

    fn summary_label(&self) -> &'static str {
        "PARSER"
    }

    fn collect(&self) -> HarnessResult<Vec<FixtureCase>> {
        let files = discover_files_in(&self.fixture_dirs, BNGL_EXTENSION)?;
        Ok(files
            .into_iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                FixtureCase::new(name, path)
            })
            .collect())
    }

    fn preflight(&self, _cases: &[FixtureCase]) -> HarnessResult<()> {
        if self.test_app.is_file() {
            return Ok(());
        }
        Err(HarnessError::preflight(
            "PREFLIGHT.PARSER_APP",
            format!(
                "parser test application '{}' was not found.",
                self.test_app.display()
            ),
        ))
    }

    fn run_case(&self, case: &FixtureCase, scratch_dir: &Path) -> HarnessResult<Verdict> {
        let fixture = load_fixture(&case.path)?;
        let request = ExecutionRequest::new(&self.test_app, scratch_dir)
            .arg(case.path.as_os_str())
            .args(self.extra_args.iter().cloned())
            .log_to(scratch_dir.join(case.log_file_name()));
        let result = execute(&self.policy.apply(request))?;
        evaluate_log(&fixture, &result)
    }
}

/// Runs one prebuilt executable per subdirectory of `api/`.
#[derive(Debug, Clone)]
pub struct ApiSuite {
    fixture_dir: PathBuf,
    build_dir: PathBuf,
    policy: RunPolicy,
}

impl ApiSuite {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            fixture_dir: config.fixtures_root.join("api"),
            build_dir: config.build_dir.clone(),
            policy: RunPolicy::from_config(config),
        }
    }
}

pub fn api_test_path(build_dir: &Path, name: &str) -> PathBuf {
    build_dir
        .join("test")
        .join("api")
        .join(name)
        .join(format!("{}{}", name, exe_suffix()))
}

impl FixtureSuite for ApiSuite {
    fn name(&self) -> &'static str {
        "api"
    }

    fn summary_label(&self) -> &'static str {
        "API"
    }

    fn collect(&self) -> HarnessResult<Vec<FixtureCase>> {
        let names = discover_directories(&self.fixture_dir, &RESERVED_DIRECTORY_NAMES)?;
        Ok(names
            .into_iter()
            .map(|name| {
                let path = api_test_path(&self.build_dir, &name);
                FixtureCase::new(name, path)
            })
            .collect())
    }

    fn preflight(&self, cases: &[FixtureCase]) -> HarnessResult<()> {
        match cases.iter().find(|case| !case.path.is_file()) {
            None => Ok(()),
            Some(missing) => Err(HarnessError::preflight(
                "PREFLIGHT.API_EXECUTABLE",
                format!(
                    "API test executable '{}' does not exist, libbng must be built with tests first.",
                    missing.path.display()
                ),
            )),
        }
    }

    fn run_case(&self, case: &FixtureCase, scratch_dir: &Path) -> HarnessResult<Verdict> {
        let request = ExecutionRequest::new(&case.path, scratch_dir)
            .log_to(scratch_dir.join(case.log_file_name()));
        let result = execute(&self.policy.apply(request))?;
        evaluate_log(&Fixture::expect_success(&case.path), &result)
    }
}
