pub mod errors;

pub use errors::{HarnessError, HarnessErrorCategory, HarnessResult};

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Exit code reported for a child that ended without one (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectedOutcome {
    Ok,
    Fail,
}

impl ExpectedOutcome {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Fail => 1,
        }
    }

    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ok => "# OK",
            Self::Fail => "# FAIL",
        }
    }
}

/// A single test case: the input consumed by the system under test plus the
/// outcome it is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub path: PathBuf,
    pub expected: ExpectedOutcome,
    pub expected_output_substrings: Vec<String>,
}

impl Fixture {
    pub fn new(path: impl Into<PathBuf>, expected: ExpectedOutcome) -> Self {
        Self {
            path: path.into(),
            expected,
            expected_output_substrings: Vec::new(),
        }
    }

    /// API fixtures carry no header; success is the only expectation.
    pub fn expect_success(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ExpectedOutcome::Ok)
    }

    pub fn with_output(mut self, substring: impl Into<String>) -> Self {
        self.expected_output_substrings.push(substring.into());
        self
    }

    pub const fn expected_exit_code(&self) -> i32 {
        self.expected.exit_code()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub log_path: Option<PathBuf>,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictFailure {
    TimedOut,
    ExitCodeMismatch { observed: i32, expected: i32 },
    MissingOutput { expected: String },
}

impl Display for VerdictFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut => f.write_str("terminated after timeout"),
            Self::ExitCodeMismatch { observed, expected } => {
                write!(f, "exit code was {}, expected {}", observed, expected)
            }
            Self::MissingOutput { expected } => write!(f, "did not find '{}'", expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub reason: String,
    pub failure: Option<VerdictFailure>,
    pub log_path: Option<PathBuf>,
}

impl Verdict {
    pub fn pass(log_path: Option<PathBuf>) -> Self {
        Self {
            passed: true,
            reason: "ok".to_string(),
            failure: None,
            log_path,
        }
    }

    pub fn fail(failure: VerdictFailure, log_path: Option<PathBuf>) -> Self {
        Self {
            passed: false,
            reason: failure.to_string(),
            failure: Some(failure),
            log_path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTally {
    pub total: usize,
    pub failed: usize,
}

impl RunTally {
    pub fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        if !verdict.passed {
            self.failed += 1;
        }
    }

    pub const fn passed(&self) -> usize {
        self.total.saturating_sub(self.failed)
    }

    pub const fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }
}
