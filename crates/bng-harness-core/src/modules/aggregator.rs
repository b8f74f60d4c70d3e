use super::traits::{FixtureCase, FixtureSuite};
use crate::domain::{HarnessError, HarnessResult, RunTally, Verdict};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BANNER: &str = "!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!";

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub case: FixtureCase,
    pub verdict: Verdict,
}

#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub name: &'static str,
    pub label: &'static str,
    pub tally: RunTally,
    pub cases: Vec<CaseReport>,
}

impl SuiteOutcome {
    pub const fn exit_code(&self) -> i32 {
        self.tally.exit_code()
    }

    pub const fn passed(&self) -> bool {
        self.tally.failed == 0
    }
}

/// Recreates the suite's scratch directory, then runs every case in order.
///
/// `on_case` sees each report as soon as the case finishes. Fatal errors from
/// discovery, pre-flight checks, fixture headers or fatal timeouts stop the
/// suite immediately; per-case failures only count against the tally.
pub fn run_suite<F>(
    suite: &dyn FixtureSuite,
    work_dir: &Path,
    mut on_case: F,
) -> HarnessResult<SuiteOutcome>
where
    F: FnMut(&CaseReport),
{
    let scratch_dir = prepare_scratch_dir(work_dir, suite.name())?;
    let cases = suite.collect()?;
    suite.preflight(&cases)?;
    info!("Running {} {} test(s)", cases.len(), suite.name());

    let mut tally = RunTally::default();
    let mut reports = Vec::with_capacity(cases.len());
    for case in cases {
        let verdict = suite.run_case(&case, &scratch_dir)?;
        tally.record(&verdict);
        let report = CaseReport { case, verdict };
        on_case(&report);
        reports.push(report);
    }

    Ok(SuiteOutcome {
        name: suite.name(),
        label: suite.summary_label(),
        tally,
        cases: reports,
    })
}

/// Sum of the suites' exit codes; zero only when every suite passed.
pub fn combined_exit_code(outcomes: &[SuiteOutcome]) -> i32 {
    outcomes.iter().map(SuiteOutcome::exit_code).sum()
}

pub fn prepare_scratch_dir(work_dir: &Path, name: &str) -> HarnessResult<PathBuf> {
    let scratch_dir = work_dir.join(name);
    let io_error = |action: &str, path: &Path, source: std::io::Error| {
        HarnessError::io(
            "IO.SCRATCH_DIR",
            format!(
                "failed to {} scratch directory '{}': {}",
                action,
                path.display(),
                source
            ),
        )
    };

    fs::create_dir_all(work_dir).map_err(|source| io_error("create", work_dir, source))?;
    if scratch_dir.exists() {
        fs::remove_dir_all(&scratch_dir)
            .map_err(|source| io_error("clear", &scratch_dir, source))?;
    }
    fs::create_dir(&scratch_dir).map_err(|source| io_error("create", &scratch_dir, source))?;
    Ok(scratch_dir)
}

pub fn render_case_line(report: &CaseReport) -> String {
    let verdict = &report.verdict;
    if verdict.passed {
        return format!(" PASS {}", report.case.path.display());
    }
    let log = verdict
        .log_path
        .as_deref()
        .map_or_else(|| "<stdout>".to_string(), |path| path.display().to_string());
    format!(
        "!FAIL {}: {}, log: {}",
        report.case.path.display(),
        verdict.reason,
        log
    )
}

pub fn render_suite_summary(outcome: &SuiteOutcome) -> String {
    if outcome.passed() {
        return format!(
            "{} TESTING PASSED: {} passed",
            outcome.label, outcome.tally.total
        );
    }
    [
        BANNER.to_string(),
        format!(
            "{} TESTING FAILED: {} failed out of {}",
            outcome.label, outcome.tally.failed, outcome.tally.total
        ),
        BANNER.to_string(),
    ]
    .join("\n")
}
