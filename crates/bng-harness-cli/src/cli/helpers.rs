use super::CliError;
use anyhow::Context;
use bng_harness_core::common::HarnessConfig;
use bng_harness_core::modules::aggregator::{render_case_line, render_suite_summary};
use bng_harness_core::modules::{CaseReport, FixtureSuite, SuiteOutcome, run_suite};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub(super) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. repeated in-process runs) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn current_working_dir() -> Result<PathBuf, CliError> {
    std::env::current_dir()
        .context("failed to read current working directory")
        .map_err(CliError::from)
}

/// Runs one suite, printing each case line as it completes and the suite
/// summary at the end.
pub(super) fn run_suite_reporting(
    suite: &dyn FixtureSuite,
    config: &HarnessConfig,
) -> Result<SuiteOutcome, CliError> {
    let outcome = run_suite(suite, &config.work_dir, |report: &CaseReport| {
        println!("{}", render_case_line(report));
        if let Err(error) = std::io::stdout().flush() {
            warn!("failed to flush case report: {}", error);
        }
    })?;
    println!("{}", render_suite_summary(&outcome));
    Ok(outcome)
}

pub(super) fn render_domain_status(display_name: &str, outcome: Option<&SuiteOutcome>) -> String {
    let status = match outcome {
        None => "SKIPPED",
        Some(outcome) if outcome.passed() => "PASSED",
        Some(_) => "FAILED",
    };
    format!("{} tests: {}", display_name, status)
}
