use crate::domain::{ExecutionResult, Fixture, HarnessError, HarnessResult, Verdict, VerdictFailure};
use std::fs;

/// PASS requires the exact expected exit code and every expected substring
/// somewhere in `log_content`. The first failed condition is reported.
pub fn evaluate(fixture: &Fixture, result: &ExecutionResult, log_content: &str) -> Verdict {
    let log_path = result.log_path.clone();

    if result.timed_out {
        return Verdict::fail(VerdictFailure::TimedOut, log_path);
    }

    let expected = fixture.expected_exit_code();
    if result.exit_code != expected {
        return Verdict::fail(
            VerdictFailure::ExitCodeMismatch {
                observed: result.exit_code,
                expected,
            },
            log_path,
        );
    }

    if let Some(missing) = fixture
        .expected_output_substrings
        .iter()
        .find(|expected| !log_content.contains(expected.as_str()))
    {
        return Verdict::fail(
            VerdictFailure::MissingOutput {
                expected: missing.clone(),
            },
            log_path,
        );
    }

    Verdict::pass(log_path)
}

/// Reads the captured log (when there is one) and evaluates against it.
pub fn evaluate_log(fixture: &Fixture, result: &ExecutionResult) -> HarnessResult<Verdict> {
    let log_content = match result.log_path() {
        Some(path) if !fixture.expected_output_substrings.is_empty() => {
            let bytes = fs::read(path).map_err(|source| {
                HarnessError::io(
                    "IO.LOG_READ",
                    format!("failed to read log '{}': {}", path.display(), source),
                )
            })?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        _ => String::new(),
    };
    Ok(evaluate(fixture, result, &log_content))
}
