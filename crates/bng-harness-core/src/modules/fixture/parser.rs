use crate::domain::{ExpectedOutcome, Fixture, HarnessError, HarnessResult};
use std::path::Path;

pub const OUTPUT_PREFIX: &str = "# OUTPUT:";

/// Parses the expectation header at the top of a fixture file.
///
/// Line 1 selects the expected exit code; the `# OUTPUT:` lines directly
/// below it list substrings the captured log must contain. Everything after
/// the first non-`# OUTPUT:` line is payload for the system under test and is
/// not looked at.
pub fn parse_fixture_header(path: &Path, contents: &str) -> HarnessResult<Fixture> {
    let mut lines = contents.lines();
    let first_line = lines.next().unwrap_or_default();

    let expected = parse_outcome_marker(first_line).ok_or_else(|| {
        HarnessError::fixture(
            "FIXTURE.HEADER",
            format!(
                "{}: First line must be either '{}' or '{}'",
                path.display(),
                ExpectedOutcome::Fail.marker(),
                ExpectedOutcome::Ok.marker()
            ),
        )
    })?;

    let mut fixture = Fixture::new(path, expected);
    for line in lines {
        let Some(expected_output) = line.strip_prefix(OUTPUT_PREFIX) else {
            break;
        };
        fixture
            .expected_output_substrings
            .push(expected_output.trim().to_string());
    }

    Ok(fixture)
}

fn parse_outcome_marker(line: &str) -> Option<ExpectedOutcome> {
    // FAIL wins when a line carries both markers.
    if line.contains(ExpectedOutcome::Fail.marker()) {
        Some(ExpectedOutcome::Fail)
    } else if line.contains(ExpectedOutcome::Ok.marker()) {
        Some(ExpectedOutcome::Ok)
    } else {
        None
    }
}
