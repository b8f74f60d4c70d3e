mod parser;

pub use parser::{OUTPUT_PREFIX, parse_fixture_header};

use crate::domain::{Fixture, HarnessError, HarnessResult};
use std::fs;
use std::path::Path;

/// Reads a fixture from disk and parses its expectation header.
pub fn load_fixture(path: &Path) -> HarnessResult<Fixture> {
    let bytes = fs::read(path).map_err(|source| {
        HarnessError::io(
            "IO.FIXTURE_READ",
            format!("failed to read fixture '{}': {}", path.display(), source),
        )
    })?;
    // Payload below the header may use any encoding; only the header matters.
    let contents = String::from_utf8_lossy(&bytes);
    parse_fixture_header(path, &contents)
}
