pub mod aggregator;
pub mod discovery;
pub mod execution;
pub mod fixture;
pub mod suites;
pub mod verdict;

mod traits;

pub use aggregator::{CaseReport, SuiteOutcome, combined_exit_code, run_suite};
pub use execution::{ExecutionRequest, LogTarget, TIMEOUT_MARKER, execute};
pub use suites::{ApiSuite, ParserSuite};
pub use traits::{FixtureCase, FixtureSuite};
