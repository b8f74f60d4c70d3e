//! Fixture-driven test harness for the BNG parser library and its API test
//! executables.
//!
//! Fixtures are discovered on disk, each one is run through the external
//! system under test as a subprocess with a watchdog timeout, and the captured
//! log is checked against the expectations encoded in the fixture.

pub mod common;
pub mod domain;
pub mod modules;
