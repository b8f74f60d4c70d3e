pub mod config;

pub use config::{HarnessConfig, exe_suffix, resolve_path};
