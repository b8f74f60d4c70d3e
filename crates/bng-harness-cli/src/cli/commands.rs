use super::CliError;
use super::helpers::*;
use bng_harness_core::common::HarnessConfig;
use bng_harness_core::common::config::{
    DEFAULT_BUILD_DIR, DEFAULT_FIXTURES_ROOT, DEFAULT_TIMEOUT_SECONDS, DEFAULT_WORK_DIR,
};
use bng_harness_core::modules::suites::parser_test_app_path;
use bng_harness_core::modules::{ApiSuite, ParserSuite, combined_exit_code};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(clap::Args)]
pub(super) struct HarnessArgs {
    /// Build directory (default build/release), then arguments forwarded
    /// verbatim to every parser test invocation. Everything after BUILD_DIR is
    /// forwarded, harness options included; a leading `--` is dropped
    #[arg(value_name = "BUILD_DIR", trailing_var_arg = true)]
    target: Vec<OsString>,

    /// Fixture root holding parser/{negative,positive} and api/
    #[arg(long, value_name = "DIR", default_value = DEFAULT_FIXTURES_ROOT)]
    fixtures: PathBuf,

    /// Scratch root; parser/ and api/ below it are recreated on every run
    #[arg(long, value_name = "DIR", default_value = DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// Wall-clock limit for a single test process
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Count a timed out test as a failure instead of aborting the run
    #[arg(long)]
    timeout_not_fatal: bool,

    /// Do not run the parser fixtures
    #[arg(long)]
    skip_parser: bool,

    /// Do not run the API tests
    #[arg(long)]
    skip_api: bool,

    /// Trace every executed command and its exit code
    #[arg(long)]
    verbose: bool,

    /// Echo each captured test log after the test finishes
    #[arg(long)]
    print_logs: bool,
}

impl HarnessArgs {
    fn into_config(self) -> HarnessConfig {
        let (build_dir, extra_args) = split_target(self.target);
        HarnessConfig {
            fixtures_root: self.fixtures,
            build_dir,
            work_dir: self.work_dir,
            extra_args,
            timeout: Duration::from_secs(self.timeout),
            timeout_is_fatal: !self.timeout_not_fatal,
            echo_logs: self.print_logs,
        }
    }
}

fn split_target(target: Vec<OsString>) -> (PathBuf, Vec<OsString>) {
    let mut target = target.into_iter();
    let build_dir = target
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR), PathBuf::from);
    let mut extra_args = target.peekable();
    if extra_args.peek().is_some_and(|arg| *arg == "--") {
        extra_args.next();
    }
    (build_dir, extra_args.collect())
}

pub(super) fn run_harness_command(args: HarnessArgs) -> Result<i32, CliError> {
    init_tracing(args.verbose);
    let skip_parser = args.skip_parser;
    let skip_api = args.skip_api;

    let working_dir = current_working_dir()?;
    let config = args.into_config().resolved_against(&working_dir);
    debug!(
        "fixtures: {}, build: {}, work: {}, timeout: {}s",
        config.fixtures_root.display(),
        config.build_dir.display(),
        config.work_dir.display(),
        config.timeout.as_secs()
    );

    println!(
        "Using test application {}",
        parser_test_app_path(&config.build_dir).display()
    );

    let parser = if skip_parser {
        info!("Skipping parser tests");
        None
    } else {
        Some(run_suite_reporting(&ParserSuite::from_config(&config), &config)?)
    };

    let api = if skip_api {
        info!("Skipping API tests");
        None
    } else {
        Some(run_suite_reporting(&ApiSuite::from_config(&config), &config)?)
    };

    println!("*** Summary ***");
    println!("{}", render_domain_status("parser", parser.as_ref()));
    println!("{}", render_domain_status("API", api.as_ref()));

    let outcomes = parser.into_iter().chain(api).collect::<Vec<_>>();
    Ok(combined_exit_code(&outcomes))
}
