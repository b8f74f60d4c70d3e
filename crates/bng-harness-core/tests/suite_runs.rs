#![cfg(unix)]

use bng_harness_core::common::HarnessConfig;
use bng_harness_core::domain::{HarnessErrorCategory, RunTally, VerdictFailure};
use bng_harness_core::modules::suites::{api_test_path, parser_test_app_path};
use bng_harness_core::modules::{
    ApiSuite, CaseReport, ParserSuite, combined_exit_code, run_suite,
};
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Stand-in for the parser test application. Echoes its arguments and the
/// fixture payload below the header, exits 1 on `syntax error` and hangs on
/// `hang forever`.
const FAKE_PARSER_APP: &str = r#"fixture="$1"
shift
echo "args: $*"
grep -v '^#' "$fixture"
if grep -q 'hang forever' "$fixture"; then exec sleep 60; fi
if grep -q 'syntax error' "$fixture"; then echo "error: syntax error in $fixture" 1>&2; exit 1; fi
exit 0"#;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn write_script(path: &Path, body: &str) {
    write_file(path, &format!("#!/bin/sh\n{}\n", body));
    let mut permissions = fs::metadata(path)
        .expect("script metadata should be readable")
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("script should be executable");
}

struct Layout {
    _temp: TempDir,
    config: HarnessConfig,
}

impl Layout {
    fn new() -> Self {
        let temp = TempDir::new().expect("tempdir should be created");
        let root = temp.path().to_path_buf();
        let config = HarnessConfig {
            fixtures_root: root.join("test"),
            build_dir: root.join("build"),
            work_dir: root.join("work"),
            ..HarnessConfig::default()
        };
        fs::create_dir_all(config.fixtures_root.join("parser/negative"))
            .expect("negative dir should be created");
        fs::create_dir_all(config.fixtures_root.join("parser/positive"))
            .expect("positive dir should be created");
        fs::create_dir_all(config.fixtures_root.join("api/shared"))
            .expect("shared dir should be created");
        Self {
            _temp: temp,
            config,
        }
    }

    fn parser_fixture(&self, set: &str, name: &str, content: &str) -> PathBuf {
        let path = self.config.fixtures_root.join("parser").join(set).join(name);
        write_file(&path, content);
        path
    }

    fn install_parser_app(&self) {
        write_script(&parser_test_app_path(&self.config.build_dir), FAKE_PARSER_APP);
    }

    fn api_test(&self, name: &str, body: &str) {
        fs::create_dir_all(self.config.fixtures_root.join("api").join(name))
            .expect("api fixture dir should be created");
        write_script(&api_test_path(&self.config.build_dir, name), body);
    }
}

fn collect_lines(reports: &mut Vec<(String, bool)>) -> impl FnMut(&CaseReport) + '_ {
    move |report: &CaseReport| reports.push((report.case.name.clone(), report.verdict.passed))
}

#[test]
fn parser_suite_tallies_every_fixture_in_sorted_order() {
    let _guard = serial();
    let layout = Layout::new();
    layout.install_parser_app();
    layout.parser_fixture("positive", "0002_plain.bngl", "# OK\nbegin model\nend model\n");
    layout.parser_fixture(
        "negative",
        "0001_syntax.bngl",
        "# FAIL\n# OUTPUT: syntax error\nbegin model\nsyntax error here\n",
    );
    layout.parser_fixture(
        "positive",
        "0003_outputs.bngl",
        "# OK\n# OUTPUT: hello\n# OUTPUT: world\nhello world\n",
    );
    layout.parser_fixture(
        "positive",
        "0004_missing.bngl",
        "# OK\n# OUTPUT: hello\n# OUTPUT: world\nhello there\n",
    );
    layout.parser_fixture("positive", "notes.txt", "not a fixture");

    let suite = ParserSuite::from_config(&layout.config);
    let mut seen = Vec::new();
    let outcome = run_suite(&suite, &layout.config.work_dir, collect_lines(&mut seen))
        .expect("suite should run");

    assert_eq!(
        seen,
        vec![
            ("0001_syntax.bngl".to_string(), true),
            ("0002_plain.bngl".to_string(), true),
            ("0003_outputs.bngl".to_string(), true),
            ("0004_missing.bngl".to_string(), false),
        ]
    );
    assert_eq!(outcome.tally, RunTally { total: 4, failed: 1 });
    assert_eq!(outcome.exit_code(), 1);

    let missing = &outcome.cases[3].verdict;
    assert_eq!(
        missing.failure,
        Some(VerdictFailure::MissingOutput {
            expected: "world".to_string()
        })
    );
    let log_path = layout.config.work_dir.join("parser/0004_missing.bngl.log");
    assert_eq!(missing.log_path.as_deref(), Some(log_path.as_path()));
    assert!(log_path.is_file());
}

#[test]
fn parser_suite_forwards_extra_args_and_passes_clean_run() {
    let _guard = serial();
    let mut layout = Layout::new();
    layout.config.extra_args = vec!["-v".into(), "--dump".into()];
    layout.install_parser_app();
    layout.parser_fixture("positive", "a.bngl", "# OK\n# OUTPUT: args: -v --dump\nbody\n");

    let suite = ParserSuite::from_config(&layout.config);
    let outcome = run_suite(&suite, &layout.config.work_dir, |_: &CaseReport| {})
        .expect("suite should run");
    assert_eq!(outcome.tally, RunTally { total: 1, failed: 0 });
    assert_eq!(outcome.exit_code(), 0);

    let log = fs::read_to_string(layout.config.work_dir.join("parser/a.bngl.log"))
        .expect("log should be readable");
    assert!(log.starts_with(&format!(
        "cwd: {}\n",
        layout.config.work_dir.join("parser").display()
    )));
}

#[test]
fn non_utf8_fixture_paths_and_args_reach_the_app_unchanged() {
    let _guard = serial();
    let mut layout = Layout::new();
    let raw_arg = OsStr::from_bytes(b"--tag=\xff");
    layout.config.extra_args = vec![raw_arg.to_os_string()];
    layout.install_parser_app();
    let fixture = layout
        .config
        .fixtures_root
        .join("parser/positive")
        .join(OsStr::from_bytes(b"0001_caf\xe9.bngl"));
    write_file(&fixture, "# OK\n# OUTPUT: payload reached\npayload reached\n");

    let suite = ParserSuite::from_config(&layout.config);
    let outcome = run_suite(&suite, &layout.config.work_dir, |_: &CaseReport| {})
        .expect("suite should run");
    assert_eq!(outcome.tally, RunTally { total: 1, failed: 0 });

    let log_path = outcome.cases[0]
        .verdict
        .log_path
        .clone()
        .expect("parser runs log to a file");
    let log = fs::read(log_path).expect("log should be readable");
    assert!(log.windows(11).any(|window| window == b"args: --tag"));
    assert!(log.windows(7).any(|window| window == b"=\xff\npayl"));
}

#[test]
fn malformed_header_aborts_remaining_fixtures() {
    let _guard = serial();
    let layout = Layout::new();
    layout.install_parser_app();
    layout.parser_fixture("negative", "0001.bngl", "# FAIL\nsyntax error\n");
    layout.parser_fixture("negative", "0002.bngl", "no header at all\n");
    layout.parser_fixture("positive", "0003.bngl", "# OK\n");

    let suite = ParserSuite::from_config(&layout.config);
    let mut seen = Vec::new();
    let error = run_suite(&suite, &layout.config.work_dir, collect_lines(&mut seen))
        .expect_err("malformed header should be fatal");

    assert_eq!(error.category(), HarnessErrorCategory::Fixture);
    assert_eq!(seen, vec![("0001.bngl".to_string(), true)]);
    assert!(!layout.config.work_dir.join("parser/0003.bngl.log").exists());
}

#[test]
fn missing_parser_app_is_fatal_before_any_fixture_runs() {
    let _guard = serial();
    let layout = Layout::new();
    layout.parser_fixture("positive", "a.bngl", "# OK\n");

    let suite = ParserSuite::from_config(&layout.config);
    let error = run_suite(&suite, &layout.config.work_dir, |_: &CaseReport| {
        panic!("no fixture should run")
    })
    .expect_err("missing app should be fatal");
    assert_eq!(error.category(), HarnessErrorCategory::Preflight);
}

#[test]
fn non_fatal_timeout_counts_as_failure_and_run_continues() {
    let _guard = serial();
    let mut layout = Layout::new();
    layout.config.timeout = Duration::from_secs(1);
    layout.config.timeout_is_fatal = false;
    layout.install_parser_app();
    layout.parser_fixture("positive", "0001_hang.bngl", "# OK\nhang forever\n");
    layout.parser_fixture("positive", "0002_ok.bngl", "# OK\n");

    let suite = ParserSuite::from_config(&layout.config);
    let outcome = run_suite(&suite, &layout.config.work_dir, |_: &CaseReport| {})
        .expect("non-fatal timeout should not abort");

    assert_eq!(outcome.tally, RunTally { total: 2, failed: 1 });
    assert_eq!(outcome.cases[0].verdict.failure, Some(VerdictFailure::TimedOut));
    let log = fs::read_to_string(layout.config.work_dir.join("parser/0001_hang.bngl.log"))
        .expect("log should be readable");
    assert!(log.contains("Terminated after timeout"));
}

#[test]
fn api_suite_runs_each_executable_and_keeps_logs_domain_scoped() {
    let _guard = serial();
    let layout = Layout::new();
    layout.install_parser_app();
    layout.parser_fixture("positive", "0000_unimol_rxn.bngl", "# OK\n");
    layout.api_test("0000_unimol_rxn", "echo api pass\nexit 0");
    layout.api_test("0010_dump_complex_graph", "echo api failure 1>&2\nexit 2");

    let parser = run_suite(
        &ParserSuite::from_config(&layout.config),
        &layout.config.work_dir,
        |_: &CaseReport| {},
    )
    .expect("parser suite should run");
    let api = run_suite(
        &ApiSuite::from_config(&layout.config),
        &layout.config.work_dir,
        |_: &CaseReport| {},
    )
    .expect("api suite should run");

    assert_eq!(parser.exit_code(), 0);
    assert_eq!(api.tally, RunTally { total: 2, failed: 1 });
    assert_eq!(
        api.cases[1].verdict.failure,
        Some(VerdictFailure::ExitCodeMismatch {
            observed: 2,
            expected: 0
        })
    );
    assert_eq!(combined_exit_code(&[parser, api]), 1);

    let parser_log = layout.config.work_dir.join("parser/0000_unimol_rxn.bngl.log");
    let api_log = layout.config.work_dir.join("api/0000_unimol_rxn.log");
    assert!(parser_log.is_file());
    assert!(api_log.is_file());
    assert!(
        fs::read_to_string(&api_log)
            .expect("log should be readable")
            .contains("api pass")
    );
}

#[test]
fn api_suite_requires_every_executable_up_front() {
    let _guard = serial();
    let layout = Layout::new();
    layout.api_test("0000_unimol_rxn", "exit 0");
    fs::create_dir_all(layout.config.fixtures_root.join("api/0100_generate_network_simple"))
        .expect("dir should be created");

    let error = run_suite(
        &ApiSuite::from_config(&layout.config),
        &layout.config.work_dir,
        |_: &CaseReport| panic!("no API test should run"),
    )
    .expect_err("missing executable should be fatal");
    assert_eq!(error.category(), HarnessErrorCategory::Preflight);
    assert!(error.message().contains("0100_generate_network_simple"));
}
