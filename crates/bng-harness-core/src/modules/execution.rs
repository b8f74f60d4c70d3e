//! Runs one system-under-test invocation with merged output capture and a
//! watchdog timeout.

use crate::common::config::DEFAULT_TIMEOUT_SECONDS;
use crate::domain::{ExecutionResult, HarnessError, HarnessResult, NO_EXIT_CODE};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

pub const TIMEOUT_MARKER: &str = "Terminated after timeout";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Where the merged stdout/stderr of the child goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stdout,
}

#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub log: LogTarget,
    pub timeout: Duration,
    pub timeout_is_fatal: bool,
    pub echo_log: bool,
}

impl ExecutionRequest {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            log: LogTarget::Stdout,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            timeout_is_fatal: true,
            echo_log: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn log_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.log = LogTarget::File(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_is_fatal(mut self, fatal: bool) -> Self {
        self.timeout_is_fatal = fatal;
        self
    }

    pub fn echo_log(mut self, echo: bool) -> Self {
        self.echo_log = echo;
        self
    }

    /// The command as it is written into the log header. Arguments that are
    /// not valid UTF-8 are shown lossily; the child still receives them as is.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs the request to completion or until the watchdog fires.
///
/// A timeout is an `Err` when the request marks it fatal; otherwise it is an
/// ordinary result with `timed_out` set and whatever exit status the killed
/// child reported.
pub fn execute(request: &ExecutionRequest) -> HarnessResult<ExecutionResult> {
    let command_line = request.command_line();
    debug!(
        "Executing: '{}' in '{}'",
        command_line,
        request.working_dir.display()
    );

    let mut sink = LogSink::open(&request.log)?;
    sink.write_header(&request.working_dir, &command_line)?;
    let (stdout, stderr) = sink.child_stdio()?;

    let child = Command::new(&request.program)
        .args(&request.args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| {
            HarnessError::io(
                "IO.SPAWN",
                format!(
                    "failed to execute '{}' in '{}': {}",
                    command_line,
                    request.working_dir.display(),
                    source
                ),
            )
        })?;

    let child = Arc::new(Mutex::new(child));
    let watchdog = Watchdog::start(Arc::clone(&child), sink.timeout_marker()?, request.timeout);
    let waited = wait_for_exit(&child);
    let timed_out = watchdog.cancel();
    let status = waited.map_err(|source| {
        HarnessError::io(
            "IO.WAIT",
            format!("failed to wait for '{}': {}", command_line, source),
        )
    })?;

    let exit_code = status.code().unwrap_or(NO_EXIT_CODE);
    debug!("Exit code: {}", exit_code);

    if request.echo_log {
        sink.echo()?;
    }

    if timed_out {
        warn!(
            "'{}' terminated after {}s timeout",
            command_line,
            request.timeout.as_secs()
        );
        if request.timeout_is_fatal {
            return Err(HarnessError::timeout(
                "RUN.TIMEOUT",
                format!(
                    "'{}' did not finish within {}s and was terminated, log: {}",
                    command_line,
                    request.timeout.as_secs(),
                    sink.display()
                ),
            ));
        }
    }

    Ok(ExecutionResult {
        exit_code,
        log_path: sink.path().map(Path::to_path_buf),
        timed_out,
    })
}

fn wait_for_exit(child: &Mutex<Child>) -> io::Result<ExitStatus> {
    loop {
        if let Some(status) = lock_child(child).try_wait()? {
            return Ok(status);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Kills the child if it outlives `timeout`. Dropping the cancel sender wakes
/// the watchdog thread immediately, so nothing outlives the invocation.
struct Watchdog {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<bool>>,
}

impl Watchdog {
    fn start(child: Arc<Mutex<Child>>, marker: TimeoutMarker, timeout: Duration) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || match cancelled.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                let mut child = lock_child(&child);
                // Exited but not yet reaped by the foreground poll.
                if matches!(child.try_wait(), Ok(Some(_))) {
                    return false;
                }
                if let Err(error) = child.kill() {
                    warn!("failed to kill timed out process: {}", error);
                }
                drop(child);
                marker.write();
                true
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        });

        Self {
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// Stops the timer and reports whether it had already fired.
    fn cancel(mut self) -> bool {
        drop(self.cancel.take());
        self.handle
            .take()
            .is_some_and(|handle| handle.join().unwrap_or(false))
    }
}

enum TimeoutMarker {
    File(File),
    Stdout,
}

impl TimeoutMarker {
    fn write(self) {
        let result = match self {
            Self::File(mut file) => writeln!(file, "{}", TIMEOUT_MARKER),
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", TIMEOUT_MARKER).and_then(|()| stdout.flush())
            }
        };
        if let Err(error) = result {
            warn!("failed to record timeout marker: {}", error);
        }
    }
}

enum LogSink {
    File { path: PathBuf, file: File },
    Stdout,
}

impl LogSink {
    fn open(target: &LogTarget) -> HarnessResult<Self> {
        match target {
            LogTarget::Stdout => Ok(Self::Stdout),
            LogTarget::File(path) => {
                let file = File::create(path).map_err(|source| {
                    HarnessError::io(
                        "IO.LOG_CREATE",
                        format!("failed to create log file '{}': {}", path.display(), source),
                    )
                })?;
                Ok(Self::File {
                    path: path.clone(),
                    file,
                })
            }
        }
    }

    fn write_header(&mut self, working_dir: &Path, command_line: &str) -> HarnessResult<()> {
        let header = format!("cwd: {}\n{}\n", working_dir.display(), command_line);
        let result = match self {
            Self::File { file, .. } => file.write_all(header.as_bytes()).and_then(|()| file.flush()),
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(header.as_bytes())
                    .and_then(|()| stdout.flush())
            }
        };
        result.map_err(|source| self.io_error("IO.LOG_WRITE", source))
    }

    /// Two handles onto the same sink so stderr interleaves with stdout.
    fn child_stdio(&self) -> HarnessResult<(Stdio, Stdio)> {
        match self {
            Self::File { file, .. } => {
                let stdout = file
                    .try_clone()
                    .map_err(|source| self.io_error("IO.LOG_CLONE", source))?;
                let stderr = file
                    .try_clone()
                    .map_err(|source| self.io_error("IO.LOG_CLONE", source))?;
                Ok((Stdio::from(stdout), Stdio::from(stderr)))
            }
            Self::Stdout => Ok((Stdio::from(io::stdout()), Stdio::from(io::stdout()))),
        }
    }

    fn timeout_marker(&self) -> HarnessResult<TimeoutMarker> {
        match self {
            Self::File { file, .. } => file
                .try_clone()
                .map(TimeoutMarker::File)
                .map_err(|source| self.io_error("IO.LOG_CLONE", source)),
            Self::Stdout => Ok(TimeoutMarker::Stdout),
        }
    }

    fn echo(&self) -> HarnessResult<()> {
        let Self::File { path, .. } = self else {
            return Ok(());
        };
        let content = fs::read(path).map_err(|source| self.io_error("IO.LOG_READ", source))?;
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&content)
            .and_then(|()| stdout.flush())
            .map_err(|source| self.io_error("IO.LOG_ECHO", source))
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Stdout => None,
        }
    }

    fn display(&self) -> String {
        self.path()
            .map_or_else(|| "<stdout>".to_string(), |path| path.display().to_string())
    }

    fn io_error(&self, code: &'static str, source: io::Error) -> HarnessError {
        HarnessError::io(
            code,
            format!("log '{}' is not usable: {}", self.display(), source),
        )
    }
}
