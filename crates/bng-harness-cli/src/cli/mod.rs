mod commands;
mod helpers;

use bng_harness_core::domain::{HarnessError, HarnessErrorCategory};
use clap::Parser;
use std::ffi::OsString;

pub fn run_from_env() -> i32 {
    let args = std::env::args_os().skip(1).collect::<Vec<_>>();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let full_args = std::iter::once(OsString::from("bng-test"))
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<OsString>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => commands::run_harness_command(cli.harness),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "bng-test",
    version,
    about = "Run the BNG parser fixtures and API tests against a build"
)]
struct Cli {
    #[command(flatten)]
    harness: commands::HarnessArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Harness(HarnessError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn diagnostic_line(&self) -> String {
        match self {
            Self::Usage(message) => message.trim_end().to_string(),
            Self::Harness(error) => error.diagnostic_line(),
            Self::Internal(error) => {
                HarnessError::internal("SYS.CLI", format!("{error:#}")).diagnostic_line()
            }
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => HarnessErrorCategory::Usage.exit_code(),
            Self::Harness(error) => error.exit_code(),
            Self::Internal(_) => 1,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(error: HarnessError) -> Self {
        Self::Harness(error)
    }
}
