use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal error classes. Per-fixture failures are never errors; they are
/// reported through [`crate::domain::Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarnessErrorCategory {
    Usage,
    Discovery,
    Fixture,
    Preflight,
    Timeout,
    Io,
    Internal,
}

impl HarnessErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "UsageError",
            Self::Discovery => "DiscoveryError",
            Self::Fixture => "FixtureError",
            Self::Preflight => "PreflightError",
            Self::Timeout => "TimeoutError",
            Self::Io => "IoError",
            Self::Internal => "InternalError",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Usage => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessError {
    category: HarnessErrorCategory,
    code: &'static str,
    message: String,
}

impl HarnessError {
    pub fn new(
        category: HarnessErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn discovery(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Discovery, code, message)
    }

    pub fn fixture(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Fixture, code, message)
    }

    pub fn preflight(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Preflight, code, message)
    }

    pub fn timeout(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Timeout, code, message)
    }

    pub fn io(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Io, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorCategory::Internal, code, message)
    }

    pub const fn category(&self) -> HarnessErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}

impl Display for HarnessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for HarnessError {}
