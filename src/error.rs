use crate::resolver::ProviderKind;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// One schema violation, addressed by its dotted path (`agent.prompts.task`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub violations: Vec<SchemaViolation>,
}

impl SchemaReport {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(SchemaViolation {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid agent configuration:\n{0}")]
    Schema(SchemaReport),

    #[error("unsupported provider '{provider}' (expected one of: anthropic, bedrock, goose)")]
    UnsupportedProvider { provider: String },

    #[error("{0}")]
    Configuration(String),

    #[error("authentication failed for {provider}: {message}")]
    Authentication {
        provider: ProviderKind,
        message: String,
    },

    #[error("rate limited by {provider}{}", rate_limit_detail(.message, .retry_after_secs))]
    RateLimit {
        provider: ProviderKind,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable {
        provider: ProviderKind,
        message: String,
        status_code: Option<u16>,
    },

    #[error("{provider} did not respond within {}s", .after.as_secs_f64())]
    Timeout {
        provider: ProviderKind,
        after: Duration,
    },

    #[error("{provider} API error ({status_code}): {message}")]
    Api {
        provider: ProviderKind,
        message: String,
        status_code: u16,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{}: {reason}", .path.display())]
    ConfigFile { path: PathBuf, reason: String },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify a non-success HTTP status returned by a provider.
    pub fn from_status(
        provider: ProviderKind,
        status_code: u16,
        body: String,
        retry_after_secs: Option<u64>,
    ) -> Self {
        match status_code {
            401 | 403 => Self::Authentication {
                provider,
                message: non_empty_or(body, "credentials rejected"),
            },
            429 => Self::RateLimit {
                provider,
                message: body.trim().to_string(),
                retry_after_secs,
            },
            500..=599 => Self::ProviderUnavailable {
                provider,
                message: non_empty_or(body, "server error"),
                status_code: Some(status_code),
            },
            _ => Self::Api {
                provider,
                message: body,
                status_code,
            },
        }
    }

    /// Category name rendered at the CLI boundary.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SchemaError",
            Self::UnsupportedProvider { .. } => "UnsupportedProviderError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Authentication { .. } => "AuthenticationError",
            Self::RateLimit { .. } => "RateLimitError",
            Self::ProviderUnavailable { .. } => "ProviderUnavailableError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Api { .. } => "ProviderError",
            Self::Parse(_) => "ProviderResponseError",
            Self::ConfigFile { .. } => "OrchestratorError",
        }
    }
}

fn non_empty_or(body: String, fallback: &str) -> String {
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body
    }
}

fn rate_limit_detail(message: &str, retry_after_secs: &Option<u64>) -> String {
    let mut detail = String::new();
    if !message.is_empty() {
        detail.push_str(": ");
        detail.push_str(message);
    }
    if let Some(secs) = retry_after_secs {
        detail.push_str(&format!(" (retry after {secs}s)"));
    }
    detail
}

pub type Result<T> = std::result::Result<T, Error>;
