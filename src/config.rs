use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const GOOSE_BASE_URL: &str = "https://api.goose.ai/v1";

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_SECRET_ARN_ENV: &str = "ANTHROPIC_SECRET_ARN";
pub const ANTHROPIC_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const GOOSE_API_KEY_ENV: &str = "GOOSE_API_KEY";
pub const GOOSE_BASE_URL_ENV: &str = "GOOSE_BASE_URL";
pub const BEDROCK_ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL_BEDROCK_RUNTIME";

/// Provider-related environment, captured once per run.
///
/// The resolver only ever sees this snapshot, never the live process
/// environment, so resolution is a function of its arguments. Ambient AWS
/// credentials are not captured here; `aws-config` discovers them when the
/// managed-cloud client connects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub anthropic_api_key: Option<String>,
    pub anthropic_secret_arn: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub goose_api_key: Option<String>,
    pub goose_base_url: Option<String>,
    pub bedrock_endpoint: Option<String>,
}

impl Environment {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            anthropic_api_key: get(ANTHROPIC_API_KEY_ENV),
            anthropic_secret_arn: get(ANTHROPIC_SECRET_ARN_ENV),
            anthropic_base_url: get(ANTHROPIC_BASE_URL_ENV),
            goose_api_key: get(GOOSE_API_KEY_ENV),
            goose_base_url: get(GOOSE_BASE_URL_ENV),
            bedrock_endpoint: get(BEDROCK_ENDPOINT_ENV),
        }
    }
}
