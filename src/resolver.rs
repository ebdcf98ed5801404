use crate::config::{
    self, ANTHROPIC_API_KEY_ENV, ANTHROPIC_SECRET_ARN_ENV, DEFAULT_MAX_TOKENS, DEFAULT_REGION,
    Environment, GOOSE_API_KEY_ENV,
};
use crate::credentials::CredentialSource;
use crate::error::{Error, Result};
use crate::schema::AgentConfig;
use crate::tools::{BUILTIN_TOOL_NAMES, unknown_tools};
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Backend family. Determines wire format, credentials and endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ProviderKind {
    /// Vendor completion API with a static key.
    #[default]
    #[serde(rename = "anthropic")]
    DirectApi,
    /// Cloud-hosted invocation API with ambient role credentials.
    #[serde(rename = "bedrock")]
    ManagedCloud,
    /// Multi-model routing endpoint.
    #[serde(rename = "goose")]
    Gateway,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::DirectApi, Self::ManagedCloud, Self::Gateway];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectApi => "anthropic",
            Self::ManagedCloud => "bedrock",
            Self::Gateway => "goose",
        }
    }

    pub fn max_tokens_limit(&self) -> u32 {
        match self {
            Self::DirectApi | Self::ManagedCloud => 4096,
            Self::Gateway => 8192,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "direct-api" | "direct" => Ok(Self::DirectApi),
            "bedrock" | "managed-cloud" => Ok(Self::ManagedCloud),
            "goose" | "gateway" => Ok(Self::Gateway),
            _ => Err(Error::UnsupportedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

/// Values given explicitly on the command line. `None` defers to the YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub region: Option<String>,
    pub tools: Option<Vec<String>>,
    pub max_tokens: Option<u32>,
}

/// The concrete provider, model and parameters chosen for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub kind: ProviderKind,
    pub model: String,
    pub region: String,
    pub max_tokens: u32,
    pub tools: Vec<String>,
    pub credential: CredentialSource,
    /// HTTP base URL for direct-api and gateway, service endpoint for managed-cloud.
    pub endpoint: String,
}

/// First present layer wins: CLI, then YAML, then the hard-coded default.
pub fn layered<T>(cli: Option<T>, yaml: Option<T>, default: T) -> T {
    cli.or(yaml).unwrap_or(default)
}

/// Resolve the provider for `config` under `overrides`.
///
/// Pure: no network access and no reads of the live process environment.
pub fn resolve(
    config: &AgentConfig,
    overrides: &CliOverrides,
    env: &Environment,
) -> Result<ResolvedProvider> {
    let kind = match overrides.provider.as_deref().or(config.provider.as_deref()) {
        Some(name) => name.parse()?,
        None => ProviderKind::default(),
    };
    let model = layered(overrides.model.clone(), Some(config.model.clone()), String::new());
    let region = layered(
        overrides.region.clone(),
        config.region.clone(),
        DEFAULT_REGION.to_string(),
    );
    let max_tokens = layered(overrides.max_tokens, config.max_tokens, DEFAULT_MAX_TOKENS);
    let tools = layered(overrides.tools.clone(), Some(config.tools.clone()), Vec::new());

    for tool in unknown_tools(&tools) {
        warn!(
            tool,
            known = ?BUILTIN_TOOL_NAMES,
            "tool not found in registry, passing it through"
        );
    }

    if model.trim().is_empty() {
        return Err(Error::config("model must not be empty"));
    }
    let limit = kind.max_tokens_limit();
    if max_tokens == 0 || max_tokens > limit {
        return Err(Error::config(format!(
            "max-tokens must be between 1 and {limit} for {kind}, got {max_tokens}"
        )));
    }

    let (credential, endpoint) = match kind {
        ProviderKind::DirectApi => {
            let credential = match (&env.anthropic_api_key, &env.anthropic_secret_arn) {
                (Some(key), _) => CredentialSource::ApiKey(key.clone()),
                (None, Some(arn)) => CredentialSource::SecretReference(arn.clone()),
                (None, None) => {
                    return Err(Error::config(format!(
                        "{kind} requires an API key: set {ANTHROPIC_API_KEY_ENV} or {ANTHROPIC_SECRET_ARN_ENV}"
                    )));
                }
            };
            let base = env
                .anthropic_base_url
                .clone()
                .unwrap_or_else(|| config::ANTHROPIC_BASE_URL.to_string());
            (credential, base)
        }
        ProviderKind::ManagedCloud => {
            let endpoint = env
                .bedrock_endpoint
                .clone()
                .unwrap_or_else(|| bedrock_endpoint(&region));
            (CredentialSource::Ambient, endpoint)
        }
        ProviderKind::Gateway => {
            let Some(key) = env.goose_api_key.clone() else {
                return Err(Error::config(format!(
                    "{kind} requires an API key: set {GOOSE_API_KEY_ENV}"
                )));
            };
            let base = env
                .goose_base_url
                .clone()
                .unwrap_or_else(|| config::GOOSE_BASE_URL.to_string());
            (CredentialSource::ApiKey(key), base)
        }
    };
    let endpoint = validate_endpoint(kind, endpoint)?;

    let resolved = ResolvedProvider {
        kind,
        model,
        region,
        max_tokens,
        tools,
        credential,
        endpoint,
    };
    debug!(
        provider = %resolved.kind,
        model = %resolved.model,
        region = %resolved.region,
        max_tokens = resolved.max_tokens,
        endpoint = %resolved.endpoint,
        "provider resolved"
    );
    Ok(resolved)
}

/// Regional Bedrock runtime endpoint.
pub fn bedrock_endpoint(region: &str) -> String {
    format!("https://bedrock-runtime.{region}.amazonaws.com")
}

fn validate_endpoint(kind: ProviderKind, endpoint: String) -> Result<String> {
    match Url::parse(&endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(endpoint.trim_end_matches('/').to_string())
        }
        Ok(_) | Err(_) => Err(Error::config(format!(
            "invalid endpoint for {kind}: '{endpoint}'"
        ))),
    }
}
