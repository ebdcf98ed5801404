//! Read, validate and resolve a config, then make exactly one provider call.

use crate::config::{DEFAULT_TIMEOUT, Environment};
use crate::credentials::{AwsSecretsManager, SecretStore};
use crate::error::{Error, Result};
use crate::llm::{InvocationRequest, InvocationResult, ModelClient};
use crate::resolver::{self, CliOverrides, ResolvedProvider};
use crate::schema::{self, AgentConfig};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Per-run arguments taken from the command line.
#[derive(Debug, Clone)]
pub struct InvocationArgs {
    pub input: String,
    pub overrides: CliOverrides,
    pub timeout: Duration,
}

impl InvocationArgs {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            overrides: CliOverrides::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Read, parse and validate the agent configuration at `path`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::config_file(path, "configuration file not found"),
        _ => Error::config_file(path, format!("failed to read configuration file: {e}")),
    })?;
    if text.trim().is_empty() {
        return Err(Error::config_file(path, "configuration file is empty"));
    }
    let document = schema::parse_document(&text)
        .map_err(|e| Error::config_file(path, format!("invalid YAML: {e}")))?;
    let config = schema::validate(&document)?;
    info!(agent = %config.name, path = %path.display(), "configuration validated");
    Ok(config)
}

/// Everything up to, but not including, the network call.
pub fn prepare(
    path: &Path,
    args: &InvocationArgs,
    env: &Environment,
) -> Result<(ResolvedProvider, InvocationRequest)> {
    let config = load_config(path)?;
    let resolved = resolver::resolve(&config, &args.overrides, env)?;
    let request = InvocationRequest::new(&resolved, &config, &args.input);
    Ok((resolved, request))
}

/// Run one invocation end to end, resolving secret references through AWS
/// Secrets Manager.
pub async fn run(
    path: &Path,
    args: &InvocationArgs,
    env: &Environment,
) -> Result<InvocationResult> {
    run_with_store(path, args, env, &AwsSecretsManager).await
}

pub async fn run_with_store<S: SecretStore>(
    path: &Path,
    args: &InvocationArgs,
    env: &Environment,
    store: &S,
) -> Result<InvocationResult> {
    let (resolved, request) = prepare(path, args, env)?;
    info!(provider = %resolved.kind, model = %resolved.model, "invoking agent");
    let client = ModelClient::connect(&resolved, store, args.timeout).await?;
    client.generate(&request).await
}
