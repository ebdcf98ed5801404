pub mod bedrock;
pub mod direct;
pub mod gateway;

use crate::credentials::{self, SecretStore};
use crate::error::{Error, Result};
use crate::resolver::{ProviderKind, ResolvedProvider};
use crate::schema::AgentConfig;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub use bedrock::ManagedCloudClient;
pub use direct::DirectApiClient;
pub use gateway::GatewayClient;

pub const USER_AGENT: &str = concat!("agentkit/", env!("CARGO_PKG_VERSION"));

/// Everything a provider needs for one generation, in provider-neutral shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub provider: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    /// Sets the model's role.
    pub system: String,
    pub task: String,
    pub input: String,
    /// User-turn content: task text followed by the user input.
    pub content: String,
    pub tools: Vec<String>,
}

impl InvocationRequest {
    pub fn new(resolved: &ResolvedProvider, config: &AgentConfig, input: &str) -> Self {
        Self {
            provider: resolved.kind,
            model: resolved.model.clone(),
            max_tokens: resolved.max_tokens,
            system: config.prompts.system.clone(),
            task: config.prompts.task.clone(),
            input: input.to_string(),
            content: user_content(&config.prompts.task, input),
            tools: resolved.tools.clone(),
        }
    }

    /// The full prompt in template order: system, then task, then input.
    pub fn transcript(&self) -> String {
        if self.system.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n\n{}", self.system.trim_end(), self.content)
        }
    }
}

/// Task text and user input, separated by a blank line.
pub fn user_content(task: &str, input: &str) -> String {
    let task = task.trim_end();
    let input = input.trim();
    if input.is_empty() {
        task.to_string()
    } else {
        format!("{task}\n\n{input}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "response")]
    pub text: String,
    pub provider: ProviderKind,
    /// Model identifier sent on the wire.
    pub model: String,
    pub usage: Option<Usage>,
}

/// One of the supported provider clients. Callers only use [`generate`](Self::generate).
pub enum ModelClient {
    Direct(DirectApiClient),
    ManagedCloud(ManagedCloudClient),
    Gateway(GatewayClient),
}

impl ModelClient {
    /// Build the client for `resolved`, pulling its credential through `store`
    /// when it is a secret reference.
    pub async fn connect<S: SecretStore>(
        resolved: &ResolvedProvider,
        store: &S,
        timeout: Duration,
    ) -> Result<Self> {
        debug!(provider = %resolved.kind, endpoint = %resolved.endpoint, "connecting model client");
        match resolved.kind {
            ProviderKind::DirectApi => {
                let key = credentials::api_key(resolved.kind, &resolved.credential, store).await?;
                Ok(Self::Direct(DirectApiClient::new(
                    key,
                    resolved.endpoint.clone(),
                    timeout,
                )?))
            }
            ProviderKind::ManagedCloud => Ok(Self::ManagedCloud(
                ManagedCloudClient::connect(&resolved.region, &resolved.endpoint, timeout).await,
            )),
            ProviderKind::Gateway => {
                let key = credentials::api_key(resolved.kind, &resolved.credential, store).await?;
                Ok(Self::Gateway(GatewayClient::new(
                    key,
                    resolved.endpoint.clone(),
                    timeout,
                )?))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Direct(_) => ProviderKind::DirectApi,
            Self::ManagedCloud(_) => ProviderKind::ManagedCloud,
            Self::Gateway(_) => ProviderKind::Gateway,
        }
    }

    /// Exactly one outbound call; failures come back classified, never retried.
    pub async fn generate(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        info!(
            provider = %self.kind(),
            model = %request.model,
            max_tokens = request.max_tokens,
            "generating response"
        );
        debug!(
            system_len = request.system.len(),
            content_len = request.content.len(),
            tools = ?request.tools,
            "request shape"
        );
        let started = std::time::Instant::now();
        let result = match self {
            Self::Direct(c) => c.generate(request).await,
            Self::ManagedCloud(c) => c.generate(request).await,
            Self::Gateway(c) => c.generate(request).await,
        }?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );
        Ok(result)
    }
}

#[derive(Serialize)]
pub(crate) struct Msg<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Trim provider text; an empty completion is a malformed response.
pub(crate) fn normalize_text(provider: ProviderKind, text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        Err(Error::parse(format!("no text content in {provider} response")))
    } else {
        Ok(text.to_string())
    }
}
