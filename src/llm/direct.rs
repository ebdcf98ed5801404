use super::{InvocationRequest, InvocationResult, Msg, USER_AGENT, Usage, normalize_text};
use crate::error::Result;
use crate::http::HttpClient;
use crate::resolver::ProviderKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Dated API identifier for a known model alias; anything else passes through.
pub fn model_id(model: &str) -> &str {
    match model {
        "claude-3-opus" => "claude-3-opus-20240229",
        "claude-3-sonnet" => "claude-3-sonnet-20240229",
        "claude-3-haiku" => "claude-3-haiku-20240307",
        other => other,
    }
}

pub struct DirectApiClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

// Shared with the managed-cloud client, which speaks the same body format.
#[derive(Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    /// Legacy text-completion field.
    completion: Option<String>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl MessagesResponse {
    pub(crate) fn into_text(self, provider: ProviderKind) -> Result<(String, Option<Usage>)> {
        let usage = self.usage.map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        });
        let joined = self
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        let text = if joined.trim().is_empty() {
            self.completion.unwrap_or_default()
        } else {
            joined
        };
        Ok((normalize_text(provider, &text)?, usage))
    }
}

impl DirectApiClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(ProviderKind::DirectApi, USER_AGENT, timeout)?;
        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    pub async fn generate(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        let model = model_id(&request.model);
        let body = MessagesRequest {
            model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: vec![Msg {
                role: "user",
                content: &request.content,
            }],
        };

        let url = format!("{}/messages", self.base_url);
        let resp: MessagesResponse = self
            .http
            .post_json(
                &url,
                &body,
                &[
                    ("x-api-key", self.api_key.as_str()),
                    ("anthropic-version", ANTHROPIC_VERSION),
                ],
            )
            .await
            .map_err(|e| {
                warn!("Anthropic API error: {e}");
                e
            })?;

        let (text, usage) = resp.into_text(ProviderKind::DirectApi)?;
        Ok(InvocationResult {
            text,
            provider: ProviderKind::DirectApi,
            model: model.to_string(),
            usage,
        })
    }
}
