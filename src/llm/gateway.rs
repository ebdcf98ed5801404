use super::{InvocationRequest, InvocationResult, Msg, USER_AGENT, Usage, normalize_text};
use crate::error::Result;
use crate::http::HttpClient;
use crate::resolver::ProviderKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const TEMPERATURE: f32 = 0.7;

/// Commonly routed models, for display only. Any identifier is forwarded.
pub const EXAMPLE_MODELS: &[&str] = &[
    "gpt-4",
    "gpt-4-turbo",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-3.5-turbo",
    "claude-3-opus",
    "claude-3-sonnet",
    "claude-3-haiku",
    "claude-3-5-sonnet",
    "gemini-pro",
    "llama-2-70b",
    "mixtral-8x7b",
];

/// Multi-model gateway speaking the OpenAI chat-completions format.
///
/// The model string is forwarded verbatim; the gateway decides what it means.
pub struct GatewayClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    content: Option<String>,
    text: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_text(self) -> Result<(String, Option<Usage>)> {
        let usage = self.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        let first = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.and_then(|m| m.content).or(c.text));
        let text = first.or(self.content).or(self.text).unwrap_or_default();
        Ok((normalize_text(ProviderKind::Gateway, &text)?, usage))
    }
}

fn messages<'a>(request: &'a InvocationRequest) -> Vec<Msg<'a>> {
    let mut messages = Vec::with_capacity(2);
    if !request.system.is_empty() {
        messages.push(Msg {
            role: "system",
            content: &request.system,
        });
    }
    messages.push(Msg {
        role: "user",
        content: &request.content,
    });
    messages
}

impl GatewayClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(ProviderKind::Gateway, USER_AGENT, timeout)?;
        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    pub async fn generate(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        let body = ChatRequest {
            model: &request.model,
            messages: messages(request),
            max_tokens: request.max_tokens,
            temperature: TEMPERATURE,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let auth = format!("Bearer {}", self.api_key);
        let resp: ChatResponse = self
            .http
            .post_json(&url, &body, &[("Authorization", auth.as_str())])
            .await
            .map_err(|e| {
                warn!("gateway API error: {e}");
                e
            })?;

        let (text, usage) = resp.into_text()?;
        Ok(InvocationResult {
            text,
            provider: ProviderKind::Gateway,
            model: request.model.clone(),
            usage,
        })
    }
}
