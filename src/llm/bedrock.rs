use super::direct::MessagesResponse;
use super::{InvocationRequest, InvocationResult, Msg, Usage};
use crate::error::{Error, Result};
use crate::resolver::ProviderKind;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::config::http::HttpResponse;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_bedrockruntime::primitives::Blob;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const MODEL_TIMEOUT_CODE: &str = "ModelTimeoutException";

/// Bedrock model ID for a known alias; anything else is taken as a model ID.
pub fn model_id(model: &str) -> &str {
    match model {
        "claude-3-opus" => "anthropic.claude-3-opus-20240229-v1:0",
        "claude-3-sonnet" => "anthropic.claude-3-sonnet-20240229-v1:0",
        "claude-3-haiku" => "anthropic.claude-3-haiku-20240307-v1:0",
        other => other,
    }
}

#[derive(Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

pub fn request_body(request: &InvocationRequest) -> Result<Vec<u8>> {
    let body = InvokeBody {
        anthropic_version: BEDROCK_ANTHROPIC_VERSION,
        max_tokens: request.max_tokens,
        system: &request.system,
        messages: vec![Msg {
            role: "user",
            content: &request.content,
        }],
    };
    serde_json::to_vec(&body).map_err(|e| Error::parse(format!("serialize request: {e}")))
}

pub fn parse_response(bytes: &[u8]) -> Result<(String, Option<Usage>)> {
    let resp: MessagesResponse = serde_json::from_slice(bytes)
        .map_err(|e| Error::parse(format!("parse Bedrock response: {e}")))?;
    resp.into_text(ProviderKind::ManagedCloud)
}

/// Bedrock `InvokeModel` client authenticated with ambient AWS credentials.
pub struct ManagedCloudClient {
    client: Client,
    timeout: Duration,
}

impl ManagedCloudClient {
    /// Load ambient credentials and bind the client to `region` at `endpoint`.
    /// SDK retries are disabled; the whole operation is bounded by `timeout`.
    pub async fn connect(region: &str, endpoint: &str, timeout: Duration) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .load()
            .await;
        debug!(region, endpoint, "Bedrock client configured");
        Self::from_client(Client::new(&shared), timeout)
    }

    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn generate(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        let model = model_id(&request.model);
        let body = request_body(request)?;

        let output = self
            .client
            .invoke_model()
            .model_id(model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                let err = classify(e, self.timeout);
                warn!("Bedrock API error: {err}");
                err
            })?;

        let (text, usage) = parse_response(output.body().as_ref())?;
        Ok(InvocationResult {
            text,
            provider: ProviderKind::ManagedCloud,
            model: model.to_string(),
            usage,
        })
    }
}

fn classify<E>(err: SdkError<E, HttpResponse>, timeout: Duration) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let provider = ProviderKind::ManagedCloud;
    match &err {
        SdkError::ServiceError(ctx) => {
            let raw = ctx.raw();
            let retry_after = raw
                .headers()
                .get("retry-after")
                .and_then(|v| v.trim().parse().ok());
            let status = raw.status().as_u16();
            if status == 408 || ctx.err().code() == Some(MODEL_TIMEOUT_CODE) {
                return Error::Timeout {
                    provider,
                    after: timeout,
                };
            }
            let message = ctx
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
            Error::from_status(provider, status, message, retry_after)
        }
        SdkError::TimeoutError(_) => Error::Timeout {
            provider,
            after: timeout,
        },
        SdkError::DispatchFailure(failure) if failure.is_timeout() => Error::Timeout {
            provider,
            after: timeout,
        },
        SdkError::ResponseError(_) => {
            Error::parse(format!("unreadable Bedrock response: {}", DisplayErrorContext(&err)))
        }
        _ => {
            let detail = DisplayErrorContext(&err).to_string();
            if is_credential_failure(&detail) {
                Error::Authentication {
                    provider,
                    message: format!("no usable AWS credentials: {detail}"),
                }
            } else {
                Error::ProviderUnavailable {
                    provider,
                    message: detail,
                    status_code: None,
                }
            }
        }
    }
}

/// Identity resolution failed before the request was sent: no credential
/// chain produced credentials, or no auth scheme had an identity to sign with.
fn is_credential_failure(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    ["no identity resolver", "failed to select an auth scheme", "credential"]
        .iter()
        .any(|marker| detail.contains(marker))
}
