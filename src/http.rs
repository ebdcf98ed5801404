use crate::error::{Error, Result};
use crate::resolver::ProviderKind;
use reqwest::{Client, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-over-HTTP transport shared by the direct-api and gateway clients.
///
/// Each call is exactly one request: no retries, bounded by `timeout`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    provider: ProviderKind,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(provider: ProviderKind, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider,
            timeout,
        })
    }

    pub async fn post_json<B, R>(&self, url: &str, body: &B, headers: &[(&str, &str)]) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut req = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        debug!(provider = %self.provider, url, "sending request");
        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let text = self.handle_response(resp).await?;
        serde_json::from_str(&text)
            .map_err(|e| Error::parse(format!("{} response is not valid JSON: {e}", self.provider)))
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        if status.is_success() {
            return resp.text().await.map_err(|e| self.transport_error(e));
        }

        let retry_after = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = resp.text().await.unwrap_or_default();
        warn!(provider = %self.provider, status = status.as_u16(), "provider returned an error");
        Err(Error::from_status(
            self.provider,
            status.as_u16(),
            body,
            retry_after,
        ))
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                provider: self.provider,
                after: self.timeout,
            }
        } else {
            Error::ProviderUnavailable {
                provider: self.provider,
                message: e.to_string(),
                status_code: None,
            }
        }
    }
}
