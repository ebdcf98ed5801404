use crate::error::{Error, Result};
use crate::resolver::ProviderKind;
use aws_config::BehaviorVersion;
use serde_json::Value;
use tracing::{debug, warn};

/// Where a client's credential comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Static key read from the environment.
    ApiKey(String),
    /// Secret-store reference (an AWS Secrets Manager ARN) holding the key.
    SecretReference(String),
    /// Ambient role credentials discovered by the cloud SDK.
    Ambient,
}

/// Secret store capable of resolving a reference to its secret string.
#[allow(async_fn_in_trait)]
pub trait SecretStore {
    async fn fetch(&self, reference: &str) -> Result<String>;
}

/// AWS Secrets Manager, using the default credential chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsSecretsManager;

impl SecretStore for AwsSecretsManager {
    async fn fetch(&self, reference: &str) -> Result<String> {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let client = aws_sdk_secretsmanager::Client::new(&shared);
        debug!(secret = reference, "fetching secret");
        let output = client
            .get_secret_value()
            .secret_id(reference)
            .send()
            .await
            .map_err(|e| {
                warn!("secret retrieval failed: {e}");
                Error::Authentication {
                    provider: ProviderKind::DirectApi,
                    message: format!("could not retrieve secret {reference}: {e}"),
                }
            })?;
        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| Error::Authentication {
                provider: ProviderKind::DirectApi,
                message: format!("secret {reference} has no string value"),
            })
    }
}

/// Resolve an API key for `provider` from `source`.
///
/// Ambient sources carry no key; callers asking for one get an
/// authentication error.
pub async fn api_key<S: SecretStore>(
    provider: ProviderKind,
    source: &CredentialSource,
    store: &S,
) -> Result<String> {
    match source {
        CredentialSource::ApiKey(key) => Ok(key.clone()),
        CredentialSource::SecretReference(reference) => {
            let raw = store.fetch(reference).await?;
            extract_api_key(&raw).ok_or_else(|| Error::Authentication {
                provider,
                message: format!(
                    "secret {reference} does not contain 'anthropic_api_key' or 'api_key'"
                ),
            })
        }
        CredentialSource::Ambient => Err(Error::Authentication {
            provider,
            message: "provider requires an API key, none configured".into(),
        }),
    }
}

/// Pull the key out of a secret string: a JSON object with
/// `anthropic_api_key` / `api_key`, a JSON string, or the raw key itself.
pub fn extract_api_key(secret: &str) -> Option<String> {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(key)) => Some(key).filter(|k| !k.is_empty()),
        Ok(Value::Object(map)) => ["anthropic_api_key", "api_key"]
            .into_iter()
            .find_map(|field| {
                map.get(field)
                    .and_then(Value::as_str)
                    .filter(|k| !k.is_empty())
            })
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
