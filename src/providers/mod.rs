pub mod replicate;
pub mod stability;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::{
    config::{Config, ProviderConfig},
    error::{Result, ZombieError},
};

pub use replicate::ReplicateTransformer;
pub use stability::StabilityTransformer;
pub use traits::{InputPolicy, Transformer};

const MAX_ERROR_BODY_CHARS: usize = 2000;

/// Builds the transformer selected by configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn Transformer>> {
    let provider = config.provider.as_ref().ok_or_else(|| {
        ZombieError::Config(
            "No transformation provider configured (set REPLICATE_API_TOKEN or STABILITY_API_KEY)"
                .into(),
        )
    })?;

    let transformer: Arc<dyn Transformer> = match provider {
        ProviderConfig::Replicate(replicate) => Arc::new(ReplicateTransformer::new(
            replicate.clone(),
            config.upstream_timeout,
        )?),
        ProviderConfig::Stability(stability) => Arc::new(StabilityTransformer::new(
            stability.clone(),
            config.upstream_timeout,
        )?),
    };
    Ok(transformer)
}

pub(crate) fn build_http_client(provider: &str, timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| {
        ZombieError::Config(format!("Failed to build {} HTTP client: {}", provider, e))
    })
}

pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ZombieError {
    ZombieError::transformation(
        provider,
        err.status().map(|status| status.as_u16()),
        format!("request failed: {}", err),
    )
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

/// Turns a non-2xx response into an error carrying the status, its reason phrase, and the body.
pub(crate) async fn error_from_response(provider: &str, response: Response) -> ZombieError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    ZombieError::transformation(
        provider,
        Some(status.as_u16()),
        format!("{}: {}", reason, truncate_text(body.trim(), MAX_ERROR_BODY_CHARS)),
    )
}

pub(crate) async fn json_or_error(provider: &str, response: Response) -> Result<Value> {
    if !response.status().is_success() {
        return Err(error_from_response(provider, response).await);
    }
    let status = response.status().as_u16();
    response.json::<Value>().await.map_err(|e| {
        ZombieError::transformation(provider, Some(status), format!("invalid JSON body: {}", e))
    })
}
