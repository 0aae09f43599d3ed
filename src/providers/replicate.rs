use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    config::ReplicateConfig,
    error::{Result, ZombieError},
    models::{ControlParameters, TransformationRequest, TransformationResult},
    providers::{
        build_http_client, json_or_error, transport_error,
        traits::{InputPolicy, Transformer},
    },
};

const PROVIDER: &str = "replicate";

/// Runs a hosted model on Replicate and returns the first output URL.
pub struct ReplicateTransformer {
    client: Client,
    api_base: String,
    api_token: String,
    model: String,
    poll_interval: Duration,
}

impl ReplicateTransformer {
    pub fn new(config: ReplicateConfig, timeout: Option<Duration>) -> Result<Self> {
        let api_token = config
            .api_token
            .ok_or_else(|| ZombieError::Config("REPLICATE_API_TOKEN is required".into()))?;

        Ok(Self {
            client: build_http_client(PROVIDER, timeout)?,
            api_base: config.api_base,
            api_token,
            model: config.model,
            poll_interval: config.poll_interval,
        })
    }

    /// `owner/name` runs the model's latest version; `owner/name:version` pins one.
    fn prediction_target(&self, input: Value) -> (String, Value) {
        match self.model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.api_base),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.api_base, self.model),
                json!({ "input": input }),
            ),
        }
    }

    fn build_input(request: &TransformationRequest) -> Value {
        json!({
            "prompt": request.prompt,
            "image": request.image.to_data_url(),
            "prompt_strength": request.parameters.strength,
            "num_inference_steps": request.parameters.steps,
            "guidance_scale": request.parameters.guidance_scale,
            "output_format": "png",
            "output_quality": 90
        })
    }

    async fn poll(&self, mut prediction: Value) -> Result<Value> {
        loop {
            match prediction_status(&prediction).as_str() {
                "succeeded" => return Ok(prediction),
                "failed" | "canceled" => {
                    let detail = prediction
                        .get("error")
                        .filter(|error| !error.is_null())
                        .map(|error| match error {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| format!("prediction {}", prediction_status(&prediction)));
                    return Err(ZombieError::transformation(PROVIDER, None, detail));
                }
                _ => {}
            }

            let poll_url = prediction
                .get("urls")
                .and_then(|urls| urls.get("get"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ZombieError::transformation(PROVIDER, None, "prediction is missing a poll URL")
                })?;

            log::debug!(
                "Prediction {} is {}, polling again in {:?}",
                prediction.get("id").and_then(Value::as_str).unwrap_or("?"),
                prediction_status(&prediction),
                self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&poll_url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER, e))?;
            prediction = json_or_error(PROVIDER, response).await?;
        }
    }
}

fn prediction_status(prediction: &Value) -> String {
    prediction
        .get("status")
        .and_then(Value::as_str)
        .map(|status| status.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Models return either a single output or a list of them; the first one is the image.
pub fn first_output(output: &Value) -> Option<String> {
    let first = match output {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match first {
        Value::String(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[async_trait]
impl Transformer for ReplicateTransformer {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn input_policy(&self) -> InputPolicy {
        InputPolicy::Original
    }

    fn parameters(&self) -> ControlParameters {
        ControlParameters::REPLICATE
    }

    async fn transform(&self, request: TransformationRequest) -> Result<TransformationResult> {
        let (endpoint, payload) = self.prediction_target(Self::build_input(&request));
        log::info!("Creating {} prediction with model {}", PROVIDER, self.model);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let prediction = json_or_error(PROVIDER, response).await?;
        let prediction = self.poll(prediction).await?;

        let url = prediction
            .get("output")
            .and_then(first_output)
            .ok_or_else(|| {
                ZombieError::transformation(PROVIDER, None, "prediction returned no output image")
            })?;
        Ok(TransformationResult::remote(url))
    }
}
