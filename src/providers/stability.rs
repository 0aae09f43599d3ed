use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::ACCEPT,
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;

use crate::{
    config::StabilityConfig,
    error::{Result, ZombieError},
    models::{ControlParameters, TransformationRequest, TransformationResult},
    providers::{
        build_http_client, error_from_response, transport_error,
        traits::{InputPolicy, Transformer},
    },
};

const PROVIDER: &str = "stability";

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: Option<String>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

/// SDXL image-to-image on the Stability v1 REST API.
pub struct StabilityTransformer {
    client: Client,
    api_base: String,
    api_key: String,
    engine: String,
}

impl StabilityTransformer {
    pub fn new(config: StabilityConfig, timeout: Option<Duration>) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| ZombieError::Config("STABILITY_API_KEY is required".into()))?;

        Ok(Self {
            client: build_http_client(PROVIDER, timeout)?,
            api_base: config.api_base,
            api_key,
            engine: config.engine,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/image-to-image",
            self.api_base, self.engine
        )
    }

    fn build_form(request: TransformationRequest) -> Result<Form> {
        let params = request.parameters;
        let init_image = Part::bytes(request.image.bytes)
            .file_name("init_image.png")
            .mime_str(&request.image.media_type)
            .map_err(|e| ZombieError::transformation(PROVIDER, None, e.to_string()))?;

        let mut form = Form::new()
            .part("init_image", init_image)
            .text("init_image_mode", "IMAGE_STRENGTH")
            .text("image_strength", params.strength.to_string())
            .text("text_prompts[0][text]", request.prompt)
            .text("text_prompts[0][weight]", "1");
        if let Some(negative) = request.negative_prompt {
            form = form
                .text("text_prompts[1][text]", negative)
                .text("text_prompts[1][weight]", "-1");
        }
        Ok(form
            .text("cfg_scale", params.guidance_scale.to_string())
            .text("steps", params.steps.to_string())
            .text("samples", params.samples.to_string()))
    }
}

#[async_trait]
impl Transformer for StabilityTransformer {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn input_policy(&self) -> InputPolicy {
        InputPolicy::MatchedDimensions
    }

    fn parameters(&self) -> ControlParameters {
        ControlParameters::STABILITY
    }

    async fn transform(&self, request: TransformationRequest) -> Result<TransformationResult> {
        let endpoint = self.endpoint();
        log::info!("Calling {} engine {}", PROVIDER, self.engine);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .multipart(Self::build_form(request)?)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(PROVIDER, response).await);
        }

        let status = response.status().as_u16();
        let body: GenerationResponse = response.json().await.map_err(|e| {
            ZombieError::transformation(PROVIDER, Some(status), format!("invalid JSON body: {}", e))
        })?;

        let artifact = body.artifacts.into_iter().next().ok_or_else(|| {
            ZombieError::transformation(PROVIDER, Some(status), "response contained no artifacts")
        })?;
        if artifact.finish_reason.as_deref() == Some("ERROR") {
            return Err(ZombieError::transformation(
                PROVIDER,
                Some(status),
                "generation finished with ERROR",
            ));
        }
        let base64 = artifact
            .base64
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                ZombieError::transformation(PROVIDER, Some(status), "artifact has no image data")
            })?;

        Ok(TransformationResult::inline_png(base64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImagePayload;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transformer(server: &MockServer) -> StabilityTransformer {
        StabilityTransformer::new(
            StabilityConfig::new()
                .with_credentials("sk-test")
                .with_api_base(server.uri()),
            None,
        )
        .unwrap()
    }

    fn request() -> TransformationRequest {
        TransformationRequest::zombie(
            ImagePayload::new(b"png bytes".to_vec(), "image/png"),
            ControlParameters::STABILITY,
        )
    }

    #[tokio::test]
    async fn test_multipart_fields_and_inline_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/generation/stable-diffusion-xl-1024-v1-0/image-to-image",
            ))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("IMAGE_STRENGTH"))
            .and(body_string_contains("name=\"image_strength\"\r\n\r\n0.35"))
            .and(body_string_contains("name=\"text_prompts[1][weight]\"\r\n\r\n-1"))
            .and(body_string_contains("name=\"cfg_scale\"\r\n\r\n7"))
            .and(body_string_contains("name=\"steps\"\r\n\r\n30"))
            .and(body_string_contains("name=\"samples\"\r\n\r\n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artifacts": [
                    { "base64": "iVBORw0KGgo=", "seed": 42, "finishReason": "SUCCESS" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = transformer(&server).transform(request()).await.unwrap();
        assert_eq!(result.src(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_non_success_carries_status_text_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("{\"message\":\"invalid api key\"}"),
            )
            .mount(&server)
            .await;

        let err = transformer(&server).transform(request()).await.unwrap_err();
        match err {
            ZombieError::Transformation {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "stability");
                assert_eq!(status, Some(401));
                assert!(message.starts_with("Unauthorized"));
                assert!(message.contains("invalid api key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_artifacts_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "artifacts": [] })))
            .mount(&server)
            .await;

        let err = transformer(&server).transform(request()).await.unwrap_err();
        assert!(err.to_string().contains("no artifacts"));
    }
}
