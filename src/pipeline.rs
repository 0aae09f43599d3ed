use std::sync::Arc;

use crate::{
    error::Result,
    intake::TransientAsset,
    logger,
    models::{ImagePayload, TransformationRequest, TransformationResult},
    preprocess,
    providers::{InputPolicy, Transformer},
};

/// Turns a stored upload into a transformed image using the configured provider.
#[derive(Clone)]
pub struct TransformPipeline {
    transformer: Arc<dyn Transformer>,
}

impl TransformPipeline {
    pub fn new(transformer: Arc<dyn Transformer>) -> Self {
        Self { transformer }
    }

    pub fn provider(&self) -> &str {
        self.transformer.name()
    }

    /// Builds the request the provider expects from the stored bytes.
    pub async fn build_request(&self, asset: &TransientAsset) -> Result<TransformationRequest> {
        let bytes = asset.read().await?;
        let image = match self.transformer.input_policy() {
            InputPolicy::Original => ImagePayload::new(bytes, asset.asset().media_type.clone()),
            InputPolicy::MatchedDimensions => {
                let prepared = preprocess::prepare_for_model_blocking(bytes).await?;
                log::info!(
                    "🖼️  Resized {} from {} to {}",
                    asset.asset().id,
                    prepared.original,
                    prepared.target
                );
                ImagePayload::new(prepared.bytes, prepared.media_type)
            }
        };
        Ok(TransformationRequest::zombie(
            image,
            self.transformer.parameters(),
        ))
    }

    /// Runs the transformation and always releases the upload, whatever the outcome.
    pub async fn run(&self, asset: TransientAsset) -> Result<TransformationResult> {
        log::info!(
            "🧟 Starting zombie transformation of {} via {}",
            asset.asset().id,
            self.provider()
        );

        let outcome = async {
            let request = self.build_request(&asset).await?;
            let _timer = logger::timer(&format!("{} transformation", self.provider()));
            self.transformer.transform(request).await
        }
        .await;

        asset.release().await;

        match &outcome {
            Ok(_) => log::info!("✅ Transformation complete"),
            Err(e) => log::error!("❌ Transformation failed: {}", e),
        }
        outcome
    }
}
