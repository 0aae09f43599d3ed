use crate::{
    error::Result,
    models::{ControlParameters, TransformationRequest, TransformationResult},
};
use async_trait::async_trait;

/// How a provider wants the uploaded image delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPolicy {
    /// Send the upload bytes untouched with their declared media type.
    Original,
    /// Cover-resize to the nearest supported SDXL size and send as PNG.
    MatchedDimensions,
}

#[async_trait]
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    fn input_policy(&self) -> InputPolicy;

    fn parameters(&self) -> ControlParameters;

    async fn transform(&self, request: TransformationRequest) -> Result<TransformationResult>;
}
