use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

pub const ZOMBIE_PROMPT: &str = "zombie transformation, decaying flesh, pale dead skin, bloodshot red eyes, dark veins visible on face, sunken cheeks, undead creature, horror movie makeup, photorealistic, highly detailed face, scary, maintain face structure and features";

pub const ZOMBIE_NEGATIVE_PROMPT: &str = "cartoon, anime, illustration, blurry, low quality, deformed face, extra limbs, disfigured, watermark, text";

/// Numeric knobs sent with every transformation. Which fields a provider reads depends on its API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    pub strength: f32,
    pub guidance_scale: f32,
    pub steps: u32,
    pub samples: u32,
}

impl ControlParameters {
    /// Flux-dev via Replicate: 0.7-0.8 prompt strength keeps the face recognisable.
    pub const REPLICATE: ControlParameters = ControlParameters {
        strength: 0.75,
        guidance_scale: 3.5,
        steps: 28,
        samples: 1,
    };

    /// SDXL image-to-image via Stability, where `strength` is the init image weight.
    pub const STABILITY: ControlParameters = ControlParameters {
        strength: 0.35,
        guidance_scale: 7.0,
        steps: 30,
        samples: 1,
    };
}

#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

#[derive(Debug, Clone)]
pub struct TransformationRequest {
    pub image: ImagePayload,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub parameters: ControlParameters,
}

impl TransformationRequest {
    pub fn zombie(image: ImagePayload, parameters: ControlParameters) -> Self {
        Self {
            image,
            prompt: ZOMBIE_PROMPT.to_string(),
            negative_prompt: Some(ZOMBIE_NEGATIVE_PROMPT.to_string()),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformationResult {
    /// Hosted by the provider; we only pass the link on.
    Remote { url: String },
    Inline { media_type: String, base64: String },
}

impl TransformationResult {
    pub fn remote(url: impl Into<String>) -> Self {
        TransformationResult::Remote { url: url.into() }
    }

    pub fn inline_png(base64: impl Into<String>) -> Self {
        TransformationResult::Inline {
            media_type: "image/png".to_string(),
            base64: base64.into(),
        }
    }

    /// Value usable directly as an `<img src>` or download `href`.
    pub fn src(&self) -> String {
        match self {
            TransformationResult::Remote { url } => url.clone(),
            TransformationResult::Inline { media_type, base64 } => {
                format!("data:{};base64,{}", media_type, base64)
            }
        }
    }
}
