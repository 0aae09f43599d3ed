use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Output sizes accepted by the SDXL 1.0 image-to-image engine, in lookup order.
pub const SUPPORTED_DIMENSIONS: [Dimensions; 9] = [
    Dimensions::new(1024, 1024),
    Dimensions::new(1152, 896),
    Dimensions::new(1216, 832),
    Dimensions::new(1344, 768),
    Dimensions::new(1536, 640),
    Dimensions::new(640, 1536),
    Dimensions::new(768, 1344),
    Dimensions::new(832, 1216),
    Dimensions::new(896, 1152),
];
