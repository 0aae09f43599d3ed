use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageReader};

use crate::{
    error::{Result, ZombieError},
    models::Dimensions,
};

use super::aspect::closest_dimensions;

/// A re-encoded image ready to be sent upstream.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub original: Dimensions,
    pub target: Dimensions,
}

fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ZombieError::Decode { source: e.into() })?
        .decode()
        .map_err(|source| ZombieError::Decode { source })
}

/// Reads the pixel size without decoding the whole image.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ZombieError::Decode { source: e.into() })?
        .into_dimensions()
        .map_err(|source| ZombieError::Decode { source })?;
    Ok(Dimensions::new(width, height))
}

/// Scales the image to cover `target` and crops the overflow from the center, then encodes as PNG.
pub fn resize_cover(bytes: &[u8], target: Dimensions) -> Result<PreparedImage> {
    let image = decode(bytes)?;
    let original = Dimensions::new(image.width(), image.height());
    let resized = image.resize_to_fill(target.width, target.height, FilterType::Lanczos3);

    let mut encoded = Cursor::new(Vec::new());
    resized
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|source| ZombieError::Encode { source })?;

    Ok(PreparedImage {
        bytes: encoded.into_inner(),
        media_type: "image/png",
        original,
        target,
    })
}

/// Matches the image to the nearest supported size and resizes it to exactly that size.
pub fn prepare_for_model(bytes: &[u8]) -> Result<PreparedImage> {
    let original = probe_dimensions(bytes)?;
    let target = closest_dimensions(original.width, original.height);
    log::debug!("Resizing {} upload to {}", original, target);
    resize_cover(bytes, target)
}

/// Runs [`prepare_for_model`] on the blocking pool.
pub async fn prepare_for_model_blocking(bytes: Vec<u8>) -> Result<PreparedImage> {
    tokio::task::spawn_blocking(move || prepare_for_model(&bytes))
        .await
        .map_err(|e| ZombieError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}
