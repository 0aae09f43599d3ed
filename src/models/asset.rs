use serde::Serialize;
use std::path::PathBuf;

/// A file accepted by intake and written to the transient upload directory.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedAsset {
    /// Assigned file name, e.g. `1718000000000.jpg`.
    pub id: String,
    pub path: PathBuf,
    pub media_type: String,
    pub size: u64,
}

/// A single file field as received from the multipart form, before validation.
#[derive(Debug, Clone, Default)]
pub struct IncomingUpload {
    pub field: String,
    pub original_filename: Option<String>,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingUpload {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = bytes.into();
        self
    }
}
