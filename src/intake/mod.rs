pub mod transient;

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::{
    config::{Config, DEFAULT_MAX_UPLOAD_BYTES},
    error::{Result, ValidationError},
    models::{IncomingUpload, UploadedAsset},
};

pub use transient::{remove_transient, TransientAsset};

pub const IMAGE_FIELD: &str = "image";
const DEFAULT_EXTENSION: &str = ".png";
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Validates single-image uploads and stores accepted ones in the transient upload directory.
#[derive(Debug, Clone)]
pub struct IntakeValidator {
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl IntakeValidator {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upload_dir.clone()).with_max_bytes(config.max_upload_bytes)
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn ensure_upload_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await
    }

    /// Checks the declared media type. Done before the body is read so a bad upload never touches disk.
    pub fn check_media_type(&self, field: &str, media_type: Option<&str>) -> Result<()> {
        match media_type {
            Some(media_type) if media_type.to_ascii_lowercase().starts_with("image/") => Ok(()),
            other => Err(ValidationError::UnsupportedMediaType {
                field: field.to_string(),
                media_type: other.unwrap_or("unknown").to_string(),
            }
            .into()),
        }
    }

    /// Checks a running byte count against the ceiling.
    pub fn check_size(&self, field: &str, size: u64) -> Result<()> {
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                field: field.to_string(),
                size,
                limit: self.max_bytes,
            }
            .into());
        }
        Ok(())
    }

    pub fn validate(&self, upload: &IncomingUpload) -> Result<()> {
        self.check_media_type(&upload.field, upload.media_type.as_deref())?;
        if upload.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                field: upload.field.clone(),
            }
            .into());
        }
        self.check_size(&upload.field, upload.bytes.len() as u64)
    }

    /// Validates and persists an upload. Nothing is written when validation fails.
    pub async fn accept(&self, upload: IncomingUpload) -> Result<TransientAsset> {
        self.validate(&upload)?;
        self.ensure_upload_dir().await?;

        let extension = extension_for(upload.original_filename.as_deref());
        let (id, path, mut file) = self.create_unique(&extension).await?;
        let guard = TransientAsset::new(UploadedAsset {
            id,
            path,
            media_type: upload.media_type.unwrap_or_default(),
            size: upload.bytes.len() as u64,
        });

        // From here on the guard removes the partial file if writing fails.
        file.write_all(&upload.bytes).await?;
        file.flush().await?;

        log::info!(
            "📥 Stored upload {} ({} bytes, {})",
            guard.asset().id,
            guard.asset().size,
            guard.asset().media_type
        );
        Ok(guard)
    }

    async fn create_unique(&self, extension: &str) -> Result<(String, PathBuf, tokio::fs::File)> {
        let stamp = chrono::Utc::now().timestamp_millis();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}{}", stamp, extension)
            } else {
                format!("{}-{}{}", stamp, attempt, extension)
            };
            let path = self.upload_dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((name, path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free upload name for timestamp {}", stamp),
        )
        .into())
    }
}

/// Lowercased extension of the client's file name, including the dot. Falls back to `.png`.
pub fn extension_for(original_filename: Option<&str>) -> String {
    original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZombieError;

    fn png_upload(bytes: &[u8]) -> IncomingUpload {
        IncomingUpload::new(IMAGE_FIELD)
            .with_filename("Me.JPG")
            .with_media_type("image/jpeg")
            .with_bytes(bytes.to_vec())
    }

    fn dir_is_empty_or_missing(dir: &Path) -> bool {
        match std::fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("Me.JPG")), ".jpg");
        assert_eq!(extension_for(Some("photo.webp")), ".webp");
        assert_eq!(extension_for(Some("no_extension")), ".png");
        assert_eq!(extension_for(Some("weird.p/g")), ".png");
        assert_eq!(extension_for(None), ".png");
    }

    #[tokio::test]
    async fn test_accept_writes_file_with_time_based_name() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let intake = IntakeValidator::new(&upload_dir);

        let guard = intake.accept(png_upload(b"jpeg bytes")).await.unwrap();
        let asset = guard.asset();

        assert!(asset.id.ends_with(".jpg"));
        assert!(asset.id.trim_end_matches(".jpg").parse::<i64>().is_ok());
        assert_eq!(asset.media_type, "image/jpeg");
        assert_eq!(asset.size, 10);
        assert_eq!(std::fs::read(&asset.path).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_concurrent_accepts_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let intake = IntakeValidator::new(dir.path());

        let (a, b) = tokio::join!(
            intake.accept(png_upload(b"first")),
            intake.accept(png_upload(b"second"))
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_rejects_non_image_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let intake = IntakeValidator::new(&upload_dir);

        let upload = IncomingUpload::new(IMAGE_FIELD)
            .with_filename("notes.txt")
            .with_media_type("text/plain")
            .with_bytes(b"hello".to_vec());
        let err = intake.accept(upload).await.unwrap_err();

        assert!(matches!(
            err,
            ZombieError::Validation(ValidationError::UnsupportedMediaType { .. })
        ));
        assert!(dir_is_empty_or_missing(&upload_dir));
    }

    #[tokio::test]
    async fn test_rejects_empty_file_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let intake = IntakeValidator::new(&upload_dir);

        let err = intake.accept(png_upload(b"")).await.unwrap_err();

        assert!(matches!(
            err,
            ZombieError::Validation(ValidationError::EmptyFile { .. })
        ));
        assert!(err.is_client_error());
        assert!(dir_is_empty_or_missing(&upload_dir));
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let intake = IntakeValidator::new(dir.path());
        let oversized = vec![0u8; (DEFAULT_MAX_UPLOAD_BYTES + 1) as usize];

        let err = intake.accept(png_upload(&oversized)).await.unwrap_err();

        match err {
            ZombieError::Validation(ValidationError::TooLarge { size, limit, .. }) => {
                assert_eq!(size, DEFAULT_MAX_UPLOAD_BYTES + 1);
                assert_eq!(limit, 10 * 1024 * 1024);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(dir_is_empty_or_missing(dir.path()));
    }

    #[tokio::test]
    async fn test_accepts_file_at_exact_limit() {
        let dir = tempfile::tempdir().unwrap();
        let intake = IntakeValidator::new(dir.path());
        let at_limit = vec![0u8; DEFAULT_MAX_UPLOAD_BYTES as usize];

        let asset = intake.accept(png_upload(&at_limit)).await.unwrap();

        assert_eq!(asset.asset().size, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(
            std::fs::metadata(asset.path()).unwrap().len(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        asset.release().await;
        assert!(dir_is_empty_or_missing(dir.path()));
    }

    #[test]
    fn test_missing_media_type_is_rejected() {
        let intake = IntakeValidator::new("unused");
        assert!(intake.check_media_type(IMAGE_FIELD, None).is_err());
        assert!(intake.check_media_type(IMAGE_FIELD, Some("IMAGE/PNG")).is_ok());
    }
}
