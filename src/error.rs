use thiserror::Error;

/// Why an upload was refused before any processing happened.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No image uploaded (field `{field}` is missing)")]
    MissingFile { field: String },

    #[error("Uploaded file in field `{field}` is empty")]
    EmptyFile { field: String },

    #[error("Only image files are allowed (got `{media_type}` in field `{field}`)")]
    UnsupportedMediaType { field: String, media_type: String },

    #[error("File in field `{field}` is too large ({size} bytes, limit is {limit} bytes)")]
    TooLarge { field: String, size: u64, limit: u64 },

    #[error("Invalid multipart data: {0}")]
    Multipart(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    Transformation,
    Config,
    Io,
    Encode,
}

#[derive(Debug, Error)]
pub enum ZombieError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not read the uploaded image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    #[error("Could not encode the resized image: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },

    #[error("{provider} transformation failed{}: {message}", status_suffix(.status))]
    Transformation {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZombieError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZombieError::Validation(_) => ErrorKind::Validation,
            ZombieError::Decode { .. } => ErrorKind::Decode,
            ZombieError::Encode { .. } => ErrorKind::Encode,
            ZombieError::Transformation { .. } => ErrorKind::Transformation,
            ZombieError::Config(_) => ErrorKind::Config,
            ZombieError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn transformation(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        ZombieError::Transformation {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Missing or empty uploads are the caller's fault; everything else is reported as a server failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ZombieError::Validation(ValidationError::MissingFile { .. })
                | ZombieError::Validation(ValidationError::EmptyFile { .. })
        )
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({})", code)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ZombieError>;
