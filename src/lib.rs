pub mod config;
pub mod error;
pub mod intake;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, ProviderConfig, ReplicateConfig, StabilityConfig};
pub use error::{ErrorKind, Result, ValidationError, ZombieError};
pub use intake::{IntakeValidator, TransientAsset};
pub use models::*;
pub use pipeline::TransformPipeline;
pub use preprocess::{closest_dimensions, prepare_for_model, PreparedImage};
pub use providers::{InputPolicy, ReplicateTransformer, StabilityTransformer, Transformer};
