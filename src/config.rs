use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ZombieError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<String>,
    pub api_base: String,
    pub model: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub engine: String,
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Replicate(ReplicateConfig),
    Stability(StabilityConfig),
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Replicate(_) => "replicate",
            ProviderConfig::Stability(_) => "stability",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: u64,
    pub upstream_timeout: Option<Duration>,
    pub provider: Option<ProviderConfig>,
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn api_base_env(key: &str, fallback: &str) -> String {
    non_empty_env(key)
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| fallback.to_string())
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            api_base: "https://api.replicate.com/v1".to_string(),
            model: "black-forest-labs/flux-dev".to_string(),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        ReplicateConfig {
            api_token: non_empty_env("REPLICATE_API_TOKEN"),
            api_base: api_base_env("REPLICATE_API_BASE", &defaults.api_base),
            model: non_empty_env("REPLICATE_MODEL").unwrap_or(defaults.model),
            poll_interval: defaults.poll_interval,
        }
    }

    pub fn with_credentials(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            api_key: None,
            api_base: "https://api.stability.ai".to_string(),
            engine: "stable-diffusion-xl-1024-v1-0".to_string(),
        }
    }
}

impl StabilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        StabilityConfig {
            api_key: non_empty_env("STABILITY_API_KEY"),
            api_base: api_base_env("STABILITY_API_BASE", &defaults.api_base),
            engine: non_empty_env("STABILITY_ENGINE").unwrap_or(defaults.engine),
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("uploads"),
            static_dir: Some(PathBuf::from("public")),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upstream_timeout: None,
            provider: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the process environment once. Call `dotenv::dotenv()` first if a `.env` file should count.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match non_empty_env("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ZombieError::Config(format!("PORT is not a valid port: {}", raw)))?,
            None => defaults.port,
        };
        let max_upload_bytes = match non_empty_env("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|_| {
                ZombieError::Config(format!("MAX_UPLOAD_BYTES is not a number: {}", raw))
            })?,
            None => defaults.max_upload_bytes,
        };
        let upstream_timeout = match non_empty_env("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|_| {
                ZombieError::Config(format!("UPSTREAM_TIMEOUT_SECS is not a number: {}", raw))
            })?)),
            None => None,
        };

        Ok(Config {
            host: non_empty_env("HOST").unwrap_or(defaults.host),
            port,
            upload_dir: non_empty_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            static_dir: non_empty_env("STATIC_DIR")
                .map(PathBuf::from)
                .or(defaults.static_dir),
            max_upload_bytes,
            upstream_timeout,
            provider: Self::provider_from_env()?,
        })
    }

    fn provider_from_env() -> Result<Option<ProviderConfig>> {
        let replicate = ReplicateConfig::from_env();
        let stability = StabilityConfig::from_env();

        match non_empty_env("TRANSFORM_PROVIDER").map(|value| value.to_ascii_lowercase()) {
            Some(name) if name == "replicate" => Ok(Some(ProviderConfig::Replicate(replicate))),
            Some(name) if name == "stability" => Ok(Some(ProviderConfig::Stability(stability))),
            Some(other) => Err(ZombieError::Config(format!(
                "TRANSFORM_PROVIDER must be `replicate` or `stability`, got `{}`",
                other
            ))),
            None if replicate.api_token.is_some() => Ok(Some(ProviderConfig::Replicate(replicate))),
            None if stability.api_key.is_some() => Ok(Some(ProviderConfig::Stability(stability))),
            None => Ok(None),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = upload_dir.into();
        self
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }

    pub fn with_replicate(mut self, config: ReplicateConfig) -> Self {
        self.provider = Some(ProviderConfig::Replicate(config));
        self
    }

    pub fn with_stability(mut self, config: StabilityConfig) -> Self {
        self.provider = Some(ProviderConfig::Stability(config));
        self
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
