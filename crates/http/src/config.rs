//! Session configuration

use hrdesk_core::validation::validators;
use hrdesk_core::{CoreResult, DEFAULT_REFRESH_LEAD_SECS, ValidateConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for overrides (`HRDESK_BASE_URL`, ...)
pub const ENV_PREFIX: &str = "HRDESK";

/// Settings for a console session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend origin; `/api/...` paths are appended to it
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Directory holding the persisted token and cached user
    pub state_dir: PathBuf,

    /// Seconds before expiry at which the token is refreshed
    pub refresh_lead_secs: i64,

    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            state_dir: default_state_dir(),
            refresh_lead_secs: DEFAULT_REFRESH_LEAD_SECS,
            user_agent: concat!("hrdesk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `<data dir>/hrdesk`, or `./hrdesk` when the platform has none
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hrdesk")
}

impl SessionConfig {
    /// Load configuration from defaults, an optional file, then environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value fails validation
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("state_dir", defaults.state_dir.to_string_lossy().to_string())?
            .set_default("refresh_lead_secs", defaults.refresh_lead_secs)?
            .set_default("user_agent", defaults.user_agent)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with defaults and environment variables only
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        Self::load(None)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ValidateConfig for SessionConfig {
    fn validate(&self) -> Result<(), config::ConfigError> {
        validators::validate_http_url(&self.base_url, "base_url")?;
        validators::validate_range(self.timeout_secs, 1, 3600, "timeout_secs")?;
        validators::validate_range(self.refresh_lead_secs, 0, 3600, "refresh_lead_secs")?;
        validators::validate_not_empty(&self.user_agent, "user_agent")
    }
}
