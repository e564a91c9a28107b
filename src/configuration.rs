use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::services::Pacing;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub collector: CollectorSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

#[derive(Deserialize, Clone)]
pub struct CollectorSettings {
    /// Defaults to the `collector` binary next to the running executable.
    pub executable: Option<PathBuf>,
    pub results_path: PathBuf,
    pub webdriver_url: String,
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub listings_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub detail_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_scroll_attempts: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scroll_pause_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub detail_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub listing_gap_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub listing_jitter_ms: u64,
}

impl CollectorSettings {
    pub fn executable(&self) -> PathBuf {
        if let Some(path) = &self.executable {
            return path.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("collector")))
            .unwrap_or_else(|| PathBuf::from("collector"))
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            listings_timeout: Duration::from_secs(self.listings_timeout_secs),
            detail_timeout: Duration::from_secs(self.detail_timeout_secs),
            max_scroll_attempts: self.max_scroll_attempts,
            settle: Duration::from_millis(self.settle_ms),
            scroll_pause: Duration::from_millis(self.scroll_pause_ms),
            detail_settle: Duration::from_millis(self.detail_settle_ms),
            listing_gap: Duration::from_millis(self.listing_gap_ms),
            listing_jitter: Duration::from_millis(self.listing_jitter_ms),
        }
    }
}

/// Reads `configuration.yaml` from the working directory, then applies
/// `APP_`-prefixed overrides such as `APP_APPLICATION__PORT=5001`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    let settings = config::Config::builder()
        .add_source(config::File::from(base_path.join("configuration.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
