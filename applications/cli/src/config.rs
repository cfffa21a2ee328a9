/// CLI configuration
use cadence_catalog_client::CatalogConfig;
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File read when no `--config` is given (optional)
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Prefix of environment overrides, e.g. `CADENCE_CATALOG__URL`
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogSettings,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Base URL of the catalog API; the built-in demo catalog is used when unset
    pub url: Option<String>,
    pub access_token: Option<String>,
}

impl CatalogSettings {
    /// Client settings, if a remote catalog is configured
    pub fn client_config(&self) -> Option<CatalogConfig> {
        self.url.as_ref().map(|url| CatalogConfig {
            url: url.clone(),
            access_token: self.access_token.clone(),
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` in the working
    /// directory is read if present. Environment variables override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    fn load_from(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (CADENCE_SECTION__KEY)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.catalog.url {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "catalog.url is set but empty (unset it to use the demo catalog)".to_string(),
                ));
            }
        }

        if self.playback.seek_step_ms == 0 {
            return Err(ConfigError::Invalid(
                "playback.seek_step_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_playback::RepeatMode;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_without_sources() {
        let config = AppConfig::load_from(None, env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.catalog.client_config().is_none());
        assert_eq!(config.playback.seek_step_ms, 10_000);
    }

    #[test]
    fn reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[catalog]
url = "https://music.example.com/api/v1"

[playback]
repeat = "queue"
shuffle = true
seek_step_ms = 5000
"#
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path()), env(&[])).unwrap();

        assert_eq!(
            config.catalog.url.as_deref(),
            Some("https://music.example.com/api/v1")
        );
        assert_eq!(config.playback.repeat, RepeatMode::Queue);
        assert!(config.playback.shuffle);
        assert_eq!(config.playback.seek_step_ms, 5000);
        assert_eq!(config.playback.intent_log_size, 64);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[playback]\nseek_step_ms = 5000").unwrap();

        let config = AppConfig::load_from(
            Some(file.path()),
            env(&[
                ("CADENCE_PLAYBACK__SEEK_STEP_MS", "15000"),
                ("CADENCE_CATALOG__URL", "http://localhost:9000"),
                ("CADENCE_CATALOG__ACCESS_TOKEN", "secret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.playback.seek_step_ms, 15_000);
        let client = config.catalog.client_config().unwrap();
        assert_eq!(client.url, "http://localhost:9000");
        assert_eq!(client.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/cadence.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn zero_seek_step_rejected() {
        let result = AppConfig::load_from(None, env(&[("CADENCE_PLAYBACK__SEEK_STEP_MS", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_catalog_url_rejected() {
        let mut config = AppConfig::default();
        config.catalog.url = Some("  ".into());
        assert!(config.validate().is_err());
    }
}
