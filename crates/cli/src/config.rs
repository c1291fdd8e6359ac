//! CLI configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `TASKMATE__*` environment variables (`TASKMATE__API__BASE_URL`).

use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskmate_client::RenewalMode;

/// CLI settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Task API configuration
    pub api: ApiSettings,

    /// Session file location (defaults to `<data dir>/session.json`)
    pub session_file: Option<PathBuf>,
}

/// Task API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every request path is joined onto
    pub base_url: String,

    /// Request timeout in seconds; must be at least 1
    pub timeout_secs: u64,

    /// Share one renewal between concurrent requests
    pub coalesce_renewals: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            timeout_secs: taskmate_client::DEFAULT_TIMEOUT.as_secs(),
            coalesce_renewals: true,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn renewal_mode(&self) -> RenewalMode {
        if self.coalesce_renewals {
            RenewalMode::Coalesced
        } else {
            RenewalMode::PerRequest
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value cannot be parsed,
    /// or `api.timeout_secs` is zero
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = ApiSettings::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.base_url)?
            .set_default("api.timeout_secs", defaults.timeout_secs)?
            .set_default("api.coalesce_renewals", defaults.coalesce_renewals)?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("TASKMATE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to load configuration")?;

        let settings: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        ensure!(
            settings.api.timeout_secs > 0,
            "Invalid configuration: api.timeout_secs must be at least 1"
        );

        Ok(settings)
    }
}

/// Platform directories for config, session and logs
pub struct Dirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl Dirs {
    /// Resolve directories, honouring an explicit data directory override
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            return Self {
                config_dir: dir.clone(),
                data_dir: dir,
            };
        }

        match ProjectDirs::from("app", "TaskMate", "taskmate") {
            Some(dirs) => Self {
                config_dir: dirs.config_dir().to_path_buf(),
                data_dir: dirs.data_dir().to_path_buf(),
            },
            // Fallback to current directory
            None => Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            },
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Config file used when `--config` is not given, if it exists
    pub fn default_config_file(&self) -> Option<PathBuf> {
        let path = self.config_dir.join("config.toml");
        path.exists().then_some(path)
    }

    pub fn session_file(&self, settings: &Settings) -> PathBuf {
        settings
            .session_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.api.timeout(), Duration::from_secs(5));
        assert_eq!(settings.api.renewal_mode(), RenewalMode::Coalesced);
        assert!(settings.session_file.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
session_file = "/tmp/taskmate-session.json"

[api]
base_url = "https://tasks.example.com/api/"
coalesce_renewals = false
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.api.base_url, "https://tasks.example.com/api/");
        assert_eq!(settings.api.timeout_secs, 5);
        assert_eq!(settings.api.renewal_mode(), RenewalMode::PerRequest);
        assert_eq!(
            settings.session_file,
            Some(PathBuf::from("/tmp/taskmate-session.json"))
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\ntimeout_secs = 0\n").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn data_dir_override_holds_everything() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = Dirs::resolve(Some(dir.path().to_path_buf()));
        assert_eq!(dirs.data_dir(), dir.path());
        assert!(dirs.default_config_file().is_none());
        assert_eq!(
            dirs.session_file(&Settings::default()),
            dir.path().join("session.json")
        );
    }
}
