//! Configuration file handling
//!
//! The file is optional. Every key in it can also come from the environment
//! or the command line, which take precedence (see [`Settings`](super::Settings)).

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

/// Contents of `config.toml`
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Azure AD tenant the service principal belongs to
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Application (client) id of the service principal
    #[serde(default)]
    pub client_id: Option<String>,
    /// Client secret. Use `${AZURE_CLIENT_SECRET}` rather than a literal.
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    /// Only scan these subscription ids
    #[serde(default)]
    pub subscription_filter: Option<Vec<String>>,
    /// Number of subscriptions scanned concurrently
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// OAuth2 authority, e.g. `https://login.microsoftonline.com`
    #[serde(default)]
    pub authority_host: Option<String>,
    /// Azure Resource Manager endpoint
    #[serde(default)]
    pub management_endpoint: Option<String>,
    /// Per-request HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is not an error; it yields an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);

        let mut config: Config = toml::from_str(&expanded_content)?;
        config.expand_home_dirs();

        Ok(config)
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, ~/.config/amrscan/config.toml is preferred when it exists,
    /// falling back to ~/Library/Application Support/com.redis.amrscan/config.toml.
    ///
    /// On Linux: ~/.config/amrscan/config.toml
    /// On Windows: %APPDATA%\redis\amrscan\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("amrscan")
                    .join("config.toml");

                if linux_style_path.exists() {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "redis", "amrscan").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports `${VAR}` and `${VAR:-default}`. Unset variables without a
    /// default are left as-is. A leading `~` in a value is expanded to the
    /// home directory after parsing.
    ///
    /// ```toml
    /// client_secret = "${AZURE_CLIENT_SECRET}"
    /// authority_host = "${AZURE_AUTHORITY_HOST:-https://login.microsoftonline.com}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }

    /// Expand a leading `~` in string values
    ///
    /// Tilde expansion only applies at the start of a value, so it runs per
    /// field after parsing. The secret is left untouched.
    fn expand_home_dirs(&mut self) {
        for value in [
            &mut self.tenant_id,
            &mut self.client_id,
            &mut self.authority_host,
            &mut self.management_endpoint,
        ]
        .into_iter()
        .flatten()
        {
            *value = expand_tilde(value);
        }
    }
}

fn expand_tilde(value: &str) -> String {
    shellexpand::tilde_with_context(value, || {
        BaseDirs::new().map(|dirs| dirs.home_dir().to_string_lossy().into_owned())
    })
    .into_owned()
}
