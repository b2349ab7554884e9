//! User configuration: `~/.config/fusionctl/config.toml`
//!
//! Command-line flags and environment variables win over the file, and the
//! file wins over built-in defaults. A missing default file is not an error.

use anyhow::{Context, Result, bail};
use fusionkit::{Credentials, DEFAULT_API_HOST, PollConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("fusionctl"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_host: Option<String>,
    pub access_token: Option<String>,
    /// File holding the access token; `~` is expanded
    pub access_token_file: Option<String>,
    pub poll: PollSettings,
}

/// Operation polling schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_factor: f64,
    pub timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        let defaults = PollConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            max_interval_ms: defaults.max_interval.as_millis() as u64,
            backoff_factor: defaults.backoff_factor,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl Config {
    /// Load the config file
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = config_dir()?.join("config.toml");
                if !default.exists() {
                    log::debug!("no config file at {}", default.display());
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.poll.backoff_factor < 1.0 {
            bail!("poll.backoff_factor must be at least 1.0");
        }
        Ok(config)
    }

    /// Resolve credentials, preferring the given overrides
    pub fn credentials(
        &self,
        api_host: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Credentials> {
        let host = api_host
            .or(self.api_host.as_deref())
            .unwrap_or(DEFAULT_API_HOST);

        let token = match (access_token, &self.access_token, &self.access_token_file) {
            (Some(token), _, _) => token.to_string(),
            (None, Some(token), _) => token.clone(),
            (None, None, Some(file)) => {
                let path = PathBuf::from(shellexpand::tilde(file).as_ref());
                fs::read_to_string(&path)
                    .with_context(|| format!("Could not read access token from {}", path.display()))?
                    .trim()
                    .to_string()
            }
            (None, None, None) => bail!(
                "No access token: pass --access-token, set FUSION_ACCESS_TOKEN, \
                 or set access_token in the config file"
            ),
        };

        Ok(Credentials::new(host, token))
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll.interval_ms),
            backoff_factor: self.poll.backoff_factor,
            max_interval: Duration::from_millis(self.poll.max_interval_ms),
            timeout: Duration::from_secs(self.poll.timeout_secs),
        }
    }
}
