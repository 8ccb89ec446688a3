//! Connection settings: flags and environment (via clap), then the optional
//! JSON config file, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Deserialize;
use tracing::debug;
use vro_engine::PollSettings;
use vro_types::{Credentials, DEFAULT_PORT, ServerEndpoint};
use vro_util::config_file_path;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "VRO_CONFIG_PATH";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Optional defaults read from `~/.config/vro/config.json`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub validate_certs: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

impl FileConfig {
    pub fn default_path() -> PathBuf {
        config_file_path(CONFIG_PATH_ENV, CONFIG_FILE_NAME)
    }

    /// Load the file at `path`; a missing file yields empty defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn poll_settings(&self, timeout_secs: Option<u64>, interval_secs: Option<u64>) -> PollSettings {
        let defaults = PollSettings::default();
        PollSettings {
            timeout: timeout_secs
                .or(self.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            interval: interval_secs
                .or(self.poll_interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
        }
    }
}

/// Server connection flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// vRO server hostname
    #[arg(long, short = 'H', visible_alias = "server", env = "VRO_HOST")]
    pub hostname: Option<String>,

    /// vRO REST API port [default: 8281]
    #[arg(long, short = 'P', visible_alias = "listeningport", env = "VRO_PORT")]
    pub port: Option<u16>,

    #[arg(long, short = 'u', env = "VRO_USERNAME")]
    pub username: Option<String>,

    /// Prompted for when not given
    #[arg(long, short = 'p', env = "VRO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip TLS certificate validation
    #[arg(long, short = 'i')]
    pub insecure: bool,

    /// Full API root, e.g. `https://vro.local:8281/vco/api/`; plain http only for localhost
    #[arg(long, env = "VRO_BASE_URL")]
    pub base_url: Option<String>,
}

impl ConnectionArgs {
    /// Build the endpoint, asking `prompt_password` only when no password was given.
    pub fn endpoint(&self, file: &FileConfig, prompt_password: impl FnOnce() -> Result<String>) -> Result<ServerEndpoint> {
        let Some(host) = self.hostname.clone().or_else(|| file.host.clone()) else {
            bail!("no vRO host given; pass --hostname, set VRO_HOST, or add \"host\" to the config file");
        };
        let Some(username) = self.username.clone().or_else(|| file.username.clone()) else {
            bail!("no username given; pass --username, set VRO_USERNAME, or add \"username\" to the config file");
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_password()?,
        };

        let validate_certs = !self.insecure && file.validate_certs.unwrap_or(true);
        Ok(ServerEndpoint::new(host, Credentials::new(username, password))
            .with_port(self.port.or(file.port).unwrap_or(DEFAULT_PORT))
            .with_validate_certs(validate_certs))
    }
}

/// Hidden interactive password prompt.
pub fn prompt_password() -> Result<String> {
    dialoguer::Password::new()
        .with_prompt("Enter vRO password")
        .allow_empty_password(true)
        .interact()
        .context("failed to read password")
}
