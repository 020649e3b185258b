use std::env;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variables recognised as overrides for the config file.
/// Credentials are env-only and never read from the file.
pub const ENV_CLIENT_ID: &str = "BATCHCAST_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "BATCHCAST_CLIENT_SECRET";
pub const ENV_ACCOUNT_ID: &str = "BATCHCAST_ACCOUNT_ID";
pub const ENV_INGEST_PROFILE: &str = "BATCHCAST_INGEST_PROFILE";
pub const ENV_CSV_DIR: &str = "BATCHCAST_CSV_DIR";
pub const ENV_CHECKPOINT_DIR: &str = "BATCHCAST_CHECKPOINT_DIR";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchcastConfig {
    pub platform: PlatformSection,
    pub ingest: IngestSection,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSection {
    pub account_id: String,
    pub token_url: String,
    pub cms_base: String,
    pub ingest_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestSection {
    pub mode: IngestMode,
    pub profile: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    pub csv_dir: String,
    pub checkpoint_dir: String,
}

/// Which source-attachment strategy a deployment uses. Selected once at
/// startup, never per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Attach the externally hosted file as a playable source (renditions,
    /// HLS manifest or DASH manifest, by container).
    RemoteAssets,
    /// Submit the source URL as a master file for platform-side transcoding
    /// under the configured ingest profile.
    Master,
}

impl IngestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestMode::RemoteAssets => "remote_assets",
            IngestMode::Master => "master",
        }
    }

    /// Default CSV file name for this mode when the operator does not name
    /// one explicitly.
    pub fn default_csv_file(&self) -> &'static str {
        match self {
            IngestMode::RemoteAssets => "remote_src.csv",
            IngestMode::Master => "video_src.csv",
        }
    }
}

/// OAuth client credentials, sourced from the environment only.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let client_id = require_env("client id", ENV_CLIENT_ID)?;
        let client_secret = require_env("client secret", ENV_CLIENT_SECRET)?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

impl BatchcastConfig {
    pub fn csv_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.paths.csv_dir).join(file_name)
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.checkpoint_dir)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BatchcastConfig> {
    let mut config: BatchcastConfig = load_toml(path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut BatchcastConfig) {
    if let Some(account_id) = non_empty_env(ENV_ACCOUNT_ID) {
        config.platform.account_id = account_id;
    }
    if let Some(profile) = non_empty_env(ENV_INGEST_PROFILE) {
        config.ingest.profile = profile;
    }
    if let Some(csv_dir) = non_empty_env(ENV_CSV_DIR) {
        config.paths.csv_dir = csv_dir;
    }
    if let Some(checkpoint_dir) = non_empty_env(ENV_CHECKPOINT_DIR) {
        config.paths.checkpoint_dir = checkpoint_dir;
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn require_env(name: &'static str, var: &'static str) -> Result<String> {
    non_empty_env(var).ok_or(ConfigError::Missing { name, env: var })
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
