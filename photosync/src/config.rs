use std::path::{Path, PathBuf};

use photosync_core::{ClientOptions, DEFAULT_USER_AGENT};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "photosync.toml";
pub const CONFIG_ENV: &str = "PHOTOSYNC_CONFIG";
const CONFIG_DIR_NAME: &str = "photosync";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config is missing required key urls.{0}")]
    MissingKey(&'static str),
    #[error("destination {0:?} is not an existing directory")]
    DestinationMissing(PathBuf),
}

/// The three archive endpoints. Loaded once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub folders: String,
    pub photos: String,
    pub remove_old: String,
}

impl EndpointConfig {
    /// Photo-list URL for a folder: the configured prefix with the id
    /// appended verbatim, no escaping.
    pub fn photos_url_for(&self, folder_id: &str) -> String {
        format!("{}{}", self.photos, folder_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            user_agent: self.user_agent.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub urls: EndpointConfig,
    pub http: HttpSettings,
}

impl SyncConfig {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.into_config()
    }
}

/// Where a run gets its configuration from. Consulted once at run start.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<SyncConfig, ConfigError>;
}

impl ConfigSource for SyncConfig {
    fn load(&self) -> Result<SyncConfig, ConfigError> {
        Ok(self.clone())
    }
}

/// A TOML file re-read at the start of every run.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for ConfigFile {
    fn load(&self) -> Result<SyncConfig, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        SyncConfig::from_toml_str(&raw, &self.path)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    urls: Option<UrlsSection>,
    #[serde(default)]
    http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
struct UrlsSection {
    folders: Option<String>,
    photos: Option<String>,
    remove_old: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpSection {
    accept_invalid_certs: Option<bool>,
    user_agent: Option<String>,
}

impl FileConfig {
    fn into_config(self) -> Result<SyncConfig, ConfigError> {
        let urls = self.urls.unwrap_or_default();
        let http = self.http.unwrap_or_default();
        let defaults = HttpSettings::default();
        Ok(SyncConfig {
            urls: EndpointConfig {
                folders: required(urls.folders, "folders")?,
                photos: required(urls.photos, "photos")?,
                remove_old: required(urls.remove_old, "remove_old")?,
            },
            http: HttpSettings {
                accept_invalid_certs: http
                    .accept_invalid_certs
                    .unwrap_or(defaults.accept_invalid_certs),
                user_agent: http
                    .user_agent
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or(defaults.user_agent),
            },
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingKey(key))
}

/// Picks the config file: explicit path, then `PHOTOSYNC_CONFIG`, then
/// `./photosync.toml`, then the per-user config directory. Falls back to the
/// working-directory name so a missing file still reports a useful path.
pub fn resolve_config_path(explicit: Option<&str>) -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    if let Some(path) = explicit {
        return expand_with_home(path, &home);
    }
    if let Ok(value) = std::env::var(CONFIG_ENV)
        && !value.trim().is_empty()
    {
        return expand_with_home(value.trim(), &home);
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return local;
    }
    if let Some(user) = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        && user.is_file()
    {
        return user;
    }
    local
}

pub fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}
