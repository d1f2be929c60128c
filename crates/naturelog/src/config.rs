//! Configuration management for naturelog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. All
//! upload credentials (cloud name, preset, folder) come from configuration,
//! never from user input.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "naturelog";

/// Default cached-identity file name.
const IDENTITY_FILE_NAME: &str = "identity.json";

/// Default media host API base (Cloudinary-style upload API).
const DEFAULT_MEDIA_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Default logical namespace for uploaded objects.
const DEFAULT_MEDIA_FOLDER: &str = "nature-journal";

/// Default document-store collection for journal entries.
const DEFAULT_COLLECTION: &str = "entries";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables, `NATURELOG_<SECTION>__<KEY>` with a double
///    underscore separating section from key (so multi-word keys survive:
///    `NATURELOG_MEDIA__CLOUD_NAME` maps to `media.cloud_name`)
/// 2. TOML config file at `~/.config/naturelog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media host (upload endpoint) configuration.
    pub media: MediaConfig,
    /// Document store configuration.
    pub store: StoreConfig,
    /// Identity service configuration.
    pub auth: AuthConfig,
    /// Image acquisition configuration.
    pub capture: CaptureConfig,
}

/// Media host configuration.
///
/// These are the environment-supplied upload credentials: the destination
/// identifier, the server-side upload policy name, and the logical folder
/// uploaded objects land in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Upload destination identifier (Cloudinary "cloud name").
    pub cloud_name: String,
    /// Server-side upload policy name.
    pub upload_preset: String,
    /// Logical namespace for stored objects.
    pub folder: String,
    /// Base URL of the media upload API.
    pub api_base: String,
}

/// Document store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the document store REST endpoint.
    pub base_url: String,
    /// Collection that journal entries are written to.
    pub collection: String,
}

/// Identity service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the identity service.
    pub base_url: String,
    /// API key passed to the identity service.
    pub api_key: String,
    /// Path for the cached anonymous identity.
    /// Defaults to `~/.local/share/naturelog/identity.json`
    pub identity_cache_path: Option<PathBuf>,
}

/// Image acquisition configuration.
///
/// A headless client has no OS permission dialog; these flags stand in for
/// the device's per-mode permission state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Whether camera capture is permitted.
    pub camera_allowed: bool,
    /// Whether gallery selection is permitted.
    pub gallery_allowed: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            upload_preset: String::new(),
            folder: DEFAULT_MEDIA_FOLDER.to_string(),
            api_base: DEFAULT_MEDIA_API_BASE.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_allowed: true,
            gallery_allowed: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (`NATURELOG_<SECTION>__<KEY>`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Double underscore separates section from key, so keys that
        // themselves contain underscores (cloud_name, base_url) stay intact.
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("NATURELOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// Service URLs and credentials may legitimately be empty at load time
    /// (they are only needed by the commands that talk to that service), so
    /// validation checks internal consistency rather than completeness.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.store.collection.is_empty() {
            return Err(Error::ConfigValidation {
                message: "store.collection must not be empty".to_string(),
            });
        }

        if self.media.api_base.is_empty() {
            return Err(Error::ConfigValidation {
                message: "media.api_base must not be empty".to_string(),
            });
        }

        for (name, value) in [
            ("media.api_base", &self.media.api_base),
            ("store.base_url", &self.store.base_url),
            ("auth.base_url", &self.auth.base_url),
        ] {
            if !value.is_empty() && !value.starts_with("http://") && !value.starts_with("https://")
            {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be an http(s) URL, got: {value}"),
                });
            }
        }

        Ok(())
    }

    /// Check that the media host credentials are present.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing credential.
    pub fn require_media(&self) -> Result<()> {
        if self.media.cloud_name.is_empty() {
            return Err(Error::ConfigValidation {
                message: "media.cloud_name is not set".to_string(),
            });
        }
        if self.media.upload_preset.is_empty() {
            return Err(Error::ConfigValidation {
                message: "media.upload_preset is not set".to_string(),
            });
        }
        Ok(())
    }

    /// Check that the document store endpoint is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store base URL is not configured.
    pub fn require_store(&self) -> Result<()> {
        if self.store.base_url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "store.base_url is not set".to_string(),
            });
        }
        Ok(())
    }

    /// Check that the identity service endpoint is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth base URL is not configured.
    pub fn require_auth(&self) -> Result<()> {
        if self.auth.base_url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "auth.base_url is not set".to_string(),
            });
        }
        Ok(())
    }

    /// Get the identity cache path, resolving defaults if not set.
    #[must_use]
    pub fn identity_cache_path(&self) -> PathBuf {
        self.auth
            .identity_cache_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(IDENTITY_FILE_NAME))
    }
}
