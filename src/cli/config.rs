use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use tracing::debug;
use url::Url;

use crate::identity::DEFAULT_USER_AGENTS;

/// Directory every wallpaper is written to
pub const OUTPUT_DIR: &str = "images/bing-wallpapers";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteSettings,
    pub identity: IdentitySettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

/// Where the archive lives and how its image links look
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SiteSettings {
    /// Index page; date pages are resolved by appending their href to it
    pub base_url: String,
    /// Substring an anchor must contain to count as an image link
    pub image_host: String,
}

/// Client identities rotated across requests
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct IdentitySettings {
    pub user_agents: Vec<String>,
}

/// Download pool settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadSettings {
    /// Concurrent downloads per date page
    pub workers: usize,
    /// Write buffer size in bytes
    pub chunk_size: usize,
    pub connect_timeout_secs: Option<u64>,
}

/// Logging settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingSettings {
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://bing.wdbyte.com/zh-cn/".to_string(),
            image_host: "https://cn.bing.com/th".to_string(),
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            chunk_size: 1024,
            connect_timeout_secs: None,
        }
    }
}

impl ScraperConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "bing-wallpaper", "bing-wallpaper") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Path of the configuration file read by `load_default`
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load `config.yaml` from the config directory, falling back to defaults
    ///
    /// Also returns the file the settings came from, `None` for defaults.
    /// Logging is not initialised yet at this point, so reporting is left
    /// to the caller.
    pub fn load_default() -> Result<(Self, Option<PathBuf>)> {
        Self::load_or_default(&Self::default_path())
    }

    fn load_or_default(config_path: &Path) -> Result<(Self, Option<PathBuf>)> {
        let (config, source) = if config_path.exists() {
            (Self::load_from_file(config_path)?, Some(config_path.to_path_buf()))
        } else {
            (Self::default(), None)
        };

        config.validate()?;
        Ok((config, source))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))
    }

    fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.site.base_url)
            .context(format!("Invalid base URL: {}", self.site.base_url))?;
        // Date pages are built by appending to the raw string
        if !self.site.base_url.ends_with('/') {
            anyhow::bail!("Base URL must end with '/': {}", self.site.base_url);
        }
        if self.site.image_host.is_empty() {
            anyhow::bail!("Image host must not be empty");
        }
        if self.identity.user_agents.is_empty() {
            anyhow::bail!("At least one user agent is required");
        }
        if self.download.workers == 0 {
            anyhow::bail!("Download workers must be at least 1");
        }
        if self.download.chunk_size == 0 {
            anyhow::bail!("Download chunk size must be at least 1");
        }
        Ok(())
    }
}
