//! Configuration types for resolving and downloading share links.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::url::ShareReference;

/// Browser-like User-Agent sent with every request; the host rejects bare clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/75.0.3770.100 Safari/537.36";

/// Public DLC decryption service.
pub const DEFAULT_CONTAINER_ENDPOINT: &str = "http://dcrypt.it/decrypt/paste";

/// Default hosting domain (without the `www<N>.` prefix and `.com` suffix).
pub const DEFAULT_DOMAIN: &str = "zippyshare";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for download operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Whether to overwrite existing files.
    pub force_overwrite: bool,
    /// HTTPS proxy as `<host>:<port>`.
    pub proxy: Option<String>,
    /// Size of each read from the response body, in bytes.
    pub chunk_size: usize,
    /// Attempts made for a share page answering HTTP 500.
    pub page_retries: u32,
    /// Pause between share page attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Pause after each container decryption, in milliseconds.
    pub container_throttle_ms: u64,
    /// User-Agent header for all requests.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            force_overwrite: false,
            proxy: None,
            chunk_size: 32 * 1024,
            page_retries: 3,
            retry_delay_ms: 1000,
            container_throttle_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to force overwrite existing files.
    #[must_use]
    pub const fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Sets the HTTPS proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Sets the body read size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the share page retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the pause observed after each container decryption.
    #[must_use]
    pub const fn with_container_throttle(mut self, delay: Duration) -> Self {
        self.container_throttle_ms = duration_ms(delay);
        self
    }

    /// Pause between share page attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Pause after each container decryption.
    #[must_use]
    pub const fn container_throttle(&self) -> Duration {
        Duration::from_millis(self.container_throttle_ms)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Where share links live and where containers are decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Hosting domain, e.g. `zippyshare` for `www12.zippyshare.com`.
    pub domain: String,
    /// Replaces `https://www<N>.<domain>.com` for page and file requests.
    pub origin_override: Option<String>,
    /// DLC decryption endpoint.
    pub container_endpoint: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            origin_override: None,
            container_endpoint: DEFAULT_CONTAINER_ENDPOINT.to_string(),
        }
    }
}

impl SiteConfig {
    /// Creates a site configuration for the given domain.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Routes page and file requests to `origin` instead of the shard host.
    #[must_use]
    pub fn with_origin_override(mut self, origin: impl Into<String>) -> Self {
        self.origin_override = Some(origin.into());
        self
    }

    /// Sets the DLC decryption endpoint.
    #[must_use]
    pub fn with_container_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.container_endpoint = endpoint.into();
        self
    }

    /// Scheme and authority serving `share`: the host it was shared on,
    /// unless an override is set.
    #[must_use]
    pub fn origin(&self, share: &ShareReference) -> String {
        self.origin_override.as_ref().map_or_else(
            || format!("https://{}", share.host),
            |origin| origin.trim_end_matches('/').to_string(),
        )
    }
}

/// Path configuration for output and config directories.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Directory where downloaded files are saved.
    pub output_dir: PathBuf,
    /// Directory where configuration files are read from.
    pub config_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let output_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            output_dir,
            config_dir: config_dir.join("zs-dl"),
        }
    }
}

/// On-disk layout of `config.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    download: DownloadConfig,
    site: SiteConfig,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Download configuration.
    pub download: DownloadConfig,
    /// Hosting site configuration.
    pub site: SiteConfig,
    /// Path configuration.
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `config.toml` from the default config directory, falling back
    /// to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let paths = PathConfig::default();
        let path = paths.config_dir.join(CONFIG_FILE_NAME);
        Self::load_from(&path, paths)
    }

    /// Loads configuration from `path`, keeping `paths` for anything the
    /// file does not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path, mut paths: PathConfig) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                paths,
                ..Self::default()
            });
        }

        let text = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::info!("Loaded config from {}", path.display());

        if let Some(dir) = file.output_dir {
            paths.output_dir = dir;
        }

        Ok(Self {
            download: file.download,
            site: file.site,
            paths,
        })
    }
}
