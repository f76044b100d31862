//! Configuration file support for stargauge.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARGAUGE_`)
//! 3. Config file (~/.config/stargauge/config.toml or ./stargauge.toml)
//! 4. Built-in defaults
//!
//! The plain `GITHUB_TOKEN` environment variable is also honored for the
//! credential, since that is what operators typically already export.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITHUB_TOKEN / STARGAUGE_GITHUB_TOKEN
//!
//! [fetch]
//! min_stars = 27500
//! page_size = 100
//! max_pages = 10
//! requests_per_second = 1
//!
//! [retry]
//! transport_retries = 1
//! rate_limit_retries = 1
//! max_wait_secs = 900
//!
//! [data]
//! raw_path = "data/raw/github_repos.csv"
//! processed_path = "data/processed/github_repos_processed.csv"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub credential configuration.
    pub github: GitHubConfig,
    /// Collection defaults.
    pub fetch: FetchConfig,
    /// Retry policy defaults.
    pub retry: RetryConfig,
    /// File locations for the two pipeline outputs.
    pub data: DataConfig,
}

/// GitHub credential configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API token. Can also be set via GITHUB_TOKEN or STARGAUGE_GITHUB_TOKEN.
    pub token: Option<String>,
}

/// Collection defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Minimum star count for inclusion.
    pub min_stars: u64,
    /// Results per page (the endpoint caps this at 100).
    pub page_size: u32,
    /// Maximum pages per sweep.
    pub max_pages: u32,
    /// Proactive request pacing for the search endpoint.
    pub requests_per_second: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_stars: 27_500,
            page_size: 100,
            max_pages: 10,
            requests_per_second: 1,
        }
    }
}

/// Retry policy defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Transient-failure retries per page.
    pub transport_retries: usize,
    /// Wait-and-resume cycles per page when rate limited.
    pub rate_limit_retries: u32,
    /// Cap on a single rate-limit wait, in seconds.
    pub max_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transport_retries: 1,
            rate_limit_retries: 1,
            max_wait_secs: 900,
        }
    }
}

impl RetryConfig {
    /// Build the library retry policy from this section.
    pub fn to_policy(&self) -> stargauge::RetryConfig {
        let mut policy = stargauge::RetryConfig::default();
        policy.transport_retries = self.transport_retries;
        policy.rate_limit_retries = self.rate_limit_retries;
        policy.max_rate_limit_wait = Duration::from_secs(self.max_wait_secs);
        policy
    }
}

/// File locations for the two pipeline outputs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Raw data file written by the collector.
    pub raw_path: PathBuf,
    /// Processed data file written by the transformer.
    pub processed_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/github_repos.csv"),
            processed_path: PathBuf::from("data/processed/github_repos_processed.csv"),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/stargauge/config.toml)
    /// 3. Local config file (./stargauge.toml)
    /// 4. Environment variables with STARGAUGE_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "stargauge") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("stargauge.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./stargauge.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("STARGAUGE")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the API token, falling back to the conventional GITHUB_TOKEN
    /// environment variable.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone().or_else(|| {
            std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
        })
    }

    /// Get the default config file path.
    #[allow(dead_code)]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stargauge").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
