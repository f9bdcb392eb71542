//! Configuration for jobscrape
//!
//! All run parameters live here rather than in process-wide constants so the
//! pipeline can be pointed at fixture servers and run with varied pool sizes
//! in tests. Loaded from a TOML file; every section has defaults so a missing
//! or partial file still yields a usable configuration.
//!
//! ```toml
//! [crawl]
//! base_url = "https://www.simplyhired.co.uk/"
//! page_limit = 2
//! workers = 5
//! on_error = "abort"
//!
//! [fetch]
//! user_agent = "jobscrape/0.1"
//! timeout_secs = 30
//!
//! [output]
//! root = "./output"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::scrape::pipeline::FailurePolicy;

fn default_base_url() -> String {
    "https://www.simplyhired.co.uk/".to_string()
}

fn default_page_limit() -> u32 {
    2
}

fn default_workers() -> usize {
    5
}

fn default_user_agent() -> String {
    format!("jobscrape/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./output")
}

/// Main configuration for a scrape run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Crawl configuration
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// HTTP client configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl configuration: which site, how many pages, how wide a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base URL of the job site (listing and detail endpoints hang off this)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of listing pages to scrape (upper bound, not discovered)
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Worker pool size
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// What to do when a job or page fails
    #[serde(default)]
    pub on_error: FailurePolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            workers: default_workers(),
            on_error: FailurePolicy::default(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for artifacts; wiped and recreated at the start of a run
    #[serde(default = "default_output_root")]
    pub root: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all violations and reports them together so the user can fix
    /// everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        match Url::parse(&self.crawl.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("base_url is not a valid URL: {}", e)),
        }

        if self.crawl.page_limit == 0 {
            errors.push("page_limit must be positive".to_string());
        }
        if self.crawl.workers == 0 {
            errors.push("workers must be positive".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawl.page_limit, 2);
        assert_eq!(config.crawl.workers, 5);
        assert_eq!(config.crawl.on_error, FailurePolicy::Abort);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawl]
            page_limit = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.crawl.page_limit, 7);
        assert_eq!(config.crawl.workers, 5);
        assert_eq!(config.output.root, PathBuf::from("./output"));
    }

    #[test]
    fn validation_collects_all_errors() {
        let mut config = Config::default();
        config.crawl.base_url = "not a url".to_string();
        config.crawl.page_limit = 0;
        config.crawl.workers = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
        assert!(err.contains("page_limit"));
        assert!(err.contains("workers"));
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [crawl]
            workers = 3
            on_error = "skip"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.crawl.workers, 3);
        assert_eq!(config.crawl.on_error, FailurePolicy::Skip);
    }
}
