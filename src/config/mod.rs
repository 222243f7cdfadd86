//! Configuration management.
//!
//! Configuration is read from a TOML file and overridden by environment
//! variables prefixed with `LEARNHUB_` (nested keys use `__`, for example
//! `LEARNHUB_SERVER__BIND=0.0.0.0:8080`).
//!
//! ```toml
//! [api_keys]
//! github = "ghp_..."
//!
//! [sources]
//! github_api_url = "https://api.github.com"
//! arxiv_api_url = "http://export.arxiv.org/api/query"
//! trending_window_days = 7
//!
//! [http]
//! timeout_secs = 30
//! provider_timeout_secs = 10
//!
//! [http.retry]
//! max_attempts = 2
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! default_per_page = 20
//!
//! [catalog]
//! path = "./catalog.json"
//!
//! [[auth.callers]]
//! name = "alice"
//! token = "secret-token"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "learnhub.toml";
/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "LEARNHUB";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credentials for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// External source endpoints and tuning
    #[serde(default)]
    pub sources: SourcesConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Local catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Known callers
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub token (optional; without it GitHub's unauthenticated rate limit applies)
    #[serde(default = "default_github_token")]
    pub github: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            github: default_github_token(),
        }
    }
}

fn default_github_token() -> Option<String> {
    std::env::var("GITHUB_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
}

/// External source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    #[serde(default = "default_arxiv_api_url")]
    pub arxiv_api_url: String,

    /// Length of the trending window in days
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: i64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github_api_url: default_github_api_url(),
            arxiv_api_url: default_arxiv_api_url(),
            trending_window_days: default_trending_window_days(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_arxiv_api_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_trending_window_days() -> i64 {
    7
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout applied by the HTTP client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Deadline for one provider call, retries included
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfigFile,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
            retry: RetryConfigFile::default(),
        }
    }
}

impl HttpConfig {
    /// Provider deadline as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_provider_timeout_secs() -> u64 {
    10
}

/// Retry settings as they appear in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfigFile {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfigFile {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2000
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_per_page() -> u32 {
    crate::models::DEFAULT_PER_PAGE
}

fn default_max_per_page() -> u32 {
    crate::models::MAX_PER_PAGE
}

/// Local catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON seed file; an empty catalog is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Caller registry used by endpoints that require identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub callers: Vec<CallerConfig>,
}

/// One known caller and its bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerConfig {
    pub name: String,
    pub token: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_overrides())
        .build()?
        .try_deserialize()
}

/// Load configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(env_overrides())
        .build()?
        .try_deserialize()
}

fn env_overrides() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Look for a configuration file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("learnhub").join("config.toml"))
        .filter(|path| path.is_file())
}
