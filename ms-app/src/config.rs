//! MultiSearch configuration loader.
//!
//! Every section is optional; a missing config file means defaults.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiSearchConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub test: TestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3917".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    /// Key file location. Default: `~/.multisearch/keys.toml`
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Let `<PROVIDER>_API_KEY` environment variables win over stored keys.
    #[serde(default = "default_env_overrides")]
    pub env_overrides: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            path: None,
            env_overrides: default_env_overrides(),
        }
    }
}

fn default_env_overrides() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    #[serde(default = "default_test_prompt")]
    pub prompt: String,
    /// Pause between sequential connection tests.
    #[serde(default = "default_test_delay_ms")]
    pub delay_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            prompt: default_test_prompt(),
            delay_ms: default_test_delay_ms(),
        }
    }
}

fn default_test_prompt() -> String {
    r#"Hello, please respond with just "API connection successful""#.to_string()
}

fn default_test_delay_ms() -> u64 {
    500
}

impl MultiSearchConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MULTISEARCH_BIND") {
            if !v.trim().is_empty() {
                self.server.bind = v;
            }
        }
        if let Ok(v) = std::env::var("MULTISEARCH_KEYS_PATH") {
            if !v.trim().is_empty() {
                self.keys.path = Some(PathBuf::from(v));
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.http.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("http.request_timeout_secs must be > 0"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow::anyhow!("server.bind is required"));
        }
        if self.test.prompt.trim().is_empty() {
            return Err(anyhow::anyhow!("test.prompt must not be empty"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    pub fn keys_path(&self) -> PathBuf {
        self.keys
            .path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("keys.toml"))
    }
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".multisearch")
}
