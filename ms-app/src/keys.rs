//! File-backed API key store.
//!
//! Keys live in a flat TOML table keyed by `<provider>_key`. Environment
//! variables such as `GROQ_API_KEY` take precedence over stored values.

use async_trait::async_trait;
use ms_llm::{CredentialAccessor, CredentialError, Provider};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
    env_overrides: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub provider: Provider,
    /// Masked key, if one is stored or set in the environment.
    pub masked: Option<String>,
    pub from_env: bool,
}

impl KeyStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            env_overrides: true,
        }
    }

    /// Ignore `<PROVIDER>_API_KEY` environment variables.
    pub fn without_env(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(CredentialError::Unavailable(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };
        toml::from_str(&contents)
            .map_err(|e| CredentialError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn write_table(&self, table: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("create {}: {e}", parent.display()))?;
        }
        let contents = toml::to_string(table)?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| anyhow::anyhow!("write keys {}: {e}", self.path.display()))?;
        Ok(())
    }

    fn env_key(&self, provider: Provider) -> Option<String> {
        if !self.env_overrides {
            return None;
        }
        std::env::var(provider.env_var())
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Store `key` for `provider`. With `validate`, the key must match the
    /// provider's published format.
    #[tracing::instrument(level = "info", skip(self, key))]
    pub async fn set(&self, provider: Provider, key: &str, validate: bool) -> anyhow::Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow::anyhow!("Please enter an API key"));
        }
        if validate && !validate_api_key(provider, key)? {
            return Err(anyhow::anyhow!("Invalid API key format"));
        }

        let mut table = self.read_table().await?;
        table.insert(provider.storage_key(), key.to_string());
        self.write_table(&table).await?;
        tracing::info!(path = %self.path.display(), "api key saved");
        Ok(())
    }

    /// Remove every provider key; unrelated entries are kept. Returns how
    /// many keys were removed.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn clear(&self) -> anyhow::Result<usize> {
        let mut table = self.read_table().await?;
        let before = table.len();
        for p in Provider::ALL {
            table.remove(&p.storage_key());
        }
        let removed = before - table.len();
        if removed > 0 {
            self.write_table(&table).await?;
        }
        tracing::info!(removed, "api keys cleared");
        Ok(removed)
    }

    pub async fn status(&self) -> Result<Vec<KeyStatus>, CredentialError> {
        let table = self.read_table().await?;
        Ok(Provider::ALL
            .into_iter()
            .map(|provider| match self.env_key(provider) {
                Some(k) => KeyStatus {
                    provider,
                    masked: Some(mask(&k)),
                    from_env: true,
                },
                None => KeyStatus {
                    provider,
                    masked: stored(&table, provider).map(|k| mask(&k)),
                    from_env: false,
                },
            })
            .collect())
    }
}

fn stored(table: &BTreeMap<String, String>, provider: Provider) -> Option<String> {
    table
        .get(&provider.storage_key())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl CredentialAccessor for KeyStore {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn credentials(
        &self,
        providers: &[Provider],
    ) -> Result<HashMap<Provider, Option<String>>, CredentialError> {
        let table = self.read_table().await?;
        Ok(providers
            .iter()
            .map(|p| (*p, self.env_key(*p).or_else(|| stored(&table, *p))))
            .collect())
    }
}

fn key_pattern(provider: Provider) -> &'static str {
    match provider {
        Provider::HuggingFace => r"^hf_[a-zA-Z0-9]{37}$",
        Provider::Cohere => r"^[a-zA-Z0-9]{40,}$",
        Provider::Ai21 => {
            r"^(?i)[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$"
        }
        Provider::Groq => r"^gsk_[a-zA-Z0-9_-]{50,}$",
        Provider::Gemini => r"^AIza[a-zA-Z0-9_-]{35}$",
    }
}

/// Whether `key` looks like a key issued by `provider`.
pub fn validate_api_key(provider: Provider, key: &str) -> anyhow::Result<bool> {
    let re = Regex::new(key_pattern(provider))
        .map_err(|e| anyhow::anyhow!("invalid key pattern for {provider}: {e}"))?;
    Ok(re.is_match(key))
}

/// `gsk_…wxyz` style rendering; short keys are fully hidden.
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
