use crate::error::CredentialError;
use crate::provider::Provider;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves provider identifiers to stored API keys.
///
/// A missing key is `None`, not an error. `Err` is reserved for a broken
/// store.
#[async_trait]
pub trait CredentialAccessor: Send + Sync {
    async fn credentials(
        &self,
        providers: &[Provider],
    ) -> std::result::Result<HashMap<Provider, Option<String>>, CredentialError>;
}

/// Fixed in-memory credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<Provider, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Provider, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

#[async_trait]
impl CredentialAccessor for StaticCredentials {
    async fn credentials(
        &self,
        providers: &[Provider],
    ) -> std::result::Result<HashMap<Provider, Option<String>>, CredentialError> {
        Ok(providers
            .iter()
            .map(|p| (*p, self.keys.get(p).cloned()))
            .collect())
    }
}
