use crate::adapter::{HttpAdapter, ProviderAdapter};
use crate::ai21::Ai21;
use crate::cohere::Cohere;
use crate::credentials::CredentialAccessor;
use crate::error::LlmError;
use crate::gemini::Gemini;
use crate::groq::Groq;
use crate::huggingface::HuggingFace;
use crate::provider::Provider;
use crate::types::{Outcome, ResultMapping};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP client for all adapters.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(%e, "reqwest client build failed; falling back to default client");
            reqwest::Client::new()
        })
}

/// Fans one prompt out to every provider and collects one outcome each.
pub struct Dispatcher {
    adapters: [Box<dyn ProviderAdapter>; Provider::ALL.len()],
    credentials: Arc<dyn CredentialAccessor>,
}

impl Dispatcher {
    pub fn new(http: reqwest::Client, credentials: Arc<dyn CredentialAccessor>) -> Self {
        Self {
            adapters: [
                Box::new(HttpAdapter::<HuggingFace>::new(http.clone())),
                Box::new(HttpAdapter::<Cohere>::new(http.clone())),
                Box::new(HttpAdapter::<Ai21>::new(http.clone())),
                Box::new(HttpAdapter::<Groq>::new(http.clone())),
                Box::new(HttpAdapter::<Gemini>::new(http)),
            ],
            credentials,
        }
    }

    /// Replace the adapter registered for `adapter.provider()`.
    pub fn with_adapter(mut self, adapter: Box<dyn ProviderAdapter>) -> Self {
        let slot = adapter.provider().index();
        self.adapters[slot] = adapter;
        self
    }

    pub fn adapter(&self, provider: Provider) -> &dyn ProviderAdapter {
        self.adapters[provider.index()].as_ref()
    }

    /// Run every adapter concurrently and wait for all of them to settle.
    ///
    /// Always returns exactly one entry per provider. A credential store
    /// failure is reported on every entry and no adapter runs.
    #[tracing::instrument(level = "info", skip_all, fields(prompt_chars = prompt.len()))]
    pub async fn dispatch_all(&self, prompt: &str) -> ResultMapping {
        let keys = match self.credentials.credentials(&Provider::ALL).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(error = %e, "credential read failed; failing every provider");
                let error = e.to_string();
                return Provider::ALL
                    .into_iter()
                    .map(|p| (p, Outcome::failure(error.clone())))
                    .collect();
            }
        };

        let pending = Provider::ALL.into_iter().map(|provider| {
            let credential = keys.get(&provider).cloned().flatten();
            let adapter = self.adapter(provider);
            async move {
                let outcome = settle(adapter.invoke(prompt, credential.as_deref())).await;
                (provider, outcome)
            }
        });

        let results: ResultMapping = futures_util::future::join_all(pending)
            .await
            .into_iter()
            .collect();

        let succeeded = results.values().filter(|o| o.is_success()).count();
        tracing::info!(succeeded, total = results.len(), "dispatch settled");
        results
    }

    /// Invoke a single provider with a caller-supplied key, bypassing the
    /// credential store.
    #[tracing::instrument(level = "info", skip_all, fields(provider = %provider_id))]
    pub async fn test_one(
        &self,
        provider_id: &str,
        credential: Option<&str>,
        prompt: &str,
    ) -> Outcome {
        let Ok(provider) = provider_id.parse::<Provider>() else {
            tracing::warn!("unknown provider requested");
            return LlmError::UnknownProvider.into();
        };
        settle(self.adapter(provider).invoke(prompt, credential)).await
    }
}

/// Await `fut`, turning a panic into a failure outcome.
async fn settle<F>(fut: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_payload_to_string(payload.as_ref());
            tracing::error!(panic_payload = %message, "adapter panicked");
            LlmError::Panicked(message).into()
        }
    }
}

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
