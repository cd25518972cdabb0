//! Prompt fan-out across hosted text-generation providers.
//!
//! Pure HTTP client. Credential storage and transport live in `ms-app`.

mod adapter;
mod ai21;
mod cohere;
mod credentials;
mod engine;
mod error;
mod gemini;
mod groq;
mod huggingface;
mod provider;
mod types;

pub use adapter::{HttpAdapter, ProviderAdapter, WireFormat};
pub use ai21::Ai21;
pub use cohere::Cohere;
pub use credentials::{CredentialAccessor, StaticCredentials};
pub use engine::{Dispatcher, build_http_client};
pub use error::{CredentialError, LlmError, Result};
pub use gemini::Gemini;
pub use groq::Groq;
pub use huggingface::HuggingFace;
pub use provider::{Provider, UnknownProvider};
pub use types::{NO_API_KEY, Outcome, ResultMapping};
