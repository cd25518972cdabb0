use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Everything that can go wrong inside one adapter invocation.
///
/// The `Display` text is exactly what ends up in `Outcome::Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("NO_API_KEY")]
    NoCredential,

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    ResponseFormat(String),

    #[error("No content in response")]
    NoContent,

    #[error("Unknown LLM provider")]
    UnknownProvider,

    #[error("{0}")]
    Panicked(String),
}

/// Drops the request URL, which carries the Gemini key in its query string.
impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}

/// Failure of the credential store itself (not a missing key).
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("credential store corrupt: {0}")]
    Corrupt(String),
}
