use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    HuggingFace,
    Cohere,
    Ai21,
    Groq,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::HuggingFace,
        Provider::Cohere,
        Provider::Ai21,
        Provider::Groq,
        Provider::Gemini,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::HuggingFace => "huggingface",
            Provider::Cohere => "cohere",
            Provider::Ai21 => "ai21",
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::HuggingFace => "Hugging Face",
            Provider::Cohere => "Cohere",
            Provider::Ai21 => "AI21 Labs",
            Provider::Groq => "Groq",
            Provider::Gemini => "Google Gemini",
        }
    }

    /// Key under which the credential is persisted, e.g. `groq_key`.
    pub fn storage_key(self) -> String {
        format!("{}_key", self.as_str())
    }

    /// Environment variable that overrides the stored credential.
    pub fn env_var(self) -> String {
        format!("{}_API_KEY", self.as_str().to_ascii_uppercase())
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}
