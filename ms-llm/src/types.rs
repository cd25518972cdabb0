use crate::error::LlmError;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure token reserved for "no credential stored for this provider".
pub const NO_API_KEY: &str = "NO_API_KEY";

/// Normalized result of one adapter invocation.
///
/// On the wire this is `{"success": true, "data": ...}` or
/// `{"success": false, "error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OutcomeWire", try_from = "OutcomeWire")]
pub enum Outcome {
    Success { data: String },
    Failure { error: String },
}

impl Outcome {
    pub fn success(data: impl Into<String>) -> Self {
        Self::Success { data: data.into() }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::Failure { error } if error == NO_API_KEY)
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

impl From<LlmError> for Outcome {
    fn from(e: LlmError) -> Self {
        Self::failure(e.to_string())
    }
}

impl From<crate::error::Result<String>> for Outcome {
    fn from(r: crate::error::Result<String>) -> Self {
        match r {
            Ok(data) => Self::Success { data },
            Err(e) => e.into(),
        }
    }
}

/// One outcome per provider, keyed by provider token.
pub type ResultMapping = BTreeMap<Provider, Outcome>;

#[derive(Serialize, Deserialize)]
struct OutcomeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Outcome> for OutcomeWire {
    fn from(o: Outcome) -> Self {
        match o {
            Outcome::Success { data } => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Outcome::Failure { error } => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<OutcomeWire> for Outcome {
    type Error = String;

    fn try_from(w: OutcomeWire) -> std::result::Result<Self, Self::Error> {
        match (w.success, w.data, w.error) {
            (true, Some(data), None) => Ok(Outcome::Success { data }),
            (false, None, error) => Ok(Outcome::Failure {
                error: error.unwrap_or_else(|| "Unknown error occurred".to_string()),
            }),
            (true, _, _) => Err("success outcome must carry data and no error".to_string()),
            (false, Some(_), _) => Err("failure outcome must not carry data".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_wire_shape_matches_extension_messages() {
        let ok = serde_json::to_value(Outcome::success("hi")).expect("serialize success");
        assert_eq!(ok, json!({ "success": true, "data": "hi" }));

        let err = serde_json::to_value(Outcome::from(LlmError::NoCredential))
            .expect("serialize failure");
        assert_eq!(err, json!({ "success": false, "error": "NO_API_KEY" }));
    }

    #[test]
    fn outcome_rejects_mixed_variants() {
        let mixed = json!({ "success": true, "data": "x", "error": "y" });
        assert!(serde_json::from_value::<Outcome>(mixed).is_err());

        let failure_with_data = json!({ "success": false, "data": "x" });
        assert!(serde_json::from_value::<Outcome>(failure_with_data).is_err());
    }

    #[test]
    fn result_mapping_serializes_keyed_by_provider_token() {
        let mut map = ResultMapping::new();
        map.insert(Provider::Groq, Outcome::success("a"));
        map.insert(Provider::Cohere, Outcome::failure("HTTP 500"));
        let v = serde_json::to_value(&map).expect("serialize mapping");
        assert_eq!(
            v,
            json!({
                "cohere": { "success": false, "error": "HTTP 500" },
                "groq": { "success": true, "data": "a" },
            })
        );
    }

    #[test]
    fn missing_credential_is_recognized() {
        assert!(Outcome::from(LlmError::NoCredential).is_missing_credential());
        assert!(!Outcome::from(LlmError::NoContent).is_missing_credential());
        assert_eq!(
            Outcome::from(LlmError::NoContent).error(),
            Some("No content in response")
        );
    }
}
