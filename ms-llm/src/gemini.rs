use crate::adapter::{WireFormat, first, nested_error_message, non_empty};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

const GEMINI_GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

/// Google Gemini `generateContent`. The key travels in the query string.
pub struct Gemini;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl WireFormat for Gemini {
    const PROVIDER: Provider = Provider::Gemini;
    const BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    const TRIM: bool = true;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let req = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1000,
            },
        };
        http.post(format!("{base_url}{GEMINI_GENERATE_PATH}"))
            .query(&[("key", api_key)])
            .json(&req)
    }

    fn error_message(body: serde_json::Value) -> Option<String> {
        nested_error_message(body)
    }

    fn extract_text(body: serde_json::Value) -> Option<String> {
        let content = body.pointer("/candidates/0/content")?;
        non_empty(first::<GeminiCandidatePart>(content, "parts")?.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HttpAdapter, ProviderAdapter, testing};
    use crate::types::Outcome;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn key_is_sent_as_query_parameter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_GENERATE_PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "AIza-test".into()))
            .match_body(Matcher::Json(json!({
                "contents": [{ "parts": [{ "text": "Hello" }] }],
                "generationConfig": { "temperature": 0.7, "maxOutputTokens": 1000 }
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Hi!\n"}],"role":"model"},"finishReason":"STOP"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let adapter = HttpAdapter::<Gemini>::with_base_url(testing::http(), server.url());
        let outcome = adapter.invoke("Hello", Some("AIza-test")).await;

        assert_eq!(outcome, Outcome::success("Hi!"));
        mock.assert_async().await;
    }

    #[test]
    fn blocked_prompt_without_candidates_has_no_text() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(Gemini::extract_text(body), None);
    }

    #[tokio::test]
    async fn transport_error_does_not_expose_key() {
        let adapter = HttpAdapter::<Gemini>::with_base_url(testing::http(), testing::DEAD_BASE_URL);
        let outcome = adapter.invoke("Hello", Some("AIzaSECRETSECRET")).await;

        let error = outcome.error().expect("unreachable endpoint should fail");
        assert!(!error.contains("AIzaSECRETSECRET"), "key leaked: {error}");
        assert!(!error.contains("key="), "query string leaked: {error}");
    }

    #[test]
    fn malformed_later_candidates_are_ignored() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "kept" }, 7] } },
                { "content": "broken" }
            ]
        });
        assert_eq!(Gemini::extract_text(body), Some("kept".to_string()));
    }
}
