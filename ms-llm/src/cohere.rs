use crate::adapter::{WireFormat, first, non_empty, string_field};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

const COHERE_GENERATE_PATH: &str = "/v1/generate";
const COHERE_MODEL: &str = "command-light";

pub struct Cohere;

#[derive(Debug, Serialize)]
struct CohereGenerateRequest<'a> {
    model: &'static str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    k: u32,
    stop_sequences: [&'static str; 0],
    return_likelihoods: &'static str,
}

#[derive(Debug, Deserialize)]
struct CohereGeneration {
    #[serde(default)]
    text: Option<String>,
}

impl WireFormat for Cohere {
    const PROVIDER: Provider = Provider::Cohere;
    const BASE_URL: &'static str = "https://api.cohere.ai";
    const TRIM: bool = true;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let req = CohereGenerateRequest {
            model: COHERE_MODEL,
            prompt,
            max_tokens: 1000,
            temperature: 0.7,
            k: 0,
            stop_sequences: [],
            return_likelihoods: "NONE",
        };
        http.post(format!("{base_url}{COHERE_GENERATE_PATH}"))
            .bearer_auth(api_key)
            .json(&req)
    }

    fn error_message(body: serde_json::Value) -> Option<String> {
        string_field(&body, "message")
    }

    fn extract_text(body: serde_json::Value) -> Option<String> {
        non_empty(first::<CohereGeneration>(&body, "generations")?.text)
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
    async fn generation_text_is_trimmed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", COHERE_GENERATE_PATH)
            .match_header("authorization", "Bearer co-key")
            .match_body(Matcher::Json(json!({
                "model": "command-light",
                "prompt": "Hello",
                "max_tokens": 1000,
                "temperature": 0.7,
                "k": 0,
                "stop_sequences": [],
                "return_likelihoods": "NONE"
            })))
            .with_status(200)
            .with_body(r#"{"id":"g1","generations":[{"id":"x","text":"\n  Hello back!  \n"}]}"#)
            .create_async()
            .await;

        let adapter = HttpAdapter::<Cohere>::with_base_url(testing::http(), server.url());
        let outcome = adapter.invoke("Hello", Some("co-key")).await;

        assert_eq!(outcome, Outcome::success("Hello back!"));
    }

    #[tokio::test]
    async fn whitespace_only_generation_is_no_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", COHERE_GENERATE_PATH)
            .with_status(200)
            .with_body(r#"{"generations":[{"text":"   "}]}"#)
            .create_async()
            .await;

        let adapter = HttpAdapter::<Cohere>::with_base_url(testing::http(), server.url());
        let outcome = adapter.invoke("Hello", Some("co-key")).await;

        assert_eq!(outcome, Outcome::failure("No content in response"));
    }

    #[tokio::test]
    async fn error_message_is_top_level_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", COHERE_GENERATE_PATH)
            .with_status(401)
            .with_body(r#"{"message":"invalid api token"}"#)
            .create_async()
            .await;

        let adapter = HttpAdapter::<Cohere>::with_base_url(testing::http(), server.url());
        let outcome = adapter.invoke("Hello", Some("co-key")).await;

        assert_eq!(outcome, Outcome::failure("invalid api token"));
    }

    #[tokio::test]
    async fn unreadable_error_body_falls_back_to_status() {
        let base_url = testing::truncated_error_server().await;

        let adapter = HttpAdapter::<Cohere>::with_base_url(testing::http(), base_url);
        let outcome = adapter.invoke("Hello", Some("co-key")).await;

        assert_eq!(outcome, Outcome::failure("HTTP 500"));
    }

    #[test]
    fn only_the_first_generation_is_read() {
        let body = json!({ "generations": [{ "text": "first" }, "garbage"] });
        assert_eq!(Cohere::extract_text(body), Some("first".to_string()));
    }
}
