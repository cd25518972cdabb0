use crate::adapter::{WireFormat, first, non_empty, string_field};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

const AI21_COMPLETE_PATH: &str = "/studio/v1/j2-light/complete";

/// AI21 Jurassic-2 Light completions.
pub struct Ai21;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Ai21CompleteRequest<'a> {
    prompt: &'a str,
    num_results: u32,
    max_tokens: u32,
    temperature: f64,
    top_k_return: u32,
    top_p: u32,
    stop_sequences: [&'static str; 0],
}

#[derive(Debug, Deserialize)]
struct Ai21Completion {
    data: Ai21CompletionData,
}

#[derive(Debug, Deserialize)]
struct Ai21CompletionData {
    #[serde(default)]
    text: Option<String>,
}

impl WireFormat for Ai21 {
    const PROVIDER: Provider = Provider::Ai21;
    const BASE_URL: &'static str = "https://api.ai21.com";
    const TRIM: bool = true;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let req = Ai21CompleteRequest {
            prompt,
            num_results: 1,
            max_tokens: 1000,
            temperature: 0.7,
            top_k_return: 0,
            top_p: 1,
            stop_sequences: [],
        };
        http.post(format!("{base_url}{AI21_COMPLETE_PATH}"))
            .bearer_auth(api_key)
            .json(&req)
    }

    fn error_message(body: serde_json::Value) -> Option<String> {
        string_field(&body, "detail").or_else(|| string_field(&body, "message"))
    }

    fn extract_text(body: serde_json::Value) -> Option<String> {
        non_empty(first::<Ai21Completion>(&body, "completions")?.data.text)
    }
}
