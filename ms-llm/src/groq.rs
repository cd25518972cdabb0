use crate::adapter::{WireFormat, first, nested_error_message, non_empty};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

const GROQ_CHAT_COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";
const GROQ_MODEL: &str = "llama3-8b-8192";

/// OpenAI-compatible chat completions served by Groq.
pub struct Groq;

#[derive(Debug, Serialize)]
struct GroqChatRequest<'a> {
    model: &'static str,
    messages: [GroqMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
    top_p: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GroqMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl WireFormat for Groq {
    const PROVIDER: Provider = Provider::Groq;
    const BASE_URL: &'static str = "https://api.groq.com";
    const TRIM: bool = false;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let req = GroqChatRequest {
            model: GROQ_MODEL,
            messages: [GroqMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 1,
            stream: false,
        };
        http.post(format!("{base_url}{GROQ_CHAT_COMPLETIONS_PATH}"))
            .bearer_auth(api_key)
            .json(&req)
    }

    fn error_message(body: serde_json::Value) -> Option<String> {
        nested_error_message(body)
    }

    fn extract_text(body: serde_json::Value) -> Option<String> {
        let choice: GroqChoice = first(&body, "choices")?;
        non_empty(choice.message.content)
    }
}
