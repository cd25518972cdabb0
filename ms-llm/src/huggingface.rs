use crate::adapter::{WireFormat, non_empty, string_field};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

const HUGGINGFACE_MODEL_PATH: &str = "/models/microsoft/DialoGPT-medium";

/// Hugging Face hosted inference API.
pub struct HuggingFace;

#[derive(Debug, Serialize)]
struct HfInferenceRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters,
    options: HfOptions,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    max_length: u32,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct HfOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct HfGeneration {
    #[serde(default)]
    generated_text: Option<String>,
    #[serde(default)]
    summary_text: Option<String>,
    #[serde(default)]
    translation_text: Option<String>,
}

impl WireFormat for HuggingFace {
    const PROVIDER: Provider = Provider::HuggingFace;
    const BASE_URL: &'static str = "https://api-inference.huggingface.co";
    const TRIM: bool = false;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let req = HfInferenceRequest {
            inputs: prompt,
            parameters: HfParameters {
                max_length: 1000,
                temperature: 0.7,
                return_full_text: false,
            },
            options: HfOptions {
                wait_for_model: true,
            },
        };
        http.post(format!("{base_url}{HUGGINGFACE_MODEL_PATH}"))
            .bearer_auth(api_key)
            .json(&req)
    }

    fn error_message(body: serde_json::Value) -> Option<String> {
        string_field(&body, "error")
    }

    /// Inference endpoints answer either with a list of generations or a
    /// single object depending on the pipeline behind the model.
    fn extract_text(body: serde_json::Value) -> Option<String> {
        match body {
            serde_json::Value::Array(items) => {
                let g: HfGeneration = serde_json::from_value(items.into_iter().next()?).ok()?;
                non_empty(g.generated_text)
                    .or_else(|| non_empty(g.summary_text))
                    .or_else(|| non_empty(g.translation_text))
            }
            single => {
                let g: HfGeneration = serde_json::from_value(single).ok()?;
                non_empty(g.generated_text)
            }
        }
    }
}
