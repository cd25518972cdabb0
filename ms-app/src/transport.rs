//! In-process message boundary between UI surfaces and the dispatcher.
//!
//! Callers send a [`Request`] and receive exactly one [`Reply`]. Each request
//! runs on its own task so a slow dispatch never blocks a connection test.

use ms_llm::{Dispatcher, Outcome, Provider, ResultMapping};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "operation")]
pub enum Request {
    #[serde(rename = "searchAll", alias = "searchLLMs")]
    SearchAll { prompt: String },
    #[serde(rename = "testOne", alias = "testConnection")]
    TestOne {
        #[serde(alias = "llm")]
        provider: String,
        #[serde(default, alias = "apiKey")]
        credential: Option<String>,
        prompt: String,
    },
}

impl Request {
    fn operation(&self) -> &'static str {
        match self {
            Request::SearchAll { .. } => "searchAll",
            Request::TestOne { .. } => "testOne",
        }
    }

    fn prompt(&self) -> &str {
        match self {
            Request::SearchAll { prompt } | Request::TestOne { prompt, .. } => prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Results(ResultMapping),
    Outcome(Outcome),
}

/// Run one request to completion. The reply shape depends only on the
/// operation: `searchAll` always yields a mapping, `testOne` an outcome.
#[tracing::instrument(level = "info", skip_all, fields(operation = request.operation()))]
pub async fn handle(dispatcher: &Dispatcher, request: Request) -> Reply {
    let prompt = request.prompt().trim();
    if prompt.is_empty() {
        let rejected = Outcome::failure("Please enter a prompt");
        return match &request {
            Request::SearchAll { .. } => Reply::Results(
                Provider::ALL
                    .into_iter()
                    .map(|p| (p, rejected.clone()))
                    .collect(),
            ),
            Request::TestOne { .. } => Reply::Outcome(rejected),
        };
    }

    match &request {
        Request::SearchAll { .. } => Reply::Results(dispatcher.dispatch_all(prompt).await),
        Request::TestOne {
            provider,
            credential,
            ..
        } => Reply::Outcome(
            dispatcher
                .test_one(provider, credential.as_deref(), prompt)
                .await,
        ),
    }
}

struct Envelope {
    id: Uuid,
    request: Request,
    reply: oneshot::Sender<Reply>,
}

#[derive(Clone)]
pub struct TransportHandle {
    tx: mpsc::Sender<Envelope>,
}

impl TransportHandle {
    /// Send `request` and wait for its reply.
    pub async fn request(&self, request: Request) -> anyhow::Result<Reply> {
        let (reply, rx) = oneshot::channel();
        let envelope = Envelope {
            id: Uuid::new_v4(),
            request,
            reply,
        };
        self.tx
            .send(envelope)
            .await
            .map_err(|_| anyhow::anyhow!("transport closed"))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("transport dropped the reply channel"))
    }
}

/// Start the router task. It exits once every handle is dropped.
pub fn spawn(dispatcher: Arc<Dispatcher>) -> (TransportHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);
    let router = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let Envelope { id, request, reply } = envelope;
                tracing::debug!(request_id = %id, "request received");
                let value = handle(&dispatcher, request).await;
                if reply.send(value).is_err() {
                    tracing::debug!(request_id = %id, "caller went away before reply");
                }
            });
        }
        tracing::debug!("transport router stopped");
    });
    (TransportHandle { tx }, router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ms_llm::{NO_API_KEY, ProviderAdapter, StaticCredentials};
    use serde_json::json;
    use std::time::Duration;

    struct Canned(Provider);

    #[async_trait]
    impl ProviderAdapter for Canned {
        fn provider(&self) -> Provider {
            self.0
        }

        async fn invoke(&self, prompt: &str, credential: Option<&str>) -> Outcome {
            match credential {
                Some(_) => Outcome::success(format!("{}: {prompt}", self.0)),
                None => Outcome::failure(NO_API_KEY),
            }
        }
    }

    fn dispatcher() -> Arc<Dispatcher> {
        let credentials = StaticCredentials::new().with(Provider::Groq, "gsk");
        let http = ms_llm::build_http_client(Duration::from_secs(1));
        let d = Provider::ALL.into_iter().fold(
            Dispatcher::new(http, Arc::new(credentials)),
            |d, p| d.with_adapter(Box::new(Canned(p))),
        );
        Arc::new(d)
    }

    #[test]
    fn parses_current_and_legacy_message_shapes() {
        let r: Request = serde_json::from_value(json!({ "operation": "searchAll", "prompt": "Hi" }))
            .expect("parse searchAll");
        assert_eq!(
            r,
            Request::SearchAll {
                prompt: "Hi".to_string()
            }
        );

        let r: Request = serde_json::from_value(json!({
            "operation": "testConnection",
            "llm": "groq",
            "apiKey": "gsk_x",
            "prompt": "Hi"
        }))
        .expect("parse legacy testConnection");
        assert_eq!(
            r,
            Request::TestOne {
                provider: "groq".to_string(),
                credential: Some("gsk_x".to_string()),
                prompt: "Hi".to_string()
            }
        );

        let unknown = serde_json::from_value::<Request>(json!({ "operation": "purge" }));
        assert!(unknown.is_err());
    }

    #[tokio::test]
    async fn search_all_reply_has_every_provider() {
        let (transport, _router) = spawn(dispatcher());
        let reply = transport
            .request(Request::SearchAll {
                prompt: "Hello".to_string(),
            })
            .await
            .expect("reply");

        let Reply::Results(results) = reply else {
            panic!("expected a result mapping");
        };
        assert_eq!(results.len(), Provider::ALL.len());
        assert_eq!(results[&Provider::Groq], Outcome::success("groq: Hello"));
        assert!(results[&Provider::Cohere].is_missing_credential());
    }

    #[tokio::test]
    async fn reply_serializes_like_extension_messages() {
        let reply = handle(
            &dispatcher(),
            Request::SearchAll {
                prompt: "Hello".to_string(),
            },
        )
        .await;
        let v = serde_json::to_value(&reply).expect("serialize reply");
        assert_eq!(v["groq"], json!({ "success": true, "data": "groq: Hello" }));
        assert_eq!(v["gemini"], json!({ "success": false, "error": "NO_API_KEY" }));
    }

    #[tokio::test]
    async fn test_one_replies_with_single_outcome() {
        let (transport, _router) = spawn(dispatcher());
        let reply = transport
            .request(Request::TestOne {
                provider: "cohere".to_string(),
                credential: Some("candidate".to_string()),
                prompt: "ping".to_string(),
            })
            .await
            .expect("reply");
        assert_eq!(reply, Reply::Outcome(Outcome::success("cohere: ping")));

        let reply = transport
            .request(Request::TestOne {
                provider: "bard".to_string(),
                credential: Some("k".to_string()),
                prompt: "ping".to_string(),
            })
            .await
            .expect("reply");
        assert_eq!(
            reply,
            Reply::Outcome(Outcome::failure("Unknown LLM provider"))
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_in_the_operation_reply_shape() {
        let reply = handle(
            &dispatcher(),
            Request::SearchAll {
                prompt: "   ".to_string(),
            },
        )
        .await;
        let Reply::Results(results) = reply else {
            panic!("searchAll must always reply with a result mapping");
        };
        assert_eq!(results.len(), Provider::ALL.len());
        assert!(
            results
                .values()
                .all(|o| *o == Outcome::failure("Please enter a prompt"))
        );

        let reply = handle(
            &dispatcher(),
            Request::TestOne {
                provider: "groq".to_string(),
                credential: Some("gsk".to_string()),
                prompt: String::new(),
            },
        )
        .await;
        assert_eq!(
            reply,
            Reply::Outcome(Outcome::failure("Please enter a prompt"))
        );
    }

    #[tokio::test]
    async fn router_stops_when_handles_are_dropped() {
        let (transport, router) = spawn(dispatcher());
        drop(transport);
        tokio::time::timeout(Duration::from_secs(1), router)
            .await
            .expect("router should stop")
            .expect("router task should not panic");
    }
}
