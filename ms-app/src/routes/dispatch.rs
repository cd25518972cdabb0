use crate::server::AppState;
use crate::transport::Request;
use axum::routing::post;
use axum::{Extension, Json};
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/dispatch", post(dispatch))
}

/// Relay one transport message and answer with its reply.
#[tracing::instrument(level = "info", skip_all)]
async fn dispatch(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<Request>,
) -> Json<serde_json::Value> {
    let reply = match state.transport.request(request).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "transport failed");
            return Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
            }));
        }
    };
    match serde_json::to_value(reply) {
        Ok(v) => Json(v),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("failed to serialize reply: {e}"),
        })),
    }
}
