use axum::Json;
use axum::routing::get;
use ms_llm::Provider;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_health() -> Json<serde_json::Value> {
    let providers: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
    Json(serde_json::json!({
        "status": "ok",
        "providers": providers,
    }))
}
