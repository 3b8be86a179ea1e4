// src/api/routes.rs
// =============================================================================
// HTTP handlers.
//
// - POST /load_urls   JSON array of URLs -> queued for fetching
// - GET  /get_titles  every stored {url, title, timestamp}
// - GET  /health      queue depth and dedup set sizes
// - POST /reset       forget completed URLs so they can be fetched again
//
// The handlers never fetch anything themselves: /load_urls only enqueues,
// /get_titles only reads the store.
// =============================================================================

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::error::ApiError;
use super::payload::parse_url_batch;
use crate::pipeline::{DedupStore, SubmitSummary, Submitter};
use crate::store::{FetchRecord, TitleSink};

// Shared handles given to every handler
#[derive(Clone)]
pub struct AppState {
    pub submitter: Submitter,
    pub dedup: Arc<DedupStore>,
    pub store: Arc<dyn TitleSink>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub forgotten: usize,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/load_urls", post(load_urls))
        .route("/get_titles", get(get_titles))
        .route("/health", get(health))
        .route("/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn load_urls(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitSummary>, ApiError> {
    let urls = parse_url_batch(&headers, &body)?;
    let summary = state.submitter.submit(urls)?;
    Ok(Json(summary))
}

async fn get_titles(State(state): State<AppState>) -> Result<Json<Vec<FetchRecord>>, ApiError> {
    let records = state.store.query_all().await?;
    Ok(Json(records))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.dedup.counts();
    Json(HealthResponse {
        status: "ok",
        queued: state.submitter.queue_depth(),
        in_flight: counts.in_flight,
        completed: counts.completed,
    })
}

// Stored rows are kept; only the "already fetched" memory is cleared
async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    let forgotten = state.dedup.reset();
    info!(forgotten, "completed URLs forgotten");
    Json(ResetResponse { forgotten })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{self, QueueReceiver};
    use crate::store::SqliteStore;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::util::ServiceExt; // for `oneshot`

    struct Harness {
        app: Router,
        rx: QueueReceiver,
        store: Arc<SqliteStore>,
        dedup: Arc<DedupStore>,
        submitter: Submitter,
    }

    fn harness() -> Harness {
        let (tx, rx) = pipeline::unbounded();
        let dedup = Arc::new(DedupStore::new());
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let submitter = Submitter::new(tx, dedup.clone());
        let app = create_app(AppState {
            submitter: submitter.clone(),
            dedup: dedup.clone(),
            store: store.clone(),
        });
        Harness {
            app,
            rx,
            store,
            dedup,
            submitter,
        }
    }

    fn post_urls(content_type: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/load_urls");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_load_urls_queues_distinct_urls() {
        let h = harness();
        let response = h
            .app
            .oneshot(post_urls(
                Some("application/json"),
                r#"["http://a.test","http://a.test","http://b.test"]"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["queued"], 2);
        assert_eq!(body["duplicates"], 1);

        assert_eq!(h.rx.pop().await.as_deref(), Some("http://a.test"));
        assert_eq!(h.rx.pop().await.as_deref(), Some("http://b.test"));
    }

    #[tokio::test]
    async fn test_load_urls_rejects_object_body() {
        let h = harness();
        let response = h
            .app
            .oneshot(post_urls(Some("application/json"), r#"{"x":1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "bad_request");
        assert!(h.store.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_urls_requires_json_content_type() {
        let h = harness();
        let response = h
            .app
            .oneshot(post_urls(None, r#"["http://a.test"]"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.submitter.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_get_titles_returns_stored_records() {
        let h = harness();
        h.store
            .upsert(&FetchRecord {
                url: "http://u1.test".to_string(),
                title: "Title One".to_string(),
                timestamp: 100,
            })
            .await
            .unwrap();
        h.store
            .upsert(&FetchRecord {
                url: "http://u2.test".to_string(),
                title: "Title Two".to_string(),
                timestamp: 200,
            })
            .await
            .unwrap();

        let response = h.app.oneshot(get_request("/get_titles")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let records: Vec<FetchRecord> = serde_json::from_value(body).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.url == "http://u1.test" && r.title == "Title One"));
        assert!(records.iter().any(|r| r.url == "http://u2.test" && r.title == "Title Two"));
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        h.dedup.try_claim("http://busy.test");

        let response = h.app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["in_flight"], 1);
        assert_eq!(body["queued"], 0);
    }

    #[tokio::test]
    async fn test_reset_makes_completed_urls_submittable() {
        let h = harness();
        h.dedup.try_claim("http://done.test");
        h.dedup.mark_completed("http://done.test");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/reset")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["forgotten"], 1);
        assert!(!h.dedup.is_completed("http://done.test"));

        let response = h
            .app
            .oneshot(post_urls(Some("application/json"), r#"["http://done.test"]"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["queued"], 1);
        assert_eq!(body["already_completed"], 0);
        assert_eq!(h.rx.pop().await.as_deref(), Some("http://done.test"));
    }
}
