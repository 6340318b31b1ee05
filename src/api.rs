use crate::aggregator::Aggregator;
use crate::worker::IngestPool;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Shared state for the query and ingest handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<IngestPool>,
    pub aggregator: Arc<Aggregator>,
}

/// Build the API router: one ingest endpoint, four query endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ingest", post(ingest))
        .route("/api/topk", get(window_top_k))
        .route("/api/history", get(global_top_k))
        .route("/api/range", get(range_top_k))
        .route("/api/trending", get(trending))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct WordCountItem {
    word: String,
    count: u64,
}

#[derive(Debug, Serialize)]
struct TopKResponse {
    status: &'static str,
    data: Vec<WordCountItem>,
}

impl TopKResponse {
    fn from_counts(counts: Vec<crate::aggregator::WordCount>) -> Self {
        Self {
            status: "success",
            data: counts
                .into_iter()
                .map(|c| WordCountItem {
                    word: c.word,
                    count: c.count,
                })
                .collect(),
        }
    }
}

/// POST /api/ingest — enqueue one raw line. The queue is the commitment
/// boundary: 200 means enqueued, not that the line survived parsing.
async fn ingest(State(state): State<AppState>, body: String) -> impl IntoResponse {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    match state.pool.push_task(body) {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "ingest rejected");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopKParams {
    k: Option<usize>,
}

/// GET /api/topk — top tokens within the sliding ten-minute window.
async fn window_top_k(
    State(state): State<AppState>,
    Query(params): Query<TopKParams>,
) -> Json<TopKResponse> {
    let k = params.k.unwrap_or(10);
    Json(TopKResponse::from_counts(state.aggregator.window_top_k(k)))
}

/// GET /api/history — top tokens since startup.
async fn global_top_k(
    State(state): State<AppState>,
    Query(params): Query<TopKParams>,
) -> Json<TopKResponse> {
    let k = params.k.unwrap_or(20);
    Json(TopKResponse::from_counts(state.aggregator.global_top_k(k)))
}

#[derive(Debug, Deserialize)]
struct RangeParams {
    start: Option<i64>,
    end: Option<i64>,
    k: Option<usize>,
}

/// GET /api/range — top tokens over an arbitrary closed timestamp range;
/// `end` defaults to the current epoch milliseconds.
async fn range_top_k(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Json<TopKResponse> {
    let start = params.start.unwrap_or(0);
    let end = params.end.unwrap_or_else(now_ms);
    let k = params.k.unwrap_or(10);
    Json(TopKResponse::from_counts(
        state.aggregator.range_top_k(start, end, k),
    ))
}

#[derive(Debug, Deserialize)]
struct TrendingParams {
    k: Option<usize>,
    threshold: Option<u64>,
}

#[derive(Debug, Serialize)]
struct TrendItem {
    word: String,
    slope: f64,
    count: u64,
    tag: &'static str,
}

#[derive(Debug, Serialize)]
struct TrendingResponse {
    status: &'static str,
    timestamp: i64,
    data: Vec<TrendItem>,
}

/// GET /api/trending — tokens ranked by |slope| of their windowed
/// per-second frequency.
async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Json<TrendingResponse> {
    let k = params.k.unwrap_or(3);
    let threshold = params.threshold.unwrap_or(5);

    let data = state
        .aggregator
        .trending(k, threshold)
        .into_iter()
        .map(|t| TrendItem {
            tag: trend_tag(t.slope),
            word: t.word,
            slope: t.slope,
            count: t.total,
        })
        .collect();

    Json(TrendingResponse {
        status: "success",
        timestamp: now_ms(),
        data,
    })
}

/// Classify a slope as rising, falling or stable.
fn trend_tag(slope: f64) -> &'static str {
    if slope > 1.0 {
        "rising"
    } else if slope < -1.0 {
        "falling"
    } else {
        "stable"
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_tag_thresholds() {
        assert_eq!(trend_tag(2.0), "rising");
        assert_eq!(trend_tag(1.0), "stable");
        assert_eq!(trend_tag(0.0), "stable");
        assert_eq!(trend_tag(-1.0), "stable");
        assert_eq!(trend_tag(-1.5), "falling");
    }
}
