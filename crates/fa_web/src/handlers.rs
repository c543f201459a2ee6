use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fa_core::{AnalysisRequest, MarketSnapshot, NewsItem};
use fa_news::feed::DEFAULT_LIMIT;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::AppState;

const MAX_TRENDING: usize = 50;

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub limit: Option<usize>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 200 with the full result, or 502 when the article could not be fetched.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    info!("📨 Analyze request for {}", request.url);
    match state.pipeline.run(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(error) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": error }))).into_response(),
    }
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Json<Vec<NewsItem>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_TRENDING);
    Json(state.feed.fetch_trending(limit).await)
}

pub async fn market(State(state): State<Arc<AppState>>) -> Json<MarketSnapshot> {
    Json(state.market.fetch().await)
}
