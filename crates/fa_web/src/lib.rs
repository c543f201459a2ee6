use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/trending", get(handlers::trending))
        .route("/api/market", get(handlers::market))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, state: AppState) -> fa_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Serving the analysis API on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use fa_core::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use fa_core::Error;
    use fa_inference::models::DummyModel;
    use fa_inference::sentiment::LlmSentiment;
    use fa_inference::{Analyzer, Language};
    use fa_market::{FastInfo, MarketSnapshotter, QuoteProvider};
    use fa_news::{AnalysisPipeline, ContentFetcher, FeedReader, RedirectResolver};
    use httpmock::{Method::GET, MockServer};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct FixedQuotes;

    #[async_trait]
    impl QuoteProvider for FixedQuotes {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fast_info(&self, symbol: &str) -> fa_core::Result<FastInfo> {
            match symbol {
                "BTC-USD" => Ok(FastInfo {
                    last_price: 66000.0,
                    previous_close: Some(60000.0),
                }),
                other => Err(Error::Market(format!("{} unavailable", other))),
            }
        }
    }

    fn state(model: Arc<DummyModel>, feed_url: String) -> AppState {
        let sentiment = Arc::new(LlmSentiment::new(model.clone(), Language::English));
        AppState {
            pipeline: AnalysisPipeline::new(
                RedirectResolver::with_base_url("http://127.0.0.1:9").unwrap(),
                ContentFetcher::with_timeout(Duration::from_secs(2)).unwrap(),
                Analyzer::new(model, sentiment, Language::English),
            ),
            feed: FeedReader::with_url(feed_url).unwrap(),
            market: MarketSnapshotter::with_provider(Arc::new(FixedQuotes)),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn analyze_request(url: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "url": url }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(state(Arc::new(DummyModel::new()), "http://127.0.0.1:9/rss".into())).await;
        let (status, body) = send(
            app,
            Request::builder().uri("/api/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_returns_result() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/story");
            then.status(200)
                .body("<html><body><p>Apple posts record quarterly revenue.</p></body></html>");
        });
        let model = Arc::new(DummyModel::scripted([
            r#"{"label": "positive", "score": 0.7}"#,
            r#"{"company_name": "Apple", "events": ["record revenue"]}"#,
            "Short term: momentum. Long term: services. Risks: China demand.",
        ]));
        let app = create_app(state(model, "http://127.0.0.1:9/rss".into())).await;

        let (status, body) = send(app, analyze_request(&server.url("/story"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentiment"]["label"], "positive");
        assert_eq!(body["extraction"]["Ok"]["company_name"][0], "Apple");
        assert!(body["advice"]["Ok"].as_str().unwrap().starts_with("Short term"));
        assert!(body["article"]["content"]
            .as_str()
            .unwrap()
            .contains("record quarterly revenue"));
    }

    #[tokio::test]
    async fn test_analyze_fetch_failure_is_bad_gateway() {
        let model = Arc::new(DummyModel::new());
        let app = create_app(state(model.clone(), "http://127.0.0.1:9/rss".into())).await;

        let (status, body) = send(app, analyze_request("http://127.0.0.1:9/gone")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]["kind"].is_string());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trending_and_market() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rss");
            then.status(200).body(
                r#"<rss version="2.0"><channel><title>t</title>
<item><title>One</title><link>https://example.com/1</link><pubDate>Wed, 10 Apr 2024 06:30:00 GMT</pubDate></item>
<item><title>Two</title><link>https://example.com/2</link><pubDate>Wed, 10 Apr 2024 05:30:00 GMT</pubDate></item>
</channel></rss>"#,
            );
        });
        let app = create_app(state(Arc::new(DummyModel::new()), server.url("/rss"))).await;

        let (status, body) = send(
            app.clone(),
            Request::builder().uri("/api/trending?limit=1").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "One");

        let (status, body) = send(
            app,
            Request::builder().uri("/api/market").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let snapshot = body.as_object().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(body["Bitcoin"]["symbol"], "BTC-USD");
        assert!((body["Bitcoin"]["change_percent"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_trending_limit_is_capped() {
        let items: String = (0..60)
            .map(|i| {
                format!(
                    "<item><title>Story {i}</title><link>https://example.com/{i}</link><pubDate>Wed, 10 Apr 2024 06:30:00 GMT</pubDate></item>"
                )
            })
            .collect();
        let feed = format!(r#"<rss version="2.0"><channel><title>t</title>{}</channel></rss>"#, items);
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rss");
            then.status(200).body(feed.as_str());
        });
        let app = create_app(state(Arc::new(DummyModel::new()), server.url("/rss"))).await;

        let (status, body) = send(
            app,
            Request::builder().uri("/api/trending?limit=500").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 50);
        assert_eq!(body[49]["title"], "Story 49");
    }
}
