use std::time::Duration;

use async_trait::async_trait;
use fa_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Last traded price and the prior session's close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastInfo {
    pub last_price: f64,
    pub previous_close: Option<f64>,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fast_info(&self, symbol: &str) -> Result<FastInfo>;
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
}

/// Reads quotes from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooQuoteProvider {
    client: Client,
    base_url: String,
}

impl YahooQuoteProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_CHART_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "1d");
        Ok(url)
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fast_info(&self, symbol: &str) -> Result<FastInfo> {
        let url = self.chart_url(symbol)?;
        debug!("Requesting chart for {} from {}", symbol, url);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_chart(symbol, &body)
    }
}

fn parse_chart(symbol: &str, body: &str) -> Result<FastInfo> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;
    if let Some(err) = envelope.chart.error {
        return Err(Error::Market(format!(
            "{}: {} {}",
            symbol, err.code, err.description
        )));
    }
    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
        .ok_or_else(|| Error::Market(format!("{}: empty chart result", symbol)))?;
    let last_price = meta
        .regular_market_price
        .ok_or_else(|| Error::Market(format!("{}: no last price", symbol)))?;
    Ok(FastInfo {
        last_price,
        previous_close: meta.chart_previous_close.or(meta.previous_close),
    })
}
