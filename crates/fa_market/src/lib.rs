use std::sync::Arc;

use fa_core::{MarketQuote, MarketSnapshot, Result};
use tracing::{info, warn};

pub mod provider;

pub use provider::{FastInfo, QuoteProvider, YahooQuoteProvider};

/// Symbols shown on the dashboard, with their display names.
pub const DEFAULT_TICKERS: [(&str, &str); 4] = [
    ("^GSPC", "S&P 500"),
    ("^IXIC", "Nasdaq"),
    ("^TWII", "台灣加權"),
    ("BTC-USD", "Bitcoin"),
];

/// Percent move from `previous_close` to `last`, or `None` when there is no
/// usable previous close.
pub fn change_percent(last: f64, previous_close: Option<f64>) -> Option<f64> {
    match previous_close {
        Some(prev) if prev != 0.0 && prev.is_finite() => Some((last - prev) / prev * 100.0),
        _ => None,
    }
}

pub struct MarketSnapshotter {
    provider: Arc<dyn QuoteProvider>,
    tickers: Vec<(String, String)>,
}

impl std::fmt::Debug for MarketSnapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketSnapshotter")
            .field("provider", &self.provider.name())
            .field("tickers", &self.tickers)
            .finish()
    }
}

impl MarketSnapshotter {
    pub fn new() -> Result<Self> {
        Ok(Self::with_provider(Arc::new(YahooQuoteProvider::new()?)))
    }

    pub fn with_provider(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            tickers: DEFAULT_TICKERS
                .iter()
                .map(|(symbol, name)| (symbol.to_string(), name.to_string()))
                .collect(),
        }
    }

    pub fn with_tickers<I, S, N>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<String>,
    {
        self.tickers = tickers
            .into_iter()
            .map(|(symbol, name)| (symbol.into(), name.into()))
            .collect();
        self
    }

    pub fn tickers(&self) -> &[(String, String)] {
        &self.tickers
    }

    /// One lookup per ticker. A failing symbol is logged and left out; the
    /// rest of the snapshot is still returned.
    pub async fn fetch(&self) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new();
        for (symbol, name) in &self.tickers {
            match self.quote(symbol, name).await {
                Ok(Some(quote)) => {
                    snapshot.insert(name.clone(), quote);
                }
                Ok(None) => warn!("⚠️ {} has no previous close, skipping", symbol),
                Err(e) => warn!("⚠️ Failed to fetch {}: {}", symbol, e),
            }
        }
        info!("📈 Market snapshot has {}/{} symbols", snapshot.len(), self.tickers.len());
        snapshot
    }

    async fn quote(&self, symbol: &str, name: &str) -> Result<Option<MarketQuote>> {
        let info = self.provider.fast_info(symbol).await?;
        let Some(change) = change_percent(info.last_price, info.previous_close) else {
            return Ok(None);
        };
        Ok(Some(MarketQuote {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price: info.last_price,
            previous_close: info.previous_close.unwrap_or_default(),
            change_percent: change,
        }))
    }
}
