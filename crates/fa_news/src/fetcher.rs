use std::time::Duration;

use fa_core::{Error, Result, StageError, StageOutcome};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info};
use url::Url;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Some publishers refuse requests without a browser user agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Downloads article pages and reduces them to plain text.
///
/// Certificate verification is disabled: several financial news sites serve
/// chains the default verifier rejects. This is a trust relaxation, not a
/// security feature.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())));
        }

        info!("🌐 Fetching {}", url);
        let response = self.client.get(parsed).send().await?.error_for_status()?;
        debug!("Fetch succeeded with status {}", response.status());
        Ok(response.text().await?)
    }

    /// Fetches `url` and returns its visible text, or the failure as data.
    pub async fn fetch_text(&self, url: &str) -> StageOutcome<String> {
        let html = self.fetch_html(url).await.map_err(StageError::from)?;
        Ok(html_to_text(&html))
    }
}

/// Visible text of an HTML document, `script` and `style` contents removed,
/// one non-blank chunk per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| matches!(el.name(), "script" | "style"))
        });
        if !hidden {
            raw.push_str(text);
        }
    }
    normalize_lines(&raw)
}

/// Trims every line, breaks lines on double spaces and drops blank chunks.
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
