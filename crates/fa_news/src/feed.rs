use std::time::Duration;

use chrono::{DateTime, Utc};
use fa_core::{Error, NewsItem, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::fetcher::BROWSER_USER_AGENT;

/// Finance headlines from the last day, Taiwan edition.
pub const TRENDING_FEED_URL: &str =
    "https://news.google.com/rss/search?q=finance+when:1d&hl=zh-TW&gl=TW&ceid=TW:zh-Hant";
pub const YAHOO_FINANCE_FEED_URL: &str = "https://finance.yahoo.com/news/rssindex";
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
}

/// Reads trending headlines from an RSS 2.0 feed.
#[derive(Debug, Clone)]
pub struct FeedReader {
    client: Client,
    url: String,
}

impl FeedReader {
    pub fn new() -> Result<Self> {
        Self::with_url(TRENDING_FEED_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Up to `limit` items. An empty list means the feed is unavailable
    /// right now, not that there is no news.
    pub async fn fetch_trending(&self, limit: usize) -> Vec<NewsItem> {
        match self.try_fetch(limit).await {
            Ok(items) => {
                info!("📰 Fetched {} trending items from {}", items.len(), self.url);
                items
            }
            Err(e) => {
                warn!("⚠️ Error fetching trending news from {}: {}", self.url, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_feed(&body, limit)
    }
}

pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let rss: Rss = quick_xml::de::from_str(xml).map_err(|e| Error::Feed(e.to_string()))?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .filter(|item| !item.link.trim().is_empty())
        .take(limit)
        .map(|item| NewsItem {
            published_at: DateTime::parse_from_rfc2822(item.pub_date.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            title: item.title.trim().to_string(),
            link: item.link.trim().to_string(),
            published: item.pub_date,
        })
        .collect())
}
