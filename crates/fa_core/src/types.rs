use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Outcome of a stage that is allowed to fail without aborting the run.
pub type StageOutcome<T> = std::result::Result<T, StageError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub url: String,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedArticle {
    /// URL as the user supplied it.
    pub requested_url: String,
    /// URL actually fetched, after redirect resolution.
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    /// Case-insensitive match against the closed vocabulary.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Confidence in `[0.0, 1.0]`.
    pub score: f64,
}

impl SentimentResult {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self { label, score }
    }

    /// The fallback used whenever classification cannot be trusted.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Key facts pulled out of an article by the extraction stage.
///
/// The wire names match the JSON keys the extraction prompt asks for. Every
/// field tolerates being absent, null, or of a slightly different shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(rename = "company_name", default, deserialize_with = "lenient::string_list")]
    pub company_names: Vec<String>,
    #[serde(rename = "stock_code", default, deserialize_with = "lenient::string_list")]
    pub stock_codes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_map")]
    pub financial_data: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub events: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub time_info: String,
}

impl ExtractedInfo {
    pub fn is_empty(&self) -> bool {
        self.company_names.is_empty()
            && self.stock_codes.is_empty()
            && self.financial_data.is_empty()
            && self.events.is_empty()
            && self.time_info.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Advice(pub String);

impl Advice {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one pipeline run produced. Replaced wholesale by the next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub article: FetchedArticle,
    pub sentiment: SentimentResult,
    pub extraction: StageOutcome<ExtractedInfo>,
    pub advice: StageOutcome<Advice>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Timestamp exactly as the feed printed it.
    pub published: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub previous_close: f64,
    pub change_percent: f64,
}

/// Quotes keyed by display name. Symbols that failed are simply absent.
pub type MarketSnapshot = BTreeMap<String, MarketQuote>;

mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
        let items: Vec<String> = match Value::deserialize(de)? {
            Value::Array(items) => items.iter().filter_map(scalar).collect(),
            other => scalar(&other).into_iter().collect(),
        };
        Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
    }

    pub fn string_map<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => BTreeMap::new(),
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(scalar(&Value::deserialize(de)?).unwrap_or_default())
    }
}
