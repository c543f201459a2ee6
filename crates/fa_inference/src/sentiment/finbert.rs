use std::fmt;

use async_trait::async_trait;
use fa_core::{Error, Result, SentimentBackend, SentimentLabel, SentimentResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::info;
use url::Url;

use crate::analysis::truncate;

/// FinBERT reads at most 512 tokens. Text is cut to this many characters
/// and the endpoint is also asked to truncate what still overflows.
pub const FINBERT_TEXT_BUDGET: usize = 512;

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The inference API nests scores one level deeper for batched input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifierResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassifierResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            ClassifierResponse::Flat(scores) => scores,
        }
    }
}

struct Classifier {
    client: Client,
    endpoint: Url,
}

/// FinBERT served by the Hugging Face inference API.
///
/// The HTTP handle is built on first use and then reused for the lifetime of
/// the backend.
pub struct FinBertSentiment {
    endpoint: String,
    token: Option<String>,
    classifier: OnceCell<Classifier>,
}

impl fmt::Debug for FinBertSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinBertSentiment")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_deref().map(|_| "<redacted>"))
            .field("initialized", &self.classifier.initialized())
            .finish()
    }
}

impl FinBertSentiment {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            classifier: OnceCell::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_initialized(&self) -> bool {
        self.classifier.initialized()
    }

    async fn classifier(&self) -> Result<&Classifier> {
        self.classifier
            .get_or_try_init(|| async {
                let endpoint = Url::parse(&self.endpoint)
                    .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;
                let mut headers = reqwest::header::HeaderMap::new();
                if let Some(token) = &self.token {
                    let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                        .map_err(|e| Error::Inference(format!("invalid token: {}", e)))?;
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
                let client = Client::builder().default_headers(headers).build()?;
                info!("🧠 FinBERT classifier ready at {}", endpoint);
                Ok::<_, Error>(Classifier { client, endpoint })
            })
            .await
    }
}

#[async_trait]
impl SentimentBackend for FinBertSentiment {
    fn name(&self) -> &str {
        "finbert"
    }

    async fn classify(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            return Ok(SentimentResult::neutral());
        }
        let classifier = self.classifier().await?;
        let body = json!({
            "inputs": truncate(text, FINBERT_TEXT_BUDGET),
            "parameters": { "truncation": true },
            "options": { "wait_for_model": true },
        });
        let response = classifier
            .client
            .post(classifier.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ClassifierResponse>()
            .await?;

        let best = response
            .into_scores()
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| Error::MalformedOutput("classifier returned no scores".to_string()))?;

        Ok(match SentimentLabel::parse(&best.label) {
            Some(label) => SentimentResult::new(label, best.score),
            None => SentimentResult::neutral(),
        })
    }
}
