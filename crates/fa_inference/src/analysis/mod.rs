use std::fmt;
use std::sync::Arc;

use fa_core::{
    Advice, ChatModel, Error, ExtractedInfo, SentimentBackend, SentimentLabel, SentimentResult,
    StageError, StageOutcome,
};
use tracing::{debug, warn};

use crate::Language;

pub mod json;
pub mod prompts;

/// Characters of article text sent to the model per stage.
pub const TEXT_BUDGET: usize = 4000;

/// First `budget` characters of `text`, cut on a char boundary.
pub fn truncate(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The three analysis stages over one article's text.
///
/// Each stage is an independent model call: one failing never prevents the
/// others from running.
pub struct Analyzer {
    model: Arc<dyn ChatModel>,
    sentiment: Arc<dyn SentimentBackend>,
    language: Language,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("model", &self.model.name())
            .field("sentiment", &self.sentiment.name())
            .field("language", &self.language)
            .finish()
    }
}

impl Analyzer {
    pub fn new(
        model: Arc<dyn ChatModel>,
        sentiment: Arc<dyn SentimentBackend>,
        language: Language,
    ) -> Self {
        Self {
            model,
            sentiment,
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Never fails: anything unexpected yields neutral/0.0.
    pub async fn sentiment(&self, text: &str) -> SentimentResult {
        match self.sentiment.classify(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!("⚠️ Sentiment via {} failed, defaulting to neutral: {}", self.sentiment.name(), e);
                SentimentResult::neutral()
            }
        }
    }

    pub async fn extract(&self, text: &str) -> StageOutcome<ExtractedInfo> {
        if !self.model.has_credential() {
            return Err(StageError::missing_credential());
        }
        let prompt = prompts::extraction(self.language, truncate(text, TEXT_BUDGET));
        let raw = self.model.complete(&prompt).await.map_err(StageError::from)?;
        debug!("Extraction response: {}", raw);
        parse_extraction(&raw).map_err(StageError::from)
    }

    /// `label` is localized here before it reaches the prompt.
    pub async fn advise(&self, text: &str, label: SentimentLabel) -> StageOutcome<Advice> {
        if !self.model.has_credential() {
            return Err(StageError::missing_credential());
        }
        let localized = self.language.sentiment_label(label);
        let prompt = prompts::advice(self.language, truncate(text, TEXT_BUDGET), localized);
        let raw = self.model.complete(&prompt).await.map_err(StageError::from)?;
        let advice = raw.trim();
        if advice.is_empty() {
            return Err(StageError::from(Error::Inference("model returned empty advice".to_string())));
        }
        Ok(Advice(advice.to_string()))
    }
}

pub fn parse_extraction(raw: &str) -> fa_core::Result<ExtractedInfo> {
    let object = json::parse_json_object(raw)?;
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}

/// Maps a model reply onto the closed label set.
///
/// Unparseable JSON is an error; parseable JSON with an unknown label is
/// neutral/0.0. A known label without a score gets 0.5.
pub fn parse_sentiment(raw: &str) -> fa_core::Result<SentimentResult> {
    let value = json::parse_json(raw)?;
    let label = value
        .get("label")
        .and_then(|l| l.as_str())
        .and_then(SentimentLabel::parse);
    let Some(label) = label else {
        return Ok(SentimentResult::neutral());
    };
    let score = value
        .get("score")
        .and_then(|s| s.as_f64().or_else(|| s.as_str().and_then(|s| s.trim().parse().ok())))
        .unwrap_or(0.5);
    Ok(SentimentResult::new(label, score))
}
