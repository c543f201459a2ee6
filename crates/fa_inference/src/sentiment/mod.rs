use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fa_core::{ChatModel, Result, SentimentBackend, SentimentResult};
use tracing::info;

use crate::analysis::{parse_sentiment, prompts, truncate, TEXT_BUDGET};
use crate::{Config, Language, SentimentBackendKind};

pub mod finbert;

pub use finbert::FinBertSentiment;

/// Sentiment from the same chat model used for extraction and advice.
pub struct LlmSentiment {
    model: Arc<dyn ChatModel>,
    language: Language,
}

impl LlmSentiment {
    pub fn new(model: Arc<dyn ChatModel>, language: Language) -> Self {
        Self { model, language }
    }
}

impl fmt::Debug for LlmSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSentiment")
            .field("model", &self.model.name())
            .field("language", &self.language)
            .finish()
    }
}

#[async_trait]
impl SentimentBackend for LlmSentiment {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(&self, text: &str) -> Result<SentimentResult> {
        // No key: silently neutral, unlike the other stages.
        if !self.model.has_credential() {
            return Ok(SentimentResult::neutral());
        }
        let prompt = prompts::sentiment(self.language, truncate(text, TEXT_BUDGET));
        let raw = self.model.complete(&prompt).await?;
        parse_sentiment(&raw)
    }
}

pub fn create_sentiment_backend(
    config: &Config,
    model: Arc<dyn ChatModel>,
) -> Arc<dyn SentimentBackend> {
    match config.sentiment_backend {
        SentimentBackendKind::Llm => Arc::new(LlmSentiment::new(model, config.language)),
        SentimentBackendKind::Finbert => {
            let backend = FinBertSentiment::new(
                config
                    .finbert_url
                    .clone()
                    .unwrap_or_else(|| crate::DEFAULT_FINBERT_URL.to_string()),
                config.hf_token.clone(),
            );
            info!("🧠 Sentiment backend: FinBERT ({})", backend.endpoint());
            Arc::new(backend)
        }
    }
}
