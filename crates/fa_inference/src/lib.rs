use std::fmt;

use clap::ValueEnum;
use fa_core::SentimentLabel;

pub mod analysis;
pub mod models;
pub mod sentiment;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_FINBERT_URL: &str =
    "https://api-inference.huggingface.co/models/ProsusAI/finbert";

/// Language the model is asked to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Language {
    #[default]
    #[value(name = "zh-TW")]
    TraditionalChinese,
    #[value(name = "en")]
    English,
}

impl Language {
    /// Label wording handed to the advice prompt.
    pub fn sentiment_label(&self, label: SentimentLabel) -> &'static str {
        match (self, label) {
            (Language::TraditionalChinese, SentimentLabel::Positive) => "正面",
            (Language::TraditionalChinese, SentimentLabel::Neutral) => "中性",
            (Language::TraditionalChinese, SentimentLabel::Negative) => "負面",
            (Language::English, label) => label.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SentimentBackendKind {
    /// Ask the chat model for a label and score.
    #[default]
    Llm,
    /// Hosted FinBERT classifier.
    Finbert,
}

#[derive(Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    pub language: Language,
    pub sentiment_backend: SentimentBackendKind,
    pub finbert_url: Option<String>,
    pub hf_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("sentiment_backend", &self.sentiment_backend)
            .field("finbert_url", &self.finbert_url)
            .field("hf_token", &self.hf_token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

pub mod prelude {
    pub use super::analysis::Analyzer;
    pub use super::models::create_model;
    pub use super::sentiment::create_sentiment_backend;
    pub use super::{Config, Language, SentimentBackendKind};
    pub use fa_core::{ChatModel, Error, Result, SentimentBackend};
}

pub use analysis::Analyzer;
pub use models::create_model;
pub use sentiment::create_sentiment_backend;
