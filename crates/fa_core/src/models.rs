use std::fmt;

use async_trait::async_trait;

use crate::types::SentimentResult;
use crate::Result;

/// One chat-completion exchange: a system instruction and a user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    /// `None` leaves the provider default in place.
    pub temperature: Option<f32>,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether the model was configured with an API credential.
    fn has_credential(&self) -> bool {
        true
    }

    /// Returns the content of the first choice.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;
}

#[async_trait]
pub trait SentimentBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Classify `text`. Callers map any error to [`SentimentResult::neutral`].
    async fn classify(&self, text: &str) -> Result<SentimentResult>;
}
