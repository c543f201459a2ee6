use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fa_core::{ChatModel, ChatPrompt, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Config, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
    model_name: String,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Arc::new(Client::new()),
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingCredential)?;

        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Inference("response contained no message content".to_string()))
    }
}
