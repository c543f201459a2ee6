use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use fa_core::{ChatModel, ChatPrompt, Error, Result};

/// Offline model. Replays scripted replies in order, then falls back to
/// echoing the first words of the prompt.
pub struct DummyModel {
    script: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<ChatPrompt>>,
    credential: bool,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("credential", &self.credential)
            .finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            credential: true,
        }
    }

    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for reply in replies {
            model.push_reply(Ok(reply.into()));
        }
        model
    }

    /// Behaves like a real client configured without an API key.
    pub fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::new()
        }
    }

    pub fn push_reply(&self, reply: Result<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ChatModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        if !self.credential {
            return Err(Error::MissingCredential);
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(reply) => reply,
            None => {
                let words: Vec<&str> = prompt.user.split_whitespace().take(20).collect();
                Ok(words.join(" "))
            }
        }
    }
}
