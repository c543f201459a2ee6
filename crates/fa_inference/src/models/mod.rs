use std::sync::Arc;

use fa_core::ChatModel;
use tracing::info;

use crate::Config;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// Builds the chat model named in `config`. `dummy` selects the offline
/// model; anything else is sent to the OpenAI-compatible endpoint.
pub fn create_model(config: &Config) -> Arc<dyn ChatModel> {
    match config.model_name.as_deref() {
        Some("dummy") => {
            info!("🤖 Using offline dummy model");
            Arc::new(DummyModel::new())
        }
        _ => {
            let model = OpenAiModel::new(config);
            if !model.has_credential() {
                info!("🔑 No API key configured, extraction and advice will be skipped");
            }
            Arc::new(model)
        }
    }
}
