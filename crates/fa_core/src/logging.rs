use std::collections::VecDeque;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Prefixes every message, e.g. with the URL a pipeline run is working on.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_prefixes(mut self, prefix: String) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix);
        self
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefixes.push_back(prefix);
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Installs the fmt subscriber once. `RUST_LOG` overrides the `info` default.
pub fn init_logging() -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt().with_env_filter(filter).init();
        });
    }
    Logger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_accumulate_and_reset() {
        let logger = Logger::new()
            .with_prefix("[a]".to_string())
            .with_prefix("[b]".to_string());
        assert_eq!(logger.prefix(), "[a] [b] ");

        let logger = logger.with_new_prefixes("[c]".to_string());
        assert_eq!(logger.prefix(), "[c] ");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging().info("first");
        init_logging().info("second");
    }
}
