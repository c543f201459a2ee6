pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod types;

pub use error::{Error, ErrorKind, Result, StageError};
pub use models::{ChatModel, ChatPrompt, SentimentBackend};
pub use types::{
    Advice, AnalysisRequest, AnalysisResult, ExtractedInfo, FetchedArticle, MarketQuote,
    MarketSnapshot, NewsItem, SentimentLabel, SentimentResult, StageOutcome,
};
