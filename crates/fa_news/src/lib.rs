pub mod feed;
pub mod fetcher;
pub mod pipeline;
pub mod redirect;

pub use feed::FeedReader;
pub use fetcher::ContentFetcher;
pub use pipeline::AnalysisPipeline;
pub use redirect::RedirectResolver;

pub mod prelude {
    pub use super::feed::FeedReader;
    pub use super::fetcher::ContentFetcher;
    pub use super::pipeline::AnalysisPipeline;
    pub use super::redirect::RedirectResolver;
    pub use fa_core::{AnalysisRequest, AnalysisResult, Error, NewsItem, Result};
}
