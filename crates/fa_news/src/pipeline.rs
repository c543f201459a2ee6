use std::fmt;

use chrono::Utc;
use fa_core::logging::Logger;
use fa_core::{AnalysisRequest, AnalysisResult, FetchedArticle, Result, StageOutcome};
use fa_inference::{create_model, create_sentiment_backend, Analyzer, Config};

use crate::fetcher::ContentFetcher;
use crate::redirect::RedirectResolver;

/// Resolve, fetch, then run the three analysis stages in order.
///
/// Every run is independent and returns a fresh [`AnalysisResult`]; nothing
/// is cached between runs.
pub struct AnalysisPipeline {
    resolver: RedirectResolver,
    fetcher: ContentFetcher,
    analyzer: Analyzer,
}

impl fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

impl AnalysisPipeline {
    pub fn new(resolver: RedirectResolver, fetcher: ContentFetcher, analyzer: Analyzer) -> Self {
        Self {
            resolver,
            fetcher,
            analyzer,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let model = create_model(config);
        let sentiment = create_sentiment_backend(config, model.clone());
        Ok(Self::new(
            RedirectResolver::new()?,
            ContentFetcher::new()?,
            Analyzer::new(model, sentiment, config.language),
        ))
    }

    pub async fn fetch_article(&self, request: &AnalysisRequest) -> StageOutcome<FetchedArticle> {
        let url = self.resolver.resolve(&request.url).await;
        let content = self.fetcher.fetch_text(&url).await?;
        Ok(FetchedArticle {
            requested_url: request.url.clone(),
            url,
            content,
        })
    }

    /// A failed fetch ends the run before any model call is made.
    pub async fn run(&self, request: &AnalysisRequest) -> StageOutcome<AnalysisResult> {
        let logger = Logger::new().with_prefix(format!("[{}]", request.url));

        logger.info("🌐 Fetching article content");
        let article = match self.fetch_article(request).await {
            Ok(article) => article,
            Err(e) => {
                logger.error(&format!("❌ Fetch failed: {}", e));
                return Err(e);
            }
        };
        logger.info(&format!("📄 Fetched {} characters", article.content.chars().count()));

        logger.info("🧠 Analyzing sentiment");
        let sentiment = self.analyzer.sentiment(&article.content).await;
        logger.info(&format!("🧠 Sentiment: {} ({:.2})", sentiment.label, sentiment.score));

        logger.info("🔍 Extracting key information");
        let extraction = self.analyzer.extract(&article.content).await;
        if let Err(e) = &extraction {
            logger.warn(&format!("⚠️ Extraction degraded: {}", e));
        }

        logger.info("💡 Generating investment advice");
        let advice = self.analyzer.advise(&article.content, sentiment.label).await;
        if let Err(e) = &advice {
            logger.warn(&format!("⚠️ Advice unavailable: {}", e));
        }

        logger.info("✅ Analysis complete");
        Ok(AnalysisResult {
            article,
            sentiment,
            extraction,
            advice,
            analyzed_at: Utc::now(),
        })
    }
}
