use std::fmt::Write as _;
use std::net::SocketAddr;

use clap::Parser;
use fa_core::config::resolve_api_key;
use fa_core::logging::init_logging;
use fa_core::{AnalysisRequest, AnalysisResult, Error, MarketSnapshot, NewsItem, Result};
use fa_inference::{Config, Language, SentimentBackendKind};
use fa_market::MarketSnapshotter;
use fa_news::feed::{DEFAULT_LIMIT, TRENDING_FEED_URL};
use fa_news::{AnalysisPipeline, FeedReader};
use fa_web::AppState;
use tracing::info;

const HF_TOKEN_ENV: &str = "HF_TOKEN";

#[derive(Parser, Debug)]
#[command(author, version, about = "Financial news analyzer", long_about = None)]
pub struct Cli {
    /// API key for the chat model. Falls back to OPENAI_API_KEY.
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Chat model name, or `dummy` for the offline model.
    #[arg(long, global = true)]
    model: Option<String>,
    /// OpenAI-compatible base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true, value_enum, default_value_t = Language::TraditionalChinese)]
    language: Language,
    #[arg(long, global = true, value_enum, default_value_t = SentimentBackendKind::Llm)]
    sentiment_backend: SentimentBackendKind,
    /// Hosted FinBERT endpoint used by `--sentiment-backend finbert`.
    #[arg(long, global = true)]
    finbert_url: Option<String>,
    /// Hugging Face token. Falls back to HF_TOKEN.
    #[arg(long, global = true)]
    hf_token: Option<String>,
    /// RSS feed for trending headlines.
    #[arg(long, global = true, default_value = TRENDING_FEED_URL)]
    feed_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch one article and run the three analysis stages over it
    Analyze {
        url: String,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List trending finance headlines
    Trending {
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Show the market snapshot
    Market,
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

impl Cli {
    fn inference_config(&self) -> Config {
        Config {
            api_key: resolve_api_key(self.api_key.as_deref()),
            model_name: self.model.clone(),
            base_url: self.base_url.clone(),
            language: self.language,
            sentiment_backend: self.sentiment_backend,
            finbert_url: self.finbert_url.clone(),
            hf_token: self
                .hf_token
                .clone()
                .or_else(|| std::env::var(HF_TOKEN_ENV).ok())
                .filter(|token| !token.trim().is_empty()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.inference_config();
    if config.api_key.is_none() {
        info!("🔑 No API key configured; extraction and advice will be skipped");
    }

    match cli.command {
        Commands::Analyze { ref url, json } => {
            let pipeline = AnalysisPipeline::from_config(&config)?;
            print!("{}", analyze(&pipeline, url, json, config.language).await?);
        }
        Commands::Trending { limit } => {
            let feed = FeedReader::with_url(cli.feed_url.as_str())?;
            print!("{}", render_trending(&feed.fetch_trending(limit).await));
        }
        Commands::Market => {
            let market = MarketSnapshotter::new()?;
            print!("{}", render_market(&market.fetch().await));
        }
        Commands::Serve { addr } => {
            let state = AppState {
                pipeline: AnalysisPipeline::from_config(&config)?,
                feed: FeedReader::with_url(cli.feed_url.as_str())?,
                market: MarketSnapshotter::new()?,
            };
            fa_web::serve(addr, state).await?;
        }
    }

    Ok(())
}

/// A failed fetch becomes an error so the process exits non-zero.
async fn analyze(
    pipeline: &AnalysisPipeline,
    url: &str,
    json: bool,
    language: Language,
) -> Result<String> {
    match pipeline.run(&AnalysisRequest::new(url)).await {
        Ok(result) if json => Ok(format!("{}\n", serde_json::to_string_pretty(&result)?)),
        Ok(result) => Ok(render_analysis(&result, language)),
        Err(e) => Err(Error::Fetch(e.to_string())),
    }
}

fn render_analysis(result: &AnalysisResult, language: Language) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", result.article.url);
    let _ = writeln!(
        out,
        "Sentiment: {} ({:.2})",
        language.sentiment_label(result.sentiment.label),
        result.sentiment.score
    );

    match &result.extraction {
        Ok(info) => {
            let _ = writeln!(out, "Companies: {}", info.company_names.join(", "));
            let _ = writeln!(out, "Stock codes: {}", info.stock_codes.join(", "));
            for (key, value) in &info.financial_data {
                let _ = writeln!(out, "  {}: {}", key, value);
            }
            for event in &info.events {
                let _ = writeln!(out, "- {}", event);
            }
            if !info.time_info.is_empty() {
                let _ = writeln!(out, "Time: {}", info.time_info);
            }
        }
        Err(e) => {
            let _ = writeln!(out, "Extraction unavailable: {}", e);
        }
    }

    match &result.advice {
        Ok(advice) => {
            let _ = writeln!(out, "\n{}", advice);
        }
        Err(e) => {
            let _ = writeln!(out, "\nAdvice unavailable: {}", e);
        }
    }
    out
}

fn render_trending(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "No trending news right now.\n".to_string();
    }
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}\n   {}\n   {}", i + 1, item.title, item.published, item.link);
    }
    out
}

fn render_market(snapshot: &MarketSnapshot) -> String {
    if snapshot.is_empty() {
        return "Market data unavailable.\n".to_string();
    }
    let mut out = String::new();
    for (name, quote) in snapshot {
        let _ = writeln!(
            out,
            "{:<10} {:>12.2} {:>+7.2}%",
            name, quote.price, quote.change_percent
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_core::{
        Advice, ExtractedInfo, FetchedArticle, SentimentLabel, SentimentResult, StageError,
        StageOutcome,
    };

    fn sample_result(advice: StageOutcome<Advice>) -> AnalysisResult {
        AnalysisResult {
            article: FetchedArticle {
                requested_url: "https://news.google.com/rss/articles/abc".to_string(),
                url: "https://example.com/tsmc".to_string(),
                content: "台積電營收創新高".to_string(),
            },
            sentiment: SentimentResult::new(SentimentLabel::Positive, 0.8),
            extraction: Ok(ExtractedInfo {
                company_names: vec!["台積電".to_string()],
                stock_codes: vec!["2330".to_string()],
                events: vec!["營收創新高".to_string()],
                ..Default::default()
            }),
            advice,
            analyzed_at: Default::default(),
        }
    }

    fn offline_pipeline() -> AnalysisPipeline {
        AnalysisPipeline::from_config(&Config {
            model_name: Some("dummy".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_fetch_failure_is_an_error() {
        let pipeline = offline_pipeline();
        for json in [false, true] {
            let err = analyze(&pipeline, "http://127.0.0.1:9/story", json, Language::English)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Fetch(_)));
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["fa", "analyze", "https://example.com/a"]).unwrap();
        assert_eq!(cli.language, Language::TraditionalChinese);
        assert_eq!(cli.sentiment_backend, SentimentBackendKind::Llm);
        assert_eq!(cli.feed_url, TRENDING_FEED_URL);
        assert!(matches!(cli.command, Commands::Analyze { json: false, .. }));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fa",
            "trending",
            "--limit",
            "3",
            "--language",
            "en",
            "--sentiment-backend",
            "finbert",
        ])
        .unwrap();
        assert_eq!(cli.language, Language::English);
        assert_eq!(cli.sentiment_backend, SentimentBackendKind::Finbert);
        assert!(matches!(cli.command, Commands::Trending { limit: 3 }));
    }

    #[test]
    fn test_user_key_wins() {
        let cli = Cli::try_parse_from(["fa", "--api-key", "sk-cli", "market"]).unwrap();
        assert_eq!(cli.inference_config().api_key.as_deref(), Some("sk-cli"));
    }

    #[test]
    fn test_render_analysis() {
        let text = render_analysis(
            &sample_result(Err(StageError::missing_credential())),
            Language::TraditionalChinese,
        );
        assert!(text.contains("URL: https://example.com/tsmc"));
        assert!(text.contains("Sentiment: 正面 (0.80)"));
        assert!(text.contains("Companies: 台積電"));
        assert!(text.contains("- 營收創新高"));
        assert!(text.contains("Advice unavailable: missing_credential"));

        let text = render_analysis(
            &sample_result(Ok(Advice("Hold for now.".to_string()))),
            Language::English,
        );
        assert!(text.contains("Sentiment: positive (0.80)"));
        assert!(text.ends_with("Hold for now.\n"));
    }

    #[test]
    fn test_render_empty_lists() {
        assert_eq!(render_trending(&[]), "No trending news right now.\n");
        assert_eq!(render_market(&MarketSnapshot::new()), "Market data unavailable.\n");
    }
}
