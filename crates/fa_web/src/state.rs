use fa_market::MarketSnapshotter;
use fa_news::{AnalysisPipeline, FeedReader};

pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub feed: FeedReader,
    pub market: MarketSnapshotter,
}
