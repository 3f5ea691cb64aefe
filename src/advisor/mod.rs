// Advisor module: generative-AI lookups and commentary.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;

use crate::model::{
    AdvisorError, AnalysisResult, CompanyProfile, InvestmentStrategy, NewsItem, OhlcBar, StockSymbol,
    TechnicalIndicators,
};

#[async_trait::async_trait]
pub trait MarketAdvisor: Send + Sync {
    /// Resolves a free-text query ("Apple", "2330") to a ticker, `None` if it is not a listed company.
    async fn lookup_symbol(&self, query: &str) -> Result<Option<StockSymbol>, AdvisorError>;

    async fn analyze(
        &self,
        symbol: &str,
        series: &[OhlcBar],
        indicators: &TechnicalIndicators,
    ) -> Result<AnalysisResult, AdvisorError>;

    /// Latest headlines, an empty list when the reply carries none.
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>, AdvisorError>;

    async fn company_profile(&self, symbol: &str) -> Result<Option<CompanyProfile>, AdvisorError>;

    /// Trade plan from the current price and the tail of the generated series.
    async fn strategy(
        &self,
        symbol: &str,
        current_price: f64,
        series: &[OhlcBar],
    ) -> Result<Option<InvestmentStrategy>, AdvisorError>;
}
