// Core structs: OhlcBar, TechnicalIndicators, StockSymbol, error enums
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day of synthetic market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Ordered bars, oldest first.
pub type Series = Vec<OhlcBar>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macd {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: Macd,
}

/// Watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSymbol {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub signal: TradeSignal,
    pub reasoning: String,
    pub confidence: f64,
}

impl AnalysisResult {
    /// Neutral answer used when the advisor cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            signal: TradeSignal::Hold,
            reasoning: "AI analysis failed, check the API key configuration.".into(),
            confidence: 0.0,
        }
    }
}

/// One headline from a search-grounded news query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    /// Relative publication time as reported by the model ("2 hours ago").
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn not_available() -> String {
    "N/A".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default = "not_available")]
    pub description: String,
    #[serde(default = "not_available")]
    pub ceo: String,
    #[serde(default = "not_available")]
    pub founded: String,
    #[serde(default = "not_available")]
    pub headquarters: String,
    #[serde(default = "not_available")]
    pub employees: String,
    #[serde(default = "not_available")]
    pub market_cap: String,
    #[serde(default = "not_available")]
    pub pe_ratio: String,
    #[serde(default = "not_available")]
    pub dividend_yield: String,
    #[serde(default = "not_available")]
    pub website: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyAction {
    Buy,
    Sell,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Price targets for the three outcomes of a strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenarios {
    #[serde(default)]
    pub bearish: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub bullish: String,
}

/// Trade plan built from the recent series and the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStrategy {
    pub action: StrategyAction,
    #[serde(default)]
    pub action_title: String,
    pub long_term_trend: Trend,
    #[serde(default)]
    pub entry_zone: String,
    #[serde(default)]
    pub take_profit: String,
    #[serde(default)]
    pub stop_loss: String,
    #[serde(default)]
    pub time_horizon: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub risk_reward_ratio: String,
    /// Percent, 0..=100.
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub catalysts: Vec<String>,
    #[serde(default)]
    pub scenarios: Scenarios,
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid price response: {0:?}")]
    InvalidResponse(String),
    #[error(transparent)]
    Advisor(#[from] AdvisorError),
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("API key is missing or still the placeholder")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API responded [{status}]: {body}")]
    ApiError { status: u16, body: String },
    #[error("empty response from model")]
    EmptyResponse,
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    ApiError(String),
    #[error("Telegram unreachable")]
    Unreachable,
}
