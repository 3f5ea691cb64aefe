use crate::analyzer::alert::{PriceAlert, check_alert};
use crate::analyzer::indicators::latest_indicators;
use crate::model::{Series, StockSymbol, TechnicalIndicators};
use crate::series::{PriceOrigin, generate_series, resolve_anchor};
use chrono::{NaiveDate, Utc};

/// Series plus indicators for one symbol, as handed to reports and prompts.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub anchor_price: f64,
    pub origin: PriceOrigin,
    pub series: Series,
    pub indicators: TechnicalIndicators,
}

impl MarketSnapshot {
    pub fn last_close(&self) -> Option<f64> {
        self.series.last().map(|bar| bar.close)
    }

    pub fn is_live(&self) -> bool {
        self.origin == PriceOrigin::Live
    }
}

pub fn build_snapshot(
    symbol: &str,
    day_count: usize,
    live_price: Option<f64>,
    end_date: NaiveDate,
) -> MarketSnapshot {
    let (anchor_price, origin) = resolve_anchor(symbol, live_price);
    let series = generate_series(symbol, day_count, anchor_price, end_date);
    let indicators = latest_indicators(&series);

    MarketSnapshot {
        symbol: symbol.to_string(),
        anchor_price,
        origin,
        series,
        indicators,
    }
}

/// Trait defining the interface for a watchlist analyzer.
pub trait Analyzer: Send + Sync {
    fn snapshot(&self, symbol: &str, live_price: Option<f64>) -> MarketSnapshot;
    /// Only live snapshots are checked; fallback prices never fire alerts.
    fn find_alert(&self, stock: &StockSymbol, snapshot: &MarketSnapshot) -> Option<PriceAlert>;
}

/// Implementation of the watchlist analyzer.
pub struct AnalyzerImpl {
    pub history_days: usize,
}

impl AnalyzerImpl {
    pub fn new(history_days: usize) -> Self {
        Self { history_days }
    }
}

impl Analyzer for AnalyzerImpl {
    fn snapshot(&self, symbol: &str, live_price: Option<f64>) -> MarketSnapshot {
        build_snapshot(symbol, self.history_days, live_price, Utc::now().date_naive())
    }

    fn find_alert(&self, stock: &StockSymbol, snapshot: &MarketSnapshot) -> Option<PriceAlert> {
        if !snapshot.is_live() {
            return None;
        }
        check_alert(stock, snapshot.anchor_price)
    }
}
