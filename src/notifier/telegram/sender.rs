// notifier/telegram/sender.rs

use crate::analyzer::MarketSnapshot;
use crate::analyzer::alert::PriceAlert;
use crate::model::{
    AnalysisResult, CompanyProfile, InvestmentStrategy, NewsItem, NotifyError, StockSymbol,
    StrategyAction, TradeSignal, Trend,
};
use crate::notifier::telegram::TelegramNotifier;
use crate::series::PriceOrigin;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Sends a text message to the configured chat.
pub async fn send_text(notifier: &TelegramNotifier, text: &str) -> Result<(), NotifyError> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", notifier.bot_token);
    let response = match timeout(
        Duration::from_secs(10),
        notifier
            .client
            .post(&url)
            .form(&[("chat_id", notifier.chat_id.to_string()), ("text", text.to_string())])
            .send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram send() failed: {:?}", e);
            return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram send() timed out");
            return Err(NotifyError::Unreachable);
        }
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::ApiError(format!("[{}] {}", status, body)));
    }
    info!("✅ Telegram message sent [{}]", status);
    Ok(())
}

pub fn format_alert(alert: &PriceAlert) -> String {
    format!(
        "🔔 {} price alert!\n💰 Current price ${:.2} is close to your target ${:.2}",
        alert.symbol, alert.live_price, alert.target
    )
}

pub fn format_snapshot(snapshot: &MarketSnapshot) -> String {
    let origin = match snapshot.origin {
        PriceOrigin::Live => "live",
        PriceOrigin::Fallback => "fallback",
    };
    let macd = &snapshot.indicators.macd;
    let trend = if macd.histogram >= 0.0 { "📈" } else { "📉" };
    let range = match (snapshot.series.first(), snapshot.series.last()) {
        (Some(first), Some(last)) => format!("{} → {}", first.date, last.date),
        _ => "no data".to_string(),
    };

    format!(
        "📊 {}\n💰 Price: ${:.2} ({})\n🗓 {} ({} bars)\nRSI(14): {:.2}\n{} MACD: {:.4} | Signal: {:.4} | Hist: {:.4}",
        snapshot.symbol,
        snapshot.last_close().unwrap_or(snapshot.anchor_price),
        origin,
        range,
        snapshot.series.len(),
        snapshot.indicators.rsi,
        trend,
        macd.macd_line,
        macd.signal_line,
        macd.histogram,
    )
}

pub fn format_analysis(symbol: &str, result: &AnalysisResult) -> String {
    let badge = match result.signal {
        TradeSignal::Buy => "🟢 BUY",
        TradeSignal::Sell => "🔴 SELL",
        TradeSignal::Hold => "🟡 HOLD",
    };
    format!(
        "🤖 {} signal: {} ({:.0}% confidence)\n\n{}",
        symbol, badge, result.confidence, result.reasoning
    )
}

pub fn format_news(symbol: &str, items: &[NewsItem]) -> String {
    if items.is_empty() {
        return format!("📰 No recent news found for {}.", symbol);
    }
    let mut msg = format!("📰 {} news:\n", symbol);
    for item in items {
        msg.push_str(&format!("\n• {} ({}, {})\n{}\n", item.title, item.source, item.time, item.summary));
        if let Some(url) = &item.url {
            msg.push_str(&format!("🔗 {}\n", url));
        }
    }
    msg
}

pub fn format_profile(symbol: &str, profile: &CompanyProfile) -> String {
    format!(
        "🏢 {}\n{}\n\n👤 CEO: {}\n📅 Founded: {}\n📍 HQ: {}\n👥 Employees: {}\n\
         💵 Market cap: {} | P/E: {} | Dividend: {}\n🌐 {}",
        symbol,
        profile.description,
        profile.ceo,
        profile.founded,
        profile.headquarters,
        profile.employees,
        profile.market_cap,
        profile.pe_ratio,
        profile.dividend_yield,
        profile.website,
    )
}

pub fn format_strategy(symbol: &str, strategy: &InvestmentStrategy) -> String {
    let action = match strategy.action {
        StrategyAction::Buy => "🟢 BUY",
        StrategyAction::Sell => "🔴 SELL",
        StrategyAction::Wait => "🟡 WAIT",
    };
    let trend = match strategy.long_term_trend {
        Trend::Bullish => "📈 bullish",
        Trend::Bearish => "📉 bearish",
        Trend::Neutral => "➖ neutral",
    };
    let mut msg = format!(
        "🎯 {} strategy: {} {}\nTrend: {} | Horizon: {} | Risk: {}\n\
         Entry: {} | Target: {} | Stop: {}\nR/R: {} | Win rate: {:.0}%\n\
         Scenarios: 🐻 {} / ⚖️ {} / 🚀 {}",
        symbol,
        action,
        strategy.action_title,
        trend,
        strategy.time_horizon,
        strategy.risk_level,
        strategy.entry_zone,
        strategy.take_profit,
        strategy.stop_loss,
        strategy.risk_reward_ratio,
        strategy.win_rate,
        strategy.scenarios.bearish,
        strategy.scenarios.base,
        strategy.scenarios.bullish,
    );
    if !strategy.catalysts.is_empty() {
        msg.push_str("\nCatalysts:");
        for catalyst in &strategy.catalysts {
            msg.push_str(&format!("\n  • {}", catalyst));
        }
    }
    msg.push_str(&format!("\n\n{}", strategy.rationale));
    msg
}

pub fn format_watchlist(stocks: &[StockSymbol]) -> String {
    if stocks.is_empty() {
        return "📭 Watchlist is empty. Use /add <symbol or company>.".to_string();
    }
    let mut msg = String::from("👀 Watchlist:\n");
    for stock in stocks {
        msg.push_str(&format!("🔹 {} — {}", stock.symbol, stock.name));
        if !stock.sector.is_empty() {
            msg.push_str(&format!(" [{}]", stock.sector));
        }
        if let Some(target) = stock.alert_price {
            msg.push_str(&format!(" 🔔 ${:.2}", target));
        }
        msg.push('\n');
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::snapshot::build_snapshot;
    use chrono::NaiveDate;

    #[test]
    fn alert_message_mentions_both_prices() {
        let msg = format_alert(&PriceAlert {
            symbol: "NVDA".into(),
            target: 140.0,
            live_price: 138.456,
        });
        assert!(msg.contains("NVDA"));
        assert!(msg.contains("$138.46"));
        assert!(msg.contains("$140.00"));
    }

    #[test]
    fn snapshot_message_has_indicators() {
        let end = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let snapshot = build_snapshot("AAPL", 100, None, end);
        let msg = format_snapshot(&snapshot);
        assert!(msg.contains("$230.00 (fallback)"));
        assert!(msg.contains(&format!("RSI(14): {:.2}", snapshot.indicators.rsi)));
        assert!(msg.contains("2026-10-19"));
    }

    #[test]
    fn analysis_message_shows_signal() {
        let msg = format_analysis("TSLA", &AnalysisResult::unavailable());
        assert!(msg.contains("HOLD"));
        assert!(msg.contains("0% confidence"));
    }

    #[test]
    fn watchlist_message() {
        assert!(format_watchlist(&[]).contains("empty"));
        let msg = format_watchlist(&[StockSymbol {
            symbol: "AMD".into(),
            name: "Advanced Micro Devices".into(),
            sector: String::new(),
            alert_price: Some(150.0),
        }]);
        assert!(msg.contains("AMD — Advanced Micro Devices 🔔 $150.00"));
    }

    #[test]
    fn news_message_lists_items_with_links() {
        assert!(format_news("AAPL", &[]).contains("No recent news"));
        let msg = format_news(
            "AAPL",
            &[NewsItem {
                title: "New iPhone".into(),
                summary: "Launch event".into(),
                source: "Reuters".into(),
                time: "2 hours ago".into(),
                url: Some("https://a.example".into()),
            }],
        );
        assert!(msg.contains("• New iPhone (Reuters, 2 hours ago)"));
        assert!(msg.contains("🔗 https://a.example"));
    }

    #[test]
    fn strategy_message_shows_plan() {
        let strategy = InvestmentStrategy {
            action: StrategyAction::Wait,
            action_title: "Sit tight".into(),
            long_term_trend: Trend::Neutral,
            entry_zone: "$140 - $145".into(),
            take_profit: "$180".into(),
            stop_loss: "$120".into(),
            time_horizon: "3-6 months".into(),
            risk_level: "High".into(),
            rationale: "Range bound".into(),
            risk_reward_ratio: "1 : 2".into(),
            win_rate: 55.0,
            catalysts: vec!["Earnings".into()],
            scenarios: Default::default(),
        };
        let msg = format_strategy("NVDA", &strategy);
        assert!(msg.contains("🟡 WAIT Sit tight"));
        assert!(msg.contains("Win rate: 55%"));
        assert!(msg.contains("  • Earnings"));
        assert!(msg.ends_with("Range bound"));
    }

    #[test]
    fn profile_message() {
        let profile: CompanyProfile = serde_json::from_str(r#"{"ceo":"Lisa Su"}"#).unwrap();
        let msg = format_profile("AMD", &profile);
        assert!(msg.contains("CEO: Lisa Su"));
        assert!(msg.contains("P/E: N/A"));
    }
}
