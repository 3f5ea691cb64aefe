// notifier/telegram/command_handler.rs

use crate::analyzer::{Analyzer, AnalyzerImpl, MarketSnapshot};
use crate::model::AnalysisResult;
use crate::notifier::telegram::TelegramNotifier;
use crate::notifier::telegram::sender::{
    format_analysis, format_news, format_profile, format_snapshot, format_strategy, format_watchlist,
};
use crate::quote::fetch_live_price;
use crate::utils::normalize_symbol;
use std::time::Duration;
use tracing::{info, warn};

const HELP: &str = "📋 Available commands:\n\
    /ping — check connection\n\
    /help — command list\n\
    /list — show watchlist\n\
    /quote <symbol> — price and indicators\n\
    /analyze <symbol> — AI trading signal\n\
    /strategy <symbol> — AI trade plan\n\
    /news <symbol> — latest headlines\n\
    /profile <symbol> — company profile\n\
    /add <symbol or company> — track a stock\n\
    /remove <symbol> — stop tracking\n\
    /refresh — re-check the watchlist now\n\
    /uptime — service uptime";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
    Uptime,
    Refresh,
    List,
    Quote(String),
    Analyze(String),
    Strategy(String),
    News(String),
    Profile(String),
    Add(String),
    Remove(String),
    /// A known command without its required argument.
    Usage(&'static str),
    Unknown(String),
}

/// Splits "/cmd@bot args" into a command. Symbols are normalized, `/add` keeps the raw query.
pub fn parse_command(text: &str) -> Command {
    let text = text.trim();
    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    let arg = rest.trim();

    let with_symbol = |make: fn(String) -> Command, usage: &'static str| {
        if arg.is_empty() {
            Command::Usage(usage)
        } else {
            make(normalize_symbol(arg))
        }
    };

    match name.as_str() {
        "/ping" => Command::Ping,
        "/help" | "/start" => Command::Help,
        "/uptime" => Command::Uptime,
        "/refresh" => Command::Refresh,
        "/list" => Command::List,
        "/quote" => with_symbol(Command::Quote, "/quote <symbol>"),
        "/analyze" => with_symbol(Command::Analyze, "/analyze <symbol>"),
        "/strategy" => with_symbol(Command::Strategy, "/strategy <symbol>"),
        "/news" => with_symbol(Command::News, "/news <symbol>"),
        "/profile" => with_symbol(Command::Profile, "/profile <symbol>"),
        "/remove" => with_symbol(Command::Remove, "/remove <symbol>"),
        "/add" if arg.is_empty() => Command::Usage("/add <symbol or company>"),
        "/add" => Command::Add(arg.to_string()),
        _ => Command::Unknown(text.to_string()),
    }
}

/// Handles an incoming command and triggers the corresponding action.
pub async fn handle_command(command_text: &str, notifier: &TelegramNotifier) {
    info!("Handling command: {}", command_text);
    let command = parse_command(command_text);

    let reply = match &command {
        Command::Ping => "✅ I am online!".to_string(),
        Command::Help => HELP.to_string(),
        Command::Uptime => {
            let uptime = notifier.start_time.elapsed();
            format!(
                "⏱ Uptime: {:02}:{:02}:{:02}",
                uptime.as_secs() / 3600,
                (uptime.as_secs() % 3600) / 60,
                uptime.as_secs() % 60
            )
        }
        Command::Refresh => {
            let epoch = notifier.trigger_refresh();
            info!("/refresh received, epoch now {}", epoch);
            "🔄 Refreshing the watchlist.".to_string()
        }
        Command::List => {
            let listed = notifier.storage.lock().await.list_symbols();
            match listed {
                Ok(stocks) => format_watchlist(&stocks),
                Err(e) => format!("❌ Error: {}", e),
            }
        }
        Command::Quote(symbol) => format_snapshot(&live_snapshot(notifier, symbol).await),
        Command::Analyze(symbol) => {
            let snapshot = live_snapshot(notifier, symbol).await;
            let result = notifier
                .advisor
                .analyze(symbol, &snapshot.series, &snapshot.indicators)
                .await
                .unwrap_or_else(|e| {
                    warn!("[{}] analysis failed: {}", symbol, e);
                    AnalysisResult::unavailable()
                });
            format!("{}\n\n{}", format_snapshot(&snapshot), format_analysis(symbol, &result))
        }
        Command::Strategy(symbol) => {
            let snapshot = live_snapshot(notifier, symbol).await;
            match notifier
                .advisor
                .strategy(symbol, snapshot.anchor_price, &snapshot.series)
                .await
            {
                Ok(Some(strategy)) => format_strategy(symbol, &strategy),
                Ok(None) => format!("🤷 No strategy could be built for {}.", symbol),
                Err(e) => {
                    warn!("[{}] strategy failed: {}", symbol, e);
                    format!("❌ Strategy failed: {}", e)
                }
            }
        }
        Command::News(symbol) => match notifier.advisor.news(symbol).await {
            Ok(items) => format_news(symbol, &items),
            Err(e) => {
                warn!("[{}] news failed: {}", symbol, e);
                format!("❌ News unavailable: {}", e)
            }
        },
        Command::Profile(symbol) => match notifier.advisor.company_profile(symbol).await {
            Ok(Some(profile)) => format_profile(symbol, &profile),
            Ok(None) => format!("🤷 No profile found for {}.", symbol),
            Err(e) => {
                warn!("[{}] profile failed: {}", symbol, e);
                format!("❌ Profile unavailable: {}", e)
            }
        },
        Command::Add(query) => add_symbol(notifier, query).await,
        Command::Remove(symbol) => {
            let removed = notifier.storage.lock().await.remove_symbol(symbol);
            match removed {
                Ok(true) => format!("🗑 Removed {} from the watchlist.", symbol),
                Ok(false) => format!("🤷 {} is not on the watchlist.", symbol),
                Err(e) => format!("❌ Error: {}", e),
            }
        }
        Command::Usage(usage) => format!("ℹ️ Usage: {}", usage),
        Command::Unknown(_) => "🤖 Unknown command. Type /help for a list of commands.".to_string(),
    };

    if let Err(e) = notifier.notify_text(&reply).await {
        warn!("{:?} reply error: {:?}", command, e);
    }
}

/// Fresh snapshot for an on-demand command. A live price also runs the alert rule.
async fn live_snapshot(notifier: &TelegramNotifier, symbol: &str) -> MarketSnapshot {
    let limit = Duration::from_secs(notifier.config.price_timeout_seconds);
    let live = fetch_live_price(notifier.price_source.as_ref(), symbol, limit).await;
    let analyzer = AnalyzerImpl::new(notifier.config.history_days);
    let snapshot = analyzer.snapshot(symbol, live);
    if snapshot.is_live() {
        notifier.dispatch_alert(&analyzer, &snapshot).await;
    }
    snapshot
}

/// Selects an existing match first, otherwise asks the advisor to resolve the query.
async fn add_symbol(notifier: &TelegramNotifier, query: &str) -> String {
    let existing = notifier.storage.lock().await.find_symbol(query);
    match existing {
        Ok(Some(stock)) => return format!("👀 {} ({}) is already on the watchlist.", stock.symbol, stock.name),
        Ok(None) => {}
        Err(e) => return format!("❌ Error: {}", e),
    }

    match notifier.advisor.lookup_symbol(query).await {
        Ok(Some(stock)) => {
            // The resolved ticker may already be tracked under a different name.
            let saved = {
                let storage = notifier.storage.lock().await;
                match storage.get_symbol(&stock.symbol) {
                    Ok(Some(existing)) => {
                        return format!("👀 {} ({}) is already on the watchlist.", existing.symbol, existing.name);
                    }
                    Ok(None) => storage.upsert_symbol(&stock),
                    Err(e) => Err(e),
                }
            };
            match saved {
                Ok(()) => {
                    info!("Added {} to the watchlist", stock.symbol);
                    notifier.trigger_refresh();
                    format!("➕ Added {} ({}).", stock.symbol, stock.name)
                }
                Err(e) => format!("❌ Error: {}", e),
            }
        }
        Ok(None) => format!("🔍 No stock symbol found for \"{}\", please try again.", query),
        Err(e) => {
            warn!("Symbol lookup for '{}' failed: {}", query, e);
            format!("❌ Lookup failed: {}", e)
        }
    }
}
