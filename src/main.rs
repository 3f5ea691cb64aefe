mod advisor;
mod analyzer;
mod config;
mod model;
mod notifier;
mod quote;
mod series;
mod storage;
mod utils;

use advisor::{GeminiClient, MarketAdvisor};
use analyzer::{Analyzer, AnalyzerImpl};
use config::{AppConfig, load_config};
use futures::future::join_all;
use model::StockSymbol;
use notifier::TelegramNotifier;
use quote::{PriceSource, fetch_live_price};
use series::resolve_anchor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use storage::SqliteStorage;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        error!("😱 Panic occurred: {}", panic_info);
    }));

    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };
    seed_watchlist(&config, &storage).await;

    let gemini = match GeminiClient::new(
        config.api_key(),
        config.gemini_model.clone(),
        config.response_language.clone(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to initialize AI client: {}", e);
            return;
        }
    };
    if !gemini.has_api_key() {
        warn!("No API key configured, live prices and AI analysis are disabled (fallback prices only)");
    }
    let advisor: Arc<dyn MarketAdvisor> = gemini.clone();
    let price_source: Arc<dyn PriceSource> = gemini;

    let refresh_notify = Arc::new(Notify::new());
    let epoch = Arc::new(AtomicU64::new(0));
    let notifier = match TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id,
        storage.clone(),
        config.clone(),
        advisor,
        price_source.clone(),
        refresh_notify.clone(),
        epoch.clone(),
    ) {
        Ok(n) => Arc::new(n),
        Err(e) => {
            error!("Failed to initialize notifier: {}", e);
            return;
        }
    };

    if let Err(e) = notifier.set_my_commands().await {
        warn!("setMyCommands failed: {:?}", e);
    }
    TelegramNotifier::spawn_listener(notifier.clone());

    info!("Sending startup message...");
    if let Err(e) = notifier.notify_text("🚀 StockSniper started!").await {
        warn!("Startup notification failed: {}", e);
    }

    let analyzer = AnalyzerImpl::new(config.history_days);

    loop {
        let stocks = match storage.lock().await.list_symbols() {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to read watchlist: {}", e);
                Vec::new()
            }
        };
        info!("Checking {} watchlist symbols...", stocks.len());

        let tasks: Vec<_> = stocks
            .iter()
            .map(|stock| {
                process_symbol(
                    stock,
                    &analyzer,
                    price_source.as_ref(),
                    config.clone(),
                    epoch.clone(),
                    notifier.clone(),
                )
            })
            .collect();
        join_all(tasks).await;

        info!(
            "Waiting for timer ({}s) or manual refresh...",
            config.check_interval_seconds
        );
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = refresh_notify.notified() => {
                info!("Manual refresh triggered.");
            }
        }
    }
}

/// Copies the configured watchlist into storage. Existing rows keep their position.
async fn seed_watchlist(config: &AppConfig, storage: &Mutex<SqliteStorage>) {
    let guard = storage.lock().await;
    for entry in &config.watchlist {
        let stock = entry.to_stock_symbol();
        if let Err(e) = guard.upsert_symbol(&stock) {
            warn!("Failed to seed {}: {}", stock.symbol, e);
        }
    }
    info!("Watchlist seeded with {} entries", config.watchlist.len());
}

/// Logs the fallback anchor, upgrades to a live snapshot and runs the alert rule.
/// Results that finish after a newer refresh started are discarded.
async fn process_symbol(
    stock: &StockSymbol,
    analyzer: &AnalyzerImpl,
    price_source: &dyn PriceSource,
    config: Arc<AppConfig>,
    epoch: Arc<AtomicU64>,
    notifier: Arc<TelegramNotifier>,
) {
    let started_epoch = epoch.load(Ordering::SeqCst);
    let symbol = stock.symbol.as_str();

    let (fallback_price, _) = resolve_anchor(symbol, None);
    info!("[{}] fallback anchor {:.2}", symbol, fallback_price);

    let limit = Duration::from_secs(config.price_timeout_seconds);
    let Some(live_price) = fetch_live_price(price_source, symbol, limit).await else {
        info!("[{}] no live price, keeping fallback series", symbol);
        return;
    };

    if epoch.load(Ordering::SeqCst) != started_epoch {
        info!("[{}] result is stale (refresh requested), discarding", symbol);
        return;
    }

    let snapshot = analyzer.snapshot(symbol, Some(live_price));
    let macd = &snapshot.indicators.macd;
    info!(
        "[{}] live {:.2} | {} bars | RSI {:.2} | MACD {:.4} / {:.4} / {:.4}",
        symbol,
        snapshot.anchor_price,
        snapshot.series.len(),
        snapshot.indicators.rsi,
        macd.macd_line,
        macd.signal_line,
        macd.histogram
    );

    notifier.dispatch_alert(analyzer, &snapshot).await;
}
