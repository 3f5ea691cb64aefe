pub mod command_handler;
pub mod listener;
pub mod sender;

use crate::advisor::MarketAdvisor;
use crate::analyzer::alert::PriceAlert;
use crate::analyzer::{Analyzer, MarketSnapshot};
use crate::config::AppConfig;
use crate::model::NotifyError;
use crate::quote::PriceSource;
use crate::storage::SqliteStorage;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};

/// Runs the alert rule for a tracked symbol against a fresh snapshot.
/// Yields the alert only when the symbol is on the watchlist, the price is
/// live and no alert went out for it in the last 24h.
pub async fn due_alert(
    storage: &Mutex<SqliteStorage>,
    analyzer: &dyn Analyzer,
    snapshot: &MarketSnapshot,
) -> Option<PriceAlert> {
    let stored = storage.lock().await.get_symbol(&snapshot.symbol);
    let stock = match stored {
        Ok(Some(stock)) => stock,
        Ok(None) => return None,
        Err(e) => {
            warn!("[{}] watchlist lookup failed: {}", snapshot.symbol, e);
            return None;
        }
    };

    let alert = analyzer.find_alert(&stock, snapshot)?;
    let due = storage.lock().await.should_notify_alert(&alert.symbol);
    match due {
        Ok(true) => Some(alert),
        Ok(false) => {
            info!("[{}] alert already sent in the last 24h", alert.symbol);
            None
        }
        Err(e) => {
            warn!("[{}] alert check failed: {}", alert.symbol, e);
            None
        }
    }
}

pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
    pub offset: Arc<AtomicI64>,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub config: Arc<AppConfig>,
    pub advisor: Arc<dyn MarketAdvisor>,
    pub price_source: Arc<dyn PriceSource>,
    pub start_time: Instant,
    pub refresh_notify: Arc<Notify>,
    /// Bumped on every manual refresh; in-flight results from an older epoch are dropped.
    pub epoch: Arc<AtomicU64>,
}

impl TelegramNotifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bot_token: String,
        chat_id: i64,
        storage: Arc<Mutex<SqliteStorage>>,
        config: Arc<AppConfig>,
        advisor: Arc<dyn MarketAdvisor>,
        price_source: Arc<dyn PriceSource>,
        refresh_notify: Arc<Notify>,
        epoch: Arc<AtomicU64>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token,
            chat_id,
            client,
            offset: Arc::new(AtomicI64::new(0)),
            storage,
            config,
            advisor,
            price_source,
            start_time: Instant::now(),
            refresh_notify,
            epoch,
        })
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    pub async fn notify_alert(&self, alert: &PriceAlert) -> Result<(), NotifyError> {
        self.notify_text(&sender::format_alert(alert)).await
    }

    /// Sends the alert for `snapshot` if one is due and records it.
    pub async fn dispatch_alert(&self, analyzer: &dyn Analyzer, snapshot: &MarketSnapshot) {
        let Some(alert) = due_alert(&self.storage, analyzer, snapshot).await else {
            return;
        };
        info!(
            "[{}] alert: live {:.2} within 5% of target {:.2}",
            alert.symbol, alert.live_price, alert.target
        );

        match self.notify_alert(&alert).await {
            Ok(()) => {
                if let Err(e) = self.storage.lock().await.mark_alert_notified(&alert) {
                    warn!("[{}] mark alert failed: {}", alert.symbol, e);
                }
            }
            Err(e) => warn!("[{}] alert notification failed: {}", alert.symbol, e),
        }
    }

    pub async fn listen_for_commands(&self) {
        listener::listen_for_commands(self).await;
    }

    /// Starts a new epoch and wakes the main loop.
    pub fn trigger_refresh(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.refresh_notify.notify_one();
        epoch
    }

    pub async fn set_my_commands(&self) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telegram.org/bot{}/setMyCommands", self.bot_token);
        let commands = serde_json::json!({
            "commands": [
                { "command": "ping", "description": "Check connection" },
                { "command": "help", "description": "Command list" },
                { "command": "list", "description": "Show watchlist" },
                { "command": "quote", "description": "Price and indicators for a symbol" },
                { "command": "analyze", "description": "AI trading signal for a symbol" },
                { "command": "strategy", "description": "AI trade plan for a symbol" },
                { "command": "news", "description": "Latest headlines for a symbol" },
                { "command": "profile", "description": "Company profile for a symbol" },
                { "command": "add", "description": "Track a symbol or company" },
                { "command": "remove", "description": "Stop tracking a symbol" },
                { "command": "refresh", "description": "Re-check the watchlist now" },
                { "command": "uptime", "description": "Service uptime" }
            ]
        });
        self.client.post(&url).json(&commands).send().await?;
        Ok(())
    }

    pub fn spawn_listener(notifier: Arc<TelegramNotifier>) {
        tokio::spawn(async move {
            info!("▶️ Starting Telegram listener...");
            notifier.listen_for_commands().await;
            info!("🛑 Telegram listener ended.");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerImpl;
    use crate::model::{QuoteError, StockSymbol};
    use crate::quote::fetch_live_price;
    use std::time::Duration;

    struct FixedSource(f64);

    #[async_trait::async_trait]
    impl PriceSource for FixedSource {
        async fn fetch_price(&self, _symbol: &str) -> Result<f64, QuoteError> {
            Ok(self.0)
        }
    }

    struct DownSource;

    #[async_trait::async_trait]
    impl PriceSource for DownSource {
        async fn fetch_price(&self, symbol: &str) -> Result<f64, QuoteError> {
            Err(QuoteError::InvalidResponse(symbol.to_string()))
        }
    }

    fn storage_with(symbol: &str, alert_price: Option<f64>) -> Mutex<SqliteStorage> {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage
            .upsert_symbol(&StockSymbol {
                symbol: symbol.into(),
                name: symbol.into(),
                sector: String::new(),
                alert_price,
            })
            .unwrap();
        Mutex::new(storage)
    }

    async fn snapshot_from(source: &dyn PriceSource, symbol: &str) -> MarketSnapshot {
        let live = fetch_live_price(source, symbol, Duration::from_secs(1)).await;
        AnalyzerImpl::new(30).snapshot(symbol, live)
    }

    #[tokio::test]
    async fn on_demand_live_price_near_target_is_due_once() {
        let storage = storage_with("NVDA", Some(140.0));
        let analyzer = AnalyzerImpl::new(30);
        let snapshot = snapshot_from(&FixedSource(138.0), "NVDA").await;

        let alert = due_alert(&storage, &analyzer, &snapshot).await.expect("alert due");
        assert_eq!(alert.target, 140.0);
        assert_eq!(alert.live_price, 138.0);

        storage.lock().await.mark_alert_notified(&alert).unwrap();
        assert_eq!(due_alert(&storage, &analyzer, &snapshot).await, None);
    }

    #[tokio::test]
    async fn no_alert_without_target_tracking_or_live_price() {
        let analyzer = AnalyzerImpl::new(30);

        let untracked = storage_with("AMD", Some(140.0));
        let snapshot = snapshot_from(&FixedSource(138.0), "NVDA").await;
        assert_eq!(due_alert(&untracked, &analyzer, &snapshot).await, None);

        let far = storage_with("NVDA", Some(200.0));
        assert_eq!(due_alert(&far, &analyzer, &snapshot).await, None);

        // NVDA falls back to 135, within 5% of the target, but fallbacks never alert.
        let near = storage_with("NVDA", Some(136.0));
        let fallback = snapshot_from(&DownSource, "NVDA").await;
        assert!(!fallback.is_live());
        assert_eq!(due_alert(&near, &analyzer, &fallback).await, None);
    }
}
