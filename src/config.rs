use crate::model::StockSymbol;
use serde::Deserialize;
use std::fs;

pub const API_KEY_ENV: &str = "API_KEY";
/// Ten years of calendar days.
pub const MAX_HISTORY_DAYS: usize = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub alert_price: Option<f64>,
}

impl WatchlistEntry {
    pub fn to_stock_symbol(&self) -> StockSymbol {
        let symbol = crate::utils::normalize_symbol(&self.symbol);
        StockSymbol {
            name: if self.name.is_empty() { symbol.clone() } else { self.name.clone() },
            symbol,
            sector: self.sector.clone(),
            alert_price: self.alert_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_response_language")]
    pub response_language: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_history_days")]
    pub history_days: usize,
    #[serde(default = "default_price_timeout")]
    pub price_timeout_seconds: u64,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_response_language() -> String {
    "Traditional Chinese (繁體中文)".into()
}

fn default_check_interval() -> u64 {
    300
}

fn default_history_days() -> usize {
    100
}

fn default_price_timeout() -> u64 {
    20
}

fn default_database_path() -> String {
    ":memory:".into()
}

impl AppConfig {
    /// API key from the config file, else from the `API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.gemini_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.history_days == 0 {
            return Err("history_days must be greater than zero".into());
        }
        if self.history_days > MAX_HISTORY_DAYS {
            return Err(format!("history_days must be at most {}", MAX_HISTORY_DAYS));
        }
        if self.check_interval_seconds == 0 {
            return Err("check_interval_seconds must be greater than zero".into());
        }
        if let Some(entry) = self.watchlist.iter().find(|e| e.symbol.trim().is_empty()) {
            return Err(format!("watchlist entry with empty symbol: {:?}", entry));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse_config(r#"{"telegram_bot_token": "t", "telegram_chat_id": 42}"#).unwrap();
        assert_eq!(cfg.gemini_model, "gemini-2.5-flash");
        assert!(cfg.response_language.starts_with("Traditional Chinese"));
        assert_eq!(cfg.check_interval_seconds, 300);
        assert_eq!(cfg.history_days, 100);
        assert_eq!(cfg.price_timeout_seconds, 20);
        assert_eq!(cfg.database_path, ":memory:");
        assert!(cfg.watchlist.is_empty());
    }

    #[test]
    fn watchlist_entries_are_normalized() {
        let cfg = parse_config(
            r#"{
                "telegram_bot_token": "t",
                "telegram_chat_id": 42,
                "watchlist": [
                    {"symbol": " nvda ", "name": "NVIDIA", "sector": "Semiconductors", "alert_price": 140.0},
                    {"symbol": "tsm"}
                ]
            }"#,
        )
        .unwrap();

        let nvda = cfg.watchlist[0].to_stock_symbol();
        assert_eq!(nvda.symbol, "NVDA");
        assert_eq!(nvda.alert_price, Some(140.0));

        let tsm = cfg.watchlist[1].to_stock_symbol();
        assert_eq!(tsm.symbol, "TSM");
        assert_eq!(tsm.name, "TSM");
        assert_eq!(tsm.alert_price, None);
    }

    #[test]
    fn rejects_zero_history() {
        let err = parse_config(r#"{"telegram_bot_token": "t", "telegram_chat_id": 1, "history_days": 0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_oversized_history() {
        let err = parse_config(&format!(
            r#"{{"telegram_bot_token": "t", "telegram_chat_id": 1, "history_days": {}}}"#,
            usize::MAX
        ));
        assert!(err.is_err());

        let max = format!(
            r#"{{"telegram_bot_token": "t", "telegram_chat_id": 1, "history_days": {}}}"#,
            MAX_HISTORY_DAYS
        );
        assert_eq!(parse_config(&max).unwrap().history_days, MAX_HISTORY_DAYS);
    }

    #[test]
    fn rejects_blank_symbols() {
        let err = parse_config(
            r#"{"telegram_bot_token": "t", "telegram_chat_id": 1, "watchlist": [{"symbol": "  "}]}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn config_key_wins_over_environment() {
        let cfg = parse_config(r#"{"telegram_bot_token": "t", "telegram_chat_id": 1, "gemini_api_key": "abc"}"#)
            .unwrap();
        assert_eq!(cfg.api_key().as_deref(), Some("abc"));
    }
}
