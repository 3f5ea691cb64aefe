// notifier/telegram/listener.rs

use crate::notifier::telegram::TelegramNotifier;
use crate::notifier::telegram::command_handler::handle_command;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

/// Seconds Telegram holds a getUpdates request open while waiting for messages.
pub const LONG_POLL_SECONDS: u64 = 25;
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    result: Vec<TelegramUpdate>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// Polls for Telegram updates and processes incoming commands from the configured chat.
pub async fn listen_for_commands(notifier: &TelegramNotifier) {
    let url = format!("https://api.telegram.org/bot{}/getUpdates", notifier.bot_token);
    loop {
        let current_offset = notifier.offset.load(Ordering::SeqCst);
        let response = notifier
            .client
            .get(&url)
            .query(&poll_query(current_offset))
            // The shared client timeout is shorter than the poll window.
            .timeout(Duration::from_secs(LONG_POLL_SECONDS + 10))
            .send()
            .await;
        match response {
            Ok(resp) => match resp.json::<TelegramApiResponse>().await {
                Ok(api_response) => {
                    for update in api_response.result {
                        if let Some(message) = update.message.as_ref() {
                            if message.chat.id != notifier.chat_id {
                                debug!("Ignoring message from chat {}", message.chat.id);
                            } else if let Some(text) = message.text.as_deref() {
                                handle_command(text, notifier).await;
                            }
                        }
                        notifier.offset.store(update.update_id + 1, Ordering::SeqCst);
                    }
                }
                Err(e) => {
                    warn!("getUpdates decode failed: {:?}", e);
                    sleep(RETRY_DELAY).await;
                }
            },
            Err(e) => {
                warn!("getUpdates failed: {:?}", e);
                sleep(RETRY_DELAY).await;
            }
        }
    }
}

fn poll_query(offset: i64) -> [(&'static str, String); 2] {
    [
        ("offset", offset.to_string()),
        ("timeout", LONG_POLL_SECONDS.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_requests_long_polling_from_offset() {
        let query = poll_query(42);
        assert_eq!(query[0], ("offset", "42".to_string()));
        assert_eq!(query[1], ("timeout", LONG_POLL_SECONDS.to_string()));
    }

    #[test]
    fn update_from_other_chat_still_decodes() {
        let response: TelegramApiResponse = serde_json::from_str(
            r#"{"ok":true,"result":[{"update_id":7,"message":{"chat":{"id":99},"text":"/ping"}},{"update_id":8}]}"#,
        )
        .unwrap();
        assert_eq!(response.result.len(), 2);
        assert_eq!(response.result[0].message.as_ref().unwrap().chat.id, 99);
        assert!(response.result[1].message.is_none());
    }
}
