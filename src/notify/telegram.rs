use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::notify::{Notifier, NotifyError};

/// Telegram Bot API client for sendMessage.
///
/// The request timeout is bounded so one unreachable chat cannot stall an
/// entire sweep.
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", bot_token),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/sendMessage", self.base_url);
        let params = [
            ("chat_id", chat_id),
            ("text", text),
            ("parse_mode", "MarkdownV2"),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id, "Telegram message delivered");
        Ok(())
    }
}
