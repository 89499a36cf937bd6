use std::fmt;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::notify::Notifier;

/// Posts notifications to a Telegram chat through the Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    client: ClientWithMiddleware,
    bot_token: String,
    chat_id: String,
    base_url: String,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the bot token is a credential and appears in request URLs only
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("Telegram API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Characters MarkdownV2 reserves for formatting
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            base_url: "https://api.telegram.org".into(),
        }
    }

    /// `None` (notifications disabled) unless both credentials are present
    pub fn from_credentials(bot_token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        match (bot_token, chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some(Self::new(token, chat))
            }
            _ => {
                tracing::warn!(
                    "TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set, Telegram notifications disabled"
                );
                None
            }
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let text = escape_markdown_v2(text);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "MarkdownV2"),
        ];

        let resp = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.base_url, self.bot_token))
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, message });
        }

        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        match self.send_message(message).await {
            Ok(()) => tracing::debug!("Telegram message sent"),
            Err(e) => tracing::warn!(error = %e, "Failed to send Telegram message"),
        }
    }
}
