use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::FeedEntry;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram rejected the message ({status}): {description}")]
    Api { status: u16, description: String },
}

pub trait Notifier {
    fn notify(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages to one chat through the Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        bot_token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                bot_token.trim()
            ),
            chat_id: chat_id.trim().to_string(),
        })
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        log::info!("Sending notification to chat {}", self.chat_id);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            // reqwest puts the URL, and with it the token, into its errors.
            .map_err(|err| NotifyError::Request(err.without_url()))?;

        let status = response.status();
        let body = response
            .json::<ApiResponse>()
            .await
            .map_err(|err| err.without_url());

        match body {
            Ok(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Ok(ApiResponse { description, .. }) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
            Err(_) if !status.is_success() => Err(NotifyError::Api {
                status: status.as_u16(),
                description: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            }),
            Err(err) => Err(NotifyError::Request(err)),
        }
    }
}

/// Renders the notification text for a newly seen entry.
pub fn format_message(header: &str, entry: &FeedEntry, summary_max_chars: usize) -> String {
    let mut message = format!(
        "{}\n{}\n🔗 {}\nPublished: {}",
        header,
        entry.title,
        entry.link.as_deref().unwrap_or("(no link)"),
        entry.published.as_deref().unwrap_or("unknown"),
    );

    if summary_max_chars > 0 {
        if let Some(summary) = entry.summary.as_deref() {
            message.push_str("\n\n");
            message.push_str(&truncate(summary, summary_max_chars));
        }
    }
    message
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
