use std::time::Duration;

use feed_rs::model::Entry;
use reqwest::Client;

use crate::domain::FeedEntry;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("malformed feed: {0}")]
    Malformed(#[from] feed_rs::parser::ParseFeedError),
    #[error("feed has no entries")]
    Empty,
}

pub trait FeedSource {
    /// Entries in document order, newest first. Never returns an empty list.
    fn fetch_entries(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<FeedEntry>, FetchError>> + Send;
}

pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>, FetchError> {
        log::info!("Fetching feed {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_entries(&body)
    }
}

pub fn parse_entries(raw: &[u8]) -> Result<Vec<FeedEntry>, FetchError> {
    let feed = feed_rs::parser::parse(raw)?;
    let entries: Vec<FeedEntry> = feed.entries.iter().map(entry_from_feed).collect();
    if entries.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(entries)
}

fn entry_from_feed(entry: &Entry) -> FeedEntry {
    let title = entry
        .title
        .as_ref()
        .map(|text| text.content.trim().to_string())
        .unwrap_or_default();
    let guid = Some(entry.id.trim().to_string()).filter(|id| !id.is_empty());
    // A permalink guid stands in for a missing <link>.
    let link = entry
        .links
        .first()
        .map(|link| link.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .or_else(|| {
            guid.clone()
                .filter(|id| id.starts_with("http://") || id.starts_with("https://"))
        });
    let published = entry
        .published
        .or(entry.updated)
        .map(|timestamp| timestamp.to_rfc2822());
    let summary = entry
        .summary
        .as_ref()
        .map(|text| text.content.trim().to_string())
        .filter(|text| !text.is_empty());

    FeedEntry {
        title,
        link,
        published,
        summary,
        guid,
    }
}
