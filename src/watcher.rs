use crate::domain::RunOutcome;
use crate::feed::{FeedSource, FetchError};
use crate::repository::LastSeenRepository;
use crate::telegram::{self, Notifier};

/// Message settings carried from the config into the run.
#[derive(Debug, Clone)]
pub struct MessageFormat {
    pub header: String,
    pub summary_max_chars: usize,
}

pub struct Watcher<S, N, R>
where
    S: FeedSource,
    N: Notifier,
    R: LastSeenRepository,
{
    source: S,
    notifier: N,
    repository: R,
    format: MessageFormat,
}

impl<S, N, R> Watcher<S, N, R>
where
    S: FeedSource,
    N: Notifier,
    R: LastSeenRepository,
{
    pub fn new(source: S, notifier: N, repository: R, format: MessageFormat) -> Self {
        Self {
            source,
            notifier,
            repository,
            format,
        }
    }

    /// Performs one Fetch → Identify → Compare → Notify → Persist pass.
    ///
    /// Every failure is handled here and reported through the outcome. The
    /// stored identifier is only written as the final step, and only on the
    /// first run or after a delivered notification.
    pub async fn run_once(&mut self) -> RunOutcome {
        let entries = match self.source.fetch_entries().await {
            Ok(entries) => entries,
            Err(FetchError::Empty) => {
                log::warn!("No feed entries found");
                return RunOutcome::FeedUnavailable;
            }
            Err(err) => {
                log::warn!("Failed to fetch feed: {}", err);
                return RunOutcome::FeedUnavailable;
            }
        };
        let Some(latest) = entries.first() else {
            log::warn!("No feed entries found");
            return RunOutcome::FeedUnavailable;
        };
        let identifier = latest.identifier();

        let last_seen = match self.repository.load().await {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{}; treating as first run", err);
                None
            }
        };

        let Some(last_seen) = last_seen else {
            let persisted = match self.repository.save(&identifier).await {
                Ok(()) => {
                    log::info!("Initialized last seen identifier; no notification on first run");
                    true
                }
                Err(err) => {
                    log::error!("Failed to initialize last seen identifier: {}", err);
                    false
                }
            };
            return RunOutcome::Initialized {
                identifier,
                persisted,
            };
        };

        if last_seen == identifier {
            log::info!("No new entry");
            return RunOutcome::Unchanged;
        }

        log::info!("New entry detected: {}", identifier);
        let message =
            telegram::format_message(&self.format.header, latest, self.format.summary_max_chars);
        if let Err(err) = self.notifier.notify(&message).await {
            log::error!("Failed to send notification, will retry next run: {}", err);
            return RunOutcome::NotifyFailed { identifier };
        }

        let persisted = match self.repository.save(&identifier).await {
            Ok(()) => {
                log::info!("New entry notified and saved");
                true
            }
            Err(err) => {
                log::error!(
                    "Notification sent but {}; the next run will notify again",
                    err
                );
                false
            }
        };
        RunOutcome::Notified {
            identifier,
            persisted,
        }
    }
}
