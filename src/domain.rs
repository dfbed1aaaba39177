use sha2::{Digest, Sha256};

/// One item of the watched feed, already trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<String>,
    pub summary: Option<String>,
    /// The feed's own entry id (RSS `guid`, Atom `id`), when present.
    pub guid: Option<String>,
}

impl FeedEntry {
    /// Stable identifier used for change detection.
    ///
    /// The canonical link wins. Entries without one are identified by a
    /// SHA-256 of their guid, title and published date, so the summary never
    /// influences the result.
    pub fn identifier(&self) -> String {
        if let Some(link) = self.link.as_deref().map(str::trim) {
            if !link.is_empty() {
                return link.to_string();
            }
        }

        let mut hasher = Sha256::new();
        hasher.update(self.guid.as_deref().unwrap_or_default().trim().as_bytes());
        hasher.update([0x1f_u8]);
        hasher.update(self.title.trim().as_bytes());
        hasher.update([0x1f_u8]);
        hasher.update(self.published.as_deref().unwrap_or_default().trim().as_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Terminal state of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The feed could not be read or had no entries; nothing was touched.
    FeedUnavailable,
    /// No prior identifier existed; it was stored without notifying.
    /// `persisted` is false when that write failed.
    Initialized { identifier: String, persisted: bool },
    Unchanged,
    /// Notification delivered. `persisted` is false when the write failed
    /// afterwards, which means the next run will notify again.
    Notified { identifier: String, persisted: bool },
    /// Notification failed; the stored identifier was left alone.
    NotifyFailed { identifier: String },
}
