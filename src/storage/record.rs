use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// Metadata extracted from one successfully fetched page
///
/// Field names match the on-disk JSON layout. `headers` is the text of every
/// heading on the page joined with single spaces, and `timestamp` is the fetch
/// time in RFC 2822 form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub timestamp: String,
}

impl PageRecord {
    pub fn new<Tz>(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        headers: &[String],
        fetched_at: DateTime<Tz>,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
            headers: join_headers(headers),
            timestamp: fetched_at.to_rfc2822(),
        }
    }

    /// Parses the stored timestamp, if it is in RFC 2822 form
    ///
    /// Records written by other tools may carry free-form timestamps; those
    /// yield `None`.
    pub fn fetched_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(&self.timestamp).ok()
    }
}

fn join_headers(headers: &[String]) -> String {
    headers
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
