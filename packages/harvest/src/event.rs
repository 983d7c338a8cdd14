//! Discovery events and provenance tags.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance category of a discovered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    /// Certificate-transparency logs
    Cert,
    /// Scraped web pages
    Scrape,
    /// Structured provider APIs
    Api,
    /// Web archives
    Archive,
    /// DNS-derived data
    Dns,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Cert => "CERT",
            SourceTag::Scrape => "SCRAPE",
            SourceTag::Api => "API",
            SourceTag::Archive => "ARCHIVE",
            SourceTag::Dns => "DNS",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A newly discovered name plus where it came from.
///
/// `name` always belongs to `domain`'s namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    /// Candidate hostname
    pub name: String,

    /// Root domain the name was matched against
    pub domain: String,

    /// Provenance category
    pub tag: SourceTag,

    /// Identifier of the emitting source
    pub source: String,

    /// When the source detected the name
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveryEvent {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        tag: SourceTag,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            tag,
            source: source.into(),
            discovered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_serializes_upper_case() {
        let event = DiscoveryEvent::new("api.example.com", "example.com", SourceTag::Cert, "Entrust");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["tag"], "CERT");
        assert_eq!(json["name"], "api.example.com");
        assert_eq!(json["source"], "Entrust");
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceTag::Scrape.to_string(), "SCRAPE");
    }
}
