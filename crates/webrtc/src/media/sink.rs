//! Media sinks and stream locators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Dereferenceable locator for a media stream, `stream://<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLocator(String);

impl MediaLocator {
    /// Locator for the stream with the given identifier
    pub fn for_stream(id: &str) -> Self {
        Self(format!("stream://{}", id))
    }

    /// Locator string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the locator carries no stream reference
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiver of media source locators, typically backing a video element
///
/// The session assigns a locator when media becomes available and clears
/// the binding on dispose so the sink can release its own resources.
#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Bind the sink to a media source
    async fn attach(&self, locator: MediaLocator, muted: bool);

    /// Release the bound source
    async fn clear(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_format() {
        let locator = MediaLocator::for_stream("cam-1");
        assert_eq!(locator.as_str(), "stream://cam-1");
        assert!(!locator.is_empty());
    }

    #[test]
    fn test_locator_round_trip() {
        let locator = MediaLocator::for_stream("abc");
        let json = serde_json::to_string(&locator).unwrap();
        let back: MediaLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locator);
    }
}
