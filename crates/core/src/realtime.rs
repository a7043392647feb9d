//! Real-time data sources for weather and news lookups.
//!
//! A source turns a user message into a short factual snippet that the
//! prompt builder injects verbatim. Sources are optional collaborators:
//! [`RealtimeHub::lookup`] swallows every failure and returns `None`.

use crate::error::RealtimeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Marker phrases that make a message a weather lookup.
pub const WEATHER_MARKERS: &[&str] = &[
    "weather",
    "temperature",
    "how hot",
    "how cold",
    "climate",
    "forecast",
];

/// Marker phrases that make a message a news lookup.
pub const NEWS_MARKERS: &[&str] = &[
    "news",
    "today's news",
    "latest news",
    "current events",
    "headlines",
];

/// What kind of factual lookup a message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeKind {
    Weather,
    News,
}

impl RealtimeKind {
    /// Detect a lookup in an already lowercased, trimmed message.
    ///
    /// Weather wins when both marker sets match.
    pub fn detect(lowered: &str) -> Option<Self> {
        if WEATHER_MARKERS.iter().any(|m| lowered.contains(m)) {
            Some(Self::Weather)
        } else if NEWS_MARKERS.iter().any(|m| lowered.contains(m)) {
            Some(Self::News)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RealtimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weather => write!(f, "weather"),
            Self::News => write!(f, "news"),
        }
    }
}

/// A normalized record returned by a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeSnippet {
    pub kind: RealtimeKind,

    /// Name of the source that produced it (e.g., "openweathermap")
    pub source: String,

    /// Human-readable block injected into the instruction text
    pub text: String,

    /// Structured form of the same data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A weather or news provider.
#[async_trait]
pub trait RealtimeSource: Send + Sync {
    /// Unique name of this source (e.g., "openweathermap").
    fn name(&self) -> &str;

    /// Which kind of message this source answers.
    fn kind(&self) -> RealtimeKind;

    /// Fetch a snippet for the given user message.
    async fn fetch(&self, message: &str) -> std::result::Result<RealtimeSnippet, RealtimeError>;
}

/// The set of registered sources, at most one per kind.
#[derive(Default)]
pub struct RealtimeHub {
    sources: Vec<Box<dyn RealtimeSource>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Replaces any existing source of the same kind.
    pub fn register(&mut self, source: Box<dyn RealtimeSource>) {
        self.sources.retain(|s| s.kind() != source.kind());
        self.sources.push(source);
    }

    pub fn get(&self, kind: RealtimeKind) -> Option<&dyn RealtimeSource> {
        self.sources
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_ref())
    }

    /// Names of all registered sources.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch a snippet for `message`, or `None` when the message is not a
    /// lookup, no source is registered, or the source failed.
    pub async fn lookup(&self, message: &str) -> Option<RealtimeSnippet> {
        let kind = RealtimeKind::detect(&message.trim().to_lowercase())?;
        let Some(source) = self.get(kind) else {
            debug!(%kind, "No real-time source registered");
            return None;
        };

        match source.fetch(message).await {
            Ok(snippet) => {
                debug!(source = source.name(), %kind, "Real-time data fetched");
                Some(snippet)
            }
            Err(e) => {
                warn!(source = source.name(), %kind, error = %e, "Real-time lookup failed, continuing without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        kind: RealtimeKind,
        fail: bool,
    }

    #[async_trait]
    impl RealtimeSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn kind(&self) -> RealtimeKind {
            self.kind
        }

        async fn fetch(&self, _message: &str) -> Result<RealtimeSnippet, RealtimeError> {
            if self.fail {
                return Err(RealtimeError::NotConfigured("fixed".into()));
            }
            Ok(RealtimeSnippet {
                kind: self.kind,
                source: "fixed".into(),
                text: format!("{} data", self.kind),
                data: None,
            })
        }
    }

    #[test]
    fn detects_weather_before_news() {
        assert_eq!(
            RealtimeKind::detect("weather news for paris"),
            Some(RealtimeKind::Weather)
        );
        assert_eq!(
            RealtimeKind::detect("any headlines today?"),
            Some(RealtimeKind::News)
        );
        assert_eq!(RealtimeKind::detect("how do i sort a list"), None);
    }

    #[tokio::test]
    async fn lookup_routes_by_kind() {
        let mut hub = RealtimeHub::new();
        hub.register(Box::new(FixedSource {
            kind: RealtimeKind::News,
            fail: false,
        }));

        let snippet = hub.lookup("Latest news please").await.unwrap();
        assert_eq!(snippet.kind, RealtimeKind::News);
        assert_eq!(snippet.text, "news data");

        assert!(hub.lookup("What's the weather in Oslo?").await.is_none());
        assert!(hub.lookup("explain recursion").await.is_none());
    }

    #[tokio::test]
    async fn failing_source_degrades_to_none() {
        let mut hub = RealtimeHub::new();
        hub.register(Box::new(FixedSource {
            kind: RealtimeKind::Weather,
            fail: true,
        }));
        assert!(hub.lookup("weather in Paris").await.is_none());
    }

    #[test]
    fn register_replaces_same_kind() {
        let mut hub = RealtimeHub::new();
        hub.register(Box::new(FixedSource {
            kind: RealtimeKind::Weather,
            fail: true,
        }));
        hub.register(Box::new(FixedSource {
            kind: RealtimeKind::Weather,
            fail: false,
        }));
        assert_eq!(hub.names().len(), 1);
    }
}
