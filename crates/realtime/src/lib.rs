//! Real-time data sources for ThinkFirst.
//!
//! Gives the tutor current facts it cannot know on its own: the weather
//! in a city and today's headlines. Both sources implement
//! `thinkfirst_core::RealtimeSource` and are collected in a `RealtimeHub`.

pub mod news;
pub mod weather;

use std::time::Duration;
use thinkfirst_config::RealtimeConfig;
use thinkfirst_core::realtime::RealtimeHub;

pub use news::NewsSource;
pub use weather::WeatherSource;

/// Timeout for a single source request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a hub with the weather and news sources.
///
/// Sources without an API key are still registered; they report
/// `NotConfigured` on every fetch, which the hub turns into "no data".
pub fn default_hub(config: &RealtimeConfig) -> RealtimeHub {
    let mut hub = RealtimeHub::new();
    hub.register(Box::new(WeatherSource::new(config.weather.clone())));
    hub.register(Box::new(NewsSource::new(config.news.clone())));
    hub
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}
