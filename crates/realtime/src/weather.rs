//! Weather source backed by the OpenWeatherMap current-weather API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thinkfirst_config::WeatherConfig;
use thinkfirst_core::error::RealtimeError;
use thinkfirst_core::realtime::{RealtimeKind, RealtimeSnippet, RealtimeSource};
use tracing::debug;

const SOURCE_NAME: &str = "openweathermap";

/// Words that end a place name ("weather in Paris today").
const TRAILING_TIME_WORDS: &[&str] = &[
    "today",
    "tonight",
    "tomorrow",
    "now",
    "right",
    "currently",
    "this",
];

pub struct WeatherSource {
    config: WeatherConfig,
    client: reqwest::Client,
}

impl WeatherSource {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            config,
            client: crate::http_client(),
        }
    }

    fn location_for(&self, message: &str) -> String {
        extract_location(message).unwrap_or_else(|| self.config.default_location.clone())
    }
}

#[async_trait]
impl RealtimeSource for WeatherSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> RealtimeKind {
        RealtimeKind::Weather
    }

    async fn fetch(&self, message: &str) -> Result<RealtimeSnippet, RealtimeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RealtimeError::NotConfigured(SOURCE_NAME.into()))?;

        let location = self.location_for(message);
        let url = format!("{}/weather", self.config.base_url.trim_end_matches('/'));
        debug!(%location, units = %self.config.units, "Fetching current weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", api_key),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RealtimeError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(RealtimeError::Upstream {
                source_name: SOURCE_NAME.into(),
                status_code: status,
                message: upstream_message(&body),
            });
        }

        let payload: OwmResponse = response.json().await.map_err(|e| RealtimeError::Malformed {
            source_name: SOURCE_NAME.into(),
            reason: e.to_string(),
        })?;

        let report = WeatherReport::from_owm(payload, &self.config.units);
        Ok(RealtimeSnippet {
            kind: RealtimeKind::Weather,
            source: SOURCE_NAME.into(),
            text: report.render(),
            data: serde_json::to_value(&report).ok(),
        })
    }
}

/// Pull the place name out of "what's the weather in Paris?".
///
/// Takes the text after the last " in ", " at " or " for ", trims
/// trailing punctuation, and stops at time words such as "today".
pub fn extract_location(message: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `message`.
    let lowered = message.to_ascii_lowercase();
    let start = [" in ", " at ", " for "]
        .iter()
        .filter_map(|marker| lowered.rfind(marker).map(|i| i + marker.len()))
        .max()?;

    let words: Vec<&str> = message[start..]
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-'))
        .take_while(|w| !TRAILING_TIME_WORDS.contains(&w.to_ascii_lowercase().as_str()))
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Normalized weather record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temperature_unit: &'static str,
    pub conditions: String,
    pub humidity: u32,
    pub wind_speed: f64,
    pub wind_unit: &'static str,
}

impl WeatherReport {
    fn from_owm(payload: OwmResponse, units: &str) -> Self {
        let (temperature_unit, wind_unit) = if units == "imperial" {
            ("°F", "mph")
        } else {
            ("°C", "m/s")
        };

        let conditions = payload
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "unknown conditions".into());

        Self {
            location: payload.name,
            temperature: round1(payload.main.temp),
            feels_like: round1(payload.main.feels_like),
            temperature_unit,
            conditions,
            humidity: payload.main.humidity,
            wind_speed: round1(payload.wind.speed),
            wind_unit,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Current weather in {}: {}{}, {} (feels like {}{}), humidity {}%, wind {} {}",
            self.location,
            self.temperature,
            self.temperature_unit,
            self.conditions,
            self.feels_like,
            self.temperature_unit,
            self.humidity,
            self.wind_speed,
            self.wind_unit,
        )
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// --- OpenWeatherMap API types (internal) ---

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}
