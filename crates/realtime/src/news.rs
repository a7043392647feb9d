//! Headline source backed by NewsAPI `top-headlines`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thinkfirst_config::NewsConfig;
use thinkfirst_core::error::RealtimeError;
use thinkfirst_core::realtime::{RealtimeKind, RealtimeSnippet, RealtimeSource};
use tracing::debug;

const SOURCE_NAME: &str = "newsapi";

pub struct NewsSource {
    config: NewsConfig,
    client: reqwest::Client,
}

impl NewsSource {
    pub fn new(config: NewsConfig) -> Self {
        Self {
            config,
            client: crate::http_client(),
        }
    }
}

#[async_trait]
impl RealtimeSource for NewsSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> RealtimeKind {
        RealtimeKind::News
    }

    async fn fetch(&self, message: &str) -> Result<RealtimeSnippet, RealtimeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RealtimeError::NotConfigured(SOURCE_NAME.into()))?;

        let url = format!("{}/top-headlines", self.config.base_url.trim_end_matches('/'));
        let page_size = self.config.max_headlines.max(1).to_string();
        let mut query = vec![
            ("country", self.config.country.clone()),
            ("pageSize", page_size),
        ];
        let subject = extract_subject(message);
        if let Some(ref q) = subject {
            query.push(("q", q.clone()));
        }
        debug!(country = %self.config.country, subject = ?subject, "Fetching headlines");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| RealtimeError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| RealtimeError::Request {
            source_name: SOURCE_NAME.into(),
            reason: e.to_string(),
        })?;

        let payload: NewsApiResponse =
            serde_json::from_str(&body).map_err(|e| RealtimeError::Malformed {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;

        if status != 200 || payload.status == "error" {
            return Err(RealtimeError::Upstream {
                source_name: SOURCE_NAME.into(),
                status_code: status,
                message: payload
                    .message
                    .unwrap_or_else(|| "unknown upstream error".into()),
            });
        }

        let headlines = headlines_from(payload, self.config.max_headlines);
        Ok(RealtimeSnippet {
            kind: RealtimeKind::News,
            source: SOURCE_NAME.into(),
            text: render_headlines(&self.config.country, &headlines),
            data: serde_json::to_value(&headlines).ok(),
        })
    }
}

/// Subject of a news question: the text after " about ", if any.
pub fn extract_subject(message: &str) -> Option<String> {
    let lowered = message.to_ascii_lowercase();
    let start = lowered.rfind(" about ")? + " about ".len();
    let subject = message[start..]
        .trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!' | ','))
        .trim();
    if subject.is_empty() {
        None
    } else {
        Some(subject.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
}

fn headlines_from(payload: NewsApiResponse, limit: usize) -> Vec<Headline> {
    payload
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title?.trim().to_string();
            if title.is_empty() || title == "[Removed]" {
                return None;
            }
            Some(Headline {
                title,
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "unknown".into()),
            })
        })
        .take(limit.max(1))
        .collect()
}

fn render_headlines(country: &str, headlines: &[Headline]) -> String {
    if headlines.is_empty() {
        return format!("No top headlines are available for {country} right now.");
    }
    let mut out = format!("Top headlines ({country}):");
    for (i, h) in headlines.iter().enumerate() {
        out.push_str(&format!("\n{}. {} ({})", i + 1, h.title, h.source));
    }
    out
}

// --- NewsAPI types (internal) ---

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}
