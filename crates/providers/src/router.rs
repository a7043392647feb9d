//! Provider router: selects the LLM provider named in the config.

use crate::openai_compat::OpenAiCompatProvider;
use std::collections::HashMap;
use std::sync::Arc;
use thinkfirst_core::provider::Provider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// All registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// The default provider is always registered, even without a
/// `[providers.<name>]` section.
pub fn build_from_config(config: &thinkfirst_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// The model to use for the default provider: its own `default_model`
/// when set, otherwise the global one.
pub fn default_model(config: &thinkfirst_config::AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thinkfirst_config::{AppConfig, ProviderConfig};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("groq");
        router.register("groq", Arc::new(OpenAiCompatProvider::groq("gsk-test")));

        assert!(router.get("groq").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["groq"]);
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("groq").contains("api.groq.com"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let router = build_from_config(&AppConfig::default());
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn provider_section_overrides_model() {
        let mut config = AppConfig::default();
        assert_eq!(default_model(&config), "llama-3.3-70b-versatile");

        config.providers.insert(
            "groq".into(),
            ProviderConfig {
                api_key: Some("gsk-own".into()),
                api_url: None,
                default_model: Some("llama-3.1-8b-instant".into()),
            },
        );
        assert_eq!(default_model(&config), "llama-3.1-8b-instant");
        assert!(build_from_config(&config).get("groq").is_some());
    }

    #[test]
    fn configured_sections_are_listed_sorted() {
        let mut config = AppConfig::default();
        for name in ["openai", "ollama"] {
            config.providers.insert(
                name.into(),
                ProviderConfig {
                    api_key: None,
                    api_url: None,
                    default_model: None,
                },
            );
        }
        assert_eq!(
            build_from_config(&config).list(),
            vec!["groq", "ollama", "openai"]
        );
    }
}
