//! Provider router — selects the correct provider based on config.

use std::collections::HashMap;
use std::sync::Arc;

use claimconduit_config::AppConfig;
use claimconduit_core::{Provider, ProviderError};
use tracing::warn;

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;

/// Providers this build knows how to construct.
pub const SUPPORTED: [&str; 2] = ["gemini", "anthropic"];

/// Routes chat sessions to the correct provider.
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

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Unknown names under `[providers.*]` are skipped; an unknown default
/// provider is an error.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ProviderError> {
    let mut router = ProviderRouter::new(&config.provider);

    for (name, provider_config) in &config.providers {
        match build_provider(name, config, provider_config.api_url.as_deref()) {
            Some(provider) => router.register(name.clone(), provider),
            None => warn!(provider = %name, "Ignoring unsupported provider in config"),
        }
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.provider).is_none() {
        let provider = build_provider(&config.provider, config, None).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{}' (supported: {})",
                config.provider,
                SUPPORTED.join(", ")
            ))
        })?;
        router.register(config.provider.clone(), provider);
    }

    Ok(router)
}

fn build_provider(name: &str, config: &AppConfig, api_url: Option<&str>) -> Option<Arc<dyn Provider>> {
    let api_key = config.provider_api_key(name).unwrap_or_default();

    let provider: Arc<dyn Provider> = match name {
        "gemini" => {
            let mut p = GeminiProvider::new(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "anthropic" => {
            let mut p = AnthropicProvider::new(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        _ => return None,
    };
    Some(provider)
}
