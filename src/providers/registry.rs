use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{CachedLlm, GeminiClient, LlmProvider, PerplexityClient, SerpApiClient, TravelDataProvider};
use crate::cache::PersistentCache;
use crate::config::TripMazerConfig;
use crate::Result;

/// Provider clients built from configuration
///
/// Perplexity is required. Gemini (airport codes) and SerpAPI (live hotels
/// and flights) are only built when their keys are configured.
pub struct ProviderSet {
    pub perplexity: Arc<PerplexityClient>,
    pub llm: Arc<dyn LlmProvider>,
    pub gemini: Option<Arc<dyn LlmProvider>>,
    pub travel_data: Option<Arc<dyn TravelDataProvider>>,
}

fn open_cache(config: &TripMazerConfig) -> Option<PersistentCache> {
    if !config.cache.enabled {
        return None;
    }
    let location = config.cache.resolved_location();
    match PersistentCache::open(&location) {
        Ok(cache) => {
            debug!("Response cache at {}", location.display());
            Some(cache)
        }
        Err(e) => {
            warn!("Response cache unavailable at {}: {e}", location.display());
            None
        }
    }
}

impl ProviderSet {
    pub fn from_config(config: &TripMazerConfig) -> Result<Self> {
        let perplexity = Arc::new(PerplexityClient::new(&config.perplexity)?);

        let gemini: Option<Arc<dyn LlmProvider>> = match config.gemini.api_key {
            Some(_) => Some(Arc::new(GeminiClient::new(&config.gemini)?)),
            None => None,
        };

        let travel_data: Option<Arc<dyn TravelDataProvider>> = match config.serp.api_key {
            Some(_) => Some(Arc::new(SerpApiClient::new(&config.serp)?)),
            None => None,
        };

        let mut llm: Arc<dyn LlmProvider> = perplexity.clone();
        let mut gemini = gemini;
        if let Some(cache) = open_cache(config) {
            let ttl = Duration::from_secs(config.cache.ttl_seconds);
            llm = Arc::new(CachedLlm::new(llm, cache.clone(), ttl));
            gemini = gemini.map(|inner| -> Arc<dyn LlmProvider> {
                Arc::new(CachedLlm::new(inner, cache.clone(), ttl))
            });
        }

        Ok(Self {
            perplexity,
            llm,
            gemini,
            travel_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TripMazerConfig {
        let mut config = TripMazerConfig::default();
        config.perplexity.api_key = Some("pplx-test-key".to_string());
        config.cache.enabled = false;
        config
    }

    #[test]
    fn test_optional_providers_follow_keys() {
        let providers = ProviderSet::from_config(&config()).unwrap();
        assert_eq!(providers.llm.name(), "perplexity");
        assert!(providers.gemini.is_none());
        assert!(providers.travel_data.is_none());

        let mut with_keys = config();
        with_keys.gemini.api_key = Some("gemini-test-key".to_string());
        with_keys.serp.api_key = Some("serp-test-key".to_string());
        let providers = ProviderSet::from_config(&with_keys).unwrap();
        assert!(providers.gemini.is_some());
        assert!(providers.travel_data.is_some());
    }

    #[test]
    fn test_missing_perplexity_key_is_config_error() {
        let mut config = config();
        config.perplexity.api_key = None;
        let err = ProviderSet::from_config(&config).err().unwrap();
        assert!(matches!(err, crate::TripMazerError::Config { .. }));
    }

    #[test]
    fn test_cache_wraps_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.cache.enabled = true;
        config.cache.location = dir.path().join("cache").display().to_string();
        let providers = ProviderSet::from_config(&config).unwrap();
        assert_eq!(providers.llm.name(), "perplexity");
    }
}
