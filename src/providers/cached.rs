//! Response caching for any [`LlmProvider`]

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ChatRequest, LlmProvider};
use crate::cache::{PersistentCache, jittered_ttl};
use crate::Result;

/// Serves repeated prompts from the persistent cache
pub struct CachedLlm {
    inner: Arc<dyn LlmProvider>,
    cache: PersistentCache,
    ttl: Duration,
}

impl CachedLlm {
    pub fn new(inner: Arc<dyn LlmProvider>, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(&self, request: &ChatRequest) -> String {
        let model = request.model.as_deref().unwrap_or(self.inner.default_model());
        let mut hasher = DefaultHasher::new();
        model.hash(&mut hasher);
        request.temperature.to_bits().hash(&mut hasher);
        request.system_prompt.hash(&mut hasher);
        request.query.hash(&mut hasher);
        format!("llm_{}_{:016x}", self.inner.name(), hasher.finish())
    }
}

#[async_trait]
impl LlmProvider for CachedLlm {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let key = self.cache_key(&request);

        match self.cache.get::<String>(&key).await {
            Ok(Some(hit)) => {
                debug!("Serving {} response from cache", self.inner.name());
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed, calling provider: {e:#}"),
        }

        let response = self.inner.complete(request).await?;

        if let Err(e) = self.cache.put(&key, response.clone(), jittered_ttl(self.ttl)).await {
            warn!("Failed to cache {} response: {e:#}", self.inner.name());
        }
        Ok(response)
    }
}
