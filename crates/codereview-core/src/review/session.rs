//! Content cache in front of a review provider.

use tracing::warn;

use crate::errors::ReviewResult;
use crate::review::provider::ReviewProvider;
use crate::store::cache::ContentCache;

/// Reported once per [`CachedReviewer::review`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewEvent {
    CacheHit,
    CacheMiss { provider: String, model: String },
}

type ProgressCallback = Box<dyn Fn(&ReviewEvent) + Send + Sync>;

pub struct CachedReviewer<P> {
    provider: P,
    cache: Option<ContentCache>,
    on_progress: Option<ProgressCallback>,
}

impl<P: ReviewProvider> CachedReviewer<P> {
    pub fn new(provider: P, cache: Option<ContentCache>) -> Self {
        Self {
            provider,
            cache,
            on_progress: None,
        }
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ReviewEvent) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Raw response for `prompt`, cached under `content` and the provider's
    /// `(name, model)`. Provider errors are returned as-is and never cached.
    pub fn review(&self, content: &str, prompt: &str) -> ReviewResult<String> {
        let name = self.provider.name();
        let model = self.provider.model();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get::<String>(content, name, model) {
                self.emit(&ReviewEvent::CacheHit);
                return Ok(hit);
            }
        }

        self.emit(&ReviewEvent::CacheMiss {
            provider: name.to_string(),
            model: model.to_string(),
        });
        let response = self.provider.analyze_code(prompt)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(content, &response, name, model) {
                warn!("Failed to cache review response: {e}");
            }
        }
        Ok(response)
    }

    fn emit(&self, event: &ReviewEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }
}
