//! Bounded LRU memoisation for sentiment and language lookups.

use super::{LanguageResult, SentimentResult, TextAnalytics};
use crate::provider::ProviderError;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

/// Entries kept per operation.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Wraps a [`TextAnalytics`] implementation with one LRU cache per operation,
/// keyed by the exact input text.
///
/// Locks are held only for the lookup or the insert, never across the
/// outbound call. Two concurrent misses on the same text may both reach the
/// inner client; the later insert wins. Failures are not cached.
pub struct CachedTextAnalytics<T> {
    inner: T,
    sentiment: Mutex<LruCache<String, SentimentResult>>,
    language: Mutex<LruCache<String, LanguageResult>>,
}

impl<T: TextAnalytics> CachedTextAnalytics<T> {
    /// Wrap `inner` with [`DEFAULT_CACHE_CAPACITY`] entries per operation.
    pub fn new(inner: T) -> Self {
        Self::with_capacity(
            inner,
            NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        )
    }

    pub fn with_capacity(inner: T, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            sentiment: Mutex::new(LruCache::new(capacity)),
            language: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[cfg(test)]
impl<T: TextAnalytics> CachedTextAnalytics<T> {
    fn inner(&self) -> &T {
        &self.inner
    }

    /// Number of cached `(sentiment, language)` entries.
    fn cached_entries(&self) -> (usize, usize) {
        (lock(&self.sentiment).len(), lock(&self.language).len())
    }
}

fn lock<V>(cache: &Mutex<LruCache<String, V>>) -> std::sync::MutexGuard<'_, LruCache<String, V>> {
    // The cache holds plain values, so a poisoned lock still guards a valid map.
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lookup<V: Clone>(cache: &Mutex<LruCache<String, V>>, text: &str) -> Option<V> {
    lock(cache).get(text).cloned()
}

fn store<V>(cache: &Mutex<LruCache<String, V>>, text: &str, value: V) {
    lock(cache).put(text.to_string(), value);
}

#[async_trait]
impl<T: TextAnalytics> TextAnalytics for CachedTextAnalytics<T> {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ProviderError> {
        if let Some(hit) = lookup(&self.sentiment, text) {
            tracing::debug!(chars = text.chars().count(), "Sentiment cache hit");
            return Ok(hit);
        }

        let result = self.inner.analyze_sentiment(text).await?;
        store(&self.sentiment, text, result.clone());
        Ok(result)
    }

    async fn detect_language(&self, text: &str) -> Result<LanguageResult, ProviderError> {
        if let Some(hit) = lookup(&self.language, text) {
            tracing::debug!(chars = text.chars().count(), "Language cache hit");
            return Ok(hit);
        }

        let result = self.inner.detect_language(text).await?;
        store(&self.language, text, result.clone());
        Ok(result)
    }
}
