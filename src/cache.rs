//! # Pattern Cache
//!
//! Compiling a pattern is far more expensive than rendering one, and the
//! same few patterns are requested over and over. [`PatternCache`] keeps
//! the most recently used formatters, keyed by policy and pattern text.
//!
//! ## Behavior
//! - A hit returns the cached `Arc<Formatter>` and marks it most recently used
//! - A miss builds a new formatter, evicts the least recently used entry if
//!   the cache is full, and inserts it
//! - A pattern that fails to build is not cached
//!
//! [`PatternCache`] needs `&mut self`; [`SharedPatternCache`] wraps it in a
//! mutex for use from several threads.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tagpattern::PatternCache;
//!
//! let mut cache = PatternCache::default();
//! let first = cache.pattern("<artist>").unwrap();
//! let second = cache.pattern("<artist>").unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use crate::config::CacheConfig;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::policy::{Platform, PolicyKind};
use crate::query::{QueryParser, StrictQueryParser};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

type CacheKey = (PolicyKind, String);

/// Bounded least-recently-used cache of formatters
pub struct PatternCache {
    config: CacheConfig,
    platform: Platform,
    queries: Arc<dyn QueryParser>,
    entries: HashMap<CacheKey, Arc<Formatter>>,
    /// Least recently used first.
    order: VecDeque<CacheKey>,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl PatternCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_platform(config, Platform::current())
    }

    pub fn with_platform(config: CacheConfig, platform: Platform) -> Self {
        Self {
            config,
            platform,
            queries: Arc::new(StrictQueryParser),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Use another strict query parser for conditions. Clears the cache.
    pub fn with_query_parser(mut self, queries: Arc<dyn QueryParser>) -> Self {
        self.queries = queries;
        self.clear();
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Maximum number of entries. Always at least one.
    pub fn capacity(&self) -> usize {
        self.config.capacity.max(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, kind: PolicyKind, pattern: &str) -> bool {
        self.entries.contains_key(&(kind, pattern.to_string()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// The formatter for `pattern` under the policy `kind`, built on first use.
    pub fn get(&mut self, kind: PolicyKind, pattern: &str) -> Result<Arc<Formatter>> {
        let key = (kind, pattern.to_string());

        if let Some(formatter) = self.entries.get(&key) {
            let formatter = Arc::clone(formatter);
            self.touch(&key);
            return Ok(formatter);
        }

        debug!(policy = %kind, pattern, "pattern cache miss");
        let policy = kind.build(&self.config, &self.platform);
        let formatter = Arc::new(Formatter::new(pattern, policy, self.queries.as_ref())?);

        while self.entries.len() >= self.capacity() {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            debug!(policy = %oldest.0, pattern = %oldest.1, "evicting pattern");
            self.entries.remove(&oldest);
        }

        self.entries.insert(key.clone(), Arc::clone(&formatter));
        self.order.push_back(key);
        Ok(formatter)
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(index) = self.order.iter().position(|k| k == key) {
            if let Some(key) = self.order.remove(index) {
                self.order.push_back(key);
            }
        }
    }

    /// Plain text rendering.
    pub fn pattern(&mut self, pattern: &str) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::Plain, pattern)
    }

    /// A file path keeping the song's own extension.
    pub fn file_from_pattern(&mut self, pattern: &str) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::File, pattern)
    }

    /// A file path whose extension comes from the pattern.
    pub fn arbitrary_extension_file_from_pattern(
        &mut self,
        pattern: &str,
    ) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::ArbitraryExtensionFile, pattern)
    }

    /// Markup with escaped values.
    pub fn xml_from_pattern(&mut self, pattern: &str) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::Markup, pattern)
    }

    /// Markup with escaped values and `[b]`-style shorthands expanded.
    pub fn xml_from_markup_pattern(&mut self, pattern: &str) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::MarkupShorthand, pattern)
    }

    /// URL query text.
    pub fn url_from_pattern(&mut self, pattern: &str) -> Result<Arc<Formatter>> {
        self.get(PolicyKind::Url, pattern)
    }
}

/// A [`PatternCache`] behind a mutex
#[derive(Default)]
pub struct SharedPatternCache {
    inner: Mutex<PatternCache>,
}

impl SharedPatternCache {
    pub fn new(cache: PatternCache) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    pub fn get(&self, kind: PolicyKind, pattern: &str) -> Result<Arc<Formatter>> {
        self.inner.lock().get(kind, pattern)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
