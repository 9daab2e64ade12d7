//! # Configuration
//!
//! Settings for the pattern cache and the path policies it builds. Every
//! field has a default, so a YAML document only needs the keys it changes:
//!
//! ```yaml
//! capacity: 250
//! path:
//!   ellipsis: false
//! ```

use crate::error::{PatternError, Result};
use serde::Deserialize;

/// Limits applied to rendered file paths
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PathOptions {
    /// Mark shortened segments with a trailing `..`.
    pub ellipsis: bool,
    /// Maximum characters per path segment, extension included.
    pub max_segment_len: usize,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            ellipsis: true,
            max_segment_len: 255,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Number of compiled patterns kept before the least recently used is evicted.
    pub capacity: usize,
    pub path: PathOptions,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            path: PathOptions::default(),
        }
    }
}

impl CacheConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| PatternError::MetadataError(e.to_string()))
    }
}
