//! # Formatter Policies
//!
//! Every compiled pattern renders through a [`FormatPolicy`], which hooks
//! into three points of the pipeline:
//!
//! - [`FormatPolicy::text`] rewrites literal text once, at compile time
//! - [`FormatPolicy::format_value`] transforms each fetched tag value
//! - [`FormatPolicy::post`] transforms the joined result
//!
//! All hooks default to the identity, which is exactly [`PlainText`].
//!
//! ## Policies
//! | Kind | Type | Output |
//! |---|---|---|
//! | `Plain` | [`PlainText`] | comma-joined text |
//! | `File` | [`FilePath`] | a path keeping the song's extension |
//! | `ArbitraryExtensionFile` | [`FilePath`] | a path with whatever extension the pattern gives |
//! | `Markup` | [`Markup`] | values escaped for markup |
//! | `MarkupShorthand` | [`MarkupShorthand`] | escaped values, `[b]` style literals expanded |
//! | `Url` | [`UrlQuery`] | values percent-encoded for query strings |

mod markup;
mod path;
mod url;

pub use markup::{escape_markup, Markup, MarkupShorthand};
pub use path::{limit_path, FilePath, Platform, PlatformFamily};
pub use url::{quote_plus, UrlQuery};

use crate::config::CacheConfig;
use crate::error::{PatternError, Result};
use crate::song::Song;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Identifies a policy; part of the pattern cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyKind {
    Plain,
    File,
    ArbitraryExtensionFile,
    Markup,
    MarkupShorthand,
    Url,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 6] = [
        PolicyKind::Plain,
        PolicyKind::File,
        PolicyKind::ArbitraryExtensionFile,
        PolicyKind::Markup,
        PolicyKind::MarkupShorthand,
        PolicyKind::Url,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Plain => "plain",
            PolicyKind::File => "file",
            PolicyKind::ArbitraryExtensionFile => "file-any-ext",
            PolicyKind::Markup => "markup",
            PolicyKind::MarkupShorthand => "markup-shorthand",
            PolicyKind::Url => "url",
        }
    }

    /// Build the policy this kind names.
    pub fn build(self, config: &CacheConfig, platform: &Platform) -> Arc<dyn FormatPolicy> {
        match self {
            PolicyKind::Plain => Arc::new(PlainText),
            PolicyKind::File => {
                Arc::new(FilePath::new(true, config.path.clone(), platform.clone()))
            }
            PolicyKind::ArbitraryExtensionFile => {
                Arc::new(FilePath::new(false, config.path.clone(), platform.clone()))
            }
            PolicyKind::Markup => Arc::new(Markup),
            PolicyKind::MarkupShorthand => Arc::new(MarkupShorthand),
            PolicyKind::Url => Arc::new(UrlQuery),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PatternError::MetadataError(format!("unknown policy '{}'", s)))
    }
}

/// Pre- and post-processing hooks around a compiled pattern
pub trait FormatPolicy: Send + Sync + fmt::Debug {
    fn kind(&self) -> PolicyKind;

    /// Rewrite the pattern source before it is lexed.
    fn preprocess<'a>(&self, pattern: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(pattern)
    }

    /// Transform a literal text segment. Runs once per literal, at compile time.
    fn text(&self, literal: &str) -> String {
        literal.to_string()
    }

    /// Transform one fetched value before it is joined into the output.
    fn format_value(&self, _key: &str, value: String) -> String {
        value
    }

    /// Transform the joined output.
    fn post(&self, value: String, _song: &dyn Song) -> Result<String> {
        Ok(value)
    }
}

/// Renders values unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl FormatPolicy for PlainText {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Plain
    }
}
