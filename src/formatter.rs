//! # Formatter
//!
//! A [`Formatter`] is a compiled pattern bound to a [`FormatPolicy`]. It is
//! immutable once built and can be shared between threads.
//!
//! ## Rendering
//! - [`Formatter::format`] joins the scalar program's output and runs the
//!   policy's `post` hook on it
//! - [`Formatter::format_list`] expands every multi-valued tag into all
//!   combinations of `(display, sort)` pairs
//!
//! ## Validation
//! Construction renders the pattern once against a stand-in song that has
//! every tag, so a pattern that cannot render (for instance a relative path
//! with a separator) is rejected before it is ever cached or used.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tagpattern::{Formatter, PlainText, StrictQueryParser, TagMap};
//!
//! let formatter =
//!     Formatter::new("<artist> - <title>", Arc::new(PlainText), &StrictQueryParser).unwrap();
//! let song = TagMap::from_iter([("artist", "Foo"), ("title", "Bar")]);
//! assert_eq!(formatter.format(&song).unwrap(), "Foo - Bar");
//! assert_eq!(formatter.tags(), ["artist", "title"]);
//! ```

use crate::compiler::{CompiledPattern, FieldSource, Fragment};
use crate::error::{PatternError, Result};
use crate::parser::parse;
use crate::policy::{FormatPolicy, PolicyKind};
use crate::query::QueryParser;
use crate::song::{Song, TagValue};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Reads a song on behalf of a running program, applying the policy's
/// per-value hook to everything it returns.
struct SongProxy<'a> {
    song: &'a dyn Song,
    policy: &'a dyn FormatPolicy,
}

impl FieldSource for SongProxy<'_> {
    fn comma(&self, key: &str) -> String {
        let value = self.song.comma(key).decode();
        self.policy.format_value(key, value)
    }

    fn list_separate(&self, key: &str) -> Vec<(String, String)> {
        let numeric = key
            .strip_prefix("~#")
            .is_some_and(|rest| !rest.contains('~'));
        if numeric {
            let value = self.song.get(key).map(|v| v.decode()).unwrap_or_default();
            let value = self.policy.format_value(key, value);
            return vec![(value.clone(), value)];
        }

        self.song
            .list_separate(key)
            .into_iter()
            .map(|(display, sort)| {
                (
                    self.policy.format_value(key, display),
                    self.policy.format_value(key, sort),
                )
            })
            .collect()
    }

    fn song(&self) -> &dyn Song {
        self.song
    }
}

/// Stand-in song used to validate patterns: every tag exists, numeric
/// tags are zero.
struct DummySong;

impl Song for DummySong {
    fn get(&self, key: &str) -> Option<TagValue> {
        let numeric = key
            .strip_prefix("~#")
            .is_some_and(|rest| !rest.contains('~'));
        if numeric {
            Some(TagValue::Int(0))
        } else {
            Some(TagValue::from("_"))
        }
    }

    fn comma(&self, _key: &str) -> TagValue {
        TagValue::from("_")
    }

    fn list_separate(&self, _key: &str) -> Vec<(String, String)> {
        vec![("_".to_string(), "_".to_string())]
    }
}

/// A validated, compiled pattern with its rendering policy
#[derive(Debug)]
pub struct Formatter {
    pattern: String,
    policy: Arc<dyn FormatPolicy>,
    compiled: CompiledPattern,
}

impl Formatter {
    /// Parse, compile and validate `pattern`.
    ///
    /// Fails with `LexError` for an unlexable pattern and with
    /// `ValidationError` when rendering the stand-in song fails.
    pub fn new(
        pattern: &str,
        policy: Arc<dyn FormatPolicy>,
        queries: &dyn QueryParser,
    ) -> Result<Self> {
        let source = policy.preprocess(pattern);
        let root = parse(&source)?;
        let compiled = CompiledPattern::compile(&root, policy.as_ref(), queries);

        let formatter = Self {
            pattern: pattern.to_string(),
            policy,
            compiled,
        };
        formatter
            .format(&DummySong)
            .map_err(|e| PatternError::ValidationError {
                pattern: pattern.to_string(),
                source: Box::new(e),
            })?;
        Ok(formatter)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Distinct atomic tags the pattern references, in first-use order.
    pub fn tags(&self) -> &[String] {
        &self.compiled.tags
    }

    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    fn proxy<'a>(&'a self, song: &'a dyn Song) -> SongProxy<'a> {
        SongProxy {
            song,
            policy: self.policy.as_ref(),
        }
    }

    /// Render one string for `song`.
    pub fn format(&self, song: &dyn Song) -> Result<String> {
        let mut value = String::new();
        for fragment in self.compiled.scalar.run(&self.proxy(song)) {
            match fragment {
                Fragment::Text(text) => value.push_str(&text),
                Fragment::Values(values) => {
                    let displays: Vec<&str> = values.iter().map(|(d, _)| d.as_str()).collect();
                    value.push_str(&displays.join(", "));
                }
            }
        }
        self.policy.post(value, song)
    }

    /// Render every combination of the values of multi-valued tags as
    /// `(display, sort)` pairs. Never empty.
    pub fn format_list(&self, song: &dyn Song) -> Result<BTreeSet<(String, String)>> {
        let mut values = vec![(String::new(), String::new())];
        for fragment in self.compiled.list.run(&self.proxy(song)) {
            if fragment.is_empty() {
                continue;
            }
            values = match fragment {
                Fragment::Text(text) => values
                    .into_iter()
                    .map(|(display, sort)| (display + &text, sort + &text))
                    .collect(),
                Fragment::Values(parts) => parts
                    .iter()
                    .flat_map(|(part_display, part_sort)| {
                        values.iter().map(move |(display, sort)| {
                            (
                                format!("{}{}", display, part_display),
                                format!("{}{}", sort, part_sort),
                            )
                        })
                    })
                    .collect(),
            };
        }

        values
            .into_iter()
            .map(|(display, sort)| {
                Ok((
                    self.policy.post(display, song)?,
                    self.policy.post(sort, song)?,
                ))
            })
            .collect()
    }
}
