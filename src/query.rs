//! # Strict Queries
//!
//! A condition's predicate (`<artist=Foo|...>`) may be a boolean query over
//! the song instead of a plain tag name. Query parsing is pluggable through
//! [`QueryParser`]; [`StrictQueryParser`] is the built-in implementation.
//!
//! ## Built-in Forms
//! ```text
//! tag=value        case-insensitive substring
//! tag="value"      exact match against one of the tag's values ('value' too)
//! tag=/regex/      case-insensitive regex search
//! #(tag OP num)    numeric comparison, OP one of < <= > >= = !=
//! ```
//! Anything else is not a strict query, and the condition falls back to
//! testing the tag named by the predicate.

use crate::song::Song;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// A parsed boolean predicate over a song
pub trait Matcher: Send + Sync + fmt::Debug {
    fn matches(&self, song: &dyn Song) -> bool;
}

/// Turns predicate text into a [`Matcher`], or `None` if the text is not a strict query
pub trait QueryParser: Send + Sync {
    fn parse_strict(&self, text: &str) -> Option<Arc<dyn Matcher>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Less => left < right,
            Comparison::LessEqual => left <= right,
            Comparison::Greater => left > right,
            Comparison::GreaterEqual => left >= right,
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
        }
    }
}

/// A query accepted by [`StrictQueryParser`]
#[derive(Debug, Clone)]
pub enum StrictQuery {
    Contains { tag: String, needle: String },
    Equals { tag: String, value: String },
    Matches { tag: String, regex: Regex },
    Numeric { tag: String, op: Comparison, value: f64 },
}

impl StrictQuery {
    /// Parse one strict query, `None` if the text is not one.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(inner) = text.strip_prefix("#(").and_then(|t| t.strip_suffix(')')) {
            return Self::parse_numeric(inner);
        }

        let (tag, value) = text.split_once('=')?;
        if !is_tag_name(tag) || value.is_empty() {
            return None;
        }
        let tag = tag.to_string();

        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            return Some(StrictQuery::Equals {
                tag,
                value: value[1..value.len() - 1].to_string(),
            });
        }

        if value.len() >= 2 && value.starts_with('/') && value.ends_with('/') {
            let regex = RegexBuilder::new(&value[1..value.len() - 1])
                .case_insensitive(true)
                .build()
                .ok()?;
            return Some(StrictQuery::Matches { tag, regex });
        }

        Some(StrictQuery::Contains {
            tag,
            needle: value.to_lowercase(),
        })
    }

    fn parse_numeric(inner: &str) -> Option<Self> {
        let start = inner.find(&['<', '>', '=', '!'][..])?;
        let rest = &inner[start..];
        let (op, len) = if rest.starts_with("<=") {
            (Comparison::LessEqual, 2)
        } else if rest.starts_with(">=") {
            (Comparison::GreaterEqual, 2)
        } else if rest.starts_with("!=") {
            (Comparison::NotEqual, 2)
        } else if rest.starts_with('<') {
            (Comparison::Less, 1)
        } else if rest.starts_with('>') {
            (Comparison::Greater, 1)
        } else if rest.starts_with('=') {
            (Comparison::Equal, 1)
        } else {
            return None;
        };

        let tag = inner[..start].trim();
        if !is_tag_name(tag) {
            return None;
        }
        let value = rest[len..].trim().parse().ok()?;
        Some(StrictQuery::Numeric {
            tag: tag.to_string(),
            op,
            value,
        })
    }
}

impl Matcher for StrictQuery {
    fn matches(&self, song: &dyn Song) -> bool {
        match self {
            StrictQuery::Contains { tag, needle } => {
                text_of(song, tag).to_lowercase().contains(needle.as_str())
            }
            StrictQuery::Equals { tag, value } => {
                text_of(song, tag).split('\n').any(|v| v == value)
            }
            StrictQuery::Matches { tag, regex } => regex.is_match(&text_of(song, tag)),
            StrictQuery::Numeric { tag, op, value } => song
                .get(tag)
                .and_then(|v| v.as_number())
                .is_some_and(|n| op.apply(n, *value)),
        }
    }
}

fn text_of(song: &dyn Song, tag: &str) -> String {
    song.get(tag).map(|v| v.decode()).unwrap_or_default()
}

/// Tag names may not be empty and may not contain whitespace or query syntax.
fn is_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !"=!/\"'()&|<>,".contains(c))
}

/// The built-in strict query parser
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictQueryParser;

impl QueryParser for StrictQueryParser {
    fn parse_strict(&self, text: &str) -> Option<Arc<dyn Matcher>> {
        StrictQuery::parse(text).map(|q| Arc::new(q) as Arc<dyn Matcher>)
    }
}
