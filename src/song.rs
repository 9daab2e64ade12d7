//! # Song Accessors
//!
//! The compiled patterns never look inside a song directly; they go through
//! the [`Song`] trait, which mirrors the three lookups a rendering needs:
//!
//! - `get(key)` - a single (possibly synthesized) value, `None` when absent
//! - `comma(key)` - one display value, multiple values joined with `", "`
//! - `list_separate(key)` - every value as a `(display, sort)` pair
//!
//! [`TagMap`] is an in-memory implementation: multi-valued tags are stored
//! newline-separated, keys starting with `~#` hold numbers, and a handful of
//! `~` keys are synthesized from other tags.
//!
//! ## Example
//! ```rust
//! use tagpattern::{Song, TagMap, TagValue};
//!
//! let song = TagMap::from_iter([("artist", "A\nB"), ("tracknumber", "3/12")]);
//! assert_eq!(song.comma("artist"), TagValue::from("A, B"));
//! assert_eq!(song.get("~#track"), Some(TagValue::Int(3)));
//! ```

use crate::ast::tag_split;
use crate::error::{PatternError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Tags that have a `<tag>sort` companion used for sorting.
const SORTABLE_TAGS: [&str; 6] = [
    "album",
    "albumartist",
    "artist",
    "composer",
    "performer",
    "title",
];

/// A single tag value
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl TagValue {
    /// Render the value as display text. Floats use two decimals.
    pub fn decode(&self) -> String {
        match self {
            TagValue::Text(s) => s.clone(),
            TagValue::Int(n) => n.to_string(),
            TagValue::Float(f) => format!("{:.2}", f),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TagValue::Int(n) => Some(*n as f64),
            TagValue::Float(f) => Some(*f),
            TagValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        TagValue::Int(n)
    }
}

impl From<f64> for TagValue {
    fn from(f: f64) -> Self {
        TagValue::Float(f)
    }
}

/// Read access to a song's metadata
pub trait Song {
    /// Look up a value, synthesizing `~` keys where supported.
    fn get(&self, key: &str) -> Option<TagValue>;

    /// A single display value. Numeric values are returned as numbers,
    /// everything else as text with multiple values joined by `", "`.
    fn comma(&self, key: &str) -> TagValue;

    /// All values of a key as `(display, sort)` pairs.
    fn list_separate(&self, key: &str) -> Vec<(String, String)>;
}

/// Raw YAML value before it is normalized into a [`TagValue`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

/// In-memory song: a map from tag names to values
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, RawValue>")]
pub struct TagMap {
    tags: BTreeMap<String, TagValue>,
}

impl From<BTreeMap<String, RawValue>> for TagMap {
    fn from(raw: BTreeMap<String, RawValue>) -> Self {
        let tags = raw
            .into_iter()
            .map(|(key, value)| {
                let numeric = key.starts_with("~#");
                let value = match value {
                    RawValue::Int(n) if numeric => TagValue::Int(n),
                    RawValue::Float(f) if numeric => TagValue::Float(f),
                    RawValue::Int(n) => TagValue::Text(n.to_string()),
                    RawValue::Float(f) => TagValue::Text(f.to_string()),
                    RawValue::Text(s) => TagValue::Text(s),
                    RawValue::List(values) => TagValue::Text(values.join("\n")),
                };
                (key, value)
            })
            .collect();
        Self { tags }
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tags: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a song from a YAML mapping of tag names to values.
    /// Lists become multi-valued tags.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| PatternError::MetadataError(e.to_string()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.tags.remove(key)
    }

    /// The stored value, without synthesizing anything.
    pub fn raw(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }

    fn raw_text(&self, key: &str) -> Option<String> {
        self.tags.get(key).map(TagValue::decode)
    }

    /// All values of a tag as display strings, empty values dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        let value = if key.contains('~') || key == "title" {
            self.get(key)
        } else {
            self.tags.get(key).cloned()
        };
        match value {
            None => Vec::new(),
            Some(TagValue::Text(s)) => s
                .split('\n')
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
            Some(number) => vec![number.decode()],
        }
    }

    /// Display values paired with their sort values.
    ///
    /// Display and sort values are matched up by position; an empty display
    /// value drops the pair, a missing sort value falls back to the display.
    pub fn list_sort(&self, key: &str) -> Vec<(String, String)> {
        let display = self.get(key).map(|v| v.decode()).unwrap_or_default();
        let display: Vec<&str> = if display.is_empty() {
            Vec::new()
        } else {
            display.split('\n').collect()
        };

        let sort = if SORTABLE_TAGS.contains(&key) {
            self.get(&format!("{}sort", key))
                .map(|v| v.decode())
                .unwrap_or_default()
        } else {
            String::new()
        };
        let sort: Vec<&str> = if sort.is_empty() {
            Vec::new()
        } else {
            sort.split('\n').collect()
        };

        display
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_empty())
            .map(|(i, d)| {
                let s = sort.get(i).copied().filter(|s| !s.is_empty()).unwrap_or(d);
                (d.to_string(), s.to_string())
            })
            .collect()
    }

    fn tied(&self, key: &str) -> Option<TagValue> {
        let parts = tag_split(key);
        let joiner = if parts.len() > 1 { ", " } else { "\n" };
        let values: Vec<String> = parts
            .iter()
            .map(|part| self.list(part).join(joiner))
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(TagValue::Text(values.join(" - ")))
        }
    }

    fn number_part(&self, key: &str, index: usize) -> Option<TagValue> {
        let value = self.raw_text(key)?;
        let part = value.split('/').nth(index)?;
        part.trim().parse::<i64>().ok().map(TagValue::Int)
    }

    fn year(&self) -> Option<String> {
        let date = self.raw_text("date")?;
        let year: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
        if year.is_empty() {
            None
        } else {
            Some(year)
        }
    }
}

impl Song for TagMap {
    fn get(&self, key: &str) -> Option<TagValue> {
        let Some(inner) = key.strip_prefix('~') else {
            return self.tags.get(key).cloned();
        };

        if inner.contains('~') {
            return self.tied(key);
        }

        match inner {
            "#track" => self.number_part("tracknumber", 0),
            "#tracks" => self.number_part("tracknumber", 1),
            "#disc" => self.number_part("discnumber", 0),
            "#discs" => self.number_part("discnumber", 1),
            "year" => self.year().map(TagValue::Text),
            "#year" => self.year()?.parse::<i64>().ok().map(TagValue::Int),
            "basename" | "dirname" => {
                let filename = self.raw_text("~filename")?;
                let path = Path::new(&filename);
                let part = if inner == "basename" {
                    path.file_name().map(|p| p.to_string_lossy().into_owned())
                } else {
                    path.parent().map(|p| p.to_string_lossy().into_owned())
                };
                Some(TagValue::Text(part.filter(|p| !p.is_empty()).unwrap_or(filename)))
            }
            _ => self.tags.get(key).cloned(),
        }
    }

    fn comma(&self, key: &str) -> TagValue {
        let value = if key.contains('~') || key == "title" {
            self.get(key)
        } else {
            self.tags.get(key).cloned()
        };

        match value {
            Some(TagValue::Text(s)) => TagValue::Text(collapse_newlines(s.trim())),
            Some(number) => number,
            None => TagValue::Text(String::new()),
        }
    }

    fn list_separate(&self, key: &str) -> Vec<(String, String)> {
        let tied = key
            .strip_prefix('~')
            .is_some_and(|rest| rest.contains('~'));
        if tied {
            tag_split(key)
                .iter()
                .flat_map(|part| self.list_sort(part))
                .collect()
        } else {
            self.list_sort(key)
        }
    }
}

/// Replace every run of newlines with `", "`.
fn collapse_newlines(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.chars() {
        if c == '\n' {
            if !in_run {
                out.push_str(", ");
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
