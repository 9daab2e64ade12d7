//! Markup policies: escape tag values for rich-text display, optionally
//! expanding `[b]`-style shorthands in the pattern's literal text.

use super::{FormatPolicy, PolicyKind};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Escape `&`, `<` and `>`.
pub fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes tag values; literal text is left as written
#[derive(Debug, Clone, Copy, Default)]
pub struct Markup;

impl FormatPolicy for Markup {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Markup
    }

    fn format_value(&self, _key: &str, value: String) -> String {
        escape_markup(&value)
    }
}

/// Like [`Markup`], but `[b]`, `[/b]`, `[span ...]` and friends in literal
/// text become real markup tags. An odd number of backslashes in front of
/// the `[` escapes the shorthand; one backslash is consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupShorthand;

fn simple_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\\*)\[(/?(?:b|big|i|s|sub|sup|small|tt|u|span|a)\s*)\]")
            .expect("shorthand tag regex is valid")
    })
}

fn attribute_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\\*)\[((?:a|span)\s+.*?)\]").expect("shorthand attribute regex is valid")
    })
}

fn expand(caps: &Captures<'_>) -> String {
    let prefix = &caps[1];
    if prefix.len() % 2 == 1 {
        caps[0][1..].to_string()
    } else {
        format!("{}<{}>", prefix, &caps[2])
    }
}

impl FormatPolicy for MarkupShorthand {
    fn kind(&self) -> PolicyKind {
        PolicyKind::MarkupShorthand
    }

    fn text(&self, literal: &str) -> String {
        let expanded = simple_tags().replace_all(literal, expand);
        attribute_tags().replace_all(&expanded, expand).into_owned()
    }

    fn format_value(&self, _key: &str, value: String) -> String {
        escape_markup(&value)
    }
}
