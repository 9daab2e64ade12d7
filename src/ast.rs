//! # Abstract Syntax Tree (AST) Types
//!
//! ## Type Hierarchy
//! ```text
//! Sequence
//!   └── Vec<Node>
//!
//! Node (enum)
//!   ├── Text(String)               literal, escapes already resolved
//!   ├── Tag(String)                field reference, tied names normalized
//!   ├── Condition
//!   │     ├── predicate: String    strict query or field name
//!   │     ├── if_branch: Sequence
//!   │     └── else_branch: Option<Sequence>
//!   └── Disjunction(Vec<Sequence>) first non-empty alternative wins
//! ```
//!
//! `Condition` and `Disjunction` only ever come out of a properly closed
//! `< ... >` span; the parser discards anything left dangling.

/// An ordered run of nodes: the pattern root and every branch body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub children: Vec<Node>,
}

impl Sequence {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Tag(String),
    Condition {
        predicate: String,
        if_branch: Sequence,
        else_branch: Option<Sequence>,
    },
    Disjunction(Vec<Sequence>),
}

/// Normalize a tag name typed by the user.
///
/// Tied tags are conventionally written with a leading `~` (`~artist~title`);
/// a name that contains `~` but lacks the prefix gets one.
pub fn normalize_tag_name(name: &str) -> String {
    if !name.starts_with('~') && name.contains('~') {
        format!("~{}", name)
    } else {
        name.to_string()
    }
}

/// Split a (possibly tied) tag into its atomic tags.
///
/// Two consecutive `~` prefix the following part with a single `~`, so
/// `~foo~~bar` splits into `foo` and `~bar`. Numeric keys (`~#...`) keep
/// their prefix.
pub fn tag_split(tag: &str) -> Vec<String> {
    let rest = tag.char_indices().nth(1).map_or("", |(i, _)| &tag[i..]);
    if !rest.contains('~') {
        return vec![tag.to_string()];
    }

    let tag = if tag.starts_with('~') && !tag.starts_with("~#") {
        &tag[1..]
    } else {
        tag
    };

    let mut tags = Vec::new();
    let mut front = "";
    for part in tag.split('~') {
        if part.is_empty() {
            front = "~";
        } else {
            tags.push(format!("{}{}", front, part));
            front = "";
        }
    }
    tags
}
