//! # Public API
//!
//! One-shot entry points for callers that render a pattern once and do not
//! need a [`PatternCache`](crate::PatternCache).
//!
//! ## Functions
//!
//! - [`compile()`] - Build a plain-text formatter
//! - [`compile_with_policy()`] - Build a formatter for any policy
//! - [`render()`] - Compile and render a single song
//! - [`render_list()`] - Compile and render every value combination of a single song
//!
//! ## Typical Usage
//!
//! ```rust
//! use tagpattern::{render, TagMap};
//!
//! let song = TagMap::from_iter([("album", "Bar"), ("title", "Song")]);
//! assert_eq!(render("<album|<album> - ><title>", &song)?, "Bar - Song");
//! # Ok::<(), tagpattern::PatternError>(())
//! ```
//!
//! ## Other Policies
//!
//! ```rust
//! use tagpattern::{compile_with_policy, PolicyKind, TagMap};
//!
//! let formatter = compile_with_policy("/music/<artist>/<title>", PolicyKind::File)?;
//! let song = TagMap::from_iter([
//!     ("artist", "AC/DC"),
//!     ("title", "Thunderstruck"),
//!     ("~filename", "/in/track.flac"),
//! ]);
//! # #[cfg(unix)]
//! assert_eq!(formatter.format(&song)?, "/music/AC_DC/Thunderstruck.flac");
//! # Ok::<(), tagpattern::PatternError>(())
//! ```

use crate::config::CacheConfig;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::policy::{Platform, PolicyKind};
use crate::query::StrictQueryParser;
use crate::song::Song;
use std::collections::BTreeSet;

/// Build a plain-text formatter for `pattern`.
///
/// # Pipeline
/// 1. Tokenize the pattern with the lexer
/// 2. Parse tokens into a [`Sequence`](crate::Sequence), dropping malformed tags
/// 3. Compile the scalar and list programs
/// 4. Validate against a stand-in song
///
/// # Errors
/// Returns a `LexError` for a dangling backslash, or a `ValidationError`.
pub fn compile(pattern: &str) -> Result<Formatter> {
    compile_with_policy(pattern, PolicyKind::Plain)
}

/// Build a formatter for `pattern` rendering through the policy `kind`,
/// with default path options and the current platform.
pub fn compile_with_policy(pattern: &str, kind: PolicyKind) -> Result<Formatter> {
    let policy = kind.build(&CacheConfig::default(), &Platform::current());
    Formatter::new(pattern, policy, &StrictQueryParser)
}

/// Render `pattern` as plain text for one song.
pub fn render(pattern: &str, song: &dyn Song) -> Result<String> {
    compile(pattern)?.format(song)
}

/// Render every `(display, sort)` combination of `pattern` for one song.
pub fn render_list(pattern: &str, song: &dyn Song) -> Result<BTreeSet<(String, String)>> {
    compile(pattern)?.format_list(song)
}
