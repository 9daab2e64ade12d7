//! # Error Types
//!
//! This module defines all error types for the tag pattern compiler.
//!
//! ## Error Types
//! - `LexError` - Characters the lexer could not consume (a dangling backslash)
//! - `ParseError` - Internal to the recovering parser, never returned by [`crate::parse`]
//! - `ValidationError` - The pattern failed its dummy-song evaluation at construction
//! - `NotRooted` - The path policy produced a relative path containing a separator
//! - `MetadataError` - A song or config document could not be deserialized
//!
//! ## Usage
//! ```rust
//! use tagpattern::{PatternCache, PatternError};
//!
//! let mut cache = PatternCache::default();
//! match cache.file_from_pattern("a/<title>") {
//!     Ok(_) => println!("usable"),
//!     Err(PatternError::ValidationError { pattern, source }) => {
//!         eprintln!("'{}' is unusable: {}", pattern, source);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatternError>;

#[derive(Error, Debug)]
pub enum PatternError {
    /// Lexer error with the byte offset of the first unconsumed character.
    ///
    /// # Example
    /// ```
    /// # use tagpattern::PatternError;
    /// let err = PatternError::LexError {
    ///     position: 3,
    ///     message: "characters left over in string".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Lex error at offset 3: characters left over in string");
    /// ```
    #[error("Lex error at offset {position}: {message}")]
    LexError { position: usize, message: String },

    /// A token was required but the stream could not supply it.
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Evaluating the pattern against the dummy song failed.
    #[error("Pattern '{pattern}' failed validation: {source}")]
    ValidationError {
        pattern: String,
        #[source]
        source: Box<PatternError>,
    },

    /// The rendered path contains a separator but is not absolute.
    ///
    /// # Example
    /// ```
    /// # use tagpattern::PatternError;
    /// let err = PatternError::NotRooted { path: "a/b".to_string() };
    /// assert_eq!(err.to_string(), "Pattern is not rooted: a/b");
    /// ```
    #[error("Pattern is not rooted: {path}")]
    NotRooted { path: String },

    #[error("Invalid metadata: {0}")]
    MetadataError(String),
}
