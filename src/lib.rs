pub mod api;
pub mod ast;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod policy;
pub mod query;
pub mod song;

pub use api::{compile, compile_with_policy, render, render_list};
pub use ast::*;
pub use cache::{PatternCache, SharedPatternCache};
pub use compiler::{Accessor, CompiledPattern, Fragment};
pub use config::{CacheConfig, PathOptions};
pub use error::*;
pub use formatter::Formatter;
pub use lexer::{escape, tokenize, Lexer, Token, TokenKind};
pub use parser::parse;
pub use policy::{
    FilePath, FormatPolicy, Markup, MarkupShorthand, PlainText, Platform, PlatformFamily,
    PolicyKind, UrlQuery,
};
pub use query::{Matcher, QueryParser, StrictQuery, StrictQueryParser};
pub use song::{Song, TagMap, TagValue};
