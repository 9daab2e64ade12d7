//! # Lexer Module
//!
//! Splits a tag pattern into a flat token stream.
//!
//! ## Token Rules (in priority order)
//! 1. A run of characters other than `<`, `>`, `|` and `\`, where a backslash
//!    may escape any following character, becomes `Text`. The escapes `\\`,
//!    `\<`, `\>` and `\|` are resolved to their second character; any other
//!    escape (e.g. `\[`) is kept verbatim so later stages can interpret it.
//! 2. `||` becomes `Disjunction`.
//! 3. `<`, `>` and `|` become `Open`, `Close` and `Cond`.
//!
//! Every stream ends with an `Eof` token. A backslash with nothing after it,
//! or followed by a newline, cannot be consumed by any rule and is reported
//! as a [`PatternError::LexError`].

use crate::error::{PatternError, Result};

/// Token types for the tag pattern language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Open,        // <
    Close,       // >
    Cond,        // |
    Disjunction, // ||
    Eof,
}

/// A token with its text and byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Unescaped text for `Text`, the raw operator for everything else.
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }
}

/// Lexer for tokenizing tag patterns
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.len)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let position = self.position();

            let token = match c {
                '<' => {
                    self.advance();
                    Token::new(TokenKind::Open, "<", position)
                }
                '>' => {
                    self.advance();
                    Token::new(TokenKind::Close, ">", position)
                }
                '|' => {
                    self.advance();
                    if let Some('|') = self.peek() {
                        self.advance();
                        Token::new(TokenKind::Disjunction, "||", position)
                    } else {
                        Token::new(TokenKind::Cond, "|", position)
                    }
                }
                _ => match self.text_run() {
                    Some(text) => Token::new(TokenKind::Text, text, position),
                    None => {
                        return Err(PatternError::LexError {
                            position,
                            message: "characters left over in string".to_string(),
                        })
                    }
                },
            };

            tokens.push(token);
        }

        tokens.push(Token::eof(self.len));
        Ok(tokens)
    }

    /// Consume a maximal text run. Returns `None` when not even one
    /// character could be consumed (a backslash at the very end).
    fn text_run(&mut self) -> Option<String> {
        let mut text = String::new();
        let mut consumed = false;

        while let Some(c) = self.peek() {
            match c {
                '<' | '>' | '|' => break,
                '\\' => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    let escaped = match lookahead.peek() {
                        Some(&(_, escaped)) if escaped != '\n' => escaped,
                        // a trailing backslash, or one before a newline, ends the run unconsumed
                        _ => break,
                    };
                    self.advance();
                    self.advance();
                    if !matches!(escaped, '\\' | '<' | '>' | '|') {
                        text.push('\\');
                    }
                    text.push(escaped);
                }
                _ => {
                    self.advance();
                    text.push(c);
                }
            }
            consumed = true;
        }

        consumed.then_some(text)
    }
}

/// Tokenize a pattern string, including the trailing `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Escape text so that it lexes back to a single `Text` token with the same content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '<' | '>' | '|') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
