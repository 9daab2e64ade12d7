//! # Parser Module
//!
//! Recursive-descent parser turning the lexer's token stream into a
//! [`Sequence`], with one token of lookahead.
//!
//! ## Grammar
//! ```text
//! Pattern := (Text | Tag)*
//! Tag     := "<" TagBody ">"
//! TagBody := Name                               plain reference
//!          | Name "|" Pattern ["|" Pattern]     condition (if[, else])
//!          | Pattern ("||" Pattern)+            disjunction, first part opened by "<"
//! ```
//!
//! ## Recovery
//! A tag whose closing `>` is missing is dropped: the partially built node
//! is discarded and tokens are skipped up to the next `<` or the end of
//! input. A tag with no usable name (`<>`, `<|x>`) is skipped up to its `>`
//! without consuming it. A tag opened more than [`MAX_DEPTH`] levels deep is
//! skipped the same way. Malformed fragments therefore vanish from the
//! output instead of failing the whole pattern.
//!
//! ## Entry Point
//! `parse(source: &str) -> Result<Sequence>`; only lexing can fail.
//!
//! ## Example
//! ```rust
//! use tagpattern::{parse, Node};
//!
//! let root = parse("<album|<album> - ><title>").unwrap();
//! assert_eq!(root.children.len(), 2);
//! assert!(matches!(root.children[1], Node::Tag(ref name) if name == "title"));
//! ```

use crate::ast::*;
use crate::error::{PatternError, Result};
use crate::lexer::{tokenize, Token, TokenKind};
use tracing::debug;

/// Deepest tag nesting the parser accepts.
pub const MAX_DEPTH: usize = 128;

/// Parser for tag patterns
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// The token list should end with `Eof`; one is appended if it does not.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.position + t.text.len());
            tokens.push(Token::eof(end));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof, and `advance` never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Consume the lookahead if it is of the given kind.
    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            return Err(PatternError::ParseError {
                message: "The pattern ended, but more tokens were expected".to_string(),
            });
        }
        if token.kind != kind {
            return Err(PatternError::ParseError {
                message: format!(
                    "The token '{}' at offset {} is not the type expected",
                    token.text, token.position
                ),
            });
        }
        self.advance();
        Ok(())
    }

    /// Skip tokens until one of `stop` (or Eof) is the lookahead.
    fn skip_until(&mut self, stop: &[TokenKind]) {
        while self.kind() != TokenKind::Eof && !stop.contains(&self.kind()) {
            self.advance();
        }
    }

    /// Parse the whole stream. Tokens after a stray `>` or `|` at the top
    /// level are ignored.
    pub fn parse(&mut self) -> Sequence {
        self.parse_pattern()
    }

    fn parse_pattern(&mut self) -> Sequence {
        let mut children = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Text => {
                    children.push(Node::Text(self.current().text.clone()));
                    self.advance();
                }
                TokenKind::Open => {
                    let offset = self.current().position;
                    self.advance();
                    if self.depth >= MAX_DEPTH {
                        debug!(offset, "dropping tag nested too deeply");
                        self.skip_until(&[TokenKind::Close]);
                        continue;
                    }
                    self.depth += 1;
                    let node = self.parse_tag();
                    self.depth -= 1;
                    if let Some(node) = node {
                        children.push(node);
                    }
                }
                _ => break,
            }
        }
        Sequence::new(children)
    }

    /// Parse a tag body; the opening `<` has already been consumed.
    fn parse_tag(&mut self) -> Option<Node> {
        let start = self.current().position;
        let name = normalize_tag_name(&self.current().text);

        let first = match self.kind() {
            TokenKind::Open => Some(self.parse_pattern()),
            TokenKind::Text => {
                self.advance();
                None
            }
            _ => {
                debug!(offset = start, "dropping tag without a name");
                self.skip_until(&[TokenKind::Close]);
                return None;
            }
        };

        let node = match (self.kind(), first) {
            (TokenKind::Cond, _) => {
                self.advance();
                let if_branch = self.parse_pattern();
                let else_branch = if self.kind() == TokenKind::Cond {
                    self.advance();
                    Some(self.parse_pattern())
                } else {
                    None
                };
                Node::Condition {
                    predicate: name,
                    if_branch,
                    else_branch,
                }
            }
            (TokenKind::Disjunction, Some(first)) => {
                let mut alternatives = vec![first];
                while self.kind() == TokenKind::Disjunction {
                    self.advance();
                    alternatives.push(self.parse_pattern());
                }
                Node::Disjunction(alternatives)
            }
            _ => Node::Tag(name),
        };

        match self.expect(TokenKind::Close) {
            Ok(()) => Some(node),
            Err(e) => {
                debug!(offset = start, error = %e, "dropping unterminated tag");
                self.skip_until(&[TokenKind::Open]);
                None
            }
        }
    }
}

/// Parse a pattern string into its root sequence.
pub fn parse(source: &str) -> Result<Sequence> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse())
}
