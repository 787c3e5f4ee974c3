//! Token types produced by the extended CSS tokenizer.
//!
//! Unlike a CSS Syntax tokenizer, this one is deliberately shallow: it only
//! knows two kinds of token. A mark is a single character from the current
//! alphabet, and a word is a maximal run of anything else.

use core::fmt;

/// The two token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A maximal run of characters outside the mark alphabet.
    Word,
    /// A single character from the mark alphabet.
    Mark,
}

/// One token with the exact source text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Word or mark.
    pub kind: TokenKind,
    /// Source text. Always exactly one character for marks.
    pub value: String,
}

impl Token {
    /// A word token.
    pub fn word(value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Word,
            value: value.into(),
        }
    }

    /// A mark token.
    #[must_use]
    pub fn mark(value: char) -> Self {
        Self {
            kind: TokenKind::Mark,
            value: value.to_string(),
        }
    }

    /// Whether this is a word token.
    #[must_use]
    pub const fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word)
    }

    /// Whether this is the mark `c`.
    #[must_use]
    pub fn is_mark(&self, c: char) -> bool {
        self.kind == TokenKind::Mark
            && self.value.len() == c.len_utf8()
            && self.value.starts_with(c)
    }

    /// The mark character, if this is a mark.
    #[must_use]
    pub fn mark_char(&self) -> Option<char> {
        match self.kind {
            TokenKind::Mark => self.value.chars().next(),
            TokenKind::Word => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
