//! `:contains()`, `:has-text()` and `:-abp-contains()`.

use regex::Regex;

use super::pattern::{build_regex, split_regexp_literal};
use crate::error::{ExtCssError, Result};

/// Matches the text content of an element against a substring or a regexp.
#[derive(Debug, Clone)]
pub(crate) enum TextMatcher {
    Substring(String),
    Pattern(Regex),
}

impl TextMatcher {
    pub(crate) fn new(pseudo_class: &str, arg: &str) -> Result<Self> {
        if let Some((body, flags)) = split_regexp_literal(arg).filter(|_| arg.starts_with('/')) {
            let body = unescape(body, &['\\', '"']);
            return build_regex(&body, flags).map(Self::Pattern).map_err(|e| {
                ExtCssError::matcher_argument(pseudo_class, format!("'{arg}': {e}"))
            });
        }
        Ok(Self::Substring(unescape(arg, &['\\', '(', ')', '[', ']', '"'])))
    }

    pub(crate) fn matches(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// Drop the backslash in front of any of `escapable`.
fn unescape(raw: &str, escapable: &[char]) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if escapable.contains(&next) {
                    output.push(next);
                    let _ = chars.next();
                    continue;
                }
            }
        }
        output.push(c);
    }
    output
}
