//! `property: value; ...` declaration blocks.
//!
//! Quotes only matter inside values: a quoted value may contain `;` and
//! `:`, and a backslash keeps the next character literal. Quotes and
//! escapes are preserved in the returned value.

use serde::Serialize;

use crate::error::{ExtCssError, Result};
use crate::pseudo::REMOVE;
use crate::tokenizer::{TokenKind, tokenize_style_block};

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleDeclaration {
    /// Property name, trimmed.
    pub property: String,
    /// Value, trimmed, with quotes kept.
    pub value: String,
}

#[derive(Default)]
struct BlockState {
    property: String,
    value: String,
    in_value: bool,
    quote: Option<char>,
    escaped: bool,
}

impl BlockState {
    fn push(&mut self, text: &str) {
        if self.in_value {
            self.value.push_str(text);
        } else {
            self.property.push_str(text);
        }
    }

    /// Close the current declaration. Empty declarations (`a: b;;`) are
    /// skipped.
    fn finish(&mut self, raw: &str, declarations: &mut Vec<StyleDeclaration>) -> Result<()> {
        let property = self.property.trim().to_string();
        let value = self.value.trim().to_string();
        let in_value = self.in_value;
        *self = Self::default();

        if !in_value {
            if property.is_empty() {
                return Ok(());
            }
            return Err(ExtCssError::syntax(
                raw,
                format!("Invalid style declaration '{property}' in '{raw}': missing ':'"),
            ));
        }
        if property.is_empty() {
            return Err(ExtCssError::syntax(
                raw,
                format!("Missing property name before ':' in style block '{raw}'"),
            ));
        }
        if value.is_empty() {
            return Err(ExtCssError::syntax(
                raw,
                format!("Missing value for property '{property}' in style block '{raw}'"),
            ));
        }
        if property == REMOVE && value != "true" {
            return Err(ExtCssError::syntax(
                raw,
                format!("Invalid '{REMOVE}' property value '{value}', should be 'true'"),
            ));
        }
        declarations.push(StyleDeclaration { property, value });
        Ok(())
    }
}

/// Parse a declaration block, with or without its surrounding braces.
///
/// # Errors
/// Fails on a declaration without `:`, an empty property or value, an
/// unclosed quote, and a block without any declaration.
pub fn parse_style_block(raw: &str) -> Result<Vec<StyleDeclaration>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut declarations = Vec::new();
    let mut state = BlockState::default();

    for token in tokenize_style_block(body) {
        if token.kind == TokenKind::Word {
            state.escaped = false;
            state.push(&token.value);
            continue;
        }
        let Some(mark) = token.mark_char() else {
            continue;
        };
        if state.escaped {
            state.escaped = false;
            state.push(&token.value);
            continue;
        }
        match mark {
            '\\' => {
                state.escaped = true;
                state.push(&token.value);
            }
            '\'' | '"' if state.in_value => {
                match state.quote {
                    None => state.quote = Some(mark),
                    Some(open) if open == mark => state.quote = None,
                    Some(_) => {}
                }
                state.push(&token.value);
            }
            ':' if !state.in_value => state.in_value = true,
            ';' if state.quote.is_none() => state.finish(raw, &mut declarations)?,
            _ => state.push(&token.value),
        }
    }

    if state.quote.is_some() {
        return Err(ExtCssError::syntax(
            raw,
            format!("Unbalanced quotes in style block '{raw}'"),
        ));
    }
    state.finish(raw, &mut declarations)?;

    if declarations.is_empty() {
        return Err(ExtCssError::syntax(
            raw,
            format!("No style declarations found in '{raw}'"),
        ));
    }
    Ok(declarations)
}
