//! Splitting selectors and style blocks into tokens.
//!
//! Tokenization is lossless: concatenating the values of the produced
//! tokens always yields the input back. Escapes are not interpreted here;
//! a backslash is just another mark and the parser decides what it means.

mod token;

pub use token::{Token, TokenKind};

/// U+0020 SPACE, which doubles as the descendant combinator.
pub const SPACE: char = ' ';
/// U+0009 CHARACTER TABULATION.
pub const TAB: char = '\t';
/// U+000A LINE FEED.
pub const LINE_FEED: char = '\n';
/// U+000D CARRIAGE RETURN.
pub const CARRIAGE_RETURN: char = '\r';
/// U+000C FORM FEED.
pub const FORM_FEED: char = '\u{c}';

/// Whitespace characters recognised as marks.
pub const WHITE_SPACE: [char; 5] = [SPACE, TAB, LINE_FEED, CARRIAGE_RETURN, FORM_FEED];

/// The four combinators: descendant, child, next-sibling and
/// subsequent-sibling.
pub const COMBINATORS: [char; 4] = [SPACE, '>', '+', '~'];

/// Mark alphabet for selectors.
pub const SELECTOR_MARKS: &[char] = &[
    '[', ']', '(', ')', '{', '}', ',', SPACE, TAB, LINE_FEED, CARRIAGE_RETURN, FORM_FEED, '>',
    '+', '~', ':', ';', '/', '\\', '\'', '"', '^', '$', '*', '#', '.', '=',
];

/// Mark alphabet for attribute contents, used when validating that an
/// attribute selector is closed.
pub const ATTRIBUTE_MARKS: &[char] = SELECTOR_MARKS;

/// Mark alphabet for style declaration blocks.
pub const STYLE_MARKS: &[char] = &[
    ':', ';', '\'', '"', '\\', SPACE, TAB, LINE_FEED, CARRIAGE_RETURN, FORM_FEED,
];

/// Whether `c` is a combinator character.
#[must_use]
pub fn is_combinator(c: char) -> bool {
    COMBINATORS.contains(&c)
}

/// Whether `c` is one of the recognised whitespace characters.
#[must_use]
pub fn is_white_space(c: char) -> bool {
    WHITE_SPACE.contains(&c)
}

/// Split `input` into words and marks over the given alphabet.
#[must_use]
pub fn tokenize(input: &str, marks: &[char]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in input.chars() {
        if marks.contains(&c) {
            if !word.is_empty() {
                tokens.push(Token::word(core::mem::take(&mut word)));
            }
            tokens.push(Token::mark(c));
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(Token::word(word));
    }
    tokens
}

/// Tokenize a selector.
#[must_use]
pub fn tokenize_selector(selector: &str) -> Vec<Token> {
    tokenize(selector, SELECTOR_MARKS)
}

/// Tokenize the inside of an attribute selector.
#[must_use]
pub fn tokenize_attribute(attribute: &str) -> Vec<Token> {
    tokenize(attribute, ATTRIBUTE_MARKS)
}

/// Tokenize a style declaration block.
#[must_use]
pub fn tokenize_style_block(style: &str) -> Vec<Token> {
    tokenize(style, STYLE_MARKS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_and_marks() {
        let tokens = tokenize_selector("div.banner > a");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["div", ".", "banner", " ", ">", " ", "a"]);
        assert!(tokens[0].is_word());
        assert!(tokens[1].is_mark('.'));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize_selector("").is_empty());
    }

    #[test]
    fn test_multibyte_word() {
        let tokens = tokenize_selector(":contains(реклама)");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3], Token::word("реклама"));
    }

    #[test]
    fn test_style_alphabet_keeps_dots_in_words() {
        let tokens = tokenize_style_block("opacity: 0.5");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["opacity", ":", " ", "0.5"]);
    }
}
