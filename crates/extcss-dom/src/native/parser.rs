//! [§ 18 Grammar](https://www.w3.org/TR/selectors-4/#grammar) for the native engine.

use super::{
    AttributeOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    NthExpr, PseudoClass, SelectorList, SimpleSelector,
};
use crate::error::NativeSelectorError;

/// Pseudo-classes that describe interactive or UA state a static document
/// never has.
const STATE_PSEUDO_CLASSES: &[&str] = &[
    "active",
    "autofill",
    "default",
    "focus",
    "focus-visible",
    "focus-within",
    "fullscreen",
    "hover",
    "in-range",
    "indeterminate",
    "invalid",
    "optional",
    "out-of-range",
    "paused",
    "placeholder-shown",
    "playing",
    "read-only",
    "read-write",
    "required",
    "target",
    "target-within",
    "user-invalid",
    "valid",
    "visited",
];

/// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
/// known to the engine.
const PSEUDO_ELEMENTS: &[&str] = &[
    "after",
    "backdrop",
    "before",
    "cue",
    "file-selector-button",
    "first-letter",
    "first-line",
    "grammar-error",
    "highlight",
    "marker",
    "part",
    "placeholder",
    "selection",
    "slotted",
    "spelling-error",
    "target-text",
];

/// CSS2 pseudo-elements still accepted with a single colon.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["after", "before", "first-letter", "first-line"];

/// Parse a raw selector list.
///
/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
/// "If just one of these selectors were invalid, the entire selector list
/// would be invalid."
///
/// # Errors
/// Returns an error naming `raw` for any syntax the engine does not accept.
pub fn parse_selector_list(raw: &str) -> Result<SelectorList, NativeSelectorError> {
    let selectors = split_selector_groups(raw)
        .ok_or_else(|| NativeSelectorError::new(raw, "unbalanced brackets or quotes"))?
        .iter()
        .map(|group| parse_complex(raw, group))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SelectorList { selectors })
}

/// [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches)
///
/// "Unlike non-forgiving selector lists, invalid selectors in a forgiving
/// selector list are simply ignored."
fn parse_forgiving_selector_list(raw: &str) -> Result<SelectorList, NativeSelectorError> {
    let groups = split_selector_groups(raw)
        .ok_or_else(|| NativeSelectorError::new(raw, "unbalanced brackets or quotes"))?;
    let selectors = groups
        .iter()
        .filter_map(|group| parse_complex(raw, group).ok())
        .collect();
    Ok(SelectorList { selectors })
}

/// Split a selector list at its top-level commas, trimming each group.
/// Commas inside brackets, parentheses, quotes or escapes do not split.
/// Returns `None` for unbalanced input.
#[must_use]
pub fn split_selector_groups(raw: &str) -> Option<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in raw.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        if c == '\\' {
            escaped = true;
            current.push(c);
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.checked_sub(1)?,
            '(' if bracket_depth == 0 => paren_depth += 1,
            ')' if bracket_depth == 0 => paren_depth = paren_depth.checked_sub(1)?,
            ',' if paren_depth == 0 && bracket_depth == 0 => {
                groups.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if quote.is_some() || paren_depth != 0 || bracket_depth != 0 {
        return None;
    }
    groups.push(current.trim().to_string());
    Some(groups)
}

/// Check if a character can start an identifier.
/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Check if a character can continue an identifier.
/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

/// Cursor over one complex selector.
struct SelectorParser<'a> {
    /// The whole selector list, for error messages.
    source: &'a str,
    input: Vec<char>,
    position: usize,
}

fn parse_complex(source: &str, group: &str) -> Result<ComplexSelector, NativeSelectorError> {
    if group.is_empty() {
        return Err(NativeSelectorError::new(source, "empty selector in list"));
    }
    let mut parser = SelectorParser {
        source,
        input: group.chars().collect(),
        position: 0,
    };
    parser.parse_complex()
}

impl SelectorParser<'_> {
    fn error(&self, reason: impl Into<String>) -> NativeSelectorError {
        NativeSelectorError::new(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.position += 1;
        }
        self.position > start
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    ///
    /// Parse left-to-right collecting compounds and the combinators between
    /// them, then reverse so the subject comes first.
    fn parse_complex(&mut self) -> Result<ComplexSelector, NativeSelectorError> {
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut combinators_between: Vec<Combinator> = Vec::new();
        let mut current: Vec<SimpleSelector> = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };

            let combinator = match c {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::NextSibling),
                '~' => Some(Combinator::SubsequentSibling),
                _ => None,
            };
            if let Some(combinator) = combinator {
                let _ = self.consume();
                if current.is_empty() {
                    return Err(
                        self.error(format!("combinator '{c}' without a left-hand compound"))
                    );
                }
                compounds.push(CompoundSelector {
                    simple_selectors: std::mem::take(&mut current),
                });
                combinators_between.push(combinator);
                continue;
            }

            // [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
            if had_whitespace && !current.is_empty() {
                compounds.push(CompoundSelector {
                    simple_selectors: std::mem::take(&mut current),
                });
                combinators_between.push(Combinator::Descendant);
            }

            self.parse_simple(&mut current)?;
        }

        if current.is_empty() {
            return Err(self.error("selector ends with a combinator"));
        }

        // Build the chain in right-to-left order for matching.
        // For "A > B C" we have compounds [A, B] plus subject C and
        // combinators [Child, Descendant]; we want [(Descendant, B), (Child, A)].
        let subject = CompoundSelector {
            simple_selectors: current,
        };
        let combinators = compounds
            .into_iter()
            .zip(combinators_between)
            .rev()
            .map(|(compound, combinator)| (combinator, compound))
            .collect();
        Ok(ComplexSelector {
            subject,
            combinators,
        })
    }

    fn parse_simple(
        &mut self,
        current: &mut Vec<SimpleSelector>,
    ) -> Result<(), NativeSelectorError> {
        let Some(c) = self.peek() else {
            return Ok(());
        };
        match c {
            // [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
            '*' => {
                let _ = self.consume();
                if !current.is_empty() {
                    return Err(self.error("'*' must start a compound selector"));
                }
                current.push(SimpleSelector::Universal);
            }
            '.' => {
                let _ = self.consume();
                let name = self
                    .consume_ident()
                    .ok_or_else(|| self.error("expected a class name after '.'"))?;
                current.push(SimpleSelector::Class(name));
            }
            '#' => {
                let _ = self.consume();
                let name = self
                    .consume_name()
                    .ok_or_else(|| self.error("expected an id after '#'"))?;
                current.push(SimpleSelector::Id(name));
            }
            '[' => {
                let attribute = self.parse_attribute()?;
                current.push(SimpleSelector::Attribute(attribute));
            }
            ':' => {
                let simple = self.parse_pseudo()?;
                current.push(simple);
            }
            // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
            _ if is_ident_start_char(c) || c == '-' || c == '\\' => {
                if !current.is_empty() {
                    return Err(self.error("type selector must start a compound selector"));
                }
                let name = self
                    .consume_ident()
                    .ok_or_else(|| self.error("invalid type selector"))?;
                current.push(SimpleSelector::Type(name.to_ascii_lowercase()));
            }
            _ => return Err(self.error(format!("unexpected character '{c}'"))),
        }
        Ok(())
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident(&mut self) -> Option<String> {
        let starts_ident = match self.peek()? {
            '-' => self
                .peek_at(1)
                .is_some_and(|c| is_ident_start_char(c) || c == '-' || c == '\\'),
            '\\' => true,
            c => is_ident_start_char(c),
        };
        if !starts_ident {
            return None;
        }
        self.consume_name()
    }

    /// Name code points and escapes, without the ident-start restriction.
    fn consume_name(&mut self) -> Option<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                let _ = self.consume();
                name.push(self.consume_escape()?);
            } else if is_ident_char(c) {
                name.push(c);
                let _ = self.consume();
            } else {
                break;
            }
        }
        (!name.is_empty()).then_some(name)
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Called after the backslash.
    fn consume_escape(&mut self) -> Option<char> {
        let first = self.consume()?;
        if !first.is_ascii_hexdigit() {
            return Some(first);
        }
        let mut hex = String::from(first);
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.consume());
        }
        // "If the next input code point is whitespace, consume it as well."
        if self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            let _ = self.consume();
        }
        let code = u32::from_str_radix(&hex, 16).ok()?;
        Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'))
    }

    /// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    fn parse_attribute(&mut self) -> Result<AttributeSelector, NativeSelectorError> {
        let _ = self.consume(); // '['
        let _ = self.skip_whitespace();
        let name = self
            .consume_ident()
            .ok_or_else(|| self.error("expected an attribute name"))?;
        let _ = self.skip_whitespace();

        let operator = match self.consume() {
            Some(']') => {
                return Ok(AttributeSelector {
                    name,
                    operator: AttributeOperator::Exists,
                    value: String::new(),
                    case_insensitive: false,
                });
            }
            Some('=') => AttributeOperator::Equals,
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.consume() != Some('=') {
                    return Err(self.error(format!("expected '=' after '{op}'")));
                }
                match op {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::PrefixMatch,
                    '$' => AttributeOperator::SuffixMatch,
                    _ => AttributeOperator::SubstringMatch,
                }
            }
            _ => return Err(self.error(format!("invalid attribute selector for '{name}'"))),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                let _ = self.consume();
                self.consume_string(q)
                    .ok_or_else(|| self.error("unterminated attribute value"))?
            }
            _ => self
                .consume_ident()
                .ok_or_else(|| self.error(format!("invalid value for attribute '{name}'")))?,
        };

        let _ = self.skip_whitespace();
        // [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
        let mut case_insensitive = false;
        if let Some(flag @ ('i' | 'I' | 's' | 'S')) = self.peek() {
            let _ = self.consume();
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            let _ = self.skip_whitespace();
        }
        if self.consume() != Some(']') {
            return Err(self.error(format!("expected ']' to close attribute '{name}'")));
        }
        Ok(AttributeSelector {
            name,
            operator,
            value,
            case_insensitive,
        })
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    ///
    /// Called after the opening quote.
    fn consume_string(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.consume()? {
                c if c == quote => return Some(value),
                '\\' => match self.peek()? {
                    // "If the next input code point is a newline, consume it."
                    '\n' => {
                        let _ = self.consume();
                    }
                    _ => value.push(self.consume_escape()?),
                },
                c => value.push(c),
            }
        }
    }

    /// Body of a functional pseudo-class, from the opening parenthesis to its
    /// matching closing one (exclusive).
    fn consume_arguments(&mut self) -> Result<String, NativeSelectorError> {
        let _ = self.consume(); // '('
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        let mut body = String::new();
        while let Some(c) = self.consume() {
            if c == '\\' {
                body.push(c);
                body.extend(self.consume());
                continue;
            }
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                body.push(c);
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(body);
                    }
                }
                _ => {}
            }
            body.push(c);
        }
        Err(self.error("unbalanced parentheses"))
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    fn parse_pseudo(&mut self) -> Result<SimpleSelector, NativeSelectorError> {
        let _ = self.consume(); // ':'
        let is_pseudo_element = self.peek() == Some(':');
        if is_pseudo_element {
            let _ = self.consume();
        }
        let name = self
            .consume_ident()
            .ok_or_else(|| self.error("expected a pseudo-class name after ':'"))?
            .to_ascii_lowercase();
        let argument = if self.peek() == Some('(') {
            Some(self.consume_arguments()?)
        } else {
            None
        };

        if is_pseudo_element {
            let vendor = name.starts_with("-webkit-") || name.starts_with("-moz-");
            if vendor || PSEUDO_ELEMENTS.contains(&name.as_str()) {
                return Ok(SimpleSelector::NeverMatch);
            }
            return Err(self.error(format!("unknown pseudo-element '::{name}'")));
        }

        let Some(argument) = argument else {
            let pseudo_class = match name.as_str() {
                "root" => PseudoClass::Root,
                "scope" => PseudoClass::Scope,
                "first-child" => PseudoClass::FirstChild,
                "last-child" => PseudoClass::LastChild,
                "only-child" => PseudoClass::OnlyChild,
                "first-of-type" => PseudoClass::FirstOfType,
                "last-of-type" => PseudoClass::LastOfType,
                "only-of-type" => PseudoClass::OnlyOfType,
                "empty" => PseudoClass::Empty,
                "link" | "any-link" => PseudoClass::Link,
                "disabled" => PseudoClass::Disabled,
                "enabled" => PseudoClass::Enabled,
                "checked" => PseudoClass::Checked,
                other
                    if STATE_PSEUDO_CLASSES.contains(&other)
                        || LEGACY_PSEUDO_ELEMENTS.contains(&other) =>
                {
                    return Ok(SimpleSelector::NeverMatch);
                }
                other => return Err(self.error(format!("unknown pseudo-class ':{other}'"))),
            };
            return Ok(SimpleSelector::PseudoClass(pseudo_class));
        };

        let nth = |parser: &Self| {
            parse_nth(&argument).ok_or_else(|| {
                parser.error(format!("invalid argument for ':{name}()': '{argument}'"))
            })
        };
        let pseudo_class = match name.as_str() {
            "nth-child" => PseudoClass::NthChild(nth(self)?),
            "nth-last-child" => PseudoClass::NthLastChild(nth(self)?),
            "nth-of-type" => PseudoClass::NthOfType(nth(self)?),
            "nth-last-of-type" => PseudoClass::NthLastOfType(nth(self)?),
            "not" => {
                let list = parse_selector_list(&argument).map_err(|e| self.error(e.reason))?;
                PseudoClass::Not(list)
            }
            "is" | "where" => {
                let list =
                    parse_forgiving_selector_list(&argument).map_err(|e| self.error(e.reason))?;
                PseudoClass::Is(list)
            }
            other => {
                return Err(self.error(format!("unsupported functional pseudo-class ':{other}()'")));
            }
        };
        Ok(SimpleSelector::PseudoClass(pseudo_class))
    }
}

/// [§ 6.6.1 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
fn parse_nth(raw: &str) -> Option<NthExpr> {
    let compact = raw
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "" => None,
        "odd" => Some(NthExpr { a: 2, b: 1 }),
        "even" => Some(NthExpr { a: 2, b: 0 }),
        expr => {
            let Some(n_pos) = expr.find('n') else {
                return expr.parse::<i64>().ok().map(|b| NthExpr { a: 0, b });
            };
            let (a_part, rest) = expr.split_at(n_pos);
            let b_part = &rest[1..];
            let a = match a_part {
                "" | "+" => 1,
                "-" => -1,
                _ => a_part.parse::<i64>().ok()?,
            };
            if b_part.is_empty() {
                return Some(NthExpr { a, b: 0 });
            }
            if !b_part.starts_with(['+', '-']) {
                return None;
            }
            let b = b_part.parse::<i64>().ok()?;
            Some(NthExpr { a, b })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nth() {
        assert_eq!(parse_nth("odd"), Some(NthExpr { a: 2, b: 1 }));
        assert_eq!(parse_nth(" 2n + 1 "), Some(NthExpr { a: 2, b: 1 }));
        assert_eq!(parse_nth("-n+3"), Some(NthExpr { a: -1, b: 3 }));
        assert_eq!(parse_nth("3"), Some(NthExpr { a: 0, b: 3 }));
        assert_eq!(parse_nth("n"), Some(NthExpr { a: 1, b: 0 }));
        assert_eq!(parse_nth("2n3"), None);
        assert_eq!(parse_nth("foo"), None);
    }

    #[test]
    fn test_split_selector_groups_respects_nesting() {
        assert_eq!(
            split_selector_groups("a, b:not(c, d), [e=\",\"]"),
            Some(vec![
                "a".to_string(),
                "b:not(c, d)".to_string(),
                "[e=\",\"]".to_string()
            ])
        );
        assert_eq!(split_selector_groups("a(b"), None);
    }

    #[test]
    fn test_escape_in_identifier() {
        let list = parse_selector_list(r".a\:b").unwrap();
        assert_eq!(
            list.selectors[0].subject.simple_selectors[0],
            SimpleSelector::Class("a:b".to_string())
        );
    }
}
