//! `:matches-property(chain[=value])`
//!
//! The chain is a dot-separated path into the element object. Each segment
//! is a literal key, a `*` wildcard or a `/regexp/`; dots inside a regexp
//! segment do not split. Regexp segments fan out over every matching key.

use extcss_dom::PropertyValue;
use regex::Regex;

use super::pattern::{
    ArgMatcher, build_regex, matcher_arg, split_name_value, split_regexp_literal, strip_quotes,
};
use crate::error::{ExtCssError, Result};

const PSEUDO_CLASS: &str = "matches-property";

/// The expected value at the end of the chain.
#[derive(Debug, Clone)]
enum ValueMatcher {
    /// Tested against `String(value)`.
    Pattern(Regex),
    /// Strictly compared after coercion: numbers, `true`, `false`, `null`
    /// and `undefined` are read as such, anything else as a string.
    Typed(String),
}

/// Matches elements whose property graph contains the chain (and value).
#[derive(Debug, Clone)]
pub(crate) struct PropertyMatcher {
    chain: Vec<ArgMatcher>,
    value: Option<ValueMatcher>,
}

impl PropertyMatcher {
    pub(crate) fn new(arg: &str) -> Result<Self> {
        let (raw_chain, raw_value) = split_name_value(arg, '=');
        if raw_chain.is_empty() {
            return Err(invalid(format!("required property name is missing in '{arg}'")));
        }
        // Chain segments cannot contain escaped separators.
        if raw_chain.contains("\\/") || raw_chain.contains("\\.") {
            return Err(invalid(format!("invalid name pattern: '{raw_chain}'")));
        }
        let chain = parse_chain(raw_chain)?;

        let value = match raw_value.filter(|value| !value.is_empty()) {
            None => None,
            Some(raw) => {
                let value = strip_quotes(raw);
                if value.is_empty() {
                    return Err(invalid(
                        "argument should be specified, empty arg is invalid".to_string(),
                    ));
                }
                if let Some((body, flags)) = split_regexp_literal(value) {
                    let regex = build_regex(body, flags)
                        .map_err(|e| invalid(format!("invalid regexp '{value}': {e}")))?;
                    Some(ValueMatcher::Pattern(regex))
                } else {
                    Some(ValueMatcher::Typed(value.to_string()))
                }
            }
        };
        Ok(Self { chain, value })
    }

    pub(crate) fn matches(&self, root: &PropertyValue) -> bool {
        let mut found = Vec::new();
        collect_chain(root, &self.chain, &mut found);
        if found.is_empty() {
            return false;
        }
        let Some(expected) = &self.value else {
            return true;
        };
        match expected {
            ValueMatcher::Pattern(regex) => found.iter().any(|v| regex.is_match(&v.to_string())),
            ValueMatcher::Typed(raw) => {
                for real in found {
                    // "null" and "undefined" stored as strings compare as strings
                    if let PropertyValue::String(s) = real {
                        if s == "null" || s == "undefined" {
                            return raw == s;
                        }
                    }
                    if strict_equals(&coerce(raw), real) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

fn invalid(message: String) -> ExtCssError {
    ExtCssError::matcher_argument(PSEUDO_CLASS, message)
}

/// Split the chain on dots that are not inside a regexp segment.
fn parse_chain(raw: &str) -> Result<Vec<ArgMatcher>> {
    let input = strip_quotes(raw);
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_regexp = false;
    for c in input.chars() {
        match c {
            '/' if current.is_empty() && !in_regexp => {
                in_regexp = true;
                current.push(c);
            }
            '/' if in_regexp => {
                in_regexp = false;
                current.push(c);
            }
            '.' if !in_regexp => segments.push(core::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_regexp {
        return Err(invalid(format!("invalid regexp property pattern '{input}'")));
    }
    segments.push(current);

    segments
        .iter()
        .map(|segment| {
            if segment.is_empty() {
                return Err(invalid(format!("empty pattern is invalid in chain '{input}'")));
            }
            matcher_arg(segment, true).map_err(|e| {
                invalid(format!("invalid property pattern '{segment}' in chain '{input}': {e}"))
            })
        })
        .collect()
}

fn collect_chain<'v>(
    base: &'v PropertyValue,
    chain: &[ArgMatcher],
    found: &mut Vec<&'v PropertyValue>,
) {
    let Some((segment, rest)) = chain.split_first() else {
        return;
    };
    for key in base.keys() {
        if !segment.is_match(key) {
            continue;
        }
        let Some(value) = base.get(key) else {
            continue;
        };
        if rest.is_empty() {
            found.push(value);
        } else {
            collect_chain(value, rest, found);
        }
    }
}

/// `Number(text)` for the forms a rule author would write.
fn js_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed {
        "" => return Some(0.0),
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn coerce(raw: &str) -> PropertyValue {
    if let Some(number) = js_number(raw) {
        return PropertyValue::Number(number);
    }
    match raw {
        "undefined" => PropertyValue::Undefined,
        "null" => PropertyValue::Null,
        "true" => PropertyValue::Bool(true),
        "false" => PropertyValue::Bool(false),
        _ => PropertyValue::String(raw.to_string()),
    }
}

/// `===` between primitives. Objects never compare equal to a coerced
/// argument.
#[allow(clippy::float_cmp)]
fn strict_equals(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a, b) {
        (PropertyValue::Undefined, PropertyValue::Undefined)
        | (PropertyValue::Null, PropertyValue::Null) => true,
        (PropertyValue::Bool(x), PropertyValue::Bool(y)) => x == y,
        (PropertyValue::Number(x), PropertyValue::Number(y)) => x == y,
        (PropertyValue::String(x), PropertyValue::String(y)) => x == y,
        _ => false,
    }
}
