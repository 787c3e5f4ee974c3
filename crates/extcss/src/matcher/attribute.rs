//! `:matches-attr(name[=value])`

use super::pattern::{ArgMatcher, matcher_arg, split_name_value};
use crate::error::{ExtCssError, Result};

const PSEUDO_CLASS: &str = "matches-attr";

/// Matches elements having at least one attribute whose name, and value if
/// given, match.
#[derive(Debug, Clone)]
pub(crate) struct AttributeMatcher {
    name: ArgMatcher,
    value: Option<ArgMatcher>,
}

impl AttributeMatcher {
    pub(crate) fn new(arg: &str) -> Result<Self> {
        let (raw_name, raw_value) = split_name_value(arg, '=');
        if raw_name.is_empty() {
            return Err(ExtCssError::matcher_argument(
                PSEUDO_CLASS,
                format!("required attribute name is missing in '{arg}'"),
            ));
        }
        let invalid = |message: String| {
            ExtCssError::matcher_argument(PSEUDO_CLASS, format!("'{arg}': {message}"))
        };
        let name = matcher_arg(raw_name, false).map_err(invalid)?;
        let value = raw_value
            .filter(|value| !value.is_empty())
            .map(|value| matcher_arg(value, false))
            .transpose()
            .map_err(invalid)?;
        Ok(Self { name, value })
    }

    pub(crate) fn matches(&self, attributes: &[(String, String)]) -> bool {
        attributes.iter().any(|(name, value)| {
            self.name.is_match(name)
                && self
                    .value
                    .as_ref()
                    .is_none_or(|matcher| matcher.is_match(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_name_only() {
        let matcher = AttributeMatcher::new("\"data-*\"").unwrap();
        assert!(matcher.matches(&attrs(&[("data-slot", "x")])));
        assert!(!matcher.matches(&attrs(&[("class", "data-x")])));
        assert!(!matcher.matches(&[]));
    }

    #[test]
    fn test_name_and_regexp_value() {
        let matcher = AttributeMatcher::new("/-link/=/^(?:g|b)$/").unwrap();
        assert!(matcher.matches(&attrs(&[("data-link", "g")])));
        assert!(!matcher.matches(&attrs(&[("data-link", "x")])));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(AttributeMatcher::new("=x").is_err());
        assert!(AttributeMatcher::new("*").is_err());
        assert!(AttributeMatcher::new("id=\"\"").is_err());
    }
}
