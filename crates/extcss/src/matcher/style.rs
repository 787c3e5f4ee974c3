//! `:matches-css()` and its legacy `-before`/`-after` forms.

use once_cell::sync::Lazy;
use regex::Regex;

use super::pattern::{build_regex, split_name_value, split_regexp_literal, wildcard_regex};
use crate::error::{ExtCssError, Result};
use crate::pseudo::{self, PseudoClass};

/// `url(x)` without quotes around `x`.
static UNQUOTED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\(\s*([^"'\s)][^)]*?)\s*\)"#).expect("url() pattern is a valid regex")
});

/// Matches one computed style property against a pattern.
#[derive(Debug, Clone)]
pub(crate) struct StyleMatcher {
    pseudo_element: Option<String>,
    property: String,
    pattern: Regex,
}

impl StyleMatcher {
    pub(crate) fn new(pseudo_class: PseudoClass, arg: &str) -> Result<Self> {
        let name = pseudo_class.as_ref();
        let (pseudo_element, declaration) = match pseudo_class {
            PseudoClass::MatchesCssBefore => (Some("before".to_string()), arg),
            PseudoClass::MatchesCssAfter => (Some("after".to_string()), arg),
            _ => split_pseudo_element(arg),
        };

        let (property, value) = split_name_value(declaration, ':');
        let property = property.to_ascii_lowercase();
        let value = value.unwrap_or_default();
        if property.is_empty() || value.is_empty() {
            return Err(ExtCssError::matcher_argument(
                name,
                format!("required property name or value is missing in '{arg}'"),
            ));
        }

        let pattern = if let Some((body, flags)) = split_regexp_literal(value) {
            if body.is_empty() {
                return Err(ExtCssError::matcher_argument(
                    name,
                    format!("invalid regexp: '{value}'"),
                ));
            }
            build_regex(body, flags)
        } else {
            wildcard_regex(&normalize_value(&property, value))
        }
        .map_err(|e| ExtCssError::matcher_argument(name, format!("'{arg}': {e}")))?;

        Ok(Self {
            pseudo_element,
            property,
            pattern,
        })
    }

    pub(crate) fn pseudo_element(&self) -> Option<&str> {
        self.pseudo_element.as_deref()
    }

    pub(crate) fn property(&self) -> &str {
        &self.property
    }

    /// Test a raw computed value.
    pub(crate) fn matches(&self, computed: &str) -> bool {
        self.pattern
            .is_match(&normalize_value(&self.property, computed))
    }
}

/// `before, content: x` names a pseudo-element; anything else before the
/// first comma is part of the declaration.
fn split_pseudo_element(arg: &str) -> (Option<String>, &str) {
    if let Some((head, tail)) = arg.split_once(',') {
        let head = head.trim().trim_start_matches(':');
        if !head.is_empty() && pseudo::is_regular_pseudo_element(head) {
            return (Some(head.to_ascii_lowercase()), tail);
        }
    }
    (None, arg)
}

/// Computed values differ in quoting between engines; compare them in one
/// canonical form.
fn normalize_value(property: &str, value: &str) -> String {
    match property {
        "background" | "background-image" if !value.contains("url(\"") => UNQUOTED_URL
            .replace_all(value, "url(\"$1\")")
            .into_owned(),
        "content" => strip_content_quotes(value).to_string(),
        _ => value.to_string(),
    }
}

fn strip_content_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() > 1 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_value() {
        let matcher = StyleMatcher::new(PseudoClass::MatchesCss, "height: 2*px").unwrap();
        assert!(matcher.matches("20px"));
        assert!(!matcher.matches("120px"));
        assert_eq!(matcher.property(), "height");
        assert_eq!(matcher.pseudo_element(), None);
    }

    #[test]
    fn test_regexp_value_and_pseudo_element() {
        let matcher =
            StyleMatcher::new(PseudoClass::MatchesCss, "before, content: /^Ad/").unwrap();
        assert_eq!(matcher.pseudo_element(), Some("before"));
        assert!(matcher.matches("\"Advertisement\""));
    }

    #[test]
    fn test_background_url_quotes() {
        let matcher =
            StyleMatcher::new(PseudoClass::MatchesCss, "background-image: url(data:*)").unwrap();
        assert!(matcher.matches("url(data:image/png;base64,AAAA)"));
        assert!(matcher.matches("url(\"data:image/png;base64,AAAA\")"));
    }

    #[test]
    fn test_legacy_form() {
        let matcher = StyleMatcher::new(PseudoClass::MatchesCssAfter, "content: Ad").unwrap();
        assert_eq!(matcher.pseudo_element(), Some("after"));
        assert!(matcher.matches("'Ad'"));
    }

    #[test]
    fn test_missing_value() {
        assert!(StyleMatcher::new(PseudoClass::MatchesCss, "height").is_err());
        assert!(StyleMatcher::new(PseudoClass::MatchesCss, "height:").is_err());
    }
}
