//! Normalization of legacy selector syntax.
//!
//! Runs before tokenization. The rewrites are purely textual:
//!
//! - `[-ext-name="value"]` becomes `:name(value)`
//! - `:scope >` at the start of a relative argument becomes `>`
//! - `:matches-css-before(x)` becomes `:matches-css(before,x)`, and
//!   likewise for `after`

use extcss_common::warning;

use crate::error::{ExtCssError, Result};

const LEGACY_ATTRIBUTE_PREFIX: &str = "[-ext-";

/// Trim and rewrite legacy syntax into the canonical form.
///
/// # Errors
/// Returns a syntax error if a `[-ext-` attribute survives conversion,
/// i.e. it is not of the form `[-ext-name="value"]`.
pub fn convert(raw_selector: &str) -> Result<String> {
    let trimmed = raw_selector.trim();
    let mut converted = convert_legacy_attributes(trimmed);
    converted = converted.replace("(:scope >", "(>").replace("(:scope>", "(>");
    converted = convert_matches_css_pseudo_element(&converted, "before");
    converted = convert_matches_css_pseudo_element(&converted, "after");

    if converted.contains(LEGACY_ATTRIBUTE_PREFIX) {
        return Err(ExtCssError::syntax(
            raw_selector,
            format!("Invalid extended-css old syntax selector: '{raw_selector}'"),
        ));
    }
    if converted != trimmed {
        warning::debug("converter", &format!("rewrote '{trimmed}' as '{converted}'"));
    }
    Ok(converted)
}

fn convert_legacy_attributes(selector: &str) -> String {
    let mut output = String::with_capacity(selector.len());
    let mut rest = selector;
    while let Some(start) = rest.find(LEGACY_ATTRIBUTE_PREFIX) {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        if let Some((name, value, consumed)) = parse_legacy_attribute(candidate) {
            output.push(':');
            output.push_str(name);
            output.push('(');
            output.push_str(&value);
            output.push(')');
            rest = &candidate[consumed..];
        } else {
            // Leave it for the caller to report.
            output.push_str(LEGACY_ATTRIBUTE_PREFIX);
            rest = &candidate[LEGACY_ATTRIBUTE_PREFIX.len()..];
        }
    }
    output.push_str(rest);
    output
}

/// Parse `[-ext-name="value"]` at the start of `input`, returning the name,
/// the unescaped value and the number of bytes consumed.
fn parse_legacy_attribute(input: &str) -> Option<(&str, String, usize)> {
    let after_prefix = &input[LEGACY_ATTRIBUTE_PREFIX.len()..];
    let name_len = after_prefix
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after_prefix.len());
    if name_len == 0 {
        return None;
    }
    let name = &after_prefix[..name_len];
    let mut chars = after_prefix[name_len..].char_indices();
    if chars.next()?.1 != '=' {
        return None;
    }
    let (_, quote) = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let mut value = String::new();
    loop {
        let (_, c) = chars.next()?;
        if c == '\\' {
            let (_, escaped) = chars.next()?;
            if escaped != quote {
                value.push('\\');
            }
            value.push(escaped);
        } else if c == quote {
            break;
        } else {
            value.push(c);
        }
    }
    let (close_index, close) = chars.next()?;
    if close != ']' {
        return None;
    }
    let consumed = LEGACY_ATTRIBUTE_PREFIX.len() + name_len + close_index + 1;
    Some((name, value, consumed))
}

fn convert_matches_css_pseudo_element(selector: &str, pseudo_element: &str) -> String {
    let legacy = format!(":matches-css-{pseudo_element}(");
    let canonical = format!(":matches-css({pseudo_element},");
    let lower = selector.to_ascii_lowercase();
    if !lower.contains(&legacy) {
        return selector.to_string();
    }
    let mut output = String::with_capacity(selector.len());
    let mut last = 0;
    for (index, _) in lower.match_indices(&legacy) {
        output.push_str(&selector[last..index]);
        output.push_str(&canonical);
        last = index + legacy.len();
    }
    output.push_str(&selector[last..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_attribute() {
        assert_eq!(
            convert(r#"div[-ext-has=".banner"]"#).unwrap(),
            "div:has(.banner)"
        );
        assert_eq!(
            convert(r#"div[-ext-contains="say \"hi\""]"#).unwrap(),
            r#"div:contains(say "hi")"#
        );
    }

    #[test]
    fn test_malformed_legacy_attribute_is_rejected() {
        let err = convert("div[-ext-has=.banner]").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_canonical_selector_is_only_trimmed() {
        assert_eq!(convert("  div:has(> a:contains(ad)) ").unwrap(), "div:has(> a:contains(ad))");
        assert_eq!(
            convert("div:matches-css(before, content: ad)").unwrap(),
            "div:matches-css(before, content: ad)"
        );
    }

    #[test]
    fn test_scope_child_prefix() {
        assert_eq!(convert("div:has(:scope > a)").unwrap(), "div:has(> a)");
        assert_eq!(convert("div:has(:scope>a)").unwrap(), "div:has(>a)");
    }

    #[test]
    fn test_matches_css_pseudo_elements() {
        assert_eq!(
            convert(" div:matches-css-before(content: ad) ").unwrap(),
            "div:matches-css(before,content: ad)"
        );
        assert_eq!(
            convert("div:MATCHES-CSS-AFTER(color: red)").unwrap(),
            "div:matches-css(after,color: red)"
        );
    }
}
