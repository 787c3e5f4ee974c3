//! Argument patterns shared by the matchers: literal strings, regexp
//! literals written as `/body/flags`, and `*` wildcards.

use regex::Regex;

/// JavaScript regexp flags accepted after the closing slash.
const REGEXP_FLAGS: &str = "gimsuy";

/// A compiled matcher argument.
#[derive(Debug, Clone)]
pub(crate) enum ArgMatcher {
    /// Exact string equality.
    Literal(String),
    /// Regexp search (or an anchored wildcard).
    Pattern(Regex),
}

impl ArgMatcher {
    pub(crate) fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == text,
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// Split a `/body/flags` regexp literal. `None` if `raw` is not one.
pub(crate) fn split_regexp_literal(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.trim().strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);
    flags
        .chars()
        .all(|c| REGEXP_FLAGS.contains(c))
        .then_some((body, flags))
}

/// Compile a JavaScript-style regexp. `i`, `m` and `s` become inline
/// flags, `y` anchors at the start, `g` and `u` have no effect on a test.
pub(crate) fn build_regex(body: &str, flags: &str) -> Result<Regex, regex::Error> {
    let mut inline = String::new();
    for flag in flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')) {
        if !inline.contains(flag) {
            inline.push(flag);
        }
    }
    let body = unescape_slashes(body);
    let mut pattern = String::with_capacity(body.len() + 12);
    if !inline.is_empty() {
        pattern.push_str("(?");
        pattern.push_str(&inline);
        pattern.push(')');
    }
    if flags.contains('y') {
        pattern.push_str(r"\A(?:");
        pattern.push_str(&body);
        pattern.push(')');
    } else {
        pattern.push_str(&body);
    }
    Regex::new(&pattern)
}

/// `\/` is how a slash is written inside a regexp literal.
fn unescape_slashes(body: &str) -> String {
    let mut output = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('/') => output.push('/'),
                Some(escaped) => {
                    output.push('\\');
                    output.push(escaped);
                }
                None => output.push('\\'),
            }
        } else {
            output.push(c);
        }
    }
    output
}

/// Anchored regexp for a `*` wildcard mask; everything else is literal.
pub(crate) fn wildcard_regex(mask: &str) -> Result<Regex, regex::Error> {
    let escaped: Vec<String> = mask.split('*').map(regex::escape).collect();
    Regex::new(&format!("^{}$", escaped.join(".*")))
}

/// Remove one pair of matching outer quotes.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() > 1 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Split `name<separator>value` at the first separator, trimming both.
pub(crate) fn split_name_value(raw: &str, separator: char) -> (&str, Option<&str>) {
    match raw.split_once(separator) {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (raw.trim(), None),
    }
}

/// Interpret a name or value argument: a regexp literal, a wildcard mask or
/// a literal string. Surrounding quotes are removed first.
///
/// # Errors
/// Returns a description of the problem for empty arguments, bare `*`
/// (unless `wildcard_allowed`) and regexps that do not compile.
pub(crate) fn matcher_arg(raw: &str, wildcard_allowed: bool) -> Result<ArgMatcher, String> {
    let arg = strip_quotes(raw);
    if arg.is_empty() {
        return Err("argument should be specified, empty arg is invalid".to_string());
    }
    if let Some((body, flags)) = split_regexp_literal(arg) {
        if body.is_empty() {
            return Err(format!("invalid regexp: '{arg}'"));
        }
        return build_regex(body, flags)
            .map(ArgMatcher::Pattern)
            .map_err(|e| format!("invalid regexp '{arg}': {e}"));
    }
    if arg.contains('*') {
        if arg == "*" && !wildcard_allowed {
            return Err(format!("argument should be more specific than {arg}"));
        }
        return wildcard_regex(arg)
            .map(ArgMatcher::Pattern)
            .map_err(|e| format!("invalid wildcard '{arg}': {e}"));
    }
    Ok(ArgMatcher::Literal(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_regexp_literal() {
        assert_eq!(split_regexp_literal("/ad/"), Some(("ad", "")));
        assert_eq!(split_regexp_literal(" /a/b/gi "), Some(("a/b", "gi")));
        assert_eq!(split_regexp_literal("/path/to"), None);
        assert_eq!(split_regexp_literal("ad"), None);
        assert_eq!(split_regexp_literal("/"), None);
    }

    #[test]
    fn test_build_regex_flags() {
        let re = build_regex("ad", "gii").unwrap();
        assert!(re.is_match("AD here"));
        let sticky = build_regex("ad", "y").unwrap();
        assert!(sticky.is_match("adx"));
        assert!(!sticky.is_match("xad"));
        let slash = build_regex(r"a\/b", "").unwrap();
        assert!(slash.is_match("a/b"));
    }

    #[test]
    fn test_wildcard_is_anchored_and_literal() {
        let re = wildcard_regex("data-*").unwrap();
        assert!(re.is_match("data-slot"));
        assert!(!re.is_match("x-data-slot"));
        let dotted = wildcard_regex("a.b*").unwrap();
        assert!(!dotted.is_match("axb"));
    }

    #[test]
    fn test_matcher_arg_errors() {
        assert!(matcher_arg("\"\"", false).is_err());
        assert!(matcher_arg("*", false).is_err());
        assert!(matcher_arg("*", true).is_ok());
        assert!(matcher_arg("//", false).is_err());
        assert!(matcher_arg("/(?<=a)b/", false).is_err());
        assert!(matches!(matcher_arg("'id'", false), Ok(ArgMatcher::Literal(s)) if s == "id"));
    }
}
