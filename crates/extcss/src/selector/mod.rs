//! Query engine: evaluate a selector AST against a host document.
//!
//! Each selector is evaluated left to right. The leading regular selector
//! seeds the element set through the host's native query. Extended
//! pseudo-classes then filter or map the set. Later regular selectors
//! continue from each element through a synthesized `:scope` query.

mod relative;

use core::fmt::Write;
use std::collections::HashSet;

use extcss_common::warning;
use extcss_dom::DomHost;

use crate::ast::{ExtendedSelector, Selector, SelectorList, SelectorPart};
use crate::error::{ExtCssError, Result};
use crate::matcher::apply_absolute;
use crate::parser::parse;

/// Select every element under `root` matched by `selector`.
///
/// # Errors
/// Returns a syntax error for invalid selectors, an argument error for
/// malformed pseudo-class arguments, and a selection error when the host
/// rejects a synthesized fragment.
pub fn query_selector_all<H: DomHost>(
    host: &H,
    selector: &str,
    root: H::Node,
) -> Result<Vec<H::Node>> {
    let ast = parse(selector)?;
    select_elements_by_ast(host, &ast, root)
}

/// Select every element under `root` matched by a parsed selector list:
/// the union of each selector's result, without duplicates, in first-seen
/// order.
///
/// # Errors
/// Returns an argument error for malformed pseudo-class arguments and a
/// selection error when the host rejects a synthesized fragment.
pub fn select_elements_by_ast<H: DomHost>(
    host: &H,
    ast: &SelectorList,
    root: H::Node,
) -> Result<Vec<H::Node>> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for selector in &ast.children {
        for element in elements_for_selector(host, selector, root, None)? {
            if seen.insert(element) {
                selected.push(element);
            }
        }
    }
    Ok(selected)
}

/// How the leading regular selector is evaluated when the selector is the
/// argument of a relative pseudo-class.
pub(crate) struct Seed<N> {
    /// Selector text used instead of the regular selector's own value.
    fragment: String,
    /// Keep only seed elements that are (or are inside) a sibling following
    /// this element in the given way.
    following: Option<(N, SiblingCombinator)>,
}

/// How a sibling continuation reaches past the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SiblingCombinator {
    /// `+`: the next element sibling only.
    Adjacent,
    /// `~`: any later element sibling.
    General,
}

impl SiblingCombinator {
    /// The combinator `value` starts with, if it is a sibling one.
    fn leading(value: &str) -> Option<Self> {
        match value.chars().next() {
            Some('+') => Some(Self::Adjacent),
            Some('~') => Some(Self::General),
            _ => None,
        }
    }
}

/// Evaluate one selector from `root`.
pub(crate) fn elements_for_selector<H: DomHost>(
    host: &H,
    selector: &Selector,
    root: H::Node,
    seed: Option<Seed<H::Node>>,
) -> Result<Vec<H::Node>> {
    let Some(first) = selector.first_regular() else {
        return Err(ExtCssError::selection(
            &selector.to_string(),
            "a selector must start with a regular selector",
        ));
    };
    let mut elements = match seed {
        None => by_regular(host, root, &first.value)?,
        Some(seed) => {
            let mut found = by_regular(host, root, &seed.fragment)?;
            if let Some((element, combinator)) = seed.following {
                found.retain(|&candidate| {
                    follows_sibling(host, element, candidate, root, combinator)
                });
            }
            found
        }
    };

    for part in selector.children.iter().skip(1) {
        elements = match part {
            SelectorPart::Regular(regular) => {
                by_following_regular(host, &elements, &regular.value)?
            }
            SelectorPart::Extended(ExtendedSelector::Absolute(absolute)) => {
                apply_absolute(host, elements, absolute)?
            }
            SelectorPart::Extended(ExtendedSelector::Relative(relative_pseudo)) => {
                relative::filter(host, elements, relative_pseudo)?
            }
        };
    }
    Ok(elements)
}

/// Native query, with host failures reported against the fragment.
fn by_regular<H: DomHost>(host: &H, root: H::Node, fragment: &str) -> Result<Vec<H::Node>> {
    host.query_selector_all(root, fragment).map_err(|e| {
        warning::debug("selector", &format!("native query '{fragment}' failed: {e}"));
        ExtCssError::selection(fragment, e.to_string())
    })
}

/// A regular selector that follows an extended pseudo-class.
fn by_following_regular<H: DomHost>(
    host: &H,
    elements: &[H::Node],
    value: &str,
) -> Result<Vec<H::Node>> {
    let value = value.trim_start();
    let mut found = Vec::new();
    // `div:has(> img) + .banner`, `div:has(> img) ~ .banner`
    if let Some(combinator) = SiblingCombinator::leading(value) {
        for &element in elements {
            let Some(parent) = host.parent_element(element) else {
                continue;
            };
            // a twin sibling with the same description matches the fragment
            // too, so candidates are checked against the element itself
            let fragment = format!(":scope>{}{value}", element_description(host, element));
            let candidates = by_regular(host, parent, &fragment)?;
            found.extend(candidates.into_iter().filter(|&candidate| {
                follows_sibling(host, element, candidate, parent, combinator)
            }));
        }
        return Ok(found);
    }
    // `div:has(> img) > .banner`, `div:has(> img) .banner`
    let separator = if value.starts_with('>') { "" } else { " " };
    for &element in elements {
        found.extend(by_regular(host, element, &format!(":scope{separator}{value}"))?);
    }
    Ok(found)
}

/// Whether `candidate` is, or is inside, a sibling reached from `element`
/// under `parent` through `combinator`.
fn follows_sibling<H: DomHost>(
    host: &H,
    element: H::Node,
    candidate: H::Node,
    parent: H::Node,
    combinator: SiblingCombinator,
) -> bool {
    let mut top = candidate;
    loop {
        match host.parent_element(top) {
            Some(p) if p == parent => break,
            Some(p) => top = p,
            None => return false,
        }
    }
    let mut sibling = host.next_element_sibling(element);
    if combinator == SiblingCombinator::Adjacent {
        return sibling == Some(top);
    }
    while let Some(current) = sibling {
        if current == top {
            return true;
        }
        sibling = host.next_element_sibling(current);
    }
    false
}

/// A compound selector naming the element by tag and every attribute,
/// e.g. `div[class="banner"][id="top"]`.
pub(crate) fn element_description<H: DomHost>(host: &H, element: H::Node) -> String {
    let mut description = escape_identifier(&host.tag_name(element));
    for (name, value) in host.attributes(element) {
        description.push('[');
        description.push_str(&escape_identifier(&name));
        description.push_str("=\"");
        description.push_str(&escape_string(&value));
        description.push_str("\"]");
    }
    description
}

fn escape_identifier(identifier: &str) -> String {
    let mut escaped = String::with_capacity(identifier.len());
    for (i, c) in identifier.chars().enumerate() {
        if c.is_ascii_digit() && i == 0 {
            // a leading digit needs a hex escape, `\1` would read as U+0001
            let _ = write!(escaped, "\\{:x} ", u32::from(c));
            continue;
        }
        let plain = c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii();
        if !plain {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\a "),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("data-x"), "data-x");
        assert_eq!(escape_identifier("xlink:href"), "xlink\\:href");
        assert_eq!(escape_identifier("h1"), "h1");
        assert_eq!(escape_identifier("1x"), "\\31 x");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
