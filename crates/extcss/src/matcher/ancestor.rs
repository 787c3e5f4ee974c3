//! `:nth-ancestor(n)` and `:upward(n | selector)`.

use extcss_dom::DomHost;

use crate::error::{ExtCssError, Result};

/// Largest accepted ancestor depth.
pub(crate) const MAX_DEPTH: usize = 255;

/// Parse a depth argument: an integer in `1..=255`.
pub(crate) fn parse_depth(pseudo_class: &str, arg: &str) -> Result<usize> {
    arg.trim()
        .parse::<usize>()
        .ok()
        .filter(|depth| (1..=MAX_DEPTH).contains(depth))
        .ok_or_else(|| {
            ExtCssError::matcher_argument(
                pseudo_class,
                format!("'{arg}' is not an integer between 1 and {MAX_DEPTH}"),
            )
        })
}

/// The `depth`-th ancestor of each element. Elements without one
/// contribute nothing.
pub(crate) fn nth_ancestors<H: DomHost>(
    host: &H,
    elements: &[H::Node],
    depth: usize,
) -> Vec<H::Node> {
    elements
        .iter()
        .filter_map(|&element| nth_ancestor(host, element, depth))
        .collect()
}

fn nth_ancestor<H: DomHost>(host: &H, element: H::Node, depth: usize) -> Option<H::Node> {
    let mut current = element;
    for _ in 0..depth {
        current = host.parent_element(current)?;
    }
    Some(current)
}

/// Whether the `:upward()` argument is a number rather than a selector.
fn looks_numeric(arg: &str) -> bool {
    let trimmed = arg.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
}

/// `:upward()`: a number behaves like `:nth-ancestor()`, a selector picks
/// the closest strict ancestor matching it.
pub(crate) fn upward<H: DomHost>(
    host: &H,
    elements: &[H::Node],
    arg: &str,
) -> Result<Vec<H::Node>> {
    const PSEUDO_CLASS: &str = "upward";
    if looks_numeric(arg) {
        let depth = parse_depth(PSEUDO_CLASS, arg)?;
        return Ok(nth_ancestors(host, elements, depth));
    }

    let selector = arg.trim();
    let mut found = Vec::new();
    for &element in elements {
        let mut current = host.parent_element(element);
        while let Some(ancestor) = current {
            let matched = host.matches(ancestor, selector).map_err(|e| {
                ExtCssError::matcher_argument(PSEUDO_CLASS, format!("'{arg}': {e}"))
            })?;
            if matched {
                found.push(ancestor);
                break;
            }
            current = host.parent_element(ancestor);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_depth_bounds() {
        assert_eq!(parse_depth("nth-ancestor", "1").unwrap(), 1);
        assert_eq!(parse_depth("nth-ancestor", " 255 ").unwrap(), 255);
        assert!(parse_depth("nth-ancestor", "0").is_err());
        assert!(parse_depth("nth-ancestor", "256").is_err());
        assert!(parse_depth("nth-ancestor", "1.5").is_err());
        assert!(parse_depth("nth-ancestor", "two").is_err());
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("3"));
        assert!(looks_numeric("-1"));
        assert!(!looks_numeric(".banner"));
        assert!(!looks_numeric("div"));
    }
}
