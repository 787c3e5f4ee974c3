//! AST optimization.
//!
//! A `:not()` or `:is()` whose argument is a list of standard compound
//! selectors can be evaluated by the host in one native query, so it is
//! folded back into the preceding regular selector:
//!
//! ```text
//! div:not(.a, .b)     Regular("div") + Relative(not)  ->  Regular("div:not(.a, .b)")
//! *:is(.ad)           Regular("*")   + Relative(is)   ->  Regular("html *:is(.ad)")
//! .ad:not(p)          Regular(".ad") + Relative(not)  ->  Regular("html .ad:not(p)")
//! ```
//!
//! The unoptimized tree never keeps the root element: it has no parent to
//! scope the argument against. A leading compound that could select the
//! root therefore gets an `html` ancestor when folded at the top level.
//! Complex arguments (`:is(body > div)`) stay extended, since the
//! unoptimized tree only sees the candidate's parent.

use core::fmt::Write;

use crate::ast::{ExtendedSelector, RelativePseudoClass, Selector, SelectorList, SelectorPart};
use crate::pseudo::PseudoClass;
use crate::tokenizer::{is_combinator, is_white_space};

const ANY_ELEMENT: &str = "*";
const ROOT_ELEMENT: &str = "html";

/// Return an optimized copy of `ast`. Never changes which elements match.
#[must_use]
pub fn optimize(ast: &SelectorList) -> SelectorList {
    optimize_list(ast, true)
}

/// `top_level` is false inside relative arguments, whose candidates always
/// have a parent.
fn optimize_list(list: &SelectorList, top_level: bool) -> SelectorList {
    SelectorList {
        children: list
            .children
            .iter()
            .map(|selector| optimize_selector(selector, top_level))
            .collect(),
    }
}

fn optimize_selector(selector: &Selector, top_level: bool) -> Selector {
    let mut children: Vec<SelectorPart> = Vec::with_capacity(selector.children.len());
    for part in &selector.children {
        match part {
            SelectorPart::Regular(regular) => children.push(SelectorPart::Regular(regular.clone())),
            SelectorPart::Extended(ExtendedSelector::Absolute(absolute)) => {
                children.push(SelectorPart::Extended(ExtendedSelector::Absolute(absolute.clone())));
            }
            SelectorPart::Extended(ExtendedSelector::Relative(relative)) => {
                let optimized = RelativePseudoClass {
                    name: relative.name.clone(),
                    selector_list: optimize_list(&relative.selector_list, false),
                };
                if !fold_into_previous_regular(&mut children, &optimized, top_level) {
                    children.push(SelectorPart::Extended(ExtendedSelector::Relative(optimized)));
                }
            }
        }
    }
    Selector { children }
}

/// Append `:name(a, b)` to the regular selector ending `children` when the
/// pseudo-class is foldable and its argument is purely standard.
fn fold_into_previous_regular(
    children: &mut [SelectorPart],
    relative: &RelativePseudoClass,
    top_level: bool,
) -> bool {
    let foldable = PseudoClass::lookup(&relative.name).is_some_and(PseudoClass::is_foldable);
    if !foldable || !is_pure_standard(&relative.selector_list) {
        return false;
    }
    let leads_selector = children.len() == 1;
    // only the part right before: `a:upward(2):not(.x)` must filter the
    // ancestors, not the `a` elements
    let Some(SelectorPart::Regular(regular)) = children.last_mut() else {
        return false;
    };
    if top_level && leads_selector && may_select_root(&regular.value) {
        regular.value = format!("{ROOT_ELEMENT} {}", regular.value);
    }
    let argument = relative
        .selector_list
        .children
        .iter()
        .filter_map(Selector::first_regular)
        .map(|r| r.value.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = write!(regular.value, ":{}({argument})", relative.name);
    true
}

/// Every selector is a single regular compound selector.
fn is_pure_standard(list: &SelectorList) -> bool {
    list.children.iter().all(|selector| {
        selector.is_regular_only()
            && selector
                .first_regular()
                .is_some_and(|regular| !regular.value.is_empty() && !has_combinator(&regular.value))
    })
}

/// A single compound whose type selector is missing, `*`, `html` or
/// anything not plainly a tag name.
fn may_select_root(value: &str) -> bool {
    if has_combinator(value) {
        return false;
    }
    let tag = value.split(['.', '#', '[', ':']).next().unwrap_or_default();
    tag.is_empty()
        || tag == ANY_ELEMENT
        || tag.eq_ignore_ascii_case(ROOT_ELEMENT)
        || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Whether a combinator or whitespace occurs outside brackets, parentheses
/// and quotes.
fn has_combinator(value: &str) -> bool {
    let mut depth = 0usize;
    let mut quote = None;
    let mut chars = value.trim().chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                let _ = chars.next();
            }
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && (is_combinator(c) || is_white_space(c)) => return true,
            (None, _) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseOptions, parse_with_options};

    fn unoptimized(selector: &str) -> SelectorList {
        parse_with_options(selector, ParseOptions { optimize: false }).unwrap()
    }

    #[test]
    fn test_folds_pure_not() {
        let ast = optimize(&unoptimized("div:not(.a, .b)"));
        assert_eq!(ast.to_string(), "div:not(.a, .b)");
        assert!(ast.children[0].is_regular_only());
    }

    #[test]
    fn test_wildcard_becomes_root_descendants() {
        let ast = optimize(&unoptimized("*:is(.ad)"));
        assert!(ast.children[0].is_regular_only());
        assert_eq!(ast.to_string(), "html *:is(.ad)");
    }

    #[test]
    fn test_keeps_extended_argument() {
        let ast = optimize(&unoptimized("div:not(:contains(ad))"));
        assert!(!ast.children[0].is_regular_only());
    }

    #[test]
    fn test_folds_nested_pure_arguments() {
        let ast = optimize(&unoptimized("div:is(.a:not(.b))"));
        assert!(ast.children[0].is_regular_only());
        assert_eq!(ast.to_string(), "div:is(.a:not(.b))");
    }

    #[test]
    fn test_combinator_led_argument_is_not_folded() {
        let ast = optimize(&unoptimized("div:is(> .a)"));
        assert!(!ast.children[0].is_regular_only());
    }

    #[test]
    fn test_complex_argument_is_not_folded() {
        let ast = optimize(&unoptimized("div:is(body > div)"));
        assert!(!ast.children[0].is_regular_only());
        let ast = optimize(&unoptimized("div:not(.a .b, .c)"));
        assert!(!ast.children[0].is_regular_only());
        // whitespace inside an attribute value is not a combinator
        let ast = optimize(&unoptimized(r#"div:not([title="a b"], .c)"#));
        assert_eq!(ast.to_string(), r#"div:not([title="a b"], .c)"#);
    }

    #[test]
    fn test_compound_that_may_select_root_gets_root_ancestor() {
        assert_eq!(optimize(&unoptimized("html:not(.x)")).to_string(), "html html:not(.x)");
        assert_eq!(optimize(&unoptimized(".ad:is(div)")).to_string(), "html .ad:is(div)");
        assert_eq!(optimize(&unoptimized("div.ad:is(.x)")).to_string(), "div.ad:is(.x)");
        assert_eq!(optimize(&unoptimized("body > .ad:not(p)")).to_string(), "body > .ad:not(p)");
    }

    #[test]
    fn test_nested_wildcard_keeps_scope() {
        let ast = optimize(&unoptimized("div:has(*:not(.a))"));
        assert_eq!(ast.to_string(), "div:has(*:not(.a))");
    }

    #[test]
    fn test_not_after_extended_is_not_folded_backwards() {
        let ast = optimize(&unoptimized("a:upward(2):not(.x)"));
        assert_eq!(ast.children[0].children.len(), 3);
        assert_eq!(ast.to_string(), "a:upward(2):not(.x)");
    }
}
