//! `:has()`, `:is()` and `:not()`.
//!
//! The argument is evaluated relative to each element:
//!
//! - `:has()` searches under the element (or, for `+`/`~`, under its
//!   parent) and requires every selector in the list to find something.
//! - `:is()` and `:not()` search the element's parent for direct children
//!   and check whether the element is among them. An invalid argument makes
//!   an `:is()` branch false but fails a `:not()`.

use extcss_common::warning;
use extcss_dom::DomHost;

use super::{Seed, SiblingCombinator, element_description, elements_for_selector};
use crate::ast::{RelativePseudoClass, Selector, SelectorList};
use crate::error::{ExtCssError, Result};
use crate::pseudo::PseudoClass;

pub(super) fn filter<H: DomHost>(
    host: &H,
    elements: Vec<H::Node>,
    pseudo: &RelativePseudoClass,
) -> Result<Vec<H::Node>> {
    let name = pseudo.name.as_str();
    let list = &pseudo.selector_list;
    let Some(pseudo_class) = PseudoClass::lookup(name).filter(|p| p.is_relative()) else {
        return Err(ExtCssError::matcher_argument(
            name,
            "expects a raw argument, not a selector list",
        ));
    };

    let mut kept = Vec::with_capacity(elements.len());
    for element in elements {
        let keep = match pseudo_class {
            PseudoClass::Is => is_any_element(host, element, list, name),
            PseudoClass::Not => not_any_element(host, element, list, name)?,
            _ => has_relatives(host, element, list, name)?,
        };
        if keep {
            kept.push(element);
        }
    }
    Ok(kept)
}

fn first_value(selector: &Selector) -> &str {
    selector.first_regular().map_or("", |r| r.value.as_str())
}

/// Every selector of the list finds at least one element relative to
/// `element`.
fn has_relatives<H: DomHost>(
    host: &H,
    element: H::Node,
    list: &SelectorList,
    name: &str,
) -> Result<bool> {
    for selector in &list.children {
        let value = first_value(selector);
        let (root, seed) = if let Some(combinator) = SiblingCombinator::leading(value) {
            // `h1:has(+ .share)` looks for `:scope>h1+.share` under the parent
            let Some(parent) = host.parent_element(element) else {
                return Err(ExtCssError::selection(
                    value,
                    format!(
                        "selection by :{name}() pseudo-class is not possible for an element without parent"
                    ),
                ));
            };
            let fragment = format!(":scope>{}{value}", element_description(host, element));
            (parent, Seed {
                fragment,
                following: Some((element, combinator)),
            })
        } else if value == "*" {
            (element, Seed {
                fragment: ":scope *".to_string(),
                following: None,
            })
        } else {
            (element, Seed {
                fragment: format!(":scope {value}"),
                following: None,
            })
        };

        let found = elements_for_selector(host, selector, root, Some(seed)).inspect_err(|e| {
            warning::error(
                name,
                &format!("invalid selector for :{name}() pseudo-class: '{value}': {e}"),
            );
        })?;
        if found.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Direct children of the parent selected by `selector`, or `None` when the
/// element has no parent to scope against.
fn siblings_selected_by<H: DomHost>(
    host: &H,
    element: H::Node,
    selector: &Selector,
) -> Option<Result<Vec<H::Node>>> {
    let parent = host.parent_element(element)?;
    let seed = Seed {
        fragment: format!(":scope>{}", first_value(selector)),
        following: None,
    };
    Some(elements_for_selector(host, selector, parent, Some(seed)))
}

/// Some selector of the list matches the element. Invalid branches are
/// skipped.
fn is_any_element<H: DomHost>(
    host: &H,
    element: H::Node,
    list: &SelectorList,
    name: &str,
) -> bool {
    list.children.iter().any(|selector| {
        match siblings_selected_by(host, element, selector) {
            None => false,
            Some(Ok(found)) => found.contains(&element),
            Some(Err(e)) => {
                warning::warn_once(
                    name,
                    &format!(
                        "skipping invalid selector in :{name}() pseudo-class: '{}': {e}",
                        first_value(selector)
                    ),
                );
                false
            }
        }
    })
}

/// No selector of the list matches the element. An element without parent
/// is never kept.
fn not_any_element<H: DomHost>(
    host: &H,
    element: H::Node,
    list: &SelectorList,
    name: &str,
) -> Result<bool> {
    for selector in &list.children {
        match siblings_selected_by(host, element, selector) {
            None => return Ok(false),
            Some(Ok(found)) => {
                if found.contains(&element) {
                    return Ok(false);
                }
            }
            Some(Err(e)) => {
                warning::error(
                    name,
                    &format!(
                        "invalid selector for :{name}() pseudo-class: '{}': {e}",
                        first_value(selector)
                    ),
                );
                return Err(e);
            }
        }
    }
    Ok(true)
}
