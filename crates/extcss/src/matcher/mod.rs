//! Absolute pseudo-class matchers.
//!
//! Each matcher compiles its raw argument once per application and then
//! either filters the incoming elements (`:contains()`, `:matches-*()`) or
//! maps them to other elements (`:xpath()`, `:upward()`,
//! `:nth-ancestor()`).

mod ancestor;
mod attribute;
mod pattern;
mod property;
mod style;
mod text;
mod xpath;

use extcss_common::warning;
use extcss_dom::DomHost;

use crate::ast::AbsolutePseudoClass;
use crate::error::{ExtCssError, Result};
use crate::pseudo::PseudoClass;

use attribute::AttributeMatcher;
use property::PropertyMatcher;
use style::StyleMatcher;
use text::TextMatcher;

/// Apply an absolute pseudo-class to the current element set.
pub(crate) fn apply_absolute<H: DomHost>(
    host: &H,
    elements: Vec<H::Node>,
    pseudo: &AbsolutePseudoClass,
) -> Result<Vec<H::Node>> {
    let name = pseudo.name.as_str();
    let arg = pseudo.value.as_str();
    let Some(pseudo_class) = PseudoClass::lookup(name) else {
        return Err(ExtCssError::matcher_argument(name, "unknown pseudo-class"));
    };

    let found = match pseudo_class {
        PseudoClass::Contains | PseudoClass::HasText | PseudoClass::AbpContains => {
            let matcher = TextMatcher::new(name, arg)?;
            elements
                .into_iter()
                .filter(|&element| matcher.matches(&host.text_content(element)))
                .collect()
        }
        PseudoClass::MatchesCss | PseudoClass::MatchesCssBefore | PseudoClass::MatchesCssAfter => {
            let matcher = StyleMatcher::new(pseudo_class, arg)?;
            let pseudo_element = matcher.pseudo_element().map(|p| format!("::{p}"));
            elements
                .into_iter()
                .filter(|&element| {
                    let computed =
                        host.computed_style(element, pseudo_element.as_deref(), matcher.property());
                    matcher.matches(&computed)
                })
                .collect()
        }
        PseudoClass::MatchesAttr => {
            let matcher = AttributeMatcher::new(arg)?;
            elements
                .into_iter()
                .filter(|&element| matcher.matches(&host.attributes(element)))
                .collect()
        }
        PseudoClass::MatchesProperty => {
            let matcher = PropertyMatcher::new(arg)?;
            elements
                .into_iter()
                .filter(|&element| matcher.matches(&host.property_root(element)))
                .collect()
        }
        PseudoClass::Xpath => xpath::select(host, &elements, arg)?,
        PseudoClass::NthAncestor => {
            let depth = ancestor::parse_depth(name, arg)?;
            ancestor::nth_ancestors(host, &elements, depth)
        }
        PseudoClass::Upward => ancestor::upward(host, &elements, arg)?,
        PseudoClass::Has | PseudoClass::AbpHas | PseudoClass::Is | PseudoClass::Not => {
            return Err(ExtCssError::matcher_argument(
                name,
                "expects a selector list, not a raw argument",
            ));
        }
    };

    if warning::debug_enabled() {
        warning::debug(
            "matcher",
            &format!(":{name}({arg}) kept {} element(s)", found.len()),
        );
    }
    Ok(found)
}
