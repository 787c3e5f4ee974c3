//! The selector AST.
//!
//! ```text
//! SelectorList
//! └── Selector+
//!     ├── RegularSelector            (always first)
//!     └── (RegularSelector | ExtendedSelector)*
//!                              └── AbsolutePseudoClass { name, value }
//!                               or RelativePseudoClass { name, SelectorList }
//! ```
//!
//! The tree is immutable once built; [`crate::optimize`] returns a new one.

use core::fmt;

use serde::Serialize;

use crate::pseudo::PseudoClass;

/// A comma-separated list of selectors. Matching is the union of its
/// members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorList {
    /// One entry per comma-separated selector.
    pub children: Vec<Selector>,
}

/// One selector of a list: a regular selector optionally followed by
/// extended pseudo-classes and further regular selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selector {
    /// Parts in source order. The first is always a regular selector.
    pub children: Vec<SelectorPart>,
}

/// A child of a [`Selector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SelectorPart {
    /// Standard CSS the host can evaluate natively.
    #[serde(rename = "RegularSelector")]
    Regular(RegularSelector),
    /// An extended pseudo-class.
    #[serde(rename = "ExtendedSelector")]
    Extended(ExtendedSelector),
}

/// Standard CSS text, possibly beginning with a combinator when it follows
/// an extended pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegularSelector {
    /// The selector text.
    pub value: String,
}

/// Exactly one extended pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtendedSelector {
    /// Raw-string argument.
    Absolute(AbsolutePseudoClass),
    /// Selector-list argument.
    Relative(RelativePseudoClass),
}

/// A pseudo-class whose argument is kept verbatim for its matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsolutePseudoClass {
    /// Lower-cased name.
    pub name: String,
    /// The raw argument text between the parentheses.
    pub value: String,
}

/// A pseudo-class whose argument is a nested selector list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelativePseudoClass {
    /// Lower-cased name.
    pub name: String,
    /// The parsed argument.
    pub selector_list: SelectorList,
}

impl SelectorList {
    /// Whether any selector contains an extended pseudo-class.
    #[must_use]
    pub fn has_extended(&self) -> bool {
        self.children.iter().any(Selector::has_extended)
    }
}

impl Selector {
    /// The leading regular selector.
    #[must_use]
    pub fn first_regular(&self) -> Option<&RegularSelector> {
        match self.children.first() {
            Some(SelectorPart::Regular(regular)) => Some(regular),
            _ => None,
        }
    }

    /// Whether this selector is a lone regular selector.
    #[must_use]
    pub fn is_regular_only(&self) -> bool {
        matches!(self.children.as_slice(), [SelectorPart::Regular(_)])
    }

    /// Whether any part is an extended pseudo-class.
    #[must_use]
    pub fn has_extended(&self) -> bool {
        self.children
            .iter()
            .any(|part| matches!(part, SelectorPart::Extended(_)))
    }
}

impl RegularSelector {
    /// A regular selector with the given text.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl ExtendedSelector {
    /// Lower-cased pseudo-class name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Absolute(absolute) => &absolute.name,
            Self::Relative(relative) => &relative.name,
        }
    }

    /// The catalogue entry for this pseudo-class.
    #[must_use]
    pub fn pseudo_class(&self) -> Option<PseudoClass> {
        PseudoClass::lookup(self.name())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.children.iter().enumerate() {
            match part {
                SelectorPart::Regular(regular) if i == 0 => f.write_str(&regular.value)?,
                // A later regular selector is always joined by a combinator.
                SelectorPart::Regular(regular) => write!(f, " {}", regular.value.trim_start())?,
                SelectorPart::Extended(extended) => write!(f, "{extended}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExtendedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(absolute) => write!(f, ":{}({})", absolute.name, absolute.value),
            Self::Relative(relative) => write!(f, ":{}({})", relative.name, relative.selector_list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(value: &str) -> SelectorPart {
        SelectorPart::Regular(RegularSelector::new(value))
    }

    #[test]
    fn test_display_nested() {
        let list = SelectorList {
            children: vec![Selector {
                children: vec![
                    regular("div"),
                    SelectorPart::Extended(ExtendedSelector::Relative(RelativePseudoClass {
                        name: "has".into(),
                        selector_list: SelectorList {
                            children: vec![Selector {
                                children: vec![
                                    regular("> a"),
                                    SelectorPart::Extended(ExtendedSelector::Absolute(
                                        AbsolutePseudoClass {
                                            name: "contains".into(),
                                            value: "ad".into(),
                                        },
                                    )),
                                ],
                            }],
                        },
                    })),
                    regular("span"),
                ],
            }],
        };
        assert_eq!(list.to_string(), "div:has(> a:contains(ad)) span");
        assert!(list.has_extended());
        assert!(!list.children[0].is_regular_only());
    }
}
