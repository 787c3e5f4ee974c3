//! The catalogue of supported extended pseudo-classes.
//!
//! Absolute pseudo-classes take a raw string argument that only a matcher
//! interprets. Relative pseudo-classes take a selector list that is parsed
//! into a nested subtree.

use strum_macros::{AsRefStr, Display, EnumString};

/// Every extended pseudo-class the parser recognises, by its lower-case
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum PseudoClass {
    /// `:contains(text)`
    Contains,
    /// `:has-text(text)`, alias of `:contains()`.
    HasText,
    /// `:-abp-contains(text)`, alias of `:contains()`.
    #[strum(serialize = "-abp-contains")]
    AbpContains,
    /// `:matches-css([pseudo-element,] property: pattern)`
    MatchesCss,
    /// Legacy form of `:matches-css(before, ...)`.
    MatchesCssBefore,
    /// Legacy form of `:matches-css(after, ...)`.
    MatchesCssAfter,
    /// `:matches-attr(name[=value])`
    MatchesAttr,
    /// `:matches-property(chain[=value])`
    MatchesProperty,
    /// `:xpath(expression)`
    Xpath,
    /// `:nth-ancestor(n)`
    NthAncestor,
    /// `:upward(n | selector)`
    Upward,
    /// `:has(selector list)`
    Has,
    /// `:-abp-has(selector list)`, alias of `:has()`.
    #[strum(serialize = "-abp-has")]
    AbpHas,
    /// `:is(selector list)`
    Is,
    /// `:not(selector list)`
    Not,
}

/// Name of the action pseudo-class that selectors must not contain.
pub const REMOVE: &str = "remove";

/// Pseudo-elements after which `:has()` is not allowed.
pub const REGULAR_PSEUDO_ELEMENTS: &[&str] = &[
    "after",
    "backdrop",
    "before",
    "cue",
    "cue-region",
    "first-letter",
    "first-line",
    "file-selector-button",
    "grammar-error",
    "marker",
    "part",
    "placeholder",
    "selection",
    "slotted",
    "spelling-error",
    "target-text",
];

impl PseudoClass {
    /// Look up a pseudo-class by name, ignoring ASCII case.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        name.to_ascii_lowercase().parse().ok()
    }

    /// Whether the argument is a raw string rather than a selector list.
    #[must_use]
    pub const fn is_absolute(self) -> bool {
        !self.is_relative()
    }

    /// Whether the argument is a selector list.
    #[must_use]
    pub const fn is_relative(self) -> bool {
        matches!(self, Self::Has | Self::AbpHas | Self::Is | Self::Not)
    }

    /// `:has()` and its alias.
    #[must_use]
    pub const fn is_has(self) -> bool {
        matches!(self, Self::Has | Self::AbpHas)
    }

    /// The text-matching family, whose regexp argument may only follow an
    /// opening parenthesis or a quote.
    #[must_use]
    pub const fn is_contains(self) -> bool {
        matches!(self, Self::Contains | Self::HasText | Self::AbpContains)
    }

    /// Pseudo-classes that the optimizer may fold back into a regular
    /// selector when their argument is purely standard.
    #[must_use]
    pub const fn is_foldable(self) -> bool {
        matches!(self, Self::Is | Self::Not)
    }
}

/// Whether `name` is a supported extended pseudo-class.
#[must_use]
pub fn is_supported(name: &str) -> bool {
    PseudoClass::lookup(name).is_some()
}

/// Whether `name` is a pseudo-element after which `:has()` is rejected.
#[must_use]
pub fn is_regular_pseudo_element(name: &str) -> bool {
    REGULAR_PSEUDO_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(PseudoClass::lookup("CONTAINS"), Some(PseudoClass::Contains));
        assert_eq!(PseudoClass::lookup("-ABP-has"), Some(PseudoClass::AbpHas));
        assert_eq!(PseudoClass::lookup("hover"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for pseudo in [
            PseudoClass::HasText,
            PseudoClass::MatchesCssBefore,
            PseudoClass::NthAncestor,
            PseudoClass::AbpContains,
            PseudoClass::Xpath,
        ] {
            assert_eq!(PseudoClass::lookup(pseudo.as_ref()), Some(pseudo));
        }
        assert_eq!(PseudoClass::MatchesCssBefore.to_string(), "matches-css-before");
    }

    #[test]
    fn test_families() {
        assert!(PseudoClass::Not.is_relative());
        assert!(PseudoClass::Upward.is_absolute());
        assert!(PseudoClass::AbpHas.is_has());
        assert!(PseudoClass::HasText.is_contains());
        assert!(!PseudoClass::Has.is_foldable());
    }
}
