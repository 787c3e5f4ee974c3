//! Errors surfaced by parsing and querying.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExtCssError>;

/// Everything that can go wrong between a selector string and a set of
/// elements. No partial results are ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtCssError {
    /// The selector text is not valid extended CSS. Deterministic: the same
    /// input always fails the same way, regardless of the document.
    #[error("{message}")]
    Syntax {
        /// The selector as given by the caller.
        selector: String,
        /// Human-readable description naming the offending part.
        message: String,
    },

    /// The argument of an absolute pseudo-class is malformed.
    #[error("invalid argument of :{pseudo_class}() pseudo-class: {message}")]
    MatcherArgument {
        /// Pseudo-class name, lower-cased.
        pseudo_class: String,
        /// What is wrong with the argument.
        message: String,
    },

    /// A fragment the parser accepted was rejected by the host's native
    /// selection primitive.
    #[error("unable to select by '{fragment}': {reason}")]
    Selection {
        /// The synthesized selector handed to the host.
        fragment: String,
        /// The host's explanation.
        reason: String,
    },
}

impl ExtCssError {
    /// Syntax error for `selector`, the message quoting it.
    pub fn syntax(selector: &str, message: impl Into<String>) -> Self {
        Self::Syntax {
            selector: selector.to_string(),
            message: message.into(),
        }
    }

    /// The common "is not a valid selector" syntax error.
    pub fn invalid_selector(selector: &str) -> Self {
        Self::syntax(selector, format!("'{selector}' is not a valid selector"))
    }

    /// Argument error for `:pseudo_class()`.
    pub fn matcher_argument(pseudo_class: &str, message: impl Into<String>) -> Self {
        Self::MatcherArgument {
            pseudo_class: pseudo_class.to_string(),
            message: message.into(),
        }
    }

    /// Selection error for a fragment rejected by the host.
    pub fn selection(fragment: &str, reason: impl Into<String>) -> Self {
        Self::Selection {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from parsing, as opposed to querying.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}
