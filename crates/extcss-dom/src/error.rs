use thiserror::Error;

/// A selector rejected by the native selector engine, the equivalent of the
/// `SyntaxError` thrown by `querySelectorAll()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{selector}' is not a valid selector: {reason}")]
pub struct NativeSelectorError {
    /// The selector text as given to the engine.
    pub selector: String,
    /// What the engine could not parse.
    pub reason: String,
}

impl NativeSelectorError {
    /// Create an error for `selector`.
    pub fn new(selector: &str, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from the XPath evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The expression is not well formed.
    #[error("'{expression}' is not a valid XPath expression: {reason}")]
    Syntax {
        /// The expression text.
        expression: String,
        /// What went wrong.
        reason: String,
    },
    /// The expression is well formed but uses a feature the evaluator lacks.
    #[error("XPath feature not supported in '{expression}': {feature}")]
    Unsupported {
        /// The expression text.
        expression: String,
        /// The missing feature.
        feature: String,
    },
}
