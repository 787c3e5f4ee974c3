//! `:xpath(expression)`

use extcss_dom::{DomHost, XPathError};

use crate::error::{ExtCssError, Result};

const PSEUDO_CLASS: &str = "xpath";

/// Evaluate `expression` from every element and collect the resulting
/// elements. The expression is validated once, before any evaluation.
pub(crate) fn select<H: DomHost>(
    host: &H,
    elements: &[H::Node],
    expression: &str,
) -> Result<Vec<H::Node>> {
    let invalid = |e: XPathError| {
        ExtCssError::matcher_argument(PSEUDO_CLASS, format!("'{expression}': {e}"))
    };
    host.validate_xpath(expression).map_err(invalid)?;
    let mut found = Vec::new();
    for &element in elements {
        found.extend(host.evaluate_xpath(element, expression).map_err(invalid)?);
    }
    Ok(found)
}
