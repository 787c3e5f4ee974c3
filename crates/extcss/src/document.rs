//! A host document paired with a selector cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use extcss_common::warning;
use extcss_dom::DomHost;

use crate::ast::SelectorList;
use crate::error::Result;
use crate::parser::parse;
use crate::selector::select_elements_by_ast;

/// Queries a host document, parsing each distinct selector once.
///
/// The cache belongs to the instance. Parsed lists are shared as
/// `Arc<SelectorList>` and never change after insertion, so two lookups of
/// the same selector return the same allocation.
#[derive(Debug)]
pub struct ExtCssDocument<H: DomHost> {
    host: H,
    cache: RwLock<HashMap<String, Arc<SelectorList>>>,
}

impl<H: DomHost> ExtCssDocument<H> {
    /// Wrap a host with an empty cache.
    pub fn new(host: H) -> Self {
        Self {
            host,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Parse `selector`, or return the cached list for it.
    ///
    /// Failed parses are not cached.
    ///
    /// # Errors
    /// Returns the syntax error of an invalid selector.
    pub fn parse(&self, selector: &str) -> Result<Arc<SelectorList>> {
        if let Some(ast) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(selector)
        {
            return Ok(Arc::clone(ast));
        }

        let parsed = Arc::new(parse(selector)?);
        if warning::debug_enabled() {
            warning::debug("cache", &format!("parsed '{selector}' as '{parsed}'"));
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // another thread may have published first; keep its list
        let ast = cache.entry(selector.to_string()).or_insert(parsed);
        Ok(Arc::clone(ast))
    }

    /// Select every matching element of the document.
    ///
    /// # Errors
    /// See [`crate::query_selector_all`].
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<H::Node>> {
        self.query_selector_all_in(selector, self.host.document())
    }

    /// Select every matching element under `root`.
    ///
    /// # Errors
    /// See [`crate::query_selector_all`].
    pub fn query_selector_all_in(&self, selector: &str, root: H::Node) -> Result<Vec<H::Node>> {
        let ast = self.parse(selector)?;
        select_elements_by_ast(&self.host, &ast, root)
    }

    /// Number of cached selectors.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every cached selector.
    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
