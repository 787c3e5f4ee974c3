//! The document surface the selector engine queries.
//!
//! The engine never mutates a document and never walks it on its own beyond
//! parent and sibling links: everything else goes through the host's native
//! primitives, the same way a browser-side implementation would call
//! `querySelectorAll()`, `getComputedStyle()` and `document.evaluate()`.

use core::fmt::Debug;
use core::hash::Hash;

use crate::error::{NativeSelectorError, XPathError};
use crate::property::PropertyValue;
use crate::{DomTree, NodeId, native, xpath};

/// A document the extended selector engine can run against.
///
/// `Node` is a cheap handle covering both the document and its elements;
/// the engine uses it as a set key, so it must be `Copy + Eq + Hash`.
pub trait DomHost {
    /// Handle to a document or element node.
    type Node: Copy + Eq + Hash + Debug;

    /// The document node, the default query root.
    fn document(&self) -> Self::Node;

    /// [§ 4.2.6 querySelectorAll()](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
    ///
    /// Elements that are descendants of `root` and match `selector`, in tree
    /// order. `:scope` refers to `root`.
    ///
    /// # Errors
    /// Returns an error if the native engine cannot parse `selector`.
    fn query_selector_all(
        &self,
        root: Self::Node,
        selector: &str,
    ) -> Result<Vec<Self::Node>, NativeSelectorError>;

    /// [§ 4.9 matches()](https://dom.spec.whatwg.org/#dom-element-matches)
    ///
    /// # Errors
    /// Returns an error if the native engine cannot parse `selector`.
    fn matches(&self, element: Self::Node, selector: &str) -> Result<bool, NativeSelectorError>;

    /// Parent element, `None` for the document element and the document.
    fn parent_element(&self, element: Self::Node) -> Option<Self::Node>;

    /// Next sibling that is an element.
    fn next_element_sibling(&self, element: Self::Node) -> Option<Self::Node>;

    /// Lower-case local name of an element.
    fn tag_name(&self, element: Self::Node) -> String;

    /// Attribute list of an element as `(name, value)` pairs.
    fn attributes(&self, element: Self::Node) -> Vec<(String, String)>;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, element: Self::Node) -> String;

    /// Computed value of `property` for the element, or for one of its
    /// pseudo-elements when `pseudo_element` is given (e.g. `::before`).
    fn computed_style(
        &self,
        element: Self::Node,
        pseudo_element: Option<&str>,
        property: &str,
    ) -> String;

    /// The element object whose property graph `:matches-property()` walks.
    fn property_root(&self, element: Self::Node) -> PropertyValue;

    /// Evaluate `expression` with `context` as the context node and return
    /// the element nodes of the result.
    ///
    /// # Errors
    /// Returns an error if the expression is invalid or unsupported.
    fn evaluate_xpath(
        &self,
        context: Self::Node,
        expression: &str,
    ) -> Result<Vec<Self::Node>, XPathError>;

    /// Check an expression without caring about its result.
    ///
    /// # Errors
    /// Returns an error if the expression is invalid or unsupported.
    fn validate_xpath(&self, expression: &str) -> Result<(), XPathError> {
        self.evaluate_xpath(self.document(), expression).map(|_| ())
    }
}

impl DomHost for DomTree {
    type Node = NodeId;

    fn document(&self) -> NodeId {
        NodeId::ROOT
    }

    fn query_selector_all(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, NativeSelectorError> {
        let list = native::parse_selector_list(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|&id| list.matches_in_tree(self, id, root))
            .collect())
    }

    fn matches(&self, element: NodeId, selector: &str) -> Result<bool, NativeSelectorError> {
        let list = native::parse_selector_list(selector)?;
        Ok(list.matches_in_tree(self, element, element))
    }

    fn parent_element(&self, element: NodeId) -> Option<NodeId> {
        Self::parent_element(self, element)
    }

    fn next_element_sibling(&self, element: NodeId) -> Option<NodeId> {
        self.following_siblings(element)
            .find(|&s| self.as_element(s).is_some())
    }

    fn tag_name(&self, element: NodeId) -> String {
        self.as_element(element)
            .map(|e| e.tag_name.clone())
            .unwrap_or_default()
    }

    fn attributes(&self, element: NodeId) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = self
            .as_element(element)
            .map(|e| {
                e.attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        attrs.sort();
        attrs
    }

    fn text_content(&self, element: NodeId) -> String {
        Self::text_content(self, element)
    }

    fn computed_style(
        &self,
        element: NodeId,
        pseudo_element: Option<&str>,
        property: &str,
    ) -> String {
        self.as_element(element)
            .map(|e| e.computed_style(pseudo_element, property))
            .unwrap_or_default()
    }

    fn property_root(&self, element: NodeId) -> PropertyValue {
        Self::property_root(self, element)
    }

    fn evaluate_xpath(&self, context: NodeId, expression: &str) -> Result<Vec<NodeId>, XPathError> {
        xpath::evaluate(self, context, expression)
    }

    fn validate_xpath(&self, expression: &str) -> Result<(), XPathError> {
        xpath::compile(expression).map(|_| ())
    }
}
