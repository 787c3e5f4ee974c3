//! JSON descriptions of documents.
//!
//! A fixture is the document element written as nested objects; a bare
//! string in `children` is a text node:
//!
//! ```json
//! {
//!   "tag": "html",
//!   "children": [{
//!     "tag": "body",
//!     "children": [
//!       { "tag": "div", "attrs": { "id": "ad" },
//!         "styles": { "display": "block" },
//!         "pseudo_styles": { "before": { "content": "\"Ad\"" } },
//!         "properties": { "dataset": { "slot": "top" } },
//!         "children": ["Sponsored"] }
//!     ]
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

use crate::property::PropertyValue;
use crate::{DomTree, ElementData, NodeId};

/// Errors from loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The input is not valid fixture JSON.
    #[error("invalid document fixture: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level value is a text node.
    #[error("the document element must be an element, not text")]
    TextRoot,
}

/// One node of a fixture.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeFixture {
    /// A text node.
    Text(String),
    /// An element with its subtree.
    Element(ElementFixture),
}

/// An element of a fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementFixture {
    /// Local name.
    pub tag: String,
    /// Attributes.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Text inserted before the children.
    #[serde(default)]
    pub text: Option<String>,
    /// Computed style of the element.
    #[serde(default)]
    pub styles: HashMap<String, String>,
    /// Computed styles of pseudo-elements.
    #[serde(default)]
    pub pseudo_styles: HashMap<String, HashMap<String, String>>,
    /// Expando properties of the element object.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

/// Build a document from fixture JSON.
///
/// # Errors
/// Returns an error if the JSON does not describe an element tree.
pub fn load_fixture(json: &str) -> Result<DomTree, FixtureError> {
    let root: NodeFixture = serde_json::from_str(json)?;
    let NodeFixture::Element(root) = root else {
        return Err(FixtureError::TextRoot);
    };
    let mut tree = DomTree::new();
    append_fixture(&mut tree, NodeId::ROOT, root);
    Ok(tree)
}

fn append_fixture(tree: &mut DomTree, parent: NodeId, fixture: ElementFixture) {
    let mut data = ElementData::new(&fixture.tag);
    data.attrs = fixture.attrs.into_iter().collect();
    data.styles = fixture.styles;
    data.pseudo_styles = fixture
        .pseudo_styles
        .into_iter()
        .map(|(pseudo, styles)| (pseudo.trim_start_matches(':').to_ascii_lowercase(), styles))
        .collect();
    data.properties = fixture.properties;

    let id = tree.append_element(parent, data);
    if let Some(text) = fixture.text {
        let _ = tree.append_text(id, &text);
    }
    for child in fixture.children {
        match child {
            NodeFixture::Text(text) => {
                let _ = tree.append_text(id, &text);
            }
            NodeFixture::Element(element) => append_fixture(tree, id, element),
        }
    }
}
