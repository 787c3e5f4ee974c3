//! Extended CSS selectors: a superset of standard CSS selectors queried
//! against a host document.
//!
//! # Scope
//!
//! This crate implements:
//! - **Tokenizer**: words and marks over a fixed alphabet, lossless.
//! - **Legacy converter**: `[-ext-name="value"]` attribute syntax and the
//!   `:matches-css-before()`/`:matches-css-after()` aliases.
//! - **Parser**: a single pass over the token stream building a
//!   [`SelectorList`](ast::SelectorList) of regular selectors and extended
//!   pseudo-classes.
//! - **Optimizer**: folds standard `:is()`/`:not()` back into regular
//!   selectors so the native engine evaluates them.
//! - **Query engine**: walks the AST against a [`DomHost`](extcss_dom::DomHost),
//!   simulating `:scope` queries for relative pseudo-classes.
//! - **Matchers**: `:contains()`, `:matches-css()`, `:matches-attr()`,
//!   `:matches-property()`, `:xpath()`, `:nth-ancestor()`, `:upward()`,
//!   `:has()`, `:is()`, `:not()`.
//! - **Style blocks**: `property: value` declaration lists.
//!
//! # Example
//!
//! ```
//! use extcss::ExtCssDocument;
//! use extcss_dom::{DomTree, ElementData};
//!
//! let mut tree = DomTree::new();
//! let html = tree.append_element(tree.root(), ElementData::new("html"));
//! let body = tree.append_element(html, ElementData::new("body"));
//! let banner = tree.append_element(body, ElementData::new("div").with_attr("class", "banner"));
//! let _ = tree.append_text(banner, "Sponsored");
//!
//! let document = ExtCssDocument::new(tree);
//! let found = document.query_selector_all("div:contains(Sponsored)").unwrap();
//! assert_eq!(found, vec![banner]);
//! ```

/// Selector syntax tree.
pub mod ast;
/// Legacy syntax normalization.
pub mod converter;
/// Cached selector queries over a host document.
pub mod document;
/// Error types.
pub mod error;
mod matcher;
/// AST optimization.
pub mod optimizer;
/// Extended selector parser.
pub mod parser;
/// Catalogue of extended pseudo-classes.
pub mod pseudo;
/// Query engine.
pub mod selector;
/// Style declaration blocks.
pub mod style_block;
/// Tokenizer for selectors and style blocks.
pub mod tokenizer;

pub use ast::SelectorList;
pub use converter::convert;
pub use document::ExtCssDocument;
pub use error::{ExtCssError, Result};
pub use optimizer::optimize;
pub use parser::{ParseOptions, parse, parse_with_options};
pub use pseudo::PseudoClass;
pub use selector::{query_selector_all, select_elements_by_ast};
pub use style_block::{StyleDeclaration, parse_style_block};
