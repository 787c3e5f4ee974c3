//! Native CSS selector parsing and matching
//!
//! This module implements the reference host's `querySelectorAll()` per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/). It deliberately
//! behaves like a browser engine without `:has()` support: selectors that
//! start with a combinator, unknown pseudo-classes and malformed syntax are
//! rejected with a [`NativeSelectorError`](crate::NativeSelectorError).

mod parser;

pub use parser::{parse_selector_list, split_selector_groups};

use crate::{DomTree, ElementData, NodeId, NodeType};

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A selector list is a comma-separated list of selectors; it represents
/// the union of the elements represented by each selector in the list."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// The complex selectors of the list.
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Whether any selector of the list matches `node_id`. `scope` is the
    /// element `:scope` refers to (the document stands for its root element).
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId, scope: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.matches_in_tree(tree, node_id, scope))
    }
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Examples: `div`, `p`, `span`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.highlight`, `.banner`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#main`, `#ad-slot`
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// Pseudo-class or pseudo-element that always fails to match in a static
    /// document: interactive states (`:hover`, `:focus`) and pseudo-elements
    /// (`::before`, `::part()`), which never represent elements.
    NeverMatch,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    PseudoClass(PseudoClass),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
}

/// Pseudo-classes per [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    Root,
    /// [§ 8.4 :scope](https://www.w3.org/TR/selectors-4/#the-scope-pseudo)
    /// "The :scope pseudo-class represents any element that is a :scope element."
    Scope,
    /// [§ 14.4.1 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [§ 14.4.2 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [§ 14.4.3 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,
    /// [§ 14.5.3 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 14.5.4 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 14.5.5 :only-of-type](https://www.w3.org/TR/selectors-4/#the-only-of-type-pseudo)
    OnlyOfType,
    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    Empty,
    /// [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#the-link-pseudo)
    Link,
    /// `:disabled`: form element with the disabled attribute
    Disabled,
    /// `:enabled`: form element without the disabled attribute
    Enabled,
    /// `:checked`: element with the checked or selected attribute
    Checked,
    /// [§ 14.4.4 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    NthChild(NthExpr),
    /// [§ 14.4.5 :nth-last-child()](https://www.w3.org/TR/selectors-4/#the-nth-last-child-pseudo)
    NthLastChild(NthExpr),
    /// [§ 14.5.1 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
    NthOfType(NthExpr),
    /// [§ 14.5.2 :nth-last-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-last-of-type-pseudo)
    NthLastOfType(NthExpr),
    /// [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
    Not(SelectorList),
    /// [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches) and `:where()`
    Is(SelectorList),
}

/// [§ 14.4 The An+B notation](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpr {
    /// Step.
    pub a: i64,
    /// Offset.
    pub b: i64,
}

impl NthExpr {
    /// Whether the 1-based `index` is represented by `An+B` for some n ≥ 0.
    #[must_use]
    pub const fn matches(self, index: i64) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let diff = index - self.b;
        diff % self.a == 0 && diff / self.a >= 0
    }
}

/// Attribute selector operators per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals,
    /// `[attr~=value]`
    Includes,
    /// `[attr|=value]`
    DashMatch,
    /// `[attr^=value]`
    PrefixMatch,
    /// `[attr$=value]`
    SuffixMatch,
    /// `[attr*=value]`
    SubstringMatch,
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name, matched ASCII case-insensitively.
    pub name: String,
    /// The operator.
    pub operator: AttributeOperator,
    /// The unescaped value (empty for [`AttributeOperator::Exists`]).
    pub value: String,
    /// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
    /// The `i` flag.
    pub case_insensitive: bool,
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element
            .attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&self.name))
            .map(|(_, v)| v)
        else {
            return false;
        };
        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.clone(), self.value.clone())
        };
        match self.operator {
            AttributeOperator::Exists => true,
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => {
                !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeOperator::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
            // "If 'val' is the empty string then the selector does not represent anything."
            AttributeOperator::PrefixMatch => !expected.is_empty() && actual.starts_with(&expected),
            AttributeOperator::SuffixMatch => !expected.is_empty() && actual.ends_with(&expected),
            AttributeOperator::SubstringMatch => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    Descendant,
    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    Child,
    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    NextSibling,
    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors separated
/// by combinators."
///
/// For `A > B C` the subject is `C` and the chain is
/// `[(Descendant, B), (Child, A)]`: right-to-left, the order matching walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,
    /// Chain of (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match the selector against an element with full DOM tree context.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId, scope: NodeId) -> bool {
        compound_matches_in_tree(&self.subject, tree, node_id, scope)
            && self.matches_combinators(0, tree, node_id, scope)
    }

    /// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
    ///
    /// Match the chain from position `index` leftwards. Descendant and
    /// subsequent-sibling steps try every candidate so that an early partial
    /// match does not hide a later full one.
    fn matches_combinators(
        &self,
        index: usize,
        tree: &DomTree,
        current_id: NodeId,
        scope: NodeId,
    ) -> bool {
        let Some((combinator, compound)) = self.combinators.get(index) else {
            return true;
        };
        let step = |candidate: NodeId| {
            compound_matches_in_tree(compound, tree, candidate, scope)
                && self.matches_combinators(index + 1, tree, candidate, scope)
        };
        match combinator {
            Combinator::Descendant => tree.ancestors(current_id).any(step),
            Combinator::Child => tree.parent(current_id).is_some_and(step),
            Combinator::NextSibling => {
                find_previous_element_sibling(tree, current_id).is_some_and(step)
            }
            Combinator::SubsequentSibling => tree
                .preceding_siblings(current_id)
                .filter(|&s| tree.as_element(s).is_some())
                .any(step),
        }
    }
}

/// Check if a compound selector matches an element.
fn compound_matches_in_tree(
    compound: &CompoundSelector,
    tree: &DomTree,
    node_id: NodeId,
    scope: NodeId,
) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
        SimpleSelector::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
        // [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
        SimpleSelector::Class(class_name) => element.classes().contains(class_name.as_str()),
        // [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
        SimpleSelector::Id(id) => element.id().is_some_and(|el_id| el_id == id),
        SimpleSelector::Universal => true,
        SimpleSelector::NeverMatch => false,
        SimpleSelector::Attribute(attr) => attr.matches(element),
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(pc, tree, node_id, element, scope),
    })
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
fn pseudo_class_matches(
    pc: &PseudoClass,
    tree: &DomTree,
    node_id: NodeId,
    element: &ElementData,
    scope: NodeId,
) -> bool {
    let same_type = |c: NodeId| {
        tree.as_element(c)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };
    match pc {
        PseudoClass::Root => tree.document_element() == Some(node_id),

        // [§ 8.4 :scope](https://www.w3.org/TR/selectors-4/#the-scope-pseudo)
        // "If this is not the case, :scope represents the root of the document."
        PseudoClass::Scope => {
            node_id == scope
                || (tree.as_element(scope).is_none() && tree.document_element() == Some(node_id))
        }

        PseudoClass::FirstChild => sibling_index(tree, node_id, false, |_| true) == Some(1),
        PseudoClass::LastChild => sibling_index(tree, node_id, true, |_| true) == Some(1),
        PseudoClass::OnlyChild => {
            sibling_index(tree, node_id, false, |_| true) == Some(1)
                && sibling_index(tree, node_id, true, |_| true) == Some(1)
        }
        PseudoClass::FirstOfType => sibling_index(tree, node_id, false, same_type) == Some(1),
        PseudoClass::LastOfType => sibling_index(tree, node_id, true, same_type) == Some(1),
        PseudoClass::OnlyOfType => {
            sibling_index(tree, node_id, false, same_type) == Some(1)
                && sibling_index(tree, node_id, true, same_type) == Some(1)
        }
        PseudoClass::NthChild(nth) => {
            sibling_index(tree, node_id, false, |_| true).is_some_and(|i| nth.matches(i))
        }
        PseudoClass::NthLastChild(nth) => {
            sibling_index(tree, node_id, true, |_| true).is_some_and(|i| nth.matches(i))
        }
        PseudoClass::NthOfType(nth) => {
            sibling_index(tree, node_id, false, same_type).is_some_and(|i| nth.matches(i))
        }
        PseudoClass::NthLastOfType(nth) => {
            sibling_index(tree, node_id, true, same_type).is_some_and(|i| nth.matches(i))
        }

        // [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
        // "The :empty pseudo-class represents an element that has no children
        // except, optionally, document white space characters."
        PseudoClass::Empty => tree
            .children(node_id)
            .iter()
            .all(|&c| match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.trim().is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }),

        PseudoClass::Link => {
            matches!(element.tag_name.as_str(), "a" | "area")
                && element.attrs.contains_key("href")
        }
        PseudoClass::Disabled => element.attrs.contains_key("disabled"),
        PseudoClass::Enabled => !element.attrs.contains_key("disabled"),
        PseudoClass::Checked => {
            element.attrs.contains_key("checked") || element.attrs.contains_key("selected")
        }
        PseudoClass::Not(list) => !list.matches_in_tree(tree, node_id, scope),
        PseudoClass::Is(list) => list.matches_in_tree(tree, node_id, scope),
    }
}

/// 1-based position of `node_id` among its element siblings that satisfy
/// `filter`, counted from the end when `from_end` is set. `None` when the
/// element has no parent.
fn sibling_index(
    tree: &DomTree,
    node_id: NodeId,
    from_end: bool,
    filter: impl Fn(NodeId) -> bool,
) -> Option<i64> {
    let _ = tree.parent(node_id)?;
    let siblings = if from_end {
        tree.following_siblings(node_id)
    } else {
        tree.preceding_siblings(node_id)
    };
    let before = siblings
        .filter(|&s| tree.as_element(s).is_some() && filter(s))
        .count();
    i64::try_from(before).ok().map(|n| n + 1)
}

/// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
///
/// Find the immediately preceding element sibling (skipping text/comment nodes).
fn find_previous_element_sibling(tree: &DomTree, node_id: NodeId) -> Option<NodeId> {
    tree.preceding_siblings(node_id)
        .find(|&sibling_id| tree.as_element(sibling_id).is_some())
}
