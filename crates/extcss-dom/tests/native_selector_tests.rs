//! Integration tests for the native selector engine behind [`DomHost`].

use extcss_dom::{DomHost, DomTree, ElementData, NodeId};

struct Page {
    tree: DomTree,
    html: NodeId,
    body: NodeId,
    main: NodeId,
    first: NodeId,
    second: NodeId,
    quote: NodeId,
    items: [NodeId; 3],
    link: NodeId,
    input: NodeId,
    section: NodeId,
    digit: NodeId,
}

/// ```text
/// html
/// └── body
///     ├── div#main.content.box[data-kind=promo-top][lang=en-US]
///     │   ├── p.first              "Hello"
///     │   ├── p                    "World"
///     │   └── span[title='say "hi"']
///     ├── ul
///     │   ├── li "a"
///     │   ├── li "b"
///     │   └── li "c"
///     ├── a[href=/x]
///     ├── input[disabled]
///     ├── section
///     └── b.1x
/// ```
fn build_page() -> Page {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let main = tree.append_element(
        body,
        ElementData::new("div")
            .with_attr("id", "main")
            .with_attr("class", "content box")
            .with_attr("data-kind", "promo-top")
            .with_attr("lang", "en-US"),
    );
    let first = tree.append_element(main, ElementData::new("p").with_attr("class", "first"));
    let _ = tree.append_text(first, "Hello");
    let second = tree.append_element(main, ElementData::new("p"));
    let _ = tree.append_text(second, "World");
    let quote = tree.append_element(
        main,
        ElementData::new("span").with_attr("title", "say \"hi\""),
    );

    let list = tree.append_element(body, ElementData::new("ul"));
    let items = ["a", "b", "c"].map(|text| {
        let li = tree.append_element(list, ElementData::new("li"));
        let _ = tree.append_text(li, text);
        li
    });

    let link = tree.append_element(body, ElementData::new("a").with_attr("href", "/x"));
    let input = tree.append_element(body, ElementData::new("input").with_attr("disabled", ""));
    let section = tree.append_element(body, ElementData::new("section"));
    let digit = tree.append_element(body, ElementData::new("b").with_attr("class", "1x"));

    Page {
        tree,
        html,
        body,
        main,
        first,
        second,
        quote,
        items,
        link,
        input,
        section,
        digit,
    }
}

fn query(page: &Page, selector: &str) -> Vec<NodeId> {
    page.tree
        .query_selector_all(NodeId::ROOT, selector)
        .unwrap_or_else(|e| panic!("{selector}: {e}"))
}

fn reason(selector: &str) -> String {
    let page = build_page();
    page.tree
        .query_selector_all(NodeId::ROOT, selector)
        .expect_err(selector)
        .reason
}

// ========== Simple selectors ==========

#[test]
fn test_type_class_and_id() {
    let page = build_page();
    assert_eq!(query(&page, "p"), vec![page.first, page.second]);
    assert_eq!(query(&page, "DIV"), vec![page.main]);
    assert_eq!(query(&page, ".content.box"), vec![page.main]);
    assert_eq!(query(&page, "#main"), vec![page.main]);
    assert_eq!(query(&page, "div.missing"), Vec::<NodeId>::new());
}

#[test]
fn test_list_results_are_in_document_order() {
    let page = build_page();
    assert_eq!(query(&page, "p, div"), vec![page.main, page.first, page.second]);
    assert_eq!(query(&page, "p, p.first"), vec![page.first, page.second]);
}

#[test]
fn test_escaped_leading_digit() {
    let page = build_page();
    assert_eq!(query(&page, ".\\31 x"), vec![page.digit]);
}

// ========== Combinators ==========

#[test]
fn test_combinators() {
    let page = build_page();
    assert_eq!(query(&page, "body p"), vec![page.first, page.second]);
    assert_eq!(query(&page, "body > p"), Vec::<NodeId>::new());
    assert_eq!(query(&page, "div > p + p"), vec![page.second]);
    assert_eq!(query(&page, "ul + a"), vec![page.link]);
    assert_eq!(query(&page, "div ~ section"), vec![page.section]);
    assert_eq!(query(&page, "html>body>div>span"), vec![page.quote]);
}

#[test]
fn test_scope_from_document_is_the_document_element() {
    let page = build_page();
    assert_eq!(query(&page, ":scope > body"), vec![page.body]);
    assert_eq!(query(&page, ":scope"), vec![page.html]);
}

#[test]
fn test_scope_from_element() {
    let page = build_page();
    let found = page.tree.query_selector_all(page.main, ":scope > p").unwrap();
    assert_eq!(found, vec![page.first, page.second]);
    let found = page.tree.query_selector_all(page.main, "div p").unwrap();
    assert_eq!(found, vec![page.first, page.second]);
    // Descendants only: the root itself is never a result.
    let found = page.tree.query_selector_all(page.main, "div").unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_matches_uses_the_element_as_scope() {
    let page = build_page();
    assert_eq!(page.tree.matches(page.main, ":scope.content"), Ok(true));
    assert_eq!(page.tree.matches(page.first, "body p"), Ok(true));
    assert_eq!(page.tree.matches(page.second, "p:first-child"), Ok(false));
}

// ========== Attributes ==========

#[test]
fn test_attribute_operators() {
    let page = build_page();
    let main = vec![page.main];
    assert_eq!(query(&page, "[data-kind]"), main);
    assert_eq!(query(&page, "[DATA-KIND]"), main);
    assert_eq!(query(&page, "[data-kind=promo-top]"), main);
    assert_eq!(query(&page, "[data-kind^=promo]"), main);
    assert_eq!(query(&page, "[data-kind$=\"top\"]"), main);
    assert_eq!(query(&page, "[data-kind*='mo-t']"), main);
    assert_eq!(query(&page, "[lang|=en]"), main);
    assert_eq!(query(&page, "[class~=box]"), main);
    assert_eq!(query(&page, "[class~=con]"), Vec::<NodeId>::new());
    assert_eq!(query(&page, "[data-kind^='']"), Vec::<NodeId>::new());
}

#[test]
fn test_attribute_case_flag() {
    let page = build_page();
    assert_eq!(query(&page, "[lang=\"EN-us\"]"), Vec::<NodeId>::new());
    assert_eq!(query(&page, "[lang=\"EN-us\" i]"), vec![page.main]);
}

#[test]
fn test_quoted_attribute_value_with_escapes() {
    let page = build_page();
    assert_eq!(query(&page, r#"span[title="say \"hi\""]"#), vec![page.quote]);
    assert_eq!(query(&page, r#"[title='say "hi"']"#), vec![page.quote]);
}

// ========== Pseudo-classes ==========

#[test]
fn test_structural_pseudo_classes() {
    let page = build_page();
    let [a, b, c] = page.items;
    assert_eq!(query(&page, "li:first-child"), vec![a]);
    assert_eq!(query(&page, "li:last-child"), vec![c]);
    assert_eq!(query(&page, "li:nth-child(2)"), vec![b]);
    assert_eq!(query(&page, "li:nth-child(odd)"), vec![a, c]);
    assert_eq!(query(&page, "li:nth-child(-n+2)"), vec![a, b]);
    assert_eq!(query(&page, "li:nth-last-child(1)"), vec![c]);
    assert_eq!(query(&page, "p:first-of-type"), vec![page.first]);
    assert_eq!(query(&page, "span:only-of-type"), vec![page.quote]);
    assert_eq!(query(&page, ":root"), vec![page.html]);
}

#[test]
fn test_state_pseudo_classes() {
    let page = build_page();
    assert_eq!(query(&page, "section:empty"), vec![page.section]);
    assert_eq!(query(&page, "a:link"), vec![page.link]);
    assert_eq!(query(&page, "input:disabled"), vec![page.input]);
}

#[test]
fn test_not_and_is() {
    let page = build_page();
    let [_, b, c] = page.items;
    assert_eq!(query(&page, "li:not(:first-child)"), vec![b, c]);
    assert_eq!(query(&page, "p:is(.first, .missing)"), vec![page.first]);
    assert_eq!(query(&page, "p:where(.first)"), vec![page.first]);
    assert_eq!(query(&page, "div :is(p + p)"), vec![page.second]);
}

#[test]
fn test_is_is_forgiving_and_not_is_strict() {
    let page = build_page();
    assert_eq!(query(&page, "p:is(.first, :bogus)"), vec![page.first]);
    assert!(reason("p:not(:bogus)").contains("unknown pseudo-class ':bogus'"));
}

#[test]
fn test_never_matching_pseudos() {
    let page = build_page();
    let none = Vec::<NodeId>::new();
    assert_eq!(query(&page, "a:hover"), none);
    assert_eq!(query(&page, "div::before"), none);
    assert_eq!(query(&page, "div:before"), none);
    assert_eq!(query(&page, "input::-webkit-input-placeholder"), none);
}

// ========== Errors ==========

#[test]
fn test_rejected_selectors() {
    assert!(reason("> p").contains("without a left-hand compound"));
    assert!(reason("div > > p").contains("without a left-hand compound"));
    assert!(reason("div >").contains("ends with a combinator"));
    assert!(reason(":foo").contains("unknown pseudo-class ':foo'"));
    assert!(
        reason("div:contains(x)").contains("unsupported functional pseudo-class ':contains()'")
    );
    assert!(reason("div::bogus").contains("unknown pseudo-element '::bogus'"));
    assert!(reason("p,").contains("empty selector in list"));
    assert!(reason("div[").contains("unbalanced"));
    assert!(reason("li:nth-child(x)").contains("invalid argument"));
    assert!(reason("p*").contains("'*' must start"));
}

#[test]
fn test_error_display_names_the_whole_selector() {
    let page = build_page();
    let error = page.tree.query_selector_all(NodeId::ROOT, "p, > a").unwrap_err();
    assert_eq!(error.selector, "p, > a");
    assert!(error.to_string().starts_with("'p, > a' is not a valid selector: "));
    assert_eq!(page.tree.matches(page.first, ":foo").unwrap_err().selector, ":foo");
}
