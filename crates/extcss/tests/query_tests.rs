//! Integration tests for querying a document with extended selectors.

use std::collections::BTreeMap;

use extcss::{
    ExtCssError, ParseOptions, parse_with_options, query_selector_all, select_elements_by_ast,
};
use extcss_dom::{DomTree, ElementData, NodeId, PropertyValue};

/// Ids of the interesting elements of [`build_page`].
struct Page {
    tree: DomTree,
    html: NodeId,
    body: NodeId,
    banner: NodeId,
    label: NodeId,
    news: NodeId,
    paragraph: NodeId,
    title: NodeId,
    share: NodeId,
    footer: NodeId,
    deep: NodeId,
}

/// ```text
/// html
/// └── body
///     ├── div#banner.ad[data-slot=top]   "Sponsored content"  display: block
///     │   ├── img
///     │   └── span.label                 "Ad"
///     ├── div#news.post
///     │   ├── p                          "Hello world"
///     │   └── a[href=/read]              "Read more"
///     ├── h1.title                       "Title"
///     ├── div.share                      "Share"
///     └── div.footer                     ::before { content: "Ad" }
///         └── span#deep
/// ```
fn build_page() -> Page {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));

    let mut dataset = BTreeMap::new();
    let _ = dataset.insert("slot".to_string(), PropertyValue::from("top"));
    let _ = dataset.insert("position".to_string(), PropertyValue::from(1.0));
    let banner = tree.append_element(
        body,
        ElementData::new("div")
            .with_attr("id", "banner")
            .with_attr("class", "ad")
            .with_attr("data-slot", "top")
            .with_style("display", "block")
            .with_property("dataset", PropertyValue::Object(dataset)),
    );
    let _ = tree.append_text(banner, "Sponsored content");
    let _ = tree.append_element(banner, ElementData::new("img"));
    let label = tree.append_element(banner, ElementData::new("span").with_attr("class", "label"));
    let _ = tree.append_text(label, "Ad");

    let news = tree.append_element(
        body,
        ElementData::new("div")
            .with_attr("id", "news")
            .with_attr("class", "post"),
    );
    let paragraph = tree.append_element(news, ElementData::new("p"));
    let _ = tree.append_text(paragraph, "Hello world");
    let link = tree.append_element(news, ElementData::new("a").with_attr("href", "/read"));
    let _ = tree.append_text(link, "Read more");

    let title = tree.append_element(body, ElementData::new("h1").with_attr("class", "title"));
    let _ = tree.append_text(title, "Title");
    let share = tree.append_element(body, ElementData::new("div").with_attr("class", "share"));
    let _ = tree.append_text(share, "Share");
    let footer = tree.append_element(
        body,
        ElementData::new("div")
            .with_attr("class", "footer")
            .with_pseudo_style("before", "content", "\"Ad\""),
    );
    let deep = tree.append_element(footer, ElementData::new("span").with_attr("id", "deep"));

    Page {
        tree,
        html,
        body,
        banner,
        label,
        news,
        paragraph,
        title,
        share,
        footer,
        deep,
    }
}

fn select(page: &Page, selector: &str) -> Vec<NodeId> {
    query_selector_all(&page.tree, selector, NodeId::ROOT).unwrap()
}

fn select_unoptimized(page: &Page, selector: &str) -> Vec<NodeId> {
    let ast = parse_with_options(selector, ParseOptions { optimize: false }).unwrap();
    select_elements_by_ast(&page.tree, &ast, NodeId::ROOT).unwrap()
}

// ========== regular selectors ==========

#[test]
fn test_regular_selector_uses_native_query() {
    let page = build_page();
    assert_eq!(
        select(&page, "div"),
        vec![page.banner, page.news, page.share, page.footer]
    );
    assert_eq!(select(&page, "#news > p"), vec![page.paragraph]);
}

#[test]
fn test_selector_list_is_deduplicated_in_first_seen_order() {
    let page = build_page();
    assert_eq!(
        select(&page, ".share, div, h1"),
        vec![page.share, page.banner, page.news, page.footer, page.title]
    );
}

// ========== text ==========

#[test]
fn test_contains_substring() {
    let page = build_page();
    assert_eq!(select(&page, "div:contains(Sponsored)"), vec![page.banner]);
    assert_eq!(select(&page, "div:has-text(Hello)"), vec![page.news]);
    assert_eq!(select(&page, "div:-abp-contains(Share)"), vec![page.share]);
}

#[test]
fn test_contains_regexp() {
    let page = build_page();
    assert_eq!(select(&page, "div:contains(/^hello/i)"), vec![page.news]);
    assert_eq!(select(&page, "p:contains(/world$/)"), vec![page.paragraph]);
}

#[test]
fn test_naked_contains_matches_ancestors_too() {
    let page = build_page();
    assert_eq!(
        select(&page, ":contains(Hello)"),
        vec![page.html, page.body, page.news, page.paragraph]
    );
}

// ========== styles ==========

#[test]
fn test_matches_css() {
    let page = build_page();
    assert_eq!(select(&page, "div:matches-css(display: block)"), vec![page.banner]);
    assert_eq!(select(&page, "div:matches-css(display: /^bl/)"), vec![page.banner]);
    assert!(select(&page, "div:matches-css(display: none)").is_empty());
}

#[test]
fn test_matches_css_pseudo_element() {
    let page = build_page();
    assert_eq!(
        select(&page, "div:matches-css(before, content: Ad)"),
        vec![page.footer]
    );
    assert_eq!(
        select(&page, "div:matches-css-before(content: A*)"),
        vec![page.footer]
    );
    assert!(select(&page, "div:matches-css(after, content: Ad)").is_empty());
}

// ========== attributes and properties ==========

#[test]
fn test_matches_attr() {
    let page = build_page();
    assert_eq!(select(&page, "div:matches-attr(data-slot)"), vec![page.banner]);
    assert_eq!(
        select(&page, "div:matches-attr(\"data-*\"=\"t*\")"),
        vec![page.banner]
    );
    assert_eq!(select(&page, "div:matches-attr(\"/^data-/\")"), vec![page.banner]);
    assert!(select(&page, "div:matches-attr(data-slot=bottom)").is_empty());
}

#[test]
fn test_matches_property() {
    let page = build_page();
    assert_eq!(
        select(&page, "div:matches-property(dataset.slot=top)"),
        vec![page.banner]
    );
    assert_eq!(
        select(&page, "div:matches-property(dataset.position=1)"),
        vec![page.banner]
    );
    assert_eq!(
        select(&page, "div:matches-property(className=post)"),
        vec![page.news]
    );
    assert!(select(&page, "div:matches-property(dataset.missing)").is_empty());
}

// ========== ancestors and xpath ==========

#[test]
fn test_upward_by_selector() {
    let page = build_page();
    assert_eq!(select(&page, "span:upward(div)"), vec![page.banner, page.footer]);
    assert_eq!(select(&page, "#deep:upward(body > div)"), vec![page.footer]);
}

#[test]
fn test_upward_and_nth_ancestor_by_depth() {
    let page = build_page();
    assert_eq!(select(&page, "span:nth-ancestor(2)"), vec![page.body]);
    assert_eq!(select(&page, "span:upward(1)"), vec![page.banner, page.footer]);
    assert!(select(&page, "span:nth-ancestor(10)").is_empty());
}

#[test]
fn test_xpath() {
    let page = build_page();
    assert_eq!(
        select(&page, r#":xpath(//h1[@class="title"])"#),
        vec![page.title]
    );
    assert_eq!(select(&page, "img:xpath(..)"), vec![page.banner]);
}

// ========== relative pseudo-classes ==========

#[test]
fn test_has() {
    let page = build_page();
    assert_eq!(select(&page, "div:has(> img)"), vec![page.banner]);
    assert_eq!(select(&page, "div:has(span)"), vec![page.banner, page.footer]);
    assert_eq!(select(&page, "div:has(*)"), vec![page.banner, page.news, page.footer]);
}

#[test]
fn test_has_requires_every_selector() {
    let page = build_page();
    assert_eq!(select(&page, "div:has(img, .label)"), vec![page.banner]);
    assert!(select(&page, "div:has(img, p)").is_empty());
}

#[test]
fn test_has_with_sibling_combinators() {
    let page = build_page();
    assert_eq!(select(&page, "h1:has(+ .share)"), vec![page.title]);
    assert_eq!(select(&page, "div:has(+ h1)"), vec![page.news]);
    assert_eq!(
        select(&page, "div:has(~ .footer)"),
        vec![page.banner, page.news, page.share]
    );
}

#[test]
fn test_has_with_extended_argument() {
    let page = build_page();
    assert_eq!(select(&page, "div:has(> p:contains(Hello))"), vec![page.news]);
    assert_eq!(select(&page, "body:has(.label:contains(Ad))"), vec![page.body]);
}

#[test]
fn test_has_sibling_without_parent_is_an_error() {
    let page = build_page();
    let result = query_selector_all(&page.tree, "html:has(~ body)", NodeId::ROOT);
    assert!(matches!(result, Err(ExtCssError::Selection { .. })));
}

#[test]
fn test_is() {
    let page = build_page();
    assert_eq!(select(&page, "div:is(.post, .share)"), vec![page.news, page.share]);
    assert_eq!(
        select(&page, "div:is(.post, :contains(Share))"),
        vec![page.news, page.share]
    );
}

#[test]
fn test_not() {
    let page = build_page();
    assert_eq!(
        select(&page, "div:not(:contains(Ad))"),
        vec![page.news, page.share, page.footer]
    );
    assert_eq!(
        select(&page, "div:not(:has(span))"),
        vec![page.news, page.share]
    );
}

#[test]
fn test_is_never_matches_the_root_element() {
    let page = build_page();
    assert!(select_unoptimized(&page, "*:is(html)").is_empty());
    assert!(select(&page, "*:is(html)").is_empty());
}

// ========== continuation after extended pseudo-classes ==========

#[test]
fn test_descendant_after_extended() {
    let page = build_page();
    assert_eq!(select(&page, "div:contains(Hello) p"), vec![page.paragraph]);
}

#[test]
fn test_child_after_extended() {
    let page = build_page();
    assert_eq!(select(&page, "div:has(img) > span"), vec![page.label]);
}

#[test]
fn test_sibling_after_extended() {
    let page = build_page();
    assert_eq!(select(&page, "div:contains(Hello) + h1"), vec![page.title]);
    assert_eq!(
        select(&page, "div:contains(Hello) ~ div"),
        vec![page.share, page.footer]
    );
    assert!(select(&page, "div:contains(Share) ~ h1").is_empty());
}

/// ```text
/// html
/// └── body
///     ├── div.a   "foo"
///     ├── p
///     ├── div.a   "bar"
///     └── span.x
/// ```
fn build_twin_page() -> (DomTree, [NodeId; 4]) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let foo = tree.append_element(body, ElementData::new("div").with_attr("class", "a"));
    let _ = tree.append_text(foo, "foo");
    let p = tree.append_element(body, ElementData::new("p"));
    let bar = tree.append_element(body, ElementData::new("div").with_attr("class", "a"));
    let _ = tree.append_text(bar, "bar");
    let span = tree.append_element(body, ElementData::new("span").with_attr("class", "x"));
    (tree, [foo, p, bar, span])
}

#[test]
fn test_adjacent_sibling_after_extended_ignores_twins() {
    let (tree, [_, _, _, span]) = build_twin_page();
    let select = |selector| query_selector_all(&tree, selector, NodeId::ROOT).unwrap();
    assert!(select("div.a:contains(foo) + span.x").is_empty());
    assert_eq!(select("div.a:contains(bar) + span.x"), vec![span]);
    assert_eq!(select("div.a:contains(foo) ~ span.x"), vec![span]);
}

#[test]
fn test_has_adjacent_sibling_ignores_twins() {
    let (tree, [foo, _, bar, _]) = build_twin_page();
    let select = |selector| query_selector_all(&tree, selector, NodeId::ROOT).unwrap();
    assert_eq!(select("div.a:has(+ span.x)"), vec![bar]);
    assert_eq!(select("div.a:has(~ span.x)"), vec![foo, bar]);
    assert!(select("div.a:has(+ div.a)").is_empty());
}

#[test]
fn test_compound_continues_after_extended() {
    let page = build_page();
    assert_eq!(select(&page, "div:has(img).ad"), vec![page.banner]);
    assert!(select(&page, "div:has(img).post").is_empty());
}

// ========== optimizer neutrality ==========

#[test]
fn test_optimized_and_unoptimized_trees_agree() {
    let page = build_page();
    for selector in [
        "div:not(.ad)",
        "div:is(.post, .share)",
        "*:not(div)",
        "div:not(.ad, .share)",
        "span:is(.label)",
        "*:is(.title, #deep)",
        "html:not(.x)",
        "*:not(.x)",
        ".ad:not(p)",
        "div:is(body > div)",
        "span:not(div > span)",
    ] {
        assert_eq!(
            select(&page, selector),
            select_unoptimized(&page, selector),
            "results differ for {selector}"
        );
    }
}

// ========== errors ==========

#[test]
fn test_is_swallows_invalid_branch() {
    let page = build_page();
    assert_eq!(select(&page, "div:is(> .x, .post)"), vec![page.news]);
}

#[test]
fn test_not_propagates_invalid_branch() {
    let page = build_page();
    let result = query_selector_all(&page.tree, "div:not(> .x)", NodeId::ROOT);
    assert!(matches!(result, Err(ExtCssError::Selection { .. })));
}

#[test]
fn test_native_rejection_is_a_selection_error() {
    let page = build_page();
    let result = query_selector_all(&page.tree, "div:foo(1):contains(x)", NodeId::ROOT);
    let Err(ExtCssError::Selection { fragment, .. }) = result else {
        panic!("expected a selection error, got {result:?}");
    };
    assert_eq!(fragment, "div:foo(1)");
}

#[test]
fn test_rejected_continuation_names_the_scoped_fragment() {
    let page = build_page();
    let result = query_selector_all(&page.tree, "div:contains(Hello) > p:foo(1)", NodeId::ROOT);
    let Err(ExtCssError::Selection { fragment, .. }) = result else {
        panic!("expected a selection error, got {result:?}");
    };
    assert!(fragment.starts_with(":scope"), "{fragment}");
    assert!(fragment.ends_with("p:foo(1)"), "{fragment}");
}

#[test]
fn test_invalid_matcher_arguments() {
    let page = build_page();
    for selector in [
        "div:nth-ancestor(0)",
        "div:nth-ancestor(256)",
        "div:upward(0)",
        "div:matches-attr(*)",
        "div:matches-css(display)",
        "div:contains(/(/)",
        "div:xpath(//[)",
        "div:matches-property(a\\.b)",
    ] {
        let result = query_selector_all(&page.tree, selector, NodeId::ROOT);
        assert!(
            matches!(result, Err(ExtCssError::MatcherArgument { .. })),
            "expected an argument error for {selector}, got {result:?}"
        );
    }
}

#[test]
fn test_query_from_element_root() {
    let page = build_page();
    let found = query_selector_all(&page.tree, "span:contains(Ad)", page.banner).unwrap();
    assert_eq!(found, vec![page.label]);
    let found = query_selector_all(&page.tree, "span", page.footer).unwrap();
    assert_eq!(found, vec![page.deep]);
}
