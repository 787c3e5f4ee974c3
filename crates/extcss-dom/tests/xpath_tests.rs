//! Integration tests for the XPath evaluator.

use extcss_dom::xpath::{compile, evaluate};
use extcss_dom::{DomHost, DomTree, ElementData, NodeId, XPathError};

struct Page {
    tree: DomTree,
    body: NodeId,
    main: NodeId,
    title: NodeId,
    hello: NodeId,
    world: NodeId,
    items: [NodeId; 3],
    link: NodeId,
    footer: NodeId,
}

/// ```text
/// html
/// └── body
///     ├── div#main[lang=en]
///     │   ├── h1.title        "Title"
///     │   ├── p               "  Hello   there "
///     │   └── p               "World"
///     ├── ul
///     │   ├── li "a"
///     │   ├── li "b"
///     │   └── li "c"
///     ├── a[href=/x]
///     └── footer
/// ```
fn build_page() -> Page {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let main = tree.append_element(
        body,
        ElementData::new("div")
            .with_attr("id", "main")
            .with_attr("lang", "en"),
    );
    let title = tree.append_element(main, ElementData::new("h1").with_attr("class", "title"));
    let _ = tree.append_text(title, "Title");
    let hello = tree.append_element(main, ElementData::new("p"));
    let _ = tree.append_text(hello, "  Hello   there ");
    let world = tree.append_element(main, ElementData::new("p"));
    let _ = tree.append_text(world, "World");

    let list = tree.append_element(body, ElementData::new("ul"));
    let items = ["a", "b", "c"].map(|text| {
        let li = tree.append_element(list, ElementData::new("li"));
        let _ = tree.append_text(li, text);
        li
    });
    let link = tree.append_element(body, ElementData::new("a").with_attr("href", "/x"));
    let footer = tree.append_element(body, ElementData::new("footer"));

    Page {
        tree,
        body,
        main,
        title,
        hello,
        world,
        items,
        link,
        footer,
    }
}

fn xpath(page: &Page, expression: &str) -> Vec<NodeId> {
    evaluate(&page.tree, NodeId::ROOT, expression)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

// ========== Paths ==========

#[test]
fn test_absolute_paths() {
    let page = build_page();
    assert_eq!(xpath(&page, "/html/body/div"), vec![page.main]);
    assert_eq!(xpath(&page, "//p"), vec![page.hello, page.world]);
    assert_eq!(xpath(&page, "//DIV"), vec![page.main]);
    assert_eq!(xpath(&page, "/html/p"), Vec::<NodeId>::new());
}

#[test]
fn test_relative_paths_from_an_element() {
    let page = build_page();
    let found = evaluate(&page.tree, page.main, "./p").unwrap();
    assert_eq!(found, vec![page.hello, page.world]);
    let found = evaluate(&page.tree, page.main, "..").unwrap();
    assert_eq!(found, vec![page.body]);
    let found = evaluate(&page.tree, page.main, "../..").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(page.tree.tag_name(found[0]), "html");
}

#[test]
fn test_document_is_never_a_result() {
    let page = build_page();
    let found = evaluate(&page.tree, page.body, "../..").unwrap();
    assert!(found.is_empty());
    assert!(xpath(&page, "/").is_empty());
}

#[test]
fn test_union_is_in_document_order() {
    let page = build_page();
    assert_eq!(xpath(&page, "//footer | //a"), vec![page.link, page.footer]);
    assert_eq!(xpath(&page, "//a | //a"), vec![page.link]);
}

// ========== Axes ==========

#[test]
fn test_axes() {
    let page = build_page();
    let [a, b, c] = page.items;
    assert_eq!(xpath(&page, "//li[1]/following-sibling::li"), vec![b, c]);
    assert_eq!(xpath(&page, "//h1/ancestor::div"), vec![page.main]);
    assert_eq!(xpath(&page, "//li[3]/preceding-sibling::li[1]"), vec![b]);
    assert_eq!(xpath(&page, "//ul/following::*"), vec![page.link, page.footer]);
    assert_eq!(xpath(&page, "//div/descendant::p"), vec![page.hello, page.world]);
    assert_eq!(xpath(&page, "//li[2]/self::li"), vec![b]);
    assert_eq!(xpath(&page, "//li/parent::*/child::li[last()]"), vec![c]);
    assert_eq!(xpath(&page, "//li[1]/ancestor-or-self::ul/li[1]"), vec![a]);
}

// ========== Predicates ==========

#[test]
fn test_positional_predicates() {
    let page = build_page();
    let [a, b, c] = page.items;
    assert_eq!(xpath(&page, "//li[2]"), vec![b]);
    assert_eq!(xpath(&page, "//li[last()]"), vec![c]);
    assert_eq!(xpath(&page, "//li[position() > 1]"), vec![b, c]);
    assert_eq!(xpath(&page, "//li[position() != 2]"), vec![a, c]);
}

#[test]
fn test_attribute_predicates() {
    let page = build_page();
    assert_eq!(xpath(&page, "//h1[@class=\"title\"]"), vec![page.title]);
    assert_eq!(xpath(&page, "//*[@href]"), vec![page.link]);
    assert_eq!(xpath(&page, "//div[@id='main' and @lang='en']"), vec![page.main]);
    assert_eq!(xpath(&page, "//div[@id='x' or @lang='en']"), vec![page.main]);
    assert_eq!(xpath(&page, "//*[not(@*)]").first(), Some(&page.tree.document_element().unwrap()));
}

#[test]
fn test_string_functions() {
    let page = build_page();
    assert_eq!(xpath(&page, "//p[contains(text(), 'World')]"), vec![page.world]);
    assert_eq!(xpath(&page, "//p[contains(., 'Hello')]"), vec![page.hello]);
    assert_eq!(
        xpath(&page, "//p[normalize-space(.) = 'Hello there']"),
        vec![page.hello]
    );
    assert_eq!(xpath(&page, "//p[starts-with(., 'Wor')]"), vec![page.world]);
    assert_eq!(xpath(&page, "//*[string-length(text()) = 5]"), vec![page.title, page.world]);
    assert_eq!(xpath(&page, "//*[name() = 'footer']"), vec![page.footer]);
    assert_eq!(xpath(&page, "//li[. = concat('', 'c')]"), vec![page.items[2]]);
}

#[test]
fn test_count_and_nested_paths() {
    let page = build_page();
    assert_eq!(xpath(&page, "//*[count(li) = 3]").len(), 1);
    assert_eq!(xpath(&page, "//div[p/text() = 'World']"), vec![page.main]);
    assert_eq!(xpath(&page, "//*[h1]"), vec![page.main]);
}

// ========== Errors ==========

#[test]
fn test_syntax_errors() {
    for expression in ["//p[", "//p[@a='x]", "bogus::p", "//p]", "//@", "//p!"] {
        assert!(
            matches!(compile(expression), Err(XPathError::Syntax { .. })),
            "{expression} should be a syntax error"
        );
    }
}

#[test]
fn test_unsupported_features() {
    let error = compile("//p/text()").unwrap_err();
    assert!(matches!(error, XPathError::Unsupported { .. }));
    assert!(error.to_string().contains("results other than element nodes"));

    let error = compile("//p/@class").unwrap_err();
    assert!(matches!(error, XPathError::Unsupported { .. }));

    let error = compile("//p[translate(., 'a', 'b')]").unwrap_err();
    assert!(error.to_string().contains("function 'translate()'"));

    let error = compile("//p/attribute::class").unwrap_err();
    assert!(error.to_string().contains("the attribute axis"));
}

#[test]
fn test_host_validation_matches_compile() {
    let page = build_page();
    assert_eq!(page.tree.validate_xpath("//li[2]"), Ok(()));
    assert!(page.tree.validate_xpath("//li[").is_err());
    assert_eq!(
        page.tree.evaluate_xpath(NodeId::ROOT, "//h1").unwrap(),
        vec![page.title]
    );
}
