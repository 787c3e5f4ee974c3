//! Integration tests for the cached document wrapper.

use std::sync::Arc;

use extcss::{ExtCssDocument, parse};
use extcss_dom::{DomTree, ElementData, NodeId};

fn make_document() -> (ExtCssDocument<DomTree>, NodeId, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let ad = tree.append_element(body, ElementData::new("div").with_attr("class", "ad"));
    let _ = tree.append_text(ad, "Sponsored");
    let post = tree.append_element(body, ElementData::new("div").with_attr("class", "post"));
    let _ = tree.append_text(post, "News");
    (ExtCssDocument::new(tree), ad, post)
}

#[test]
fn test_parse_is_cached() {
    let (document, _, _) = make_document();
    assert_eq!(document.cache_len(), 0);
    let first = document.parse("div:contains(ad)").unwrap();
    let second = document.parse("div:contains(ad)").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(document.cache_len(), 1);
    assert_eq!(*first, parse("div:contains(ad)").unwrap());
}

#[test]
fn test_failed_parse_is_not_cached() {
    let (document, _, _) = make_document();
    assert!(document.parse("div:remove()").is_err());
    assert_eq!(document.cache_len(), 0);
}

#[test]
fn test_query_uses_the_cache() {
    let (document, ad, post) = make_document();
    assert_eq!(document.query_selector_all("div:contains(Sponsored)").unwrap(), vec![ad]);
    assert_eq!(document.query_selector_all("div:not(.ad)").unwrap(), vec![post]);
    assert_eq!(document.query_selector_all("div:contains(Sponsored)").unwrap(), vec![ad]);
    assert_eq!(document.cache_len(), 2);
}

#[test]
fn test_query_from_element() {
    let (document, ad, post) = make_document();
    assert!(document.query_selector_all_in("div", ad).unwrap().is_empty());
    let body = document.host().parent_element(post).unwrap();
    assert_eq!(document.query_selector_all_in("div", body).unwrap(), vec![ad, post]);
}

#[test]
fn test_clear_cache() {
    let (document, _, _) = make_document();
    let before = document.parse("div").unwrap();
    document.clear_cache();
    assert_eq!(document.cache_len(), 0);
    let after = document.parse("div").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before, after);
}

#[test]
fn test_shared_between_threads() {
    let (document, ad, _) = make_document();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let _ = scope.spawn(|| {
                assert_eq!(document.query_selector_all("div:has-text(Spons)").unwrap(), vec![ad]);
            });
        }
    });
    assert_eq!(document.cache_len(), 1);
}
