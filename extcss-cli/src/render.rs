//! Plain-text renderings of ASTs, elements and declarations.

use core::fmt::Write;

use extcss::StyleDeclaration;
use extcss::ast::{ExtendedSelector, SelectorList, SelectorPart};
use extcss_dom::DomHost;

/// Longest text excerpt shown after an element.
const TEXT_PREVIEW: usize = 40;

/// Indented tree of an AST, one node per line.
pub fn ast_tree(list: &SelectorList) -> String {
    let mut out = String::new();
    write_list(&mut out, list, 0);
    out
}

fn write_list(out: &mut String, list: &SelectorList, indent: usize) {
    let prefix = "  ".repeat(indent);
    let _ = writeln!(out, "{prefix}SelectorList");
    for selector in &list.children {
        let _ = writeln!(out, "{prefix}  Selector");
        for part in &selector.children {
            write_part(out, part, indent + 2);
        }
    }
}

fn write_part(out: &mut String, part: &SelectorPart, indent: usize) {
    let prefix = "  ".repeat(indent);
    match part {
        SelectorPart::Regular(regular) => {
            let _ = writeln!(out, "{prefix}RegularSelector: {}", regular.value);
        }
        SelectorPart::Extended(ExtendedSelector::Absolute(absolute)) => {
            let _ = writeln!(out, "{prefix}ExtendedSelector");
            let _ = writeln!(
                out,
                "{prefix}  AbsolutePseudoClass: {}({})",
                absolute.name, absolute.value
            );
        }
        SelectorPart::Extended(ExtendedSelector::Relative(relative)) => {
            let _ = writeln!(out, "{prefix}ExtendedSelector");
            let _ = writeln!(out, "{prefix}  RelativePseudoClass: {}", relative.name);
            write_list(out, &relative.selector_list, indent + 2);
        }
    }
}

/// Start tag of an element followed by a preview of its text.
pub fn element<H: DomHost>(host: &H, node: H::Node) -> String {
    let mut out = format!("<{}", host.tag_name(node));
    for (name, value) in host.attributes(node) {
        if value.is_empty() {
            let _ = write!(out, " {name}");
        } else {
            let _ = write!(out, " {name}=\"{value}\"");
        }
    }
    out.push('>');

    let text = host.text_content(node);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        let preview: String = text.chars().take(TEXT_PREVIEW).collect();
        let ellipsis = if preview.len() < text.len() { "…" } else { "" };
        let _ = write!(out, " \"{preview}{ellipsis}\"");
    }
    out
}

/// `property: value;` lines.
pub fn declarations(declarations: &[StyleDeclaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{}: {};\n", d.property, d.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use extcss::{parse, parse_style_block};
    use extcss_dom::{DomTree, ElementData, NodeId};

    #[test]
    fn test_ast_tree_nests_relative_arguments() {
        let ast = parse("div:has(> a:contains(Ad)) + p").unwrap();
        let expected = "\
SelectorList
  Selector
    RegularSelector: div
    ExtendedSelector
      RelativePseudoClass: has
      SelectorList
        Selector
          RegularSelector: > a
          ExtendedSelector
            AbsolutePseudoClass: contains(Ad)
    RegularSelector: + p
";
        assert_eq!(ast_tree(&ast), expected);
    }

    #[test]
    fn test_element_preview() {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
        let div = tree.append_element(
            html,
            ElementData::new("div")
                .with_attr("id", "ad")
                .with_attr("hidden", ""),
        );
        let _ = tree.append_text(div, "  Buy\n  now ");
        assert_eq!(element(&tree, div), "<div hidden id=\"ad\"> \"Buy now\"");

        let long = "x".repeat(50);
        let p = tree.append_element(html, ElementData::new("p"));
        let _ = tree.append_text(p, &long);
        assert_eq!(element(&tree, p), format!("<p> \"{}…\"", "x".repeat(40)));
    }

    #[test]
    fn test_declarations() {
        let parsed = parse_style_block("display: none; content: 'a;b'").unwrap();
        assert_eq!(declarations(&parsed), "display: none;\ncontent: 'a;b';\n");
    }
}
