//! Selector parsing.
//!
//! A single left-to-right pass over the token stream. Instead of recursive
//! descent, the parser keeps a cursor path to the node currently being
//! filled in and decides what each token means from the kind of that node,
//! the neighbouring tokens and a handful of bracket stacks. This keeps the
//! raw argument text of absolute pseudo-classes (regexps, XPath) intact
//! while nested selector lists are parsed into subtrees.

mod context;

use context::{Context, NodeKind};

use crate::ast::SelectorList;
use crate::converter::convert;
use crate::error::{ExtCssError, Result};
use crate::optimizer::optimize;
use crate::pseudo::{self, PseudoClass};
use crate::tokenizer::{Token, is_combinator, is_white_space, tokenize_selector};

/// Knobs for [`parse_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fold purely standard `:not()`/`:is()` arguments back into regular
    /// selectors so the host can evaluate them natively.
    pub optimize: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Parse a selector into its AST, optimizing where possible.
///
/// # Errors
/// Returns a syntax error if the selector is not valid extended CSS.
pub fn parse(selector: &str) -> Result<SelectorList> {
    parse_with_options(selector, ParseOptions::default())
}

/// Parse a selector into its AST.
///
/// # Errors
/// Returns a syntax error if the selector is not valid extended CSS.
pub fn parse_with_options(selector: &str, options: ParseOptions) -> Result<SelectorList> {
    let converted = convert(selector)?;
    let tokens = tokenize_selector(&converted);
    let mut context = Context::new(selector);
    for index in 0..tokens.len() {
        let window = Window::at(&tokens, index);
        context.handle(&window)?;
    }
    let should_optimize = context.should_optimize;
    let ast = context.finish()?;
    if should_optimize && options.optimize {
        Ok(optimize(&ast))
    } else {
        Ok(ast)
    }
}

/// The current token and its neighbours.
struct Window<'t> {
    prev_prev: Option<&'t Token>,
    prev: Option<&'t Token>,
    token: &'t Token,
    next: Option<&'t Token>,
    next_next: Option<&'t Token>,
}

impl<'t> Window<'t> {
    fn at(tokens: &'t [Token], index: usize) -> Self {
        let get = move |offset: isize| {
            index
                .checked_add_signed(offset)
                .and_then(|i| tokens.get(i))
        };
        Self {
            prev_prev: get(-2),
            prev: get(-1),
            token: &tokens[index],
            next: get(1),
            next_next: get(2),
        }
    }

    fn prev_value(&self) -> Option<&str> {
        self.prev.map(|t| t.value.as_str())
    }

    fn next_value(&self) -> Option<&str> {
        self.next.map(|t| t.value.as_str())
    }

    fn next_next_is(&self, c: char) -> bool {
        self.next_next.is_some_and(|t| t.is_mark(c))
    }

    fn prev_is(&self, c: char) -> bool {
        self.prev.is_some_and(|t| t.is_mark(c))
    }

    fn next_is_white_space(&self) -> bool {
        self.next
            .and_then(Token::mark_char)
            .is_some_and(is_white_space)
    }

    /// Whether a regular selector keeps going after a space, i.e. the space
    /// is a descendant combinator rather than padding.
    fn regular_continues_after_space(&self) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        match next.mark_char() {
            None => true,
            Some(c) => {
                is_combinator(c) || matches!(c, '*' | '#' | '.' | ':' | '\'' | '"' | '[')
            }
        }
    }
}

impl Context<'_> {
    fn handle(&mut self, window: &Window<'_>) -> Result<()> {
        let token = window.token;
        let Some(mark) = token.mark_char() else {
            return self.handle_word(window);
        };
        match mark {
            ',' => self.handle_comma(window),
            ' ' => self.handle_space(window),
            ']' => self.handle_closing_square_bracket(window),
            ':' => self.handle_colon(window),
            '(' => self.handle_opening_parenthesis(),
            ')' => self.handle_closing_parenthesis(),
            '\t' => {
                if self.buffer_kind() == Some(NodeKind::RegularSelector) && self.attribute_open {
                    self.update_buffer_node(&token.value)
                } else {
                    Err(self.invalid())
                }
            }
            '\n' | '\r' | '\u{c}' => Err(self.invalid()),
            _ => self.handle_mark(window, mark),
        }
    }

    // ========== words ==========

    fn handle_word(&mut self, window: &Window<'_>) -> Result<()> {
        let value = window.token.value.as_str();
        match self.buffer_kind() {
            None => self.init_ast(value),
            Some(NodeKind::SelectorList) => {
                self.add_node(NodeKind::Selector, "")?;
                self.add_node(NodeKind::RegularSelector, value)
            }
            Some(NodeKind::RegularSelector | NodeKind::AbsolutePseudoClass) => {
                self.update_buffer_node(value)
            }
            Some(NodeKind::ExtendedSelector) => self.open_extended_pseudo_class(window),
            Some(NodeKind::RelativePseudoClass) => self.init_relative_subtree(value),
            // `div:has(a)span`
            Some(NodeKind::Selector) => Err(self.invalid()),
        }
    }

    /// The word right after `:` names a supported extended pseudo-class.
    fn open_extended_pseudo_class(&mut self, window: &Window<'_>) -> Result<()> {
        if window.next_is_white_space() && window.next_next_is('(') {
            return Err(self.no_white_space_error());
        }
        let name = window.token.value.to_ascii_lowercase();
        let Some(pseudo_class) = PseudoClass::lookup(&name) else {
            return Err(self.invalid());
        };

        if pseudo_class.is_has() {
            self.check_has_placement(&name)?;
        }

        self.extended_names.push(name.clone());
        if pseudo_class.is_absolute() {
            self.add_node(NodeKind::AbsolutePseudoClass, &name)
        } else {
            if pseudo_class.is_foldable() {
                self.should_optimize = true;
            }
            self.add_node(NodeKind::RelativePseudoClass, &name)
        }
    }

    /// `:has()` may not be nested in `:has()` or `:is()`, nor appear inside a
    /// standard pseudo-class or after a pseudo-element.
    fn check_has_placement(&self, name: &str) -> Result<()> {
        let enclosing = self.extended_names.iter().rev().find(|outer| {
            PseudoClass::lookup(outer).is_some_and(|p| p.is_has() || p == PseudoClass::Is)
        });
        if let Some(outer) = enclosing {
            return Err(self.error(format!(
                "Usage of :{name}() pseudo-class is not allowed inside :{outer}(): '{}'",
                self.selector
            )));
        }
        if let Some(standard) = self.standard_names.last() {
            return Err(self.error(format!(
                "Usage of :{name}() pseudo-class is not allowed inside regular pseudo: '{standard}'"
            )));
        }
        if let Some(pseudo_element) = self.current_regular_value().and_then(trailing_pseudo_element)
        {
            return Err(self.error(format!(
                "Usage of :{name}() pseudo-class is not allowed after any regular pseudo-element: '{pseudo_element}'"
            )));
        }
        Ok(())
    }

    fn no_white_space_error(&self) -> ExtCssError {
        self.error(format!(
            "No white space is allowed before or after extended pseudo-class name in selector: '{}'",
            self.selector
        ))
    }

    // ========== separators ==========

    fn handle_comma(&mut self, window: &Window<'_>) -> Result<()> {
        let Some(kind) = self.buffer_kind() else {
            return Err(self.invalid());
        };
        if window.next.is_none() {
            return Err(self.invalid());
        }
        match kind {
            NodeKind::RegularSelector if self.attribute_open => self.update_buffer_node(","),
            NodeKind::RegularSelector | NodeKind::Selector => {
                self.up_to_closest(NodeKind::SelectorList);
                Ok(())
            }
            NodeKind::AbsolutePseudoClass => self.update_buffer_node(","),
            _ => Err(self.invalid()),
        }
    }

    fn handle_space(&mut self, window: &Window<'_>) -> Result<()> {
        let mut kind = self.buffer_kind();
        if kind == Some(NodeKind::RegularSelector) && !self.attribute_open {
            let buffer = self.updated_buffer_node()?;
            kind = Some(self.kind(buffer));
        }
        match kind {
            Some(NodeKind::RegularSelector) => {
                if !self.attribute_open {
                    let after_colon =
                        window.prev_is(':') && window.next.is_some_and(Token::is_word);
                    let before_parenthesis = window.prev.is_some_and(Token::is_word)
                        && window.next.is_some_and(|t| t.is_mark('('));
                    if after_colon || before_parenthesis {
                        return Err(self.invalid());
                    }
                }
                if window.next.is_none()
                    || window.regular_continues_after_space()
                    || self.attribute_open
                {
                    self.update_buffer_node(" ")?;
                }
                Ok(())
            }
            Some(NodeKind::AbsolutePseudoClass) => self.update_buffer_node(" "),
            Some(NodeKind::RelativePseudoClass) => self.init_relative_subtree(""),
            Some(NodeKind::Selector) => {
                if window.regular_continues_after_space() {
                    self.add_node(NodeKind::RegularSelector, "")?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ========== other marks ==========

    fn handle_mark(&mut self, window: &Window<'_>, mark: char) -> Result<()> {
        let value = window.token.value.as_str();
        let mut kind = self.buffer_kind();
        if is_combinator(mark) {
            if kind.is_none() {
                return Err(self.invalid());
            }
            let buffer = self.updated_buffer_node()?;
            kind = Some(self.kind(buffer));
        }
        let opens_attribute = mark == '[' && !window.prev_is('\\');

        match kind {
            None => {
                self.init_ast(value)?;
                if opens_attribute {
                    self.attribute_open = true;
                }
            }
            Some(NodeKind::RegularSelector) => {
                if mark == '{' && !(self.attribute_open || self.regexp_open) {
                    return Err(self.invalid());
                }
                self.update_buffer_node(value)?;
                if opens_attribute {
                    self.attribute_open = true;
                }
            }
            Some(NodeKind::AbsolutePseudoClass) => {
                self.update_buffer_node(value)?;
                if mark == '/' && !self.extended_names.is_empty() {
                    self.toggle_regexp(window)?;
                }
            }
            Some(NodeKind::RelativePseudoClass) => {
                self.init_relative_subtree(value)?;
                if opens_attribute {
                    self.attribute_open = true;
                }
            }
            Some(NodeKind::Selector) => {
                if is_combinator(mark) {
                    self.add_node(NodeKind::RegularSelector, value)?;
                } else if !self.regexp_open {
                    // `div:has(img).banner` continues the leading compound
                    let _ = self.last_regular_into_buffer()?;
                    self.update_buffer_node(value)?;
                    if opens_attribute {
                        self.attribute_open = true;
                    }
                }
            }
            Some(NodeKind::SelectorList) => {
                self.add_node(NodeKind::Selector, "")?;
                self.add_node(NodeKind::RegularSelector, value)?;
                if opens_attribute {
                    self.attribute_open = true;
                }
            }
            Some(NodeKind::ExtendedSelector) => return Err(self.invalid()),
        }
        Ok(())
    }

    fn toggle_regexp(&mut self, window: &Window<'_>) -> Result<()> {
        let escaped_slash_before =
            window.prev_is('/') && window.prev_prev.is_some_and(|t| t.is_mark('\\'));
        if escaped_slash_before {
            self.regexp_open = false;
            return Ok(());
        }
        if let Some(prev) = window.prev_value() {
            if prev != "\\" {
                self.regexp_open = self.is_regexp_opening(prev)? && !self.regexp_open;
            }
        }
        Ok(())
    }

    fn handle_closing_square_bracket(&mut self, window: &Window<'_>) -> Result<()> {
        match self.buffer_kind() {
            Some(NodeKind::RegularSelector) => {
                if !self.attribute_open && !window.prev_is('\\') {
                    return Err(self.error(format!(
                        "'{}' is not a valid selector due to ']' after '{}'",
                        self.selector,
                        self.buffer_value()
                    )));
                }
                if self.is_attribute_closing()? {
                    self.attribute_open = false;
                    self.attribute_buffer.clear();
                }
                self.update_buffer_node("]")
            }
            Some(NodeKind::AbsolutePseudoClass) => self.update_buffer_node("]"),
            _ => Err(self.invalid()),
        }
    }

    // ========== colon ==========

    fn handle_colon(&mut self, window: &Window<'_>) -> Result<()> {
        if window.next_is_white_space()
            && window
                .next_next
                .is_some_and(|t| t.is_word() && pseudo::is_supported(&t.value))
        {
            return Err(self.no_white_space_error());
        }

        if self.buffer().is_none() {
            let next = window.next_value().map(str::to_ascii_lowercase);
            match next.as_deref().and_then(PseudoClass::lookup) {
                Some(PseudoClass::Xpath) => self.init_ast("body")?,
                Some(PseudoClass::Upward | PseudoClass::NthAncestor) => {
                    return Err(self.error(format!(
                        "Selector should be defined before :{}() pseudo-class: '{}'",
                        next.unwrap_or_default(),
                        self.selector
                    )));
                }
                _ => self.init_ast("*")?,
            }
        }
        if self.buffer_kind() == Some(NodeKind::SelectorList) {
            self.add_node(NodeKind::Selector, "")?;
            self.add_node(NodeKind::RegularSelector, "")?;
        }

        match self.buffer_kind() {
            Some(NodeKind::RegularSelector) => {
                let after_combinator = window
                    .prev
                    .and_then(Token::mark_char)
                    .is_some_and(|c| is_combinator(c) || c == ',');
                if after_combinator {
                    self.update_buffer_node("*")?;
                }
                self.handle_next_token_on_colon(window)
            }
            Some(NodeKind::Selector) => {
                let Some(next) = window.next_value() else {
                    return Err(self.colon_at_end_error());
                };
                if pseudo::is_supported(next) {
                    self.add_node(NodeKind::ExtendedSelector, "")
                } else if next.eq_ignore_ascii_case(pseudo::REMOVE) {
                    Err(self.remove_error())
                } else {
                    let _ = self.last_regular_into_buffer()?;
                    self.handle_next_token_on_colon(window)
                }
            }
            Some(NodeKind::AbsolutePseudoClass) => {
                let next_supported = window.next_value().is_some_and(pseudo::is_supported);
                if self.buffer_name() == PseudoClass::Xpath.as_ref()
                    && next_supported
                    && window.next_next_is('(')
                {
                    return Err(self.error(format!(
                        ":xpath() pseudo-class should be the last in selector: '{}'",
                        self.selector
                    )));
                }
                self.update_buffer_node(":")
            }
            Some(NodeKind::RelativePseudoClass) => {
                let Some(next) = window.next_value() else {
                    return Err(self.error(format!(
                        "Invalid pseudo-class arg at the end of selector: '{}'",
                        self.selector
                    )));
                };
                self.init_relative_subtree("*")?;
                if pseudo::is_supported(next) {
                    self.up_to_closest(NodeKind::Selector);
                    self.add_node(NodeKind::ExtendedSelector, "")
                } else {
                    self.update_buffer_node(":")?;
                    if window.next_next_is('(') {
                        self.standard_names.push(next.to_string());
                    }
                    Ok(())
                }
            }
            _ => Err(self.invalid()),
        }
    }

    /// Colon inside a regular selector: either it continues standard CSS or
    /// it starts an extended pseudo-class.
    fn handle_next_token_on_colon(&mut self, window: &Window<'_>) -> Result<()> {
        let Some(next) = window.next_value() else {
            return Err(self.colon_at_end_error());
        };
        // `a[href="javascript:void(0)"]`
        if self.attribute_open {
            return self.update_buffer_node(":");
        }
        if pseudo::is_supported(next) {
            self.up_to_closest(NodeKind::Selector);
            return self.add_node(NodeKind::ExtendedSelector, "");
        }
        if next.eq_ignore_ascii_case(pseudo::REMOVE) {
            return Err(self.remove_error());
        }
        self.update_buffer_node(":")?;
        // functional standard pseudo-class, e.g. `.entry:nth-child(2)`
        if window.next_next_is('(') {
            self.standard_names.push(next.to_string());
        }
        Ok(())
    }

    fn colon_at_end_error(&self) -> ExtCssError {
        self.error(format!(
            "Invalid colon ':' at the end of selector: '{}'",
            self.selector
        ))
    }

    fn remove_error(&self) -> ExtCssError {
        self.error(format!(
            "Selector parser error: invalid :remove() pseudo-class in selector: '{}'",
            self.selector
        ))
    }

    // ========== parentheses ==========

    fn handle_opening_parenthesis(&mut self) -> Result<()> {
        match self.buffer_kind() {
            Some(NodeKind::AbsolutePseudoClass) => {
                if self.buffer_name() != PseudoClass::Xpath.as_ref() && self.regexp_open {
                    return self.update_buffer_node("(");
                }
                self.extended_brackets += 1;
                if self.extended_brackets > self.extended_names.len() {
                    self.update_buffer_node("(")?;
                }
                Ok(())
            }
            Some(NodeKind::RegularSelector) => {
                if self.attribute_open {
                    self.update_buffer_node("(")
                } else if self.standard_names.is_empty() {
                    Err(self.invalid())
                } else {
                    self.standard_brackets += 1;
                    self.update_buffer_node("(")
                }
            }
            Some(NodeKind::RelativePseudoClass) => {
                self.extended_brackets += 1;
                Ok(())
            }
            _ => Err(self.invalid()),
        }
    }

    fn handle_closing_parenthesis(&mut self) -> Result<()> {
        match self.buffer_kind() {
            Some(NodeKind::AbsolutePseudoClass) => {
                let is_xpath = self.buffer_name() == PseudoClass::Xpath.as_ref();
                if !is_xpath && self.regexp_open {
                    return self.update_buffer_node(")");
                }
                self.extended_brackets = self.extended_brackets.saturating_sub(1);
                if is_xpath {
                    if self.extended_brackets < self.extended_names.len() {
                        let _ = self.extended_names.pop();
                        self.regexp_open = false;
                        Ok(())
                    } else {
                        self.update_buffer_node(")")
                    }
                } else {
                    let _ = self.extended_names.pop();
                    if self.extended_brackets > self.extended_names.len() {
                        self.update_buffer_node(")")
                    } else {
                        self.regexp_open = false;
                        self.up_to_closest(NodeKind::Selector);
                        Ok(())
                    }
                }
            }
            Some(NodeKind::RegularSelector) => {
                if self.attribute_open {
                    self.update_buffer_node(")")
                } else if !self.standard_names.is_empty() && self.standard_brackets > 0 {
                    self.update_buffer_node(")")?;
                    self.standard_brackets -= 1;
                    let _ = self.standard_names.pop();
                    Ok(())
                } else {
                    self.close_relative_pseudo_class();
                    Ok(())
                }
            }
            Some(NodeKind::Selector) => {
                self.close_relative_pseudo_class();
                Ok(())
            }
            Some(NodeKind::RelativePseudoClass) => {
                if !self.extended_names.is_empty() && self.extended_brackets > 0 {
                    self.extended_brackets -= 1;
                    let _ = self.extended_names.pop();
                }
                Ok(())
            }
            _ => Err(self.invalid()),
        }
    }

    fn close_relative_pseudo_class(&mut self) {
        self.extended_brackets = self.extended_brackets.saturating_sub(1);
        let _ = self.extended_names.pop();
        self.up_to_closest(NodeKind::ExtendedSelector);
        self.up_to_closest(NodeKind::Selector);
    }
}

/// The pseudo-element a regular selector ends with, if any: `::before`,
/// `::part(x)`, or one of the legacy single-colon forms.
fn trailing_pseudo_element(value: &str) -> Option<&str> {
    let colon = value.rfind(':')?;
    let rest = &value[colon + 1..];
    let name = rest.split('(').next().unwrap_or(rest);
    let double_colon = value[..colon].ends_with(':');
    let legacy = matches!(
        name.to_ascii_lowercase().as_str(),
        "before" | "after" | "first-line" | "first-letter"
    );
    (pseudo::is_regular_pseudo_element(name) && (double_colon || legacy)).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExtendedSelector, SelectorPart};

    fn values(selector: &str) -> Vec<String> {
        let list = parse_with_options(selector, ParseOptions { optimize: false }).unwrap();
        list.children[0]
            .children
            .iter()
            .map(|part| match part {
                SelectorPart::Regular(regular) => regular.value.clone(),
                SelectorPart::Extended(extended) => format!(":{}", extended.name()),
            })
            .collect()
    }

    #[test]
    fn test_window_neighbours() {
        let tokens = tokenize_selector("a>b");
        let window = Window::at(&tokens, 0);
        assert!(window.prev.is_none());
        assert!(window.next.is_some_and(|t| t.is_mark('>')));
        assert!(window.next_next.is_some_and(|t| t.is_word()));
    }

    #[test]
    fn test_compound_continues_after_extended() {
        assert_eq!(values("div:has(img).banner"), ["div.banner", ":has"]);
    }

    #[test]
    fn test_standard_pseudo_with_spaces() {
        assert_eq!(
            values("div:contains(a):nth-child(2n + 1)"),
            ["div:nth-child(2n + 1)", ":contains"]
        );
    }

    #[test]
    fn test_trailing_pseudo_element() {
        assert_eq!(trailing_pseudo_element("p::before"), Some("before"));
        assert_eq!(trailing_pseudo_element("p:after"), Some("after"));
        assert_eq!(trailing_pseudo_element("p::part(x)"), Some("part"));
        assert_eq!(trailing_pseudo_element("p:hover"), None);
        assert_eq!(trailing_pseudo_element("p"), None);
    }

    #[test]
    fn test_absolute_argument_is_raw() {
        let list = parse(r"div:contains(/ad(s)?\)/i)").unwrap();
        let SelectorPart::Extended(ExtendedSelector::Absolute(absolute)) =
            &list.children[0].children[1]
        else {
            panic!("expected absolute pseudo-class");
        };
        assert_eq!(absolute.value, r"/ad(s)?\)/i");
    }
}
