//! Parser state: an arena of partially built nodes plus the cursor path
//! from the root to the node currently being filled in (the buffer node).

use crate::ast::{
    AbsolutePseudoClass, ExtendedSelector, RegularSelector, RelativePseudoClass, Selector,
    SelectorList, SelectorPart,
};
use crate::error::{ExtCssError, Result};
use crate::pseudo::PseudoClass;
use crate::tokenizer::{TokenKind, tokenize_attribute};

/// Kinds of node the parser builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeKind {
    SelectorList,
    Selector,
    RegularSelector,
    ExtendedSelector,
    AbsolutePseudoClass,
    RelativePseudoClass,
}

#[derive(Debug)]
pub(super) struct ArenaNode {
    pub(super) kind: NodeKind,
    /// Pseudo-class name; empty for other kinds.
    pub(super) name: String,
    /// Regular selector text or absolute pseudo-class argument.
    pub(super) value: String,
    pub(super) parent: Option<usize>,
    pub(super) children: Vec<usize>,
}

/// Mutable parse state. Nodes are addressed by index into `nodes`; the
/// path holds indices, so no node is ever borrowed across a handler.
#[derive(Debug)]
pub(super) struct Context<'s> {
    /// The caller's selector, quoted in error messages.
    pub(super) selector: &'s str,
    nodes: Vec<ArenaNode>,
    root: Option<usize>,
    path: Vec<usize>,
    /// Names of the extended pseudo-classes whose argument is open.
    pub(super) extended_names: Vec<String>,
    /// Open parentheses counted against `extended_names`.
    pub(super) extended_brackets: usize,
    /// Names of functional standard pseudo-classes whose argument is open.
    pub(super) standard_names: Vec<String>,
    pub(super) standard_brackets: usize,
    pub(super) attribute_open: bool,
    /// Text collected since the current attribute selector opened.
    pub(super) attribute_buffer: String,
    pub(super) regexp_open: bool,
    pub(super) should_optimize: bool,
}

impl<'s> Context<'s> {
    pub(super) const fn new(selector: &'s str) -> Self {
        Self {
            selector,
            nodes: Vec::new(),
            root: None,
            path: Vec::new(),
            extended_names: Vec::new(),
            extended_brackets: 0,
            standard_names: Vec::new(),
            standard_brackets: 0,
            attribute_open: false,
            attribute_buffer: String::new(),
            regexp_open: false,
            should_optimize: false,
        }
    }

    pub(super) fn invalid(&self) -> ExtCssError {
        ExtCssError::invalid_selector(self.selector)
    }

    pub(super) fn error(&self, message: impl Into<String>) -> ExtCssError {
        ExtCssError::syntax(self.selector, message)
    }

    // ========== cursor ==========

    pub(super) fn buffer(&self) -> Option<usize> {
        self.path.last().copied()
    }

    pub(super) fn kind(&self, id: usize) -> NodeKind {
        self.nodes[id].kind
    }

    pub(super) fn buffer_kind(&self) -> Option<NodeKind> {
        self.buffer().map(|id| self.kind(id))
    }

    /// Value of the buffer node, for error messages.
    pub(super) fn buffer_value(&self) -> &str {
        self.buffer().map_or("", |id| self.nodes[id].value.as_str())
    }

    /// Name of the buffer node when it is a pseudo-class.
    pub(super) fn buffer_name(&self) -> &str {
        self.buffer().map_or("", |id| self.nodes[id].name.as_str())
    }

    /// Truncate the path to the nearest node of `kind`, if any.
    pub(super) fn up_to_closest(&mut self, kind: NodeKind) {
        if let Some(index) = self.path.iter().rposition(|&id| self.nodes[id].kind == kind) {
            self.path.truncate(index + 1);
        }
    }

    // ========== building ==========

    fn alloc(&mut self, kind: NodeKind, parent: Option<usize>, name: &str, value: &str) -> usize {
        let id = self.nodes.len();
        self.nodes.push(ArenaNode {
            kind,
            name: name.to_string(),
            value: value.to_string(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    /// Append a node of `kind` to the buffer node and make it the buffer.
    /// `text` is the value of a regular selector or the name of a
    /// pseudo-class.
    pub(super) fn add_node(&mut self, kind: NodeKind, text: &str) -> Result<()> {
        let parent = self.buffer().ok_or_else(|| {
            self.error(format!("no buffer node while parsing '{}'", self.selector))
        })?;
        let id = match kind {
            NodeKind::AbsolutePseudoClass | NodeKind::RelativePseudoClass => {
                self.alloc(kind, Some(parent), text, "")
            }
            _ => self.alloc(kind, Some(parent), "", text),
        };
        self.path.push(id);
        Ok(())
    }

    pub(super) fn init_ast(&mut self, value: &str) -> Result<()> {
        let root = self.alloc(NodeKind::SelectorList, None, "", "");
        self.root = Some(root);
        self.path.push(root);
        self.add_node(NodeKind::Selector, "")?;
        self.add_node(NodeKind::RegularSelector, value)
    }

    /// Start the selector list argument of a relative pseudo-class.
    pub(super) fn init_relative_subtree(&mut self, value: &str) -> Result<()> {
        self.add_node(NodeKind::SelectorList, "")?;
        self.add_node(NodeKind::Selector, "")?;
        self.add_node(NodeKind::RegularSelector, value)
    }

    /// Append text to the buffer node, which must be a regular selector or
    /// an absolute pseudo-class.
    pub(super) fn update_buffer_node(&mut self, text: &str) -> Result<()> {
        let Some(id) = self.buffer() else {
            return Err(self.error("no buffer node to update"));
        };
        match self.nodes[id].kind {
            NodeKind::AbsolutePseudoClass => self.nodes[id].value.push_str(text),
            NodeKind::RegularSelector => {
                self.nodes[id].value.push_str(text);
                if self.attribute_open {
                    self.attribute_buffer.push_str(text);
                }
            }
            kind => {
                return Err(self.error(format!(
                    "{kind:?} node cannot be updated while parsing '{}'",
                    self.selector
                )));
            }
        }
        Ok(())
    }

    /// Make the last regular selector of the buffer selector node the
    /// buffer node again.
    pub(super) fn last_regular_into_buffer(&mut self) -> Result<usize> {
        let selector = self
            .buffer()
            .filter(|&id| self.nodes[id].kind == NodeKind::Selector)
            .ok_or_else(|| self.invalid())?;
        let regular = self.nodes[selector]
            .children
            .iter()
            .rev()
            .copied()
            .find(|&child| self.nodes[child].kind == NodeKind::RegularSelector)
            .ok_or_else(|| self.invalid())?;
        self.path.push(regular);
        Ok(regular)
    }

    /// Re-target the cursor after whitespace or a combinator: the open
    /// pseudo-class argument if one is still being collected, otherwise the
    /// enclosing selector or its last regular selector.
    pub(super) fn updated_buffer_node(&mut self) -> Result<usize> {
        // `.banner:has(~span, ~p)` right after the comma
        if let Some(buffer) = self.buffer() {
            let node = &self.nodes[buffer];
            if node.kind == NodeKind::SelectorList
                && node
                    .parent
                    .is_some_and(|parent| self.nodes[parent].kind == NodeKind::RelativePseudoClass)
            {
                return Ok(buffer);
            }
        }

        self.up_to_closest(NodeKind::Selector);
        let selector = self
            .buffer()
            .filter(|&id| self.nodes[id].kind == NodeKind::Selector)
            .ok_or_else(|| {
                self.error(format!(
                    "no selector node, unable to continue parsing '{}'",
                    self.selector
                ))
            })?;

        let last_child = self.nodes[selector].children.last().copied();
        // A space inside standard pseudo-class brackets does not leave the
        // regular selector: `div:contains(a):nth-child(2n + 1)`.
        let extended = last_child.filter(|&child| {
            self.nodes[child].kind == NodeKind::ExtendedSelector && self.standard_brackets == 0
        });
        let Some(extended) = extended else {
            return self.last_regular_into_buffer();
        };

        if let Some(&pseudo) = self.nodes[extended].children.first() {
            let node = &self.nodes[pseudo];
            let relative_open = node.kind == NodeKind::RelativePseudoClass
                && self.extended_brackets > 0
                && self.extended_brackets == self.extended_names.len();
            let absolute_open = node.kind == NodeKind::AbsolutePseudoClass
                && self.extended_names.last() == Some(&node.name);
            if relative_open || absolute_open {
                self.path.push(extended);
                self.path.push(pseudo);
                return Ok(pseudo);
            }
        }
        Ok(selector)
    }

    /// The last regular selector of the selector that owns the buffer node.
    pub(super) fn current_regular_value(&self) -> Option<&str> {
        let selector = self
            .path
            .iter()
            .rev()
            .copied()
            .find(|&id| self.nodes[id].kind == NodeKind::Selector)?;
        self.nodes[selector]
            .children
            .iter()
            .rev()
            .map(|&child| &self.nodes[child])
            .find(|node| node.kind == NodeKind::RegularSelector)
            .map(|node| node.value.as_str())
    }

    // ========== attributes ==========

    /// Whether the `]` just seen closes the open attribute selector.
    ///
    /// # Errors
    /// Returns a syntax error for attribute text that can never be closed
    /// validly, such as `[="margin"]` or `[style=]`.
    pub(super) fn is_attribute_closing(&self) -> Result<bool> {
        if !self.attribute_open {
            return Ok(false);
        }
        let attribute = &self.attribute_buffer;
        let no_space: String = attribute.chars().filter(|&c| c != ' ').collect();
        let tokens = tokenize_attribute(&no_space);

        let Some(first) = tokens.first() else {
            return Err(self.error(format!("'[{attribute}]' is not a valid attribute")));
        };
        // `[\:data-service-slot]` is fine, `[="margin"]` is not
        if first.kind == TokenKind::Mark && !first.is_mark('\\') {
            return Err(self.error(format!(
                "'[{attribute}]' is not a valid attribute due to '{}' at start of it",
                first.value
            )));
        }

        let Some(last) = tokens.last() else {
            return Ok(false);
        };
        if last.is_mark('=') {
            return Err(self.error(format!(
                "'[{attribute}]' is not a valid attribute due to '='"
            )));
        }
        let prev_to_last = tokens.len().checked_sub(2).map(|i| &tokens[i]);

        let Some(equal_sign) = tokens.iter().position(|t| t.is_mark('=')) else {
            // `[style]`, or oddities like `[class\"ads-article\"]`
            if last.is_word() {
                return Ok(true);
            }
            return Ok(prev_to_last.is_some_and(|t| t.is_mark('\\'))
                && (last.is_mark('"') || last.is_mark('\'')));
        };

        let opening_quote = tokens
            .get(equal_sign + 1)
            .and_then(|t| t.mark_char())
            .filter(|&c| c == '"' || c == '\'');
        let Some(quote) = opening_quote else {
            // unquoted value: `[style*=margin]`, `[style*=MARGIN i]`
            if last.is_word() {
                return Ok(true);
            }
            return Err(self.error(format!("'[{attribute}]' is not a valid attribute")));
        };
        // `[style*="MARGIN" i]`
        if last.is_word() && last.value.eq_ignore_ascii_case("i") {
            return Ok(prev_to_last.is_some_and(|t| t.is_mark(quote)));
        }
        Ok(last.is_mark(quote))
    }

    // ========== regexp arguments ==========

    /// Whether an unescaped `/` after `prev` starts (or ends) a regexp in the
    /// current absolute pseudo-class argument.
    pub(super) fn is_regexp_opening(&self, prev: &str) -> Result<bool> {
        let Some(name) = self.extended_names.last() else {
            return Err(self.error(format!(
                "regexp pattern allowed only in arg of extended pseudo-class: '{}'",
                self.selector
            )));
        };
        if PseudoClass::lookup(name).is_some_and(PseudoClass::is_contains) {
            return Ok(matches!(prev, "(" | "'" | "\""));
        }
        if prev == "/" && name != PseudoClass::Xpath.as_ref() {
            let value = self.buffer_value();
            let description = if value.is_empty() {
                "arg".to_string()
            } else {
                format!("in arg part: '{value}'")
            };
            return Err(self.error(format!(
                "Invalid regexp pattern for :{name}() pseudo-class {description}"
            )));
        }
        Ok(matches!(prev, "(" | "'" | "\"" | "=" | "." | ":" | " "))
    }

    // ========== finishing ==========

    /// Check the end-of-input invariants and convert the arena into the
    /// public AST.
    pub(super) fn finish(self) -> Result<SelectorList> {
        let Some(root) = self.root else {
            return Err(self.invalid());
        };
        if !self.extended_names.is_empty() || self.extended_brackets > 0 {
            let name = self.extended_names.last().map_or("", String::as_str);
            return Err(self.error(format!(
                "Unbalanced brackets for extended pseudo-class: '{name}'"
            )));
        }
        if self.attribute_open {
            return Err(self.error(format!(
                "Unbalanced attribute brackets in selector: '{}'",
                self.selector
            )));
        }
        self.build_list(root)
    }

    fn build_list(&self, id: usize) -> Result<SelectorList> {
        let children = self.nodes[id]
            .children
            .iter()
            .map(|&child| self.build_selector(child))
            .collect::<Result<Vec<_>>>()?;
        if children.is_empty() {
            return Err(self.invalid());
        }
        Ok(SelectorList { children })
    }

    fn build_selector(&self, id: usize) -> Result<Selector> {
        let mut children = Vec::with_capacity(self.nodes[id].children.len());
        for &child in &self.nodes[id].children {
            let node = &self.nodes[child];
            match node.kind {
                NodeKind::RegularSelector => {
                    let value = node.value.trim_start();
                    if value.is_empty() {
                        return Err(self.invalid());
                    }
                    children.push(SelectorPart::Regular(RegularSelector::new(value)));
                }
                NodeKind::ExtendedSelector => {
                    children.push(SelectorPart::Extended(self.build_extended(child)?));
                }
                _ => return Err(self.invalid()),
            }
        }
        if !matches!(children.first(), Some(SelectorPart::Regular(_))) {
            return Err(self.invalid());
        }
        Ok(Selector { children })
    }

    fn build_extended(&self, id: usize) -> Result<ExtendedSelector> {
        let Some(&pseudo) = self.nodes[id].children.first() else {
            return Err(self.invalid());
        };
        let node = &self.nodes[pseudo];
        let missing_arg = || self.error(format!("Missing arg for :{}() pseudo-class", node.name));
        match node.kind {
            NodeKind::AbsolutePseudoClass => {
                if node.value.trim().is_empty() {
                    return Err(missing_arg());
                }
                Ok(ExtendedSelector::Absolute(AbsolutePseudoClass {
                    name: node.name.clone(),
                    value: node.value.clone(),
                }))
            }
            NodeKind::RelativePseudoClass => {
                let list = node.children.first().ok_or_else(missing_arg)?;
                Ok(ExtendedSelector::Relative(RelativePseudoClass {
                    name: node.name.clone(),
                    selector_list: self.build_list(*list)?,
                }))
            }
            _ => Err(self.invalid()),
        }
    }
}
