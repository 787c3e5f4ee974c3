//! A small XPath 1.0 evaluator over [`DomTree`].
//!
//! Supports location paths (absolute, relative, `//`), the axes `child`,
//! `descendant`, `descendant-or-self`, `parent`, `ancestor`,
//! `ancestor-or-self`, `self`, `following-sibling`, `preceding-sibling`,
//! `following` and `preceding`, the abbreviations `.`, `..`, `@` and `*`,
//! unions with `|`, and predicates built from comparisons, `and`/`or` and the
//! core functions most filter rules use. Results are element nodes only.

use std::collections::{HashMap, HashSet};

use crate::error::XPathError;
use crate::{DomTree, NodeId, NodeType};

/// [§ 3.7 Lexical Structure](https://www.w3.org/TR/1999/REC-xpath-19991116/#exprlex)
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    At,
    Comma,
    DoubleColon,
    Dot,
    DoubleDot,
    Star,
    Pipe,
    Operator(CompareOp),
    Name(String),
    Literal(String),
    Number(f64),
}

/// [§ 3.4 Booleans](https://www.w3.org/TR/1999/REC-xpath-19991116/#booleans) comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// [§ 2.2 Axes](https://www.w3.org/TR/1999/REC-xpath-19991116/#axes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "self" => Self::SelfAxis,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            _ => return None,
        })
    }
}

/// [§ 2.3 Node Tests](https://www.w3.org/TR/1999/REC-xpath-19991116/#node-tests)
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    /// `node()`
    AnyNode,
    /// `*`
    AnyElement,
    /// A name test, compared ASCII case-insensitively.
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

/// Non-element final step of a path, only usable inside predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Tail {
    /// `text()`
    Text,
    /// `@name` or `@*`
    Attribute(Option<String>),
}

/// [§ 2 Location Paths](https://www.w3.org/TR/1999/REC-xpath-19991116/#location-paths)
#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
    tail: Option<Tail>,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
    Literal(String),
    Number(f64),
    Path(LocationPath),
}

/// [§ 4 Core Function Library](https://www.w3.org/TR/1999/REC-xpath-19991116/#corelib) subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Last,
    Position,
    Count,
    Name,
    String,
    Concat,
    Contains,
    StartsWith,
    NormalizeSpace,
    StringLength,
    Not,
    True,
    False,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Self::Last,
            "position" => Self::Position,
            "count" => Self::Count,
            "name" | "local-name" => Self::Name,
            "string" => Self::String,
            "concat" => Self::Concat,
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "normalize-space" => Self::NormalizeSpace,
            "string-length" => Self::StringLength,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        })
    }
}

/// A compiled expression: a union of element-valued location paths.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    paths: Vec<LocationPath>,
}

/// Compile `expression` without evaluating it.
///
/// # Errors
/// Returns [`XPathError::Syntax`] for malformed input and
/// [`XPathError::Unsupported`] for features outside the subset.
pub fn compile(expression: &str) -> Result<XPath, XPathError> {
    let tokens = lex(expression)?;
    let mut parser = Parser {
        expression,
        tokens,
        position: 0,
    };
    let mut paths = vec![parser.parse_path()?];
    while parser.eat(&Token::Pipe) {
        paths.push(parser.parse_path()?);
    }
    if let Some(token) = parser.peek() {
        return Err(parser.syntax(format!("unexpected {token:?}")));
    }
    if paths.iter().any(|p| p.tail.is_some()) {
        return Err(XPathError::Unsupported {
            expression: expression.to_string(),
            feature: "results other than element nodes".to_string(),
        });
    }
    Ok(XPath { paths })
}

/// Compile and evaluate `expression` with `context` as the context node.
///
/// # Errors
/// See [`compile`].
pub fn evaluate(
    tree: &DomTree,
    context: NodeId,
    expression: &str,
) -> Result<Vec<NodeId>, XPathError> {
    Ok(compile(expression)?.evaluate(tree, context))
}

impl XPath {
    /// Element nodes selected from `context`, in document order.
    #[must_use]
    pub fn evaluate(&self, tree: &DomTree, context: NodeId) -> Vec<NodeId> {
        let evaluator = Evaluator::new(tree);
        let mut nodes: Vec<NodeId> = self
            .paths
            .iter()
            .flat_map(|path| evaluator.select(path, context))
            .filter(|&n| tree.as_element(n).is_some())
            .collect();
        evaluator.sort_unique(&mut nodes);
        nodes
    }
}

fn lex(expression: &str) -> Result<Vec<Token>, XPathError> {
    let chars: Vec<char> = expression.chars().collect();
    let syntax = |reason: String| XPathError::Syntax {
        expression: expression.to_string(),
        reason,
    };
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(&c) = chars.get(i) {
        let next = chars.get(i + 1).copied();
        let (token, width) = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LeftBracket, 1),
            ']' => (Token::RightBracket, 1),
            '(' => (Token::LeftParen, 1),
            ')' => (Token::RightParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '*' => (Token::Star, 1),
            ':' if next == Some(':') => (Token::DoubleColon, 2),
            '=' => (Token::Operator(CompareOp::Eq), 1),
            '!' if next == Some('=') => (Token::Operator(CompareOp::Ne), 2),
            '<' if next == Some('=') => (Token::Operator(CompareOp::Le), 2),
            '<' => (Token::Operator(CompareOp::Lt), 1),
            '>' if next == Some('=') => (Token::Operator(CompareOp::Ge), 2),
            '>' => (Token::Operator(CompareOp::Gt), 1),
            '.' if next == Some('.') => (Token::DoubleDot, 2),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => (Token::Dot, 1),
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| syntax("unterminated string literal".to_string()))?;
                let literal: String = chars[i + 1..i + 1 + end].iter().collect();
                (Token::Literal(literal), end + 2)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|d| d.is_ascii_digit() || **d == '.')
                    .count();
                let text: String = chars[i..i + len].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(format!("invalid number '{text}'")))?;
                (Token::Number(number), len)
            }
            c if c.is_alphabetic() || c == '_' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|d| d.is_alphanumeric() || matches!(d, '-' | '_' | '.'))
                    .count();
                (Token::Name(chars[i..i + len].iter().collect()), len)
            }
            other => return Err(syntax(format!("unexpected character '{other}'"))),
        };
        tokens.push(token);
        i += width;
    }
    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser<'_> {
    fn syntax(&self, reason: impl Into<String>) -> XPathError {
        XPathError::Syntax {
            expression: self.expression.to_string(),
            reason: reason.into(),
        }
    }

    fn unsupported(&self, feature: impl Into<String>) -> XPathError {
        XPathError::Unsupported {
            expression: self.expression.to_string(),
            feature: feature.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned()?;
        self.position += 1;
        Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.syntax(format!("expected {token:?}")))
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DoubleDot | Token::At | Token::Star | Token::Name(_))
        )
    }

    /// [§ 2.5 Abbreviated Syntax](https://www.w3.org/TR/1999/REC-xpath-19991116/#path-abbrev)
    ///
    /// "// is short for /descendant-or-self::node()/"
    fn descendant_or_self() -> Step {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }

    fn parse_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut path = LocationPath {
            absolute: false,
            steps: Vec::new(),
            tail: None,
        };
        if self.eat(&Token::Slash) {
            path.absolute = true;
            if !self.at_step_start() {
                return Ok(path);
            }
        } else if self.eat(&Token::DoubleSlash) {
            path.absolute = true;
            path.steps.push(Self::descendant_or_self());
        }
        self.parse_step(&mut path)?;
        loop {
            if self.eat(&Token::Slash) {
                self.parse_step(&mut path)?;
            } else if self.eat(&Token::DoubleSlash) {
                path.steps.push(Self::descendant_or_self());
                self.parse_step(&mut path)?;
            } else {
                return Ok(path);
            }
        }
    }

    /// [§ 2.1 Location Steps](https://www.w3.org/TR/1999/REC-xpath-19991116/#location-steps)
    fn parse_step(&mut self, path: &mut LocationPath) -> Result<(), XPathError> {
        if path.tail.is_some() {
            return Err(self.syntax("step after text() or attribute"));
        }
        let step = match self.advance() {
            Some(Token::Dot) => Step {
                axis: Axis::SelfAxis,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            },
            Some(Token::DoubleDot) => Step {
                axis: Axis::Parent,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            },
            Some(Token::At) => {
                let name = match self.advance() {
                    Some(Token::Name(name)) => Some(name.to_ascii_lowercase()),
                    Some(Token::Star) => None,
                    _ => return Err(self.syntax("expected an attribute name after '@'")),
                };
                path.tail = Some(Tail::Attribute(name));
                return Ok(());
            }
            Some(Token::Star) => {
                let predicates = self.parse_predicates()?;
                Step {
                    axis: Axis::Child,
                    test: NodeTest::AnyElement,
                    predicates,
                }
            }
            Some(Token::Name(name)) => {
                let mut axis = Axis::Child;
                let mut test_name = name;
                if self.eat(&Token::DoubleColon) {
                    if test_name == "attribute" {
                        return Err(self.unsupported("the attribute axis"));
                    }
                    axis = Axis::from_name(&test_name)
                        .ok_or_else(|| self.syntax(format!("unknown axis '{test_name}'")))?;
                    test_name = match self.advance() {
                        Some(Token::Name(name)) => name,
                        Some(Token::Star) => "*".to_string(),
                        _ => return Err(self.syntax("expected a node test after '::'")),
                    };
                }
                let test = if test_name == "*" {
                    NodeTest::AnyElement
                } else if self.peek() == Some(&Token::LeftParen) {
                    let _ = self.advance();
                    self.expect(&Token::RightParen)?;
                    match test_name.as_str() {
                        "node" => NodeTest::AnyNode,
                        "text" if axis == Axis::Child => {
                            path.tail = Some(Tail::Text);
                            return Ok(());
                        }
                        other => return Err(self.unsupported(format!("node test '{other}()'"))),
                    }
                } else {
                    NodeTest::Name(test_name.to_ascii_lowercase())
                };
                let predicates = self.parse_predicates()?;
                Step {
                    axis,
                    test,
                    predicates,
                }
            }
            other => return Err(self.syntax(format!("expected a location step, found {other:?}"))),
        };
        path.steps.push(step);
        Ok(())
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_comparison()?;
        while self.eat_keyword("and") {
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_primary()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let op = *op;
            let _ = self.advance();
            let right = self.parse_primary()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::LeftParen) => {
                let _ = self.advance();
                let inner = self.parse_or()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Literal(s)) => {
                let s = s.clone();
                let _ = self.advance();
                Ok(Expr::Literal(s))
            }
            Some(Token::Number(n)) => {
                let n = *n;
                let _ = self.advance();
                Ok(Expr::Number(n))
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LeftParen)
                    && !matches!(name.as_str(), "node" | "text") =>
            {
                let name = name.clone();
                let function = Function::from_name(&name)
                    .ok_or_else(|| self.unsupported(format!("function '{name}()'")))?;
                let _ = self.advance();
                let _ = self.advance();
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    args.push(self.parse_or()?);
                    while self.eat(&Token::Comma) {
                        args.push(self.parse_or()?);
                    }
                    self.expect(&Token::RightParen)?;
                }
                Ok(Expr::Call(function, args))
            }
            _ => Ok(Expr::Path(self.parse_path()?)),
        }
    }
}

/// [§ 1 Introduction](https://www.w3.org/TR/1999/REC-xpath-19991116/#section-Introduction)
/// "An expression evaluates to yield an object, which has one of the
/// following four basic types: node-set, boolean, number, string."
///
/// Node-sets of attribute or text nodes are represented by their values.
#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<NodeId>),
    Values(Vec<String>),
    Boolean(bool),
    Number(f64),
    String(String),
}

/// [§ 1 Introduction](https://www.w3.org/TR/1999/REC-xpath-19991116/#section-Introduction)
/// "the context position, the context size"
#[derive(Debug, Clone, Copy)]
struct Context {
    node: NodeId,
    position: usize,
    size: usize,
}

struct Evaluator<'a> {
    tree: &'a DomTree,
    /// Preorder index of every node.
    order: HashMap<NodeId, usize>,
}

impl<'a> Evaluator<'a> {
    fn new(tree: &'a DomTree) -> Self {
        let order = std::iter::once(NodeId::ROOT)
            .chain(tree.descendants(NodeId::ROOT))
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        Self { tree, order }
    }

    fn sort_unique(&self, nodes: &mut Vec<NodeId>) {
        let mut seen = HashSet::new();
        nodes.retain(|n| seen.insert(*n));
        nodes.sort_by_key(|n| self.order.get(n).copied().unwrap_or(usize::MAX));
    }

    fn is_node(&self, id: NodeId) -> bool {
        matches!(
            self.tree.get(id).map(|n| &n.node_type),
            Some(NodeType::Element(_) | NodeType::Document)
        )
    }

    /// Nodes on `axis` from `node`, in axis order (reverse axes nearest first).
    fn axis_nodes(&self, axis: Axis, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree;
        let nodes: Vec<NodeId> = match axis {
            Axis::Child => tree.children(node).to_vec(),
            Axis::Descendant => tree.descendants(node),
            Axis::DescendantOrSelf => std::iter::once(node).chain(tree.descendants(node)).collect(),
            Axis::Parent => tree.parent(node).into_iter().collect(),
            Axis::Ancestor => tree.ancestors(node).collect(),
            Axis::AncestorOrSelf => std::iter::once(node).chain(tree.ancestors(node)).collect(),
            Axis::SelfAxis => vec![node],
            Axis::FollowingSibling => tree.following_siblings(node).collect(),
            Axis::PrecedingSibling => tree.preceding_siblings(node).collect(),
            Axis::Following => {
                let own = self.order.get(&node).copied().unwrap_or(usize::MAX);
                let mut after: Vec<NodeId> = self
                    .order
                    .iter()
                    .filter(|&(&id, &i)| i > own && !tree.is_descendant_of(id, node))
                    .map(|(&id, _)| id)
                    .collect();
                after.sort_by_key(|id| self.order.get(id).copied());
                after
            }
            Axis::Preceding => {
                let own = self.order.get(&node).copied().unwrap_or(0);
                let mut before: Vec<NodeId> = self
                    .order
                    .iter()
                    .filter(|&(&id, &i)| i < own && !tree.is_descendant_of(node, id))
                    .map(|(&id, _)| id)
                    .collect();
                before.sort_by_key(|id| std::cmp::Reverse(self.order.get(id).copied()));
                before
            }
        };
        nodes.into_iter().filter(|&n| self.is_node(n)).collect()
    }

    fn test_matches(&self, test: &NodeTest, node: NodeId) -> bool {
        match test {
            NodeTest::AnyNode => true,
            NodeTest::AnyElement => self.tree.as_element(node).is_some(),
            NodeTest::Name(name) => self
                .tree
                .as_element(node)
                .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(name)),
        }
    }

    /// Element (or document) nodes selected by the steps of `path`.
    fn select(&self, path: &LocationPath, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![if path.absolute { NodeId::ROOT } else { context }];
        for step in &path.steps {
            let mut next = Vec::new();
            for &node in &current {
                let mut candidates: Vec<NodeId> = self
                    .axis_nodes(step.axis, node)
                    .into_iter()
                    .filter(|&n| self.test_matches(&step.test, n))
                    .collect();
                for predicate in &step.predicates {
                    let size = candidates.len();
                    candidates = candidates
                        .into_iter()
                        .enumerate()
                        .filter(|&(i, n)| {
                            let ctx = Context {
                                node: n,
                                position: i + 1,
                                size,
                            };
                            self.predicate_holds(predicate, ctx)
                        })
                        .map(|(_, n)| n)
                        .collect();
                }
                next.extend(candidates);
            }
            self.sort_unique(&mut next);
            current = next;
        }
        current
    }

    /// [§ 2.4 Predicates](https://www.w3.org/TR/1999/REC-xpath-19991116/#predicates)
    ///
    /// "If the result is a number, the result will be converted to true if the
    /// number is equal to the context position."
    #[allow(clippy::cast_precision_loss)]
    fn predicate_holds(&self, predicate: &Expr, ctx: Context) -> bool {
        match self.eval(predicate, ctx) {
            Value::Number(n) => (n - ctx.position as f64).abs() < f64::EPSILON,
            other => to_boolean(&other),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn eval(&self, expr: &Expr, ctx: Context) -> Value {
        match expr {
            Expr::Or(l, r) => Value::Boolean(
                to_boolean(&self.eval(l, ctx)) || to_boolean(&self.eval(r, ctx)),
            ),
            Expr::And(l, r) => Value::Boolean(
                to_boolean(&self.eval(l, ctx)) && to_boolean(&self.eval(r, ctx)),
            ),
            Expr::Compare(op, l, r) => {
                Value::Boolean(self.compare(*op, &self.eval(l, ctx), &self.eval(r, ctx)))
            }
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Number(n) => Value::Number(*n),
            Expr::Path(path) => {
                let nodes = self.select(path, ctx.node);
                match &path.tail {
                    None => Value::Nodes(nodes),
                    Some(Tail::Text) => Value::Values(
                        nodes
                            .iter()
                            .flat_map(|&n| self.tree.children(n))
                            .filter_map(|&c| self.tree.as_text(c).map(str::to_string))
                            .collect(),
                    ),
                    Some(Tail::Attribute(name)) => Value::Values(
                        nodes
                            .iter()
                            .filter_map(|&n| self.tree.as_element(n))
                            .flat_map(|e| {
                                e.attrs.iter().filter_map(|(k, v)| {
                                    name.as_ref()
                                        .is_none_or(|name| k.eq_ignore_ascii_case(name))
                                        .then(|| v.clone())
                                })
                            })
                            .collect(),
                    ),
                }
            }
            Expr::Call(function, args) => self.call(*function, args, ctx),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn call(&self, function: Function, args: &[Expr], ctx: Context) -> Value {
        let arg = |i: usize| args.get(i).map(|a| self.eval(a, ctx));
        let string_arg = |i: usize| {
            arg(i).map_or_else(|| self.tree.text_content(ctx.node), |v| self.string(&v))
        };
        match function {
            Function::Last => Value::Number(ctx.size as f64),
            Function::Position => Value::Number(ctx.position as f64),
            Function::Count => Value::Number(match arg(0) {
                Some(Value::Nodes(n)) => n.len() as f64,
                Some(Value::Values(v)) => v.len() as f64,
                _ => 0.0,
            }),
            Function::Name => {
                let node = match arg(0) {
                    Some(Value::Nodes(n)) => n.first().copied(),
                    Some(_) => None,
                    None => Some(ctx.node),
                };
                Value::String(
                    node.and_then(|n| self.tree.as_element(n))
                        .map(|e| e.tag_name.clone())
                        .unwrap_or_default(),
                )
            }
            Function::String => Value::String(string_arg(0)),
            Function::Concat => Value::String(
                (0..args.len())
                    .map(|i| arg(i).map(|v| self.string(&v)).unwrap_or_default())
                    .collect(),
            ),
            Function::Contains => Value::Boolean(string_arg(0).contains(&string_arg(1))),
            Function::StartsWith => Value::Boolean(string_arg(0).starts_with(&string_arg(1))),
            Function::NormalizeSpace => Value::String(
                string_arg(0).split_whitespace().collect::<Vec<_>>().join(" "),
            ),
            Function::StringLength => Value::Number(string_arg(0).chars().count() as f64),
            Function::Not => Value::Boolean(!arg(0).is_some_and(|v| to_boolean(&v))),
            Function::True => Value::Boolean(true),
            Function::False => Value::Boolean(false),
        }
    }

    /// [§ 4.2 string()](https://www.w3.org/TR/1999/REC-xpath-19991116/#function-string)
    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(n) => n
                .first()
                .map(|&n| self.tree.text_content(n))
                .unwrap_or_default(),
            Value::Values(v) => v.first().cloned().unwrap_or_default(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// String values of a node-set's members, or the single value otherwise.
    fn atoms(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Nodes(n) => n.iter().map(|&n| self.tree.text_content(n)).collect(),
            Value::Values(v) => v.clone(),
            other => vec![self.string(other)],
        }
    }

    /// [§ 3.4 Booleans](https://www.w3.org/TR/1999/REC-xpath-19991116/#booleans)
    ///
    /// Node-set comparisons are existential: true if any member satisfies it.
    fn compare(&self, op: CompareOp, left: &Value, right: &Value) -> bool {
        if let (Value::Boolean(_), _) | (_, Value::Boolean(_)) = (left, right) {
            let (l, r) = (to_boolean(left), to_boolean(right));
            return match op {
                CompareOp::Eq => l == r,
                CompareOp::Ne => l != r,
                _ => compare_numbers(op, f64::from(u8::from(l)), f64::from(u8::from(r))),
            };
        }
        let numeric = matches!(left, Value::Number(_))
            || matches!(right, Value::Number(_))
            || !matches!(op, CompareOp::Eq | CompareOp::Ne);
        let (ls, rs) = (self.atoms(left), self.atoms(right));
        ls.iter().any(|l| {
            rs.iter().any(|r| {
                if numeric {
                    compare_numbers(op, to_number(l), to_number(r))
                } else {
                    match op {
                        CompareOp::Ne => l != r,
                        _ => l == r,
                    }
                }
            })
        })
    }
}

/// [§ 4.3 boolean()](https://www.w3.org/TR/1999/REC-xpath-19991116/#function-boolean)
fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Nodes(n) => !n.is_empty(),
        Value::Values(v) => !v.is_empty(),
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
    }
}

/// [§ 4.4 number()](https://www.w3.org/TR/1999/REC-xpath-19991116/#function-number)
fn to_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

fn compare_numbers(op: CompareOp, l: f64, r: f64) -> bool {
    match op {
        CompareOp::Eq => (l - r).abs() < f64::EPSILON,
        CompareOp::Ne => (l - r).abs() >= f64::EPSILON || l.is_nan() || r.is_nan(),
        CompareOp::Lt => l < r,
        CompareOp::Le => l <= r,
        CompareOp::Gt => l > r,
        CompareOp::Ge => l >= r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_rejects_text_result() {
        assert!(matches!(
            compile("//div/text()"),
            Err(XPathError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_compile_syntax_errors() {
        assert!(matches!(compile("//div["), Err(XPathError::Syntax { .. })));
        assert!(matches!(compile("//div[@a='x]"), Err(XPathError::Syntax { .. })));
        assert!(matches!(compile("bogus::div"), Err(XPathError::Syntax { .. })));
    }

    #[test]
    fn test_compile_unknown_function() {
        assert!(matches!(
            compile("//div[translate(., 'a', 'b')]"),
            Err(XPathError::Unsupported { .. })
        ));
    }
}
