//! Owned markup tree produced by the [`Sink`](crate::parser::sink::Sink).

use crate::attrs::Attributes;
use crate::span::Span;

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub name: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
    /// Full source text, start tag through end tag (or last child when the
    /// end tag is implied).
    pub span: Span,
    /// Source text between the start tag and the end tag.
    pub inner: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    /// Entity-decoded text. Raw-text elements keep their content verbatim.
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub value: String,
    pub span: Span,
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Text {
            value: value.into(),
            span: Span::default(),
        })
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Element(el) => el.span,
            Node::Text(text) => text.span,
            Node::Comment(comment) => comment.span,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, name: &str) -> bool {
        self.as_element().is_some_and(|el| el.name == name)
    }

    /// Text nodes containing only whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.value.trim().is_empty())
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.value),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
            Node::Comment(_) => {}
        }
    }
}

impl Element {
    /// Build a detached element with no source position.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
            span: Span::default(),
            inner: Span::default(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attrs.has_class(class)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Children that are not blank text or comments.
    pub fn significant_children(&self) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .filter(|n| !n.is_blank_text() && !matches!(n, Node::Comment(_)))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// First descendant element (depth-first, document order) named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}
