//! Sink for converting parser events into an owned markup tree.

use crate::dom::{Comment, Element, Node, Text};
use crate::parser::event::Event;
use crate::span::Span;
use crate::tags;

/// Elements that stop the search for an element to close implicitly.
const SCOPE_BOUNDARIES: &[&str] = &[
    "table", "td", "th", "caption", "button", "object", "template",
];

/// Replays events against a stack of open elements.
pub struct Sink<'s> {
    source: &'s str,
    events: Vec<Event>,
    stack: Vec<Element>,
    roots: Vec<Node>,
    /// End offset of the last event processed.
    last_end: usize,
}

impl<'s> Sink<'s> {
    pub fn new(source: &'s str, events: Vec<Event>) -> Self {
        Self {
            source,
            events,
            stack: Vec::new(),
            roots: Vec::new(),
            last_end: 0,
        }
    }

    /// Consume the sink and build the tree.
    pub fn finish(mut self) -> Vec<Node> {
        let events = std::mem::take(&mut self.events);
        for event in events {
            let span = event.span();
            match event {
                Event::StartTag {
                    name,
                    attrs,
                    self_closing,
                    span,
                } => {
                    self.imply_end_tags(&name, span.start);
                    let element = Element {
                        name,
                        attrs,
                        children: Vec::new(),
                        span,
                        inner: Span::new(span.end, span.end),
                    };
                    if self_closing || tags::is_void(&element.name) {
                        self.append(Node::Element(element));
                    } else {
                        self.stack.push(element);
                    }
                }
                Event::EndTag { name, span } => self.end_tag(&name, span),
                Event::Text { span, raw } => {
                    let slice = span.slice(self.source);
                    let value = if raw {
                        slice.to_string()
                    } else {
                        html_escape::decode_html_entities(slice).into_owned()
                    };
                    self.append(Node::Text(Text { value, span }));
                }
                Event::Comment { span, body } => {
                    let value = body.slice(self.source).to_string();
                    self.append(Node::Comment(Comment { value, span }));
                }
            }
            self.last_end = span.end;
        }

        while !self.stack.is_empty() {
            self.close_top(self.last_end, self.last_end);
        }
        self.roots
    }

    fn append(&mut self, node: Node) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        // Adjacent runs merge; the span then also covers whatever was
        // dropped between them (declarations, stray end tags)
        if let (Some(Node::Text(prev)), Node::Text(next)) = (siblings.last_mut(), &node) {
            prev.value.push_str(&next.value);
            prev.span.end = next.span.end;
            return;
        }
        siblings.push(node);
    }

    /// Pop the innermost open element and attach it to its parent.
    fn close_top(&mut self, inner_end: usize, end: usize) {
        if let Some(mut element) = self.stack.pop() {
            element.inner.end = inner_end.max(element.inner.start);
            element.span.end = end.max(element.inner.end);
            self.append(Node::Element(element));
        }
    }

    /// Index of the innermost open element named one of `names`, searching
    /// no further than the first element named in `boundaries`.
    fn open_in_scope(&self, names: &[&str], boundaries: &[&str]) -> Option<usize> {
        for (index, element) in self.stack.iter().enumerate().rev() {
            if names.contains(&element.name.as_str()) {
                return Some(index);
            }
            if boundaries.contains(&element.name.as_str()) {
                return None;
            }
        }
        None
    }

    fn close_down_to(&mut self, index: usize, at: usize) {
        while self.stack.len() > index {
            self.close_top(at, at);
        }
    }

    fn imply_end_tags(&mut self, name: &str, at: usize) {
        if tags::closes_paragraph(name)
            && let Some(index) = self.open_in_scope(&["p"], SCOPE_BOUNDARIES)
        {
            self.close_down_to(index, at);
        }

        let (names, boundaries): (&[&str], &[&str]) = match name {
            "li" => (&["li"], &["ul", "ol", "table"]),
            "dt" | "dd" => (&["dt", "dd"], &["dl", "table"]),
            "tr" => (&["tr"], &["table"]),
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            "option" => (&["option"], &["select", "datalist"]),
            _ => return,
        };
        if let Some(index) = self.open_in_scope(names, boundaries) {
            self.close_down_to(index, at);
        }
    }

    fn end_tag(&mut self, name: &str, span: Span) {
        if tags::is_void(name) {
            return;
        }
        let Some(index) = self.stack.iter().rposition(|el| el.name == name) else {
            // Stray end tag
            return;
        };
        self.close_down_to(index + 1, span.start);
        self.close_top(span.start, span.end);
    }
}
