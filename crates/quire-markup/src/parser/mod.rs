//! # Parser - Event-Based Tree Construction
//!
//! Builds a markup tree from a token stream in two passes:
//!
//! 1. [`Parser`] walks the tokens once and emits a flat list of
//!    [`Event`]s (start tag, end tag, text, comment). It resolves everything
//!    that depends on token context: attribute names and values, quoted
//!    strings, raw-text element content.
//! 2. [`Sink`] replays the events against a stack of open elements and
//!    produces owned [`Node`]s, applying the tolerance rules.
//!
//! ## Never Fails
//!
//! There is no error type. Any byte sequence yields a tree:
//!
//! - a tag left open at EOF ends at EOF
//! - an end tag with no open element is dropped
//! - `<p>`, `<li>`, `<dt>`/`<dd>`, `<tr>`, `<td>`/`<th>` and `<option>` are
//!   closed implicitly when a sibling or an enclosing end tag arrives
//! - a `<` that does not start a tag is text
//!
//! ```
//! use quire_markup::parse;
//!
//! let nodes = parse("<ul><li>one<li>two</ul>");
//! let ul = nodes[0].as_element().unwrap();
//! assert_eq!(ul.child_elements().count(), 2);
//! ```

pub mod event;
pub mod sink;

use crate::attrs::Attributes;
use crate::dom::Node;
use crate::lexer::{Token, TokenKind, lex};
use crate::span::Span;
use crate::tags;
use event::Event;
use sink::Sink;

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
pub struct Parser<'t, 'input> {
    source: &'input str,
    tokens: &'t [Token<'input>],
    pos: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(source: &'input str, tokens: &'t [Token<'input>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            events: Vec::new(),
        }
    }

    /// Parse the tokens and return the top-level nodes.
    pub fn parse(self) -> Vec<Node> {
        let source = self.source;
        let events = self.into_events();
        Sink::new(source, events).finish()
    }

    /// Run the first pass only.
    pub fn into_events(mut self) -> Vec<Event> {
        while let Some(kind) = self.current() {
            match kind {
                TokenKind::StartTagOpen => self.start_tag(),
                TokenKind::EndTagOpen => self.end_tag(),
                TokenKind::CommentOpen => self.comment(),
                // Doctypes and other declarations carry no content
                TokenKind::Declaration => self.pos += 1,
                _ => self.text_run(),
            }
        }
        self.events
    }

    /// Current token kind, or `None` at end of input.
    fn current(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    /// Byte offset of the current token (source length at EOF).
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.source.len())
    }

    fn current_text(&self) -> &'input str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    fn skip_whitespace(&mut self) {
        while self.at(TokenKind::Whitespace) {
            self.pos += 1;
        }
    }

    fn text_run(&mut self) {
        let start = self.offset();
        while let Some(kind) = self.current() {
            if matches!(
                kind,
                TokenKind::StartTagOpen
                    | TokenKind::EndTagOpen
                    | TokenKind::CommentOpen
                    | TokenKind::Declaration
            ) {
                break;
            }
            self.pos += 1;
        }
        self.events.push(Event::Text {
            span: Span::new(start, self.offset()),
            raw: false,
        });
    }

    fn start_tag(&mut self) {
        let start = self.offset();
        let name = self.current_text()[1..].to_ascii_lowercase();
        self.pos += 1;

        let mut attrs = Attributes::new();
        let mut self_closing = false;
        let end = loop {
            match self.current() {
                None => break self.source.len(),
                Some(TokenKind::Gt) => {
                    self.pos += 1;
                    break self.offset();
                }
                Some(TokenKind::SelfClose) => {
                    self_closing = true;
                    self.pos += 1;
                    break self.offset();
                }
                // A new tag starts before this one was closed; end it here
                Some(
                    TokenKind::StartTagOpen
                    | TokenKind::EndTagOpen
                    | TokenKind::CommentOpen
                    | TokenKind::Lt,
                ) => break self.offset(),
                Some(TokenKind::Text | TokenKind::Dash) => self.attribute(&mut attrs),
                // Stray whitespace, slashes, quotes and equals signs
                Some(_) => self.pos += 1,
            }
        };

        self.events.push(Event::StartTag {
            name: name.clone(),
            attrs,
            self_closing,
            span: Span::new(start, end),
        });

        if tags::is_raw_text(&name) && !self_closing {
            self.raw_text(&name);
        }
    }

    fn attribute(&mut self, attrs: &mut Attributes) {
        let mut name = String::new();
        while let Some(TokenKind::Text | TokenKind::Dash) = self.current() {
            name.push_str(self.current_text());
            self.pos += 1;
        }
        let name = name.to_ascii_lowercase();

        self.skip_whitespace();
        if !self.at(TokenKind::Eq) {
            attrs.insert_if_absent(name, String::new());
            return;
        }
        self.pos += 1;
        self.skip_whitespace();

        let raw = match self.current() {
            Some(quote @ (TokenKind::DoubleQuote | TokenKind::SingleQuote)) => {
                self.pos += 1;
                let start = self.offset();
                while self.current().is_some_and(|k| k != quote) {
                    self.pos += 1;
                }
                let end = self.offset();
                if self.at(quote) {
                    self.pos += 1;
                }
                &self.source[start..end]
            }
            _ => {
                let start = self.offset();
                while let Some(kind) = self.current() {
                    if matches!(
                        kind,
                        TokenKind::Whitespace
                            | TokenKind::Gt
                            | TokenKind::SelfClose
                            | TokenKind::StartTagOpen
                            | TokenKind::EndTagOpen
                    ) {
                        break;
                    }
                    self.pos += 1;
                }
                &self.source[start..self.offset()]
            }
        };
        attrs.insert_if_absent(name, html_escape::decode_html_entities(raw).into_owned());
    }

    /// Consume everything up to the matching end tag as one text event.
    fn raw_text(&mut self, name: &str) {
        let start = self.offset();
        while let Some(kind) = self.current() {
            if kind == TokenKind::EndTagOpen
                && self.current_text()[2..].eq_ignore_ascii_case(name)
            {
                break;
            }
            self.pos += 1;
        }
        let span = Span::new(start, self.offset());
        if !span.is_empty() {
            self.events.push(Event::Text { span, raw: true });
        }
    }

    fn end_tag(&mut self) {
        let start = self.offset();
        let name = self.current_text()[2..].to_ascii_lowercase();
        self.pos += 1;
        // Attributes on end tags are ignored
        while let Some(kind) = self.current() {
            match kind {
                TokenKind::Gt => {
                    self.pos += 1;
                    break;
                }
                TokenKind::StartTagOpen | TokenKind::EndTagOpen | TokenKind::CommentOpen => break,
                _ => self.pos += 1,
            }
        }
        self.events.push(Event::EndTag {
            name,
            span: Span::new(start, self.offset()),
        });
    }

    fn comment(&mut self) {
        let start = self.offset();
        self.pos += 1;
        let body_start = self.offset();
        while self.current().is_some_and(|k| k != TokenKind::CommentClose) {
            self.pos += 1;
        }
        let body_end = self.offset();
        if self.at(TokenKind::CommentClose) {
            self.pos += 1;
        }
        self.events.push(Event::Comment {
            span: Span::new(start, self.offset()),
            body: Span::new(body_start, body_end),
        });
    }
}

/// Parse markup into a list of top-level nodes.
pub fn parse(input: &str) -> Vec<Node> {
    let tokens = lex(input);
    Parser::new(input, &tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn events(input: &str) -> Vec<Event> {
        let tokens = lex(input);
        Parser::new(input, &tokens).into_events()
    }

    #[test]
    fn start_tag_attributes() {
        let evs = events(r#"<A Href='x.html' data-id=7 hidden title="a &amp; b">"#);
        let Event::StartTag { name, attrs, .. } = &evs[0] else {
            panic!("expected start tag, got {evs:?}");
        };
        assert_eq!(name, "a");
        assert_eq!(
            attrs.iter().collect::<Vec<_>>(),
            vec![
                ("href", "x.html"),
                ("data-id", "7"),
                ("hidden", ""),
                ("title", "a & b"),
            ]
        );
    }

    #[test]
    fn quoted_values_may_contain_markup_characters() {
        let evs = events(r#"<img alt="a > b / c = 'd'" src=x.png/>"#);
        let Event::StartTag {
            attrs,
            self_closing,
            ..
        } = &evs[0]
        else {
            panic!("expected start tag, got {evs:?}");
        };
        assert_eq!(attrs.get("alt"), Some("a > b / c = 'd'"));
        assert_eq!(attrs.get("src"), Some("x.png"));
        assert!(*self_closing);
        assert_eq!(evs.len(), 1);
    }

    #[test]
    fn raw_text_is_not_tokenized() {
        let evs = events("<script>if (a < b) { x = '</p>'; }</script>");
        assert_eq!(
            evs[1],
            Event::Text {
                span: Span::new(8, 34),
                raw: true
            }
        );
        assert!(matches!(&evs[2], Event::EndTag { name, .. } if name == "script"));
    }

    #[test]
    fn unterminated_comment_runs_to_eof() {
        let evs = events("a<!-- never closed");
        assert_eq!(
            evs[1],
            Event::Comment {
                span: Span::new(1, 18),
                body: Span::new(5, 18)
            }
        );
    }

    #[test]
    fn spans_cover_tags() {
        let input = "<p class=x>hi</p>";
        let evs = events(input);
        let spans: Vec<&str> = evs.iter().map(|e| e.span().slice(input)).collect();
        assert_eq!(spans, vec!["<p class=x>", "hi", "</p>"]);
    }
}
