//! # Parser Events
//!
//! Events are the intermediate representation between reading tokens and
//! building the tree. The parser emits a **flat sequence** of events
//! describing what it saw in source order; it never decides nesting.
//!
//! ```text
//! StartTag(ul)
//!   StartTag(li)
//!     Text("one")
//!   StartTag(li)        ← the sink implies </li> before this
//!     Text("two")
//! EndTag(ul)            ← closes the open li as well
//! ```
//!
//! All tolerance rules (implied end tags, stray end tags, unclosed elements)
//! live in the [`Sink`](super::sink::Sink), which keeps the stack of open
//! elements.

use crate::attrs::Attributes;
use crate::span::Span;

/// An event emitted by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A start tag, `<name attr="v">` or `<name/>`.
    ///
    /// `span` covers the tag itself, not the element's content.
    StartTag {
        name: String,
        attrs: Attributes,
        self_closing: bool,
        span: Span,
    },

    /// An end tag, `</name>`.
    EndTag { name: String, span: Span },

    /// A run of character data.
    ///
    /// `raw` is set for the content of raw-text elements (`script`,
    /// `style`, ...) which must not be entity-decoded.
    Text { span: Span, raw: bool },

    /// `<!-- ... -->`; `body` excludes the delimiters.
    Comment { span: Span, body: Span },
}

impl Event {
    pub fn span(&self) -> Span {
        match self {
            Event::StartTag { span, .. }
            | Event::EndTag { span, .. }
            | Event::Text { span, .. }
            | Event::Comment { span, .. } => *span,
        }
    }
}
