//! # quire-markup
//!
//! A small, tolerant markup reader and writer. It is the "builder" the
//! editor engine feeds raw content through before assigning block types.
//!
//! ## Architecture
//!
//! ```text
//! Source text
//!     │
//!     ▼
//! ┌─────────┐
//! │  Lexer  │  Logos-based, context-free tokens
//! └────┬────┘
//!      │ Vec<Token>
//!      ▼
//! ┌─────────┐
//! │ Parser  │  tag/attribute/raw-text recognition
//! └────┬────┘
//!      │ Vec<Event>
//!      ▼
//! ┌─────────┐
//! │  Sink   │  open-element stack, implied end tags
//! └────┬────┘
//!      │
//!      ▼
//! Vec<Node>  ──► serialize::to_markup
//! ```
//!
//! Every node keeps the byte [`Span`] it was read from, so callers can lift
//! the original source of any element verbatim.
//!
//! ## Quick Start
//!
//! ```
//! use quire_markup::{parse, to_markup};
//!
//! let nodes = parse("<p>Fish &amp; chips<br>Peas");
//! assert_eq!(to_markup(&nodes), "<p>Fish &amp; chips<br>Peas</p>");
//! ```

pub mod attrs;
pub mod dom;
pub mod lexer;
pub mod parser;
pub mod serialize;
pub mod span;
pub mod tags;

pub use attrs::{Attributes, Style};
pub use dom::{Comment, Element, Node, Text};
pub use parser::parse;
pub use serialize::{inner_markup, to_markup};
pub use span::Span;
