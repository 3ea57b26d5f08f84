//! # quire-engine
//!
//! The document core of the quire editor: a typed block tree, the pipeline
//! that turns raw markup (or JSON, or a single line) into that tree and
//! back, a caret model expressed as plain-text offsets, and undo/redo.
//!
//! ## Pipeline
//!
//! ```text
//! markup ──► quire_markup::parse ──► Paragraphizer ──► TreeBuilder ──► BlockTree
//!                                                         ▲               │
//!                                              Catalog ───┘               ▼
//!                                                               Unparser / JsonWriter
//! ```
//!
//! The [`Catalog`] decides which [`BlockType`] each element becomes and
//! where it may live. Per-type behavior (how a type builds, unparses and
//! converts to JSON) sits behind [`blocks::BlockBehavior`].
//!
//! ## Quick Start
//!
//! ```
//! use quire_engine::Editor;
//!
//! let mut editor = Editor::default();
//! editor.load("<div>Hello<br><br>World</div>");
//! assert_eq!(editor.unparse(), "<p>Hello</p><p>World</p>");
//! ```

pub mod blocks;
pub mod catalog;
pub mod editing;
pub mod editor;
pub mod error;
pub mod history;
pub mod json;
pub mod model;
pub mod offset;
pub mod parsing;
pub mod ready;
pub mod unparse;

pub use catalog::{BlockType, Catalog};
pub use editing::{Cmd, Patch};
pub use editor::{Editor, EditorEvent};
pub use error::{Diagnostic, EngineError};
pub use history::{History, InteractionMode, Snapshot, Trigger};
pub use json::{JsonBlock, JsonDocument};
pub use model::{BlockTree, Document, NodeId};
pub use offset::{Offset, Selection};
pub use parsing::{ParseMode, Parsed, Parser};
pub use unparse::{UnparseOptions, UnparseTarget};
