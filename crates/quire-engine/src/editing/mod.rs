//! # Editing Commands
//!
//! Every edit is a [`Cmd`]. Commands address text by plain-text offsets
//! (the same projection the caret uses) and blocks by [`NodeId`], so a
//! host can replay them without holding node references across edits.
//!
//! ```rust
//! use quire_engine::editing::Cmd;
//! use quire_engine::editor::Editor;
//!
//! let mut editor = Editor::default();
//! editor.load("<p>Hello</p>");
//! let patch = editor.apply(Cmd::InsertText { at: 5, text: " world".into() });
//! editor.on_mutation_batch(&patch.changes);
//! assert_eq!(editor.unparse(), "<p>Hello world</p>");
//! ```
//!
//! Applying a command mutates the tree and returns a [`Patch`]; recording
//! it in history is a separate, explicit step
//! ([`Editor::on_mutation_batch`]).
//!
//! [`Editor::on_mutation_batch`]: crate::editor::Editor::on_mutation_batch

pub mod commands;
pub mod patch;

pub use commands::{Applied, CommandContext};
pub use patch::{Change, ChangeKind, Patch};

use std::ops::Range;

use crate::catalog::BlockType;
use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Insert literal text at an offset.
    InsertText { at: usize, text: String },
    /// Delete a plain-text range, merging the blocks at its two ends.
    DeleteRange { range: Range<usize> },
    /// Enter: split the block at `at`, or whatever the block type does
    /// instead (newline in `pre`, leaving an empty list item, ...).
    SplitBlock { at: usize },
    /// Insert a `br` at `at`.
    InsertLineBreak { at: usize },
    IndentListItem { item: NodeId },
    OutdentListItem { item: NodeId },
    SetChecked { item: NodeId, checked: bool },
    /// Set or (with `None`) remove an attribute.
    SetAttr {
        block: NodeId,
        name: String,
        value: Option<String>,
    },
    SetStyle {
        block: NodeId,
        property: String,
        value: Option<String>,
    },
    RemoveBlock { block: NodeId },
    /// Re-type a block. Containers that cannot hold the new type are
    /// converted as a whole (converting a list item converts its list).
    ConvertBlock { block: NodeId, to: BlockType },
    /// Paste block markup at `at`, splitting the block there.
    InsertMarkup { at: usize, markup: String },
    /// Paste an inline fragment at `at`.
    InsertInline { at: usize, markup: String },
}
