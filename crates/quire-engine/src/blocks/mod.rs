//! # Block Behaviors
//!
//! Each [`BlockType`] has one stateless behavior object implementing
//! [`BlockBehavior`]. The parser, unparser, JSON writer and edit commands
//! call through [`behavior`] for anything type-specific; the defaults cover
//! plain containers, so most kinds override only the JSON hooks.
//!
//! Behaviors never hold tree references. They receive the builder,
//! unparser or writer that owns the traversal and the block's [`NodeId`].

mod kinds;

use quire_markup::{Element, Node as MarkupNode};

use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId, attr};
use crate::parsing::builder::TreeBuilder;
use crate::unparse::Unparser;
use crate::unparse::json::JsonWriter;

/// What Enter does inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    /// Split the block at the caret.
    Split,
    /// Insert a newline character (preformatted text).
    LineBreak,
    /// Split, but an empty block leaves its container instead.
    ExitWhenEmpty,
    /// Add a new default block after this one.
    InsertAfter,
}

pub trait BlockBehavior: Sync {
    /// Read the block's content. `id` is already in the tree.
    fn build(&self, builder: &mut TreeBuilder<'_>, id: NodeId, element: &Element) {
        let block_type = builder.tree().block(id).map(|b| b.block_type);
        if let Some(block_type) = block_type {
            builder.build_content(id, block_type, &element.children);
        }
    }

    fn unparse(&self, unparser: &mut Unparser<'_>, id: NodeId, block: &Block) {
        unparser.write_block_default(id, block);
    }

    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock;

    /// Markup element equivalent to `json`, hinted with its type so the
    /// builder reads it back as the same block.
    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element;

    fn enter(&self) -> EnterAction {
        EnterAction::Split
    }

    /// Splitting at the very end yields a default block instead of
    /// another block of this type.
    fn empty_tail_is_default(&self) -> bool {
        false
    }
}

pub fn behavior(block_type: BlockType) -> &'static dyn BlockBehavior {
    use kinds::*;
    match block_type {
        BlockType::Paragraph => &PARAGRAPH,
        BlockType::Text => &TEXT,
        BlockType::Address => &ADDRESS,
        BlockType::Heading => &HEADING,
        BlockType::Pre => &PRE,
        BlockType::Line => &LINE,
        BlockType::List => &LIST,
        BlockType::ListItem => &LIST_ITEM,
        BlockType::Todo => &TODO,
        BlockType::TodoItem => &TODO_ITEM,
        BlockType::Dlist => &DLIST,
        BlockType::Table => &TABLE,
        BlockType::Row => &ROW,
        BlockType::Cell => &CELL,
        BlockType::Image => &IMAGE,
        BlockType::Figcaption => &FIGCAPTION,
        BlockType::Embed => &EMBED,
        BlockType::Quote => &QUOTE,
        BlockType::Layout => &LAYOUT,
        BlockType::Column => &COLUMN,
        BlockType::Wrapper => &WRAPPER,
        BlockType::Noneditable => &NONEDITABLE,
    }
}

/// Markup for one JSON block. Unknown type names become a hinted `div`
/// that the builder reports and keeps as a wrapper.
pub fn element_from_json(json: &JsonBlock, catalog: &Catalog) -> MarkupNode {
    match BlockType::from_name(&json.block_type) {
        Some(block_type) => behavior(block_type).from_json(json, catalog).into(),
        None => {
            let mut element = Element::new("div").with_attr(attr::TYPE, json.block_type.as_str());
            element.children = content_or_children(json, catalog);
            element.into()
        }
    }
}

/// `<tag data-quire-type=...>` carrying the JSON `attrs`.
pub(crate) fn hinted(json: &JsonBlock, block_type: BlockType, tag: &str) -> Element {
    let mut element = Element::new(tag).with_attr(attr::TYPE, block_type.name());
    for (name, value) in json.attrs().iter() {
        element.attrs.set(name, value);
    }
    element
}

/// The `content` field parsed as markup.
pub(crate) fn content_nodes(json: &JsonBlock) -> Vec<MarkupNode> {
    json.str("content").map(quire_markup::parse).unwrap_or_default()
}

pub(crate) fn children_nodes(json: &JsonBlock, catalog: &Catalog) -> Vec<MarkupNode> {
    json.children
        .iter()
        .map(|child| element_from_json(child, catalog))
        .collect()
}

/// Child blocks when present, else the `content` markup.
pub(crate) fn content_or_children(json: &JsonBlock, catalog: &Catalog) -> Vec<MarkupNode> {
    if json.children.is_empty() {
        content_nodes(json)
    } else {
        children_nodes(json, catalog)
    }
}

/// `{type, content}`.
pub(crate) fn content_json(writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
    JsonBlock::new(block.block_type.name()).with("content", writer.content(id))
}
