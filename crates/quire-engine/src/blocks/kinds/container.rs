use quire_markup::Element;

use crate::blocks::{BlockBehavior, EnterAction, children_nodes, content_nodes, hinted};
use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId};
use crate::unparse::json::JsonWriter;

/// Blocks that mostly hold other blocks.
pub struct ContainerBlock(BlockType);

pub static QUOTE: ContainerBlock = ContainerBlock(BlockType::Quote);
pub static LAYOUT: ContainerBlock = ContainerBlock(BlockType::Layout);
pub static COLUMN: ContainerBlock = ContainerBlock(BlockType::Column);
pub static WRAPPER: ContainerBlock = ContainerBlock(BlockType::Wrapper);

impl BlockBehavior for ContainerBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        let mut json = JsonBlock::new(self.0.name());
        let content = writer.content(id);
        if !content.trim().is_empty() || !writer.has_structural_children(id) {
            json = json.with("content", content);
        }
        if self.0 == BlockType::Wrapper {
            json = json.with("tag", block.tag.as_str());
        }
        json.with_children(writer.children(id))
    }

    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        let classes = &catalog.config().classes;
        let mut element = match self.0 {
            BlockType::Quote => hinted(json, self.0, "blockquote"),
            BlockType::Wrapper => hinted(json, self.0, &tag_field(json, "div")),
            _ => hinted(json, self.0, "div"),
        };
        // Class names keep layouts recognizable once the hint is stripped
        match self.0 {
            BlockType::Layout => element.attrs.add_class(&classes.grid),
            BlockType::Column => element.attrs.add_class(&classes.column),
            _ => {}
        }
        let mut children = content_nodes(json);
        children.extend(children_nodes(json, catalog));
        element.with_children(children)
    }
}

/// Content the editor must not touch: widgets, scripts, anything marked
/// non-editable. Kept verbatim.
pub struct NoneditableBlock;

pub static NONEDITABLE: NoneditableBlock = NoneditableBlock;

impl BlockBehavior for NoneditableBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        JsonBlock::new(BlockType::Noneditable.name())
            .with("tag", block.tag.as_str())
            .with("content", writer.content(id))
    }

    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        let tag = tag_field(json, "div");
        let mut element = hinted(json, BlockType::Noneditable, &tag);
        if !catalog.is_nonparse(&tag) && element.attr("contenteditable") != Some("false") {
            element.attrs.add_class(&catalog.config().classes.noneditable);
        }
        let children = if quire_markup::tags::is_raw_text(&tag) {
            json.str("content")
                .map(|raw| vec![quire_markup::Node::text(raw)])
                .unwrap_or_default()
        } else {
            content_nodes(json)
        };
        element.with_children(children)
    }

    fn enter(&self) -> EnterAction {
        EnterAction::InsertAfter
    }
}

/// The `tag` field if it is a plausible element name.
fn tag_field(json: &JsonBlock, default: &str) -> String {
    match json.str("tag") {
        Some(tag)
            if !tag.is_empty()
                && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && tag.starts_with(|c: char| c.is_ascii_alphabetic()) =>
        {
            tag.to_ascii_lowercase()
        }
        _ => default.to_string(),
    }
}
