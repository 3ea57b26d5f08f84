use quire_markup::Element;

use crate::blocks::{BlockBehavior, EnterAction, content_json, content_nodes, hinted};
use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId};
use crate::unparse::json::JsonWriter;

/// Paragraph-like blocks holding inline content.
pub struct TextBlock(BlockType);

pub static PARAGRAPH: TextBlock = TextBlock(BlockType::Paragraph);
pub static TEXT: TextBlock = TextBlock(BlockType::Text);
pub static ADDRESS: TextBlock = TextBlock(BlockType::Address);

impl BlockBehavior for TextBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block)
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        hinted(json, self.0, self.0.default_tag()).with_children(content_nodes(json))
    }
}

pub struct HeadingBlock;

pub static HEADING: HeadingBlock = HeadingBlock;

const DEFAULT_LEVEL: u64 = 2;

impl BlockBehavior for HeadingBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        let level = block.heading_level().map_or(DEFAULT_LEVEL, u64::from);
        JsonBlock::new(BlockType::Heading.name())
            .with("level", level)
            .with("content", writer.content(id))
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        let level = json.u64("level").unwrap_or(DEFAULT_LEVEL).clamp(1, 6);
        hinted(json, BlockType::Heading, &format!("h{level}")).with_children(content_nodes(json))
    }

    fn empty_tail_is_default(&self) -> bool {
        true
    }
}

pub struct PreBlock;

pub static PRE: PreBlock = PreBlock;

impl BlockBehavior for PreBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block)
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        hinted(json, BlockType::Pre, "pre").with_children(content_nodes(json))
    }

    fn enter(&self) -> EnterAction {
        EnterAction::LineBreak
    }
}
