use quire_markup::Element;

use crate::blocks::{BlockBehavior, EnterAction, hinted};
use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId};
use crate::unparse::json::JsonWriter;

/// Horizontal rule. No content, not editable.
pub struct LineBlock;

pub static LINE: LineBlock = LineBlock;

impl BlockBehavior for LineBlock {
    fn to_json(&self, _: &JsonWriter<'_>, _: NodeId, _: &Block) -> JsonBlock {
        JsonBlock::new(BlockType::Line.name())
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        hinted(json, BlockType::Line, "hr")
    }

    fn enter(&self) -> EnterAction {
        EnterAction::InsertAfter
    }
}
