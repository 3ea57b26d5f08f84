use quire_markup::{Element, Node as MarkupNode};

use crate::blocks::{
    BlockBehavior, EnterAction, children_nodes, content_json, content_nodes, hinted,
};
use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId};
use crate::parsing::builder::TreeBuilder;
use crate::unparse::Unparser;
use crate::unparse::json::JsonWriter;

pub struct ListBlock;

pub static LIST: ListBlock = ListBlock;

impl BlockBehavior for ListBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        JsonBlock::new(BlockType::List.name())
            .with("numbered", block.tag == "ol")
            .with_children(writer.children(id))
    }

    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        let tag = if json.bool("numbered") { "ol" } else { "ul" };
        hinted(json, BlockType::List, tag).with_children(children_nodes(json, catalog))
    }
}

pub struct ListItemBlock;

pub static LIST_ITEM: ListItemBlock = ListItemBlock;

impl BlockBehavior for ListItemBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block).with_children(writer.children(id))
    }

    /// Content first, nested lists after it.
    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        let mut children = content_nodes(json);
        children.extend(children_nodes(json, catalog));
        hinted(json, BlockType::ListItem, "li").with_children(children)
    }

    fn enter(&self) -> EnterAction {
        EnterAction::ExitWhenEmpty
    }
}

pub struct TodoBlock;

pub static TODO: TodoBlock = TodoBlock;

impl BlockBehavior for TodoBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, _: &Block) -> JsonBlock {
        JsonBlock::new(BlockType::Todo.name()).with_children(writer.children(id))
    }

    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        hinted(json, BlockType::Todo, "ul").with_children(children_nodes(json, catalog))
    }
}

/// Checklist item. In markup the state is a literal token at the start of
/// the item (`[ ] milk`, `[x] eggs`); in the tree it is `Block::checked`
/// and the token is gone.
pub struct TodoItemBlock;

pub static TODO_ITEM: TodoItemBlock = TodoItemBlock;

impl BlockBehavior for TodoItemBlock {
    fn build(&self, builder: &mut TreeBuilder<'_>, id: NodeId, element: &Element) {
        let (children, checked) = strip_token(&element.children, builder.catalog());
        if let Some(block) = builder.tree().block_mut(id) {
            block.checked = Some(checked);
        }
        builder.build_content(id, BlockType::TodoItem, &children);
    }

    fn unparse(&self, unparser: &mut Unparser<'_>, id: NodeId, block: &Block) {
        let todo = &unparser.catalog().config().todo;
        let token = if block.checked == Some(true) {
            &todo.template_item_done
        } else {
            &todo.template_item
        };
        unparser.write_open(block);
        unparser.write_text(&format!("{token} "));
        unparser.write_children(id);
        unparser.write_close(block);
    }

    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block).with("checked", block.checked == Some(true))
    }

    /// The token is put back in front of the content so the builder reads
    /// the state the same way it does for markup.
    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        let todo = &catalog.config().todo;
        let token = if json.bool("checked") {
            &todo.template_item_done
        } else {
            &todo.template_item
        };
        let mut children = vec![MarkupNode::text(format!("{token} "))];
        children.extend(content_nodes(json));
        hinted(json, BlockType::TodoItem, "li").with_children(children)
    }

    fn enter(&self) -> EnterAction {
        EnterAction::ExitWhenEmpty
    }
}

/// Remove a leading checklist token and the whitespace after it.
fn strip_token(children: &[MarkupNode], catalog: &Catalog) -> (Vec<MarkupNode>, bool) {
    let mut children = children.to_vec();
    let Some(checked) = catalog.leading_todo_token(&children) else {
        return (children, false);
    };
    let todo = &catalog.config().todo;
    let token = if checked {
        &todo.template_item_done
    } else {
        &todo.template_item
    };
    if let Some(MarkupNode::Text(text)) = children.iter_mut().find(|node| !node.is_blank_text()) {
        let trimmed = text.value.trim_start();
        let rest = trimmed.strip_prefix(token.as_str()).unwrap_or(trimmed);
        let rest = rest.trim_start().to_string();
        text.value = rest;
    }
    children.retain(|node| !matches!(node, MarkupNode::Text(text) if text.value.is_empty()));
    (children, checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn strip(markup: &str) -> (String, bool) {
        let nodes = quire_markup::parse(markup);
        let (children, checked) = strip_token(&nodes, &Catalog::default());
        (quire_markup::to_markup(&children), checked)
    }

    #[rstest]
    #[case("[ ] milk", "milk", false)]
    #[case("  [x]   eggs", "eggs", true)]
    #[case("[ ]<b>bold</b>", "<b>bold</b>", false)]
    #[case("no token", "no token", false)]
    #[case("<b>[x]</b> inside", "<b>[x]</b> inside", false)]
    fn strips_leading_token(#[case] markup: &str, #[case] rest: &str, #[case] checked: bool) {
        assert_eq!(strip(markup), (rest.to_string(), checked));
    }
}
