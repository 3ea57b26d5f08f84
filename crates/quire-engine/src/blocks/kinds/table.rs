use quire_markup::{Element, Node as MarkupNode};
use serde_json::Value;

use crate::blocks::{BlockBehavior, children_nodes, content_json, content_nodes, hinted};
use crate::catalog::{BlockType, Catalog};
use crate::json::JsonBlock;
use crate::model::{Block, BlockTree, NodeId};
use crate::unparse::json::JsonWriter;

/// Tables are exchanged as a grid of cell markup:
/// `{head, foot, items: [[cell, ...], ...]}`. The first row is the header
/// when `head` is set and the last row the footer when `foot` is.
pub struct TableBlock;

pub static TABLE: TableBlock = TableBlock;

impl BlockBehavior for TableBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, _: &Block) -> JsonBlock {
        let tree = writer.tree();
        let rows = rows_of(tree, id);
        let in_section = |row: NodeId, section: &str| {
            tree.parent(row)
                .and_then(|parent| tree.element(parent))
                .is_some_and(|el| el.name == section)
        };
        let head = rows.first().is_some_and(|&first| {
            in_section(first, "thead") || all_cells_are(tree, first, "th")
        });
        let foot = rows.last().is_some_and(|&last| in_section(last, "tfoot"));
        let items: Vec<Value> = rows
            .iter()
            .map(|&row| {
                tree.child_blocks(row)
                    .map(|cell| Value::String(writer.content(cell)))
                    .collect::<Vec<_>>()
                    .into()
            })
            .collect();
        JsonBlock::new(BlockType::Table.name())
            .with("head", head)
            .with("foot", foot)
            .with("items", items)
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        let mut rows: Vec<Vec<String>> = json
            .fields
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(row_cells).collect())
            .unwrap_or_default();

        let mut sections: Vec<MarkupNode> = Vec::new();
        if json.bool("head") && !rows.is_empty() {
            let head = rows.remove(0);
            sections.push(section("thead", vec![row_element(&head, "th")]));
        }
        let foot = (json.bool("foot") && !rows.is_empty()).then(|| rows.pop()).flatten();
        if !rows.is_empty() {
            let body = rows.iter().map(|row| row_element(row, "td")).collect();
            sections.push(section("tbody", body));
        }
        if let Some(foot) = foot {
            sections.push(section("tfoot", vec![row_element(&foot, "td")]));
        }
        hinted(json, BlockType::Table, "table").with_children(sections)
    }
}

/// Row blocks of a table in document order, through `thead`/`tbody`/`tfoot`.
fn rows_of(tree: &BlockTree, table: NodeId) -> Vec<NodeId> {
    tree.descendants(table)
        .into_iter()
        .filter(|&id| {
            tree.block(id)
                .is_some_and(|block| block.block_type == BlockType::Row)
        })
        .collect()
}

fn all_cells_are(tree: &BlockTree, row: NodeId, tag: &str) -> bool {
    let mut cells = tree.child_blocks(row).peekable();
    cells.peek().is_some() && cells.all(|cell| tree.block(cell).is_some_and(|b| b.tag == tag))
}

fn row_cells(row: &Value) -> Vec<String> {
    row.as_array()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| match cell {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn row_element(cells: &[String], cell_tag: &str) -> MarkupNode {
    let cells = cells
        .iter()
        .map(|markup| {
            Element::new(cell_tag)
                .with_children(quire_markup::parse(markup))
                .into()
        })
        .collect();
    Element::new("tr").with_children(cells).into()
}

fn section(tag: &str, rows: Vec<MarkupNode>) -> MarkupNode {
    Element::new(tag).with_children(rows).into()
}

pub struct RowBlock;

pub static ROW: RowBlock = RowBlock;

impl BlockBehavior for RowBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, _: &Block) -> JsonBlock {
        JsonBlock::new(BlockType::Row.name()).with_children(writer.children(id))
    }

    fn from_json(&self, json: &JsonBlock, catalog: &Catalog) -> Element {
        hinted(json, BlockType::Row, "tr").with_children(children_nodes(json, catalog))
    }
}

pub struct CellBlock;

pub static CELL: CellBlock = CellBlock;

impl BlockBehavior for CellBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block)
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        hinted(json, BlockType::Cell, "td").with_children(content_nodes(json))
    }
}
