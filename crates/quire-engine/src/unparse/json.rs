//! Block tree → [`JsonDocument`].

use crate::blocks::behavior;
use crate::catalog::Catalog;
use crate::json::{JsonBlock, JsonDocument};
use crate::model::{Block, BlockTree, Document, NodeId, attr};

use super::{UnparseOptions, Unparser};

pub struct JsonWriter<'a> {
    catalog: &'a Catalog,
    tree: &'a BlockTree,
}

impl<'a> JsonWriter<'a> {
    pub fn new(catalog: &'a Catalog, tree: &'a BlockTree) -> Self {
        Self { catalog, tree }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn tree(&self) -> &'a BlockTree {
        self.tree
    }

    pub fn document(&self, document: &Document) -> JsonDocument {
        JsonDocument {
            blocks: self.children(self.tree.root()),
            lang: document.meta.lang.clone(),
            dir: document.meta.dir.clone(),
            classname: document.meta.classname.clone(),
        }
    }

    /// JSON for one block; `None` for non-block nodes.
    pub fn block(&self, id: NodeId) -> Option<JsonBlock> {
        let block = self.tree.block(id)?;
        let mut json = behavior(block.block_type).to_json(self, id, block);
        if !json.fields.contains_key("attrs") {
            json.set_attrs(plain_attrs(block).iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Some(json)
    }

    /// JSON for the structural child blocks of `id`. Inline blocks are
    /// part of the content markup instead.
    pub fn children(&self, id: NodeId) -> Vec<JsonBlock> {
        self.structural_children(id)
            .filter_map(|child| self.block(child))
            .collect()
    }

    pub fn structural_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree
            .child_blocks(id)
            .filter(|&child| self.tree.block(child).is_some_and(|b| !b.inline))
    }

    pub fn has_structural_children(&self, id: NodeId) -> bool {
        self.structural_children(id).next().is_some()
    }

    /// Markup of the inline content of `id`, structural child blocks left out.
    pub fn content(&self, id: NodeId) -> String {
        if self
            .tree
            .block(id)
            .is_some_and(|block| quire_markup::tags::is_raw_text(&block.tag))
        {
            return self.tree.text_content(id);
        }
        let mut unparser = Unparser::new(self.catalog, self.tree, UnparseOptions::storage());
        for &child in self.tree.children(id) {
            let structural = self.tree.block(child).is_some_and(|b| !b.inline);
            if !structural {
                unparser.write_node(child);
            }
        }
        unparser.finish()
    }
}

/// Attributes worth exporting: no bookkeeping, style included.
pub fn plain_attrs(block: &Block) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = block
        .attrs
        .iter()
        .filter(|(name, _)| !attr::is_bookkeeping(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let style = block.current_style();
    if !style.is_empty() {
        attrs.push(("style".to_string(), style.to_string()));
    }
    attrs
}
