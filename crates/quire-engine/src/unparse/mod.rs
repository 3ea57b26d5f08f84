//! Block tree → markup.
//!
//! The unparser walks the tree depth-first and re-emits every block with
//! its native tag. Bookkeeping attributes are stripped, a style cached off
//! during selection or dragging is written back as the live `style`, and
//! invisible caret placeholders are removed from text. Per-type output
//! (checklist tokens, decoded embed content) lives in the block kinds.

pub mod json;

use quire_markup::serialize::{write_end_tag, write_start_tag};
use quire_markup::tags;

use crate::blocks::behavior;
use crate::catalog::Catalog;
use crate::model::{Block, BlockTree, MarkerKind, NodeId, NodeKind, attr};
use crate::offset::is_invisible;

/// Who the markup is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnparseTarget {
    /// Persisted content and history snapshots of clean markup.
    #[default]
    Storage,
    /// Paste inside an editor: keeps the block type hint.
    InternalClipboard,
    /// Paste elsewhere: also drops `contenteditable`.
    ExternalClipboard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnparseOptions {
    pub target: UnparseTarget,
    /// Emit marker spans so a caret survives a serialize/parse cycle.
    pub keep_markers: bool,
}

impl UnparseOptions {
    pub fn storage() -> Self {
        Self::default()
    }

    pub fn for_target(target: UnparseTarget) -> Self {
        Self {
            target,
            keep_markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.keep_markers = true;
        self
    }
}

pub struct Unparser<'a> {
    catalog: &'a Catalog,
    tree: &'a BlockTree,
    options: UnparseOptions,
    out: String,
    /// Inside a raw-text element; text is written unescaped.
    raw: bool,
}

impl<'a> Unparser<'a> {
    pub fn new(catalog: &'a Catalog, tree: &'a BlockTree, options: UnparseOptions) -> Self {
        Self {
            catalog,
            tree,
            options,
            out: String::new(),
            raw: false,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn tree(&self) -> &'a BlockTree {
        self.tree
    }

    pub fn options(&self) -> UnparseOptions {
        self.options
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn write_node(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.kind(id) {
            None | Some(NodeKind::Root) => self.write_children(id),
            Some(NodeKind::Block(block)) => behavior(block.block_type).unparse(self, id, block),
            Some(NodeKind::Element(element)) => {
                let target = self.options.target;
                let attrs = element
                    .attrs
                    .iter()
                    .filter(|(name, _)| !drops(target, name));
                write_start_tag(&mut self.out, &element.name, attrs);
                let was_raw = std::mem::replace(&mut self.raw, tags::is_raw_text(&element.name));
                self.write_children(id);
                self.raw = was_raw;
                write_end_tag(&mut self.out, &element.name);
            }
            Some(NodeKind::Text(text)) => self.write_text(text),
            Some(NodeKind::Marker(kind)) => self.write_marker(*kind),
        }
    }

    pub fn write_children(&mut self, id: NodeId) {
        let tree = self.tree;
        for &child in tree.children(id) {
            self.write_node(child);
        }
    }

    /// Open tag, children, close tag.
    pub fn write_block_default(&mut self, id: NodeId, block: &Block) {
        self.write_open(block);
        let was_raw = std::mem::replace(&mut self.raw, tags::is_raw_text(&block.tag));
        self.write_children(id);
        self.raw = was_raw;
        self.write_close(block);
    }

    pub fn write_open(&mut self, block: &Block) {
        let mut attrs: Vec<(&str, String)> = Vec::with_capacity(block.attrs.len() + 2);
        if self.options.target == UnparseTarget::InternalClipboard {
            attrs.push((attr::TYPE, block.block_type.name().to_string()));
        }
        attrs.extend(
            block
                .attrs
                .iter()
                .filter(|(name, _)| !drops(self.options.target, name))
                .map(|(name, value)| (name, value.to_string())),
        );
        let style = block.current_style();
        if !style.is_empty() {
            attrs.push(("style", style.to_string()));
        }
        write_start_tag(
            &mut self.out,
            &block.tag,
            attrs.iter().map(|(name, value)| (*name, value.as_str())),
        );
    }

    pub fn write_close(&mut self, block: &Block) {
        write_end_tag(&mut self.out, &block.tag);
    }

    /// Escaped text with caret placeholders removed.
    pub fn write_text(&mut self, text: &str) {
        let visible: String = text.chars().filter(|&c| !is_invisible(c)).collect();
        if self.raw {
            self.out.push_str(&visible);
        } else {
            quire_markup::serialize::write_text(&mut self.out, &visible);
        }
    }

    /// Markup written as-is.
    pub fn write_raw(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    fn write_marker(&mut self, kind: MarkerKind) {
        if !self.options.keep_markers {
            return;
        }
        write_start_tag(&mut self.out, "span", [(attr::MARKER, kind.as_str())]);
        write_end_tag(&mut self.out, "span");
    }
}

fn drops(target: UnparseTarget, name: &str) -> bool {
    attr::is_bookkeeping(name)
        || (name == "contenteditable" && target == UnparseTarget::ExternalClipboard)
}

/// Serialize the whole tree.
pub fn unparse(catalog: &Catalog, tree: &BlockTree, options: UnparseOptions) -> String {
    let mut unparser = Unparser::new(catalog, tree, options);
    unparser.write_children(tree.root());
    unparser.finish()
}

/// Serialize one node (block, element or text) including its own tag.
pub fn outer_markup(
    catalog: &Catalog,
    tree: &BlockTree,
    id: NodeId,
    options: UnparseOptions,
) -> String {
    let mut unparser = Unparser::new(catalog, tree, options);
    unparser.write_node(id);
    unparser.finish()
}

/// Serialize the children of `id`.
pub fn inner_markup(
    catalog: &Catalog,
    tree: &BlockTree,
    id: NodeId,
    options: UnparseOptions,
) -> String {
    let mut unparser = Unparser::new(catalog, tree, options);
    unparser.write_children(id);
    unparser.finish()
}
