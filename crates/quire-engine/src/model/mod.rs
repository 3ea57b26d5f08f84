//! # Document Model
//!
//! The edited document is an arena-backed tree ([`BlockTree`]). Nodes are
//! addressed by [`NodeId`] keys into a [`SlotMap`]; parent and child links
//! are keys too, so there are no reference cycles and no `Rc`.
//!
//! ```text
//! Root
//! ├── Block(paragraph)
//! │   ├── Text("Hello ")
//! │   └── Element(b)
//! │       └── Text("world")
//! └── Block(list)
//!     └── Block(listitem)
//!         └── Text("one")
//! ```
//!
//! Removing a node removes its whole subtree from the arena; stale keys
//! then simply fail to resolve (`get` returns `None`).

mod block;

pub use block::{Block, attr};

use quire_config::DocumentConfig;
use quire_markup::Attributes;
use slotmap::{SlotMap, new_key_type};

new_key_type! { pub struct NodeId; }

/// Untyped inline markup (`b`, `a`, `br`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineElement {
    pub name: String,
    pub attrs: Attributes,
}

impl InlineElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Start => "start",
            MarkerKind::End => "end",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(MarkerKind::Start),
            "end" => Some(MarkerKind::End),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Block(Block),
    Element(InlineElement),
    Text(String),
    Marker(MarkerKind),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct BlockTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for BlockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTree {
    pub fn new() -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.arena.get(id).map(|node| &node.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.arena.get_mut(id).map(|node| &mut node.kind)
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        match self.kind(id)? {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn block_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        match self.kind_mut(id)? {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.kind_mut(id)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&InlineElement> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.block(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Top-level blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children(self.root)
            .iter()
            .copied()
            .filter(|&id| self.is_block(id))
    }

    /// Child blocks of `id`.
    pub fn child_blocks(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_block(child))
    }

    /// `id` and its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), |&current| {
            self.parent(current)
        })
    }

    /// Innermost block at or above `id`.
    pub fn nearest_block(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&ancestor| self.is_block(ancestor))
    }

    /// The root's child that contains `id`.
    pub fn top_level(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&ancestor| self.parent(ancestor) == Some(self.root))
    }

    /// Pre-order walk of the subtree under `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the subtree, markers and bookkeeping excluded.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let index = self.children(parent).len();
        self.insert(parent, index, kind)
    }

    /// Insert a new node at `index` (clamped) under `parent`.
    pub fn insert(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        let id = self.arena.insert(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.attach(id, parent, index);
        id
    }

    /// Create a node with no parent; attach it later with [`move_to`].
    ///
    /// [`move_to`]: BlockTree::move_to
    pub fn create_detached(&mut self, kind: NodeKind) -> NodeId {
        self.arena.insert(Node {
            kind,
            parent: None,
            children: Vec::new(),
        })
    }

    fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) {
        let Some(parent_node) = self.arena.get_mut(parent) else {
            return;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, id);
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = Some(parent);
        }
    }

    /// Unlink `id` from its parent, keeping the subtree in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|&child| child != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
    }

    /// Move `id` (with its subtree) to `index` under `new_parent`.
    ///
    /// Moving a node into its own subtree is refused.
    pub fn move_to(&mut self, id: NodeId, new_parent: NodeId, index: usize) -> bool {
        if id == self.root || self.ancestors(new_parent).any(|ancestor| ancestor == id) {
            return false;
        }
        self.detach(id);
        self.attach(id, new_parent, index);
        true
    }

    /// Remove `id` and its subtree from the arena.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            self.arena.remove(node);
        }
    }

    /// Remove every top-level node.
    pub fn clear(&mut self) {
        let top: Vec<NodeId> = self.children(self.root).to_vec();
        for id in top {
            self.remove(id);
        }
    }

    /// A detached copy of `id` without its children.
    pub fn clone_shallow(&mut self, id: NodeId) -> Option<NodeId> {
        let kind = self.kind(id)?.clone();
        Some(self.create_detached(kind))
    }

    /// Deep-copy `source_id` from `source` into this tree at `index` under
    /// `parent`.
    pub fn graft(
        &mut self,
        parent: NodeId,
        index: usize,
        source: &BlockTree,
        source_id: NodeId,
    ) -> Option<NodeId> {
        let kind = source.kind(source_id)?.clone();
        let id = self.insert(parent, index, kind);
        for &child in source.children(source_id) {
            let end = self.children(id).len();
            self.graft(id, end, source, child);
        }
        Some(id)
    }

    /// Split text node `id` at character `at`; returns the new right half,
    /// inserted directly after it. `None` when there is nothing to split.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let byte = char_to_byte(text, at)?;
        if byte == 0 || byte == text.len() {
            return None;
        }
        let right = text[byte..].to_string();
        if let Some(left) = self.text_mut(id) {
            left.truncate(byte);
        }
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)? + 1;
        Some(self.insert(parent, index, NodeKind::Text(right)))
    }

    /// Merge adjacent text siblings and drop empty text nodes under `id`.
    pub fn normalize(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            if let Some(text) = self.text(child).map(str::to_string) {
                if let Some(prev) = previous_text {
                    if let Some(prev_text) = self.text_mut(prev) {
                        prev_text.push_str(&text);
                    }
                    self.remove(child);
                } else if text.is_empty() {
                    self.remove(child);
                } else {
                    previous_text = Some(child);
                }
            } else {
                previous_text = None;
                self.normalize(child);
            }
        }
    }
}

/// Byte index of character `at`; `None` past the end.
pub fn char_to_byte(text: &str, at: usize) -> Option<usize> {
    if at == 0 {
        return Some(0);
    }
    match text.char_indices().nth(at) {
        Some((byte, _)) => Some(byte),
        None if text.chars().count() == at => Some(text.len()),
        None => None,
    }
}

/// Document-level attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub classname: Option<String>,
}

impl From<&DocumentConfig> for DocumentMeta {
    fn from(config: &DocumentConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            dir: config.dir.clone(),
            classname: config.classname.clone(),
        }
    }
}

/// A block tree plus its global attributes.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub tree: BlockTree,
    pub meta: DocumentMeta,
}

impl Document {
    pub fn new(tree: BlockTree, meta: DocumentMeta) -> Self {
        Self { tree, meta }
    }
}
