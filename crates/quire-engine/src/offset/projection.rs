use slotmap::SecondaryMap;

use crate::catalog::Catalog;
use crate::model::{BlockTree, NodeId, NodeKind};

use super::{Position, is_invisible};

/// A text node's place in the projection.
#[derive(Debug, Clone, Copy)]
struct Segment {
    node: NodeId,
    start: usize,
    len: usize,
}

/// Where an offset lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Inside an existing text node, at a character index.
    Text { node: NodeId, at: usize },
    /// No text there; a placeholder must be inserted at this child index.
    Insert { parent: NodeId, index: usize },
}

/// The plain-text view of a subtree, with every node's offset range.
///
/// Text counts per visible character, `br` counts 1, and each
/// text-bearing block after the first is preceded by a one-character
/// separator. Read-only blocks and markers count nothing.
#[derive(Debug, Clone)]
pub struct Projection {
    segments: Vec<Segment>,
    /// Editable text-bearing blocks, pre-order.
    containers: Vec<NodeId>,
    enter: SecondaryMap<NodeId, usize>,
    exit: SecondaryMap<NodeId, usize>,
    text: String,
    pos: usize,
    started: bool,
    fresh: bool,
}

impl Projection {
    pub fn build(catalog: &Catalog, tree: &BlockTree, scope: NodeId) -> Self {
        let mut projection = Self {
            segments: Vec::new(),
            containers: Vec::new(),
            enter: SecondaryMap::new(),
            exit: SecondaryMap::new(),
            text: String::new(),
            pos: 0,
            started: false,
            fresh: false,
        };
        projection.walk(catalog, tree, scope);
        projection
    }

    fn walk(&mut self, catalog: &Catalog, tree: &BlockTree, id: NodeId) {
        let Some(kind) = tree.kind(id) else {
            return;
        };
        match kind {
            NodeKind::Block(block) if !block.editable => {
                self.enter.insert(id, self.pos);
                self.exit.insert(id, self.pos);
            }
            NodeKind::Block(block) => {
                let text_bearing =
                    !block.inline && catalog.nested(block.block_type).is_text_bearing();
                if text_bearing {
                    if self.started && !self.fresh {
                        self.pos += 1;
                        self.text.push('\n');
                    }
                    self.started = true;
                    self.fresh = true;
                    self.containers.push(id);
                }
                self.walk_children(catalog, tree, id);
                if text_bearing {
                    self.fresh = false;
                }
            }
            NodeKind::Root => self.walk_children(catalog, tree, id),
            NodeKind::Element(element) if element.name == "br" => {
                self.enter.insert(id, self.pos);
                self.pos += 1;
                self.text.push('\n');
                self.fresh = false;
                self.exit.insert(id, self.pos);
            }
            NodeKind::Element(_) => self.walk_children(catalog, tree, id),
            NodeKind::Text(text) => {
                let start = self.pos;
                let visible: String = text.chars().filter(|&c| !is_invisible(c)).collect();
                let len = visible.chars().count();
                self.text.push_str(&visible);
                self.segments.push(Segment {
                    node: id,
                    start,
                    len,
                });
                self.enter.insert(id, start);
                self.pos += len;
                self.exit.insert(id, self.pos);
                if len > 0 {
                    self.fresh = false;
                }
            }
            NodeKind::Marker(_) => {
                self.enter.insert(id, self.pos);
                self.exit.insert(id, self.pos);
            }
        }
    }

    /// Records the node's own range around its children.
    fn walk_children(&mut self, catalog: &Catalog, tree: &BlockTree, id: NodeId) {
        self.enter.insert(id, self.pos);
        for &child in tree.children(id) {
            self.walk(catalog, tree, child);
        }
        self.exit.insert(id, self.pos);
    }

    /// Total projected length.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// The projected text; separators and breaks are `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Offset where `id` starts; `None` outside the projected subtree.
    pub fn start_of(&self, id: NodeId) -> Option<usize> {
        self.enter.get(id).copied()
    }

    pub fn range_of(&self, id: NodeId) -> Option<(usize, usize)> {
        Some((*self.enter.get(id)?, *self.exit.get(id)?))
    }

    /// Editable text-bearing blocks in document order.
    pub fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    /// Innermost container spanning `offset`.
    pub fn container_at(&self, offset: usize) -> Option<NodeId> {
        self.containers.iter().rev().copied().find(|&id| {
            self.range_of(id)
                .is_some_and(|(enter, exit)| enter <= offset && offset <= exit)
        })
    }

    /// `(node, start, visible length)` of every text node.
    pub fn text_nodes(&self) -> impl Iterator<Item = (NodeId, usize, usize)> + '_ {
        self.segments.iter().map(|s| (s.node, s.start, s.len))
    }

    pub fn offset_of(&self, tree: &BlockTree, position: Position) -> Option<usize> {
        if let Some(text) = tree.text(position.node) {
            let start = self.start_of(position.node)?;
            let visible = text
                .chars()
                .take(position.offset)
                .filter(|&c| !is_invisible(c))
                .count();
            return Some(start + visible);
        }
        let children = tree.children(position.node);
        match children.get(position.offset) {
            Some(&child) => self.start_of(child),
            None => self.exit.get(position.node).copied(),
        }
    }

    /// First text node covering `offset`, else the innermost editable
    /// block spanning it.
    pub fn land(&self, tree: &BlockTree, offset: usize) -> Option<Landing> {
        for segment in &self.segments {
            if segment.start <= offset && offset <= segment.start + segment.len {
                let text = tree.text(segment.node)?;
                return Some(Landing::Text {
                    node: segment.node,
                    at: char_index_of_visible(text, offset - segment.start),
                });
            }
        }
        let parent = self.container_at(offset)?;
        let index = tree
            .children(parent)
            .iter()
            .take_while(|&&child| self.exit.get(child).is_some_and(|&end| end <= offset))
            .count();
        Some(Landing::Insert { parent, index })
    }
}

/// Character index just before the visible character number `visible`,
/// after any invisible characters in front of it.
pub(crate) fn char_index_of_visible(text: &str, visible: usize) -> usize {
    let mut seen = 0;
    for (index, c) in text.chars().enumerate() {
        if !is_invisible(c) {
            if seen == visible {
                return index;
            }
            seen += 1;
        }
    }
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn visible_index_skips_placeholders() {
        assert_eq!(char_index_of_visible("ab", 1), 1);
        assert_eq!(char_index_of_visible("\u{feff}ab", 0), 1);
        assert_eq!(char_index_of_visible("\u{feff}", 0), 1);
        assert_eq!(char_index_of_visible("ab", 2), 2);
    }
}
