//! Command execution against a [`BlockTree`].
//!
//! Text positions go through [`offset::set`], so every command starts from
//! a real text node even in an empty block. Structural commands keep node
//! identity where they can (moves, not copies); [`Cmd::ConvertBlock`]
//! rebuilds through markup and carries the caret across with markers.

use quire_markup::{Attributes, Style};

use crate::blocks::{EnterAction, behavior};
use crate::catalog::{BlockType, Catalog, NestedSelector, ParentKind};
use crate::error::Diagnostic;
use crate::model::{Block, BlockTree, InlineElement, NodeId, NodeKind, attr, char_to_byte};
use crate::offset::{
    self, Offset, Position, Projection, Selection, char_index_of_visible, is_invisible, marker,
};
use crate::parsing::{Parser, TreeBuilder};
use crate::unparse::{UnparseOptions, Unparser};

use super::{Change, Cmd};

/// What a command did to the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    pub changes: Vec<Change>,
    /// Caret after the edit. `None` leaves the caret alone.
    pub selection: Option<Offset>,
}

impl Applied {
    fn new(changes: Vec<Change>, selection: Option<Offset>) -> Self {
        Self { changes, selection }
    }
}

pub struct CommandContext<'a> {
    catalog: &'a Catalog,
    tree: &'a mut BlockTree,
    selection: Option<Selection>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        catalog: &'a Catalog,
        tree: &'a mut BlockTree,
        selection: Option<Selection>,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            catalog,
            tree,
            selection,
            diagnostics,
        }
    }

    /// Run `cmd`. A command that does not apply (wrong block type, nothing
    /// to delete, ...) returns no changes.
    pub fn apply(&mut self, cmd: &Cmd) -> Applied {
        let applied = match cmd {
            Cmd::InsertText { at, text } => self.insert_text(*at, text),
            Cmd::DeleteRange { range } => self.delete_range(range.start, range.end),
            Cmd::SplitBlock { at } => self.split_block(*at),
            Cmd::InsertLineBreak { at } => self.insert_line_break(*at),
            Cmd::IndentListItem { item } => self.indent(*item),
            Cmd::OutdentListItem { item } => self.outdent(*item),
            Cmd::SetChecked { item, checked } => self.set_checked(*item, *checked),
            Cmd::SetAttr { block, name, value } => self.set_attr(*block, name, value.as_deref()),
            Cmd::SetStyle {
                block,
                property,
                value,
            } => self.set_style(*block, property, value.as_deref()),
            Cmd::RemoveBlock { block } => self.remove_block(*block),
            Cmd::ConvertBlock { block, to } => self.convert_block(*block, *to),
            Cmd::InsertMarkup { at, markup } => self.insert_markup(*at, markup),
            Cmd::InsertInline { at, markup } => self.insert_inline(*at, markup),
        };
        applied.unwrap_or_else(|| {
            log::debug!("command had no effect: {cmd:?}");
            Applied::default()
        })
    }

    fn insert_text(&mut self, at: usize, text: &str) -> Option<Applied> {
        if text.is_empty() {
            return None;
        }
        let position = self.caret(at)?;
        let node_text = self.tree.text_mut(position.node)?;
        let byte = char_to_byte(node_text, position.offset)?;
        node_text.insert_str(byte, text);
        let after = Position::new(position.node, position.offset + text.chars().count());
        Some(Applied::new(
            vec![Change::character_data(position.node)],
            self.offset_of(after),
        ))
    }

    fn delete_range(&mut self, start: usize, end: usize) -> Option<Applied> {
        let (start, end) = (start.min(end), start.max(end));
        let projection = Projection::build(self.catalog, self.tree, self.tree.root());
        let end = end.min(projection.len());
        if start >= end {
            return None;
        }
        let first = projection.container_at(start)?;
        let last = projection.container_at(end)?;
        let mut changes = Vec::new();

        for (node, node_start, len) in projection.text_nodes() {
            let lo = start.max(node_start);
            let hi = end.min(node_start + len);
            if lo >= hi {
                continue;
            }
            if let Some(text) = self.tree.text_mut(node) {
                let from = char_index_of_visible(text, lo - node_start);
                let to = char_index_of_visible(text, hi - node_start);
                if let (Some(a), Some(b)) = (char_to_byte(text, from), char_to_byte(text, to)) {
                    text.replace_range(a..b, "");
                    changes.push(Change::character_data(node));
                }
            }
        }

        let doomed: Vec<NodeId> = self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&id| {
                let covered = projection
                    .range_of(id)
                    .is_some_and(|(enter, exit)| start <= enter && exit <= end);
                let is_break = self.tree.element(id).is_some_and(|el| el.name == "br");
                let is_between = projection.containers().contains(&id)
                    && id != first
                    && id != last
                    && !self.is_ancestor(id, first)
                    && !self.is_ancestor(id, last);
                covered && (is_break || is_between)
            })
            .collect();
        for id in doomed {
            if let Some(parent) = self.tree.parent(id) {
                changes.push(Change::child_list(parent));
            }
            self.tree.remove(id);
        }

        if first != last && !self.is_ancestor(first, last) && !self.is_ancestor(last, first) {
            let inline: Vec<NodeId> = self
                .tree
                .children(last)
                .iter()
                .copied()
                .filter(|&child| !self.is_structural(child))
                .collect();
            for child in inline {
                self.tree.move_to(child, first, usize::MAX);
            }
            changes.push(Change::child_list(first));
            if self.tree.child_blocks(last).next().is_none() {
                let parent = self.tree.parent(last);
                self.tree.remove(last);
                if let Some(parent) = parent {
                    changes.push(Change::child_list(parent));
                    self.prune_empty(parent);
                }
            }
        }
        let root = self.tree.root();
        self.tree.normalize(root);
        Some(Applied::new(changes, Some(Offset::caret(start))))
    }

    fn split_block(&mut self, at: usize) -> Option<Applied> {
        let position = self.caret(at)?;
        let block = self.container_of(position.node)?;
        let behavior = behavior(self.tree.block(block)?.block_type);
        match behavior.enter() {
            EnterAction::LineBreak => return self.insert_text(at, "\n"),
            EnterAction::InsertAfter => return self.insert_default_after(block),
            EnterAction::ExitWhenEmpty if self.is_blank(block) => return self.outdent(block),
            EnterAction::ExitWhenEmpty | EnterAction::Split => {}
        }

        let right = self.split_at(block, position)?;
        if behavior.empty_tail_is_default()
            && self.is_blank(right)
            && let Some(tail) = self.tree.block_mut(right)
        {
            *tail = self.catalog.new_default_block();
        }
        let parent = self.tree.parent(block)?;
        Some(Applied::new(
            vec![Change::child_list(parent), Change::child_list(block)],
            self.offset_of(Position::new(right, 0)),
        ))
    }

    fn insert_line_break(&mut self, at: usize) -> Option<Applied> {
        let position = self.caret(at)?;
        let (parent, index) = self.cut_text(position)?;
        self.tree
            .insert(parent, index, NodeKind::Element(InlineElement::new("br")));
        Some(Applied::new(
            vec![Change::child_list(parent)],
            self.offset_of(Position::new(parent, index + 1)),
        ))
    }

    /// Move a list item into a nested list under its previous sibling.
    fn indent(&mut self, item: NodeId) -> Option<Applied> {
        if !self.tree.block(item)?.block_type.is_list_item() {
            return None;
        }
        let list = self.tree.parent(item)?;
        let index = self.tree.index_in_parent(item)?;
        let previous = *self.tree.children(list).get(index.checked_sub(1)?)?;
        let previous_type = self.tree.block(previous)?.block_type;
        let list_block = self.tree.block(list)?.clone();
        if !self
            .catalog
            .allows(ParentKind::Block(previous_type), list_block.block_type)
        {
            return None;
        }

        let existing = self.tree.child_blocks(previous).last().filter(|&id| {
            self.tree.block(id).is_some_and(|b| {
                b.block_type == list_block.block_type && b.tag == list_block.tag
            })
        });
        let nested = match existing {
            Some(nested) => nested,
            None => self
                .tree
                .append(previous, NodeKind::Block(plain_copy(&list_block))),
        };
        self.tree.move_to(item, nested, usize::MAX);
        Some(Applied::new(
            vec![Change::child_list(list), Change::child_list(nested)],
            self.current(),
        ))
    }

    /// Move a list item out one level. At the top level the item becomes a
    /// default block splitting its list in two.
    fn outdent(&mut self, item: NodeId) -> Option<Applied> {
        if !self.tree.block(item)?.block_type.is_list_item() {
            return None;
        }
        let list = self.tree.parent(item)?;
        let index = self.tree.index_in_parent(item)?;
        let list_block = self.tree.block(list)?.clone();
        let tail: Vec<NodeId> = self.tree.children(list)[index + 1..].to_vec();
        let owner = self.tree.parent(list)?;
        let mut changes = vec![Change::child_list(list)];
        let landing;

        if self.tree.block(owner).is_some_and(|b| b.block_type.is_list_item()) {
            if !tail.is_empty() {
                let nested = self
                    .tree
                    .append(item, NodeKind::Block(plain_copy(&list_block)));
                for child in tail {
                    self.tree.move_to(child, nested, usize::MAX);
                }
            }
            let outer = self.tree.parent(owner)?;
            let at = self.tree.index_in_parent(owner)? + 1;
            self.tree.move_to(item, outer, at);
            changes.push(Change::child_list(outer));
            landing = item;
        } else {
            let at = self.tree.index_in_parent(list)? + 1;
            if !tail.is_empty() {
                let rest = self
                    .tree
                    .insert(owner, at, NodeKind::Block(plain_copy(&list_block)));
                for child in tail {
                    self.tree.move_to(child, rest, usize::MAX);
                }
            }
            let block = self
                .tree
                .insert(owner, at, NodeKind::Block(self.catalog.new_default_block()));
            let mut next = at + 1;
            let children = self.tree.children(item).to_vec();
            for child in children {
                if self.is_structural(child) {
                    self.tree.move_to(child, owner, next);
                    next += 1;
                } else {
                    self.tree.move_to(child, block, usize::MAX);
                }
            }
            self.tree.remove(item);
            changes.push(Change::child_list(owner));
            landing = block;
        }

        if self.tree.child_blocks(list).next().is_none() {
            self.tree.remove(list);
        }
        let selection = self
            .current()
            .or_else(|| self.offset_of(Position::new(landing, 0)));
        Some(Applied::new(changes, selection))
    }

    fn set_checked(&mut self, item: NodeId, checked: bool) -> Option<Applied> {
        let block = self.tree.block_mut(item)?;
        if block.block_type != BlockType::TodoItem || block.checked == Some(checked) {
            return None;
        }
        block.checked = Some(checked);
        Some(Applied::new(
            vec![Change::attributes(item, "checked")],
            self.current(),
        ))
    }

    fn set_attr(&mut self, id: NodeId, name: &str, value: Option<&str>) -> Option<Applied> {
        let block = self.tree.block_mut(id)?;
        match value {
            Some(value) if name != "style" && block.attr(name) == Some(value) => return None,
            Some(value) => block.set_attr(name, value),
            None => {
                block.remove_attr(name)?;
            }
        }
        Some(Applied::new(
            vec![Change::attributes(id, name)],
            self.current(),
        ))
    }

    fn set_style(&mut self, id: NodeId, property: &str, value: Option<&str>) -> Option<Applied> {
        let block = self.tree.block_mut(id)?;
        if block.current_style().get(property) == value {
            return None;
        }
        block.set_style(property, value);
        Some(Applied::new(
            vec![Change::attributes(id, "style")],
            self.current(),
        ))
    }

    fn remove_block(&mut self, id: NodeId) -> Option<Applied> {
        if !self.tree.is_block(id) {
            return None;
        }
        let parent = self.tree.parent(id)?;
        let start = Projection::build(self.catalog, self.tree, self.tree.root()).start_of(id);
        self.tree.remove(id);
        let root = self.tree.root();
        if self.tree.blocks().next().is_none() {
            self.tree.clear();
            self.tree
                .append(root, NodeKind::Block(self.catalog.new_default_block()));
            self.diagnostics.push(Diagnostic::EmptyDocument);
        }
        let selection = self.current().or(start.map(Offset::caret));
        Some(Applied::new(vec![Change::child_list(parent)], selection))
    }

    fn convert_block(&mut self, id: NodeId, to: BlockType) -> Option<Applied> {
        if !CONVERTIBLE.contains(&to) {
            return None;
        }
        let target = self.climb_until_allowed(self.tree.nearest_block(id)?, to)?;
        let source = self.tree.block(target)?;
        if source.block_type == to || !source.editable {
            return None;
        }
        let tag = match (to, source.heading_level()) {
            (BlockType::Heading, Some(_)) => source.tag.clone(),
            _ => to.default_tag().to_string(),
        };

        let with_markers = match self.selection {
            Some(selection) => marker::insert(self.catalog, self.tree, &selection).is_some(),
            None => false,
        };
        let markup = conversion_markup(
            to,
            &tag,
            self.catalog.default_type(),
            self.catalog.default_tag(),
            self.text_segments(target),
        );

        let parent = self.tree.parent(target)?;
        let index = self.tree.index_in_parent(target)?;
        let scope = self.scope_of(parent);
        let mut built = BlockTree::new();
        let built_root = built.root();
        TreeBuilder::new(self.catalog, &mut built, self.diagnostics).build_flow(
            built_root,
            scope,
            &quire_markup::parse(&markup),
        );
        self.tree.remove(target);
        for (i, &child) in built.children(built_root).iter().enumerate() {
            self.tree.graft(parent, index + i, &built, child);
        }

        let selection = if with_markers {
            marker::restore(self.catalog, self.tree, self.diagnostics)
                .and_then(|selection| offset::get(self.catalog, self.tree, &selection, None))
        } else {
            None
        };
        Some(Applied::new(vec![Change::child_list(parent)], selection))
    }

    fn insert_markup(&mut self, at: usize, markup: &str) -> Option<Applied> {
        if markup.trim().is_empty() {
            return None;
        }
        let parsed = Parser::new(self.catalog).parse_markup(markup);
        if parsed.diagnostics.contains(&Diagnostic::EmptyDocument) {
            log::debug!("pasted markup holds no blocks");
            return None;
        }
        self.diagnostics.extend(parsed.diagnostics);
        let source = parsed.document.tree;

        let position = self.caret(at)?;
        let container = self.container_of(position.node)?;
        let anchor = self.tree.top_level(container)?;
        let root = self.tree.root();
        let mut index = self.tree.index_in_parent(anchor)? + 1;
        if anchor == container {
            let right = self.split_at(container, position)?;
            if self.is_blank(right) {
                self.tree.remove(right);
            }
            if self.is_blank(container) {
                self.tree.remove(container);
                index -= 1;
            }
        }

        let mut last = None;
        for &block in source.children(source.root()) {
            last = self.tree.graft(root, index, &source, block);
            index += 1;
        }
        let selection = last.and_then(|id| {
            let end = self.tree.children(id).len();
            self.offset_of(Position::new(id, end))
        });
        Some(Applied::new(vec![Change::child_list(root)], selection))
    }

    fn insert_inline(&mut self, at: usize, markup: &str) -> Option<Applied> {
        let parsed = Parser::new(self.catalog).parse_line(markup);
        self.diagnostics.extend(parsed.diagnostics);
        let source = parsed.document.tree;
        let fragment = source.children(source.root()).to_vec();
        if fragment.is_empty() {
            return None;
        }
        let length = offset::plain_text(self.catalog, &source, None).chars().count();

        let position = self.caret(at)?;
        let start = self.offset_of(position)?.start;
        let (parent, mut index) = self.cut_text(position)?;
        for child in fragment {
            self.tree.graft(parent, index, &source, child);
            index += 1;
        }
        self.tree.normalize(parent);
        Some(Applied::new(
            vec![Change::child_list(parent)],
            Some(Offset::caret(start + length)),
        ))
    }

    /// New default block after `block`, or after the nearest ancestor
    /// that may be followed by one.
    fn insert_default_after(&mut self, block: NodeId) -> Option<Applied> {
        let current = self.climb_until_allowed(block, self.catalog.default_type())?;
        let parent = self.tree.parent(current)?;
        let index = self.tree.index_in_parent(current)? + 1;
        let id = self
            .tree
            .insert(parent, index, NodeKind::Block(self.catalog.new_default_block()));
        Some(Applied::new(
            vec![Change::child_list(parent)],
            self.offset_of(Position::new(id, 0)),
        ))
    }

    /// Split `block` at `position`, duplicating inline ancestors on the
    /// way up. Returns the new right-hand block.
    fn split_at(&mut self, block: NodeId, position: Position) -> Option<NodeId> {
        let (mut parent, mut cut) = self.cut_text(position)?;
        while parent != block {
            let copy = self.tree.clone_shallow(parent)?;
            self.move_tail(parent, cut, copy);
            let grandparent = self.tree.parent(parent)?;
            let at = self.tree.index_in_parent(parent)? + 1;
            if self.tree.children(copy).is_empty() {
                self.tree.remove(copy);
            } else {
                self.tree.move_to(copy, grandparent, at);
            }
            parent = grandparent;
            cut = at;
        }

        let right = self.tree.clone_shallow(block)?;
        self.move_tail(block, cut, right);
        let container = self.tree.parent(block)?;
        let at = self.tree.index_in_parent(block)? + 1;
        self.tree.move_to(right, container, at);
        if let Some(copy) = self.tree.block_mut(right) {
            reset_copy(copy);
        }
        self.tree.normalize(block);
        self.tree.normalize(right);
        Some(right)
    }

    fn move_tail(&mut self, from: NodeId, index: usize, to: NodeId) {
        let tail = self
            .tree
            .children(from)
            .get(index..)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        for (i, child) in tail.into_iter().enumerate() {
            self.tree.move_to(child, to, i);
        }
    }

    /// Split the text node at `position` and return the child slot between
    /// the halves.
    fn cut_text(&mut self, position: Position) -> Option<(NodeId, usize)> {
        let Some(text) = self.tree.text(position.node) else {
            return Some((position.node, position.offset));
        };
        let len = text.chars().count();
        let parent = self.tree.parent(position.node)?;
        let index = self.tree.index_in_parent(position.node)?;
        let slot = if position.offset == 0 {
            index
        } else {
            if position.offset < len {
                self.tree.split_text(position.node, position.offset)?;
            }
            index + 1
        };
        Some((parent, slot))
    }

    /// Text position for `at`, creating a placeholder when needed.
    fn caret(&mut self, at: usize) -> Option<Position> {
        offset::set(
            self.catalog,
            self.tree,
            Offset::caret(at),
            None,
            self.diagnostics,
        )
        .map(|selection| selection.anchor)
    }

    fn offset_of(&self, position: Position) -> Option<Offset> {
        offset::get(self.catalog, self.tree, &Selection::caret(position), None)
    }

    /// The incoming selection as an offset, if it still resolves.
    fn current(&self) -> Option<Offset> {
        let selection = self.selection?;
        offset::get(self.catalog, self.tree, &selection, None)
    }

    fn container_of(&self, node: NodeId) -> Option<NodeId> {
        self.tree.ancestors(node).find(|&id| {
            self.tree.block(id).is_some_and(|b| {
                !b.inline && b.editable && self.catalog.nested(b.block_type).is_text_bearing()
            })
        })
    }

    /// `block`, or its nearest ancestor whose parent accepts `block_type`.
    fn climb_until_allowed(&self, block: NodeId, block_type: BlockType) -> Option<NodeId> {
        let mut current = block;
        loop {
            let parent = self.tree.parent(current)?;
            if self.catalog.allows(self.scope_of(parent), block_type) {
                return Some(current);
            }
            if !self.tree.is_block(parent) {
                return None;
            }
            current = parent;
        }
    }

    fn scope_of(&self, id: NodeId) -> ParentKind {
        match self.tree.block(id) {
            Some(block) => ParentKind::Block(block.block_type),
            None => ParentKind::Root,
        }
    }

    fn is_structural(&self, id: NodeId) -> bool {
        self.tree.block(id).is_some_and(|b| !b.inline)
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor != id && self.tree.ancestors(id).any(|a| a == ancestor)
    }

    /// No visible text, breaks or blocks inside.
    fn is_blank(&self, id: NodeId) -> bool {
        self.tree
            .descendants(id)
            .into_iter()
            .all(|node| match self.tree.kind(node) {
                Some(NodeKind::Text(text)) => text.chars().all(is_invisible),
                Some(NodeKind::Marker(_)) => true,
                _ => false,
            })
    }

    /// Remove `id` and its ancestors while they are block containers left
    /// without child blocks.
    fn prune_empty(&mut self, id: NodeId) {
        let mut current = id;
        while let Some(block) = self.tree.block(current) {
            let holds_blocks = matches!(
                self.catalog.nested(block.block_type),
                NestedSelector::Children { .. }
            );
            if !holds_blocks || self.tree.child_blocks(current).next().is_some() {
                return;
            }
            let Some(parent) = self.tree.parent(current) else {
                return;
            };
            self.tree.remove(current);
            current = parent;
        }
    }

    /// Inline markup of every text-bearing block under `id` (itself
    /// included), markers kept. Blank blocks are skipped.
    fn text_segments(&self, id: NodeId) -> Vec<String> {
        std::iter::once(id)
            .chain(self.tree.descendants(id))
            .filter(|&node| {
                self.tree.block(node).is_some_and(|b| {
                    !b.inline && self.catalog.nested(b.block_type).is_text_bearing()
                })
            })
            .map(|node| self.inline_markup(node))
            .filter(|markup| !markup.trim().is_empty())
            .collect()
    }

    fn inline_markup(&self, id: NodeId) -> String {
        let mut unparser = Unparser::new(
            self.catalog,
            self.tree,
            UnparseOptions::storage().with_markers(),
        );
        for &child in self.tree.children(id) {
            if !self.is_structural(child) {
                unparser.write_node(child);
            }
        }
        unparser.finish()
    }
}

/// Types [`Cmd::ConvertBlock`] can produce.
const CONVERTIBLE: &[BlockType] = &[
    BlockType::Paragraph,
    BlockType::Heading,
    BlockType::Text,
    BlockType::Address,
    BlockType::Pre,
    BlockType::List,
    BlockType::Todo,
    BlockType::Quote,
    BlockType::Wrapper,
];

/// Hinted markup for the converted block(s). Text targets get one block
/// per segment; list targets one item per segment.
fn conversion_markup(
    to: BlockType,
    tag: &str,
    default_type: BlockType,
    default_tag: &str,
    segments: Vec<String>,
) -> String {
    let segments = if segments.is_empty() {
        vec![String::new()]
    } else {
        segments
    };
    let wrap = |block_type: BlockType, tag: &str, inner: &str| {
        format!(
            "<{tag} {}=\"{}\">{inner}</{tag}>",
            attr::TYPE,
            block_type.name()
        )
    };
    let each = |block_type: BlockType, tag: &str| -> String {
        segments
            .iter()
            .map(|segment| wrap(block_type, tag, segment))
            .collect()
    };
    match to {
        BlockType::Pre => wrap(to, tag, &segments.join("\n")),
        BlockType::List => wrap(to, tag, &each(BlockType::ListItem, "li")),
        BlockType::Todo => wrap(to, tag, &each(BlockType::TodoItem, "li")),
        BlockType::Quote | BlockType::Wrapper => wrap(to, tag, &each(default_type, default_tag)),
        _ => each(to, tag),
    }
}

/// A list block with the same type and tag but none of the attributes.
fn plain_copy(list: &Block) -> Block {
    let mut copy = list.clone();
    copy.attrs = Attributes::new();
    copy.style = Style::default();
    copy
}

/// Clear per-instance state on the right half of a split.
fn reset_copy(block: &mut Block) {
    for name in [attr::FOCUS, attr::DRAG, "id"] {
        block.attrs.remove(name);
    }
    if block.checked.is_some() {
        block.checked = Some(false);
    }
}
