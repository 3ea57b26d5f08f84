//! Zero-width start/end markers.
//!
//! Used around rewrites that go through markup and therefore do not keep
//! node identity:
//!
//! 1. [`insert`] the pair at the current selection
//! 2. serialize with markers kept, rewrite, re-parse
//! 3. [`restore`] reads the marker offsets, removes the markers and places
//!    the selection there

use crate::catalog::Catalog;
use crate::error::Diagnostic;
use crate::model::{BlockTree, MarkerKind, NodeId, NodeKind};

use super::{Offset, Position, Projection, Selection};

/// Insert a start/end marker pair around `selection`. The end marker goes
/// in first so the start position stays valid.
pub fn insert(catalog: &Catalog, tree: &mut BlockTree, selection: &Selection) -> Option<()> {
    let projection = Projection::build(catalog, tree, tree.root());
    let anchor = projection.offset_of(tree, selection.anchor)?;
    let focus = projection.offset_of(tree, selection.focus)?;
    let (start, end) = if anchor <= focus {
        (selection.anchor, selection.focus)
    } else {
        (selection.focus, selection.anchor)
    };
    insert_at(tree, end, MarkerKind::End)?;
    insert_at(tree, start, MarkerKind::Start)?;
    Some(())
}

fn insert_at(tree: &mut BlockTree, position: Position, kind: MarkerKind) -> Option<NodeId> {
    let Some(text) = tree.text(position.node) else {
        return Some(tree.insert(position.node, position.offset, NodeKind::Marker(kind)));
    };
    let parent = tree.parent(position.node)?;
    let index = tree.index_in_parent(position.node)?;
    let len = text.chars().count();
    let index = if position.offset == 0 {
        index
    } else if position.offset >= len {
        index + 1
    } else {
        tree.split_text(position.node, position.offset)?;
        index + 1
    };
    Some(tree.insert(parent, index, NodeKind::Marker(kind)))
}

/// Offsets of the marker pair, removal of every marker, and the selection
/// placed at those offsets. `None` when no start marker is found.
pub fn restore(
    catalog: &Catalog,
    tree: &mut BlockTree,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Selection> {
    let projection = Projection::build(catalog, tree, tree.root());
    let find = |wanted: MarkerKind| {
        tree.descendants(tree.root())
            .into_iter()
            .find(|&id| matches!(tree.kind(id), Some(NodeKind::Marker(kind)) if *kind == wanted))
            .and_then(|id| projection.start_of(id))
    };
    let start = find(MarkerKind::Start);
    let end = find(MarkerKind::End);
    remove_all(tree);

    let start = start?;
    let offset = Offset::range(start, end.unwrap_or(start));
    super::set(catalog, tree, offset, None, diagnostics)
}

/// Remove every marker and merge the text they split.
pub fn remove_all(tree: &mut BlockTree) {
    let root = tree.root();
    let markers: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| matches!(tree.kind(id), Some(NodeKind::Marker(_))))
        .collect();
    if markers.is_empty() {
        return;
    }
    for marker in markers {
        tree.remove(marker);
    }
    tree.normalize(root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::{get, set};
    use crate::parsing::{ParseMode, Parser};
    use crate::unparse::{UnparseOptions, unparse};
    use pretty_assertions::assert_eq;

    #[test]
    fn markers_survive_a_markup_round_trip() {
        let catalog = Catalog::default();
        let parser = Parser::new(&catalog);
        let mut tree = parser.parse("<p>hello world</p>", ParseMode::Markup).document.tree;
        let mut diagnostics = Vec::new();
        let selection = set(&catalog, &mut tree, Offset::range(2, 7), None, &mut diagnostics)
            .unwrap();

        insert(&catalog, &mut tree, &selection).unwrap();
        let markup = unparse(&catalog, &tree, UnparseOptions::storage().with_markers());
        assert_eq!(
            markup,
            "<p>he<span data-quire-marker=\"start\"></span>llo w\
             <span data-quire-marker=\"end\"></span>orld</p>"
        );

        let mut rebuilt = parser.parse(&markup, ParseMode::Markup).document.tree;
        let restored = restore(&catalog, &mut rebuilt, &mut diagnostics).unwrap();
        assert_eq!(get(&catalog, &rebuilt, &restored, None), Some(Offset::range(2, 7)));
        assert_eq!(
            unparse(&catalog, &rebuilt, UnparseOptions::storage().with_markers()),
            "<p>hello world</p>"
        );
    }

    #[test]
    fn remove_all_merges_split_text() {
        let catalog = Catalog::default();
        let mut tree = Parser::new(&catalog)
            .parse("<p>ab</p>", ParseMode::Markup)
            .document
            .tree;
        let p = tree.blocks().next().unwrap();
        let text = tree.children(p)[0];
        insert(&catalog, &mut tree, &Selection::caret(Position::new(text, 1))).unwrap();
        assert_eq!(tree.children(p).len(), 4);
        remove_all(&mut tree);
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text_content(p), "ab");
    }
}
