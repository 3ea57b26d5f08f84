//! # Marker/Offset Translator
//!
//! Carets are stored as plain-text offsets rather than node references, so
//! they survive anything that rebuilds the tree (undo, block conversion,
//! re-parsing). [`get`] turns a [`Selection`] into an [`Offset`] and [`set`]
//! turns it back, creating an invisible placeholder when no text node
//! exists at the target.
//!
//! For rewrites that go through markup, [`marker`] plants zero-width
//! start/end nodes that are serialized with the markup and located again
//! afterwards.

pub mod marker;
mod projection;

pub use projection::{Landing, Projection};
pub(crate) use projection::char_index_of_visible;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::Diagnostic;
use crate::model::{BlockTree, NodeId, NodeKind};

/// Caret placeholder inserted where a caret needs a text node.
pub const PLACEHOLDER: char = '\u{feff}';

/// Characters that take no room in the projection.
pub fn is_invisible(c: char) -> bool {
    matches!(c, '\u{feff}' | '\u{200b}')
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub start: usize,
    pub end: usize,
    pub empty: bool,
}

impl Offset {
    pub fn caret(at: usize) -> Self {
        Self {
            start: at,
            end: at,
            empty: true,
        }
    }

    pub fn range(start: usize, end: usize) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start,
            end,
            empty: start == end,
        }
    }
}

/// A point in the tree. For text nodes `offset` counts characters; for
/// anything else it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Offsets of `selection` relative to `scope` (the whole document when
/// `None`). `None` when the selection lies outside the scope.
pub fn get(
    catalog: &Catalog,
    tree: &BlockTree,
    selection: &Selection,
    scope: Option<NodeId>,
) -> Option<Offset> {
    let projection = Projection::build(catalog, tree, scope.unwrap_or(tree.root()));
    let anchor = projection.offset_of(tree, selection.anchor)?;
    let focus = projection.offset_of(tree, selection.focus)?;
    Some(Offset::range(anchor, focus))
}

/// Place a selection at `offset` within `scope`.
///
/// Offsets past the end clamp to the end and record
/// [`Diagnostic::OffsetOutOfRange`]. Where no text node covers the target
/// a placeholder text node is inserted. `None` only when the scope holds
/// no editable text container at all.
pub fn set(
    catalog: &Catalog,
    tree: &mut BlockTree,
    offset: Offset,
    scope: Option<NodeId>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Selection> {
    let scope = scope.unwrap_or(tree.root());
    let start = place(catalog, tree, offset.start, scope, diagnostics)?;
    if offset.empty || offset.end == offset.start {
        return Some(Selection::caret(start));
    }
    let end = place(catalog, tree, offset.end, scope, diagnostics)?;
    Some(Selection {
        anchor: start,
        focus: end,
    })
}

fn place(
    catalog: &Catalog,
    tree: &mut BlockTree,
    offset: usize,
    scope: NodeId,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Position> {
    let projection = Projection::build(catalog, tree, scope);
    let target = if offset > projection.len() {
        log::warn!(
            "offset {offset} is past the end ({}); clamping",
            projection.len()
        );
        diagnostics.push(Diagnostic::OffsetOutOfRange {
            requested: offset,
            clamped: projection.len(),
        });
        projection.len()
    } else {
        offset
    };
    match projection.land(tree, target)? {
        Landing::Text { node, at } => Some(Position::new(node, at)),
        Landing::Insert { parent, index } => {
            let node = tree.insert(parent, index, NodeKind::Text(PLACEHOLDER.to_string()));
            Some(Position::new(node, 1))
        }
    }
}

/// Plain-text view of `scope` using the offset projection rules.
pub fn plain_text(catalog: &Catalog, tree: &BlockTree, scope: Option<NodeId>) -> String {
    Projection::build(catalog, tree, scope.unwrap_or(tree.root()))
        .text()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{ParseMode, Parser};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(markup: &str) -> BlockTree {
        Parser::new(&Catalog::default())
            .parse(markup, ParseMode::Markup)
            .document
            .tree
    }

    #[rstest]
    #[case("<p>ab</p><p>cd</p>", "ab\ncd")]
    #[case("<p>a<br>b</p>", "a\nb")]
    #[case("<p>a</p><p></p><p>b</p>", "a\n\nb")]
    #[case("<p>a</p><hr><p>b</p>", "a\nb")]
    #[case("<p>a\u{feff}b\u{200b}</p>", "ab")]
    #[case("<blockquote><p>q</p><p>r</p></blockquote><p>s</p>", "q\nr\ns")]
    #[case("<ul><li>one<ul><li>two</li></ul></li><li>three</li></ul>", "one\ntwo\nthree")]
    #[case("<p>a</p><div class=noneditable>hidden</div><p>b</p>", "a\nb")]
    fn projection_text(#[case] markup: &str, #[case] expected: &str) {
        let catalog = Catalog::default();
        assert_eq!(plain_text(&catalog, &parse(markup), None), expected);
    }

    #[test]
    fn set_then_get_is_stable() {
        let catalog = Catalog::default();
        let mut tree = parse("<p>hello <b>big</b></p><ul><li>world</li></ul>");
        let mut diagnostics = Vec::new();
        for at in 0..=plain_text(&catalog, &tree, None).chars().count() {
            let selection =
                set(&catalog, &mut tree, Offset::caret(at), None, &mut diagnostics).unwrap();
            assert_eq!(get(&catalog, &tree, &selection, None), Some(Offset::caret(at)));
        }
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn range_selection_round_trips() {
        let catalog = Catalog::default();
        let mut tree = parse("<p>abc</p><p>def</p>");
        let mut diagnostics = Vec::new();
        let offset = Offset::range(1, 6);
        let selection = set(&catalog, &mut tree, offset, None, &mut diagnostics).unwrap();
        assert_eq!(get(&catalog, &tree, &selection, None), Some(offset));
    }

    #[test]
    fn empty_block_gets_a_placeholder() {
        let catalog = Catalog::default();
        let mut tree = parse("<p>a</p><p></p>");
        let mut diagnostics = Vec::new();
        let selection =
            set(&catalog, &mut tree, Offset::caret(2), None, &mut diagnostics).unwrap();
        let node = selection.anchor.node;
        assert_eq!(tree.text(node), Some("\u{feff}"));
        assert_eq!(selection.anchor.offset, 1);
        assert_eq!(get(&catalog, &tree, &selection, None), Some(Offset::caret(2)));
    }

    #[test]
    fn past_the_end_clamps() {
        let catalog = Catalog::default();
        let mut tree = parse("<p>abc</p>");
        let mut diagnostics = Vec::new();
        let selection =
            set(&catalog, &mut tree, Offset::caret(40), None, &mut diagnostics).unwrap();
        assert_eq!(get(&catalog, &tree, &selection, None), Some(Offset::caret(3)));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::OffsetOutOfRange {
                requested: 40,
                clamped: 3
            }]
        );
    }

    #[test]
    fn scoped_offsets_count_from_the_block() {
        let catalog = Catalog::default();
        let tree = parse("<p>abc</p><p>def</p>");
        let second = tree.blocks().nth(1).unwrap();
        let text = tree.children(second)[0];
        let selection = Selection::caret(Position::new(text, 2));
        assert_eq!(
            get(&catalog, &tree, &selection, Some(second)),
            Some(Offset::caret(2))
        );
        assert_eq!(get(&catalog, &tree, &selection, None), Some(Offset::caret(6)));
    }
}
