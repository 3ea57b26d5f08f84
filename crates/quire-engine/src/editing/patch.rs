use crate::model::{NodeId, attr};
use crate::offset::Offset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One mutation, as reported to [`Editor::on_mutation_batch`].
///
/// [`Editor::on_mutation_batch`]: crate::editor::Editor::on_mutation_batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub target: NodeId,
    /// Attribute name for [`ChangeKind::Attributes`].
    pub attribute: Option<String>,
}

impl Change {
    pub fn child_list(target: NodeId) -> Self {
        Self {
            kind: ChangeKind::ChildList,
            target,
            attribute: None,
        }
    }

    pub fn attributes(target: NodeId, name: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Attributes,
            target,
            attribute: Some(name.into()),
        }
    }

    pub fn character_data(target: NodeId) -> Self {
        Self {
            kind: ChangeKind::CharacterData,
            target,
            attribute: None,
        }
    }

    /// Touches only editor bookkeeping (focus, drag, style cache).
    pub fn is_bookkeeping(&self) -> bool {
        self.kind == ChangeKind::Attributes
            && self.attribute.as_deref().is_some_and(attr::is_bookkeeping)
    }
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub changes: Vec<Change>,
    /// Caret after the edit, as a plain-text offset.
    pub new_selection: Option<Offset>,
    pub version: u64,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
