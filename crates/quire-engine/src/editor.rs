//! # Editor
//!
//! One editable document with everything that belongs to it: the catalog
//! (and through it the configuration), the caret, history and the
//! interaction mode.
//!
//! ## Edit loop
//!
//! 1. [`Editor::apply`] runs a [`Cmd`] and returns a [`Patch`]
//! 2. the host calls [`Editor::on_mutation_batch`] with the patch's changes
//! 3. a history entry is recorded and `editor.change` is queued
//!
//! Events are queued rather than dispatched; the host drains them with
//! [`Editor::drain_events`].

use std::collections::VecDeque;
use std::path::Path;

use quire_config::EditorConfig;

use crate::catalog::Catalog;
use crate::editing::{Change, Cmd, CommandContext, Patch};
use crate::error::{Diagnostic, EngineError};
use crate::history::{History, InteractionMode, Snapshot, Trigger};
use crate::json::JsonDocument;
use crate::model::{BlockTree, Document, DocumentMeta, NodeId, NodeKind};
use crate::offset::{self, Offset, Selection};
use crate::parsing::{ParseMode, Parsed, Parser};
use crate::ready::{self, Readiness};
use crate::unparse::json::JsonWriter;
use crate::unparse::{UnparseOptions, unparse};

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Ready { attempts: u32 },
    Change { version: u64 },
    /// Carries the snapshot that was restored.
    Undo(Snapshot),
    Redo(Snapshot),
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::Ready { .. } => "editor.ready",
            EditorEvent::Change { .. } => "editor.change",
            EditorEvent::Undo(_) => "state.undo",
            EditorEvent::Redo(_) => "state.redo",
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    catalog: Catalog,
    document: Document,
    selection: Option<Selection>,
    history: History,
    mode: InteractionMode,
    events: VecDeque<EditorEvent>,
    diagnostics: Vec<Diagnostic>,
    version: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_catalog(Catalog::standard(config))
    }

    /// An editor holding one empty default block.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let mut tree = BlockTree::new();
        let root = tree.root();
        tree.append(root, NodeKind::Block(catalog.new_default_block()));
        let meta = DocumentMeta::from(&catalog.config().document);
        let history = History::from_config(&catalog.config().history);
        let mut editor = Self {
            catalog,
            document: Document::new(tree, meta),
            selection: None,
            history,
            mode: InteractionMode::Normal,
            events: VecDeque::new(),
            diagnostics: Vec::new(),
            version: 0,
        };
        editor.restart_history();
        editor
    }

    /// Editor configured from a TOML file; a missing file means defaults.
    pub fn from_config_path<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let config = EditorConfig::load_from_path(path)?.unwrap_or_default();
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EditorConfig {
        self.catalog.config()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tree(&self) -> &BlockTree {
        &self.document.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Parse without touching the editor's document.
    pub fn parse(&self, input: &str, mode: ParseMode) -> Parsed {
        Parser::new(&self.catalog).parse(input, mode)
    }

    /// Replace the document with `markup` and start a fresh history.
    pub fn load(&mut self, markup: &str) {
        let parsed = self.parse(markup, ParseMode::Markup);
        self.replace_document(parsed);
    }

    pub fn unparse(&self) -> String {
        self.unparse_with(UnparseOptions::storage())
    }

    pub fn unparse_with(&self, options: UnparseOptions) -> String {
        unparse(&self.catalog, &self.document.tree, options)
    }

    /// Plain-text view, with the caret's counting rules.
    pub fn plain_text(&self) -> String {
        offset::plain_text(&self.catalog, &self.document.tree, None)
    }

    pub fn get_json(&self) -> JsonDocument {
        JsonWriter::new(&self.catalog, &self.document.tree).document(&self.document)
    }

    pub fn get_json_string(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.get_json())?)
    }

    /// Replace the document from JSON. Unlike [`ParseMode::Json`], invalid
    /// JSON is an error and leaves the document untouched.
    pub fn set_json(&mut self, json: &str) -> Result<(), EngineError> {
        let json: JsonDocument = serde_json::from_str(json)?;
        let parsed = Parser::new(&self.catalog).parse_json_document(&json);
        self.replace_document(parsed);
        Ok(())
    }

    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let applied = CommandContext::new(
            &self.catalog,
            &mut self.document.tree,
            self.selection,
            &mut self.diagnostics,
        )
        .apply(&cmd);

        if !applied.changes.is_empty() {
            self.version += 1;
        }
        if let Some(offset) = applied.selection {
            self.place(offset, None);
        }
        Patch {
            changes: applied.changes,
            new_selection: applied.selection,
            version: self.version,
        }
    }

    /// Record a batch of mutations. Batches that only touch bookkeeping
    /// attributes are ignored.
    pub fn on_mutation_batch(&mut self, changes: &[Change]) -> Trigger {
        if changes.iter().all(Change::is_bookkeeping) {
            return Trigger::Ignored;
        }
        self.trigger()
    }

    /// Snapshot the current state into history.
    pub fn trigger(&mut self) -> Trigger {
        let trigger = self.history.trigger(self.snapshot(), self.mode);
        if matches!(trigger, Trigger::Pushed | Trigger::Replaced) {
            self.events.push_back(EditorEvent::Change {
                version: self.version,
            });
        }
        trigger
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        self.events.push_back(EditorEvent::Undo(snapshot));
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        self.events.push_back(EditorEvent::Redo(snapshot));
        true
    }

    /// The current history entry.
    pub fn get(&self) -> Option<&Snapshot> {
        self.history.get()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.unparse(), self.get_offset(None))
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn get_offset(&self, scope: Option<NodeId>) -> Option<Offset> {
        let selection = self.selection?;
        offset::get(&self.catalog, &self.document.tree, &selection, scope)
    }

    /// Move the caret. Setting the offset it already has does nothing.
    pub fn set_offset(&mut self, offset: Offset, scope: Option<NodeId>) {
        if self.get_offset(scope) == Some(offset) {
            return;
        }
        self.place(offset, scope);
    }

    pub fn interaction(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_interaction(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    /// End the current typing burst.
    pub fn close_burst(&mut self) {
        self.history.close_burst();
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Poll `probe` with the configured startup interval; queues
    /// `editor.ready` once it succeeds.
    pub fn wait_until_ready(&mut self, probe: impl FnMut() -> bool) -> Readiness {
        let readiness = ready::poll_with_config(probe, &self.config().startup);
        if let Readiness::Ready { attempts } = readiness {
            self.events.push_back(EditorEvent::Ready { attempts });
        }
        readiness
    }

    fn place(&mut self, offset: Offset, scope: Option<NodeId>) {
        self.selection = offset::set(
            &self.catalog,
            &mut self.document.tree,
            offset,
            scope,
            &mut self.diagnostics,
        );
    }

    fn replace_document(&mut self, parsed: Parsed) {
        self.document = parsed.document;
        self.diagnostics.extend(parsed.diagnostics);
        self.selection = None;
        self.version += 1;
        self.restart_history();
    }

    fn restart_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.start(snapshot);
    }

    /// Rebuild the tree from a snapshot. A snapshot that no longer parses
    /// to anything yields one empty default block.
    fn restore(&mut self, snapshot: &Snapshot) {
        let parsed = Parser::new(&self.catalog).parse_markup(&snapshot.markup);
        self.document.tree = parsed.document.tree;
        self.diagnostics.extend(parsed.diagnostics);
        self.selection = None;
        self.version += 1;
        if let Some(offset) = snapshot.offset {
            self.place(offset, None);
        }
        log::debug!("restored snapshot at version {}", self.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BlockType;
    use pretty_assertions::assert_eq;

    fn names(events: &[EditorEvent]) -> Vec<&'static str> {
        events.iter().map(EditorEvent::name).collect()
    }

    #[test]
    fn new_editor_has_one_empty_block() {
        let editor = Editor::default();
        assert_eq!(editor.unparse(), "<p></p>");
        assert_eq!(editor.history().undo_len(), 1);
        assert!(editor.diagnostics().is_empty());
    }

    #[test]
    fn edit_record_undo_redo() {
        let mut editor = Editor::default();
        editor.load("<p>ab</p>");
        let patch = editor.apply(Cmd::InsertText {
            at: 2,
            text: "c".into(),
        });
        assert_eq!(patch.new_selection, Some(Offset::caret(3)));
        assert_eq!(editor.on_mutation_batch(&patch.changes), Trigger::Pushed);
        assert_eq!(editor.unparse(), "<p>abc</p>");

        assert!(editor.undo());
        assert_eq!(editor.unparse(), "<p>ab</p>");
        assert!(editor.redo());
        assert_eq!(editor.unparse(), "<p>abc</p>");
        assert_eq!(editor.get_offset(None), Some(Offset::caret(3)));
        assert!(!editor.redo());

        assert_eq!(
            names(&editor.drain_events()),
            vec!["editor.change", "state.undo", "state.redo"]
        );
    }

    #[test]
    fn bookkeeping_batches_are_ignored() {
        let mut editor = Editor::default();
        editor.load("<p>x</p>");
        let p = editor.tree().blocks().next().unwrap();
        let patch = editor.apply(Cmd::SetAttr {
            block: p,
            name: "data-quire-focus".into(),
            value: Some("true".into()),
        });
        assert_eq!(editor.on_mutation_batch(&patch.changes), Trigger::Ignored);
        assert_eq!(editor.unparse(), "<p>x</p>");
    }

    #[test]
    fn dragging_suspends_history() {
        let mut editor = Editor::default();
        editor.load("<p>x</p>");
        editor.set_interaction(InteractionMode::Dragging);
        let patch = editor.apply(Cmd::InsertText {
            at: 1,
            text: "y".into(),
        });
        assert_eq!(editor.on_mutation_batch(&patch.changes), Trigger::Ignored);
        assert!(!editor.history().can_undo());
        assert!(editor.drain_events().is_empty());
    }

    #[test]
    fn set_offset_to_current_is_a_noop() {
        let mut editor = Editor::default();
        editor.load("<p>abc</p>");
        editor.set_offset(Offset::caret(2), None);
        let before = editor.selection();
        editor.set_offset(Offset::caret(2), None);
        assert_eq!(editor.selection(), before);
    }

    #[test]
    fn json_round_trip_through_the_editor() {
        let mut editor = Editor::default();
        editor
            .set_json(r#"{"blocks": [{"type": "heading", "level": 1, "content": "T"}]}"#)
            .unwrap();
        assert_eq!(editor.unparse(), "<h1>T</h1>");
        let json = editor.get_json();
        assert_eq!(json.blocks[0].block_type, BlockType::Heading.name());
        assert!(editor.set_json("{not json").is_err());
        assert_eq!(editor.unparse(), "<h1>T</h1>");
    }

    #[test]
    fn ready_event_is_queued() {
        let mut editor = Editor::default();
        let readiness = editor.wait_until_ready(|| true);
        assert_eq!(readiness, Readiness::Ready { attempts: 1 });
        assert_eq!(names(&editor.drain_events()), vec!["editor.ready"]);
    }
}
