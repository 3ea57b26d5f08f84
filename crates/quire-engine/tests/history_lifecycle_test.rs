//! Edits recorded through the editor: bounded history, undo/redo as
//! inverses, and the caret coming back with each restored state.

use std::io::Write;

use quire_engine::history::Trigger;
use quire_engine::{Cmd, Editor, InteractionMode, Offset};

/// Replace the single character of `<p>N</p>` with `next`.
fn retype(editor: &mut Editor, next: &str) -> Trigger {
    let mut changes = editor
        .apply(Cmd::InsertText {
            at: 1,
            text: next.to_string(),
        })
        .changes;
    changes.extend(editor.apply(Cmd::DeleteRange { range: 0..1 }).changes);
    editor.on_mutation_batch(&changes)
}

#[test]
fn history_limit_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[history]\nlimit = 3").unwrap();

    let mut editor = Editor::from_config_path(file.path()).unwrap();
    editor.load("<p>1</p>");
    for next in ["2", "3", "4"] {
        assert_eq!(retype(&mut editor, next), Trigger::Pushed);
    }

    let kept: Vec<&str> = editor
        .history()
        .entries()
        .map(|snapshot| snapshot.markup.as_str())
        .collect();
    assert_eq!(kept, vec!["<p>2</p>", "<p>3</p>", "<p>4</p>"]);

    assert!(editor.undo());
    assert!(editor.undo());
    assert_eq!(editor.unparse(), "<p>2</p>");
    assert!(!editor.undo());
}

#[test]
fn missing_config_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let editor = Editor::from_config_path(dir.path().join("absent.toml")).unwrap();
    assert_eq!(editor.config().history.limit, 100);
}

#[test]
fn invalid_config_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[history\nlimit = ").unwrap();
    assert!(Editor::from_config_path(file.path()).is_err());
}

#[test]
fn undo_then_redo_is_identity() {
    let mut editor = Editor::default();
    editor.load("<p>start</p><ul><li>one</li></ul>");
    let patch = editor.apply(Cmd::SplitBlock { at: 2 });
    editor.on_mutation_batch(&patch.changes);
    let patch = editor.apply(Cmd::InsertText {
        at: 10,
        text: "!".into(),
    });
    editor.on_mutation_batch(&patch.changes);

    let after = (editor.unparse(), editor.get_offset(None));
    assert_eq!(after.0, "<p>st</p><p>art</p><ul><li>one!</li></ul>");

    assert!(editor.undo());
    assert_eq!(editor.unparse(), "<p>st</p><p>art</p><ul><li>one</li></ul>");
    assert!(editor.redo());
    assert_eq!((editor.unparse(), editor.get_offset(None)), after);

    assert!(editor.undo());
    assert!(editor.undo());
    assert_eq!(editor.unparse(), "<p>start</p><ul><li>one</li></ul>");
    assert!(!editor.history().can_undo());
}

#[test]
fn new_edit_after_undo_drops_redo() {
    let mut editor = Editor::default();
    editor.load("<p>a</p>");
    let patch = editor.apply(Cmd::InsertText {
        at: 1,
        text: "b".into(),
    });
    editor.on_mutation_batch(&patch.changes);
    assert!(editor.undo());
    assert!(editor.history().can_redo());

    let patch = editor.apply(Cmd::InsertText {
        at: 1,
        text: "c".into(),
    });
    editor.on_mutation_batch(&patch.changes);
    assert!(!editor.history().can_redo());
    assert_eq!(editor.unparse(), "<p>ac</p>");
}

#[test]
fn inline_tool_edits_are_not_recorded_until_it_closes() {
    let mut editor = Editor::default();
    editor.load("<p>a</p>");
    editor.set_interaction(InteractionMode::InlineTool);
    let patch = editor.apply(Cmd::InsertText {
        at: 1,
        text: "b".into(),
    });
    assert_eq!(editor.on_mutation_batch(&patch.changes), Trigger::Ignored);

    editor.set_interaction(InteractionMode::Normal);
    assert_eq!(editor.trigger(), Trigger::Pushed);
    assert!(editor.undo());
    assert_eq!(editor.unparse(), "<p>a</p>");
}

#[test]
fn undo_restores_the_caret() {
    let mut editor = Editor::default();
    editor.load("<p>hello</p>");
    editor.set_offset(Offset::caret(2), None);
    editor.trigger();
    let patch = editor.apply(Cmd::InsertText {
        at: 5,
        text: " world".into(),
    });
    editor.on_mutation_batch(&patch.changes);
    assert_eq!(editor.get_offset(None), Some(Offset::caret(11)));

    assert!(editor.undo());
    assert_eq!(editor.get_offset(None), Some(Offset::caret(2)));
}
