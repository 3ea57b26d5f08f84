//! The caret is a plain-text offset; it must survive every rebuild of the
//! tree (conversion, paste, undo).

use pretty_assertions::assert_eq;
use quire_engine::{BlockType, Cmd, Editor, Offset};

fn editor(markup: &str) -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut editor = Editor::default();
    editor.load(markup);
    editor
}

#[test]
fn every_offset_round_trips() {
    let mut editor = editor("<h2>Head</h2><p>one <b>two</b><br>three</p><ul><li>x<ul><li>y</li></ul></li></ul>");
    let len = editor.plain_text().chars().count();
    assert_eq!(editor.plain_text(), "Head\none two\nthree\nx\ny");
    for at in 0..=len {
        editor.set_offset(Offset::caret(at), None);
        assert_eq!(editor.get_offset(None), Some(Offset::caret(at)), "offset {at}");
    }
    let range = Offset::range(2, 15);
    editor.set_offset(range, None);
    assert_eq!(editor.get_offset(None), Some(range));
    assert_eq!(editor.unparse(), "<h2>Head</h2><p>one <b>two</b><br>three</p><ul><li>x<ul><li>y</li></ul></li></ul>");
}

#[test]
fn conversion_keeps_the_caret() {
    let mut editor = editor("<p>alpha</p><p>beta gamma</p>");
    editor.set_offset(Offset::caret(9), None);
    let block = editor.tree().blocks().nth(1).unwrap();
    let patch = editor.apply(Cmd::ConvertBlock {
        block,
        to: BlockType::Heading,
    });
    assert_eq!(editor.unparse(), "<p>alpha</p><h2>beta gamma</h2>");
    assert_eq!(patch.new_selection, Some(Offset::caret(9)));
    assert_eq!(editor.get_offset(None), Some(Offset::caret(9)));
}

#[test]
fn paste_blocks_into_the_middle_of_a_paragraph() {
    let mut editor = editor("<p>abcd</p>");
    let patch = editor.apply(Cmd::InsertMarkup {
        at: 2,
        markup: "<h2>T</h2>".into(),
    });
    assert_eq!(editor.unparse(), "<p>ab</p><h2>T</h2><p>cd</p>");
    assert_eq!(patch.new_selection, Some(Offset::caret(4)));
}

#[test]
fn paste_inline_fragment() {
    let mut editor = editor("<p>ad</p>");
    let patch = editor.apply(Cmd::InsertInline {
        at: 1,
        markup: "<p>b<i>c</i></p>".into(),
    });
    assert_eq!(editor.unparse(), "<p>ab<i>c</i>d</p>");
    assert_eq!(patch.new_selection, Some(Offset::caret(3)));
}

#[test]
fn enter_in_a_list_then_enter_again_leaves_it() {
    let mut editor = editor("<ul><li>one</li></ul>");
    let patch = editor.apply(Cmd::SplitBlock { at: 3 });
    assert_eq!(editor.unparse(), "<ul><li>one</li><li></li></ul>");
    let at = patch.new_selection.unwrap().start;
    assert_eq!(at, 4);

    editor.apply(Cmd::SplitBlock { at });
    assert_eq!(editor.unparse(), "<ul><li>one</li></ul><p></p>");
    assert_eq!(editor.get_offset(None), Some(Offset::caret(4)));
}

#[test]
fn deleting_everything_leaves_one_empty_block() {
    let mut editor = editor("<p>a</p><p>b</p>");
    for block in editor.tree().blocks().collect::<Vec<_>>() {
        editor.apply(Cmd::RemoveBlock { block });
    }
    assert_eq!(editor.unparse(), "<p></p>");
    assert!(
        editor
            .take_diagnostics()
            .contains(&quire_engine::Diagnostic::EmptyDocument)
    );
}
