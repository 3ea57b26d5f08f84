//! Storage markup must survive parse → unparse unchanged once it is in
//! canonical form, and canonicalizing must be idempotent.

use quire_engine::model::BlockTree;
use quire_engine::{Catalog, NodeId, ParseMode, Parser, UnparseOptions, unparse::unparse};
use rstest::rstest;

fn canonical(catalog: &Catalog, markup: &str) -> String {
    let parsed = Parser::new(catalog).parse(markup, ParseMode::Markup);
    unparse(catalog, &parsed.document.tree, UnparseOptions::storage())
}

fn outline(tree: &BlockTree, id: NodeId, depth: usize, out: &mut String) {
    for child in tree.child_blocks(id) {
        let Some(block) = tree.block(child) else {
            continue;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} <{}>", block.block_type.name(), block.tag));
        if block.checked == Some(true) {
            out.push_str(" checked");
        }
        out.push('\n');
        outline(tree, child, depth + 1, out);
    }
}

#[rstest]
#[case::paragraphs("<p>one</p><p>two <b>bold</b> <i>it</i></p>")]
#[case::heading_and_list("<h3>T</h3><ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>")]
#[case::ordered("<ol><li>first</li><li>second</li></ol>")]
#[case::checklist("<ul><li>[x] done</li><li>[ ] open</li></ul>")]
#[case::token_inside_bold_is_content("<ul><li><b>[x]</b> done</li></ul>")]
#[case::quote("<blockquote><p>q</p></blockquote>")]
#[case::pre("<pre>fn main() {\n\n}</pre>")]
#[case::rule("<p>a</p><hr><p>b</p>")]
#[case::line_break("<p>a<br>b</p>")]
#[case::attributes("<p class=\"lead\" style=\"color: red;\">x</p>")]
#[case::noneditable("<div class=\"noneditable\"><span>frozen</span></div>")]
fn canonical_markup_round_trips(#[case] markup: &str) {
    let catalog = Catalog::default();
    assert_eq!(canonical(&catalog, markup), markup);
}

#[rstest]
#[case::loose_text("a\n\nb")]
#[case::breaks_in_div("<div>Hello<br><br>World</div>")]
#[case::unclosed("<p>one<p>two<ul><li>x")]
#[case::stray_end_tags("</div><p>x</p></p>")]
#[case::mixed("intro<h2>T</h2>tail\n\nmore")]
#[case::empty("")]
fn canonicalizing_is_idempotent(#[case] markup: &str) {
    let catalog = Catalog::default();
    let once = canonical(&catalog, markup);
    assert_eq!(canonical(&catalog, &once), once);
}

#[rstest]
#[case("<div>Hello<br><br>World</div>", "<p>Hello</p><p>World</p>")]
#[case("a\n\nb", "<p>a</p><p>b</p>")]
#[case("<ul><li>x</li></ul>", "<ul><li>x</li></ul>")]
#[case("", "<p></p>")]
#[case("<a\nhref=\"x\">link</a> tail", "<p><a href=\"x\">link</a> tail</p>")]
#[case("<span title=\"a\n\nb\">x</span>", "<p><span title=\"a\n\nb\">x</span></p>")]
#[case("x <b>a\n\nb</b> y", "<p>x <b>a</b></p><p><b>b</b> y</p>")]
fn loose_content_becomes_paragraphs(#[case] markup: &str, #[case] expected: &str) {
    assert_eq!(canonical(&Catalog::default(), markup), expected);
}

#[test]
fn mixed_document_outline() {
    let catalog = Catalog::default();
    let parsed = Parser::new(&catalog).parse(
        "<h2>Title</h2>intro text\n\nsecond<ul><li>[x] done</li><li>[ ] open</li></ul>\
         <ul><li>one<ul><li>nested</li></ul></li></ul>",
        ParseMode::Markup,
    );
    let tree = &parsed.document.tree;
    let mut out = String::new();
    outline(tree, tree.root(), 0, &mut out);
    insta::assert_snapshot!(out, @r#"
    heading <h2>
    paragraph <p>
    paragraph <p>
    todo <ul>
      todoitem <li> checked
      todoitem <li>
    list <ul>
      listitem <li>
        list <ul>
          listitem <li>
    "#);
    assert!(parsed.diagnostics.is_empty());
}
