//! Structural snapshots for malformed input the editor receives from paste
//! and legacy storage.

use quire_markup::{Node, parse, to_markup};
use rstest::rstest;

fn outline(nodes: &[Node], depth: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        match node {
            Node::Element(el) => {
                out.push_str(&el.name);
                for (name, value) in el.attrs.iter() {
                    out.push_str(&format!(" {name}={value:?}"));
                }
                out.push('\n');
                outline(&el.children, depth + 1, out);
            }
            Node::Text(text) => out.push_str(&format!("{:?}\n", text.value)),
            Node::Comment(comment) => out.push_str(&format!("<!--{}-->\n", comment.value)),
        }
    }
}

#[test]
fn word_processor_paste() {
    let input = r#"<!DOCTYPE html><html><body>
<p class=MsoNormal style='margin:0'>First<o:p></o:p>
<p class=MsoNormal>Second &amp; line
<ul><li>one<li>two<ul><li>deep</ul></ul>
</body></html>"#;
    let mut out = String::new();
    outline(&parse(input), 0, &mut out);
    insta::assert_snapshot!(out, @r#"
    html
      body
        "\n"
        p class="MsoNormal" style="margin:0"
          "First"
          o:p
          "\n"
        p class="MsoNormal"
          "Second & line\n"
        ul
          li
            "one"
          li
            "two"
            ul
              li
                "deep"
        "\n"
    "#);
}

#[rstest]
#[case::unclosed_quote("<a href=\"x>text")]
#[case::lt_in_text("if a < b && c > d")]
#[case::broken_comment("<!-- <p>never closed")]
#[case::end_tag_soup("</div></span><p>x</p></p></p>")]
#[case::only_whitespace("  \n\t ")]
#[case::empty("")]
#[case::attribute_garbage("<p \"'=>x</p>")]
fn any_input_round_trips_to_a_stable_form(#[case] input: &str) {
    let once = to_markup(&parse(input));
    let twice = to_markup(&parse(&once));
    pretty_assertions::assert_eq!(once, twice);
}
