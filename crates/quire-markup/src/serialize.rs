//! Serializing markup trees back to text.
//!
//! The low-level writers are public so other trees (the engine's block
//! tree) can emit markup with the same escaping rules.

use crate::dom::{Element, Node};
use crate::tags;

/// Write `<name a="v">`. Attribute values are always double-quoted.
pub fn write_start_tag<'a>(
    out: &mut String,
    name: &str,
    attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        html_escape::encode_double_quoted_attribute_to_string(value, out);
        out.push('"');
    }
    out.push('>');
}

/// Write `</name>`; void elements have none.
pub fn write_end_tag(out: &mut String, name: &str) {
    if tags::is_void(name) {
        return;
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub fn write_text(out: &mut String, text: &str) {
    html_escape::encode_text_to_string(text, out);
}

pub fn write_comment(out: &mut String, value: &str) {
    out.push_str("<!--");
    out.push_str(value);
    out.push_str("-->");
}

/// Serialize a list of nodes.
pub fn to_markup(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, false);
    }
    out
}

/// Serialize the children of an element.
pub fn inner_markup(element: &Element) -> String {
    let raw = tags::is_raw_text(&element.name);
    let mut out = String::new();
    for child in &element.children {
        write_node(&mut out, child, raw);
    }
    out
}

fn write_node(out: &mut String, node: &Node, raw: bool) {
    match node {
        Node::Text(text) if raw => out.push_str(&text.value),
        Node::Text(text) => write_text(out, &text.value),
        Node::Comment(comment) => write_comment(out, &comment.value),
        Node::Element(el) => {
            write_start_tag(out, &el.name, el.attrs.iter());
            let raw = tags::is_raw_text(&el.name);
            for child in &el.children {
                write_node(out, child, raw);
            }
            write_end_tag(out, &el.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<p>Hello</p>", "<p>Hello</p>")]
    #[case("<p class=x>a &amp; b &lt;c&gt;</p>", "<p class=\"x\">a &amp; b &lt;c&gt;</p>")]
    #[case("<img src='a.png' alt=\"q&quot;\">", "<img src=\"a.png\" alt=\"q&quot;\">")]
    #[case("<ul><li>a<li>b</ul>", "<ul><li>a</li><li>b</li></ul>")]
    #[case("<script>a < b</script>", "<script>a < b</script>")]
    #[case("x<!-- c -->y", "x<!-- c -->y")]
    fn serializes_normalized_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_markup(&parse(input)), expected);
    }

    #[rstest]
    #[case("<div><p>one<p>two</div>")]
    #[case("<table><tr><td>1<td>2</table>")]
    #[case("text <b>bold <i>both</b> tail")]
    fn serialization_is_a_fixed_point(#[case] input: &str) {
        let once = to_markup(&parse(input));
        let twice = to_markup(&parse(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn inner_markup_excludes_the_element() {
        let nodes = parse("<li>a <b>b</b></li>");
        let li = nodes[0].as_element().unwrap();
        assert_eq!(inner_markup(li), "a <b>b</b>");
    }
}
