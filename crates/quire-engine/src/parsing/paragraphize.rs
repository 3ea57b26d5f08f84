//! Loose content → paragraphs.
//!
//! Top-level content is split into *pieces*. Block-level elements,
//! comments, media and anything the editor must not rewrite are
//! placeholders: they are copied back byte-for-byte from the source.
//! Everything else (bare text and inline markup) forms *loose runs*, which
//! are cut on blank lines and wrapped in the default tag.
//!
//! ```text
//! "a\n\nb<ul><li>x</li></ul>c"
//!   loose "a\n\nb" │ placeholder <ul>…</ul> │ loose "c"
//!   <p>a</p><p>b</p> <ul><li>x</li></ul>      <p>c</p>
//! ```
//!
//! Inline markup nested inside a block element is never touched.

use std::sync::OnceLock;

use quire_markup::{Element, Node, tags};
use regex::Regex;

use crate::catalog::Catalog;
use crate::model::attr;

/// Element attribute that opts an element out of paragraphizing.
pub const NONPARSE_ATTR: &str = "data-quire-nonparse";

enum Piece<'s> {
    Placeholder(&'s str),
    Loose(Vec<&'s Node>),
}

pub struct Paragraphizer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Paragraphizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn run(&self, source: &str) -> String {
        let nodes = quire_markup::parse(source);
        let pieces = self.pieces(source, &nodes);
        let mut out = String::with_capacity(source.len() + 16);
        for piece in pieces {
            match piece {
                Piece::Placeholder(raw) => out.push_str(raw),
                Piece::Loose(run) => self.wrap_run(source, &run, &mut out),
            }
        }
        out
    }

    fn pieces<'s>(&self, source: &'s str, nodes: &'s [Node]) -> Vec<Piece<'s>> {
        let mut pieces: Vec<Piece<'s>> = Vec::new();
        for node in nodes {
            match node {
                Node::Comment(_) => pieces.push(Piece::Placeholder(node.span().slice(source))),
                Node::Text(_) => push_loose(&mut pieces, node),
                Node::Element(el) if self.unwraps(el) => {
                    for child in &el.children {
                        push_loose(&mut pieces, child);
                    }
                }
                Node::Element(el) if self.keeps(el) => {
                    pieces.push(Piece::Placeholder(node.span().slice(source)));
                }
                Node::Element(_) => push_loose(&mut pieces, node),
            }
        }
        pieces
    }

    /// Elements copied through untouched.
    fn keeps(&self, element: &Element) -> bool {
        let name = element.name.as_str();
        !tags::is_phrasing(name)
            || self.catalog.is_noneditable(element)
            || element.attrs.contains(attr::TYPE)
            || element.attrs.contains(NONPARSE_ATTR)
    }

    /// A bare `div` used as a paragraph container, with paragraph breaks
    /// inside it (pasted content often looks like this).
    fn unwraps(&self, element: &Element) -> bool {
        if self.catalog.config().markup.breakline
            || element.name != "div"
            || !element.attrs.is_empty()
        {
            return false;
        }
        let inline_only = element.children.iter().all(|child| match child {
            Node::Text(_) => true,
            Node::Comment(_) => false,
            Node::Element(el) => tags::is_phrasing(&el.name) && el.name != "img",
        });
        inline_only && has_double_break(element)
    }

    fn wrap_run(&self, source: &str, run: &[&Node], out: &mut String) {
        let markup = &self.catalog.config().markup;
        let mut segmenter = Segmenter::new(source, !markup.breakline);
        for node in run {
            segmenter.node(node);
        }
        for segment in segmenter.finish() {
            wrap(out, &markup.default_tag, &segment);
        }
    }
}

/// One piece of a paragraph being collected. Only `Text` is rewritten
/// (newlines become `<br>`); `Raw` is source markup copied as is.
enum Chunk<'s> {
    Text(String),
    Raw { markup: &'s str, content: bool },
    Close(String),
}

/// Cuts a loose run into paragraphs on blank lines and `<br>` runs,
/// closing inline elements at the cut and reopening them after it.
struct Segmenter<'s> {
    source: &'s str,
    split: bool,
    open: Vec<&'s Element>,
    current: Vec<Chunk<'s>>,
    segments: Vec<String>,
    /// Index of the last `<br>` in `current` with only whitespace after it.
    last_br: Option<usize>,
    in_br_run: bool,
}

impl<'s> Segmenter<'s> {
    fn new(source: &'s str, split: bool) -> Self {
        Self {
            source,
            split,
            open: Vec::new(),
            current: Vec::new(),
            segments: Vec::new(),
            last_br: None,
            in_br_run: false,
        }
    }

    fn node(&mut self, node: &'s Node) {
        match node {
            Node::Text(_) => self.text(node.span().slice(self.source)),
            Node::Comment(_) => self.current.push(Chunk::Raw {
                markup: node.span().slice(self.source),
                content: false,
            }),
            Node::Element(el) if el.name == "br" => self.line_break(node.span().slice(self.source)),
            Node::Element(el) if tags::is_void(&el.name) || tags::is_raw_text(&el.name) => {
                self.content();
                self.current.push(Chunk::Raw {
                    markup: node.span().slice(self.source),
                    content: true,
                });
            }
            Node::Element(el) => {
                self.current.push(Chunk::Raw {
                    markup: start_tag(self.source, el),
                    content: false,
                });
                self.open.push(el);
                for child in &el.children {
                    self.node(child);
                }
                self.open.pop();
                self.current.push(Chunk::Close(el.name.clone()));
            }
        }
    }

    fn text(&mut self, raw: &str) {
        let raw = normalize_newlines(raw);
        if !self.split {
            self.push_text(&raw);
            return;
        }
        for (i, part) in blank_lines().split(&raw).enumerate() {
            if i > 0 {
                self.paragraph_break();
            }
            self.push_text(part);
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !text.trim().is_empty() {
            self.content();
        }
        self.current.push(Chunk::Text(text.to_string()));
    }

    fn line_break(&mut self, raw: &'s str) {
        if self.split {
            if self.in_br_run {
                return;
            }
            if let Some(index) = self.last_br {
                self.current.truncate(index);
                self.paragraph_break();
                self.in_br_run = true;
                return;
            }
            self.last_br = Some(self.current.len());
        }
        self.current.push(Chunk::Raw {
            markup: raw,
            content: false,
        });
    }

    /// Something visible arrived; any `<br>` run is over.
    fn content(&mut self) {
        self.last_br = None;
        self.in_br_run = false;
    }

    fn paragraph_break(&mut self) {
        for el in self.open.iter().rev() {
            self.current.push(Chunk::Close(el.name.clone()));
        }
        self.flush();
        for el in &self.open {
            self.current.push(Chunk::Raw {
                markup: start_tag(self.source, el),
                content: false,
            });
        }
        self.last_br = None;
    }

    fn flush(&mut self) {
        let mut chunks = std::mem::take(&mut self.current);
        let has_content = chunks.iter().any(|chunk| match chunk {
            Chunk::Text(text) => !text.trim().is_empty(),
            Chunk::Raw { content, .. } => *content,
            Chunk::Close(_) => false,
        });
        if !has_content {
            return;
        }
        trim_edges(&mut chunks);
        let mut body = String::new();
        for chunk in &chunks {
            match chunk {
                Chunk::Text(text) => body.push_str(&text.replace('\n', "<br>")),
                Chunk::Raw { markup, .. } => body.push_str(markup),
                Chunk::Close(name) => {
                    body.push_str("</");
                    body.push_str(name);
                    body.push('>');
                }
            }
        }
        self.segments.push(body);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.segments
    }
}

/// Drop whitespace at the outer edges of a paragraph, up to the first
/// markup on either side.
fn trim_edges(chunks: &mut [Chunk<'_>]) {
    for chunk in chunks.iter_mut() {
        let Chunk::Text(text) = chunk else { break };
        *text = text.trim_start().to_string();
        if !text.is_empty() {
            break;
        }
    }
    for chunk in chunks.iter_mut().rev() {
        let Chunk::Text(text) = chunk else { break };
        *text = text.trim_end().to_string();
        if !text.is_empty() {
            break;
        }
    }
}

/// The element's start tag exactly as written.
fn start_tag<'s>(source: &'s str, element: &Element) -> &'s str {
    source
        .get(element.span.start..element.inner.start)
        .unwrap_or("")
}

fn push_loose<'s>(pieces: &mut Vec<Piece<'s>>, node: &'s Node) {
    match pieces.last_mut() {
        Some(Piece::Loose(run)) => run.push(node),
        _ => pieces.push(Piece::Loose(vec![node])),
    }
}

fn wrap(out: &mut String, tag: &str, body: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(body);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn has_double_break(element: &Element) -> bool {
    let mut previous_br = false;
    for child in &element.children {
        match child {
            Node::Element(el) if el.name == "br" => {
                if previous_br {
                    return true;
                }
                previous_br = true;
            }
            Node::Text(text) => {
                if blank_lines().is_match(&normalize_newlines(&text.value)) {
                    return true;
                }
                if !text.value.trim().is_empty() {
                    previous_br = false;
                }
            }
            _ => previous_br = false,
        }
    }
    false
}

fn blank_lines() -> &'static Regex {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();
    BLANK_LINES.get_or_init(|| Regex::new(r"\n[ \t]*\n\s*").expect("Invalid blank line regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_config::EditorConfig;
    use rstest::rstest;

    fn paragraphize(source: &str) -> String {
        Paragraphizer::new(&Catalog::default()).run(source)
    }

    fn paragraphize_breakline(source: &str) -> String {
        let mut config = EditorConfig::default();
        config.markup.breakline = true;
        Paragraphizer::new(&Catalog::standard(config)).run(source)
    }

    #[rstest]
    #[case("a\n\nb", "<p>a</p><p>b</p>")]
    #[case("a\r\n\r\nb", "<p>a</p><p>b</p>")]
    #[case("<ul><li>x</li></ul>", "<ul><li>x</li></ul>")]
    #[case("one\ntwo", "<p>one<br>two</p>")]
    #[case("a<br><br>b", "<p>a</p><p>b</p>")]
    #[case("a<BR/> <br>b", "<p>a</p><p>b</p>")]
    #[case("<div>Hello<br><br>World</div>", "<p>Hello</p><p>World</p>")]
    #[case("<div>Hello<br>World</div>", "<div>Hello<br>World</div>")]
    #[case("<div class=x>a<br><br>b</div>", "<div class=x>a<br><br>b</div>")]
    #[case("\n\n  \n", "")]
    #[case("<br><br>", "")]
    #[case(
        "lead <b>bold</b>\n\n<p>kept <i>as is</i></p>tail",
        "<p>lead <b>bold</b></p><p>kept <i>as is</i></p><p>tail</p>"
    )]
    fn paragraphizes(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(paragraphize(source), expected);
    }

    #[rstest]
    #[case::newline_in_start_tag("<a\nhref=\"x\">link</a> tail", "<p><a\nhref=\"x\">link</a> tail</p>")]
    #[case::blank_line_in_attribute(
        "<span title=\"a\n\nb\">x</span>",
        "<p><span title=\"a\n\nb\">x</span></p>"
    )]
    #[case::blank_line_in_bold("x <b>a\n\nb</b> y", "<p>x <b>a</b></p><p><b>b</b> y</p>")]
    #[case::break_run_in_italic("<i>a<br><br>b</i>", "<p><i>a</i></p><p><i>b</i></p>")]
    #[case::nested_inline("<b><i>a\n\nb</i></b>", "<p><b><i>a</i></b></p><p><b><i>b</i></b></p>")]
    #[case::trailing_blank_in_inline("<b>a\n\n</b>c", "<p><b>a</b></p><p><b></b>c</p>")]
    #[case::entities_stay_escaped("a &lt;b&gt;\n\nc", "<p>a &lt;b&gt;</p><p>c</p>")]
    fn inline_markup_is_split_only_in_text(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(paragraphize(source), expected);
    }

    #[rstest]
    #[case("<p>a\n\nb</p>")]
    #[case("<pre>x\n\n  y</pre>")]
    #[case("<script>if (a<b) {}\n\n</script>")]
    #[case("<span data-quire-nonparse>a\n\nb</span>")]
    #[case("<!-- note -->")]
    #[case("<iframe src=\"v\"></iframe>")]
    fn placeholders_restore_source_exactly(#[case] source: &str) {
        assert_eq!(paragraphize(source), source);
    }

    #[test]
    fn breakline_keeps_one_block() {
        assert_eq!(
            paragraphize_breakline("a\n\nb\nc"),
            "<p>a<br><br>b<br>c</p>"
        );
        assert_eq!(
            paragraphize_breakline("<div>Hello<br><br>World</div>"),
            "<div>Hello<br><br>World</div>"
        );
    }

    #[test]
    fn default_tag_follows_config() {
        let mut config = EditorConfig::default();
        config.markup.default_tag = "div".to_string();
        let out = Paragraphizer::new(&Catalog::standard(config)).run("a\n\nb");
        assert_eq!(out, "<div>a</div><div>b</div>");
    }
}
