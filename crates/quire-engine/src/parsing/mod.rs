//! # Parser
//!
//! Raw input → [`Document`]. Three modes:
//!
//! - [`ParseMode::Markup`]: paragraphize, then read the markup tree with
//!   the [`TreeBuilder`]
//! - [`ParseMode::Json`]: each JSON block is turned into the hinted markup
//!   element it stands for and read by the same builder, so JSON content
//!   obeys the same nesting rules
//! - [`ParseMode::Line`]: an inline fragment for insertion into an existing
//!   block; block elements are unwrapped, inline block types still resolve
//!
//! Parsing never fails. Every local repair is logged and returned as a
//! [`Diagnostic`] next to the document.

pub mod builder;
pub mod paragraphize;

use quire_markup::{Node as MarkupNode, tags};

use crate::blocks::element_from_json;
use crate::catalog::{Catalog, ParentKind};
use crate::error::Diagnostic;
use crate::json::JsonDocument;
use crate::model::{BlockTree, Document, DocumentMeta, NodeKind};

pub use builder::TreeBuilder;
pub use paragraphize::Paragraphizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Markup,
    Json,
    Line,
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Parser<'a> {
    catalog: &'a Catalog,
}

impl<'a> Parser<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn parse(&self, input: &str, mode: ParseMode) -> Parsed {
        match mode {
            ParseMode::Markup => self.parse_markup(input),
            ParseMode::Json => self.parse_json(input),
            ParseMode::Line => self.parse_line(input),
        }
    }

    pub fn parse_markup(&self, input: &str) -> Parsed {
        let source = if self.catalog.config().markup.paragraphize {
            Paragraphizer::new(self.catalog).run(input)
        } else {
            input.to_string()
        };
        let nodes = quire_markup::parse(&source);
        self.build_document(&nodes, self.config_meta())
    }

    /// Malformed JSON is a [`Diagnostic::MalformedInput`] and an empty
    /// document.
    pub fn parse_json(&self, input: &str) -> Parsed {
        match serde_json::from_str::<JsonDocument>(input) {
            Ok(json) => self.parse_json_document(&json),
            Err(err) => {
                let mut parsed = self.build_document(&[], self.config_meta());
                parsed
                    .diagnostics
                    .insert(0, Diagnostic::malformed(format!("invalid JSON: {err}")));
                parsed
            }
        }
    }

    pub fn parse_json_document(&self, json: &JsonDocument) -> Parsed {
        let nodes: Vec<MarkupNode> = json
            .blocks
            .iter()
            .map(|block| element_from_json(block, self.catalog))
            .collect();
        let defaults = self.config_meta();
        let meta = json.meta();
        let meta = DocumentMeta {
            lang: meta.lang.or(defaults.lang),
            dir: meta.dir.or(defaults.dir),
            classname: meta.classname.or(defaults.classname),
        };
        self.build_document(&nodes, meta)
    }

    /// The root of the returned document holds inline nodes, not blocks.
    pub fn parse_line(&self, input: &str) -> Parsed {
        let nodes = unwrap_blocks(quire_markup::parse(input));
        let mut tree = BlockTree::new();
        let mut diagnostics = Vec::new();
        let root = tree.root();
        let scope = ParentKind::Block(self.catalog.default_type());
        TreeBuilder::new(self.catalog, &mut tree, &mut diagnostics)
            .build_inline(root, scope, &nodes, true);
        tree.normalize(root);
        Parsed {
            document: Document::new(tree, self.config_meta()),
            diagnostics,
        }
    }

    fn build_document(&self, nodes: &[MarkupNode], meta: DocumentMeta) -> Parsed {
        let mut tree = BlockTree::new();
        let mut diagnostics = Vec::new();
        let root = tree.root();
        TreeBuilder::new(self.catalog, &mut tree, &mut diagnostics)
            .build_flow(root, ParentKind::Root, nodes);

        if tree.blocks().next().is_none() {
            tree.clear();
            tree.append(root, NodeKind::Block(self.catalog.new_default_block()));
            log::debug!("empty document; inserted a default block");
            diagnostics.push(Diagnostic::EmptyDocument);
        }
        log::debug!(
            "parsed {} nodes, {} diagnostics",
            tree.len() - 1,
            diagnostics.len()
        );
        Parsed {
            document: Document::new(tree, meta),
            diagnostics,
        }
    }

    fn config_meta(&self) -> DocumentMeta {
        DocumentMeta::from(&self.catalog.config().document)
    }
}

/// Replace block-level elements by their children, recursively.
fn unwrap_blocks(nodes: Vec<MarkupNode>) -> Vec<MarkupNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            MarkupNode::Element(el) if tags::is_block_level(&el.name) => {
                out.extend(unwrap_blocks(el.children));
            }
            MarkupNode::Element(mut el) => {
                el.children = unwrap_blocks(std::mem::take(&mut el.children));
                out.push(MarkupNode::Element(el));
            }
            MarkupNode::Comment(_) => {}
            text => out.push(text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BlockType;
    use crate::unparse::{UnparseOptions, unparse};
    use pretty_assertions::assert_eq;

    fn types(tree: &BlockTree) -> Vec<BlockType> {
        tree.descendants(tree.root())
            .into_iter()
            .filter_map(|id| tree.block(id).map(|b| b.block_type))
            .collect()
    }

    #[test]
    fn empty_input_yields_one_default_block() {
        let catalog = Catalog::default();
        let parsed = Parser::new(&catalog).parse("", ParseMode::Markup);
        assert_eq!(types(&parsed.document.tree), vec![BlockType::Paragraph]);
        assert_eq!(parsed.diagnostics, vec![Diagnostic::EmptyDocument]);
    }

    #[test]
    fn invalid_json_is_recovered() {
        let catalog = Catalog::default();
        let parsed = Parser::new(&catalog).parse("{\"blocks\": [", ParseMode::Json);
        assert_eq!(types(&parsed.document.tree), vec![BlockType::Paragraph]);
        assert!(matches!(
            parsed.diagnostics.first(),
            Some(Diagnostic::MalformedInput { .. })
        ));
    }

    #[test]
    fn json_meta_falls_back_to_config() {
        let mut config = quire_config::EditorConfig::default();
        config.document.dir = Some("rtl".into());
        let catalog = Catalog::standard(config);
        let parsed = Parser::new(&catalog).parse(
            r#"{"blocks": [{"type": "paragraph", "content": "x"}], "lang": "de"}"#,
            ParseMode::Json,
        );
        assert_eq!(parsed.document.meta.lang.as_deref(), Some("de"));
        assert_eq!(parsed.document.meta.dir.as_deref(), Some("rtl"));
    }

    #[test]
    fn line_mode_unwraps_blocks_and_keeps_inline_images() {
        let catalog = Catalog::default();
        let parsed = Parser::new(&catalog).parse(
            "<p>one <b>two</b></p><div>three<img src=\"a.png\"></div>",
            ParseMode::Line,
        );
        let tree = &parsed.document.tree;
        assert_eq!(types(tree), vec![BlockType::Image]);
        assert_eq!(
            unparse(&catalog, tree, UnparseOptions::storage()),
            "one <b>two</b>three<img src=\"a.png\">"
        );
    }

    #[test]
    fn markup_without_paragraphizing_still_wraps_loose_text() {
        let mut config = quire_config::EditorConfig::default();
        config.markup.paragraphize = false;
        let catalog = Catalog::standard(config);
        let parsed = Parser::new(&catalog).parse("a\n\nb", ParseMode::Markup);
        assert_eq!(
            unparse(&catalog, &parsed.document.tree, UnparseOptions::storage()),
            "<p>a\n\nb</p>"
        );
    }
}
