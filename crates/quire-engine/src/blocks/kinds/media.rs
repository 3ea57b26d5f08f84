use quire_markup::{Attributes, Element, Node as MarkupNode, Style, tags};

use crate::blocks::{BlockBehavior, EnterAction, content_json, content_nodes, hinted};
use crate::catalog::{BlockType, Catalog, ParentKind, Resolution};
use crate::json::JsonBlock;
use crate::model::{Block, NodeId, attr};
use crate::parsing::builder::TreeBuilder;
use crate::unparse::Unparser;
use crate::unparse::json::{JsonWriter, plain_attrs};

const IMAGE_FIELDS: [&str; 4] = ["src", "alt", "width", "height"];

/// An image, bare (`<img>`) or inside a `figure`/`div` together with an
/// optional link and caption.
pub struct ImageBlock;

pub static IMAGE: ImageBlock = ImageBlock;

impl BlockBehavior for ImageBlock {
    /// The `img` and its link stay raw markup; only the caption is a block.
    fn build(&self, builder: &mut TreeBuilder<'_>, id: NodeId, element: &Element) {
        let scope = ParentKind::Block(BlockType::Image);
        for child in &element.children {
            match child {
                MarkupNode::Element(el) if el.name == "figcaption" => {
                    builder.build_block(id, el, Resolution::of(BlockType::Figcaption));
                }
                MarkupNode::Comment(_) => {}
                _ if child.is_blank_text() => {}
                _ => builder.build_inline(id, scope, std::slice::from_ref(child), false),
            }
        }
    }

    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        let tree = writer.tree();
        let mut json = JsonBlock::new(BlockType::Image.name());

        let descendants = tree.descendants(id);
        let img = descendants
            .iter()
            .filter_map(|&node| tree.element(node))
            .find(|el| el.name == "img");
        let link = descendants
            .iter()
            .filter_map(|&node| tree.element(node))
            .find(|el| el.name == "a");
        let image_attrs = if block.tag == "img" {
            Some(&block.attrs)
        } else {
            img.map(|el| &el.attrs)
        };

        if let Some(attrs) = image_attrs {
            for field in IMAGE_FIELDS {
                if let Some(value) = attrs.get(field) {
                    json = json.with(field, value);
                }
            }
        }
        if let Some(link) = link {
            for (field, name) in [("url", "href"), ("target", "target")] {
                if let Some(value) = link.attrs.get(name) {
                    json = json.with(field, value);
                }
            }
        }
        if let Some(caption) = tree.child_blocks(id).find(|&child| {
            tree.block(child)
                .is_some_and(|b| b.block_type == BlockType::Figcaption)
        }) {
            json = json.with("caption", writer.content(caption));
        }

        let own_attrs = plain_attrs(block);
        json.set_attrs(
            own_attrs
                .iter()
                .filter(|(name, _)| block.tag != "img" || !IMAGE_FIELDS.contains(&name.as_str()))
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        json
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        let mut img = Element::new("img");
        for field in IMAGE_FIELDS {
            if let Some(value) = json.string(field) {
                img.attrs.set(field, value);
            }
        }
        let media: MarkupNode = match json.string("url") {
            Some(url) => {
                let mut link = Element::new("a").with_attr("href", url);
                if let Some(target) = json.string("target") {
                    link.attrs.set("target", target);
                }
                link.with_children(vec![img.into()]).into()
            }
            None => img.into(),
        };
        let mut children = vec![media];
        if let Some(caption) = json.str("caption") {
            children.push(
                Element::new("figcaption")
                    .with_children(quire_markup::parse(caption))
                    .into(),
            );
        }
        hinted(json, BlockType::Image, "figure").with_children(children)
    }

    fn enter(&self) -> EnterAction {
        EnterAction::InsertAfter
    }
}

/// Embedded media (`iframe`, `video`, ...). The media markup is stored
/// URL-encoded in an attribute, so the live tree holds at most a caption.
pub struct EmbedBlock;

pub static EMBED: EmbedBlock = EmbedBlock;

impl BlockBehavior for EmbedBlock {
    fn build(&self, builder: &mut TreeBuilder<'_>, id: NodeId, element: &Element) {
        if tags::is_media(&element.name) {
            // Bare media element: it becomes the content of a new figure
            let markup = quire_markup::to_markup(std::slice::from_ref(&MarkupNode::Element(
                element.clone(),
            )));
            if let Some(block) = builder.tree().block_mut(id) {
                block.tag = "figure".to_string();
                block.attrs = Attributes::new();
                block.style = Style::default();
                block.set_embed_content(&markup);
            }
            return;
        }

        let has_content = builder
            .tree()
            .block(id)
            .is_some_and(|block| block.attrs.contains(attr::EMBED_CONTENT));
        if !has_content {
            let media: Vec<MarkupNode> = element
                .children
                .iter()
                .filter(|child| !child.is_element("figcaption") && !child.is_blank_text())
                .cloned()
                .collect();
            let markup = quire_markup::to_markup(&media);
            if let Some(block) = builder.tree().block_mut(id) {
                block.set_embed_content(&markup);
            }
        }

        for caption in element.child_elements().filter(|el| el.name == "figcaption") {
            builder.build_block(id, caption, Resolution::of(BlockType::Figcaption));
        }
    }

    fn unparse(&self, unparser: &mut Unparser<'_>, id: NodeId, block: &Block) {
        unparser.write_open(block);
        if let Some(content) = block.embed_content() {
            unparser.write_raw(&content);
        }
        unparser.write_children(id);
        unparser.write_close(block);
    }

    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        let mut json = JsonBlock::new(BlockType::Embed.name())
            .with("content", block.embed_content().unwrap_or_default());
        if let Some(caption) = writer.tree().child_blocks(id).next() {
            json = json.with("caption", writer.content(caption));
        }
        json
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        let mut figure = hinted(json, BlockType::Embed, "figure");
        figure.attrs.set(
            attr::EMBED_CONTENT,
            urlencoding::encode(json.str("content").unwrap_or_default()).into_owned(),
        );
        if let Some(caption) = json.str("caption") {
            figure.children.push(
                Element::new("figcaption")
                    .with_children(quire_markup::parse(caption))
                    .into(),
            );
        }
        figure
    }

    fn enter(&self) -> EnterAction {
        EnterAction::InsertAfter
    }
}

pub struct FigcaptionBlock;

pub static FIGCAPTION: FigcaptionBlock = FigcaptionBlock;

impl BlockBehavior for FigcaptionBlock {
    fn to_json(&self, writer: &JsonWriter<'_>, id: NodeId, block: &Block) -> JsonBlock {
        content_json(writer, id, block)
    }

    fn from_json(&self, json: &JsonBlock, _: &Catalog) -> Element {
        hinted(json, BlockType::Figcaption, "figcaption").with_children(content_nodes(json))
    }

    fn enter(&self) -> EnterAction {
        EnterAction::InsertAfter
    }
}
