//! Element → block type resolution.
//!
//! Order of precedence:
//!
//! 1. inside inline content only inline-capable types resolve (`img`,
//!    non-editable spans); everything else stays plain markup
//! 2. an explicit `data-quire-type` hint
//! 3. the non-editable class or `contenteditable="false"`, and
//!    non-parseable tags
//! 4. the fixed tag table
//! 5. ordered predicate lists for `div` and `figure`; the first match wins
//! 6. phrasing tags are not blocks; any other tag is a [`BlockType::Wrapper`]

use quire_markup::{Element, Node, tags};

use super::{BlockType, Catalog, ParentKind};
use crate::model::attr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    pub parent: ParentKind,
    /// Resolving inside inline content.
    pub inline: bool,
}

impl ResolveContext {
    pub fn flow(parent: ParentKind) -> Self {
        Self {
            parent,
            inline: false,
        }
    }

    pub fn inline(parent: ParentKind) -> Self {
        Self {
            parent,
            inline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub block_type: BlockType,
    /// The block lives inside inline content.
    pub inline: bool,
    /// Other predicates that also matched, in priority order.
    pub ambiguous_with: Vec<BlockType>,
    /// A type hint that names no known type.
    pub unknown_hint: Option<String>,
}

impl Resolution {
    pub(crate) fn of(block_type: BlockType) -> Self {
        Self {
            block_type,
            inline: false,
            ambiguous_with: Vec::new(),
            unknown_hint: None,
        }
    }

    fn inline_of(block_type: BlockType) -> Self {
        Self {
            inline: true,
            ..Self::of(block_type)
        }
    }
}

type Predicate = fn(&Catalog, &Element, &ResolveContext) -> bool;

const DIV_RULES: &[(BlockType, Predicate)] = &[
    (BlockType::Layout, has_grid_class),
    (BlockType::Column, is_column),
    (BlockType::Image, wraps_single_image),
    (BlockType::Embed, holds_embed),
    (BlockType::Text, only_unclassified_text),
];

const FIGURE_RULES: &[(BlockType, Predicate)] = &[
    (BlockType::Image, holds_image),
    (BlockType::Embed, holds_embed),
];

impl Catalog {
    /// Resolve `element` to a block type, or `None` for plain inline markup.
    pub fn resolve(&self, element: &Element, ctx: ResolveContext) -> Option<Resolution> {
        let resolution = self.resolve_unchecked(element, ctx)?;
        if self.is_registered(resolution.block_type) {
            return Some(resolution);
        }
        // Custom catalogs may leave types out
        if !ctx.inline && self.is_registered(BlockType::Wrapper) {
            return Some(Resolution {
                block_type: BlockType::Wrapper,
                ..resolution
            });
        }
        None
    }

    fn resolve_unchecked(&self, element: &Element, ctx: ResolveContext) -> Option<Resolution> {
        let name = element.name.as_str();

        if ctx.inline {
            if name == "img" {
                return Some(Resolution::inline_of(BlockType::Image));
            }
            if self.is_noneditable(element) {
                return Some(Resolution::inline_of(BlockType::Noneditable));
            }
            return None;
        }

        if let Some(hint) = element.attr(attr::TYPE) {
            return Some(match BlockType::from_name(hint) {
                Some(block_type) => Resolution::of(block_type),
                None => {
                    log::warn!("unknown block type hint {hint:?} on <{name}>; using wrapper");
                    Resolution {
                        unknown_hint: Some(hint.to_string()),
                        ..Resolution::of(BlockType::Wrapper)
                    }
                }
            });
        }

        if self.is_noneditable(element) || self.is_nonparse(name) {
            return Some(Resolution::of(BlockType::Noneditable));
        }

        let block_type = match name {
            "p" => BlockType::Paragraph,
            "address" => BlockType::Address,
            "blockquote" => BlockType::Quote,
            "pre" => BlockType::Pre,
            "hr" => BlockType::Line,
            "ol" => BlockType::List,
            "ul" if self.is_todo(element) => BlockType::Todo,
            "ul" => BlockType::List,
            "li" if ctx.parent == ParentKind::Block(BlockType::Todo) => BlockType::TodoItem,
            "li" => BlockType::ListItem,
            "dl" => BlockType::Dlist,
            "table" => BlockType::Table,
            "tr" => BlockType::Row,
            "td" | "th" => BlockType::Cell,
            "img" => BlockType::Image,
            "figcaption" => BlockType::Figcaption,
            "figure" => return Some(self.first_match(FIGURE_RULES, element, &ctx)),
            "div" => return Some(self.first_match(DIV_RULES, element, &ctx)),
            _ if tags::is_heading(name) => BlockType::Heading,
            _ if tags::is_media(name) => BlockType::Embed,
            _ if tags::is_phrasing(name) => return None,
            _ => BlockType::Wrapper,
        };
        Some(Resolution::of(block_type))
    }

    /// Evaluate every predicate; the first match wins and the rest are
    /// reported as ambiguity.
    fn first_match(
        &self,
        rules: &[(BlockType, Predicate)],
        element: &Element,
        ctx: &ResolveContext,
    ) -> Resolution {
        let mut matches = rules
            .iter()
            .filter(|(_, predicate)| predicate(self, element, ctx))
            .map(|(block_type, _)| *block_type);
        let Some(first) = matches.next() else {
            return Resolution::of(BlockType::Wrapper);
        };
        let rest: Vec<BlockType> = matches.collect();
        if !rest.is_empty() {
            log::warn!(
                "<{}> is ambiguous: matches {first} and {rest:?}; using {first}",
                element.name
            );
        }
        Resolution {
            ambiguous_with: rest,
            ..Resolution::of(first)
        }
    }

    pub fn is_noneditable(&self, element: &Element) -> bool {
        element.has_class(&self.config().classes.noneditable)
            || element.attr("contenteditable") == Some("false")
    }

    pub fn is_nonparse(&self, name: &str) -> bool {
        self.config().markup.nonparse.iter().any(|tag| tag == name)
    }

    /// An unordered list whose first item starts with a checklist token.
    pub fn is_todo(&self, element: &Element) -> bool {
        element
            .child_elements()
            .find(|el| el.name == "li")
            .is_some_and(|first| self.leading_todo_token(&first.children).is_some())
    }

    /// Checked state of the checklist token that starts `children`, if
    /// any. Only a leading bare text node can carry the token.
    pub fn leading_todo_token(&self, children: &[Node]) -> Option<bool> {
        let Node::Text(text) = children.iter().find(|node| !node.is_blank_text())? else {
            return None;
        };
        let text = text.value.trim_start();
        let todo = &self.config().todo;
        if text.starts_with(todo.template_item_done.as_str()) {
            Some(true)
        } else if text.starts_with(todo.template_item.as_str()) {
            Some(false)
        } else {
            None
        }
    }
}

fn has_grid_class(catalog: &Catalog, element: &Element, _: &ResolveContext) -> bool {
    element.has_class(&catalog.config().classes.grid)
}

fn is_column(catalog: &Catalog, element: &Element, ctx: &ResolveContext) -> bool {
    ctx.parent == ParentKind::Block(BlockType::Layout)
        || element.has_class(&catalog.config().classes.column)
}

fn is_image(node: &Node) -> bool {
    match node {
        Node::Element(el) if el.name == "img" => true,
        Node::Element(el) if el.name == "a" => {
            let mut inner = el.significant_children();
            matches!((inner.next(), inner.next()), (Some(only), None) if is_image(only))
        }
        _ => false,
    }
}

/// Exactly one image (optionally linked) and nothing else.
fn wraps_single_image(_: &Catalog, element: &Element, _: &ResolveContext) -> bool {
    let mut children = element.significant_children();
    matches!((children.next(), children.next()), (Some(only), None) if is_image(only))
}

fn holds_image(_: &Catalog, element: &Element, _: &ResolveContext) -> bool {
    element.significant_children().any(is_image)
}

fn holds_embed(_: &Catalog, element: &Element, _: &ResolveContext) -> bool {
    element.attrs.contains(attr::EMBED_CONTENT)
        || element
            .child_elements()
            .any(|child| tags::is_media(&child.name))
}

fn is_plain_inline(node: &Node) -> bool {
    match node {
        Node::Text(_) | Node::Comment(_) => true,
        Node::Element(el) => {
            tags::is_phrasing(&el.name)
                && el.name != "img"
                && el.children.iter().all(is_plain_inline)
        }
    }
}

/// No class, some text, and nothing but inline markup.
fn only_unclassified_text(_: &Catalog, element: &Element, _: &ResolveContext) -> bool {
    !element.attrs.contains("class")
        && !element.text_content().trim().is_empty()
        && element.children.iter().all(is_plain_inline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn element(markup: &str) -> Element {
        quire_markup::parse(markup)
            .into_iter()
            .find_map(|node| match node {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .expect("markup has an element")
    }

    fn resolve_at(markup: &str, parent: ParentKind) -> Option<BlockType> {
        Catalog::default()
            .resolve(&element(markup), ResolveContext::flow(parent))
            .map(|r| r.block_type)
    }

    fn resolve(markup: &str) -> Option<BlockType> {
        resolve_at(markup, ParentKind::Root)
    }

    #[rstest]
    #[case("<p>x</p>", Some(BlockType::Paragraph))]
    #[case("<h3>x</h3>", Some(BlockType::Heading))]
    #[case("<blockquote>x</blockquote>", Some(BlockType::Quote))]
    #[case("<pre>x</pre>", Some(BlockType::Pre))]
    #[case("<hr>", Some(BlockType::Line))]
    #[case("<ol><li>x</li></ol>", Some(BlockType::List))]
    #[case("<ul><li>x</li></ul>", Some(BlockType::List))]
    #[case("<ul><li>[ ] x</li></ul>", Some(BlockType::Todo))]
    #[case("<ul>\n  <li>  [x] done</li></ul>", Some(BlockType::Todo))]
    #[case("<ul><li><b>[x]</b> done</li></ul>", Some(BlockType::List))]
    #[case("<table></table>", Some(BlockType::Table))]
    #[case("<figure><img src=a></figure>", Some(BlockType::Image))]
    #[case("<figure><iframe></iframe></figure>", Some(BlockType::Embed))]
    #[case("<iframe></iframe>", Some(BlockType::Embed))]
    #[case("<section><p>x</p></section>", Some(BlockType::Wrapper))]
    #[case("<custom-widget></custom-widget>", Some(BlockType::Wrapper))]
    #[case("<script>x</script>", Some(BlockType::Noneditable))]
    #[case("<p class=noneditable>x</p>", Some(BlockType::Noneditable))]
    #[case("<p contenteditable=false>x</p>", Some(BlockType::Noneditable))]
    #[case("<b>x</b>", None)]
    #[case("<span>x</span>", None)]
    fn tag_table(#[case] markup: &str, #[case] expected: Option<BlockType>) {
        assert_eq!(resolve(markup), expected);
    }

    #[rstest]
    #[case("<div class=grid><div>a</div></div>", BlockType::Layout)]
    #[case("<div class=column><p>a</p></div>", BlockType::Column)]
    #[case("<div><img src=a.png></div>", BlockType::Image)]
    #[case("<div> <a href=x><img src=a.png></a> </div>", BlockType::Image)]
    #[case("<div><iframe src=v></iframe></div>", BlockType::Embed)]
    #[case("<div>Hello <b>there</b></div>", BlockType::Text)]
    #[case("<div class=note>Hello</div>", BlockType::Wrapper)]
    #[case("<div><p>a</p></div>", BlockType::Wrapper)]
    #[case("<div></div>", BlockType::Wrapper)]
    fn div_predicates(#[case] markup: &str, #[case] expected: BlockType) {
        assert_eq!(resolve(markup), Some(expected));
    }

    #[test]
    fn column_by_context() {
        assert_eq!(
            resolve_at("<div><p>a</p></div>", ParentKind::Block(BlockType::Layout)),
            Some(BlockType::Column)
        );
    }

    #[test]
    fn list_item_by_context() {
        assert_eq!(
            resolve_at("<li>a</li>", ParentKind::Block(BlockType::Todo)),
            Some(BlockType::TodoItem)
        );
        assert_eq!(
            resolve_at("<li>a</li>", ParentKind::Block(BlockType::List)),
            Some(BlockType::ListItem)
        );
    }

    #[test]
    fn multiple_matches_are_flagged() {
        let resolution = Catalog::default()
            .resolve(
                &element("<div class=\"grid column\"><p>x</p></div>"),
                ResolveContext::flow(ParentKind::Root),
            )
            .unwrap();
        assert_eq!(resolution.block_type, BlockType::Layout);
        assert_eq!(resolution.ambiguous_with, vec![BlockType::Column]);
    }

    #[test]
    fn hint_wins_over_tag() {
        assert_eq!(
            resolve("<div data-quire-type=\"heading\">x</div>"),
            Some(BlockType::Heading)
        );
    }

    #[test]
    fn unknown_hint_falls_back_to_wrapper() {
        let resolution = Catalog::default()
            .resolve(
                &element("<div data-quire-type=\"gallery\">x</div>"),
                ResolveContext::flow(ParentKind::Root),
            )
            .unwrap();
        assert_eq!(resolution.block_type, BlockType::Wrapper);
        assert_eq!(resolution.unknown_hint.as_deref(), Some("gallery"));
    }

    #[test]
    fn inline_context_only_resolves_inline_types() {
        let catalog = Catalog::default();
        let ctx = ResolveContext::inline(ParentKind::Block(BlockType::Paragraph));
        let img = catalog.resolve(&element("<img src=a>"), ctx).unwrap();
        assert_eq!(img.block_type, BlockType::Image);
        assert!(img.inline);
        assert_eq!(catalog.resolve(&element("<p>x</p>"), ctx), None);
        let span = catalog
            .resolve(&element("<span class=noneditable>x</span>"), ctx)
            .unwrap();
        assert_eq!(span.block_type, BlockType::Noneditable);
    }

    #[test]
    fn unregistered_types_degrade_to_wrapper() {
        use crate::catalog::{CatalogBuilder, NestedSelector, TypeRules};
        let catalog = CatalogBuilder::new(Default::default())
            .register(
                BlockType::Wrapper,
                TypeRules::new(vec![ParentKind::Root], NestedSelector::Mixed),
            )
            .build();
        let resolution = catalog
            .resolve(&element("<p>x</p>"), ResolveContext::flow(ParentKind::Root))
            .unwrap();
        assert_eq!(resolution.block_type, BlockType::Wrapper);
    }
}
