//! # Block Type Catalog
//!
//! The catalog answers two questions for the parser:
//!
//! 1. **What is this element?** [`Catalog::resolve`] maps a markup element
//!    (plus where it sits) to a [`BlockType`], or to nothing when the
//!    element is plain inline markup.
//! 2. **Where may it live?** Each registered type carries [`TypeRules`]:
//!    the parents it is legal under and how its own children are read.
//!
//! ## Nesting
//!
//! Legality is declared once, on the child: `ListItem` lists `List` as an
//! allowed parent, and nothing on `List` repeats that. A container's
//! [`NestedSelector`] only says how to read content:
//!
//! | selector   | content                                           | e.g.        |
//! |------------|---------------------------------------------------|-------------|
//! | `Empty`    | nothing                                           | line        |
//! | `Inline`   | editable inline markup, inline blocks resolved    | paragraph   |
//! | `Opaque`   | inline markup kept verbatim, nothing resolved     | pre         |
//! | `Children` | legal child blocks; loose content is wrapped      | list, table |
//! | `Mixed`    | inline markup interleaved with legal child blocks | list item   |
//!
//! ## Lifetime
//!
//! A catalog is built once per editor with [`CatalogBuilder`] and is
//! immutable afterwards. It also owns the editor configuration, since
//! resolution depends on configured class names and checklist templates.

mod resolve;
mod types;

pub use resolve::{ResolveContext, Resolution};
pub use types::BlockType;

use std::collections::BTreeMap;

use quire_config::EditorConfig;

use crate::model::Block;

/// Where a block sits: at the top of the document or inside another block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentKind {
    Root,
    Block(BlockType),
}

/// How a block's children are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedSelector {
    Empty,
    Inline,
    Opaque,
    Children {
        /// Type loose content is wrapped in.
        fallback: BlockType,
        /// Structural tags kept as plain elements whose content is read
        /// with the same rules (`tbody`).
        passthrough: &'static [&'static str],
        /// Tags kept verbatim with their inline content (`caption`).
        verbatim: &'static [&'static str],
    },
    Mixed,
}

impl NestedSelector {
    const fn children(fallback: BlockType) -> Self {
        NestedSelector::Children {
            fallback,
            passthrough: &[],
            verbatim: &[],
        }
    }

    /// Whether the block holds text the caret can enter.
    pub fn is_text_bearing(self) -> bool {
        matches!(
            self,
            NestedSelector::Inline | NestedSelector::Opaque | NestedSelector::Mixed
        )
    }
}

/// Registration record for one block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRules {
    pub allowed_parents: Vec<ParentKind>,
    pub nested: NestedSelector,
    pub editable: bool,
    pub focusable: bool,
}

impl TypeRules {
    pub fn new(allowed_parents: Vec<ParentKind>, nested: NestedSelector) -> Self {
        Self {
            allowed_parents,
            nested,
            editable: true,
            focusable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

pub struct CatalogBuilder {
    config: EditorConfig,
    rules: BTreeMap<BlockType, TypeRules>,
}

impl CatalogBuilder {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            rules: BTreeMap::new(),
        }
    }

    /// Register one type.
    ///
    /// # Panics
    ///
    /// Registering the same type twice is a programming error.
    pub fn register(mut self, block_type: BlockType, rules: TypeRules) -> Self {
        let previous = self.rules.insert(block_type, rules);
        assert!(previous.is_none(), "block type {block_type} registered twice");
        self
    }

    /// Register the full built-in type set.
    pub fn with_standard_types(self) -> Self {
        use BlockType as T;
        use ParentKind::{Block as In, Root};

        let flow = || vec![Root, In(T::Wrapper), In(T::Column)];
        let flow_and = |extra: &[ParentKind]| {
            let mut parents = flow();
            parents.extend_from_slice(extra);
            parents
        };
        let default_type = if self.config.markup.default_tag == "div" {
            T::Text
        } else {
            T::Paragraph
        };

        self.register(
            T::Paragraph,
            TypeRules::new(flow_and(&[In(T::Quote)]), NestedSelector::Inline),
        )
        .register(
            T::Heading,
            TypeRules::new(flow_and(&[In(T::Quote)]), NestedSelector::Inline),
        )
        .register(T::Text, TypeRules::new(flow(), NestedSelector::Inline))
        .register(T::Address, TypeRules::new(flow(), NestedSelector::Inline))
        .register(T::Quote, TypeRules::new(flow(), NestedSelector::Mixed))
        .register(T::Pre, TypeRules::new(flow(), NestedSelector::Opaque))
        .register(
            T::Line,
            TypeRules::new(flow(), NestedSelector::Empty).read_only(),
        )
        .register(
            T::List,
            TypeRules::new(
                flow_and(&[In(T::Quote), In(T::ListItem)]),
                NestedSelector::children(T::ListItem),
            ),
        )
        .register(
            T::ListItem,
            TypeRules::new(vec![In(T::List)], NestedSelector::Mixed),
        )
        .register(
            T::Todo,
            TypeRules::new(
                flow_and(&[In(T::Quote), In(T::ListItem)]),
                NestedSelector::children(T::TodoItem),
            ),
        )
        .register(
            T::TodoItem,
            TypeRules::new(vec![In(T::Todo)], NestedSelector::Inline),
        )
        .register(T::Dlist, TypeRules::new(flow(), NestedSelector::Opaque))
        .register(
            T::Table,
            TypeRules::new(
                flow(),
                NestedSelector::Children {
                    fallback: T::Row,
                    passthrough: &["thead", "tbody", "tfoot"],
                    verbatim: &["caption", "colgroup"],
                },
            ),
        )
        .register(
            T::Row,
            TypeRules::new(vec![In(T::Table)], NestedSelector::children(T::Cell)),
        )
        .register(T::Cell, TypeRules::new(vec![In(T::Row)], NestedSelector::Inline))
        .register(T::Image, TypeRules::new(flow(), NestedSelector::Mixed))
        .register(
            T::Figcaption,
            TypeRules::new(vec![In(T::Image), In(T::Embed)], NestedSelector::Inline),
        )
        .register(T::Embed, TypeRules::new(flow(), NestedSelector::Mixed))
        .register(
            T::Layout,
            TypeRules::new(
                vec![Root, In(T::Wrapper)],
                NestedSelector::children(T::Column),
            ),
        )
        .register(
            T::Column,
            TypeRules::new(vec![In(T::Layout)], NestedSelector::children(default_type)),
        )
        .register(T::Wrapper, TypeRules::new(flow(), NestedSelector::Mixed))
        .register(
            T::Noneditable,
            TypeRules::new(flow_and(&[In(T::Quote)]), NestedSelector::Opaque).read_only(),
        )
    }

    /// Freeze the catalog.
    ///
    /// # Panics
    ///
    /// A catalog without any registered type cannot resolve anything; this
    /// is the one fatal condition of the pipeline.
    pub fn build(self) -> Catalog {
        assert!(
            !self.rules.is_empty(),
            "catalog must register at least one block type"
        );
        Catalog {
            config: self.config,
            rules: self.rules,
        }
    }
}

/// Immutable, per-editor type registry.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: EditorConfig,
    rules: BTreeMap<BlockType, TypeRules>,
}

impl Catalog {
    /// The built-in catalog for `config`.
    pub fn standard(config: EditorConfig) -> Self {
        CatalogBuilder::new(config).with_standard_types().build()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn rules(&self, block_type: BlockType) -> Option<&TypeRules> {
        self.rules.get(&block_type)
    }

    pub fn is_registered(&self, block_type: BlockType) -> bool {
        self.rules.contains_key(&block_type)
    }

    pub fn types(&self) -> impl Iterator<Item = BlockType> + '_ {
        self.rules.keys().copied()
    }

    /// Whether `child` may appear directly under `parent`.
    pub fn allows(&self, parent: ParentKind, child: BlockType) -> bool {
        self.rules
            .get(&child)
            .is_some_and(|rules| rules.allowed_parents.contains(&parent))
    }

    /// Content rule for `block_type`; unregistered types are read opaquely.
    pub fn nested(&self, block_type: BlockType) -> NestedSelector {
        self.rules
            .get(&block_type)
            .map(|rules| rules.nested)
            .unwrap_or(NestedSelector::Opaque)
    }

    /// Type loose content is wrapped in directly under `parent`.
    pub fn fallback(&self, parent: ParentKind) -> Option<BlockType> {
        match parent {
            ParentKind::Root => Some(self.default_type()),
            ParentKind::Block(ty) => match self.nested(ty) {
                NestedSelector::Children { fallback, .. } => Some(fallback),
                _ => None,
            },
        }
    }

    /// Containers needed to legally place `child` under `parent`,
    /// outermost first. `None` when no chain exists.
    pub fn wrap_chain(&self, parent: ParentKind, child: BlockType) -> Option<Vec<BlockType>> {
        let mut chain = Vec::new();
        let mut current = child;
        while let Some(implied) = current.implied_parent() {
            chain.insert(0, implied);
            if self.allows(parent, implied) {
                return Some(chain);
            }
            current = implied;
        }
        None
    }

    /// The type loose top-level content becomes.
    pub fn default_type(&self) -> BlockType {
        if self.config.markup.default_tag == "div" {
            BlockType::Text
        } else {
            BlockType::Paragraph
        }
    }

    pub fn default_tag(&self) -> &str {
        &self.config.markup.default_tag
    }

    /// A fresh block carrying the registered flags for its type.
    pub fn new_block(&self, block_type: BlockType, tag: impl Into<String>) -> Block {
        let mut block = Block::new(block_type, tag);
        if let Some(rules) = self.rules(block_type) {
            block.editable = rules.editable;
            block.focusable = rules.focusable;
        }
        if block_type == BlockType::TodoItem {
            block.checked = Some(false);
        }
        block
    }

    /// A fresh block of the default type.
    pub fn new_default_block(&self) -> Block {
        self.new_block(self.default_type(), self.default_tag())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_catalog_registers_every_type() {
        let catalog = Catalog::default();
        assert_eq!(catalog.types().count(), BlockType::ALL.len());
    }

    #[test]
    #[should_panic(expected = "at least one block type")]
    fn empty_catalog_is_fatal() {
        CatalogBuilder::new(EditorConfig::default()).build();
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_is_fatal() {
        let rules = TypeRules::new(vec![ParentKind::Root], NestedSelector::Inline);
        CatalogBuilder::new(EditorConfig::default())
            .register(BlockType::Paragraph, rules.clone())
            .register(BlockType::Paragraph, rules);
    }

    #[test]
    fn legality_is_declared_on_the_child() {
        let catalog = Catalog::default();
        assert!(catalog.allows(ParentKind::Block(BlockType::List), BlockType::ListItem));
        assert!(!catalog.allows(ParentKind::Root, BlockType::ListItem));
        assert!(!catalog.allows(ParentKind::Block(BlockType::Todo), BlockType::ListItem));
        assert!(catalog.allows(ParentKind::Block(BlockType::ListItem), BlockType::List));
    }

    #[test]
    fn wrap_chains() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.wrap_chain(ParentKind::Root, BlockType::Cell),
            Some(vec![BlockType::Table, BlockType::Row])
        );
        assert_eq!(
            catalog.wrap_chain(ParentKind::Root, BlockType::ListItem),
            Some(vec![BlockType::List])
        );
        assert_eq!(catalog.wrap_chain(ParentKind::Root, BlockType::Figcaption), None);
    }

    #[test]
    fn default_type_follows_config() {
        let mut config = EditorConfig::default();
        config.markup.default_tag = "div".to_string();
        let catalog = Catalog::standard(config);
        assert_eq!(catalog.default_type(), BlockType::Text);
        assert_eq!(
            catalog.fallback(ParentKind::Block(BlockType::Column)),
            Some(BlockType::Text)
        );
    }

    #[test]
    fn read_only_types() {
        let catalog = Catalog::default();
        assert!(!catalog.new_block(BlockType::Line, "hr").editable);
        assert!(!catalog.new_block(BlockType::Noneditable, "div").editable);
        assert!(catalog.new_block(BlockType::Paragraph, "p").editable);
        assert_eq!(catalog.new_block(BlockType::TodoItem, "li").checked, Some(false));
    }
}
