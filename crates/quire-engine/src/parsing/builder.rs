//! Markup tree → block tree.
//!
//! [`TreeBuilder`] walks `quire_markup` nodes depth-first, asks the
//! [`Catalog`] what each element is, and writes blocks, inline elements and
//! text into a [`BlockTree`]. Per-type work (checklist tokens, embed
//! content) is delegated to the type's [`BlockBehavior`].
//!
//! [`BlockBehavior`]: crate::blocks::BlockBehavior

use quire_markup::{Element, Node as MarkupNode, Style};

use crate::blocks::behavior;
use crate::catalog::{BlockType, Catalog, NestedSelector, ParentKind, ResolveContext, Resolution};
use crate::error::Diagnostic;
use crate::model::{BlockTree, InlineElement, MarkerKind, NodeId, NodeKind, attr};

pub struct TreeBuilder<'a> {
    catalog: &'a Catalog,
    tree: &'a mut BlockTree,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        catalog: &'a Catalog,
        tree: &'a mut BlockTree,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            catalog,
            tree,
            diagnostics,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn tree(&mut self) -> &mut BlockTree {
        self.tree
    }

    /// Build block-level content under `parent`.
    ///
    /// `scope` is the logical parent used for legality checks; it differs
    /// from the arena parent under passthrough elements such as `tbody`.
    pub fn build_flow(&mut self, parent: NodeId, scope: ParentKind, nodes: &[MarkupNode]) {
        let passthrough_rules = match scope {
            ParentKind::Block(ty) => match self.catalog.nested(ty) {
                NestedSelector::Children {
                    passthrough,
                    verbatim,
                    ..
                } => (passthrough, verbatim),
                _ => (&[][..], &[][..]),
            },
            ParentKind::Root => (&[][..], &[][..]),
        };
        let (passthrough, verbatim) = passthrough_rules;

        let mut loose: Vec<&MarkupNode> = Vec::new();
        for node in nodes {
            let element = match node {
                MarkupNode::Comment(_) => continue,
                MarkupNode::Text(_) => {
                    loose.push(node);
                    continue;
                }
                MarkupNode::Element(el) => el,
            };
            if is_marker(element) {
                loose.push(node);
                continue;
            }
            if passthrough.contains(&element.name.as_str()) {
                self.flush_loose(parent, scope, &mut loose);
                let id = self.append_element(parent, element);
                self.build_flow(id, scope, &element.children);
                continue;
            }
            if verbatim.contains(&element.name.as_str()) {
                self.flush_loose(parent, scope, &mut loose);
                let id = self.append_element(parent, element);
                self.build_inline(id, scope, &element.children, false);
                continue;
            }
            match self.catalog.resolve(element, ResolveContext::flow(scope)) {
                Some(resolution) => {
                    self.flush_loose(parent, scope, &mut loose);
                    self.place_block(parent, scope, element, resolution);
                }
                None => loose.push(node),
            }
        }
        self.flush_loose(parent, scope, &mut loose);
    }

    /// Place a resolved block, repairing illegal nesting.
    fn place_block(
        &mut self,
        parent: NodeId,
        scope: ParentKind,
        element: &Element,
        resolution: Resolution,
    ) {
        let block_type = resolution.block_type;
        if self.catalog.allows(scope, block_type) {
            self.build_block(parent, element, resolution);
            return;
        }

        if let Some(chain) = self.catalog.wrap_chain(scope, block_type) {
            self.diagnostics.push(Diagnostic::malformed(format!(
                "<{}> outside its container; wrapped in {chain:?}",
                element.name
            )));
            let mut container = parent;
            let mut container_scope = scope;
            for wrapper in chain {
                container = self.reuse_or_create(container, wrapper);
                container_scope = ParentKind::Block(wrapper);
            }
            let resolution = self
                .catalog
                .resolve(element, ResolveContext::flow(container_scope))
                .unwrap_or(resolution);
            self.build_block(container, element, resolution);
            return;
        }

        if block_type != BlockType::Wrapper && self.catalog.allows(scope, BlockType::Wrapper) {
            self.diagnostics.push(Diagnostic::malformed(format!(
                "{block_type} is not allowed in {scope:?}; kept as wrapper"
            )));
            let resolution = Resolution {
                block_type: BlockType::Wrapper,
                ..resolution
            };
            self.build_block(parent, element, resolution);
            return;
        }

        // Nothing fits: read its content as loose content
        self.diagnostics.push(Diagnostic::malformed(format!(
            "<{}> cannot be placed in {scope:?}; content unwrapped",
            element.name
        )));
        let mut loose: Vec<&MarkupNode> = element.children.iter().collect();
        self.flush_loose(parent, scope, &mut loose);
    }

    /// The last child of `parent` if it is a `block_type` block, else a new one.
    fn reuse_or_create(&mut self, parent: NodeId, block_type: BlockType) -> NodeId {
        if let Some(&last) = self.tree.children(parent).last()
            && self
                .tree
                .block(last)
                .is_some_and(|block| block.block_type == block_type)
        {
            return last;
        }
        let block = self.catalog.new_block(block_type, block_type.default_tag());
        self.tree.append(parent, NodeKind::Block(block))
    }

    /// Wrap pending loose nodes in the scope's fallback type.
    fn flush_loose(&mut self, parent: NodeId, scope: ParentKind, loose: &mut Vec<&MarkupNode>) {
        if loose.is_empty() {
            return;
        }
        let nodes: Vec<MarkupNode> = loose.drain(..).cloned().collect();
        if nodes.iter().all(MarkupNode::is_blank_text) {
            return;
        }
        let Some(fallback) = self.catalog.fallback(scope) else {
            // Inline content where only blocks belong: keep it as text
            self.build_inline(parent, scope, &nodes, true);
            return;
        };
        let block = self.catalog.new_block(fallback, self.fallback_tag(fallback));
        let id = self.tree.append(parent, NodeKind::Block(block));
        self.build_content(id, fallback, &trim_blank_edges(&nodes));
    }

    fn fallback_tag(&self, block_type: BlockType) -> String {
        if block_type == self.catalog.default_type() {
            self.catalog.default_tag().to_string()
        } else {
            block_type.default_tag().to_string()
        }
    }

    /// Create a block from `element` under `parent` and build its content.
    pub fn build_block(&mut self, parent: NodeId, element: &Element, resolution: Resolution) -> NodeId {
        if let Some(name) = &resolution.unknown_hint {
            self.diagnostics.push(Diagnostic::UnknownBlockType { name: name.clone() });
        }
        if !resolution.ambiguous_with.is_empty() {
            self.diagnostics.push(Diagnostic::AmbiguousType {
                tag: element.name.clone(),
                chosen: resolution.block_type,
                others: resolution.ambiguous_with.clone(),
            });
        }

        let block_type = resolution.block_type;
        let mut block = self.catalog.new_block(block_type, element.name.clone());
        block.inline = resolution.inline;
        block.attrs = element.attrs.clone();
        block.attrs.remove(attr::TYPE);
        block.attrs.remove(attr::MARKER);
        if let Some(style) = block.attrs.remove("style") {
            block.style = Style::parse(&style);
        }
        let id = self.tree.append(parent, NodeKind::Block(block));
        behavior(block_type).build(self, id, element);
        id
    }

    /// Read `nodes` as the content of block `id` according to its type.
    pub fn build_content(&mut self, id: NodeId, block_type: BlockType, nodes: &[MarkupNode]) {
        let scope = ParentKind::Block(block_type);
        match self.catalog.nested(block_type) {
            NestedSelector::Empty => {}
            NestedSelector::Inline => self.build_inline(id, scope, nodes, true),
            NestedSelector::Opaque => self.build_inline(id, scope, nodes, false),
            NestedSelector::Children { .. } => self.build_flow(id, scope, nodes),
            NestedSelector::Mixed => self.build_mixed(id, scope, nodes),
        }
    }

    /// Inline content interleaved with legal child blocks.
    pub fn build_mixed(&mut self, parent: NodeId, scope: ParentKind, nodes: &[MarkupNode]) {
        enum Slot<'n> {
            Block(&'n Element, Resolution),
            Inline(&'n MarkupNode),
            Blank(&'n MarkupNode),
        }

        let slots: Vec<Slot> = nodes
            .iter()
            .filter(|node| !matches!(node, MarkupNode::Comment(_)))
            .map(|node| match node {
                MarkupNode::Element(el) if !is_marker(el) => {
                    match self.catalog.resolve(el, ResolveContext::flow(scope)) {
                        Some(res) if self.catalog.allows(scope, res.block_type) => {
                            Slot::Block(el, res)
                        }
                        _ => Slot::Inline(node),
                    }
                }
                _ if node.is_blank_text() => Slot::Blank(node),
                _ => Slot::Inline(node),
            })
            .collect();

        let is_inline = |slot: Option<&Slot>| matches!(slot, Some(Slot::Inline(_)));
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                Slot::Block(el, res) => {
                    self.build_block(parent, el, res.clone());
                }
                Slot::Inline(node) => self.build_inline_node(parent, scope, node, true),
                // Whitespace between inline runs is content; next to blocks it is layout
                Slot::Blank(node) => {
                    let before = index.checked_sub(1).and_then(|i| slots.get(i));
                    if is_inline(before) && is_inline(slots.get(index + 1)) {
                        self.build_inline_node(parent, scope, node, true);
                    }
                }
            }
        }
    }

    /// Inline content. With `resolve`, inline block types (images,
    /// non-editable spans) become blocks.
    pub fn build_inline(
        &mut self,
        parent: NodeId,
        scope: ParentKind,
        nodes: &[MarkupNode],
        resolve: bool,
    ) {
        for node in nodes {
            self.build_inline_node(parent, scope, node, resolve);
        }
    }

    fn build_inline_node(
        &mut self,
        parent: NodeId,
        scope: ParentKind,
        node: &MarkupNode,
        resolve: bool,
    ) {
        match node {
            MarkupNode::Comment(_) => {}
            MarkupNode::Text(text) => {
                self.tree.append(parent, NodeKind::Text(text.value.clone()));
            }
            MarkupNode::Element(el) => {
                if let Some(kind) = marker_kind(el) {
                    self.tree.append(parent, NodeKind::Marker(kind));
                    return;
                }
                if resolve
                    && let Some(resolution) =
                        self.catalog.resolve(el, ResolveContext::inline(scope))
                {
                    self.build_block(parent, el, resolution);
                    return;
                }
                let id = self.append_element(parent, el);
                self.build_inline(id, scope, &el.children, resolve);
            }
        }
    }

    fn append_element(&mut self, parent: NodeId, element: &Element) -> NodeId {
        let mut inline = InlineElement::new(element.name.clone());
        inline.attrs = element.attrs.clone();
        self.tree.append(parent, NodeKind::Element(inline))
    }
}

fn marker_kind(element: &Element) -> Option<MarkerKind> {
    if element.name != "span" {
        return None;
    }
    element.attr(attr::MARKER).and_then(MarkerKind::parse)
}

fn is_marker(element: &Element) -> bool {
    marker_kind(element).is_some()
}

/// Drop whitespace-only text at both ends.
fn trim_blank_edges(nodes: &[MarkupNode]) -> Vec<MarkupNode> {
    let start = nodes
        .iter()
        .position(|n| !n.is_blank_text())
        .unwrap_or(nodes.len());
    let end = nodes
        .iter()
        .rposition(|n| !n.is_blank_text())
        .map(|i| i + 1)
        .unwrap_or(start);
    nodes[start..end.max(start)].to_vec()
}
