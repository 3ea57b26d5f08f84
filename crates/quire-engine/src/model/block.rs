use quire_markup::{Attributes, Style};

use crate::catalog::BlockType;

/// Bookkeeping attribute names. All share [`attr::PREFIX`] and are stripped
/// from serialized output.
pub mod attr {
    pub const PREFIX: &str = "data-quire-";
    /// Explicit block type hint.
    pub const TYPE: &str = "data-quire-type";
    pub const FOCUS: &str = "data-quire-focus";
    pub const DRAG: &str = "data-quire-drag";
    /// Style moved off the element while it is selected or dragged.
    pub const STYLE_CACHE: &str = "data-quire-style-cache";
    /// URL-encoded embed markup.
    pub const EMBED_CONTENT: &str = "data-quire-embed-content";
    pub const MARKER: &str = "data-quire-marker";

    pub fn is_bookkeeping(name: &str) -> bool {
        name.starts_with(PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_type: BlockType,
    /// Native tag the block is emitted as.
    pub tag: String,
    /// Attributes other than `style`. May include bookkeeping entries.
    pub attrs: Attributes,
    pub style: Style,
    pub editable: bool,
    /// Lives inside another block's inline content.
    pub inline: bool,
    pub focusable: bool,
    /// Checklist item state.
    pub checked: Option<bool>,
}

impl Block {
    pub fn new(block_type: BlockType, tag: impl Into<String>) -> Self {
        Self {
            block_type,
            tag: tag.into(),
            attrs: Attributes::new(),
            style: Style::default(),
            editable: true,
            inline: false,
            focusable: true,
            checked: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Set an attribute; `style` is routed to the style map.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name == "style" {
            self.replace_style(Style::parse(value));
        } else {
            self.attrs.set(name, value);
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        if name == "style" {
            let previous = self.current_style();
            self.replace_style(Style::default());
            return (!previous.is_empty()).then(|| previous.to_string());
        }
        self.attrs.remove(name)
    }

    pub fn is_focused(&self) -> bool {
        self.attrs.contains(attr::FOCUS)
    }

    pub fn set_focused(&mut self, focused: bool) {
        if focused {
            self.attrs.set(attr::FOCUS, "true");
        } else {
            self.attrs.remove(attr::FOCUS);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.attrs.contains(attr::DRAG)
    }

    /// Dragging caches the inline style off so the drag preview is plain.
    pub fn set_dragging(&mut self, dragging: bool) {
        if dragging {
            self.attrs.set(attr::DRAG, "true");
            self.cache_style();
        } else {
            self.attrs.remove(attr::DRAG);
            self.restore_style();
        }
    }

    pub fn is_style_cached(&self) -> bool {
        self.attrs.contains(attr::STYLE_CACHE)
    }

    /// Move the style map into the cache attribute.
    pub fn cache_style(&mut self) {
        if self.is_style_cached() || self.style.is_empty() {
            return;
        }
        let cached = self.style.to_string();
        self.attrs.set(attr::STYLE_CACHE, cached);
        self.style.clear();
    }

    /// Move the cache attribute back into the style map.
    pub fn restore_style(&mut self) {
        if let Some(cached) = self.attrs.remove(attr::STYLE_CACHE) {
            self.style = Style::parse(&cached);
        }
    }

    /// The effective style, whether live or cached off.
    pub fn current_style(&self) -> Style {
        match self.attrs.get(attr::STYLE_CACHE) {
            Some(cached) => Style::parse(cached),
            None => self.style.clone(),
        }
    }

    /// Replace the effective style, keeping it cached if it was.
    pub fn replace_style(&mut self, style: Style) {
        if self.is_style_cached() {
            if style.is_empty() {
                self.attrs.remove(attr::STYLE_CACHE);
            } else {
                self.attrs.set(attr::STYLE_CACHE, style.to_string());
            }
        } else {
            self.style = style;
        }
    }

    pub fn set_style(&mut self, property: &str, value: Option<&str>) {
        let mut style = self.current_style();
        match value {
            Some(value) => style.set(property, value),
            None => {
                style.remove(property);
            }
        }
        self.replace_style(style);
    }

    /// Decoded embed markup.
    pub fn embed_content(&self) -> Option<String> {
        let encoded = self.attrs.get(attr::EMBED_CONTENT)?;
        Some(
            urlencoding::decode(encoded)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| encoded.to_string()),
        )
    }

    pub fn set_embed_content(&mut self, markup: &str) {
        self.attrs
            .set(attr::EMBED_CONTENT, urlencoding::encode(markup).into_owned());
    }

    /// Heading level from the tag (`h3` → 3).
    pub fn heading_level(&self) -> Option<u8> {
        quire_markup::tags::heading_level(&self.tag)
    }
}
