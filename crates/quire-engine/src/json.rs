//! Structured JSON document shape.
//!
//! ```json
//! {
//!   "blocks": [
//!     { "type": "heading", "level": 2, "content": "Title" },
//!     { "type": "todo", "children": [
//!         { "type": "todoitem", "content": "Buy milk", "checked": false }
//!     ] }
//!   ],
//!   "lang": "en"
//! }
//! ```
//!
//! Type-specific fields live in [`JsonBlock::fields`]; see the block
//! kinds for what each type reads and writes.

use quire_markup::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{DocumentMeta, attr};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    #[serde(default)]
    pub blocks: Vec<JsonBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classname: Option<String>,
}

impl JsonDocument {
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            lang: self.lang.clone(),
            dir: self.dir.clone(),
            classname: self.classname.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonBlock>,
}

impl JsonBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            fields: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<JsonBlock>) -> Self {
        self.children = children;
        self
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// String field, with numbers accepted (`"width": 300`).
    pub fn string(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.fields.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The optional `attrs` object. Bookkeeping names are ignored.
    pub fn attrs(&self) -> Attributes {
        let Some(Value::Object(map)) = self.fields.get("attrs") else {
            return Attributes::new();
        };
        map.iter()
            .filter(|(name, _)| !attr::is_bookkeeping(name))
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name.clone(), value))
            })
            .collect()
    }

    /// Store `attrs` unless empty.
    pub fn set_attrs<'a>(&mut self, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let map: Map<String, Value> = attrs
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        if !map.is_empty() {
            self.fields.insert("attrs".to_string(), Value::Object(map));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fields_flatten_next_to_type() {
        let block = JsonBlock::new("heading").with("level", 2).with("content", "Hi");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "heading", "level": 2, "content": "Hi"}));
    }

    #[test]
    fn children_are_optional() {
        let doc: JsonDocument = serde_json::from_value(json!({
            "blocks": [{"type": "todo", "children": [{"type": "todoitem", "checked": true}]},
                       {"type": "line"}],
            "lang": "en"
        }))
        .unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc.blocks[0].children[0].bool("checked"));
        assert!(doc.blocks[1].children.is_empty());
        assert_eq!(doc.meta().lang.as_deref(), Some("en"));
    }

    #[test]
    fn attrs_skip_bookkeeping_and_non_scalars() {
        let block: JsonBlock = serde_json::from_value(json!({
            "type": "paragraph",
            "attrs": {"class": "lead", "data-quire-focus": "true", "width": 3, "x": [1]}
        }))
        .unwrap();
        let attrs = block.attrs();
        assert_eq!(attrs.get("class"), Some("lead"));
        assert_eq!(attrs.get("width"), Some("3"));
        assert!(!attrs.contains("data-quire-focus"));
        assert!(!attrs.contains("x"));
    }
}
