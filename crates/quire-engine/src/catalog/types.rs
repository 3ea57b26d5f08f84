use serde::{Deserialize, Serialize};

/// The closed set of block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Paragraph,
    Heading,
    /// Unclassified text container (`div` holding only inline content).
    Text,
    Address,
    Quote,
    Pre,
    /// Horizontal rule.
    Line,
    List,
    ListItem,
    /// Checklist (`ul` whose items start with a template token).
    Todo,
    TodoItem,
    Dlist,
    Table,
    Row,
    Cell,
    Image,
    Figcaption,
    Embed,
    Layout,
    Column,
    /// Generic container; the fallback for anything unresolved.
    Wrapper,
    Noneditable,
}

impl BlockType {
    pub const ALL: [BlockType; 22] = [
        BlockType::Paragraph,
        BlockType::Heading,
        BlockType::Text,
        BlockType::Address,
        BlockType::Quote,
        BlockType::Pre,
        BlockType::Line,
        BlockType::List,
        BlockType::ListItem,
        BlockType::Todo,
        BlockType::TodoItem,
        BlockType::Dlist,
        BlockType::Table,
        BlockType::Row,
        BlockType::Cell,
        BlockType::Image,
        BlockType::Figcaption,
        BlockType::Embed,
        BlockType::Layout,
        BlockType::Column,
        BlockType::Wrapper,
        BlockType::Noneditable,
    ];

    /// Name used in type hints and JSON.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::Text => "text",
            BlockType::Address => "address",
            BlockType::Quote => "quote",
            BlockType::Pre => "pre",
            BlockType::Line => "line",
            BlockType::List => "list",
            BlockType::ListItem => "listitem",
            BlockType::Todo => "todo",
            BlockType::TodoItem => "todoitem",
            BlockType::Dlist => "dlist",
            BlockType::Table => "table",
            BlockType::Row => "row",
            BlockType::Cell => "cell",
            BlockType::Image => "image",
            BlockType::Figcaption => "figcaption",
            BlockType::Embed => "embed",
            BlockType::Layout => "layout",
            BlockType::Column => "column",
            BlockType::Wrapper => "wrapper",
            BlockType::Noneditable => "noneditable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Tag used when a block of this type is created without source markup.
    pub fn default_tag(self) -> &'static str {
        match self {
            BlockType::Paragraph => "p",
            BlockType::Heading => "h2",
            BlockType::Text
            | BlockType::Layout
            | BlockType::Column
            | BlockType::Wrapper
            | BlockType::Noneditable => "div",
            BlockType::Address => "address",
            BlockType::Quote => "blockquote",
            BlockType::Pre => "pre",
            BlockType::Line => "hr",
            BlockType::List | BlockType::Todo => "ul",
            BlockType::ListItem | BlockType::TodoItem => "li",
            BlockType::Dlist => "dl",
            BlockType::Table => "table",
            BlockType::Row => "tr",
            BlockType::Cell => "td",
            BlockType::Image | BlockType::Embed => "figure",
            BlockType::Figcaption => "figcaption",
        }
    }

    /// The container a stray block of this type is wrapped in.
    ///
    /// `td` outside a table gets a row, the row gets a table, and so on.
    pub fn implied_parent(self) -> Option<BlockType> {
        match self {
            BlockType::ListItem => Some(BlockType::List),
            BlockType::TodoItem => Some(BlockType::Todo),
            BlockType::Row => Some(BlockType::Table),
            BlockType::Cell => Some(BlockType::Row),
            BlockType::Column => Some(BlockType::Layout),
            _ => None,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::List | BlockType::Todo)
    }

    pub fn is_list_item(self) -> bool {
        matches!(self, BlockType::ListItem | BlockType::TodoItem)
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
