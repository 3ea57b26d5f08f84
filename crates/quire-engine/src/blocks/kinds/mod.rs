mod container;
mod line;
mod list;
mod media;
mod table;
mod text;

pub use container::{COLUMN, LAYOUT, NONEDITABLE, QUOTE, WRAPPER};
pub use line::LINE;
pub use list::{DLIST, LIST, LIST_ITEM, TODO, TODO_ITEM};
pub use media::{EMBED, FIGCAPTION, IMAGE};
pub use table::{CELL, ROW, TABLE};
pub use text::{ADDRESS, HEADING, PARAGRAPH, PRE, TEXT};
