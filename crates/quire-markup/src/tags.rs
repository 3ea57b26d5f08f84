//! Tag classification tables.
//!
//! Names are expected in lowercase; the parser lowercases every tag name it
//! reads.

/// Elements that never have children or an end tag.
pub const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
pub const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title", "xmp"];

/// Elements that open a new block when they appear in flow content.
pub const BLOCK_LEVEL: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Phrasing (inline) elements.
pub const PHRASING: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "big", "br", "cite", "code", "data", "del", "dfn", "em", "font",
    "i", "img", "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span",
    "strike", "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

/// Embedded media elements.
pub const MEDIA: &[&str] = &["iframe", "video", "audio", "object", "embed"];

pub fn is_void(name: &str) -> bool {
    VOID.contains(&name)
}

pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT.contains(&name)
}

pub fn is_block_level(name: &str) -> bool {
    BLOCK_LEVEL.contains(&name)
}

pub fn is_phrasing(name: &str) -> bool {
    PHRASING.contains(&name)
}

pub fn is_media(name: &str) -> bool {
    MEDIA.contains(&name)
}

pub fn is_heading(name: &str) -> bool {
    heading_level(name).is_some()
}

/// `h1`..`h6` → 1..6
pub fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', digit @ b'1'..=b'6'] => Some(digit - b'0'),
        _ => None,
    }
}

/// Whether an open `p` is implicitly closed when `name` starts.
pub fn closes_paragraph(name: &str) -> bool {
    is_block_level(name)
        && !matches!(
            name,
            "li" | "dd" | "dt" | "td" | "th" | "tr" | "tbody" | "thead" | "tfoot"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("h1", Some(1))]
    #[case("h6", Some(6))]
    #[case("h7", None)]
    #[case("hr", None)]
    #[case("h", None)]
    fn heading_levels(#[case] name: &str, #[case] expected: Option<u8>) {
        assert_eq!(heading_level(name), expected);
    }

    #[test]
    fn classification_is_disjoint_where_it_matters() {
        for name in VOID {
            assert!(!is_raw_text(name), "{name} cannot be both void and raw text");
        }
        assert!(closes_paragraph("ul"));
        assert!(closes_paragraph("p"));
        assert!(!closes_paragraph("li"));
        assert!(!closes_paragraph("span"));
    }
}
