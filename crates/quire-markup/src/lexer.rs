//! # Lexer - Tokenizing Markup Source
//!
//! The first stage of building a tree: the source text is broken into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lossless Tokens
//!
//! Every byte of the input appears in exactly one token. Nothing is skipped,
//! which lets the parser recover the exact source slice behind any element
//! (the paragraphizer relies on this to restore placeholders verbatim):
//!
//! ```
//! use quire_markup::lexer::lex;
//!
//! let input = "<p class=\"a\">Hi &amp; bye</p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Context-Free Tokens
//!
//! Tokens are kept minimal. The lexer does not know whether `=` belongs to
//! an attribute or to running text, or whether `"` opens an attribute value.
//! The parser decides that from context: outside a tag every token is text.
//!
//! Tag openers are the exception. `<name` and `</name` are lexed as single
//! tokens because a `<` immediately followed by a letter is the only thing
//! that starts a tag; a lone `<` is always text.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!--`
    #[token("<!--")]
    CommentOpen,

    /// `-->`
    #[token("-->")]
    CommentClose,

    /// `<!DOCTYPE ...>` and other declarations
    #[regex(r"<![A-Za-z][^>]*>")]
    Declaration,

    /// `</name`
    #[regex(r"</[A-Za-z][A-Za-z0-9:_.\-]*")]
    EndTagOpen,

    /// `<name`
    #[regex(r"<[A-Za-z][A-Za-z0-9:_.\-]*")]
    StartTagOpen,

    /// `/>`
    #[token("/>")]
    SelfClose,

    /// `>`
    #[token(">")]
    Gt,

    /// A `<` that does not start a tag
    #[token("<")]
    Lt,

    #[token("=")]
    Eq,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    #[token("/")]
    Slash,

    #[token("-")]
    Dash,

    /// Whitespace including line breaks
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    /// Plain text - anything not matched by other rules
    #[regex(r#"[^<>="'/\s\-]+"#)]
    Text,
}

impl TokenKind {
    /// Whether the token terminates an attribute name.
    pub fn ends_attribute_name(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Eq | TokenKind::Gt | TokenKind::SelfClose
        )
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character in the source.
    pub offset: usize,
}

impl Token<'_> {
    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = match result {
            Ok(kind) => kind,
            // Logos error means unrecognized character - treat as text
            Err(()) => TokenKind::Text,
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            offset: span.start,
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_start_tag_with_attribute() {
        assert_eq!(
            kinds("<p class=\"x\">"),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Whitespace,
                TokenKind::Text,
                TokenKind::Eq,
                TokenKind::DoubleQuote,
                TokenKind::Text,
                TokenKind::DoubleQuote,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn lex_end_tag() {
        assert_eq!(kinds("</li>"), vec![TokenKind::EndTagOpen, TokenKind::Gt]);
    }

    #[test]
    fn lex_comment_and_declaration() {
        assert_eq!(
            kinds("<!DOCTYPE html><!-- a -->"),
            vec![
                TokenKind::Declaration,
                TokenKind::CommentOpen,
                TokenKind::Whitespace,
                TokenKind::Text,
                TokenKind::Whitespace,
                TokenKind::CommentClose,
            ]
        );
    }

    #[test]
    fn lone_angle_bracket_is_not_a_tag() {
        assert_eq!(
            kinds("1 < 2"),
            vec![
                TokenKind::Text,
                TokenKind::Whitespace,
                TokenKind::Lt,
                TokenKind::Whitespace,
                TokenKind::Text,
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("plain text")]
    #[case("<p>Hello<br><br>World</p>")]
    #[case("<img src='a.png' />")]
    #[case("a -- b --> c <!-- d")]
    #[case("<ul>\r\n<li>[ ] todo</li>\r\n</ul>")]
    #[case("naïve café ☕")]
    fn lex_is_lossless(#[case] input: &str) {
        let tokens = lex(input);
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(reconstructed, input);
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].end(), pair[1].offset);
        }
    }
}
