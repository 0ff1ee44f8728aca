//! Token model consumed by the renderer.
//!
//! Tokens form a flat block sequence in document order. Block level
//! constructs appear as open/close pairs; inline content lives in the
//! `children` of an [`TokenKind::Inline`] container, itself a flat sequence
//! of open/close pairs and leaf tokens.

use std::fmt;

/// Table column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Closed vocabulary of token types.
///
/// `Unknown` carries the name of a construct the tokenizer produced but the
/// rule table does not know; the dispatcher passes its content through, or
/// fails in strict mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenKind {
    Inline,
    BlockquoteOpen,
    BlockquoteClose,
    Code,
    Fence,
    HeadingOpen,
    HeadingClose,
    Hr,
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    ParagraphOpen,
    ParagraphClose,
    LinkOpen,
    LinkClose,
    Image,
    TableOpen,
    TableClose,
    TheadOpen,
    TheadClose,
    TbodyOpen,
    TbodyClose,
    TrOpen,
    TrClose,
    ThOpen,
    ThClose,
    TdOpen,
    TdClose,
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    DelOpen,
    DelClose,
    InsOpen,
    InsClose,
    MarkOpen,
    MarkClose,
    Sub,
    Sup,
    Hardbreak,
    Softbreak,
    #[default]
    Text,
    HtmlBlock,
    HtmlTag,
    AbbrOpen,
    AbbrClose,
    FootnoteRef,
    FootnoteBlockOpen,
    FootnoteBlockClose,
    FootnoteOpen,
    FootnoteClose,
    FootnoteAnchor,
    DlOpen,
    DlClose,
    DtOpen,
    DtClose,
    DdOpen,
    DdClose,
    Unknown(String),
}

impl TokenKind {
    /// Returns the snake case vocabulary name, e.g. `bullet_list_open`.
    pub fn name(&self) -> &str {
        match self {
            TokenKind::Inline => "inline",
            TokenKind::BlockquoteOpen => "blockquote_open",
            TokenKind::BlockquoteClose => "blockquote_close",
            TokenKind::Code => "code",
            TokenKind::Fence => "fence",
            TokenKind::HeadingOpen => "heading_open",
            TokenKind::HeadingClose => "heading_close",
            TokenKind::Hr => "hr",
            TokenKind::BulletListOpen => "bullet_list_open",
            TokenKind::BulletListClose => "bullet_list_close",
            TokenKind::OrderedListOpen => "ordered_list_open",
            TokenKind::OrderedListClose => "ordered_list_close",
            TokenKind::ListItemOpen => "list_item_open",
            TokenKind::ListItemClose => "list_item_close",
            TokenKind::ParagraphOpen => "paragraph_open",
            TokenKind::ParagraphClose => "paragraph_close",
            TokenKind::LinkOpen => "link_open",
            TokenKind::LinkClose => "link_close",
            TokenKind::Image => "image",
            TokenKind::TableOpen => "table_open",
            TokenKind::TableClose => "table_close",
            TokenKind::TheadOpen => "thead_open",
            TokenKind::TheadClose => "thead_close",
            TokenKind::TbodyOpen => "tbody_open",
            TokenKind::TbodyClose => "tbody_close",
            TokenKind::TrOpen => "tr_open",
            TokenKind::TrClose => "tr_close",
            TokenKind::ThOpen => "th_open",
            TokenKind::ThClose => "th_close",
            TokenKind::TdOpen => "td_open",
            TokenKind::TdClose => "td_close",
            TokenKind::StrongOpen => "strong_open",
            TokenKind::StrongClose => "strong_close",
            TokenKind::EmOpen => "em_open",
            TokenKind::EmClose => "em_close",
            TokenKind::DelOpen => "del_open",
            TokenKind::DelClose => "del_close",
            TokenKind::InsOpen => "ins_open",
            TokenKind::InsClose => "ins_close",
            TokenKind::MarkOpen => "mark_open",
            TokenKind::MarkClose => "mark_close",
            TokenKind::Sub => "sub",
            TokenKind::Sup => "sup",
            TokenKind::Hardbreak => "hardbreak",
            TokenKind::Softbreak => "softbreak",
            TokenKind::Text => "text",
            TokenKind::HtmlBlock => "htmlblock",
            TokenKind::HtmlTag => "htmltag",
            TokenKind::AbbrOpen => "abbr_open",
            TokenKind::AbbrClose => "abbr_close",
            TokenKind::FootnoteRef => "footnote_ref",
            TokenKind::FootnoteBlockOpen => "footnote_block_open",
            TokenKind::FootnoteBlockClose => "footnote_block_close",
            TokenKind::FootnoteOpen => "footnote_open",
            TokenKind::FootnoteClose => "footnote_close",
            TokenKind::FootnoteAnchor => "footnote_anchor",
            TokenKind::DlOpen => "dl_open",
            TokenKind::DlClose => "dl_close",
            TokenKind::DtOpen => "dt_open",
            TokenKind::DtClose => "dt_close",
            TokenKind::DdOpen => "dd_open",
            TokenKind::DdClose => "dd_close",
            TokenKind::Unknown(name) => name,
        }
    }

    /// True for `paragraph_open` and `paragraph_close`.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, TokenKind::ParagraphOpen | TokenKind::ParagraphClose)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single node of the token stream.
///
/// Only the attributes relevant to a token's kind are populated; the rest
/// keep their defaults. Rendering reads tokens, with two documented
/// exceptions: list items rewrite continuation lines of their inline
/// children, and links/images fold trailing `{#id}` fragments out of the
/// following text token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
    pub children: Vec<Token>,
    /// Parser assigned nesting depth. Open/close pairs step it by one, so a
    /// list nesting step accounts for two levels.
    pub level: Option<usize>,
    pub href: String,
    pub src: String,
    pub title: String,
    pub alt: String,
    pub align: Option<Align>,
    /// Heading level, 1 through 6.
    pub h_level: u8,
    pub tight: bool,
    /// Set on `code` tokens that stand for an indented code block.
    pub block: bool,
    /// Fence info string.
    pub params: String,
    /// Footnote index, zero based.
    pub id: usize,
    /// Footnote back-reference index, zero based.
    pub sub_id: usize,
}

impl Token {
    /// Creates a token of `kind` with default attributes.
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Creates a `text` token.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Text).with_content(content)
    }

    /// Creates an `inline` container holding `children`.
    ///
    /// The container's content is the concatenated text of its children.
    pub fn inline(children: Vec<Token>) -> Self {
        let content = plain_text(&children);
        Self {
            kind: TokenKind::Inline,
            content,
            children,
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_tight(mut self, tight: bool) -> Self {
        self.tight = tight;
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = href.into();
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_align(mut self, align: Option<Align>) -> Self {
        self.align = align;
        self
    }

    pub fn with_h_level(mut self, h_level: u8) -> Self {
        self.h_level = h_level;
        self
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }
}

/// Concatenates the text carried by a token sequence.
pub(crate) fn plain_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Text | TokenKind::Code | TokenKind::Sub | TokenKind::Sup => {
                out.push_str(&token.content)
            }
            TokenKind::Image => out.push_str(&token.alt),
            TokenKind::Softbreak | TokenKind::Hardbreak => out.push(' '),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_vocabulary() {
        assert_eq!(TokenKind::BulletListOpen.name(), "bullet_list_open");
        assert_eq!(TokenKind::HtmlBlock.name(), "htmlblock");
        assert_eq!(TokenKind::Unknown("math".to_string()).name(), "math");
        assert_eq!(TokenKind::FootnoteAnchor.to_string(), "footnote_anchor");
    }

    #[test]
    fn test_inline_content_is_plain_text() {
        // Arrange
        let children = vec![
            Token::text("a "),
            Token::new(TokenKind::StrongOpen),
            Token::text("b"),
            Token::new(TokenKind::StrongClose),
            Token::new(TokenKind::Softbreak),
            Token::new(TokenKind::Code).with_content("c"),
        ];

        // Act
        let inline = Token::inline(children);

        // Assert
        assert_eq!(inline.kind, TokenKind::Inline);
        assert_eq!(inline.content, "a b c");
        assert_eq!(inline.children.len(), 6);
    }

    #[test]
    fn test_is_paragraph() {
        assert!(TokenKind::ParagraphOpen.is_paragraph());
        assert!(TokenKind::ParagraphClose.is_paragraph());
        assert!(!TokenKind::HeadingOpen.is_paragraph());
    }
}
