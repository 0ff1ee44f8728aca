//! Tokenizer seam.
//!
//! The renderer consumes a flat token stream. [`ComrakTokenizer`] produces
//! one from comrak's AST with GitHub Flavored Markdown extensions (tables,
//! strikethrough, footnotes, description lists, superscript).

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use crate::error::Result;
use crate::token::{Align, Token, TokenKind};

/// Turns markdown source into a token stream.
pub trait Tokenize {
    /// Tokenizes `source`.
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot be tokenized
    fn tokenize(&self, source: &str) -> Result<Vec<Token>>;
}

/// Tokenizer backed by comrak.
pub struct ComrakTokenizer {
    options: Options<'static>,
}

impl ComrakTokenizer {
    /// Creates tokenizer with the extensions the rule table understands.
    ///
    /// Autolinks and task lists stay off so bare URLs and `[ ]` markers
    /// survive as text.
    pub fn new() -> Self {
        let mut options = Options::default();

        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.footnotes = true;
        options.extension.description_lists = true;
        options.extension.superscript = true;

        Self { options }
    }

    /// Returns comrak options, shared with the HTML output path.
    pub fn options(&self) -> &Options<'static> {
        &self.options
    }
}

impl Default for ComrakTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenize for ComrakTokenizer {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        let arena = Arena::new();
        let root = parse_document(&arena, source, &self.options);

        let mut flattener = Flattener::default();
        flattener.block(root, false);
        flattener.footnotes();

        Ok(flattener.tokens)
    }
}

/// Flattens comrak's tree into open/close pairs, assigning parser levels.
#[derive(Default)]
struct Flattener<'a> {
    tokens: Vec<Token>,
    depth: usize,
    footnotes: Vec<&'a AstNode<'a>>,
}

impl<'a> Flattener<'a> {
    fn open(&mut self, mut token: Token) {
        token.level = Some(self.depth);
        self.depth += 1;
        self.tokens.push(token);
    }

    fn close(&mut self, mut token: Token) {
        self.depth = self.depth.saturating_sub(1);
        token.level = Some(self.depth);
        self.tokens.push(token);
    }

    fn leaf(&mut self, mut token: Token) {
        token.level = Some(self.depth);
        self.tokens.push(token);
    }

    fn blocks(&mut self, node: &'a AstNode<'a>, tight: bool) {
        for child in node.children() {
            self.block(child, tight);
        }
    }

    /// Emits tokens for one block node. `tight` marks paragraphs that sit
    /// directly in a tight list item.
    fn block(&mut self, node: &'a AstNode<'a>, tight: bool) {
        let data = node.data.borrow();

        match &data.value {
            NodeValue::Document => self.blocks(node, false),
            NodeValue::Paragraph => {
                self.open(Token::new(TokenKind::ParagraphOpen).with_tight(tight));
                self.inline(node);
                self.close(Token::new(TokenKind::ParagraphClose).with_tight(tight));
            }
            NodeValue::Heading(heading) => {
                self.open(Token::new(TokenKind::HeadingOpen).with_h_level(heading.level));
                self.inline(node);
                self.close(Token::new(TokenKind::HeadingClose).with_h_level(heading.level));
            }
            NodeValue::BlockQuote => {
                self.open(Token::new(TokenKind::BlockquoteOpen));
                self.blocks(node, false);
                self.close(Token::new(TokenKind::BlockquoteClose));
            }
            NodeValue::List(list) => {
                let (open, close) = match list.list_type {
                    ListType::Bullet => (TokenKind::BulletListOpen, TokenKind::BulletListClose),
                    ListType::Ordered => (TokenKind::OrderedListOpen, TokenKind::OrderedListClose),
                };
                self.open(Token::new(open));
                self.blocks(node, list.tight);
                self.close(Token::new(close));
            }
            NodeValue::Item(_) => {
                self.open(Token::new(TokenKind::ListItemOpen));
                self.blocks(node, tight);
                self.close(Token::new(TokenKind::ListItemClose));
            }
            NodeValue::CodeBlock(code) if code.fenced => {
                self.leaf(
                    Token::new(TokenKind::Fence)
                        .with_params(code.info.clone())
                        .with_content(code.literal.clone()),
                );
            }
            NodeValue::CodeBlock(code) => {
                let mut token = Token::new(TokenKind::Code).with_content(code.literal.clone());
                token.block = true;
                self.leaf(token);
            }
            NodeValue::HtmlBlock(html) => {
                self.leaf(Token::new(TokenKind::HtmlBlock).with_content(html.literal.clone()));
            }
            NodeValue::ThematicBreak => self.leaf(Token::new(TokenKind::Hr)),
            NodeValue::Table(table) => self.table(node, &table.alignments),
            NodeValue::FootnoteDefinition(_) => self.footnotes.push(node),
            NodeValue::DescriptionList => {
                self.open(Token::new(TokenKind::DlOpen));
                self.blocks(node, true);
                self.close(Token::new(TokenKind::DlClose));
            }
            NodeValue::DescriptionItem(_) => self.blocks(node, true),
            NodeValue::DescriptionTerm => {
                self.open(Token::new(TokenKind::DtOpen));
                self.blocks(node, true);
                self.close(Token::new(TokenKind::DtClose));
            }
            NodeValue::DescriptionDetails => {
                self.open(Token::new(TokenKind::DdOpen));
                self.blocks(node, true);
                self.close(Token::new(TokenKind::DdClose));
            }
            other => {
                let name = variant_name(other);
                self.leaf(Token::new(TokenKind::Unknown(name)).with_content(node_text(node)));
            }
        }
    }

    fn table(&mut self, node: &'a AstNode<'a>, alignments: &[TableAlignment]) {
        self.open(Token::new(TokenKind::TableOpen));
        let mut in_body = false;

        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            if header {
                self.open(Token::new(TokenKind::TheadOpen));
            } else if !in_body {
                self.open(Token::new(TokenKind::TbodyOpen));
                in_body = true;
            }

            self.open(Token::new(TokenKind::TrOpen));
            for (column, cell) in row.children().enumerate() {
                let align = alignments.get(column).copied().and_then(align_of);
                let (open, close) = if header {
                    (TokenKind::ThOpen, TokenKind::ThClose)
                } else {
                    (TokenKind::TdOpen, TokenKind::TdClose)
                };
                self.open(Token::new(open).with_align(align));
                self.inline(cell);
                self.close(Token::new(close));
            }
            self.close(Token::new(TokenKind::TrClose));

            if header {
                self.close(Token::new(TokenKind::TheadClose));
            }
        }

        if in_body {
            self.close(Token::new(TokenKind::TbodyClose));
        }
        self.close(Token::new(TokenKind::TableClose));
    }

    /// Emits the `inline` container for a node's inline children.
    fn inline(&mut self, node: &'a AstNode<'a>) {
        let mut children = Vec::new();
        for child in node.children() {
            inline_node(child, &mut children);
        }
        self.leaf(Token::inline(children));
    }

    /// Emits the footnote block collected while walking the document.
    ///
    /// Definitions arrive in reference order, so the position of a
    /// definition is its footnote id.
    fn footnotes(&mut self) {
        let definitions = std::mem::take(&mut self.footnotes);
        if definitions.is_empty() {
            return;
        }

        self.open(Token::new(TokenKind::FootnoteBlockOpen));
        for (id, definition) in definitions.into_iter().enumerate() {
            let mut open = Token::new(TokenKind::FootnoteOpen);
            open.id = id;
            self.open(open);

            let start = self.tokens.len();
            self.blocks(definition, true);

            let mut anchor = Token::new(TokenKind::FootnoteAnchor);
            anchor.id = id;
            match self.tokens[start..]
                .iter_mut()
                .rev()
                .find(|t| t.kind == TokenKind::Inline)
            {
                Some(inline) => inline.children.push(anchor),
                None => self.leaf(anchor),
            }

            let mut close = Token::new(TokenKind::FootnoteClose);
            close.id = id;
            self.close(close);
        }
        self.close(Token::new(TokenKind::FootnoteBlockClose));
    }
}

fn inline_node<'a>(node: &'a AstNode<'a>, out: &mut Vec<Token>) {
    let data = node.data.borrow();

    match &data.value {
        NodeValue::Text(text) => push_text(out, text),
        NodeValue::SoftBreak => out.push(Token::new(TokenKind::Softbreak)),
        NodeValue::LineBreak => out.push(Token::new(TokenKind::Hardbreak)),
        NodeValue::Code(code) => {
            out.push(Token::new(TokenKind::Code).with_content(code.literal.clone()));
        }
        NodeValue::HtmlInline(html) => {
            out.push(Token::new(TokenKind::HtmlTag).with_content(html.clone()));
        }
        NodeValue::Emph => wrap(node, out, TokenKind::EmOpen, TokenKind::EmClose),
        NodeValue::Strong => wrap(node, out, TokenKind::StrongOpen, TokenKind::StrongClose),
        NodeValue::Strikethrough => wrap(node, out, TokenKind::DelOpen, TokenKind::DelClose),
        NodeValue::Underline => wrap(node, out, TokenKind::InsOpen, TokenKind::InsClose),
        NodeValue::Superscript => {
            out.push(Token::new(TokenKind::Sup).with_content(node_text(node)));
        }
        NodeValue::Subscript => {
            out.push(Token::new(TokenKind::Sub).with_content(node_text(node)));
        }
        NodeValue::Link(link) => {
            out.push(
                Token::new(TokenKind::LinkOpen)
                    .with_href(link.url.clone())
                    .with_title(link.title.clone()),
            );
            for child in node.children() {
                inline_node(child, out);
            }
            out.push(Token::new(TokenKind::LinkClose));
        }
        NodeValue::Image(link) => {
            out.push(
                Token::new(TokenKind::Image)
                    .with_src(link.url.clone())
                    .with_title(link.title.clone())
                    .with_alt(node_text(node)),
            );
        }
        NodeValue::FootnoteReference(reference) => {
            let mut token = Token::new(TokenKind::FootnoteRef);
            token.id = (reference.ix as usize).saturating_sub(1);
            token.sub_id = (reference.ref_num as usize).saturating_sub(1);
            out.push(token);
        }
        other => {
            let name = variant_name(other);
            out.push(Token::new(TokenKind::Unknown(name)).with_content(node_text(node)));
        }
    }
}

fn wrap<'a>(node: &'a AstNode<'a>, out: &mut Vec<Token>, open: TokenKind, close: TokenKind) {
    out.push(Token::new(open));
    for child in node.children() {
        inline_node(child, out);
    }
    out.push(Token::new(close));
}

/// Appends text, merging with a directly preceding text token.
fn push_text(out: &mut Vec<Token>, text: &str) {
    if let Some(last) = out.last_mut() {
        if last.kind == TokenKind::Text {
            last.content.push_str(text);
            return;
        }
    }
    out.push(Token::text(text));
}

/// Collects the literal text below a node.
fn node_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::HtmlInline(html) => out.push_str(html),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            NodeValue::CodeBlock(code) => out.push_str(&code.literal),
            NodeValue::HtmlBlock(html) => out.push_str(&html.literal),
            NodeValue::FrontMatter(text) => out.push_str(text),
            NodeValue::Math(math) => out.push_str(&math.literal),
            _ => {}
        }
    }
    out
}

fn align_of(alignment: TableAlignment) -> Option<Align> {
    match alignment {
        TableAlignment::Left => Some(Align::Left),
        TableAlignment::Center => Some(Align::Center),
        TableAlignment::Right => Some(Align::Right),
        TableAlignment::None => None,
    }
}

/// Snake case name of a node variant, e.g. `MultilineBlockQuote` to
/// `multiline_block_quote`.
fn variant_name(value: &NodeValue) -> String {
    let debug = format!("{:?}", value);
    let head: String = debug
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();

    let mut name = String::with_capacity(head.len() + 4);
    for (i, c) in head.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    fn tokenize(source: &str) -> Vec<Token> {
        ComrakTokenizer::new()
            .tokenize(source)
            .expect("Should tokenize")
    }

    #[test]
    fn test_heading_and_paragraph() {
        // Arrange & Act
        let tokens = tokenize("# foo\nbar");

        // Assert
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::HeadingOpen,
                TokenKind::Inline,
                TokenKind::HeadingClose,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
            ]
        );
        assert_eq!(tokens[0].h_level, 1);
        assert_eq!(tokens[1].content, "foo");
        assert!(!tokens[3].tight, "Top level paragraphs are not tight");
    }

    #[test]
    fn test_list_levels_pair_two_deep() {
        // Arrange & Act
        let tokens = tokenize("- a\n  - b");

        // Assert
        let items: Vec<Option<usize>> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ListItemOpen)
            .map(|t| t.level)
            .collect();
        assert_eq!(items, vec![Some(1), Some(3)]);

        let paragraphs_tight = tokens
            .iter()
            .filter(|t| t.kind.is_paragraph())
            .all(|t| t.tight);
        assert!(paragraphs_tight, "Paragraphs in tight lists should be tight");
    }

    #[test]
    fn test_inline_children() {
        // Arrange & Act
        let tokens = tokenize("foo\n**bar** [x](y \"t\") ![a](b.png)");

        // Assert
        let inline = &tokens[1];
        assert_eq!(
            kinds(&inline.children),
            vec![
                TokenKind::Text,
                TokenKind::Softbreak,
                TokenKind::StrongOpen,
                TokenKind::Text,
                TokenKind::StrongClose,
                TokenKind::Text,
                TokenKind::LinkOpen,
                TokenKind::Text,
                TokenKind::LinkClose,
                TokenKind::Text,
                TokenKind::Image,
            ]
        );
        assert_eq!(inline.children[6].href, "y");
        assert_eq!(inline.children[6].title, "t");
        assert_eq!(inline.children[10].src, "b.png");
        assert_eq!(inline.children[10].alt, "a");
    }

    #[test]
    fn test_table_tokens() {
        // Arrange & Act
        let tokens = tokenize("| a | b |\n|:-:|--:|\n| 1 | 2 |");

        // Assert
        assert_eq!(tokens[0].kind, TokenKind::TableOpen);
        assert_eq!(tokens[1].kind, TokenKind::TheadOpen);
        let aligns: Vec<Option<Align>> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ThOpen)
            .map(|t| t.align)
            .collect();
        assert_eq!(aligns, vec![Some(Align::Center), Some(Align::Right)]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::TbodyOpen));
        assert_eq!(
            tokens.last().map(|t| t.kind.clone()),
            Some(TokenKind::TableClose)
        );
    }

    #[test]
    fn test_fence_and_indented_code() {
        // Arrange & Act
        let tokens = tokenize("```js\nvar x;\n```\n\n    indented\n");

        // Assert
        assert_eq!(tokens[0].kind, TokenKind::Fence);
        assert_eq!(tokens[0].params, "js");
        assert_eq!(tokens[0].content, "var x;\n");
        assert_eq!(tokens[1].kind, TokenKind::Code);
        assert!(tokens[1].block);
        assert_eq!(tokens[1].content, "indented\n");
    }

    #[test]
    fn test_footnotes_move_to_block() {
        // Arrange & Act
        let tokens = tokenize("a[^1]\n\n[^1]: note");

        // Assert
        assert!(
            tokens[1]
                .children
                .iter()
                .any(|t| t.kind == TokenKind::FootnoteRef && t.id == 0)
        );
        assert!(tokens.iter().any(|t| t.kind == TokenKind::FootnoteBlockOpen));
        let anchored = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Inline)
            .any(|t| t.children.iter().any(|c| c.kind == TokenKind::FootnoteAnchor));
        assert!(anchored, "Footnote anchor should close the definition text");
    }

    #[test]
    fn test_variant_name_snake_case() {
        assert_eq!(variant_name(&NodeValue::ThematicBreak), "thematic_break");
        assert_eq!(variant_name(&NodeValue::Text("x".to_string())), "text");
        assert_eq!(variant_name(&NodeValue::SpoileredText), "spoilered_text");
    }
}
