//! Rule dispatch core.
//!
//! Walks the block sequence, recursing into `inline` containers, and maps
//! each token kind to its rule through one exhaustive `match`. Rules get
//! random access to the sibling slice so they can look ahead and behind.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use super::context::{ItemFrame, RenderContext, Rendered};
use crate::error::{Error, Result};
use crate::options::RenderOptions;
use crate::reflinks::ReflinkTable;
use crate::token::{Token, TokenKind};
use crate::util::{condense_newlines, indent_continuations};

static LEADING_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\n+").expect("valid regex"));

/// Renders one token stream back to markdown.
///
/// A renderer is consumed by [`Renderer::render`], so its context can never
/// be shared between two passes.
pub struct Renderer<'o> {
    pub(super) options: &'o RenderOptions,
    pub(super) ctx: RenderContext,
    pub(super) reflinks: ReflinkTable,
    pub(super) byline: Option<Regex>,
}

impl<'o> Renderer<'o> {
    /// Creates renderer with a fresh context.
    ///
    /// # Arguments
    ///
    /// * `options`: Render options; `reflinks` seed text level resolution and
    ///   `username` drives the byline bullet heuristic
    pub fn new(options: &'o RenderOptions) -> Self {
        let reflinks = ReflinkTable::new().with_context(&options.reflinks);
        let byline = options.username.as_deref().and_then(|username| {
            Regex::new(&format!(
                r"(?:github|twitter)(?:\.com)?/{}\b",
                regex::escape(username)
            ))
            .ok()
        });

        Self {
            options,
            ctx: RenderContext::new(),
            reflinks,
            byline,
        }
    }

    /// Renders `tokens` and returns the text with the collected links,
    /// images and badges.
    ///
    /// Tokens are read, apart from the in-place rewrites list items and
    /// links/images perform on their neighbours (continuation indentation,
    /// folded `{#id}` fragments).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTokenType`] in strict mode when a token kind
    /// has no rule
    pub fn render(mut self, tokens: &mut [Token]) -> Result<Rendered> {
        let mut out = String::new();
        self.render_blocks(tokens, &mut out)?;

        // Unbalanced items and quotes still get their indentation
        while !self.ctx.items.is_empty() {
            self.close_item(&mut out);
        }
        while !self.ctx.quotes.is_empty() {
            self.close_quote(&mut out);
        }

        let text = self.finish(out);
        trace!(
            links = self.ctx.link_count(),
            images = self.ctx.image_count(),
            badges = self.ctx.badge_count(),
            "rendered token stream"
        );

        Ok(self.ctx.finish(text))
    }

    /// Applies condensing, trimming and the trailing terminator.
    fn finish(&self, out: String) -> String {
        let text = if self.options.condense {
            condense_newlines(&out)
        } else {
            out
        };

        let mut text = text.trim().to_string();
        text.push_str(self.options.newline.as_str());
        text
    }

    fn render_blocks(&mut self, tokens: &mut [Token], out: &mut String) -> Result<()> {
        for idx in 0..tokens.len() {
            let rendered = self.rule(tokens, idx)?;

            match tokens[idx].kind {
                TokenKind::BlockquoteOpen => {
                    out.push_str(&rendered);
                    self.ctx.quotes.push(out.len());
                }
                TokenKind::BlockquoteClose => {
                    self.close_quote(out);
                    out.push_str(&rendered);
                }
                TokenKind::ListItemOpen => {
                    out.push_str(&rendered);
                    self.ctx.items.push(ItemFrame {
                        start: out.len(),
                        width: rendered.len(),
                    });
                }
                TokenKind::ListItemClose => {
                    self.close_item(out);
                    out.push_str(&rendered);
                }
                _ => out.push_str(&rendered),
            }
        }
        Ok(())
    }

    /// Renders the children of an `inline` container.
    fn render_inline(&mut self, tokens: &mut [Token]) -> Result<String> {
        let mut out = String::new();
        for idx in 0..tokens.len() {
            out.push_str(&self.rule(tokens, idx)?);
        }
        Ok(out)
    }

    /// Prefixes everything written since the innermost quote opened.
    ///
    /// Runs of blank lines inside the body collapse to one `>` line, since
    /// condensing cannot merge prefixed lines later.
    fn close_quote(&mut self, out: &mut String) {
        let Some(start) = self.ctx.quotes.pop() else {
            return;
        };

        let body = out.split_off(start.min(out.len()));
        let body = LEADING_NEWLINES.replace(body.trim_end(), "");

        let mut quoted: Vec<String> = Vec::new();
        for line in body.lines() {
            let blank = line.trim().is_empty();
            if blank && quoted.last().is_some_and(|last| last == ">") {
                continue;
            }
            quoted.push(if blank {
                ">".to_string()
            } else {
                format!("> {}", line)
            });
        }

        out.push_str(&quoted.join("\n"));
    }

    /// Indents the continuation lines of the innermost list item under its
    /// content column.
    fn close_item(&mut self, out: &mut String) {
        let Some(item) = self.ctx.items.pop() else {
            return;
        };

        let body = out.split_off(item.start.min(out.len()));
        out.push_str(&indent_continuations(&body, item.width));
    }

    /// Dispatches one token to its rule.
    fn rule(&mut self, tokens: &mut [Token], idx: usize) -> Result<String> {
        let kind = tokens[idx].kind.clone();

        let rendered = match kind {
            TokenKind::Inline => {
                let mut children = std::mem::take(&mut tokens[idx].children);
                let result = self.render_inline(&mut children);
                tokens[idx].children = children;
                result?
            }

            TokenKind::BlockquoteOpen => "\n".to_string(),
            TokenKind::BlockquoteClose => format!("\n{}", get_break(tokens, idx)),
            TokenKind::Code => self.code(tokens, idx),
            TokenKind::Fence => self.fence(tokens, idx),
            TokenKind::HeadingOpen => self.heading_open(tokens, idx),
            TokenKind::HeadingClose => format!("\n{}", get_break(tokens, idx)),
            TokenKind::Hr => format!("***\n{}", get_break(tokens, idx)),
            TokenKind::ParagraphOpen => self.paragraph_open(tokens, idx),
            TokenKind::ParagraphClose => self.paragraph_close(tokens, idx),

            TokenKind::BulletListOpen => self.list_open(tokens, idx, false),
            TokenKind::OrderedListOpen => self.list_open(tokens, idx, true),
            TokenKind::BulletListClose | TokenKind::OrderedListClose => {
                self.list_close(tokens, idx)
            }
            TokenKind::ListItemOpen => self.list_item_open(tokens, idx),
            TokenKind::ListItemClose => self.list_item_close(tokens, idx),

            TokenKind::TableOpen => self.table_open(),
            TokenKind::TableClose => self.table_close(),
            TokenKind::TheadOpen => self.thead_open(),
            TokenKind::TheadClose => self.thead_close(tokens, idx),
            TokenKind::TbodyOpen => self.tbody_open(),
            TokenKind::TbodyClose => String::new(),
            TokenKind::TrOpen => self.tr_open(),
            TokenKind::TrClose => self.tr_close(),
            TokenKind::ThOpen => self.th_open(tokens, idx),
            TokenKind::ThClose => self.th_close(tokens, idx),
            TokenKind::TdOpen => self.td_open(tokens, idx),
            TokenKind::TdClose => self.td_close(tokens, idx),

            TokenKind::LinkOpen => self.link_open(tokens, idx),
            TokenKind::LinkClose => self.link_close(),
            TokenKind::Image => self.image(tokens, idx),

            TokenKind::StrongOpen => self.strong_open(tokens, idx),
            TokenKind::StrongClose => self.strong_close(tokens, idx),
            TokenKind::EmOpen => "_".to_string(),
            TokenKind::EmClose => self.detect_break(tokens, idx, "_"),
            TokenKind::DelOpen => "~~".to_string(),
            TokenKind::DelClose => self.detect_break(tokens, idx, "~~"),
            TokenKind::InsOpen => "<ins>".to_string(),
            TokenKind::InsClose => "</ins>".to_string(),
            TokenKind::MarkOpen => "<mark>".to_string(),
            TokenKind::MarkClose => "</mark>".to_string(),
            TokenKind::Sub => format!("<sub>{}</sub>", tokens[idx].content),
            TokenKind::Sup => format!("<sup>{}</sup>", tokens[idx].content),
            TokenKind::AbbrOpen => format!("<abbr title=\"{}\">", tokens[idx].title),
            TokenKind::AbbrClose => "</abbr>".to_string(),

            TokenKind::Hardbreak => "\n\n".to_string(),
            TokenKind::Softbreak => "\n".to_string(),
            TokenKind::Text => self.text(tokens, idx),
            TokenKind::HtmlBlock => self.html_block(tokens, idx),
            TokenKind::HtmlTag => tokens[idx].content.clone(),

            TokenKind::FootnoteRef => self.footnote_ref(tokens, idx),
            TokenKind::FootnoteBlockOpen => self.footnote_block_open(),
            TokenKind::FootnoteBlockClose => "</ol>\n</section>\n".to_string(),
            TokenKind::FootnoteOpen => {
                format!("<li id=\"fn{}\"  class=\"footnote-item\">", tokens[idx].id + 1)
            }
            TokenKind::FootnoteClose => "</li>\n".to_string(),
            TokenKind::FootnoteAnchor => self.footnote_anchor(tokens, idx),

            TokenKind::DlOpen => "<dl>\n".to_string(),
            TokenKind::DlClose => format!("</dl>\n{}", get_break(tokens, idx)),
            TokenKind::DtOpen => "<dt>".to_string(),
            TokenKind::DtClose => "</dt>\n".to_string(),
            TokenKind::DdOpen => "<dd>".to_string(),
            TokenKind::DdClose => "</dd>\n".to_string(),

            TokenKind::Unknown(name) => {
                if self.options.strict {
                    return Err(Error::UnknownTokenType(name));
                }
                debug!(kind = %name, "no rule for token, passing content through");
                tokens[idx].content.clone()
            }
        };

        Ok(rendered)
    }

    /// Closes an inline mark, adding a newline when it ends the line.
    ///
    /// Inside tables the marker is returned bare so rows stay on one line.
    pub(super) fn detect_break(&self, tokens: &[Token], idx: usize, marker: &str) -> String {
        if self.ctx.inside.table {
            return marker.to_string();
        }

        match tokens.get(idx + 1) {
            None => format!("{}\n", marker),
            Some(next) if next.kind == TokenKind::Softbreak => format!("{}\n", marker),
            Some(_) => marker.to_string(),
        }
    }
}

/// Index of the next token that matters for spacing.
///
/// Skips empty tight paragraphs (`paragraph_open`, empty `inline`,
/// `paragraph_close`), which render as nothing.
pub(super) fn next_index(tokens: &[Token], idx: usize) -> usize {
    let mut idx = idx + 1;

    while idx + 2 < tokens.len() {
        let open = &tokens[idx];
        let inline = &tokens[idx + 1];
        let close = &tokens[idx + 2];

        let empty = open.kind == TokenKind::ParagraphOpen
            && open.tight
            && inline.kind == TokenKind::Inline
            && inline.content.is_empty()
            && close.kind == TokenKind::ParagraphClose
            && close.tight;
        if !empty {
            break;
        }
        idx += 3;
    }

    idx
}

/// Newline to emit after a block, or nothing when the enclosing list item
/// closes right after it.
pub(super) fn get_break(tokens: &[Token], idx: usize) -> &'static str {
    match tokens.get(next_index(tokens, idx)) {
        Some(next) if next.kind == TokenKind::ListItemClose => "",
        _ => "\n",
    }
}

/// Visual indent level from a parser level; list nesting steps the parser
/// level by two.
pub(super) fn visual_level(level: Option<usize>) -> Option<usize> {
    level.map(|level| level.saturating_sub(1) / 2)
}
