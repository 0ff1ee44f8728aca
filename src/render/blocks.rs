//! Rules for headings, paragraphs, code, inline marks, text and the
//! HTML-ish constructs.

use super::dispatch::{Renderer, get_break};
use crate::token::{Token, TokenKind};
use crate::util::escape_markdown;

impl Renderer<'_> {
    pub(super) fn heading_open(&self, tokens: &[Token], idx: usize) -> String {
        let level = tokens[idx].h_level.max(1) as usize;
        format!("{} ", "#".repeat(level))
    }

    pub(super) fn paragraph_open(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        let prev = idx.checked_sub(1).and_then(|i| tokens.get(i));
        let next = tokens.get(idx + 1);

        if prev.is_some_and(|p| p.kind == TokenKind::BlockquoteOpen) {
            return String::new();
        }
        if next.is_some_and(|n| n.kind == TokenKind::Inline) {
            return String::new();
        }

        if token.tight {
            String::new()
        } else {
            "\n".to_string()
        }
    }

    /// Closes a paragraph. Tight paragraphs abut the next item marker;
    /// loose ones end with a blank line.
    pub(super) fn paragraph_close(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        let prev = idx.checked_sub(1).and_then(|i| tokens.get(i));
        let next = tokens.get(idx + 1);

        if next.is_some_and(|n| !n.kind.is_paragraph()) {
            return if token.tight {
                String::new()
            } else {
                format!("\n{}", get_break(tokens, idx))
            };
        }

        let empty_tight = token.tight
            && prev.is_some_and(|p| p.kind == TokenKind::Inline && p.content.is_empty());

        let mut res = String::new();
        if !token.tight {
            res.push('\n');
        }
        if !empty_tight {
            res.push_str(get_break(tokens, idx));
        }
        res
    }

    /// Inline code spans, or indented code blocks rendered as a plain fence.
    pub(super) fn code(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];

        if token.block {
            let body = trim_blank_edges(&token.content);
            let fence = code_fence(body);
            return format!(
                "\n{fence}\n{body}\n{fence}\n{}",
                get_break(tokens, idx)
            );
        }

        let content = if self.ctx.inside.tr {
            token.content.replace('|', "\\|")
        } else {
            token.content.clone()
        };
        let delimiter = "`".repeat(longest_backtick_run(&content) + 1);
        let pad = if content.starts_with('`') || content.ends_with('`') {
            " "
        } else {
            ""
        };
        format!("{delimiter}{pad}{content}{pad}{delimiter}")
    }

    /// Fenced code with the language taken from the first info word.
    ///
    /// Only blank lines at the edges are removed; indentation of the first
    /// content line is kept.
    pub(super) fn fence(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        let lang = token.params.split_whitespace().next().unwrap_or("");
        let body = trim_blank_edges(&token.content);
        let fence = code_fence(body);

        format!(
            "\n{fence}{lang}\n{body}\n{fence}\n{}",
            get_break(tokens, idx)
        )
    }

    /// Opens a bold run. Bold right after a line break becomes its own
    /// block, so it reads as a pseudo heading.
    pub(super) fn strong_open(&mut self, tokens: &[Token], idx: usize) -> String {
        let prev = idx.checked_sub(1).and_then(|i| tokens.get(i));

        let mut res = String::new();
        if prev.is_some_and(|p| p.kind == TokenKind::Softbreak) {
            res.push('\n');
        }

        self.ctx.strong = Some(prev.is_some_and(|p| p.kind == TokenKind::Text));
        res.push_str("**");
        res
    }

    pub(super) fn strong_close(&mut self, tokens: &[Token], idx: usize) -> String {
        let after_text = self.ctx.strong.take().unwrap_or(false);

        // Mid sentence bold, or a header cell
        if after_text || self.ctx.inside.th {
            return "**".to_string();
        }
        self.detect_break(tokens, idx, "**")
    }

    /// Plain text. Characters that would read back as markup are escaped,
    /// reflinks left in the text resolve against the configured targets,
    /// and pipes are escaped inside table cells.
    pub(super) fn text(&self, tokens: &[Token], idx: usize) -> String {
        let line_start = match idx.checked_sub(1).and_then(|i| tokens.get(i)) {
            None => true,
            Some(prev) => matches!(prev.kind, TokenKind::Softbreak | TokenKind::Hardbreak),
        };
        let escaped = escape_markdown(&tokens[idx].content, line_start);

        let mut text = if !self.reflinks.is_empty() && escaped.contains('[') {
            self.reflinks.expand_lenient(&escaped)
        } else {
            escaped
        };

        if self.ctx.inside.tr {
            text = text.replace('|', "\\|");
        }
        text
    }

    pub(super) fn html_block(&self, tokens: &[Token], idx: usize) -> String {
        format!(
            "{}\n{}",
            tokens[idx].content.trim_end(),
            get_break(tokens, idx)
        )
    }

    pub(super) fn footnote_ref(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        let n = token.id + 1;
        format!(
            "<sup class=\"footnote-ref\"><a href=\"#fn{n}\" id=\"{}\">[{n}]</a></sup>",
            footnote_ref_id(token)
        )
    }

    pub(super) fn footnote_block_open(&self) -> String {
        let hr = if self.options.xhtml_out {
            "<hr class=\"footnotes-sep\" />\n"
        } else {
            "<hr class=\"footnotes-sep\">\n"
        };
        format!("{hr}<section class=\"footnotes\">\n<ol class=\"footnotes-list\">\n")
    }

    pub(super) fn footnote_anchor(&self, tokens: &[Token], idx: usize) -> String {
        format!(
            " <a href=\"#{}\" class=\"footnote-backref\">↩</a>",
            footnote_ref_id(&tokens[idx])
        )
    }
}

/// `fnref3`, or `fnref3:1` for the second reference to footnote 3.
fn footnote_ref_id(token: &Token) -> String {
    let n = token.id + 1;
    if token.sub_id > 0 {
        format!("fnref{}:{}", n, token.sub_id)
    } else {
        format!("fnref{}", n)
    }
}

fn trim_blank_edges(content: &str) -> &str {
    content.trim_start_matches('\n').trim_end_matches('\n')
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0)
}

/// Three backticks, or one more than the longest run inside the body.
fn code_fence(body: &str) -> String {
    "`".repeat(std::cmp::max(3, longest_backtick_run(body) + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenderOptions;

    #[test]
    fn test_longest_backtick_run() {
        assert_eq!(longest_backtick_run("abc"), 0);
        assert_eq!(longest_backtick_run("a`b``c"), 2);
        assert_eq!(longest_backtick_run("```"), 3);
    }

    #[test]
    fn test_code_fence_grows_past_inner_fences() {
        assert_eq!(code_fence("plain"), "```");
        assert_eq!(code_fence("```js\nx\n```"), "````");
    }

    #[test]
    fn test_trim_blank_edges_keeps_indentation() {
        assert_eq!(trim_blank_edges("\n\n     x\n\n"), "     x");
        assert_eq!(trim_blank_edges("a\n\nb\n"), "a\n\nb");
    }

    #[test]
    fn test_footnote_ref_id() {
        // Arrange
        let mut token = Token::new(TokenKind::FootnoteRef);
        token.id = 2;

        // Act & Assert
        assert_eq!(footnote_ref_id(&token), "fnref3");
        token.sub_id = 1;
        assert_eq!(footnote_ref_id(&token), "fnref3:1");
    }

    #[test]
    fn test_text_escapes_literal_markup() {
        // Arrange
        let options = RenderOptions::new();
        let renderer = Renderer::new(&options);
        let tokens = vec![
            Token::text("*x* and 1"),
            Token::new(TokenKind::Softbreak),
            Token::text("2. y"),
        ];

        // Act
        let first = renderer.text(&tokens, 0);
        let after_break = renderer.text(&tokens, 2);

        // Assert
        assert_eq!(first, "\\*x\\* and 1");
        assert_eq!(after_break, "2\\. y");
    }
}
