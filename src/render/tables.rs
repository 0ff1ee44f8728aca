//! GFM table rules.
//!
//! Rows render as `| a | b |`. Header cells record their column alignment;
//! the alignment row is written when the body opens, or when the header
//! closes a table without a body.

use super::context::Inside;
use super::dispatch::Renderer;
use crate::token::{Align, Token, TokenKind};

impl Renderer<'_> {
    pub(super) fn table_open(&mut self) -> String {
        self.ctx.align.clear();
        self.ctx.inside = Inside {
            table: true,
            ..Inside::default()
        };
        String::new()
    }

    pub(super) fn table_close(&mut self) -> String {
        self.ctx.inside = Inside::default();
        "\n".to_string()
    }

    pub(super) fn thead_open(&mut self) -> String {
        self.ctx.inside.thead = true;
        "| ".to_string()
    }

    pub(super) fn thead_close(&mut self, tokens: &[Token], idx: usize) -> String {
        self.ctx.inside.thead = false;

        let body_follows = tokens
            .get(idx + 1)
            .is_some_and(|next| next.kind == TokenKind::TbodyOpen);
        if body_follows {
            String::new()
        } else {
            self.alignment_row()
        }
    }

    pub(super) fn th_open(&mut self, tokens: &[Token], idx: usize) -> String {
        if self.ctx.inside.thead {
            self.ctx.align.push(align_marker(tokens[idx].align));
        }
        self.ctx.inside.th = true;
        String::new()
    }

    pub(super) fn th_close(&mut self, tokens: &[Token], idx: usize) -> String {
        self.ctx.inside.th = false;
        closing_cell(tokens, idx, " | ")
    }

    pub(super) fn tbody_open(&self) -> String {
        self.alignment_row()
    }

    pub(super) fn tr_open(&mut self) -> String {
        self.ctx.inside.tr = true;
        String::new()
    }

    pub(super) fn tr_close(&mut self) -> String {
        self.ctx.inside.tr = false;
        "\n".to_string()
    }

    pub(super) fn td_open(&self, tokens: &[Token], idx: usize) -> String {
        let row_start = idx
            .checked_sub(1)
            .and_then(|i| tokens.get(i))
            .is_some_and(|prev| prev.kind == TokenKind::TrOpen);

        if row_start {
            "| ".to_string()
        } else {
            " | ".to_string()
        }
    }

    pub(super) fn td_close(&self, tokens: &[Token], idx: usize) -> String {
        closing_cell(tokens, idx, "")
    }

    fn alignment_row(&self) -> String {
        format!("| {} |\n", self.ctx.align.join(" | "))
    }
}

/// ` |` for the last cell of a row, `separator` otherwise.
fn closing_cell(tokens: &[Token], idx: usize, separator: &str) -> String {
    let last = tokens
        .get(idx + 1)
        .is_some_and(|next| next.kind == TokenKind::TrClose);

    if last {
        " |".to_string()
    } else {
        separator.to_string()
    }
}

fn align_marker(align: Option<Align>) -> &'static str {
    match align {
        Some(Align::Center) => ":---:",
        Some(Align::Left) => ":---",
        Some(Align::Right) => "---:",
        None => "---",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_markers() {
        assert_eq!(align_marker(Some(Align::Center)), ":---:");
        assert_eq!(align_marker(Some(Align::Left)), ":---");
        assert_eq!(align_marker(Some(Align::Right)), "---:");
        assert_eq!(align_marker(None), "---");
    }

    #[test]
    fn test_last_cell_closes_row() {
        // Arrange
        let tokens = vec![
            Token::new(TokenKind::TdClose),
            Token::new(TokenKind::TdOpen),
            Token::new(TokenKind::TdClose),
            Token::new(TokenKind::TrClose),
        ];

        // Act & Assert
        assert_eq!(closing_cell(&tokens, 0, " | "), " | ");
        assert_eq!(closing_cell(&tokens, 2, " | "), " |");
    }
}
