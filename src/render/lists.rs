//! List rules: nesting, ordinals and bullet selection.

use super::context::ListFrame;
use super::dispatch::{Renderer, get_break, visual_level};
use crate::token::{Token, TokenKind};
use crate::util::{bullet_for, list_marker};

/// Bullets cycled by nesting level.
const BULLETS: [&str; 4] = ["*", "-", "+", "~"];

/// Bullets for byline items, so author links stand out from ordinary lists.
const BYLINE_BULLETS: [&str; 4] = ["+", "-", "*", "~"];

impl Renderer<'_> {
    /// Opens a list.
    ///
    /// A list directly after a closed list of the same kind and level is
    /// shifted to the next bullet, or to the `)` delimiter, so the two are
    /// not read back as one list.
    pub(super) fn list_open(&mut self, tokens: &[Token], idx: usize, ordered: bool) -> String {
        let level = tokens[idx].level;
        let prev = idx.checked_sub(1).and_then(|i| tokens.get(i));

        let shift = match (prev, self.ctx.closed_list) {
            (Some(prev), Some(closed))
                if is_list_close(prev, ordered)
                    && closed.ordered == ordered
                    && closed.level == level =>
            {
                closed.shift + 1
            }
            _ => 0,
        };

        self.ctx.lists.push(ListFrame {
            ordered,
            num: 1,
            level,
            shift,
        });
        "\n".to_string()
    }

    pub(super) fn list_close(&mut self, tokens: &[Token], idx: usize) -> String {
        self.ctx.closed_list = self.ctx.lists.pop();
        get_break(tokens, idx).to_string()
    }

    /// Renders an item marker. The item body is indented under the marker
    /// when the item closes.
    pub(super) fn list_item_open(&mut self, tokens: &[Token], idx: usize) -> String {
        let level = visual_level(tokens[idx].level);
        let shift = self.ctx.list_shift();

        let marker = if self.ctx.ordered() {
            let delimiter = if shift % 2 == 0 { "." } else { ")" };
            format!("{}{}", self.ctx.next_ordinal(), delimiter)
        } else {
            let bullets = if self.is_byline(tokens, idx) {
                &BYLINE_BULLETS
            } else {
                &BULLETS
            };
            bullet_for(Some(level.unwrap_or(0) + shift), bullets).to_string()
        };

        list_marker(&marker)
    }

    pub(super) fn list_item_close(&self, tokens: &[Token], idx: usize) -> String {
        let prev = idx.checked_sub(1).and_then(|i| tokens.get(i));
        if prev.is_some_and(|p| p.tight) {
            return get_break(tokens, idx).to_string();
        }
        String::new()
    }

    /// True when the previous item mentions the author's name, or this item
    /// links to the author's GitHub or Twitter profile.
    fn is_byline(&self, tokens: &[Token], idx: usize) -> bool {
        let prev = idx.checked_sub(3).and_then(|i| tokens.get(i));
        let next = tokens.get(idx + 2);

        let after_name = match (self.options.name.as_deref(), prev) {
            (Some(name), Some(prev)) => prev.content.contains(name),
            _ => false,
        };

        let profile = match (&self.byline, next) {
            (Some(re), Some(next)) => {
                re.is_match(&next.content)
                    || next.children.iter().any(|child| re.is_match(&child.href))
            }
            _ => false,
        };

        after_name || profile
    }
}

fn is_list_close(token: &Token, ordered: bool) -> bool {
    if ordered {
        token.kind == TokenKind::OrderedListClose
    } else {
        token.kind == TokenKind::BulletListClose
    }
}
