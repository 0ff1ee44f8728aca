//! Link, image and badge classification.
//!
//! A link whose first child is an image is a badge: the link renders
//! nothing and the image rule writes the whole `[![alt](src)](href)`
//! composite. A `{#id}` or `{/path}` fragment directly after a link is
//! folded into its href.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{Badge, Image, Link, LinkFrame};
use super::dispatch::Renderer;
use crate::token::{Token, TokenKind};
use crate::util::{ends_with_word_char, starts_with_word_char, strip_image_extension};

static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));

impl Renderer<'_> {
    /// Opens a link.
    ///
    /// Rewrites the token's `href` in place: an empty href becomes `#text`,
    /// a trailing `{fragment}` text is appended (and removed from that text),
    /// and braces inside the href are unwrapped.
    pub(super) fn link_open(&mut self, tokens: &mut [Token], idx: usize) -> String {
        if tokens[idx].href.is_empty() {
            let anchor = tokens
                .get(idx + 1)
                .filter(|next| !next.content.is_empty())
                .map(|next| format!("#{}", next.content));
            if let Some(anchor) = anchor {
                tokens[idx].href = anchor;
            }
        }

        let mut res = String::new();
        if let Some(close) = matching_close(tokens, idx) {
            if let Some(fragment) = take_fragment(tokens, close + 1) {
                tokens[idx].href.push_str(&fragment);

                let collides = idx
                    .checked_sub(1)
                    .and_then(|i| tokens.get(i))
                    .is_some_and(|prev| prev.kind == TokenKind::Text && ends_with_word_char(&prev.content));
                if collides {
                    res.push(' ');
                }
            }
        }

        let href = BRACED.replace(&tokens[idx].href, "$1").into_owned();
        tokens[idx].href = href.clone();
        let title = tokens[idx].title.clone();

        let badge = tokens
            .get(idx + 1)
            .is_some_and(|next| next.kind == TokenKind::Image);
        if badge {
            self.ctx.link_stack.push(LinkFrame::Badge);
            return res;
        }

        self.ctx.links.push(Link {
            href: href.clone(),
            title: title.clone(),
        });
        self.ctx.link_stack.push(LinkFrame::Link { href, title });
        res.push('[');
        res
    }

    pub(super) fn link_close(&mut self) -> String {
        match self.ctx.link_stack.pop() {
            Some(LinkFrame::Link { href, title }) => format!("]({})", target(&href, &title)),
            Some(LinkFrame::Badge) | None => String::new(),
        }
    }

    /// Renders an image, a linked badge, or a bare shield badge.
    pub(super) fn image(&mut self, tokens: &mut [Token], idx: usize) -> String {
        if let Some(fragment) = take_fragment(tokens, idx + 1) {
            tokens[idx].src.push_str(&fragment);
        }
        let src = BRACED.replace(&tokens[idx].src, "$1").into_owned();
        tokens[idx].src = src.clone();

        let token = &tokens[idx];
        let image = format!("![{}]({})", token.alt, target(&src, &token.title));

        let link = idx
            .checked_sub(1)
            .and_then(|i| tokens.get(i))
            .filter(|prev| prev.kind == TokenKind::LinkOpen);

        let href = match link {
            Some(link) if !link.href.is_empty() => link.href.clone(),
            Some(_) => src.clone(),
            None if src.contains("badge") => strip_image_extension(&src).to_string(),
            None => {
                self.ctx.images.push(Image {
                    alt: token.alt.clone(),
                    src,
                    title: token.title.clone(),
                });
                return image;
            }
        };

        self.ctx.badges.push(Badge {
            alt: token.alt.clone(),
            src,
            href: href.clone(),
        });
        format!("[{}]({})", image, href)
    }
}

/// Index of the `link_close` pairing with the `link_open` at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open + 1) {
        match token.kind {
            TokenKind::LinkOpen => depth += 1,
            TokenKind::LinkClose if depth == 0 => return Some(i),
            TokenKind::LinkClose => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Removes a leading `{fragment}` from the text token at `idx`, returning
/// the fragment.
///
/// A single space is put back when the remaining text would otherwise run
/// into the construct the fragment belonged to.
fn take_fragment(tokens: &mut [Token], idx: usize) -> Option<String> {
    let text = tokens
        .get_mut(idx)
        .filter(|token| token.kind == TokenKind::Text)?;
    if !text.content.starts_with('{') {
        return None;
    }

    let end = text.content.find('}')?;
    let fragment = text.content[1..end].to_string();
    if fragment.is_empty() {
        return None;
    }

    let rest = &text.content[end + 1..];
    text.content = if starts_with_word_char(rest) {
        format!(" {}", rest)
    } else {
        rest.to_string()
    };

    Some(fragment)
}

/// Link destination with an optional quoted title.
fn target(url: &str, title: &str) -> String {
    if title.is_empty() {
        url.to_string()
    } else {
        format!("{} \"{}\"", url, title.replace('"', "\\\""))
    }
}
