//! Utility functions for prettymd

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r\n|\n){2,}").expect("valid regex"));
static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:svg|png|jpe?g|gif)$").expect("valid regex"));

/// Line openers that would start a block: ATX heading, quote, bullet,
/// setext underline, thematic break or tilde fence.
static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#{1,6}(?:[ \t]|$)|>|[-+](?:[ \t]|$)|=+[ \t]*$|-+[ \t]*$|~{3})")
        .expect("valid regex")
});

/// Ordered list opener: the delimiter position is escaped.
static ORDINAL_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,9}[.)](?:[ \t]|$)").expect("valid regex"));

/// Collapses runs of two or more line breaks into exactly one blank line.
///
/// Mixed `\n` and `\r\n` sequences count toward the same run.
///
/// # Arguments
///
/// * `text`: Rendered output
///
/// # Returns
///
/// Text where every blank line run is replaced by `\n\n`
pub fn condense_newlines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

/// Normalizes a reference label for case insensitive lookup.
///
/// Lowercases and collapses internal whitespace runs to a single space,
/// the way reference definitions are matched.
///
/// # Arguments
///
/// * `label`: Label as written in the document
///
/// # Returns
///
/// Normalized lookup key
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Renders one list item marker followed by a single space.
///
/// The marker is written at the item's own margin; nesting indentation
/// comes from the enclosing item, see [`indent_continuations`]. The
/// returned width is the item's content column.
///
/// # Arguments
///
/// * `marker`: Bullet character or ordinal such as `3.`
///
/// # Returns
///
/// Marker text ready to be followed by item content
pub fn list_marker(marker: &str) -> String {
    format!("{} ", marker)
}

/// Indents every line after the first by `width` spaces.
///
/// Blank lines stay empty so blank line runs still condense.
///
/// # Arguments
///
/// * `body`: Rendered list item body, starting right after its marker
/// * `width`: Content column of the item
///
/// # Returns
///
/// Body with continuation lines moved under the item content
pub fn indent_continuations(body: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut out = String::with_capacity(body.len());

    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.trim().is_empty() {
                out.push_str(&pad);
            }
        }
        out.push_str(line);
    }

    out
}

/// Backslash escapes characters of literal text that would otherwise be
/// read back as markup.
///
/// Emphasis markers are left alone where they cannot open or close a run
/// (`a * b`, `snake_case`). `[` is escaped only when its bracket is
/// followed by `(`, and `<` only when it reads like a tag. With
/// `line_start`, block openers such as `# `, `> `, `- ` or `1. ` are
/// escaped too.
///
/// # Arguments
///
/// * `text`: Literal text as produced by the parser
/// * `line_start`: Whether the text begins a rendered line
///
/// # Returns
///
/// Text that parses back to the same literal
pub fn escape_markdown(text: &str, line_start: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);

    let ordinal = if line_start {
        ORDINAL_OPENER
            .find(text)
            .map(|m| m.as_str().trim_end().len() - 1)
    } else {
        None
    };
    let opener = line_start && ordinal.is_none() && BLOCK_OPENER.is_match(text);

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let escape = match c {
            '\\' => next.is_none_or(|n| n.is_ascii_punctuation()),
            '`' => true,
            '*' => !(is_space(prev) && is_space(next)),
            '_' => {
                let inert =
                    (is_space(prev) && is_space(next)) || (is_alnum(prev) && is_alnum(next));
                !inert
            }
            '[' => bracket_opens_link(&chars, i),
            '<' => next.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?')),
            _ => (i == 0 && opener) || ordinal == Some(i),
        };

        if escape {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

fn is_space(c: Option<char>) -> bool {
    c.is_some_and(char::is_whitespace)
}

fn is_alnum(c: Option<char>) -> bool {
    c.is_some_and(char::is_alphanumeric)
}

/// True when the `[` at `open` closes with `](`, which would read as an
/// inline link.
fn bracket_opens_link(chars: &[char], open: usize) -> bool {
    let Some(close) = chars[open + 1..].iter().position(|&c| c == ']') else {
        return false;
    };
    chars.get(open + 1 + close + 1) == Some(&'(')
}

/// Picks the bullet character for a nesting level, cycling through `chars`.
pub fn bullet_for(level: Option<usize>, chars: &[&'static str]) -> &'static str {
    if chars.is_empty() {
        return "*";
    }
    chars[level.unwrap_or(0) % chars.len()]
}

/// Removes a trailing image extension from a URL.
///
/// # Arguments
///
/// * `url`: Image URL, e.g. a shield badge ending in `.svg`
///
/// # Returns
///
/// URL without `.svg`, `.png`, `.jpg`, `.jpeg` or `.gif` suffix
pub fn strip_image_extension(url: &str) -> &str {
    match IMAGE_EXTENSION.find(url) {
        Some(m) => &url[..m.start()],
        None => url,
    }
}

/// True when the text ends with an alphanumeric or underscore character.
pub fn ends_with_word_char(text: &str) -> bool {
    text.chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// True when the text starts with an alphanumeric or underscore character.
pub fn starts_with_word_char(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
