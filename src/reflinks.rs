//! Reference link expansion.
//!
//! Rewrites shortcut (`[label]`), collapsed (`[label][]`) and full
//! (`[label][ref]`) reference links and images into inline form before the
//! source reaches the tokenizer. A trailing `{#anchor}` or `{/path}` folds
//! into the resolved target.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::RenderOptions;
use crate::util::normalize_label;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^ {0,3}\[([^\]]+)\]:[ \t]*<?([^\s>]+)>?(?:[ \t]+(?:"([^"]*)"|'([^']*)'|\(([^)]*)\)))?[ \t]*$"#,
    )
    .expect("valid regex")
});

static REFLINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(!?)\[((?:[^\[\]\n]|\[[^\[\]\n]*\])+)\](?:\[([^\[\]\n]*)\])?(?:\{([#/][^}\n]*)\})?")
        .expect("valid regex")
});

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(?:[-+*]|\d{1,9}[.)])(?:[ \t]|$)").expect("valid regex"));

static ADJACENT_COLLAPSED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\]\[\]\s*\n\s*\[").expect("valid regex"));

/// Resolved reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflink {
    pub url: String,
    pub title: Option<String>,
}

impl Reflink {
    /// Creates a target without title.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    /// Renders the parenthesized inline destination, anchor folded in.
    fn destination(&self, anchor: &str) -> String {
        match &self.title {
            Some(title) if title.contains('"') => format!("({}{} ({}))", self.url, anchor, title),
            Some(title) => format!("({}{} \"{}\")", self.url, anchor, title),
            None => format!("({}{})", self.url, anchor),
        }
    }
}

/// Mapping from reference label to target.
///
/// Labels resolve exactly as written first, then case and whitespace
/// insensitively. The first insertion for a label wins, so document
/// definitions take precedence over injected context entries.
#[derive(Debug, Clone, Default)]
pub struct ReflinkTable {
    exact: HashMap<String, Reflink>,
    folded: HashMap<String, Reflink>,
}

impl ReflinkTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `[label]: target "title"` definitions from a document.
    ///
    /// Definitions inside fenced code blocks and footnote definitions
    /// (`[^note]: ...`) are ignored.
    ///
    /// # Arguments
    ///
    /// * `source`: Raw markdown source
    ///
    /// # Returns
    ///
    /// Table holding every definition found
    pub fn from_document(source: &str) -> Self {
        let mut table = Self::new();

        for line in scan_lines(source) {
            if line.in_code {
                continue;
            }
            let Some(caps) = DEFINITION.captures(line.text) else {
                continue;
            };
            let label = &caps[1];
            if label.starts_with('^') {
                continue;
            }
            let title = caps
                .get(3)
                .or_else(|| caps.get(4))
                .or_else(|| caps.get(5))
                .map(|m| m.as_str().to_string());
            table.insert(
                label,
                Reflink {
                    url: caps[2].to_string(),
                    title,
                },
            );
        }

        table
    }

    /// Adds context supplied targets for labels not already defined.
    pub fn with_context(mut self, context: &BTreeMap<String, String>) -> Self {
        for (label, target) in context {
            self.insert(label, Reflink::new(target.trim()));
        }
        self
    }

    /// Inserts a target, keeping any existing entry for the same label.
    ///
    /// # Returns
    ///
    /// `true` if the label was new
    pub fn insert(&mut self, label: &str, reflink: Reflink) -> bool {
        if self.exact.contains_key(label) {
            return false;
        }
        self.folded
            .entry(normalize_label(label))
            .or_insert_with(|| reflink.clone());
        self.exact.insert(label.to_string(), reflink);
        true
    }

    /// Looks up a label, exact match first.
    pub fn resolve(&self, label: &str) -> Option<&Reflink> {
        self.exact
            .get(label)
            .or_else(|| self.folded.get(&normalize_label(label)))
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Rewrites resolvable reflinks into inline links.
    ///
    /// Unresolved labels stay untouched. Content of fenced code blocks and
    /// inline code spans is never rewritten.
    ///
    /// # Arguments
    ///
    /// * `source`: Markdown text
    /// * `strict`: Fail on a reflink followed by an unclosed `{`
    ///
    /// # Errors
    ///
    /// Returns `MalformedReflinkSyntax` in strict mode for an unclosed
    /// anchor opener
    pub fn expand(&self, source: &str, strict: bool) -> Result<String> {
        let (expanded, malformed) = self.rewrite(source);
        match malformed {
            Some((line, column)) if strict => Err(Error::MalformedReflinkSyntax { line, column }),
            _ => Ok(expanded),
        }
    }

    /// Rewrites resolvable reflinks, leaving malformed constructs as text.
    pub fn expand_lenient(&self, source: &str) -> String {
        self.rewrite(source).0
    }

    /// Scans match spans left to right, then splices all replacements in a
    /// single ordered pass. Returns the first malformed anchor position.
    fn rewrite(&self, source: &str) -> (String, Option<(usize, usize)>) {
        let mut replacements: Vec<(usize, usize, String)> = Vec::new();
        let mut malformed = None;

        for (number, line) in scan_lines(source).into_iter().enumerate() {
            if line.in_code || DEFINITION.is_match(line.text) {
                continue;
            }
            let spans = code_spans(line.text);
            // End of the last inline link destination seen on this line
            let mut skip_until = 0;

            for caps in REFLINK.captures_iter(line.text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                let (start, end) = (whole.start(), whole.end());

                if start < skip_until || spans.iter().any(|&(s, e)| start < e && end > s) {
                    continue;
                }
                if line.text[..start].ends_with('\\') {
                    continue;
                }

                let label = &caps[2];
                if label.starts_with('^') {
                    continue;
                }
                let reference = caps.get(3).map(|m| m.as_str());
                let anchor = caps.get(4).map(|m| m.as_str()).unwrap_or("");
                let rest = &line.text[end..];

                if reference.is_none() && anchor.is_empty() {
                    if rest.starts_with('(') {
                        if let Some(len) = inline_destination_len(rest) {
                            skip_until = end + len;
                        }
                        continue;
                    }
                    if rest.starts_with(':') && line.text[..start].trim().is_empty() {
                        continue;
                    }
                }

                if anchor.is_empty() && rest.starts_with('{') && !rest.contains('}') {
                    let column = line.text[..end].chars().count() + 1;
                    debug!(line = number + 1, column, "reflink anchor opener without `}}`");
                    malformed.get_or_insert((number + 1, column));
                    continue;
                }

                let key = match reference {
                    Some(r) if !r.trim().is_empty() => r,
                    _ => label,
                };
                let Some(reflink) = self.resolve(key) else {
                    debug!(label = key, "unresolved reflink left as written");
                    continue;
                };

                let replacement = format!("{}[{}]{}", &caps[1], label, reflink.destination(anchor));
                replacements.push((line.start + start, line.start + end, replacement));
            }
        }

        let mut out = String::with_capacity(source.len());
        let mut pos = 0;
        for (start, end, replacement) in replacements {
            out.push_str(&source[pos..start]);
            out.push_str(&replacement);
            pos = end;
        }
        out.push_str(&source[pos..]);

        (out, malformed)
    }
}

/// Expands reflinks using in-document definitions plus `options.reflinks`.
///
/// Also separates adjacent collapsed reflinks (`[a][]` followed by `[b]`
/// on the next line) with a blank line so they stay distinct blocks.
///
/// # Arguments
///
/// * `source`: Raw markdown source
/// * `options`: Render options supplying context reflinks and strictness
///
/// # Returns
///
/// Source with every resolvable reflink in inline form
///
/// # Errors
///
/// Returns `MalformedReflinkSyntax` in strict mode
pub fn expand(source: &str, options: &RenderOptions) -> Result<String> {
    let table = ReflinkTable::from_document(source).with_context(&options.reflinks);
    let expanded = table.expand(source, options.strict)?;
    Ok(separate_collapsed(&expanded))
}

/// Puts a blank line between a collapsed reflink and a following `[`.
pub fn separate_collapsed(source: &str) -> String {
    ADJACENT_COLLAPSED
        .replace_all(source, "][]\n\n[")
        .into_owned()
}

struct Line<'a> {
    start: usize,
    text: &'a str,
    in_code: bool,
}

/// Splits source into lines, flagging those inside fenced or indented
/// code blocks.
///
/// A line indented four or more columns opens indented code only after a
/// blank line and outside a list, where the indentation belongs to the
/// item instead.
fn scan_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut fence: Option<(char, usize)> = None;
    let mut indented = false;
    let mut in_list = false;
    let mut prev_blank = true;
    let mut start = 0;

    for raw in source.split_inclusive('\n') {
        let text = raw.trim_end_matches('\n').trim_end_matches('\r');
        let blank = text.trim().is_empty();
        let indent = indent_width(text);

        let in_code = if let Some((ch, len)) = fence {
            if let Some((c, n, rest)) = fence_marker(text) {
                if c == ch && n >= len && rest.trim().is_empty() {
                    fence = None;
                }
            }
            true
        } else if indented && (blank || indent >= 4) {
            true
        } else if !blank && indent >= 4 && prev_blank && !in_list {
            indented = true;
            true
        } else if let Some((c, n, _)) = fence_marker(text) {
            indented = false;
            fence = Some((c, n));
            true
        } else {
            indented = false;
            false
        };

        if !in_code && !blank {
            in_list = LIST_ITEM.is_match(text) || (in_list && (!prev_blank || indent > 0));
        }
        prev_blank = blank;

        lines.push(Line {
            start,
            text,
            in_code,
        });
        start += raw.len();
    }

    lines
}

/// Leading indentation in columns, tabs advancing to the next stop of four.
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => break,
        }
    }
    width
}

/// Byte length of the parenthesized inline destination opening `rest`,
/// title included. `None` when the parentheses do not close on the line.
fn inline_destination_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let after_space = i > 0 && bytes[i - 1].is_ascii_whitespace();

        match (quote, b) {
            (_, b'\\') => i += 1,
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') if depth == 1 && after_space => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Recognizes a code fence line: up to three spaces, then three or more
/// backticks or tildes. Returns the fence char, run length and the rest.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    if len < 3 {
        return None;
    }
    Some((ch, len, &trimmed[len..]))
}

/// Byte ranges of inline code spans within a line.
fn code_spans(line: &str) -> Vec<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let open = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let width = i - open;

        let mut j = i;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let run = j;
            while j < bytes.len() && bytes[j] == b'`' {
                j += 1;
            }
            if j - run == width {
                spans.push((open, j));
                i = j;
                break;
            }
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_default(source: &str) -> String {
        expand(source, &RenderOptions::default()).expect("Should expand")
    }

    #[test]
    fn test_shortcut_reflink() {
        // Arrange
        let source = "[foo]\n\n[foo]: bar";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, "[foo](bar)\n\n[foo]: bar");
    }

    #[test]
    fn test_collapsed_reflink() {
        assert_eq!(expand_default("[foo][]\n\n[foo]: bar"), "[foo](bar)\n\n[foo]: bar");
    }

    #[test]
    fn test_full_reflink() {
        assert_eq!(
            expand_default("[foo][bar]\n\n[bar]: baz"),
            "[foo](baz)\n\n[bar]: baz"
        );
    }

    #[test]
    fn test_reflink_with_anchor() {
        assert_eq!(
            expand_default("[foo]{#zzz}\n\n[foo]: bar"),
            "[foo](bar#zzz)\n\n[foo]: bar"
        );
        assert_eq!(
            expand_default("[foo][bar]{#zzz}\n\n[bar]: baz"),
            "[foo](baz#zzz)\n\n[bar]: baz"
        );
    }

    #[test]
    fn test_reflink_with_path_fragment() {
        assert_eq!(
            expand_default("[docs]{/api}\n\n[docs]: https://example.com"),
            "[docs](https://example.com/api)\n\n[docs]: https://example.com"
        );
    }

    #[test]
    fn test_reflink_with_title() {
        assert_eq!(
            expand_default("[foo]\n\n[foo]: bar \"The Bar\""),
            "[foo](bar \"The Bar\")\n\n[foo]: bar \"The Bar\""
        );
    }

    #[test]
    fn test_image_reflink() {
        assert_eq!(
            expand_default("![logo]\n\n[logo]: logo.png"),
            "![logo](logo.png)\n\n[logo]: logo.png"
        );
    }

    #[test]
    fn test_context_reflinks() {
        // Arrange
        let options = RenderOptions::new().with_reflink("foo", " bar ");

        // Act
        let result = expand("[foo] whatever", &options).expect("Should expand");

        // Assert
        assert_eq!(result, "[foo](bar) whatever");
    }

    #[test]
    fn test_document_definition_wins_over_context() {
        // Arrange
        let options = RenderOptions::new().with_reflink("foo", "context");

        // Act
        let result = expand("[foo]\n\n[foo]: document", &options).expect("Should expand");

        // Assert
        assert!(result.starts_with("[foo](document)"), "Got: {}", result);
    }

    #[test]
    fn test_unresolved_label_untouched() {
        assert_eq!(expand_default("[nope] and [also][nope]"), "[nope] and [also][nope]");
    }

    #[test]
    fn test_inline_links_not_mistaken_for_reflinks() {
        // Arrange
        let source = "- [foo](foo.md)\n- [![img](a.svg)](b)\n\n[foo]: other";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, source, "Inline links should stay as written");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!(
            expand_default("[Foo Bar]\n\n[foo bar]: x"),
            "[Foo Bar](x)\n\n[foo bar]: x"
        );
    }

    #[test]
    fn test_code_is_not_rewritten() {
        // Arrange
        let source = "`[foo]` and\n\n```\n[foo]\n```\n\n[foo]: bar";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, source, "Code spans and fences should be left alone");
    }

    #[test]
    fn test_indented_code_is_not_rewritten() {
        // Arrange
        let source = "    indented [foo]\n\ntext [foo]\n\n[foo]: bar";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, "    indented [foo]\n\ntext [foo](bar)\n\n[foo]: bar");
    }

    #[test]
    fn test_list_continuation_is_not_code() {
        // Arrange
        let source = "1. a\n\n    see [foo]\n\n[foo]: bar";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, "1. a\n\n    see [foo](bar)\n\n[foo]: bar");
    }

    #[test]
    fn test_inline_destination_and_title_untouched() {
        // Arrange
        let source = "[a](http://x/[foo]) and [b](http://x \"see [foo]\") then [foo]\n\n[foo]: bar";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(
            result,
            "[a](http://x/[foo]) and [b](http://x \"see [foo]\") then [foo](bar)\n\n[foo]: bar"
        );
    }

    #[test]
    fn test_inline_destination_len() {
        assert_eq!(inline_destination_len("(a) b"), Some(3));
        assert_eq!(inline_destination_len("(a(b)c) d"), Some(7));
        assert_eq!(inline_destination_len("(a \"t)\")"), Some(8));
        assert_eq!(inline_destination_len("(it's) x"), Some(6));
        assert_eq!(inline_destination_len("(open"), None);
    }

    #[test]
    fn test_footnote_labels_skipped() {
        // Arrange
        let options = RenderOptions::new().with_reflink("^1", "nope");

        // Act
        let result = expand("text[^1]", &options).expect("Should expand");

        // Assert
        assert_eq!(result, "text[^1]");
    }

    #[test]
    fn test_adjacent_reflink_lines() {
        // Arrange
        let source = "[a]\n[b]\n\n[a]: x\n[b]: y";

        // Act
        let result = expand_default(source);

        // Assert
        assert_eq!(result, "[a](x)\n[b](y)\n\n[a]: x\n[b]: y");
    }

    #[test]
    fn test_separate_adjacent_collapsed() {
        assert_eq!(separate_collapsed("[a][]\n[b][]"), "[a][]\n\n[b][]");
        assert_eq!(separate_collapsed("[a][]  \n  [b]"), "[a][]\n\n[b]");
    }

    #[test]
    fn test_malformed_anchor_lenient() {
        assert_eq!(
            expand_default("[foo]{#zzz\n\n[foo]: bar"),
            "[foo]{#zzz\n\n[foo]: bar"
        );
    }

    #[test]
    fn test_malformed_anchor_strict() {
        // Arrange
        let options = RenderOptions::new().with_strict(true);

        // Act
        let result = expand("x\n[foo]{#zzz\n\n[foo]: bar", &options);

        // Assert
        assert_eq!(
            result,
            Err(Error::MalformedReflinkSyntax { line: 2, column: 6 })
        );
    }

    #[test]
    fn test_table_from_document() {
        // Arrange
        let source = "[a]: x\n  [B]: <y> 'title'\n```\n[c]: z\n```\n[^n]: note";

        // Act
        let table = ReflinkTable::from_document(source);

        // Assert
        assert_eq!(table.len(), 2, "Fenced and footnote definitions are skipped");
        assert_eq!(table.resolve("a"), Some(&Reflink::new("x")));
        let b = table.resolve("b").expect("Should resolve case insensitively");
        assert_eq!(b.url, "y");
        assert_eq!(b.title.as_deref(), Some("title"));
        assert!(table.resolve("c").is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        // Arrange
        let mut table = ReflinkTable::new();

        // Act
        let first = table.insert("foo", Reflink::new("one"));
        let second = table.insert("foo", Reflink::new("two"));

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(table.resolve("foo").map(|r| r.url.as_str()), Some("one"));
    }
}
