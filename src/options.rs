//! Render options shared by the expander, the dispatch core and the CLI.

use std::collections::BTreeMap;

/// Terminator appended to rendered output after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Newline {
    /// Single `\n`.
    #[default]
    Lf,
    /// Nothing is appended.
    None,
    /// Caller supplied literal.
    Literal(String),
}

impl Newline {
    /// Returns the terminator text.
    pub fn as_str(&self) -> &str {
        match self {
            Newline::Lf => "\n",
            Newline::None => "",
            Newline::Literal(s) => s,
        }
    }
}

/// Options controlling a render pass.
///
/// All fields are optional in spirit; `Default` gives the canonical
/// behavior: condensed blank lines, a trailing `\n`, no injected reflinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Collapse runs of blank lines down to one.
    pub condense: bool,
    /// Trailing terminator.
    pub newline: Newline,
    /// Reflink targets for labels not defined in the document.
    pub reflinks: BTreeMap<String, String>,
    /// Self-closing tag style for generated HTML.
    pub xhtml_out: bool,
    /// Class prefix for fenced code languages in HTML output.
    pub lang_prefix: String,
    /// Author username, used to spot byline bullets.
    pub username: Option<String>,
    /// Author display name, used to spot byline bullets.
    pub name: Option<String>,
    /// Fail on unknown tokens and malformed reflinks instead of passing them through.
    pub strict: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            condense: true,
            newline: Newline::Lf,
            reflinks: BTreeMap::new(),
            xhtml_out: false,
            lang_prefix: "language-".to_string(),
            username: None,
            name: None,
            strict: false,
        }
    }
}

impl RenderOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reflink target for `label`.
    pub fn with_reflink(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.reflinks.insert(label.into(), target.into());
        self
    }

    /// Sets the trailing terminator.
    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    /// Enables or disables blank line condensing.
    pub fn with_condense(mut self, condense: bool) -> Self {
        self.condense = condense;
        self
    }

    /// Sets the author identity used by the byline bullet heuristic.
    pub fn with_author(mut self, username: Option<String>, name: Option<String>) -> Self {
        self.username = username.filter(|s| !s.is_empty());
        self.name = name.filter(|s| !s.is_empty());
        self
    }

    /// Enables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        // Arrange & Act
        let options = RenderOptions::default();

        // Assert
        assert!(options.condense, "Condensing should be on by default");
        assert_eq!(options.newline.as_str(), "\n");
        assert!(options.reflinks.is_empty());
        assert_eq!(options.lang_prefix, "language-");
        assert!(!options.strict);
    }

    #[test]
    fn test_newline_variants() {
        assert_eq!(Newline::Lf.as_str(), "\n");
        assert_eq!(Newline::None.as_str(), "");
        assert_eq!(Newline::Literal("\r\n".to_string()).as_str(), "\r\n");
    }

    #[test]
    fn test_with_author_drops_empty_values() {
        // Arrange
        let options = RenderOptions::new();

        // Act
        let options = options.with_author(Some(String::new()), Some("Jon".to_string()));

        // Assert
        assert_eq!(options.username, None, "Empty username should be ignored");
        assert_eq!(options.name.as_deref(), Some("Jon"));
    }

    #[test]
    fn test_builder_chain() {
        // Arrange & Act
        let options = RenderOptions::new()
            .with_reflink("foo", "https://example.com")
            .with_newline(Newline::None)
            .with_condense(false)
            .with_strict(true);

        // Assert
        assert_eq!(
            options.reflinks.get("foo").map(String::as_str),
            Some("https://example.com")
        );
        assert_eq!(options.newline, Newline::None);
        assert!(!options.condense);
        assert!(options.strict);
    }
}
