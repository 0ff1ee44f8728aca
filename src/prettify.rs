//! Prettifier entry points.
//!
//! [`prettify`] wraps a tokenizer so that every render first expands
//! reflinks in the source, then tokenizes, then runs the rule dispatch
//! core over the tokens.

use tracing::debug;

use crate::error::{Error, Result};
use crate::html;
use crate::options::RenderOptions;
use crate::reflinks;
use crate::render::{Rendered, Renderer};
use crate::token::Token;
use crate::tokenize::{ComrakTokenizer, Tokenize};

/// Installs reflink expansion and the markdown rules around a tokenizer.
///
/// # Arguments
///
/// * `tokenizer`: Tokenizer producing the token stream to render
///
/// # Returns
///
/// Prettifier with default options
pub fn prettify<T: Tokenize>(tokenizer: T) -> Prettifier<T> {
    Prettifier {
        tokenizer,
        options: RenderOptions::default(),
    }
}

/// Renders markdown source back to canonical markdown.
pub struct Prettifier<T: Tokenize = ComrakTokenizer> {
    tokenizer: T,
    options: RenderOptions,
}

impl Prettifier<ComrakTokenizer> {
    /// Creates prettifier backed by the comrak tokenizer.
    pub fn new() -> Self {
        prettify(ComrakTokenizer::new())
    }

    /// Renders source to HTML.
    ///
    /// Reflinks are expanded first, so context supplied targets resolve the
    /// same way they do for markdown output. Fenced code classes use the
    /// configured language prefix and `xhtml_out` selects self-closing void
    /// elements.
    ///
    /// # Errors
    ///
    /// Returns error if reflink expansion fails in strict mode
    pub fn render_html(&self, source: &str) -> Result<String> {
        let expanded = self.expand(source)?;
        html::render_html(
            &expanded,
            self.tokenizer.options(),
            self.options.xhtml_out,
            &self.options.lang_prefix,
        )
    }
}

impl Default for Prettifier<ComrakTokenizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tokenize> Prettifier<T> {
    /// Replaces the render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Expands reflinks in `source` without rendering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReflinkSyntax`] in strict mode
    pub fn expand(&self, source: &str) -> Result<String> {
        reflinks::expand(source, &self.options)
    }

    /// Renders markdown source to prettified markdown.
    ///
    /// # Arguments
    ///
    /// * `source`: Raw markdown
    ///
    /// # Returns
    ///
    /// Prettified markdown ending with the configured terminator
    ///
    /// # Errors
    ///
    /// Returns error if tokenizing fails, or in strict mode on malformed
    /// reflinks and unknown tokens
    pub fn render(&self, source: &str) -> Result<String> {
        self.render_report(source).map(|rendered| rendered.text)
    }

    /// Renders raw bytes, rejecting input that is not UTF-8 before any
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for non UTF-8 input, otherwise the
    /// errors of [`Prettifier::render`]
    pub fn render_bytes(&self, input: &[u8]) -> Result<String> {
        let source = std::str::from_utf8(input)
            .map_err(|e| Error::InvalidArgument(format!("input is not valid UTF-8: {}", e)))?;
        self.render(source)
    }

    /// Renders source and reports the links, images and badges found.
    ///
    /// # Errors
    ///
    /// Same as [`Prettifier::render`]
    pub fn render_report(&self, source: &str) -> Result<Rendered> {
        let expanded = self.expand(source)?;
        let mut tokens = self.tokenizer.tokenize(&expanded)?;
        debug!(tokens = tokens.len(), "tokenized source");

        self.render_tokens(&mut tokens)
    }

    /// Renders an already tokenized stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTokenType`] in strict mode
    pub fn render_tokens(&self, tokens: &mut [Token]) -> Result<Rendered> {
        Renderer::new(&self.options).render(tokens)
    }
}
