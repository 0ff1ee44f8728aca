//! HTML output through comrak.
//!
//! Fenced code classes take the configured language prefix, and void
//! elements (`hr`, `br`, `img`) use the self-closing `<br />` form only when
//! XHTML output is requested.

use comrak::adapters::SyntaxHighlighterAdapter;
use comrak::html::{format_node_default, write_opening_tag};
use comrak::nodes::NodeValue;
use comrak::{Arena, Options, Plugins};
use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::{Error, Result};

comrak::create_formatter!(Html5Formatter, {
    NodeValue::ThematicBreak => |context, entering| {
        if entering {
            context.cr()?;
            context.write_all(b"<hr>\n")?;
        }
    },
    NodeValue::LineBreak => |context, entering| {
        if entering {
            context.write_all(b"<br>\n")?;
        }
    },
    NodeValue::Image(ref image) => |context, node, entering| {
        if entering {
            return format_node_default(context, node, entering);
        }
        if !image.title.is_empty() {
            context.write_all(b"\" title=\"")?;
            context.escape(image.title.as_bytes())?;
        }
        context.write_all(b"\">")?;
    },
});

/// Writes fenced code unhighlighted, renaming the `language-` class to the
/// configured prefix.
struct LangPrefix<'p> {
    prefix: &'p str,
}

impl SyntaxHighlighterAdapter for LangPrefix<'_> {
    fn write_highlighted(
        &self,
        output: &mut dyn Write,
        _lang: Option<&str>,
        code: &str,
    ) -> io::Result<()> {
        comrak::html::escape(output, code.as_bytes())
    }

    fn write_pre_tag(
        &self,
        output: &mut dyn Write,
        attributes: HashMap<String, String>,
    ) -> io::Result<()> {
        write_opening_tag(output, "pre", attributes)
    }

    fn write_code_tag(
        &self,
        output: &mut dyn Write,
        mut attributes: HashMap<String, String>,
    ) -> io::Result<()> {
        if let Some(class) = attributes.get_mut("class") {
            let renamed = class
                .strip_prefix("language-")
                .map(|lang| format!("{}{}", self.prefix, lang));
            if let Some(renamed) = renamed {
                *class = renamed;
            }
        }
        write_opening_tag(output, "code", attributes)
    }
}

/// Renders markdown to HTML, raw HTML passing through.
///
/// # Arguments
///
/// * `source`: Markdown, reflinks already expanded
/// * `options`: Parser options of the tokenizer, so both outputs agree on
///   extensions
/// * `xhtml_out`: Self-close void elements
/// * `lang_prefix`: Class prefix for fenced code languages
///
/// # Errors
///
/// Returns [`Error::Html`] if comrak fails to write the document
pub(crate) fn render_html(
    source: &str,
    options: &Options,
    xhtml_out: bool,
    lang_prefix: &str,
) -> Result<String> {
    let mut options = options.clone();
    options.render.unsafe_ = true;

    let arena = Arena::new();
    let root = comrak::parse_document(&arena, source, &options);

    let adapter = LangPrefix {
        prefix: lang_prefix,
    };
    let mut plugins = Plugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);

    let mut out = Vec::new();
    let written = if xhtml_out {
        comrak::format_html_with_plugins(root, &options, &mut out, &plugins)
    } else {
        Html5Formatter::format_document_with_plugins(root, &options, &mut out, &plugins)
    };
    written.map_err(|e| Error::Html(e.to_string()))?;

    String::from_utf8(out).map_err(|e| Error::Html(e.to_string()))
}
