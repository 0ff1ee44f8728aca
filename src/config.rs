//! Command line configuration.

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::options::{Newline, RenderOptions};

/// Output produced by the command line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Prettified markdown
    Markdown,
    /// HTML
    Html,
    /// Source with reflinks expanded, nothing else changed
    Expand,
}

/// Command line configuration for prettymd.
#[derive(Debug, Clone, Parser)]
#[command(name = "prettymd", version, about, long_about = None)]
pub struct Config {
    /// Input markdown file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep runs of blank lines instead of condensing them
    #[arg(long)]
    pub no_condense: bool,

    /// Trailing terminator appended after trimming
    #[arg(long, conflicts_with = "no_newline")]
    pub newline: Option<String>,

    /// Append no trailing terminator
    #[arg(long)]
    pub no_newline: bool,

    /// Reflink target for labels the document does not define (LABEL=URL)
    #[arg(long = "reflink", value_name = "LABEL=URL")]
    pub reflinks: Vec<String>,

    /// Author username, marks byline bullets linking to the profile
    #[arg(long)]
    pub username: Option<String>,

    /// Author display name, marks byline bullets following it
    #[arg(long)]
    pub name: Option<String>,

    /// Self closing tags in generated HTML
    #[arg(long)]
    pub xhtml: bool,

    /// Class prefix for fenced code languages in HTML output
    #[arg(long, default_value = "language-")]
    pub lang_prefix: String,

    /// Fail on unknown tokens and malformed reflinks
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    pub format: Format,

    /// Print collected links, images and badges to stderr
    #[arg(long)]
    pub links: bool,

    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Returns true when input comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input file does not exist or a reflink is not
    /// written as `LABEL=URL`.
    pub fn validate(&self) -> Result<()> {
        if !self.reads_stdin() && !self.input.exists() {
            bail!("Input file does not exist: {}", self.input.display());
        }

        for reflink in &self.reflinks {
            parse_reflink(reflink)?;
        }

        Ok(())
    }

    /// Builds render options from the flags.
    ///
    /// # Errors
    ///
    /// Returns error if a reflink is not written as `LABEL=URL`.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let newline = match (&self.newline, self.no_newline) {
            (_, true) => Newline::None,
            (Some(newline), false) => Newline::Literal(unescape(newline)),
            (None, false) => Newline::Lf,
        };

        let mut options = RenderOptions::new()
            .with_condense(!self.no_condense)
            .with_newline(newline)
            .with_author(self.username.clone(), self.name.clone())
            .with_strict(self.strict);

        for reflink in &self.reflinks {
            let (label, url) = parse_reflink(reflink)?;
            options = options.with_reflink(label, url);
        }

        options.xhtml_out = self.xhtml;
        options.lang_prefix = self.lang_prefix.clone();

        Ok(options)
    }
}

/// Splits `LABEL=URL` at the first `=`.
fn parse_reflink(value: &str) -> Result<(&str, &str)> {
    match value.split_once('=') {
        Some((label, url)) if !label.trim().is_empty() && !url.trim().is_empty() => {
            Ok((label.trim(), url.trim()))
        }
        _ => bail!("Reflink must be written as LABEL=URL: {}", value),
    }
}

/// Turns `\n`, `\r` and `\t` escapes typed on the command line into the
/// characters they name.
fn unescape(value: &str) -> String {
    value
        .replace("\\r", "\r")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}
