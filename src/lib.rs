//! Markdown prettifier.
//!
//! Renders a markdown token stream back to canonical markdown through a
//! per-kind rule table, after rewriting reference-style links in the
//! source into inline links.

mod config;
mod error;
mod html;
mod options;
mod prettify;
mod reflinks;
mod render;
mod token;
mod tokenize;
mod util;

pub use config::{Config, Format};
pub use error::{Error, Result};
pub use options::{Newline, RenderOptions};
pub use prettify::{Prettifier, prettify};
pub use reflinks::{Reflink, ReflinkTable, expand, separate_collapsed};
pub use render::{Badge, Image, Link, RenderContext, Rendered, Renderer};
pub use token::{Align, Token, TokenKind};
pub use tokenize::{ComrakTokenizer, Tokenize};
pub use util::condense_newlines;
