//! Markdown rendering from a token stream.
//!
//! This module holds the rule dispatch core and the per-kind rules it
//! delegates to: blocks and inline marks, lists, tables, and the
//! link/image/badge classifier. State for one pass lives in a
//! [`RenderContext`] owned by the [`Renderer`].

mod blocks;
mod context;
mod dispatch;
mod links;
mod lists;
mod tables;

pub use context::{Badge, Image, Link, RenderContext, Rendered};
pub use dispatch::Renderer;
