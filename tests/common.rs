//! Shared test utilities for integration tests.
//!
//! Provides render shortcuts with a bare terminator, so expected strings
//! read like the markdown they describe, and scratch file helpers for the
//! command line tests.

#![allow(dead_code)]

use anyhow::Result;
use prettymd::{Newline, Prettifier, RenderOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// Options with no trailing terminator.
pub fn bare_options() -> RenderOptions {
    RenderOptions::new().with_newline(Newline::None)
}

/// Renders markdown with default options and no trailing terminator.
///
/// # Arguments
///
/// * `source`: Raw markdown
///
/// # Returns
///
/// Prettified markdown
///
/// # Errors
///
/// Returns error if rendering fails
pub fn render(source: &str) -> Result<String> {
    render_with(source, bare_options())
}

/// Renders markdown with the given options.
pub fn render_with(source: &str, options: RenderOptions) -> Result<String> {
    let prettifier = Prettifier::new().with_options(options);
    Ok(prettifier.render(source)?)
}

/// Writes `content` to `name` inside `dir` and returns the path.
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn write_markdown(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}
