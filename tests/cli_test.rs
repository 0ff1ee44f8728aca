//! End to end tests for the prettymd binary.
//!
//! Runs the built executable against scratch files and checks output files,
//! stdout and exit status.

mod common;

use anyhow::Result;
use common::write_markdown;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn prettymd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_prettymd"))
}

#[test]
fn test_prettifies_file_to_stdout() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "README.md", "# foo\nbar\n\n\n\n- a\n- b\n")?;

    // Act
    let output = prettymd().arg(&input).output()?;

    // Assert
    assert!(output.status.success(), "Command should succeed");
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "# foo\n\nbar\n\n* a\n* b\n"
    );
    Ok(())
}

#[test]
fn test_writes_output_file() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "[foo]\n\n[foo]: bar\n")?;
    let target = dir.path().join("out").join("pretty.md");

    // Act
    let status = prettymd()
        .arg(&input)
        .arg("-o")
        .arg(&target)
        .arg("--no-newline")
        .status()?;

    // Assert
    assert!(status.success(), "Command should succeed");
    assert_eq!(fs::read_to_string(&target)?, "[foo](bar)");
    Ok(())
}

#[test]
fn test_reflink_flag_supplies_targets() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "[foo] whatever\n")?;

    // Act
    let output = prettymd()
        .arg(&input)
        .args(["--reflink", "foo=https://example.com"])
        .output()?;

    // Assert
    assert!(output.status.success(), "Command should succeed");
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "[foo](https://example.com) whatever\n"
    );
    Ok(())
}

#[test]
fn test_expand_format_keeps_layout() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "- [foo]\n\n\n[foo]: bar\n")?;

    // Act
    let output = prettymd()
        .arg(&input)
        .args(["--format", "expand"])
        .output()?;

    // Assert
    assert!(output.status.success(), "Command should succeed");
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "- [foo](bar)\n\n\n[foo]: bar\n"
    );
    Ok(())
}

#[test]
fn test_html_format() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "# Title\n")?;

    // Act
    let output = prettymd()
        .arg(&input)
        .args(["--format", "html"])
        .output()?;

    // Assert
    assert!(output.status.success(), "Command should succeed");
    assert!(String::from_utf8(output.stdout)?.contains("<h1>Title</h1>"));
    Ok(())
}

#[test]
fn test_links_report_on_stderr() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "[a](x) ![i](y.png)\n")?;

    // Act
    let output = prettymd().arg(&input).arg("--links").output()?;

    // Assert
    let stderr = String::from_utf8(output.stderr)?;
    assert!(output.status.success(), "Command should succeed");
    assert!(stderr.contains("link\tx"), "Got: {}", stderr);
    assert!(stderr.contains("1 links, 1 images, 0 badges"), "Got: {}", stderr);
    Ok(())
}

#[test]
fn test_strict_mode_fails_on_malformed_anchor() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = write_markdown(dir.path(), "in.md", "[foo]{#bar\n\n[foo]: x\n")?;

    // Act
    let output = prettymd().arg(&input).arg("--strict").output()?;

    // Assert
    assert!(!output.status.success(), "Strict mode should fail");
    assert!(String::from_utf8(output.stdout)?.is_empty(), "No partial output");
    Ok(())
}

#[test]
fn test_missing_input_fails() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;

    // Act
    let output = prettymd().arg(dir.path().join("missing.md")).output()?;

    // Assert
    assert!(!output.status.success(), "Missing input should fail");
    Ok(())
}

#[test]
fn test_non_utf8_input_rejected() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let input = dir.path().join("bad.md");
    fs::write(&input, [0x66u8, 0xff, 0xfe])?;

    // Act
    let output = prettymd().arg(&input).output()?;

    // Assert
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "Invalid UTF-8 should fail");
    assert!(stderr.contains("invalid argument"), "Got: {}", stderr);
    Ok(())
}
