use anyhow::{Context, Result};
use prettymd::{Config, Error, Format, Prettifier, Rendered};
use std::fs;
use std::io::{self, Read, Write};
use tracing::info;

/// Reads the whole input, from stdin or the configured file.
///
/// # Errors
///
/// Returns error if reading fails or the input is not UTF-8.
fn read_input(config: &Config) -> Result<String> {
    let bytes = if config.reads_stdin() {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read(&config.input)
            .with_context(|| format!("Failed to read {}", config.input.display()))?
    };

    let source = String::from_utf8(bytes)
        .map_err(|e| Error::InvalidArgument(format!("input is not valid UTF-8: {}", e)))?;
    Ok(source)
}

/// Writes the result to the output file, or stdout.
fn write_output(config: &Config, output: &str) -> Result<()> {
    match &config.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
            fs::write(path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .context("Failed to write stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Prints collected links, images and badges to stderr, one per line.
fn print_report(rendered: &Rendered) {
    for link in &rendered.links {
        eprintln!("link\t{}", link.href);
    }
    for image in &rendered.images {
        eprintln!("image\t{}\t{}", image.src, image.alt);
    }
    for badge in &rendered.badges {
        eprintln!("badge\t{}\t{}", badge.href, badge.src);
    }
    eprintln!(
        "{} links, {} images, {} badges",
        rendered.links.len(),
        rendered.images.len(),
        rendered.badges.len()
    );
}

fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    config.validate().context("Invalid configuration")?;
    let options = config
        .render_options()
        .context("Invalid render options")?;

    let source = read_input(&config)?;
    let prettifier = Prettifier::new().with_options(options);

    let output = match config.format {
        Format::Markdown => {
            let rendered = prettifier
                .render_report(&source)
                .context("Failed to render markdown")?;
            if config.links {
                print_report(&rendered);
            }
            rendered.text
        }
        Format::Html => prettifier
            .render_html(&source)
            .context("Failed to render HTML")?,
        Format::Expand => prettifier
            .expand(&source)
            .context("Failed to expand reflinks")?,
    };

    write_output(&config, &output)
}
