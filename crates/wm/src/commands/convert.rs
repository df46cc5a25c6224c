//! `wm convert` command implementation.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use wm_config::{CliSettings, Config};
use wm_renderer::{Converter, Rendered, TocSource};

use crate::error::CliError;
use crate::output::Output;
use crate::settings::settings_from_config;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markup file to convert, or `-` for stdin.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover wikimark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the safe preset for untrusted input (overrides config).
    #[arg(long)]
    safe: bool,

    /// Drop HTML comments (overrides config).
    #[arg(long)]
    no_comments: bool,

    /// Add rel="nofollow" to external links (overrides config).
    #[arg(long)]
    nofollow: bool,

    /// Print collected links, images and headings to stderr.
    #[arg(long)]
    summary: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or input cannot be read, or if a
    /// handler chain is broken.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            safe_mode: self.safe.then_some(true),
            pass_comments: self.no_comments.then_some(false),
            force_nofollow: self.nofollow.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Using config file");
        }

        let text = read_input(&self.input)?;
        let converter = Converter::new(settings_from_config(&config));
        let rendered = converter.process(&text)?;
        tracing::info!(
            links = rendered.summary.links.len(),
            images = rendered.summary.images.len(),
            headings = rendered.toc.len(),
            "Converted"
        );

        write_html(&mut std::io::stdout().lock(), &rendered)?;
        if self.summary {
            print_summary(&Output::stderr(), &rendered);
        }
        Ok(())
    }
}

fn read_input(input: &Path) -> Result<String, CliError> {
    let result = if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        std::fs::read_to_string(input)
    };
    result.map_err(|source| CliError::Input {
        path: input.display().to_string(),
        source,
    })
}

fn write_html(out: &mut impl Write, rendered: &Rendered) -> Result<(), CliError> {
    if !rendered.html.is_empty() {
        writeln!(out, "{}", rendered.html)?;
    }
    out.flush()?;
    Ok(())
}

fn print_summary(output: &Output, rendered: &Rendered) {
    output.section("Links");
    for link in &rendered.summary.links {
        output.item(0, link);
    }
    output.section("Images");
    for image in &rendered.summary.images {
        output.item(0, image);
    }
    output.section("Headings");
    for entry in &rendered.toc {
        let title = entry.title.as_deref().unwrap_or("");
        let source = match entry.source {
            TocSource::Html => "html",
            TocSource::Surrounded => "markup",
        };
        output.item(
            usize::from(entry.level.saturating_sub(1)),
            &format!("h{} {title} ({source})", entry.level),
        );
    }
}
