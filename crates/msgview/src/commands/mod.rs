//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod stylesheet;
pub(crate) mod targets;

use std::path::{Path, PathBuf};

use clap::Args;
use msgview_ast::RootNode;
use msgview_config::{CliSettings, Config};
use msgview_parser::InputFormat;

use crate::error::CliError;

pub(crate) use render::RenderArgs;
pub(crate) use stylesheet::StylesheetArgs;
pub(crate) use targets::TargetsArgs;

/// Document source and render settings shared by `render` and `targets`.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Document file, or `-` for stdin.
    file: PathBuf,

    /// Input format: markdown, delta or json (default: from file name, then config).
    #[arg(short, long)]
    input: Option<InputFormat>,

    /// Theme preset (overrides config).
    #[arg(short, long)]
    theme: Option<String>,

    /// Viewport width in logical points, 0 for unconstrained (overrides config).
    #[arg(long)]
    viewport_width: Option<f32>,

    /// Maximum nesting depth (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Path to configuration file (default: auto-discover msgview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl SourceArgs {
    /// Format to parse with: the flag, then a telling file name, then config.
    fn explicit_format(&self) -> Option<InputFormat> {
        self.input.or_else(|| {
            if is_stdin(&self.file) {
                return None;
            }
            self.file
                .file_name()
                .and_then(|name| name.to_str())
                .map(InputFormat::from_file_name)
                .filter(|format| *format != InputFormat::Markdown)
        })
    }

    /// Load config with this command's overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            theme: self.theme.clone(),
            viewport_width: self.viewport_width,
            max_depth: self.max_depth,
            input_format: self.explicit_format(),
        };
        Ok(Config::load(self.config.as_deref(), &cli_settings)?)
    }

    /// Read and parse the document.
    pub(crate) fn read_document(&self, format: InputFormat) -> Result<RootNode, CliError> {
        let text = if is_stdin(&self.file) {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(&self.file)?
        };
        tracing::info!(format = format.as_str(), bytes = text.len(), "Parsing document");
        Ok(format.parser().parse(&text)?)
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}
