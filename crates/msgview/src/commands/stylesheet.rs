//! `msgview stylesheet` command implementation.

use std::path::PathBuf;

use clap::Args;
use msgview_config::{CliSettings, Config};
use msgview_renderer::stylesheet;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the stylesheet command.
#[derive(Args)]
pub(crate) struct StylesheetArgs {
    /// Theme preset (overrides config).
    #[arg(short, long)]
    theme: Option<String>,

    /// Path to configuration file (default: auto-discover msgview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl StylesheetArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            theme: self.theme,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), &cli_settings)?;
        tracing::info!(preset = config.preset(), "Generating stylesheet");
        output.document(&stylesheet(&config.theme_resolved))?;
        Ok(())
    }
}
