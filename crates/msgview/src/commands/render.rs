//! `msgview render` command implementation.

use clap::{Args, ValueEnum};
use msgview_renderer::{HtmlBackend, RenderResult, render};

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::terminal::TerminalEmitter;

/// Output formats for the render command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Standalone HTML page with the theme stylesheet.
    #[default]
    Html,
    /// HTML fragment without page chrome.
    Fragment,
    /// Styled text for the terminal.
    Terminal,
    /// Parsed document as JSON.
    Ast,
    /// View tree as JSON.
    View,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl RenderArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.source.load_config()?;
        let root = self.source.read_document(config.input.format)?;

        let render_config = config.render_config();
        let rendered = || {
            let result = render(&root, &render_config);
            report_warnings(&result, output);
            result
        };

        let text = match self.output {
            OutputFormat::Html => {
                let fragment = HtmlBackend::new().render(&rendered().blocks);
                HtmlBackend::document(&config.theme_resolved, &fragment)
            }
            OutputFormat::Fragment => HtmlBackend::new().render(&rendered().blocks),
            OutputFormat::Terminal => TerminalEmitter::new().render(&rendered().blocks),
            OutputFormat::Ast => root.to_json_pretty()?,
            OutputFormat::View => serde_json::to_string_pretty(&rendered().blocks)?,
        };
        output.document(&text)?;
        Ok(())
    }
}

fn report_warnings(result: &RenderResult, output: &Output) {
    for warning in &result.warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}
