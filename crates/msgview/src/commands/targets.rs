//! `msgview targets` command implementation.

use std::sync::{Arc, Mutex};

use clap::Args;
use msgview_renderer::{Activation, Callbacks, InteractionRouter, Routed, render};

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the targets command.
#[derive(Args)]
pub(crate) struct TargetsArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Activate the target with this index (as listed) through the callbacks.
    #[arg(short, long)]
    activate: Option<usize>,
}

impl TargetsArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.source.load_config()?;
        let root = self.source.read_document(config.input.format)?;

        let events = Arc::new(Mutex::new(Vec::new()));
        let render_config = config.render_config().with_callbacks(recording_callbacks(&events));
        let result = render(&root, &render_config);
        let targets = result.activations();

        let listing: String = targets
            .iter()
            .enumerate()
            .map(|(index, target)| format!("[{index}] {}\n", describe(target)))
            .collect();
        if listing.is_empty() {
            output.info("No activation targets");
        } else {
            output.document(&listing)?;
        }

        let Some(index) = self.activate else {
            return Ok(());
        };
        let target = targets.get(index).ok_or_else(|| {
            CliError::Validation(format!(
                "No target with index {index} ({} available)",
                targets.len()
            ))
        })?;

        match InteractionRouter::new(&render_config.callbacks).route(target) {
            Routed::Delivered => {
                let delivered = events.lock().map(|events| events.join("\n")).unwrap_or_default();
                output.highlight(&format!("Delivered: {delivered}"));
            }
            Routed::PlatformDefault(url) => {
                output.highlight(&format!("Opening with platform default: {url}"));
            }
            Routed::Absorbed => output.info("No handler; activation absorbed"),
        }
        Ok(())
    }
}

/// Callbacks that record each activation as a line of text.
fn recording_callbacks(events: &Arc<Mutex<Vec<String>>>) -> Callbacks {
    let links = Arc::clone(events);
    let images = Arc::clone(events);
    let mentions = Arc::clone(events);
    Callbacks::default()
        .on_link(move |url| record(&links, format!("link {url}")))
        .on_image(move |image| {
            record(
                &images,
                format!("image {}", image.url.as_deref().unwrap_or_default()),
            );
        })
        .on_mention(move |mention| {
            record(
                &mentions,
                format!("mention @{} ({})", mention.display_name(), mention.id),
            );
        })
}

fn record(events: &Mutex<Vec<String>>, event: String) {
    if let Ok(mut events) = events.lock() {
        events.push(event);
    }
}

fn describe(target: &Activation) -> String {
    match target {
        Activation::Link { url } => format!("link {url}"),
        Activation::Image(image) => match (&image.url, &image.alt) {
            (Some(url), Some(alt)) if !alt.is_empty() => format!("image {url} \"{alt}\""),
            (Some(url), _) => format!("image {url}"),
            (None, _) => "image".to_owned(),
        },
        Activation::Mention(mention) => {
            format!("mention @{} ({})", mention.display_name(), mention.id)
        }
    }
}
