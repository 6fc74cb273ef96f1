//! Routing of user activations to host callbacks.

use crate::config::Callbacks;
use crate::view::Activation;

/// Outcome of routing one activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    /// The matching callback was invoked.
    Delivered,
    /// No link callback; the host should open the URL its default way.
    PlatformDefault(String),
    /// No callback for an image or mention; nothing happens.
    Absorbed,
}

/// Dispatches activations to the configured callbacks.
///
/// Holds no state of its own, so it can be built per event.
#[derive(Clone, Copy, Debug)]
pub struct InteractionRouter<'a> {
    callbacks: &'a Callbacks,
}

impl<'a> InteractionRouter<'a> {
    pub fn new(callbacks: &'a Callbacks) -> Self {
        Self { callbacks }
    }

    pub fn route(&self, activation: &Activation) -> Routed {
        match activation {
            Activation::Link { url } => match &self.callbacks.on_link_activate {
                Some(callback) => {
                    callback(url.as_str());
                    Routed::Delivered
                }
                None => Routed::PlatformDefault(url.clone()),
            },
            Activation::Image(image) => match &self.callbacks.on_image_activate {
                Some(callback) => {
                    callback(image);
                    Routed::Delivered
                }
                None => Routed::Absorbed,
            },
            Activation::Mention(mention) => match &self.callbacks.on_mention_activate {
                Some(callback) => {
                    callback(mention);
                    Routed::Delivered
                }
                None => Routed::Absorbed,
            },
        }
    }
}
