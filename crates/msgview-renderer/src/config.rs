//! Per-render configuration.

use std::fmt;
use std::sync::Arc;

use msgview_ast::{ImageNode, MentionNode};

use crate::theme::Theme;

/// Default bound on document nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

pub type LinkCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub type ImageCallback = Arc<dyn Fn(&ImageNode) + Send + Sync>;
pub type MentionCallback = Arc<dyn Fn(&MentionNode) + Send + Sync>;

/// Host callbacks invoked when the user activates a span or block.
///
/// Every callback is optional. See [`InteractionRouter`](crate::InteractionRouter)
/// for what happens when one is missing.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_link_activate: Option<LinkCallback>,
    pub on_image_activate: Option<ImageCallback>,
    pub on_mention_activate: Option<MentionCallback>,
}

impl Callbacks {
    #[must_use]
    pub fn on_link(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_link_activate = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_image(mut self, callback: impl Fn(&ImageNode) + Send + Sync + 'static) -> Self {
        self.on_image_activate = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_mention(
        mut self,
        callback: impl Fn(&MentionNode) + Send + Sync + 'static,
    ) -> Self {
        self.on_mention_activate = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_link_activate", &self.on_link_activate.is_some())
            .field("on_image_activate", &self.on_image_activate.is_some())
            .field("on_mention_activate", &self.on_mention_activate.is_some())
            .finish()
    }
}

/// Immutable inputs for one render pass.
///
/// Shared by reference through the whole traversal and never mutated by it,
/// so one config can serve concurrent renders.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub theme: Theme,
    /// Available width in logical points; 0 means unconstrained.
    pub viewport_width: f32,
    pub callbacks: Callbacks,
    /// Subtrees nested deeper than this are dropped with a warning.
    pub max_depth: usize,
}

impl RenderConfig {
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            viewport_width: 0.0,
            callbacks: Callbacks::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_viewport_width(mut self, width: f32) -> Self {
        self.viewport_width = width.max(0.0);
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_debug_hides_closures() {
        let callbacks = Callbacks::default().on_link(|_| {});
        let debug = format!("{callbacks:?}");
        assert!(debug.contains("on_link_activate: true"));
        assert!(debug.contains("on_image_activate: false"));
    }

    #[test]
    fn test_negative_viewport_is_unconstrained() {
        let config = RenderConfig::default().with_viewport_width(-10.0);
        assert!(config.viewport_width.abs() < f32::EPSILON);
    }

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.theme, Theme::light());
    }
}
