//! Host-agnostic rendering of message documents.
//!
//! A [`RootNode`](msgview_ast::RootNode) goes through a single pass that
//! produces a tree of [`ViewNode`]s: abstract instructions saying which visual
//! primitive to build, with which resolved style, in which order. Hosts turn
//! the tree into native output through the [`ViewEmitter`] trait.
//!
//! # Architecture
//!
//! - [`StyleResolver`]: theme and node kind to a concrete [`ResolvedStyle`]
//! - [`InlineComposer`]: nested inline formatting to flat styled [`Span`]s
//! - [`BlockDispatcher`]: block nodes to view nodes, recursing into containers
//! - [`InteractionRouter`]: tap activations to host callbacks
//! - [`HtmlBackend`]: reference host producing semantic HTML5
//!
//! Rendering never fails. Unknown node kinds are skipped, missing data falls
//! back to theme defaults, and subtrees deeper than
//! [`RenderConfig::max_depth`] are dropped with a [`RenderWarning`].
//!
//! # Example
//!
//! ```
//! use msgview_ast::DocumentParser;
//! use msgview_parser::MarkdownParser;
//! use msgview_renderer::{HtmlBackend, RenderConfig, render};
//!
//! let root = MarkdownParser::new().parse("# Hello\n\n**Bold** text").unwrap();
//! let result = render(&root, &RenderConfig::default());
//! let html = HtmlBackend::new().render(&result.blocks);
//! assert!(html.starts_with("<h1>"));
//! ```

mod backend;
mod collab;
mod config;
mod dispatch;
mod html;
mod inline;
mod interaction;
mod style;
mod theme;
mod view;

pub use backend::{ViewEmitter, emit};
pub use collab::{CollaboratorError, DiagramRenderer, MathRenderer};
pub use config::{
    Callbacks, DEFAULT_MAX_DEPTH, ImageCallback, LinkCallback, MentionCallback, RenderConfig,
};
pub use dispatch::{BlockDispatcher, RenderResult, RenderWarning};
pub use html::{HtmlBackend, escape_html, stylesheet};
pub use inline::InlineComposer;
pub use interaction::{InteractionRouter, Routed};
pub use style::{
    Anchor, BarStyle, BoxStyle, ImageBox, ResolvedStyle, RowStyle, StyleResolver, StyleTarget,
    heading_color, heading_size, image_box, is_color, resolve, row_style,
};
pub use theme::{PRESETS, Theme};
pub use view::{
    Activation, ImageView, ListItemView, ListMarker, Span, SpanContent, TableCellView,
    TableRowView, ViewNode,
};

use msgview_ast::RootNode;

/// Render `root` under `config` in one pass.
pub fn render(root: &RootNode, config: &RenderConfig) -> RenderResult {
    BlockDispatcher::new(config).render(root)
}
