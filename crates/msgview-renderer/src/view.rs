//! Host-agnostic view tree.
//!
//! A [`ViewNode`] says which visual primitive to build, with which resolved
//! style and data, in which order. Hosts turn it into native output through a
//! [`ViewEmitter`](crate::ViewEmitter).

use std::collections::BTreeMap;

use msgview_ast::{ImageNode, MentionNode};
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::style::{Anchor, BarStyle, BoxStyle, ImageBox, ResolvedStyle};

/// Tap target attached to a span or block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Activation {
    Link { url: String },
    Image(ImageNode),
    Mention(MentionNode),
}

/// Styled inline unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Span {
    pub content: SpanContent,
    pub style: ResolvedStyle,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub activation: Option<Activation>,
}

impl Span {
    /// Visible text of the span, if it has any.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            SpanContent::Text(text) | SpanContent::Code(text) | SpanContent::Emoji(text) => {
                Some(text)
            }
            SpanContent::Mention { label, .. } => Some(label),
            SpanContent::Math { content, .. } => Some(content),
            SpanContent::Image(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "value", rename_all = "lowercase")
)]
pub enum SpanContent {
    Text(String),
    /// Inline code; never split or reformatted.
    Code(String),
    /// `label` is the display text including the leading `@`.
    Mention { id: String, label: String },
    Math { content: String, display: bool },
    Emoji(String),
    Image(ImageView),
}

/// Image placement data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImageView {
    pub url: String,
    /// Empty when the document has none.
    pub alt: String,
    pub size: ImageBox,
    pub border_radius: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum ListMarker {
    Bullet,
    /// 1-based position within its list.
    Ordered { number: usize },
    Task { checked: bool },
}

impl ListMarker {
    /// Text drawn in front of the item.
    pub fn label(&self) -> String {
        match self {
            Self::Bullet => "•".to_owned(),
            Self::Ordered { number } => format!("{number}."),
            Self::Task { checked: true } => "☑".to_owned(),
            Self::Task { checked: false } => "☐".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ListItemView {
    pub marker: ListMarker,
    pub children: Vec<ViewNode>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TableRowView {
    pub header: bool,
    pub background: Option<String>,
    pub cells: Vec<TableCellView>,
    /// Whether a divider follows this row.
    pub divider_after: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TableCellView {
    pub anchor: Anchor,
    pub spans: Vec<Span>,
}

/// One rendered block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum ViewNode {
    Paragraph {
        spans: Vec<Span>,
    },
    Heading {
        level: u8,
        spans: Vec<Span>,
    },
    /// Preformatted text; hosts scroll it horizontally instead of wrapping.
    CodeBlock {
        language: Option<String>,
        content: String,
        style: ResolvedStyle,
        frame: BoxStyle,
    },
    List {
        ordered: bool,
        spacing: f32,
        items: Vec<ListItemView>,
    },
    Table {
        frame: BoxStyle,
        rows: Vec<TableRowView>,
    },
    Image {
        image: ImageView,
        activation: Activation,
    },
    /// Placement only; typesetting belongs to the host's math collaborator.
    Math {
        content: String,
        display: bool,
        style: ResolvedStyle,
    },
    /// Placement only; drawing belongs to the host's diagram collaborator.
    Diagram {
        content: String,
        style: ResolvedStyle,
    },
    Link {
        url: String,
        spans: Vec<Span>,
        activation: Activation,
    },
    Blockquote {
        bar: BarStyle,
        children: Vec<ViewNode>,
    },
    Rule {
        color: String,
    },
    Card {
        subtype: String,
        content: String,
        metadata: BTreeMap<String, String>,
        style: ResolvedStyle,
        frame: BoxStyle,
    },
    /// Run of inline nodes that appeared directly among blocks.
    Inline {
        spans: Vec<Span>,
    },
}

impl ViewNode {
    /// Visit every activation in document order.
    pub fn for_each_activation<'a>(&'a self, f: &mut impl FnMut(&'a Activation)) {
        match self {
            Self::Paragraph { spans }
            | Self::Heading { spans, .. }
            | Self::Inline { spans } => visit_spans(spans, f),
            Self::Link {
                activation, spans, ..
            } => {
                f(activation);
                visit_spans(spans, f);
            }
            Self::Image { activation, .. } => f(activation),
            Self::List { items, .. } => {
                for child in items.iter().flat_map(|item| &item.children) {
                    child.for_each_activation(f);
                }
            }
            Self::Table { rows, .. } => {
                for cell in rows.iter().flat_map(|row| &row.cells) {
                    visit_spans(&cell.spans, f);
                }
            }
            Self::Blockquote { children, .. } => {
                for child in children {
                    child.for_each_activation(f);
                }
            }
            Self::CodeBlock { .. }
            | Self::Math { .. }
            | Self::Diagram { .. }
            | Self::Rule { .. }
            | Self::Card { .. } => {}
        }
    }
}

fn visit_spans<'a>(spans: &'a [Span], f: &mut impl FnMut(&'a Activation)) {
    for activation in spans.iter().filter_map(|span| span.activation.as_ref()) {
        f(activation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_labels() {
        assert_eq!(ListMarker::Bullet.label(), "•");
        assert_eq!(ListMarker::Ordered { number: 3 }.label(), "3.");
        assert_eq!(ListMarker::Task { checked: true }.label(), "☑");
        assert_eq!(ListMarker::Task { checked: false }.label(), "☐");
    }
}
