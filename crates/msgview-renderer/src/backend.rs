//! Emitter trait for host-specific output.
//!
//! The [`emit`] driver walks the view tree and calls the emitter hooks in
//! document order, so every host sees the same sequence of primitives and only
//! decides how each one looks.

use std::collections::BTreeMap;

use crate::style::{BarStyle, BoxStyle, ResolvedStyle};
use crate::view::{
    Activation, ImageView, ListMarker, Span, TableCellView, TableRowView, ViewNode,
};

/// Leaf and container hooks a host implements.
///
/// Container hooks come in start/end pairs. Hooks with a default body are
/// optional for hosts that have nothing to draw there.
pub trait ViewEmitter {
    fn paragraph_start(&mut self) {}
    fn paragraph_end(&mut self) {}

    fn heading_start(&mut self, level: u8);
    fn heading_end(&mut self, level: u8);

    /// Inline run found directly among blocks.
    fn inline_start(&mut self) {}
    fn inline_end(&mut self) {}

    /// One styled inline unit.
    fn span(&mut self, span: &Span);

    /// Preformatted code. Hosts keep line breaks and scroll long lines.
    fn code_block(
        &mut self,
        language: Option<&str>,
        content: &str,
        style: &ResolvedStyle,
        frame: &BoxStyle,
    );

    fn list_start(&mut self, ordered: bool, spacing: f32);
    fn list_end(&mut self, ordered: bool);
    fn list_item_start(&mut self, marker: &ListMarker);
    fn list_item_end(&mut self) {}

    fn table_start(&mut self, frame: &BoxStyle);
    fn table_end(&mut self);
    fn table_row_start(&mut self, row: &TableRowView);
    fn table_row_end(&mut self, row: &TableRowView);
    fn table_cell_start(&mut self, cell: &TableCellView, header: bool);
    fn table_cell_end(&mut self, header: bool);

    fn image(&mut self, image: &ImageView, activation: &Activation);
    fn math(&mut self, content: &str, display: bool, style: &ResolvedStyle);
    fn diagram(&mut self, content: &str, style: &ResolvedStyle);

    fn link_start(&mut self, url: &str, activation: &Activation);
    fn link_end(&mut self);

    fn blockquote_start(&mut self, bar: &BarStyle);
    fn blockquote_end(&mut self);

    fn rule(&mut self, color: &str);

    fn card(
        &mut self,
        subtype: &str,
        content: &str,
        metadata: &BTreeMap<String, String>,
        style: &ResolvedStyle,
        frame: &BoxStyle,
    );
}

/// Drive `emitter` over `blocks` in document order.
pub fn emit<E: ViewEmitter + ?Sized>(blocks: &[ViewNode], emitter: &mut E) {
    for block in blocks {
        emit_node(block, emitter);
    }
}

fn emit_spans<E: ViewEmitter + ?Sized>(spans: &[Span], emitter: &mut E) {
    for span in spans {
        emitter.span(span);
    }
}

fn emit_node<E: ViewEmitter + ?Sized>(node: &ViewNode, emitter: &mut E) {
    match node {
        ViewNode::Paragraph { spans } => {
            emitter.paragraph_start();
            emit_spans(spans, emitter);
            emitter.paragraph_end();
        }
        ViewNode::Heading { level, spans } => {
            emitter.heading_start(*level);
            emit_spans(spans, emitter);
            emitter.heading_end(*level);
        }
        ViewNode::Inline { spans } => {
            emitter.inline_start();
            emit_spans(spans, emitter);
            emitter.inline_end();
        }
        ViewNode::CodeBlock {
            language,
            content,
            style,
            frame,
        } => emitter.code_block(language.as_deref(), content, style, frame),
        ViewNode::List {
            ordered,
            spacing,
            items,
        } => {
            emitter.list_start(*ordered, *spacing);
            for item in items {
                emitter.list_item_start(&item.marker);
                emit(&item.children, emitter);
                emitter.list_item_end();
            }
            emitter.list_end(*ordered);
        }
        ViewNode::Table { frame, rows } => {
            emitter.table_start(frame);
            for row in rows {
                emitter.table_row_start(row);
                for cell in &row.cells {
                    emitter.table_cell_start(cell, row.header);
                    emit_spans(&cell.spans, emitter);
                    emitter.table_cell_end(row.header);
                }
                emitter.table_row_end(row);
            }
            emitter.table_end();
        }
        ViewNode::Image { image, activation } => emitter.image(image, activation),
        ViewNode::Math {
            content,
            display,
            style,
        } => emitter.math(content, *display, style),
        ViewNode::Diagram { content, style } => emitter.diagram(content, style),
        ViewNode::Link {
            url,
            spans,
            activation,
        } => {
            emitter.link_start(url, activation);
            emit_spans(spans, emitter);
            emitter.link_end();
        }
        ViewNode::Blockquote { bar, children } => {
            emitter.blockquote_start(bar);
            emit(children, emitter);
            emitter.blockquote_end();
        }
        ViewNode::Rule { color } => emitter.rule(color),
        ViewNode::Card {
            subtype,
            content,
            metadata,
            style,
            frame,
        } => emitter.card(subtype, content, metadata, style, frame),
    }
}
