//! Terminal host: view tree to styled plain text.

use std::collections::BTreeMap;

use console::Style;
use msgview_renderer::{
    Activation, BarStyle, BoxStyle, ImageView, ListMarker, ResolvedStyle, Span, SpanContent,
    TableCellView, TableRowView, ViewEmitter, ViewNode, emit,
};

/// Emits text with ANSI styling.
///
/// Containers whose children need prefixing (blockquotes, table cells) render
/// into a nested buffer that is folded into its parent when they close.
pub(crate) struct TerminalEmitter {
    color: bool,
    buffers: Vec<String>,
    lists: Vec<bool>,
    row: Vec<String>,
}

impl TerminalEmitter {
    /// Emitter that styles output when the terminal supports colors.
    pub(crate) fn new() -> Self {
        Self::with_color(console::colors_enabled())
    }

    pub(crate) fn with_color(color: bool) -> Self {
        Self {
            color,
            buffers: vec![String::new()],
            lists: Vec::new(),
            row: Vec::new(),
        }
    }

    pub(crate) fn render(mut self, blocks: &[ViewNode]) -> String {
        emit(blocks, &mut self);
        let mut out = self.buffers.concat();
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }

    fn current(&mut self) -> &mut String {
        if self.buffers.is_empty() {
            self.buffers.push(String::new());
        }
        let last = self.buffers.len() - 1;
        &mut self.buffers[last]
    }

    fn write(&mut self, text: &str) {
        self.current().push_str(text);
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.color {
            style.apply_to(text).to_string()
        } else {
            text.to_owned()
        }
    }

    fn span_style(style: &ResolvedStyle) -> Style {
        let mut console_style = Style::new();
        if style.bold {
            console_style = console_style.bold();
        }
        if style.italic {
            console_style = console_style.italic();
        }
        if style.underline {
            console_style = console_style.underlined();
        }
        if style.strikethrough {
            console_style = console_style.strikethrough();
        }
        if style.monospace {
            console_style = console_style.cyan();
        }
        console_style
    }

    /// End a block: one newline inside lists, a blank line elsewhere.
    fn end_block(&mut self) {
        let separator = if self.lists.is_empty() { "\n\n" } else { "\n" };
        self.write(separator);
    }

    fn push_buffer(&mut self) {
        self.buffers.push(String::new());
    }

    fn pop_buffer(&mut self) -> String {
        if self.buffers.len() > 1 {
            self.buffers.pop().unwrap_or_default()
        } else {
            String::new()
        }
    }
}

impl ViewEmitter for TerminalEmitter {
    fn paragraph_end(&mut self) {
        self.end_block();
    }

    fn heading_start(&mut self, level: u8) {
        let marks = "#".repeat(usize::from(level.max(1)));
        let marks = self.paint(&Style::new().bold(), &marks);
        self.write(&marks);
        self.write(" ");
    }

    fn heading_end(&mut self, _level: u8) {
        self.end_block();
    }

    fn inline_end(&mut self) {
        self.end_block();
    }

    fn span(&mut self, span: &Span) {
        let mut style = Self::span_style(&span.style);
        let text = match &span.content {
            SpanContent::Text(text) | SpanContent::Code(text) | SpanContent::Emoji(text) => {
                text.clone()
            }
            SpanContent::Mention { label, .. } => {
                style = style.blue().bold();
                label.clone()
            }
            SpanContent::Math { content, .. } => content.clone(),
            SpanContent::Image(image) => image_label(image),
        };
        if matches!(span.activation, Some(Activation::Link { .. })) {
            style = style.blue().underlined();
        }
        let painted = self.paint(&style, &text);
        self.write(&painted);
    }

    fn code_block(
        &mut self,
        language: Option<&str>,
        content: &str,
        _style: &ResolvedStyle,
        _frame: &BoxStyle,
    ) {
        let dim = Style::new().dim();
        let fence = format!("```{}", language.unwrap_or_default());
        let fence = self.paint(&dim, &fence);
        self.write(&fence);
        self.write("\n");
        let code = self.paint(&Style::new().cyan(), content);
        self.write(&code);
        let close = self.paint(&dim, "```");
        self.write("\n");
        self.write(&close);
        self.end_block();
    }

    fn list_start(&mut self, ordered: bool, _spacing: f32) {
        self.lists.push(ordered);
    }

    fn list_end(&mut self, _ordered: bool) {
        self.lists.pop();
        if self.lists.is_empty() {
            self.write("\n");
        }
    }

    fn list_item_start(&mut self, marker: &ListMarker) {
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        self.write(&indent);
        self.write(&marker.label());
        self.write(" ");
    }

    fn table_start(&mut self, _frame: &BoxStyle) {}

    fn table_end(&mut self) {
        self.write("\n");
    }

    fn table_row_start(&mut self, _row: &TableRowView) {
        self.row.clear();
    }

    fn table_row_end(&mut self, row: &TableRowView) {
        let line = format!("| {} |\n", self.row.join(" | "));
        self.write(&line);
        if row.header {
            let divider = format!("|{}|\n", vec!["---"; self.row.len()].join("|"));
            self.write(&divider);
        }
    }

    fn table_cell_start(&mut self, _cell: &TableCellView, _header: bool) {
        self.push_buffer();
    }

    fn table_cell_end(&mut self, _header: bool) {
        let cell = self.pop_buffer();
        self.row.push(cell);
    }

    fn image(&mut self, image: &ImageView, _activation: &Activation) {
        let label = self.paint(&Style::new().magenta(), &image_label(image));
        self.write(&label);
        self.end_block();
    }

    fn math(&mut self, content: &str, display: bool, _style: &ResolvedStyle) {
        let text = if display {
            format!("$$ {content} $$")
        } else {
            format!("$ {content} $")
        };
        let painted = self.paint(&Style::new().italic(), &text);
        self.write(&painted);
        self.end_block();
    }

    fn diagram(&mut self, content: &str, _style: &ResolvedStyle) {
        let header = self.paint(&Style::new().dim(), "[diagram]");
        self.write(&header);
        self.write("\n");
        self.write(content);
        self.end_block();
    }

    fn link_start(&mut self, _url: &str, _activation: &Activation) {}

    fn link_end(&mut self) {
        self.end_block();
    }

    fn blockquote_start(&mut self, _bar: &BarStyle) {
        self.push_buffer();
    }

    fn blockquote_end(&mut self) {
        let inner = self.pop_buffer();
        let bar = self.paint(&Style::new().dim(), "│");
        let mut quoted = String::new();
        for line in inner.trim_end().lines() {
            quoted.push_str(&bar);
            if !line.is_empty() {
                quoted.push(' ');
                quoted.push_str(line);
            }
            quoted.push('\n');
        }
        self.write(&quoted);
        self.end_block();
    }

    fn rule(&mut self, _color: &str) {
        let rule = self.paint(&Style::new().dim(), &"─".repeat(40));
        self.write(&rule);
        self.end_block();
    }

    fn card(
        &mut self,
        subtype: &str,
        content: &str,
        metadata: &BTreeMap<String, String>,
        _style: &ResolvedStyle,
        _frame: &BoxStyle,
    ) {
        let header = self.paint(&Style::new().bold(), &format!("[{subtype}]"));
        self.write(&header);
        self.write(" ");
        self.write(content);
        for (key, value) in metadata {
            let line = format!("\n  {key}: {value}");
            self.write(&line);
        }
        self.end_block();
    }
}

fn image_label(image: &ImageView) -> String {
    if image.alt.is_empty() {
        format!("[image: {}]", image.url)
    } else {
        format!("[image: {}]", image.alt)
    }
}
