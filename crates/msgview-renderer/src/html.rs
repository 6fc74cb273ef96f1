//! HTML host.
//!
//! Turns a view tree into semantic HTML5. Resolved styles go inline on each
//! element so a fragment looks right without the stylesheet; [`stylesheet`]
//! covers the page chrome for full documents.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::backend::{ViewEmitter, emit};
use crate::collab::{DiagramRenderer, MathRenderer};
use crate::style::{Anchor, BarStyle, BoxStyle, ResolvedStyle};
use crate::theme::Theme;
use crate::view::{
    Activation, ImageView, ListMarker, Span, SpanContent, TableCellView, TableRowView, ViewNode,
};

/// HTML emitter with optional math and diagram collaborators.
#[derive(Default)]
pub struct HtmlBackend {
    out: String,
    math: Option<Box<dyn MathRenderer>>,
    diagrams: Option<Box<dyn DiagramRenderer>>,
    /// Inside a link block, spans must not open their own anchors.
    in_link: bool,
}

impl HtmlBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_math_renderer(mut self, renderer: impl MathRenderer + 'static) -> Self {
        self.math = Some(Box::new(renderer));
        self
    }

    #[must_use]
    pub fn with_diagram_renderer(mut self, renderer: impl DiagramRenderer + 'static) -> Self {
        self.diagrams = Some(Box::new(renderer));
        self
    }

    /// Render `blocks` to an HTML fragment.
    ///
    /// The backend can be reused; each call starts from an empty buffer.
    pub fn render(&mut self, blocks: &[ViewNode]) -> String {
        self.out.clear();
        self.in_link = false;
        emit(blocks, self);
        std::mem::take(&mut self.out)
    }

    /// Wrap a fragment into a standalone page styled for `theme`.
    #[must_use]
    pub fn document(theme: &Theme, fragment: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <style>\n{}</style>\n</head>\n<body>\n<div class=\"content\">\n{fragment}</div>\n</body>\n</html>\n",
            stylesheet(theme)
        )
    }

    fn span_html(&mut self, span: &Span) {
        let inner = match &span.content {
            SpanContent::Text(text) | SpanContent::Emoji(text) => escape_html(text),
            SpanContent::Code(code) => format!("<code>{}</code>", escape_html(code)),
            SpanContent::Mention { id, label } => format!(
                r#"<span class="mention" data-id="{}">{}</span>"#,
                escape_html(id),
                escape_html(label)
            ),
            SpanContent::Math { content, display } => self.math_html(content, *display),
            SpanContent::Image(image) => image_html(image),
        };
        let mut html = format!(r#"<span style="{}">{inner}</span>"#, inline_style(&span.style));
        if span.style.strikethrough {
            html = format!("<s>{html}</s>");
        }
        if span.style.underline {
            html = format!("<u>{html}</u>");
        }
        if span.style.italic {
            html = format!("<em>{html}</em>");
        }
        if span.style.bold {
            html = format!("<strong>{html}</strong>");
        }
        if !self.in_link
            && let Some(Activation::Link { url }) = &span.activation
        {
            html = format!(r#"<a href="{}">{html}</a>"#, escape_html(url));
        }
        self.out.push_str(&html);
    }

    fn math_html(&self, tex: &str, display: bool) -> String {
        if let Some(renderer) = &self.math {
            match renderer.render_math(tex, display) {
                Ok(markup) => return markup,
                Err(e) => tracing::warn!(error = %e, "Math collaborator failed, emitting source"),
            }
        }
        if display {
            format!(r#"<div class="math-display">\[{}\]</div>"#, escape_html(tex))
        } else {
            format!(r#"<span class="math-inline">\({}\)</span>"#, escape_html(tex))
        }
    }
}

impl ViewEmitter for HtmlBackend {
    fn paragraph_start(&mut self) {
        self.out.push_str("<p>");
    }

    fn paragraph_end(&mut self) {
        self.out.push_str("</p>\n");
    }

    fn heading_start(&mut self, level: u8) {
        write!(self.out, "<h{}>", level.clamp(1, 6)).unwrap();
    }

    fn heading_end(&mut self, level: u8) {
        writeln!(self.out, "</h{}>", level.clamp(1, 6)).unwrap();
    }

    fn inline_start(&mut self) {
        self.out.push_str(r#"<div class="inline">"#);
    }

    fn inline_end(&mut self) {
        self.out.push_str("</div>\n");
    }

    fn span(&mut self, span: &Span) {
        self.span_html(span);
    }

    fn code_block(
        &mut self,
        language: Option<&str>,
        content: &str,
        style: &ResolvedStyle,
        frame: &BoxStyle,
    ) {
        write!(self.out, r#"<pre style="{}">"#, box_style(frame)).unwrap();
        let class = language
            .map(|lang| format!(r#" class="language-{}""#, escape_html(lang)))
            .unwrap_or_default();
        write!(self.out, r#"<code{class} style="{}">"#, inline_style(style)).unwrap();
        writeln!(self.out, "{}</code></pre>", escape_html(content)).unwrap();
    }

    fn list_start(&mut self, ordered: bool, spacing: f32) {
        let tag = if ordered { "ol" } else { "ul" };
        writeln!(self.out, r#"<{tag} style="--item-spacing: {spacing}px">"#).unwrap();
    }

    fn list_end(&mut self, ordered: bool) {
        self.out.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
    }

    fn list_item_start(&mut self, marker: &ListMarker) {
        match marker {
            ListMarker::Bullet => self.out.push_str("<li>"),
            ListMarker::Ordered { number } => write!(self.out, r#"<li value="{number}">"#).unwrap(),
            ListMarker::Task { checked } => {
                let checked = if *checked { " checked" } else { "" };
                write!(
                    self.out,
                    r#"<li class="task-item"><input type="checkbox" disabled{checked}> "#
                )
                .unwrap();
            }
        }
    }

    fn list_item_end(&mut self) {
        self.out.push_str("</li>\n");
    }

    fn table_start(&mut self, frame: &BoxStyle) {
        writeln!(self.out, r#"<table style="{}">"#, box_style(frame)).unwrap();
    }

    fn table_end(&mut self) {
        self.out.push_str("</table>\n");
    }

    fn table_row_start(&mut self, row: &TableRowView) {
        let mut style = String::new();
        if let Some(background) = &row.background {
            write!(style, "background-color: {};", escape_html(background)).unwrap();
        }
        if row.divider_after {
            style.push_str("border-bottom: 1px solid currentColor;");
        }
        if style.is_empty() {
            self.out.push_str("<tr>");
        } else {
            write!(self.out, r#"<tr style="{style}">"#).unwrap();
        }
    }

    fn table_row_end(&mut self, _row: &TableRowView) {
        self.out.push_str("</tr>\n");
    }

    fn table_cell_start(&mut self, cell: &TableCellView, header: bool) {
        let tag = if header { "th" } else { "td" };
        let align = match cell.anchor {
            Anchor::Start => "left",
            Anchor::Center => "center",
            Anchor::End => "right",
        };
        write!(self.out, r#"<{tag} style="text-align: {align}">"#).unwrap();
    }

    fn table_cell_end(&mut self, header: bool) {
        self.out.push_str(if header { "</th>" } else { "</td>" });
    }

    fn image(&mut self, image: &ImageView, _activation: &Activation) {
        writeln!(self.out, r#"<figure class="image">{}</figure>"#, image_html(image)).unwrap();
    }

    fn math(&mut self, content: &str, display: bool, _style: &ResolvedStyle) {
        let html = self.math_html(content, display);
        self.out.push_str(&html);
        self.out.push('\n');
    }

    fn diagram(&mut self, content: &str, _style: &ResolvedStyle) {
        if let Some(renderer) = &self.diagrams {
            match renderer.render_diagram(content) {
                Ok(markup) => {
                    writeln!(self.out, r#"<figure class="diagram">{markup}</figure>"#).unwrap();
                    return;
                }
                Err(e) => tracing::warn!(error = %e, "Diagram collaborator failed, emitting source"),
            }
        }
        writeln!(self.out, r#"<div class="mermaid">{}</div>"#, escape_html(content)).unwrap();
    }

    fn link_start(&mut self, url: &str, _activation: &Activation) {
        write!(self.out, r#"<p><a href="{}">"#, escape_html(url)).unwrap();
        self.in_link = true;
    }

    fn link_end(&mut self) {
        self.in_link = false;
        self.out.push_str("</a></p>\n");
    }

    fn blockquote_start(&mut self, bar: &BarStyle) {
        writeln!(
            self.out,
            r#"<blockquote style="border-left: {}px solid {}">"#,
            bar.width,
            escape_html(&bar.color)
        )
        .unwrap();
    }

    fn blockquote_end(&mut self) {
        self.out.push_str("</blockquote>\n");
    }

    fn rule(&mut self, color: &str) {
        writeln!(self.out, r#"<hr style="border-color: {}">"#, escape_html(color)).unwrap();
    }

    fn card(
        &mut self,
        subtype: &str,
        content: &str,
        metadata: &BTreeMap<String, String>,
        style: &ResolvedStyle,
        frame: &BoxStyle,
    ) {
        write!(
            self.out,
            r#"<div class="card card-{}" style="{}{}">"#,
            escape_html(subtype),
            box_style(frame),
            inline_style(style)
        )
        .unwrap();
        write!(self.out, r#"<div class="card-content">{}</div>"#, escape_html(content)).unwrap();
        if !metadata.is_empty() {
            self.out.push_str(r#"<dl class="card-metadata">"#);
            for (key, value) in metadata {
                write!(
                    self.out,
                    "<dt>{}</dt><dd>{}</dd>",
                    escape_html(key),
                    escape_html(value)
                )
                .unwrap();
            }
            self.out.push_str("</dl>");
        }
        self.out.push_str("</div>\n");
    }
}

/// Inline CSS for a span or code element. Color values are attribute-escaped.
fn inline_style(style: &ResolvedStyle) -> String {
    let mut css = format!(
        "font-size: {}px; color: {};",
        style.font_size,
        escape_html(&style.color)
    );
    if let Some(background) = &style.background {
        write!(css, " background-color: {};", escape_html(background)).unwrap();
    }
    if style.monospace {
        css.push_str(" font-family: monospace;");
    }
    css
}

fn box_style(frame: &BoxStyle) -> String {
    let mut css = format!(
        "padding: {}px; border-radius: {}px;",
        frame.padding, frame.border_radius
    );
    if let Some(background) = &frame.background {
        write!(css, " background-color: {};", escape_html(background)).unwrap();
    }
    if let Some(border) = &frame.border_color {
        write!(css, " border: 1px solid {};", escape_html(border)).unwrap();
    }
    css.push(' ');
    css
}

fn image_html(image: &ImageView) -> String {
    let mut css = String::new();
    if let Some(width) = image.size.width {
        write!(css, "width: {width}px; ").unwrap();
    }
    if let Some(height) = image.size.height {
        write!(css, "height: {height}px; ").unwrap();
    }
    if let Some(max_width) = image.size.max_width {
        write!(css, "max-width: {max_width}px; ").unwrap();
    }
    write!(css, "border-radius: {}px", image.border_radius).unwrap();
    format!(
        r#"<img src="{}" alt="{}" style="{css}">"#,
        escape_html(&image.url),
        escape_html(&image.alt)
    )
}

/// Document stylesheet for `theme`.
#[must_use]
pub fn stylesheet(theme: &Theme) -> String {
    let mut css = String::new();
    writeln!(
        css,
        "* {{ margin: 0; padding: 0; box-sizing: border-box; }}\n\
         body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; \
         font-size: {}px; line-height: {}; color: {}; background-color: {}; padding: {}px; }}",
        theme.font_size,
        theme.line_height,
        theme.text_color,
        theme.background_color,
        theme.content_padding
    )
    .unwrap();
    if theme.max_content_width > 0.0 {
        writeln!(
            css,
            ".content {{ max-width: {}px; margin: 0 auto; }}",
            theme.max_content_width
        )
        .unwrap();
    } else {
        css.push_str(".content { margin: 0 auto; }\n");
    }
    writeln!(
        css,
        "h1, h2, h3, h4, h5, h6 {{ margin: 1em 0 0.5em; font-weight: 600; line-height: 1.25; }}\n\
         p, .inline {{ margin-bottom: {}px; }}\n\
         code {{ font-family: 'SF Mono', Menlo, Consolas, monospace; font-size: {}px; \
         background-color: {}; color: {}; padding: 2px 6px; border-radius: 3px; }}\n\
         pre {{ overflow-x: auto; margin-bottom: {}px; }}\n\
         pre code {{ background-color: transparent; padding: 0; white-space: pre; }}\n\
         a {{ color: {}; text-decoration: none; }}\n\
         a:hover {{ text-decoration: underline; }}\n\
         img {{ max-width: 100%; height: auto; margin: {}px 0; }}\n\
         ul, ol {{ margin-left: 1.5em; margin-bottom: {}px; }}\n\
         li {{ margin-bottom: var(--item-spacing, {}px); }}\n\
         li.task-item {{ list-style: none; margin-left: -1.5em; }}\n\
         table {{ width: 100%; border-collapse: collapse; margin-bottom: {}px; }}\n\
         th, td {{ padding: {}px; border: 1px solid {}; }}\n\
         th {{ font-weight: 600; }}\n\
         blockquote {{ padding-left: 1em; margin-bottom: {}px; color: {}; }}\n\
         hr {{ border: none; border-top: 1px solid {}; margin: 1em 0; }}\n\
         .mention {{ background-color: {}; color: {}; padding: 1px 4px; border-radius: 3px; }}\n\
         .card {{ margin-bottom: {}px; }}\n\
         .math-display, .mermaid, .diagram {{ margin: {}px 0; text-align: center; }}",
        theme.paragraph_spacing,
        theme.code_font_size,
        theme.code_background_color,
        theme.code_text_color,
        theme.paragraph_spacing,
        theme.link_color,
        theme.image_margin,
        theme.paragraph_spacing,
        theme.list_item_spacing,
        theme.paragraph_spacing,
        theme.table_cell_padding,
        theme.table_border_color,
        theme.paragraph_spacing,
        theme.blockquote_text_color,
        theme.hr_color,
        theme.mention_background,
        theme.mention_text_color,
        theme.paragraph_spacing,
        theme.paragraph_spacing
    )
    .unwrap();
    css
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
