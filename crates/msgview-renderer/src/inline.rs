//! Inline composition: nested formatting nodes to a flat styled span list.

use msgview_ast::{ImageNode, Node};

use crate::config::RenderConfig;
use crate::dispatch::{RenderWarning, within_depth};
use crate::style::{ResolvedStyle, StyleResolver, image_box, is_color};
use crate::view::{Activation, ImageView, Span, SpanContent};

/// Flattens inline subtrees into [`Span`]s.
///
/// Formatting is additive: a span inside `strong > em` is both bold and
/// italic. Each span carries its fully accumulated style, so hosts never
/// look at ancestors.
#[derive(Clone, Copy, Debug)]
pub struct InlineComposer<'a> {
    config: &'a RenderConfig,
    styles: StyleResolver<'a>,
}

struct Composition<'w> {
    spans: Vec<Span>,
    warnings: &'w mut Vec<RenderWarning>,
}

impl Composition<'_> {
    fn push(&mut self, content: SpanContent, style: &ResolvedStyle, activation: Option<&Activation>) {
        self.spans.push(Span {
            content,
            style: style.clone(),
            activation: activation.cloned(),
        });
    }
}

impl<'a> InlineComposer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            styles: StyleResolver::new(&config.theme),
        }
    }

    /// Compose one inline node on top of `base`.
    ///
    /// Block-only and unknown kinds compose to nothing. Subtrees dropped by
    /// the depth limit are reported in the returned warnings.
    pub fn compose(
        &self,
        node: &Node,
        base: &ResolvedStyle,
    ) -> (Vec<Span>, Vec<RenderWarning>) {
        let mut warnings = Vec::new();
        let spans = self.compose_nodes(std::slice::from_ref(node), base, 1, &mut warnings);
        (spans, warnings)
    }

    pub(crate) fn compose_nodes(
        &self,
        nodes: &[Node],
        base: &ResolvedStyle,
        depth: usize,
        warnings: &mut Vec<RenderWarning>,
    ) -> Vec<Span> {
        let mut composition = Composition {
            spans: Vec::new(),
            warnings,
        };
        for node in nodes {
            self.walk(node, base, None, depth, &mut composition);
        }
        composition.spans
    }

    pub(crate) fn image_view(&self, image: &ImageNode, url: &str) -> ImageView {
        ImageView {
            url: url.to_owned(),
            alt: image.alt.clone().unwrap_or_default(),
            size: image_box(image, self.config.viewport_width),
            border_radius: self.config.theme.image_border_radius,
        }
    }

    fn walk_children(
        &self,
        children: &[Node],
        style: &ResolvedStyle,
        activation: Option<&Activation>,
        depth: usize,
        out: &mut Composition<'_>,
    ) {
        for child in children {
            self.walk(child, style, activation, depth + 1, out);
        }
    }

    fn walk(
        &self,
        node: &Node,
        style: &ResolvedStyle,
        activation: Option<&Activation>,
        depth: usize,
        out: &mut Composition<'_>,
    ) {
        if !within_depth(node, depth, self.config.max_depth, out.warnings) {
            return;
        }

        match node {
            Node::Text(text) => {
                if !text.content.is_empty() {
                    out.push(SpanContent::Text(text.content.clone()), style, activation);
                }
            }
            Node::Strong(c) => {
                let style = ResolvedStyle {
                    bold: true,
                    ..style.clone()
                };
                self.walk_children(&c.children, &style, activation, depth, out);
            }
            Node::Em(c) => {
                let style = ResolvedStyle {
                    italic: true,
                    ..style.clone()
                };
                self.walk_children(&c.children, &style, activation, depth, out);
            }
            Node::Underline(c) => {
                let style = ResolvedStyle {
                    underline: true,
                    ..style.clone()
                };
                self.walk_children(&c.children, &style, activation, depth, out);
            }
            Node::Strike(c) => {
                let style = ResolvedStyle {
                    strikethrough: true,
                    ..style.clone()
                };
                self.walk_children(&c.children, &style, activation, depth, out);
            }
            Node::Color(color) => {
                let style = if is_color(&color.color) {
                    ResolvedStyle {
                        color: color.color.trim().to_owned(),
                        ..style.clone()
                    }
                } else {
                    if !color.color.trim().is_empty() {
                        tracing::debug!(color = %color.color, "Ignoring invalid color override");
                    }
                    style.clone()
                };
                self.walk_children(&color.children, &style, activation, depth, out);
            }
            Node::Code(code) => {
                out.push(
                    SpanContent::Code(code.content.clone()),
                    &self.styles.code(),
                    activation,
                );
            }
            Node::Link(link) => match link.url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => {
                    let style = ResolvedStyle {
                        color: self.config.theme.link_color.clone(),
                        ..style.clone()
                    };
                    let target = Activation::Link {
                        url: url.to_owned(),
                    };
                    self.walk_children(&link.children, &style, Some(&target), depth, out);
                }
                None => self.walk_children(&link.children, style, activation, depth, out),
            },
            Node::Mention(mention) => {
                out.push(
                    SpanContent::Mention {
                        id: mention.id.clone(),
                        label: format!("@{}", mention.display_name()),
                    },
                    &self.styles.mention(style),
                    Some(&Activation::Mention(mention.clone())),
                );
            }
            Node::Emoji(emoji) => {
                out.push(SpanContent::Emoji(emoji.content.clone()), style, activation);
            }
            Node::Math(math) => {
                out.push(
                    SpanContent::Math {
                        content: math.content.clone(),
                        display: math.display,
                    },
                    style,
                    activation,
                );
            }
            Node::Image(image) => match image.url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => out.push(
                    SpanContent::Image(self.image_view(image, url)),
                    style,
                    Some(&Activation::Image(image.clone())),
                ),
                None => {
                    if let Some(alt) = image.alt.as_ref().filter(|alt| !alt.is_empty()) {
                        out.push(SpanContent::Text(alt.clone()), style, activation);
                    }
                }
            },
            other => {
                tracing::debug!(node = other.type_name(), "Skipping block node in inline context");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use msgview_ast::{ColorNode, LinkNode, MathNode, MentionNode};
    use pretty_assertions::assert_eq;

    fn compose(node: &Node) -> Vec<Span> {
        let config = RenderConfig::default();
        let base = StyleResolver::new(&config.theme).body();
        let (spans, warnings) = InlineComposer::new(&config).compose(node, &base);
        assert!(warnings.is_empty());
        spans
    }

    fn texts(spans: &[Span]) -> Vec<&str> {
        spans.iter().filter_map(Span::text).collect()
    }

    #[test]
    fn test_strong_em_is_bold_and_italic() {
        let spans = compose(&Node::strong(vec![Node::em(vec![Node::text("x")])]));
        assert_eq!(spans.len(), 1);
        assert!(spans[0].style.bold);
        assert!(spans[0].style.italic);
        assert!(!spans[0].style.underline);
    }

    #[test]
    fn test_formatting_is_additive() {
        let node = Node::underline(vec![
            Node::text("u"),
            Node::strike(vec![Node::text("us")]),
        ]);
        let spans = compose(&node);
        assert_eq!(texts(&spans), vec!["u", "us"]);
        assert!(spans[0].style.underline && !spans[0].style.strikethrough);
        assert!(spans[1].style.underline && spans[1].style.strikethrough);
    }

    #[test]
    fn test_color_overrides_subtree() {
        let spans = compose(&Node::Color(ColorNode {
            color: "#ff0000".to_owned(),
            children: vec![Node::strong(vec![Node::text("red")])],
        }));
        assert_eq!(spans[0].style.color, "#ff0000");
        assert!(spans[0].style.bold);
    }

    #[test]
    fn test_invalid_color_inherits_parent() {
        let text_color = Theme::default().text_color;
        for bad in ["", "red", r#"red"><script>alert(1)</script>"#, "#12; x: y"] {
            let spans = compose(&Node::Color(ColorNode {
                color: bad.to_owned(),
                children: vec![Node::text("hi")],
            }));
            assert_eq!(spans[0].style.color, text_color, "color {bad:?}");
        }
    }

    #[test]
    fn test_code_ignores_ancestor_formatting() {
        let spans = compose(&Node::strong(vec![Node::code("let x")]));
        let theme = Theme::default();
        assert_eq!(spans[0].content, SpanContent::Code("let x".to_owned()));
        assert!(!spans[0].style.bold);
        assert!(spans[0].style.monospace);
        assert_eq!(spans[0].style.color, theme.code_text_color);
    }

    #[test]
    fn test_link_keeps_formatting_and_adds_activation() {
        let spans = compose(&Node::link(
            "https://example.com",
            vec![Node::em(vec![Node::text("site")])],
        ));
        let theme = Theme::default();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].style.color, theme.link_color);
        assert!(spans[0].style.italic);
        assert_eq!(
            spans[0].activation,
            Some(Activation::Link {
                url: "https://example.com".to_owned()
            })
        );
    }

    #[test]
    fn test_link_without_url_is_plain_text() {
        let spans = compose(&Node::Link(LinkNode {
            url: None,
            children: vec![Node::text("nowhere")],
        }));
        assert_eq!(spans[0].activation, None);
        assert_eq!(spans[0].style.color, Theme::default().text_color);
    }

    #[test]
    fn test_mention_label_and_activation() {
        let mention = MentionNode {
            id: "u1".to_owned(),
            name: Some("alice".to_owned()),
        };
        let spans = compose(&Node::Mention(mention.clone()));
        assert_eq!(
            spans[0].content,
            SpanContent::Mention {
                id: "u1".to_owned(),
                label: "@alice".to_owned()
            }
        );
        assert_eq!(spans[0].activation, Some(Activation::Mention(mention)));

        let unnamed = compose(&Node::Mention(MentionNode {
            id: "u2".to_owned(),
            name: None,
        }));
        assert_eq!(unnamed[0].text(), Some("@u2"));
    }

    #[test]
    fn test_inline_math_is_a_unit() {
        let spans = compose(&Node::Math(MathNode {
            content: "x^2".to_owned(),
            display: false,
        }));
        assert_eq!(
            spans[0].content,
            SpanContent::Math {
                content: "x^2".to_owned(),
                display: false
            }
        );
    }

    #[test]
    fn test_image_without_url_uses_alt() {
        let spans = compose(&Node::Image(ImageNode {
            alt: Some("a chart".to_owned()),
            ..ImageNode::default()
        }));
        assert_eq!(spans[0].content, SpanContent::Text("a chart".to_owned()));
        assert!(compose(&Node::Image(ImageNode::default())).is_empty());
    }

    #[test]
    fn test_block_and_unknown_nodes_compose_to_nothing() {
        assert!(compose(&Node::HorizontalRule).is_empty());
        assert!(compose(&Node::Unknown).is_empty());
        assert!(compose(&Node::heading(1, vec![Node::text("h")])).is_empty());
    }

    #[test]
    fn test_depth_limit_truncates() {
        let config = RenderConfig::default().with_max_depth(3);
        let base = StyleResolver::new(&config.theme).body();
        let mut node = Node::text("deep");
        for _ in 0..5 {
            node = Node::strong(vec![node]);
        }
        let (spans, warnings) = InlineComposer::new(&config).compose(&node, &base);
        assert!(spans.is_empty());
        assert_eq!(
            warnings,
            vec![RenderWarning::DepthLimitExceeded {
                depth: 4,
                max_depth: 3,
                node: "strong",
            }]
        );
    }
}
