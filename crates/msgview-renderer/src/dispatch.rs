//! Block dispatch: document nodes to view-tree blocks.

use msgview_ast::{ListKind, Node, RootNode};
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::RenderConfig;
use crate::inline::InlineComposer;
use crate::style::{Anchor, ResolvedStyle, StyleResolver, StyleTarget};
use crate::view::{
    Activation, ListItemView, ListMarker, Span, TableCellView, TableRowView, ViewNode,
};

/// Non-fatal condition noticed while rendering.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RenderWarning {
    #[error("{node} at depth {depth} exceeds the nesting limit of {max_depth}; subtree dropped")]
    DepthLimitExceeded {
        depth: usize,
        max_depth: usize,
        node: &'static str,
    },
}

/// Result of rendering a document.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RenderResult {
    /// One entry per rendered top-level block, in document order.
    pub blocks: Vec<ViewNode>,
    pub warnings: Vec<RenderWarning>,
}

impl RenderResult {
    /// Every activation target in document order.
    pub fn activations(&self) -> Vec<&Activation> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.for_each_activation(&mut |activation| out.push(activation));
        }
        out
    }
}

/// Returns `false` (and records a warning) when `node` sits deeper than
/// `max_depth`.
pub(crate) fn within_depth(
    node: &Node,
    depth: usize,
    max_depth: usize,
    warnings: &mut Vec<RenderWarning>,
) -> bool {
    if depth <= max_depth {
        return true;
    }
    tracing::warn!(
        node = node.type_name(),
        depth,
        max_depth,
        "Document nested too deep, dropping subtree"
    );
    warnings.push(RenderWarning::DepthLimitExceeded {
        depth,
        max_depth,
        node: node.type_name(),
    });
    false
}

/// Maps each block node to one view subtree.
///
/// Stateless apart from the borrowed config: the same document and config
/// always produce the same blocks, and one dispatcher may be shared across
/// threads.
///
/// # Example
///
/// ```
/// use msgview_ast::{Node, RootNode};
/// use msgview_renderer::{BlockDispatcher, RenderConfig, ViewNode};
///
/// let root = RootNode::new(vec![Node::paragraph(vec![Node::text("hi")])]);
/// let config = RenderConfig::default();
/// let result = BlockDispatcher::new(&config).render(&root);
/// assert!(matches!(result.blocks[0], ViewNode::Paragraph { .. }));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BlockDispatcher<'a> {
    config: &'a RenderConfig,
    styles: StyleResolver<'a>,
    inline: InlineComposer<'a>,
}

impl<'a> BlockDispatcher<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            styles: StyleResolver::new(&config.theme),
            inline: InlineComposer::new(config),
        }
    }

    /// Render a whole document.
    pub fn render(&self, root: &RootNode) -> RenderResult {
        let mut warnings = Vec::new();
        let blocks = self.blocks(&root.children, 1, &self.styles.body(), &mut warnings);
        RenderResult { blocks, warnings }
    }

    /// Render a single node as a top-level block.
    ///
    /// The view is `None` for nodes that render to nothing (unknown kinds, an
    /// image without url or alt text). Subtrees dropped by the depth limit are
    /// reported in the returned warnings.
    pub fn render_block(&self, node: &Node) -> (Option<ViewNode>, Vec<RenderWarning>) {
        let mut warnings = Vec::new();
        let view = self.block(node, 1, &self.styles.body(), &mut warnings);
        (view, warnings)
    }

    /// Render sibling nodes, grouping consecutive inline nodes into runs.
    fn blocks(
        &self,
        nodes: &[Node],
        depth: usize,
        text: &ResolvedStyle,
        warnings: &mut Vec<RenderWarning>,
    ) -> Vec<ViewNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for group in nodes.chunk_by(|a, b| a.is_inline() && b.is_inline()) {
            let view = match group {
                [node] if !node.is_inline() => self.block(node, depth, text, warnings),
                // A link standing alone among blocks becomes a tappable block.
                [node @ Node::Link(_)] => self.block(node, depth, text, warnings),
                run => self.inline_run(run, depth, text, warnings),
            };
            out.extend(view);
        }
        out
    }

    fn inline_run(
        &self,
        run: &[Node],
        depth: usize,
        text: &ResolvedStyle,
        warnings: &mut Vec<RenderWarning>,
    ) -> Option<ViewNode> {
        let spans = self.inline.compose_nodes(run, text, depth, warnings);
        (!spans.is_empty()).then_some(ViewNode::Inline { spans })
    }

    fn spans(
        &self,
        children: &[Node],
        base: &ResolvedStyle,
        depth: usize,
        warnings: &mut Vec<RenderWarning>,
    ) -> Vec<Span> {
        self.inline.compose_nodes(children, base, depth + 1, warnings)
    }

    #[allow(clippy::too_many_lines)]
    fn block(
        &self,
        node: &Node,
        depth: usize,
        text: &ResolvedStyle,
        warnings: &mut Vec<RenderWarning>,
    ) -> Option<ViewNode> {
        if !within_depth(node, depth, self.config.max_depth, warnings) {
            return None;
        }
        let theme = &self.config.theme;

        let view = match node {
            Node::Paragraph(p) => ViewNode::Paragraph {
                spans: self.spans(&p.children, text, depth, warnings),
            },
            Node::Heading(h) => ViewNode::Heading {
                level: h.level,
                spans: self.spans(&h.children, &self.styles.heading(h.level), depth, warnings),
            },
            Node::CodeBlock(code) => ViewNode::CodeBlock {
                language: code.language.clone().filter(|lang| !lang.is_empty()),
                content: code.content.clone(),
                style: self.styles.code(),
                frame: self.styles.code_frame(),
            },
            Node::List(list) => {
                let ordered = list.list_type == ListKind::Ordered;
                let items = list
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| ListItemView {
                        marker: match item.checked {
                            Some(checked) => ListMarker::Task { checked },
                            None if ordered => ListMarker::Ordered { number: index + 1 },
                            None => ListMarker::Bullet,
                        },
                        children: self.blocks(&item.children, depth + 1, text, warnings),
                    })
                    .collect();
                ViewNode::List {
                    ordered,
                    spacing: theme.list_item_spacing,
                    items,
                }
            }
            Node::Table(table) => {
                let last = table.rows.len().saturating_sub(1);
                let rows = table
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(index, row)| {
                        let row_style = self.styles.row(index);
                        let cell_text = self.styles.resolve(StyleTarget::TableCell(index));
                        TableRowView {
                            header: row_style.header,
                            background: row_style.background,
                            cells: row
                                .cells
                                .iter()
                                .map(|cell| TableCellView {
                                    anchor: Anchor::from(cell.align),
                                    spans: self.spans(&cell.children, &cell_text, depth, warnings),
                                })
                                .collect(),
                            divider_after: index < last,
                        }
                    })
                    .collect();
                ViewNode::Table {
                    frame: self.styles.table_frame(),
                    rows,
                }
            }
            Node::Image(image) => match image.url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => ViewNode::Image {
                    image: self.inline.image_view(image, url),
                    activation: Activation::Image(image.clone()),
                },
                None => {
                    tracing::debug!("Image without url, rendering alt text");
                    let spans = self.inline.compose_nodes(
                        std::slice::from_ref(node),
                        text,
                        depth,
                        warnings,
                    );
                    if spans.is_empty() {
                        return None;
                    }
                    ViewNode::Paragraph { spans }
                }
            },
            Node::Math(math) => ViewNode::Math {
                content: math.content.clone(),
                display: math.display,
                style: text.clone(),
            },
            Node::Diagram(diagram) => ViewNode::Diagram {
                content: diagram.content.clone(),
                style: text.clone(),
            },
            Node::Link(link) => match link.url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => {
                    let linked = ResolvedStyle {
                        color: theme.link_color.clone(),
                        ..text.clone()
                    };
                    ViewNode::Link {
                        url: url.to_owned(),
                        spans: self.spans(&link.children, &linked, depth, warnings),
                        activation: Activation::Link {
                            url: url.to_owned(),
                        },
                    }
                }
                None => ViewNode::Inline {
                    spans: self.spans(&link.children, text, depth, warnings),
                },
            },
            Node::Blockquote(quote) => {
                let quoted = ResolvedStyle {
                    color: theme.blockquote_text_color.clone(),
                    ..text.clone()
                };
                ViewNode::Blockquote {
                    bar: self.styles.blockquote_bar(),
                    children: self.blocks(&quote.children, depth + 1, &quoted, warnings),
                }
            }
            Node::HorizontalRule => ViewNode::Rule {
                color: self.styles.rule_color().to_owned(),
            },
            Node::Card(card) => ViewNode::Card {
                subtype: card.subtype.clone(),
                content: card.content.clone(),
                metadata: card.metadata.clone(),
                style: self.styles.resolve(StyleTarget::Card),
                frame: self.styles.card_frame(),
            },
            Node::Unknown => {
                tracing::debug!("Skipping unknown node");
                return None;
            }
            inline => {
                return self.inline_run(std::slice::from_ref(inline), depth, text, warnings);
            }
        };
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::resolve;
    use crate::theme::Theme;
    use crate::view::SpanContent;
    use msgview_ast::{
        CardNode, CodeBlockNode, ImageNode, ListItemNode, TableCell, TableNode, TableRow,
        TextAlign,
    };
    use pretty_assertions::assert_eq;

    fn render_with(config: &RenderConfig, children: Vec<Node>) -> RenderResult {
        BlockDispatcher::new(config).render(&RootNode::new(children))
    }

    fn render(children: Vec<Node>) -> RenderResult {
        render_with(&RenderConfig::default(), children)
    }

    fn item(text: &str) -> ListItemNode {
        ListItemNode::new(vec![Node::text(text)])
    }

    fn cell(text: &str) -> TableCell {
        TableCell {
            children: vec![Node::text(text)],
            align: None,
        }
    }

    #[test]
    fn test_paragraph_text_and_bold() {
        let result = render(vec![Node::paragraph(vec![
            Node::text("a"),
            Node::strong(vec![Node::text("b")]),
        ])]);
        let body = resolve(StyleTarget::Body, &Theme::default());
        assert_eq!(
            result.blocks,
            vec![ViewNode::Paragraph {
                spans: vec![
                    Span {
                        content: SpanContent::Text("a".to_owned()),
                        style: body.clone(),
                        activation: None,
                    },
                    Span {
                        content: SpanContent::Text("b".to_owned()),
                        style: ResolvedStyle {
                            bold: true,
                            ..body
                        },
                        activation: None,
                    },
                ],
            }]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_heading_renders_once_with_heading_style() {
        let result = render(vec![Node::heading(2, vec![Node::text("Title")])]);
        let ViewNode::Heading { level, spans } = &result.blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(*level, 2);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].style.bold);
        assert!((spans[0].style.font_size - 22.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_heading_color_falls_back_to_text_color() {
        let config = RenderConfig::new(Theme {
            heading_colors: vec!["#111111".to_owned()],
            ..Theme::default()
        });
        let result = render_with(
            &config,
            vec![
                Node::heading(1, vec![Node::text("one")]),
                Node::heading(3, vec![Node::text("three")]),
            ],
        );
        let colors: Vec<&str> = result
            .blocks
            .iter()
            .map(|block| match block {
                ViewNode::Heading { spans, .. } => spans[0].style.color.as_str(),
                _ => panic!("expected heading"),
            })
            .collect();
        assert_eq!(colors, vec!["#111111", config.theme.text_color.as_str()]);
    }

    #[test]
    fn test_ordered_list_restarts_per_list() {
        let inner = Node::list(ListKind::Ordered, vec![item("a"), item("b")]);
        let outer = Node::list(
            ListKind::Ordered,
            vec![
                item("one"),
                ListItemNode::new(vec![Node::text("two"), inner]),
                item("three"),
            ],
        );
        let result = render(vec![outer]);
        let ViewNode::List { items, ordered, .. } = &result.blocks[0] else {
            panic!("expected list");
        };
        assert!(ordered);
        let markers: Vec<_> = items.iter().map(|item| item.marker.label()).collect();
        assert_eq!(markers, vec!["1.", "2.", "3."]);

        let ViewNode::List { items: nested, .. } = &items[1].children[1] else {
            panic!("expected nested list");
        };
        let nested: Vec<_> = nested.iter().map(|item| item.marker.label()).collect();
        assert_eq!(nested, vec!["1.", "2."]);
    }

    #[test]
    fn test_bullet_and_task_markers() {
        let result = render(vec![Node::list(
            ListKind::Bullet,
            vec![
                item("plain"),
                ListItemNode {
                    children: vec![Node::text("done")],
                    checked: Some(true),
                },
            ],
        )]);
        let ViewNode::List { items, .. } = &result.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].marker, ListMarker::Bullet);
        assert_eq!(items[1].marker, ListMarker::Task { checked: true });
    }

    #[test]
    fn test_list_item_mixes_inline_runs_and_blocks() {
        let result = render(vec![Node::list(
            ListKind::Bullet,
            vec![ListItemNode::new(vec![
                Node::text("see "),
                Node::strong(vec![Node::text("this")]),
                Node::CodeBlock(CodeBlockNode {
                    language: None,
                    content: "x".to_owned(),
                }),
            ])],
        )]);
        let ViewNode::List { items, .. } = &result.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].children.len(), 2);
        assert!(matches!(&items[0].children[0], ViewNode::Inline { spans } if spans.len() == 2));
        assert!(matches!(&items[0].children[1], ViewNode::CodeBlock { .. }));
    }

    #[test]
    fn test_only_first_table_row_is_header() {
        let table = Node::Table(TableNode {
            rows: vec![
                TableRow {
                    cells: vec![cell("h1"), cell("h2")],
                },
                TableRow {
                    cells: vec![cell("a"), cell("b")],
                },
                TableRow {
                    cells: vec![
                        TableCell {
                            children: vec![Node::text("c")],
                            align: Some(TextAlign::Right),
                        },
                        cell("d"),
                    ],
                },
            ],
        });
        let result = render(vec![table]);
        let ViewNode::Table { rows, .. } = &result.blocks[0] else {
            panic!("expected table");
        };
        let headers: Vec<bool> = rows.iter().map(|row| row.header).collect();
        assert_eq!(headers, vec![true, false, false]);
        let dividers: Vec<bool> = rows.iter().map(|row| row.divider_after).collect();
        assert_eq!(dividers, vec![true, true, false]);
        assert!(rows[0].background.is_some());
        assert!(rows[1].background.is_none());
        assert!(rows[0].cells[0].spans[0].style.bold);
        assert!(!rows[1].cells[0].spans[0].style.bold);
        assert_eq!(rows[2].cells[0].anchor, Anchor::End);
        assert_eq!(rows[2].cells[1].anchor, Anchor::Start);
    }

    #[test]
    fn test_unknown_node_is_skipped() {
        let result = render(vec![
            Node::paragraph(vec![Node::text("before")]),
            Node::Unknown,
            Node::paragraph(vec![Node::text("after")]),
        ]);
        assert_eq!(result.blocks.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_kind_from_json_is_skipped() {
        let root = RootNode::from_json(
            r#"{"children":[
                {"type":"paragraph","children":[{"type":"text","content":"a"}]},
                {"type":"poll","question":"?"},
                {"type":"horizontalRule"}
            ]}"#,
        )
        .unwrap();
        let config = RenderConfig::default();
        let result = BlockDispatcher::new(&config).render(&root);
        assert_eq!(result.blocks.len(), 2);
        assert!(matches!(result.blocks[1], ViewNode::Rule { .. }));
    }

    #[test]
    fn test_lone_link_becomes_block() {
        let result = render(vec![
            Node::paragraph(vec![Node::text("intro")]),
            Node::link("https://a.example", vec![Node::text("a")]),
        ]);
        let ViewNode::Link {
            url,
            spans,
            activation,
        } = &result.blocks[1]
        else {
            panic!("expected link block");
        };
        assert_eq!(url, "https://a.example");
        assert_eq!(spans[0].style.color, Theme::default().link_color);
        assert_eq!(
            activation,
            &Activation::Link {
                url: "https://a.example".to_owned()
            }
        );
    }

    #[test]
    fn test_link_inside_text_run_stays_inline() {
        let result = render(vec![
            Node::text("go to "),
            Node::link("https://a.example", vec![Node::text("a")]),
        ]);
        assert_eq!(result.blocks.len(), 1);
        let ViewNode::Inline { spans } = &result.blocks[0] else {
            panic!("expected inline run");
        };
        assert_eq!(spans.len(), 2);
        assert!(spans[1].activation.is_some());
    }

    #[test]
    fn test_image_block_and_missing_url() {
        let config = RenderConfig::default().with_viewport_width(200.0);
        let result = render_with(
            &config,
            vec![
                Node::Image(ImageNode {
                    url: Some("a.png".to_owned()),
                    width: Some(400.0),
                    height: Some(100.0),
                    alt: None,
                }),
                Node::Image(ImageNode {
                    alt: Some("fallback".to_owned()),
                    ..ImageNode::default()
                }),
                Node::Image(ImageNode::default()),
            ],
        );
        assert_eq!(result.blocks.len(), 2);
        let ViewNode::Image { image, .. } = &result.blocks[0] else {
            panic!("expected image");
        };
        assert_eq!(image.alt, "");
        assert_eq!(image.size.width, Some(200.0));
        assert_eq!(image.size.height, Some(50.0));
        assert!(matches!(
            &result.blocks[1],
            ViewNode::Paragraph { spans } if spans[0].text() == Some("fallback")
        ));
    }

    #[test]
    fn test_nested_blockquotes_use_quote_text_color() {
        let result = render(vec![Node::blockquote(vec![Node::blockquote(vec![
            Node::paragraph(vec![Node::text("deep")]),
        ])])]);
        let ViewNode::Blockquote { children, bar } = &result.blocks[0] else {
            panic!("expected blockquote");
        };
        assert!((bar.width - 4.0).abs() < f32::EPSILON);
        let ViewNode::Blockquote { children, .. } = &children[0] else {
            panic!("expected nested blockquote");
        };
        let ViewNode::Paragraph { spans } = &children[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(spans[0].style.color, Theme::default().blockquote_text_color);
    }

    #[test]
    fn test_rule_card_math_diagram() {
        let result = render(vec![
            Node::HorizontalRule,
            Node::Card(CardNode {
                subtype: "location".to_owned(),
                content: "Office".to_owned(),
                metadata: [("lat".to_owned(), "1.0".to_owned())].into(),
            }),
            Node::Math(msgview_ast::MathNode {
                content: "E=mc^2".to_owned(),
                display: true,
            }),
            Node::Diagram(msgview_ast::DiagramNode {
                content: "graph TD".to_owned(),
            }),
        ]);
        assert_eq!(
            result.blocks[0],
            ViewNode::Rule {
                color: Theme::default().hr_color
            }
        );
        assert!(matches!(&result.blocks[1], ViewNode::Card { subtype, metadata, .. }
            if subtype == "location" && metadata["lat"] == "1.0"));
        assert!(matches!(&result.blocks[2], ViewNode::Math { display: true, .. }));
        assert!(matches!(
            &result.blocks[3],
            ViewNode::Diagram { content, .. } if content == "graph TD"
        ));
    }

    #[test]
    fn test_depth_limit_records_warning() {
        let config = RenderConfig::default().with_max_depth(4);
        let mut node = Node::paragraph(vec![Node::text("core")]);
        for _ in 0..6 {
            node = Node::blockquote(vec![node]);
        }
        let result = render_with(&config, vec![node, Node::HorizontalRule]);
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            result.warnings[0],
            RenderWarning::DepthLimitExceeded {
                depth: 5,
                max_depth: 4,
                node: "blockquote"
            }
        ));
    }

    #[test]
    fn test_activations_in_document_order() {
        let image = ImageNode {
            url: Some("i.png".to_owned()),
            ..ImageNode::default()
        };
        let result = render(vec![
            Node::paragraph(vec![Node::link("https://one", vec![Node::text("1")])]),
            Node::Image(image.clone()),
            Node::list(
                ListKind::Bullet,
                vec![ListItemNode::new(vec![Node::link(
                    "https://two",
                    vec![Node::text("2")],
                )])],
            ),
        ]);
        assert_eq!(
            result.activations(),
            vec![
                &Activation::Link {
                    url: "https://one".to_owned()
                },
                &Activation::Image(image),
                &Activation::Link {
                    url: "https://two".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_render_block_single_node() {
        let config = RenderConfig::default();
        let dispatcher = BlockDispatcher::new(&config);
        assert_eq!(dispatcher.render_block(&Node::Unknown), (None, vec![]));
        assert!(matches!(
            dispatcher.render_block(&Node::text("loose")),
            (Some(ViewNode::Inline { .. }), warnings) if warnings.is_empty()
        ));
    }

    #[test]
    fn test_render_block_reports_depth_warning() {
        let config = RenderConfig::default().with_max_depth(2);
        let quote = Node::blockquote(vec![Node::blockquote(vec![Node::paragraph(vec![
            Node::text("deep"),
        ])])]);
        let (view, warnings) = BlockDispatcher::new(&config).render_block(&quote);
        assert!(view.is_some());
        assert_eq!(
            warnings,
            vec![RenderWarning::DepthLimitExceeded {
                depth: 3,
                max_depth: 2,
                node: "paragraph",
            }]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let root = RootNode::new(vec![
            Node::heading(1, vec![Node::text("T")]),
            Node::paragraph(vec![Node::em(vec![Node::text("x")])]),
            Node::list(ListKind::Ordered, vec![item("a"), item("b")]),
        ]);
        let config = RenderConfig::default().with_viewport_width(375.0);
        let first = BlockDispatcher::new(&config).render(&root);
        let results: Vec<RenderResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| BlockDispatcher::new(&config).render(&root)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });
        for result in results {
            assert_eq!(result, first);
        }
    }
}
