//! Markdown to document tree conversion.
//!
//! pulldown-cmark produces a flat event stream; [`TreeBuilder`] folds it back
//! into nested nodes with a stack of open elements.

use msgview_ast::{
    CodeBlockNode, DiagramNode, DocumentParser, ImageNode, LinkNode, ListItemNode, ListKind,
    MathNode, Node, ParseError, RootNode, TableCell, TableNode, TableRow, TextAlign,
};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};

/// Markdown parser with GitHub Flavored Markdown and math enabled by default.
#[derive(Clone, Copy, Debug)]
pub struct MarkdownParser {
    gfm: bool,
    math: bool,
}

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            math: true,
        }
    }

    /// Enable or disable tables, strikethrough, task lists and alerts.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Enable or disable `$..$` and `$$..$$` math.
    #[must_use]
    pub fn with_math(mut self, enabled: bool) -> Self {
        self.math = enabled;
        self
    }

    /// Parser options for the current configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM;
        }
        if self.math {
            options |= Options::ENABLE_MATH;
        }
        options
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, input: &str) -> Result<RootNode, ParseError> {
        TreeBuilder::new().build(Parser::new_ext(input, self.parser_options()))
    }
}

/// Element still waiting for its end event.
enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    Blockquote,
    Strong,
    Emphasis,
    Strikethrough,
    Link(String),
    Image { url: String, title: String },
    List { kind: ListKind, items: Vec<ListItemNode> },
    Item { checked: Option<bool> },
    Table { alignments: Vec<Alignment>, rows: Vec<TableRow> },
    Row(Vec<TableCell>),
    Cell,
    CodeBlock { language: Option<String>, content: String },
    /// Wrapper without a node of its own; children pass to the parent.
    Transparent,
}

struct Open {
    frame: Frame,
    children: Vec<Node>,
}

impl Open {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            children: Vec::new(),
        }
    }
}

pub(crate) struct TreeBuilder {
    stack: Vec<Open>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            stack: vec![Open::new(Frame::Root)],
        }
    }

    pub(crate) fn build<'a, I>(mut self, events: I) -> Result<RootNode, ParseError>
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event)?;
        }

        match (self.stack.pop(), self.stack.is_empty()) {
            (
                Some(Open {
                    frame: Frame::Root,
                    children,
                }),
                true,
            ) => Ok(RootNode::new(children)),
            _ => Err(ParseError::Markdown("unterminated element".to_owned())),
        }
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), ParseError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(_) => self.close()?,
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push(Node::code(&*code)),
            Event::InlineMath(content) => self.push(math(&content, false)),
            Event::DisplayMath(content) => self.push(math(&content, true)),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            Event::Rule => self.push(Node::HorizontalRule),
            Event::TaskListMarker(checked) => self.mark_task(checked),
            Event::Html(_) | Event::InlineHtml(_) => {
                tracing::debug!("Dropping raw HTML from markdown input");
            }
            Event::FootnoteReference(_) => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => Frame::Heading(level as u8),
            Tag::BlockQuote(_) => Frame::Blockquote,
            Tag::CodeBlock(kind) => Frame::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                },
                content: String::new(),
            },
            Tag::List(start) => Frame::List {
                kind: if start.is_some() {
                    ListKind::Ordered
                } else {
                    ListKind::Bullet
                },
                items: Vec::new(),
            },
            Tag::Item => Frame::Item { checked: None },
            Tag::Table(alignments) => Frame::Table {
                alignments,
                rows: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell,
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Strikethrough,
            Tag::Link { dest_url, .. } => Frame::Link(dest_url.into_string()),
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::HtmlBlock
            | Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_)
            | Tag::Superscript
            | Tag::Subscript => Frame::Transparent,
        };
        self.stack.push(Open::new(frame));
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let Some(Open { frame, children }) = self.stack.pop() else {
            return Err(unbalanced());
        };

        match frame {
            Frame::Root => return Err(unbalanced()),
            Frame::Paragraph => self.push(promote_paragraph(children)),
            Frame::Heading(level) => self.push(Node::heading(level, children)),
            Frame::Blockquote => self.push(Node::blockquote(children)),
            Frame::Strong => self.push(Node::strong(children)),
            Frame::Emphasis => self.push(Node::em(children)),
            Frame::Strikethrough => self.push(Node::strike(children)),
            Frame::Link(url) => self.push(Node::Link(LinkNode {
                url: non_empty(url),
                children,
            })),
            Frame::Image { url, title } => {
                let alt = non_empty(plain_text(&children)).or_else(|| non_empty(title));
                self.push(Node::Image(ImageNode {
                    url: non_empty(url),
                    width: None,
                    height: None,
                    alt,
                }));
            }
            Frame::List { kind, items } => self.push(Node::list(kind, items)),
            Frame::Item { checked } => match self.stack.last_mut() {
                Some(Open {
                    frame: Frame::List { items, .. },
                    ..
                }) => items.push(ListItemNode { children, checked }),
                _ => return Err(unbalanced()),
            },
            Frame::Table { rows, .. } => self.push(Node::Table(TableNode { rows })),
            Frame::Row(cells) => match self.stack.last_mut() {
                Some(Open {
                    frame: Frame::Table { rows, .. },
                    ..
                }) => rows.push(TableRow { cells }),
                _ => return Err(unbalanced()),
            },
            Frame::Cell => self.close_cell(children)?,
            Frame::CodeBlock { language, content } => self.push(code_block(language, content)),
            Frame::Transparent => {
                for child in children {
                    self.push(child);
                }
            }
        }
        Ok(())
    }

    fn close_cell(&mut self, children: Vec<Node>) -> Result<(), ParseError> {
        let depth = self.stack.len();
        let [
            Open {
                frame: Frame::Table { alignments, .. },
                ..
            },
            Open {
                frame: Frame::Row(cells),
                ..
            },
        ] = &mut self.stack[depth.saturating_sub(2)..]
        else {
            return Err(unbalanced());
        };

        let align = match alignments.get(cells.len()) {
            Some(Alignment::Left) => Some(TextAlign::Left),
            Some(Alignment::Center) => Some(TextAlign::Center),
            Some(Alignment::Right) => Some(TextAlign::Right),
            Some(Alignment::None) | None => None,
        };
        cells.push(TableCell { children, align });
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(Open {
            frame: Frame::CodeBlock { content, .. },
            ..
        }) = self.stack.last_mut()
        {
            content.push_str(text);
        } else {
            self.push(Node::text(text));
        }
    }

    fn mark_task(&mut self, done: bool) {
        let item = self.stack.iter_mut().rev().find_map(|open| match &mut open.frame {
            Frame::Item { checked } => Some(checked),
            _ => None,
        });
        if let Some(checked) = item {
            *checked = Some(done);
        }
    }

    /// Append a node to the innermost open element, merging adjacent text.
    fn push(&mut self, node: Node) {
        let Some(open) = self.stack.last_mut() else {
            return;
        };
        if let (Some(Node::Text(last)), Node::Text(next)) = (open.children.last_mut(), &node) {
            last.content.push_str(&next.content);
            return;
        }
        open.children.push(node);
    }
}

fn unbalanced() -> ParseError {
    ParseError::Markdown("unbalanced element nesting".to_owned())
}

fn math(content: &str, display: bool) -> Node {
    Node::Math(MathNode {
        content: content.trim().to_owned(),
        display,
    })
}

fn code_block(language: Option<String>, mut content: String) -> Node {
    if content.ends_with('\n') {
        content.pop();
    }
    match language {
        Some(lang) if lang.eq_ignore_ascii_case("mermaid") => Node::Diagram(DiagramNode { content }),
        language => Node::CodeBlock(CodeBlockNode { language, content }),
    }
}

/// A paragraph holding nothing but an image or display math becomes that block.
fn promote_paragraph(mut children: Vec<Node>) -> Node {
    let promotable = matches!(
        children.as_slice(),
        [Node::Image(_)] | [Node::Math(MathNode { display: true, .. })]
    );
    match children.pop() {
        Some(node) if promotable => node,
        Some(node) => {
            children.push(node);
            Node::paragraph(children)
        }
        None => Node::paragraph(children),
    }
}

fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&text.content),
            Node::Code(code) => out.push_str(&code.content),
            other => out.push_str(&plain_text(other.children())),
        }
    }
    out
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(markdown: &str) -> Vec<Node> {
        MarkdownParser::new().parse(markdown).unwrap().children
    }

    #[test]
    fn test_paragraph_with_strong() {
        assert_eq!(
            parse("a **b**"),
            vec![Node::paragraph(vec![
                Node::text("a "),
                Node::strong(vec![Node::text("b")]),
            ])]
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            parse("# One\n\n### Three"),
            vec![
                Node::heading(1, vec![Node::text("One")]),
                Node::heading(3, vec![Node::text("Three")]),
            ]
        );
    }

    #[test]
    fn test_soft_break_becomes_space() {
        assert_eq!(
            parse("line one\nline two"),
            vec![Node::paragraph(vec![Node::text("line one line two")])]
        );
    }

    #[test]
    fn test_nested_emphasis_and_strike() {
        assert_eq!(
            parse("***x*** ~~y~~"),
            vec![Node::paragraph(vec![
                Node::em(vec![Node::strong(vec![Node::text("x")])]),
                Node::text(" "),
                Node::strike(vec![Node::text("y")]),
            ])]
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            parse("[docs](https://example.com)"),
            vec![Node::paragraph(vec![Node::link(
                "https://example.com",
                vec![Node::text("docs")]
            )])]
        );
    }

    #[test]
    fn test_lone_image_is_promoted() {
        assert_eq!(
            parse("![a cat](cat.png)"),
            vec![Node::Image(ImageNode {
                url: Some("cat.png".to_owned()),
                width: None,
                height: None,
                alt: Some("a cat".to_owned()),
            })]
        );
    }

    #[test]
    fn test_image_alt_falls_back_to_title() {
        let nodes = parse(r#"![](cat.png "Title")"#);
        assert!(matches!(&nodes[0], Node::Image(img) if img.alt.as_deref() == Some("Title")));
    }

    #[test]
    fn test_image_in_text_stays_inline() {
        let nodes = parse("see ![x](x.png)");
        let Node::Paragraph(para) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(para.children.len(), 2);
        assert!(matches!(para.children[1], Node::Image(_)));
    }

    #[test]
    fn test_fenced_code_and_mermaid() {
        let nodes = parse("```rust\nfn main() {}\n```\n\n```Mermaid\ngraph TD\n```");
        assert_eq!(
            nodes,
            vec![
                Node::CodeBlock(CodeBlockNode {
                    language: Some("rust".to_owned()),
                    content: "fn main() {}".to_owned(),
                }),
                Node::Diagram(DiagramNode {
                    content: "graph TD".to_owned(),
                }),
            ]
        );
    }

    #[test]
    fn test_indented_code_has_no_language() {
        let nodes = parse("    let x = 1;");
        assert!(matches!(&nodes[0], Node::CodeBlock(c) if c.language.is_none()));
    }

    #[test]
    fn test_lists_nested_and_ordered() {
        let nodes = parse("1. one\n2. two\n   - inner\n");
        let Node::List(list) = &nodes[0] else {
            panic!("expected list");
        };
        assert_eq!(list.list_type, ListKind::Ordered);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].children, vec![Node::text("one")]);
        let nested = &list.items[1].children[1];
        assert!(matches!(nested, Node::List(l) if l.list_type == ListKind::Bullet));
    }

    #[test]
    fn test_task_list() {
        let nodes = parse("- [x] done\n- [ ] todo\n- plain");
        let Node::List(list) = &nodes[0] else {
            panic!("expected list");
        };
        let checked: Vec<_> = list.items.iter().map(|i| i.checked).collect();
        assert_eq!(checked, vec![Some(true), Some(false), None]);
    }

    #[test]
    fn test_table_with_alignment() {
        let nodes = parse("| a | b |\n|:--|--:|\n| 1 | 2 |\n| 3 | 4 |");
        let Node::Table(table) = &nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].cells[0].children, vec![Node::text("a")]);
        assert_eq!(table.rows[0].cells[0].align, Some(TextAlign::Left));
        assert_eq!(table.rows[2].cells[1].align, Some(TextAlign::Right));
    }

    #[test]
    fn test_nested_blockquote_and_rule() {
        assert_eq!(
            parse("> outer\n>\n> > inner\n\n---"),
            vec![
                Node::blockquote(vec![
                    Node::paragraph(vec![Node::text("outer")]),
                    Node::blockquote(vec![Node::paragraph(vec![Node::text("inner")])]),
                ]),
                Node::HorizontalRule,
            ]
        );
    }

    #[test]
    fn test_inline_and_display_math() {
        let nodes = parse("area $\\pi r^2$\n\n$$E = mc^2$$");
        let Node::Paragraph(para) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert!(matches!(&para.children[1], Node::Math(m) if !m.display && m.content == "\\pi r^2"));
        assert!(matches!(&nodes[1], Node::Math(m) if m.display && m.content == "E = mc^2"));
    }

    #[test]
    fn test_raw_html_is_dropped() {
        assert_eq!(
            parse("a <b>bold</b> c"),
            vec![Node::paragraph(vec![Node::text("a bold c")])]
        );
    }

    #[test]
    fn test_gfm_disabled_keeps_table_as_text() {
        let root = MarkdownParser::new()
            .with_gfm(false)
            .parse("| a |\n|---|\n| 1 |")
            .unwrap();
        assert!(matches!(&root.children[0], Node::Paragraph(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }
}
