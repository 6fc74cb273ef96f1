//! Document node types.
//!
//! The JSON shape follows the interchange format shared with the host SDKs:
//! every node is an object with a camelCase `"type"` tag.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Root of a parsed document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    /// Top-level nodes in rendering order.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl RootNode {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Parse a document from its JSON interchange form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the document to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the document to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A document node.
///
/// The set of variants is closed. Documents produced by newer parsers may
/// contain kinds this build does not know; those deserialize to
/// [`Node::Unknown`] instead of failing the whole document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Paragraph(ContainerNode),
    Heading(HeadingNode),
    Text(TextNode),
    Strong(ContainerNode),
    Em(ContainerNode),
    Underline(ContainerNode),
    Strike(ContainerNode),
    Color(ColorNode),
    Code(CodeNode),
    CodeBlock(CodeBlockNode),
    Link(LinkNode),
    Image(ImageNode),
    List(ListNode),
    Table(TableNode),
    Math(MathNode),
    #[serde(rename = "mermaid", alias = "diagram")]
    Diagram(DiagramNode),
    Card(CardNode),
    Mention(MentionNode),
    Emoji(EmojiNode),
    Blockquote(ContainerNode),
    HorizontalRule,
    #[serde(other)]
    Unknown,
}

impl Node {
    /// Tag name used in the JSON interchange format.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Paragraph(_) => "paragraph",
            Self::Heading(_) => "heading",
            Self::Text(_) => "text",
            Self::Strong(_) => "strong",
            Self::Em(_) => "em",
            Self::Underline(_) => "underline",
            Self::Strike(_) => "strike",
            Self::Color(_) => "color",
            Self::Code(_) => "code",
            Self::CodeBlock(_) => "codeBlock",
            Self::Link(_) => "link",
            Self::Image(_) => "image",
            Self::List(_) => "list",
            Self::Table(_) => "table",
            Self::Math(_) => "math",
            Self::Diagram(_) => "mermaid",
            Self::Card(_) => "card",
            Self::Mention(_) => "mention",
            Self::Emoji(_) => "emoji",
            Self::Blockquote(_) => "blockquote",
            Self::HorizontalRule => "horizontalRule",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the node flows within a line of text.
    ///
    /// Links count as inline; a link standing alone among blocks is still
    /// rendered as a block wrapper by the dispatcher. Math is inline only when
    /// it is not display math.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self {
            Self::Text(_)
            | Self::Strong(_)
            | Self::Em(_)
            | Self::Underline(_)
            | Self::Strike(_)
            | Self::Color(_)
            | Self::Code(_)
            | Self::Link(_)
            | Self::Mention(_)
            | Self::Emoji(_) => true,
            Self::Math(math) => !math.display,
            _ => false,
        }
    }

    /// Child nodes, for kinds that have them.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Paragraph(c)
            | Self::Strong(c)
            | Self::Em(c)
            | Self::Underline(c)
            | Self::Strike(c)
            | Self::Blockquote(c) => &c.children,
            Self::Heading(h) => &h.children,
            Self::Color(c) => &c.children,
            Self::Link(l) => &l.children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextNode {
            content: content.into(),
        })
    }

    #[must_use]
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::Paragraph(ContainerNode { children })
    }

    #[must_use]
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Self::Heading(HeadingNode { level, children })
    }

    #[must_use]
    pub fn strong(children: Vec<Node>) -> Self {
        Self::Strong(ContainerNode { children })
    }

    #[must_use]
    pub fn em(children: Vec<Node>) -> Self {
        Self::Em(ContainerNode { children })
    }

    #[must_use]
    pub fn underline(children: Vec<Node>) -> Self {
        Self::Underline(ContainerNode { children })
    }

    #[must_use]
    pub fn strike(children: Vec<Node>) -> Self {
        Self::Strike(ContainerNode { children })
    }

    #[must_use]
    pub fn code(content: impl Into<String>) -> Self {
        Self::Code(CodeNode {
            content: content.into(),
        })
    }

    #[must_use]
    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Link(LinkNode {
            url: Some(url.into()),
            children,
        })
    }

    #[must_use]
    pub fn blockquote(children: Vec<Node>) -> Self {
        Self::Blockquote(ContainerNode { children })
    }

    #[must_use]
    pub fn list(list_type: ListKind, items: Vec<ListItemNode>) -> Self {
        Self::List(ListNode { list_type, items })
    }
}

/// Node whose only payload is an ordered child list.
///
/// Shared by paragraphs, blockquotes and the formatting spans.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadingNode {
    /// 1-based level. Values outside 1-6 are tolerated by the renderer.
    #[serde(default = "default_heading_level", deserialize_with = "heading_level")]
    pub level: u8,
    #[serde(default)]
    pub children: Vec<Node>,
}

fn default_heading_level() -> u8 {
    1
}

/// Integer levels saturate into `u8`; anything else becomes level 1.
fn heading_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let level = match Value::deserialize(deserializer)? {
        Value::Number(n) => match n.as_i64() {
            Some(n) => u8::try_from(n.clamp(0, i64::from(u8::MAX))).unwrap_or(u8::MAX),
            None if n.is_u64() => u8::MAX,
            None => default_heading_level(),
        },
        _ => default_heading_level(),
    };
    Ok(level)
}

/// Falls back to `T::default()` when the value has the wrong shape, such as
/// an enum variant added by a newer producer.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(default)]
    pub content: String,
}

/// Text color override, e.g. `"#FF0000"` or `"rgb(255,0,0)"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorNode {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeNode {
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeBlockNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkNode {
    /// Target URL. A link without one renders as plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Bullet,
    Ordered,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    /// Unrecognized kinds render as bullets.
    #[serde(rename = "listType", default, deserialize_with = "or_default")]
    pub list_type: ListKind,
    #[serde(default)]
    pub items: Vec<ListItemNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemNode {
    #[serde(default)]
    pub children: Vec<Node>,
    /// `None` for a plain item, `Some(done)` for a task item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl ListItemNode {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            checked: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub children: Vec<Node>,
    /// Unrecognized alignments are dropped.
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MathNode {
    /// TeX source.
    #[serde(default)]
    pub content: String,
    /// `true` for display (`$$`) math, `false` for inline (`$`).
    #[serde(default)]
    pub display: bool,
}

/// Graph description source (Mermaid).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardNode {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionNode {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MentionNode {
    /// Name shown after the `@`, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmojiNode {
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_paragraph() {
        let json = r#"{"children":[{"type":"paragraph","children":[
            {"type":"text","content":"a"},
            {"type":"strong","children":[{"type":"text","content":"b"}]}
        ]}]}"#;
        let root = RootNode::from_json(json).unwrap();
        assert_eq!(
            root,
            RootNode::new(vec![Node::paragraph(vec![
                Node::text("a"),
                Node::strong(vec![Node::text("b")]),
            ])])
        );
    }

    #[test]
    fn test_unknown_kind_deserializes_to_unknown() {
        let json = r#"{"children":[
            {"type":"paragraph","children":[]},
            {"type":"hologram","payload":{"x":1}},
            {"type":"horizontalRule"}
        ]}"#;
        let root = RootNode::from_json(json).unwrap();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1], Node::Unknown);
        assert_eq!(root.children[2], Node::HorizontalRule);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{"children":[
            {"type":"link","children":[{"type":"text","content":"x"}]},
            {"type":"image"},
            {"type":"list","items":[{"children":[]}]}
        ]}"#;
        let root = RootNode::from_json(json).unwrap();
        let Node::Link(link) = &root.children[0] else {
            panic!("expected link");
        };
        assert!(link.url.is_none());
        let Node::Image(image) = &root.children[1] else {
            panic!("expected image");
        };
        assert!(image.url.is_none());
        assert!(image.alt.is_none());
        let Node::List(list) = &root.children[2] else {
            panic!("expected list");
        };
        assert_eq!(list.list_type, ListKind::Bullet);
        assert_eq!(list.items[0].checked, None);
    }

    #[test]
    fn test_unrecognized_field_values_stay_local() {
        let json = r#"{"children":[
            {"type":"paragraph","children":[{"type":"text","content":"kept"}]},
            {"type":"table","rows":[{"cells":[{"children":[],"align":"justify"}]}]},
            {"type":"list","listType":"checklist","items":[]},
            {"type":"heading","level":300,"children":[]},
            {"type":"heading","level":-2,"children":[]},
            {"type":"heading","level":"two","children":[]}
        ]}"#;
        let root = RootNode::from_json(json).unwrap();
        assert_eq!(root.children.len(), 6);
        assert_eq!(root.children[0], Node::paragraph(vec![Node::text("kept")]));
        let Node::Table(table) = &root.children[1] else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].cells[0].align, None);
        let Node::List(list) = &root.children[2] else {
            panic!("expected list");
        };
        assert_eq!(list.list_type, ListKind::Bullet);
        let levels: Vec<u8> = root.children[3..]
            .iter()
            .filter_map(|node| match node {
                Node::Heading(h) => Some(h.level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![255, 0, 1]);
    }

    #[test]
    fn test_recognized_align_and_list_kind_still_parse() {
        let json = r#"{"children":[
            {"type":"table","rows":[{"cells":[{"children":[],"align":"center"}]}]},
            {"type":"list","listType":"ordered","items":[]},
            {"type":"heading","level":3,"children":[]}
        ]}"#;
        let root = RootNode::from_json(json).unwrap();
        assert!(matches!(
            &root.children[0],
            Node::Table(t) if t.rows[0].cells[0].align == Some(TextAlign::Center)
        ));
        assert!(matches!(&root.children[1], Node::List(l) if l.list_type == ListKind::Ordered));
        assert!(matches!(&root.children[2], Node::Heading(h) if h.level == 3));
    }

    #[test]
    fn test_diagram_tag_and_alias() {
        let json = r#"{"children":[
            {"type":"mermaid","content":"graph TD; A-->B"},
            {"type":"diagram","content":"graph LR; C-->D"}
        ]}"#;
        let root = RootNode::from_json(json).unwrap();
        assert!(matches!(&root.children[0], Node::Diagram(d) if d.content.starts_with("graph TD")));
        assert!(matches!(&root.children[1], Node::Diagram(d) if d.content.starts_with("graph LR")));

        let out = root.to_json().unwrap();
        assert!(out.contains(r#""type":"mermaid""#));
    }

    #[test]
    fn test_serialize_uses_interchange_field_names() {
        let root = RootNode::new(vec![
            Node::list(ListKind::Ordered, vec![ListItemNode::new(vec![])]),
            Node::CodeBlock(CodeBlockNode {
                language: Some("rust".to_owned()),
                content: "fn main() {}".to_owned(),
            }),
        ]);
        let json = root.to_json().unwrap();
        assert!(json.contains(r#""type":"list""#));
        assert!(json.contains(r#""listType":"ordered""#));
        assert!(json.contains(r#""type":"codeBlock""#));
    }

    #[test]
    fn test_heading_level_defaults_to_one() {
        let root = RootNode::from_json(r#"{"children":[{"type":"heading","children":[]}]}"#)
            .unwrap();
        assert!(matches!(&root.children[0], Node::Heading(h) if h.level == 1));
    }

    #[test]
    fn test_is_inline() {
        assert!(Node::text("x").is_inline());
        assert!(Node::link("u", vec![]).is_inline());
        assert!(
            Node::Math(MathNode {
                content: "x".to_owned(),
                display: false
            })
            .is_inline()
        );
        assert!(
            !Node::Math(MathNode {
                content: "x".to_owned(),
                display: true
            })
            .is_inline()
        );
        assert!(!Node::paragraph(vec![]).is_inline());
        assert!(!Node::Unknown.is_inline());
    }

    #[test]
    fn test_mention_display_name_falls_back_to_id() {
        let mention = MentionNode {
            id: "u42".to_owned(),
            name: None,
        };
        assert_eq!(mention.display_name(), "u42");
    }

    #[test]
    fn test_children_accessor() {
        let node = Node::em(vec![Node::text("a"), Node::text("b")]);
        assert_eq!(node.children().len(), 2);
        assert!(Node::HorizontalRule.children().is_empty());
    }
}
