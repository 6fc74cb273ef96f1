//! Rich-text delta (`{"ops": [...]}`) to document tree conversion.
//!
//! A delta is a flat list of inserts. Character formatting rides on text
//! inserts; line formatting (lists, headers, quotes) rides on the newline that
//! ends the line.

use msgview_ast::{
    ColorNode, DocumentParser, EmojiNode, ImageNode, LinkNode, ListItemNode, ListKind, MathNode,
    MentionNode, Node, ParseError, RootNode,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::math::{Segment, split_math};

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    ops: Vec<Op>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Op {
    Insert {
        insert: Insert,
        #[serde(default)]
        attributes: Attributes,
    },
    Retain {
        #[allow(dead_code)]
        retain: Value,
    },
    Delete {
        #[allow(dead_code)]
        delete: u64,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Insert {
    Text(String),
    Embed(Map<String, Value>),
}

/// Formatting attributes. `null` means "not set", as in change deltas.
#[derive(Default, Deserialize)]
#[serde(default)]
struct Attributes {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strike: Option<bool>,
    code: Option<bool>,
    link: Option<String>,
    color: Option<String>,
    list: Option<String>,
    header: Option<u8>,
    blockquote: Option<bool>,
}

/// Line-level shape taken from the attributes of a terminating newline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineFormat {
    Plain,
    ListItem(ListKind, Option<bool>),
    Header(u8),
    Quote,
}

impl LineFormat {
    fn from_attributes(attrs: &Attributes) -> Self {
        if let Some(list) = attrs.list.as_deref() {
            return match list {
                "ordered" => Self::ListItem(ListKind::Ordered, None),
                "checked" => Self::ListItem(ListKind::Bullet, Some(true)),
                "unchecked" => Self::ListItem(ListKind::Bullet, Some(false)),
                _ => Self::ListItem(ListKind::Bullet, None),
            };
        }
        if let Some(level) = attrs.header.filter(|level| (1..=6).contains(level)) {
            return Self::Header(level);
        }
        if attrs.blockquote == Some(true) {
            return Self::Quote;
        }
        Self::Plain
    }
}

/// Parser for rich-text deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaParser;

impl DocumentParser for DeltaParser {
    fn parse(&self, input: &str) -> Result<RootNode, ParseError> {
        let delta: Delta =
            serde_json::from_str(input).map_err(|e| ParseError::Delta(e.to_string()))?;

        let mut builder = LineBuilder::default();
        for op in delta.ops {
            match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    attributes,
                } => builder.insert_text(&text, &attributes),
                Op::Insert {
                    insert: Insert::Embed(embed),
                    ..
                } => builder.insert_embed(&embed),
                Op::Retain { .. } | Op::Delete { .. } => {}
            }
        }
        Ok(RootNode::new(builder.finish()))
    }
}

#[derive(Default)]
struct LineBuilder {
    blocks: Vec<Node>,
    line: Vec<Node>,
    list: Option<(ListKind, Vec<ListItemNode>)>,
}

impl LineBuilder {
    fn insert_text(&mut self, text: &str, attrs: &Attributes) {
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.push_styled(first, attrs);
        }
        for piece in pieces {
            self.end_line(LineFormat::from_attributes(attrs));
            self.push_styled(piece, attrs);
        }
    }

    fn insert_embed(&mut self, embed: &Map<String, Value>) {
        if let Some(image) = image_embed(embed) {
            if !self.line.is_empty() {
                self.end_line(LineFormat::Plain);
            }
            self.close_list();
            self.blocks.push(Node::Image(image));
        } else if let Some(mention) = embed.get("mention") {
            let id = string_field(mention, "id").unwrap_or_default();
            let name = string_field(mention, "name");
            self.line.push(Node::Mention(MentionNode { id, name }));
        } else if let Some(emoji) = embed.get("emoji") {
            let content = emoji
                .as_str()
                .map(str::to_owned)
                .or_else(|| string_field(emoji, "content"))
                .unwrap_or_default();
            self.line.push(Node::Emoji(EmojiNode { content }));
        } else if let Some(formula) = embed.get("formula").and_then(Value::as_str) {
            self.line.push(Node::Math(MathNode {
                content: formula.trim().to_owned(),
                display: false,
            }));
        } else {
            tracing::debug!(
                keys = ?embed.keys().collect::<Vec<_>>(),
                "Skipping unsupported delta embed"
            );
        }
    }

    fn push_styled(&mut self, text: &str, attrs: &Attributes) {
        for segment in split_math(text) {
            match segment {
                Segment::Text(literal) => self.line.push(styled_text(literal, attrs)),
                Segment::Math { content, display } => self.line.push(Node::Math(MathNode {
                    content: content.to_owned(),
                    display,
                })),
            }
        }
    }

    fn end_line(&mut self, format: LineFormat) {
        let children = std::mem::take(&mut self.line);
        if let LineFormat::ListItem(kind, checked) = format {
            let item = ListItemNode { children, checked };
            if let Some((open, items)) = &mut self.list
                && *open == kind
            {
                items.push(item);
            } else {
                self.close_list();
                self.list = Some((kind, vec![item]));
            }
            return;
        }

        self.close_list();
        match format {
            LineFormat::Header(level) => self.blocks.push(Node::heading(level, children)),
            LineFormat::Quote => {
                let paragraph = Node::paragraph(children);
                if let Some(Node::Blockquote(quote)) = self.blocks.last_mut() {
                    quote.children.push(paragraph);
                } else {
                    self.blocks.push(Node::blockquote(vec![paragraph]));
                }
            }
            LineFormat::Plain | LineFormat::ListItem(..) => {
                self.blocks.push(Node::paragraph(children));
            }
        }
    }

    fn close_list(&mut self) {
        if let Some((kind, items)) = self.list.take() {
            self.blocks.push(Node::list(kind, items));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        if !self.line.is_empty() {
            self.end_line(LineFormat::Plain);
        }
        self.close_list();
        self.blocks
    }
}

/// Wrap `text` in its character formatting, outermost first: bold, italic,
/// underline, strike, link, color.
fn styled_text(text: &str, attrs: &Attributes) -> Node {
    if attrs.code == Some(true) {
        return Node::code(text);
    }

    let mut node = Node::text(text);
    if let Some(color) = &attrs.color {
        node = Node::Color(ColorNode {
            color: color.clone(),
            children: vec![node],
        });
    }
    if let Some(url) = &attrs.link {
        node = Node::Link(LinkNode {
            url: Some(url.clone()),
            children: vec![node],
        });
    }
    if attrs.strike == Some(true) {
        node = Node::strike(vec![node]);
    }
    if attrs.underline == Some(true) {
        node = Node::underline(vec![node]);
    }
    if attrs.italic == Some(true) {
        node = Node::em(vec![node]);
    }
    if attrs.bold == Some(true) {
        node = Node::strong(vec![node]);
    }
    node
}

#[allow(clippy::cast_possible_truncation)]
fn image_embed(embed: &Map<String, Value>) -> Option<ImageNode> {
    if let Some(url) = embed.get("image").and_then(Value::as_str) {
        return Some(ImageNode {
            url: Some(url.to_owned()),
            ..ImageNode::default()
        });
    }
    let container = embed.get("imageContainer")?;
    let number = |key: &str| {
        container
            .get(key)
            .and_then(Value::as_f64)
            .map(|value| value as f32)
    };
    Some(ImageNode {
        url: string_field(container, "url").filter(|url| !url.is_empty()),
        width: number("width"),
        height: number("height"),
        alt: string_field(container, "alt"),
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
