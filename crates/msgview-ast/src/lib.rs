//! Document model for msgview.
//!
//! Parsers produce a [`RootNode`]; renderers consume it. The tree is plain
//! immutable data with a JSON interchange form, so documents can cross process
//! and language boundaries unchanged.
//!
//! # Example
//!
//! ```
//! use msgview_ast::{DocumentParser, JsonParser, Node};
//!
//! let root = JsonParser
//!     .parse(r#"{"children":[{"type":"text","content":"hi"}]}"#)
//!     .unwrap();
//! assert_eq!(root.children, vec![Node::text("hi")]);
//! ```

mod node;

pub use node::{
    CardNode, CodeBlockNode, CodeNode, ColorNode, ContainerNode, DiagramNode, EmojiNode,
    HeadingNode, ImageNode, LinkNode, ListItemNode, ListKind, ListNode, MathNode, MentionNode,
    Node, RootNode, TableCell, TableNode, TableRow, TextAlign, TextNode,
};

/// Error produced while turning source text into a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid markdown: {0}")]
    Markdown(String),
    #[error("Invalid delta: {0}")]
    Delta(String),
}

/// Source format to document conversion.
///
/// Implementations must be pure: the same input always yields the same tree.
pub trait DocumentParser {
    /// Parse `input` into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid document in this format.
    fn parse(&self, input: &str) -> Result<RootNode, ParseError>;
}

/// Parser for the JSON interchange form.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn parse(&self, input: &str) -> Result<RootNode, ParseError> {
        Ok(RootNode::from_json(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_parser_rejects_malformed_input() {
        let err = JsonParser.parse("{not json").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
        assert!(err.to_string().starts_with("Invalid document JSON"));
    }

    #[test]
    fn test_json_parser_accepts_empty_root() {
        let root = JsonParser.parse("{}").unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_json_round_trip_preserves_tree() {
        let root = RootNode::new(vec![
            Node::heading(2, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::link("https://a.b", vec![Node::text("a")])]),
        ]);
        let json = root.to_json_pretty().unwrap();
        assert_eq!(JsonParser.parse(&json).unwrap(), root);
    }
}
