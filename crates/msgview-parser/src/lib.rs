//! Source format parsers for msgview.
//!
//! Each parser implements [`DocumentParser`] and produces the shared document
//! model from `msgview-ast`:
//! - [`MarkdownParser`]: CommonMark with GFM extensions and `$` math
//! - [`DeltaParser`]: rich-text editor deltas (`{"ops": [...]}`)
//!
//! # Example
//!
//! ```
//! use msgview_ast::{DocumentParser, Node};
//! use msgview_parser::MarkdownParser;
//!
//! let root = MarkdownParser::new().parse("# Hello").unwrap();
//! assert!(matches!(root.children[0], Node::Heading(_)));
//! ```

mod delta;
mod markdown;
mod math;

pub use delta::DeltaParser;
pub use markdown::MarkdownParser;
pub use msgview_ast::{DocumentParser, JsonParser, ParseError};

/// Source formats understood by this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Markdown,
    Delta,
    Json,
}

impl InputFormat {
    /// Name as written in configuration files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Delta => "delta",
            Self::Json => "json",
        }
    }

    /// Parser for this format.
    #[must_use]
    pub fn parser(self) -> Box<dyn DocumentParser + Send + Sync> {
        match self {
            Self::Markdown => Box::new(MarkdownParser::new()),
            Self::Delta => Box::new(DeltaParser),
            Self::Json => Box::new(JsonParser),
        }
    }

    /// Guess the format from a file name.
    ///
    /// `.json` is the document interchange form, `.delta` and `.delta.json`
    /// are deltas; anything else is treated as markdown.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".delta") || lower.ends_with(".delta.json") {
            Self::Delta
        } else if lower.ends_with(".json") {
            Self::Json
        } else {
            Self::Markdown
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(Self::Markdown),
            "delta" => Ok(Self::Delta),
            "json" | "ast" => Ok(Self::Json),
            other => Err(format!(
                "unknown input format '{other}' (expected markdown, delta or json)"
            )),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
