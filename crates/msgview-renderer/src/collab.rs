//! Math and diagram collaborators.
//!
//! The engine only places math and diagrams. Hosts that can typeset them plug
//! a renderer in here; a failing renderer never fails the render.

/// Error from a math or diagram collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Math typesetting failed: {0}")]
    Math(String),
    #[error("Diagram rendering failed: {0}")]
    Diagram(String),
}

/// Typesets TeX into host markup.
pub trait MathRenderer: Send + Sync {
    /// Render `tex`. `display` selects block layout over inline.
    fn render_math(&self, tex: &str, display: bool) -> Result<String, CollaboratorError>;
}

/// Draws diagram source (mermaid) into host markup.
pub trait DiagramRenderer: Send + Sync {
    fn render_diagram(&self, source: &str) -> Result<String, CollaboratorError>;
}
