use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("Node is no longer attached to the document")]
    Detached,

    #[error("Offset {offset} is outside text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Expected a text node")]
    NotText,

    #[error("Expected an element")]
    NotElement,

    #[error("Document mutation failed: {0}")]
    Mutation(String),

    #[error("Timer scheduling failed: {0}")]
    Timer(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Validation run {0} was superseded by a newer run")]
    StaleRun(u64),

    #[error("No issue at index {0}")]
    UnknownIssue(usize),

    #[error("Section not found: .{section_type}[data-section=\"{name}\"]")]
    SectionNotFound { section_type: String, name: String },

    #[error("Document not available: {0}")]
    NoDocument(String),
}
