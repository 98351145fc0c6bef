//! The minimal document capability set the engine needs
//!
//! Both the in-memory [`crate::memory::MemoryTree`] and the browser DOM
//! binding implement [`TextTree`], so locating, highlighting and navigation
//! are written once against this trait.
//!
//! Offsets are byte offsets into the node's text as a Rust `String`; a
//! binding whose native offsets differ (UTF-16 in the DOM) converts at the
//! boundary.

use crate::error::AnchorError;
use shared_types::{Issue, Severity};
use std::fmt;

/// Attribute holding the issue index on a marker
pub const ATTR_ISSUE_INDEX: &str = "data-issue-index";
/// Attribute holding the reported span on a marker
pub const ATTR_ISSUE_TEXT: &str = "data-issue-text";

pub trait TextTree {
    type Node: Clone + PartialEq + fmt::Debug;

    /// Text content of the whole document body
    fn plain_text(&self) -> String;

    /// Text nodes under the body, depth-first pre-order
    fn text_nodes(&self) -> Vec<Self::Node>;

    /// Text content of a text node or of an element's subtree
    fn text_content(&self, node: &Self::Node) -> String;

    /// Split a text node at `offset`. The original node keeps the head and
    /// the returned sibling holds the tail.
    fn split_text(&mut self, node: &Self::Node, offset: usize) -> Result<Self::Node, AnchorError>;

    /// Put a new marker element where `node` is and move `node` inside it
    fn wrap_in_marker(
        &mut self,
        node: &Self::Node,
        marker: &MarkerSpec,
    ) -> Result<Self::Node, AnchorError>;

    /// Replace an element with its children; returns the former parent
    fn unwrap_element(&mut self, element: &Self::Node) -> Result<Self::Node, AnchorError>;

    /// Merge adjacent text nodes and drop empty ones below `node`
    fn normalize(&mut self, node: &Self::Node);

    /// Elements carrying `class`, in document order
    fn elements_with_class(&self, class: &str) -> Vec<Self::Node>;

    fn attribute(&self, element: &Self::Node, name: &str) -> Option<String>;

    fn has_class(&self, element: &Self::Node, class: &str) -> bool;

    fn add_class(&mut self, element: &Self::Node, class: &str) -> Result<(), AnchorError>;

    fn remove_class(&mut self, element: &Self::Node, class: &str) -> Result<(), AnchorError>;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Insert a stylesheet with `id` unless one already exists. Returns
    /// whether it was inserted.
    fn ensure_stylesheet(&mut self, id: &str, css: &str) -> Result<bool, AnchorError>;

    /// Smoothly scroll `element` to the centre of the viewport
    fn scroll_into_view(&mut self, element: &Self::Node);

    /// Whether the node occupies any layout space
    fn is_rendered(&self, _node: &Self::Node) -> bool {
        true
    }
}

/// Everything a marker element carries
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub issue_index: usize,
    pub severity: Severity,
    /// The reported span, trimmed
    pub source_text: String,
    pub title: String,
    pub marker_class: String,
}

impl MarkerSpec {
    pub fn for_issue(issue_index: usize, issue: &Issue, marker_class: &str) -> Self {
        Self {
            issue_index,
            severity: issue.severity,
            source_text: issue.span.trim().to_string(),
            title: issue.tooltip(),
            marker_class: marker_class.to_string(),
        }
    }

    /// Classes in the order they are written to the element
    pub fn classes(&self) -> Vec<String> {
        vec![self.marker_class.clone(), self.severity.css_class()]
    }

    pub fn class_attribute(&self) -> String {
        self.classes().join(" ")
    }

    /// Attribute pairs written to the element besides `class`
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            (ATTR_ISSUE_INDEX, self.issue_index.to_string()),
            (ATTR_ISSUE_TEXT, self.source_text.clone()),
            ("title", self.title.clone()),
        ]
    }
}

/// Issue index recorded on a marker, if it carries a well-formed one
pub fn marker_issue_index<T: TextTree>(tree: &T, marker: &T::Node) -> Option<usize> {
    tree.attribute(marker, ATTR_ISSUE_INDEX)?.parse().ok()
}
