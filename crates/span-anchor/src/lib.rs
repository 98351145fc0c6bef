//! Fuzzy text anchoring and highlighting for rendered filing documents
//!
//! An external validator reports issues by quoting a span of the document.
//! The quote rarely matches the rendered text byte for byte, so this crate:
//! - expands the span into ranked search candidates (`normalize`)
//! - finds the first candidate inside a single text node (`locate`)
//! - wraps the hit in a marker element and can remove it again (`highlight`)
//! - scrolls to and flashes a marker on request (`navigate`, `flash`)
//!
//! Everything runs against the [`TextTree`] trait. [`MemoryTree`] is the
//! browser-free implementation; the wasm app binds the DOM.

pub mod config;
pub mod error;
pub mod flash;
pub mod highlight;
pub mod locate;
pub mod markup;
pub mod memory;
pub mod navigate;
pub mod normalize;
pub mod session;
pub mod tree;

pub use config::AnchorConfig;
pub use error::AnchorError;
pub use flash::{FlashAction, FlashTimers, ManualTimers, TimerId};
pub use highlight::{HighlightReport, Highlighter, IssueFailure, PlacedMarker};
pub use locate::{locate, locate_span, locate_unmarked, Position};
pub use memory::{MemoryTree, NodeId};
pub use navigate::{HitSource, NavigationHit, Navigator};
pub use normalize::{candidates, collapse_whitespace, Candidate, Normalizer, Tier};
pub use session::{
    summary_message, RevisionTicket, RunTicket, ValidationPhase, ValidationSession,
    ValidationStatus,
};
pub use tree::{MarkerSpec, TextTree};

/// Text sent to the validation service: the document's text content with
/// whitespace runs collapsed and trimmed
pub fn plain_text_for_validation<T: TextTree>(tree: &T) -> String {
    collapse_whitespace(&tree.plain_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_for_validation() {
        let tree = MemoryTree::from_paragraphs(&["  제1부\n\n", "모집 또는\t매출  "]);
        assert_eq!(plain_text_for_validation(&tree), "제1부 모집 또는 매출");
    }
}
