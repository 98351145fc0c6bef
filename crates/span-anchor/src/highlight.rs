//! Highlight Mutator
//!
//! Marking is purely additive: text is split and wrapped, never rewritten,
//! so the document's plain text is identical before and after a pass and
//! after clearing it again.

use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::locate::{locate_unmarked, Position};
use crate::normalize::{Normalizer, Tier};
use crate::tree::{MarkerSpec, TextTree};
use shared_types::Issue;
use tracing::{debug, info, warn};

/// A marker placed during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker<N> {
    pub issue_index: usize,
    pub node: N,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueFailure {
    pub issue_index: usize,
    pub error: AnchorError,
}

/// Outcome of one highlight pass
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightReport<N> {
    pub markers: Vec<PlacedMarker<N>>,
    /// Issues whose span could not be anchored anywhere
    pub unmatched: Vec<usize>,
    /// Issues whose span was located but could not be wrapped
    pub failed: Vec<IssueFailure>,
}

impl<N> Default for HighlightReport<N> {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            unmatched: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<N> HighlightReport<N> {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: AnchorConfig,
    normalizer: Normalizer,
}

impl Highlighter {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Unwrap every marker and coalesce the surrounding text. Safe to call
    /// with no markers present. Returns the number of markers removed.
    pub fn clear_highlights<T: TextTree>(&self, tree: &mut T) -> usize {
        let mut removed = 0;
        for marker in tree.elements_with_class(&self.config.marker_class) {
            match tree.unwrap_element(&marker) {
                Ok(parent) => {
                    tree.normalize(&parent);
                    removed += 1;
                }
                Err(e) => warn!(error = %e, "failed to remove highlight marker"),
            }
        }
        if removed > 0 {
            debug!(removed, "cleared highlight markers");
        }
        removed
    }

    /// Wrap the located range in a marker, leaving the text before and
    /// after as plain siblings. Empty pieces are never created.
    pub fn apply_highlight<T: TextTree>(
        &self,
        tree: &mut T,
        position: &Position<T::Node>,
        marker: &MarkerSpec,
    ) -> Result<T::Node, AnchorError> {
        if position.is_empty() {
            return Err(AnchorError::OffsetOutOfBounds {
                offset: position.start,
                len: 0,
            });
        }
        tree.ensure_stylesheet(&self.config.stylesheet_id, &self.stylesheet())?;

        let text_len = tree.text_content(&position.node).len();
        if position.end > text_len {
            return Err(AnchorError::OffsetOutOfBounds {
                offset: position.end,
                len: text_len,
            });
        }

        let wrapped = self.split_and_wrap(tree, position, text_len, marker);
        if wrapped.is_err() {
            // rejoin any split made before the failure
            if let Some(parent) = tree.parent_element(&position.node) {
                tree.normalize(&parent);
            }
        }
        wrapped
    }

    fn split_and_wrap<T: TextTree>(
        &self,
        tree: &mut T,
        position: &Position<T::Node>,
        text_len: usize,
        marker: &MarkerSpec,
    ) -> Result<T::Node, AnchorError> {
        let mut matched = position.node.clone();
        if position.start > 0 {
            matched = tree.split_text(&matched, position.start)?;
        }
        if position.end < text_len {
            tree.split_text(&matched, position.len())?;
        }
        tree.wrap_in_marker(&matched, marker)
    }

    /// Clear prior markers, then anchor and wrap every issue in order.
    ///
    /// Unmatched issues are skipped silently; a failure on one issue is
    /// logged and does not stop the remaining issues. Text wrapped earlier
    /// in the pass is not matched again, so repeated spans take later
    /// occurrences.
    pub fn highlight_issues<T: TextTree>(
        &self,
        tree: &mut T,
        issues: &[Issue],
    ) -> HighlightReport<T::Node> {
        self.clear_highlights(tree);

        let mut report = HighlightReport::default();
        for (issue_index, issue) in issues.iter().enumerate() {
            let candidates = self.normalizer.candidates(&issue.span);
            let Some(position) = locate_unmarked(tree, &candidates, &self.config.marker_class)
            else {
                debug!(issue_index, "could not anchor issue span");
                report.unmatched.push(issue_index);
                continue;
            };

            let marker = MarkerSpec::for_issue(issue_index, issue, &self.config.marker_class);
            match self.apply_highlight(tree, &position, &marker) {
                Ok(node) => report.markers.push(PlacedMarker {
                    issue_index,
                    node,
                    tier: position.candidate.tier,
                }),
                Err(error) => {
                    warn!(issue_index, error = %error, "text highlighting failed");
                    report.failed.push(IssueFailure { issue_index, error });
                }
            }
        }

        info!(
            issues = issues.len(),
            markers = report.markers.len(),
            unmatched = report.unmatched.len(),
            failed = report.failed.len(),
            "highlight pass complete"
        );
        report
    }

    /// Stylesheet inserted once per document: severity colours and the
    /// flash pulse used by navigation
    pub fn stylesheet(&self) -> String {
        let marker = &self.config.marker_class;
        let flash = &self.config.flash_class;
        format!(
            r#"@keyframes flash {{
  0%, 100% {{ background-color: inherit; transform: scale(1); }}
  50% {{ background-color: #fbbf24 !important; transform: scale(1.02); }}
}}
.{marker} {{
  transition: all 0.3s ease;
  cursor: pointer;
  position: relative;
  padding: 2px 4px;
  border-radius: 3px;
}}
.{marker}.validation-high {{ background-color: rgba(239, 68, 68, 0.3) !important; border-bottom: 2px solid #ef4444; }}
.{marker}.validation-medium {{ background-color: rgba(245, 158, 11, 0.3) !important; border-bottom: 2px solid #f59e0b; }}
.{marker}.validation-low {{ background-color: rgba(234, 179, 8, 0.3) !important; border-bottom: 2px solid #eab308; }}
.{marker}.{flash} {{ animation: flash 1s ease-in-out 3; }}
"#
        )
    }
}
