//! Navigation/Flash Controller
//!
//! Resolves an issue to an element, moves the flash class onto it and
//! schedules a centred scroll plus the flash removal. The navigator owns at
//! most one active flash; every navigation cancels the previous one first.

use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::flash::{FlashAction, FlashTimers};
use crate::locate::{contains_ignore_case, locate};
use crate::normalize::{char_prefix, Normalizer, Tier};
use crate::tree::{marker_issue_index, TextTree, ATTR_ISSUE_TEXT};
use shared_types::Issue;
use std::fmt;
use tracing::{debug, info, warn};

/// How a navigation target was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    /// Marker tagged with the issue index
    Marker,
    /// Marker whose text or recorded span matched a candidate
    MarkerText(Tier),
    /// Element containing a candidate located in the document
    Located(Tier),
    /// Element containing a literal prefix of the span
    PrefixScan,
}

impl fmt::Display for HitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitSource::Marker => write!(f, "marker"),
            HitSource::MarkerText(tier) => write!(f, "marker-text ({})", tier),
            HitSource::Located(tier) => write!(f, "located ({})", tier),
            HitSource::PrefixScan => write!(f, "prefix-scan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationHit<N> {
    pub target: N,
    pub source: HitSource,
}

#[derive(Debug, Clone)]
struct ActiveFlash<N, H> {
    target: N,
    scroll: H,
    clear: H,
}

#[derive(Debug, Clone)]
pub struct Navigator<N, H> {
    config: AnchorConfig,
    normalizer: Normalizer,
    active: Option<ActiveFlash<N, H>>,
}

impl<N, H> Default for Navigator<N, H> {
    fn default() -> Self {
        Self::new(AnchorConfig::default())
    }
}

impl<N, H> Navigator<N, H> {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.clone()),
            config,
            active: None,
        }
    }

    /// Element the last flash was started on, until cancelled
    pub fn active_target(&self) -> Option<&N> {
        self.active.as_ref().map(|active| &active.target)
    }
}

impl<N, H> Navigator<N, H>
where
    N: Clone + PartialEq + fmt::Debug,
    H: Clone + fmt::Debug,
{
    /// Find the element to navigate to without touching the document
    pub fn resolve<T>(&self, tree: &T, issue: &Issue, issue_index: usize) -> Option<NavigationHit<N>>
    where
        T: TextTree<Node = N>,
    {
        let markers = tree.elements_with_class(&self.config.marker_class);

        if let Some(marker) = markers
            .iter()
            .find(|m| marker_issue_index(tree, *m) == Some(issue_index))
        {
            return Some(NavigationHit {
                target: marker.clone(),
                source: HitSource::Marker,
            });
        }

        let candidates = self.normalizer.candidates(&issue.span);
        for candidate in &candidates {
            let hit = markers.iter().find(|&marker| {
                let text = tree.text_content(marker);
                let recorded = tree.attribute(marker, ATTR_ISSUE_TEXT).unwrap_or_default();
                either_contains(text.trim(), &candidate.text)
                    || either_contains(recorded.trim(), &candidate.text)
            });
            if let Some(marker) = hit {
                return Some(NavigationHit {
                    target: marker.clone(),
                    source: HitSource::MarkerText(candidate.tier),
                });
            }
        }

        if let Some(position) = locate(tree, &candidates) {
            if let Some(element) = tree.parent_element(&position.node) {
                return Some(NavigationHit {
                    target: element,
                    source: HitSource::Located(position.candidate.tier),
                });
            }
        }

        self.prefix_scan(tree, &issue.span)
    }

    /// Last resort: the first rendered text node holding a literal prefix
    /// of the span
    fn prefix_scan<T>(&self, tree: &T, span: &str) -> Option<NavigationHit<N>>
    where
        T: TextTree<Node = N>,
    {
        let prefix = char_prefix(span.trim(), self.config.fallback_prefix_len);
        if prefix.is_empty() || !tree.plain_text().contains(&prefix) {
            return None;
        }
        tree.text_nodes()
            .into_iter()
            .filter(|node| tree.text_content(node).contains(&prefix))
            .find(|node| tree.is_rendered(node))
            .and_then(|node| tree.parent_element(&node))
            .map(|target| NavigationHit {
                target,
                source: HitSource::PrefixScan,
            })
    }

    /// Resolve `issue` and flash it. An unresolvable issue is reported in
    /// the log and leaves the document untouched.
    pub fn navigate_to<T, S>(
        &mut self,
        tree: &mut T,
        timers: &mut S,
        issue: &Issue,
        issue_index: usize,
    ) -> Option<NavigationHit<N>>
    where
        T: TextTree<Node = N>,
        S: FlashTimers<N, Handle = H>,
    {
        let Some(hit) = self.resolve(tree, issue, issue_index) else {
            warn!(
                issue_index,
                span = %char_prefix(issue.span.trim(), 50),
                "could not find highlighted text for issue"
            );
            return None;
        };

        self.cancel_flash(tree, timers);
        for element in tree.elements_with_class(&self.config.flash_class) {
            if let Err(e) = tree.remove_class(&element, &self.config.flash_class) {
                debug!(error = %e, "failed to clear stale flash class");
            }
        }

        if let Err(e) = self.start_flash(tree, timers, &hit.target) {
            warn!(issue_index, error = %e, "failed to start flash");
        }
        info!(issue_index, source = %hit.source, "navigated to issue");
        Some(hit)
    }

    fn start_flash<T, S>(&mut self, tree: &mut T, timers: &mut S, target: &N) -> Result<(), AnchorError>
    where
        T: TextTree<Node = N>,
        S: FlashTimers<N, Handle = H>,
    {
        tree.add_class(target, &self.config.flash_class)?;
        let scroll = timers.schedule(
            self.config.scroll_delay(),
            FlashAction::ScrollIntoView(target.clone()),
        )?;
        let clear = match timers.schedule(
            self.config.flash_duration(),
            FlashAction::RemoveClass {
                element: target.clone(),
                class: self.config.flash_class.clone(),
            },
        ) {
            Ok(handle) => handle,
            Err(e) => {
                timers.cancel(&scroll);
                return Err(e);
            }
        };
        self.active = Some(ActiveFlash {
            target: target.clone(),
            scroll,
            clear,
        });
        Ok(())
    }

    /// Cancel the pending scroll and flash removal and take the flash class
    /// off the active target
    pub fn cancel_flash<T, S>(&mut self, tree: &mut T, timers: &mut S)
    where
        T: TextTree<Node = N>,
        S: FlashTimers<N, Handle = H>,
    {
        let Some(active) = self.active.take() else {
            return;
        };
        timers.cancel(&active.scroll);
        timers.cancel(&active.clear);
        if let Err(e) = tree.remove_class(&active.target, &self.config.flash_class) {
            debug!(error = %e, "flash target no longer available");
        }
    }
}

/// Containment in either direction, ignoring case. Empty text never matches.
fn either_contains(text: &str, candidate: &str) -> bool {
    if text.is_empty() || candidate.is_empty() {
        return false;
    }
    contains_ignore_case(text, candidate) || contains_ignore_case(candidate, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::{ManualTimers, TimerId};
    use crate::highlight::Highlighter;
    use crate::memory::{MemoryTree, NodeId};
    use pretty_assertions::assert_eq;
    use shared_types::Severity;
    use std::time::Duration;

    fn issue(span: &str) -> Issue {
        Issue {
            span: span.to_string(),
            reason: "reason".to_string(),
            rule_id: None,
            evidence: None,
            suggestion: "suggestion".to_string(),
            severity: Severity::Medium,
        }
    }

    fn highlighted(paragraphs: &[&str], issues: &[Issue]) -> MemoryTree {
        let mut tree = MemoryTree::from_paragraphs(paragraphs);
        Highlighter::default().highlight_issues(&mut tree, issues);
        tree
    }

    fn flashing(tree: &MemoryTree) -> Vec<NodeId> {
        tree.elements_with_class("flash-animation")
    }

    #[test]
    fn test_navigate_by_marker_index() {
        let issues = vec![issue("첫번째 문장"), issue("두번째 문장"), issue("세번째 문장")];
        let mut tree = highlighted(
            &["첫번째 문장입니다", "두번째 문장입니다", "세번째 문장입니다"],
            &issues,
        );
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();

        nav.navigate_to(&mut tree, &mut timers, &issues[0], 0).unwrap();
        let hit = nav.navigate_to(&mut tree, &mut timers, &issues[2], 2).unwrap();

        assert_eq!(hit.source, HitSource::Marker);
        assert_eq!(marker_issue_index(&tree, &hit.target), Some(2));
        assert_eq!(flashing(&tree), vec![hit.target]);
        // first navigation's timers were cancelled
        assert_eq!(timers.pending_count(), 2);
    }

    #[test]
    fn test_scroll_then_flash_removal() {
        let issues = vec![issue("공모가격 결정")];
        let mut tree = highlighted(&["공모가격 결정 방법"], &issues);
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();
        let hit = nav.navigate_to(&mut tree, &mut timers, &issues[0], 0).unwrap();

        timers.advance(&mut tree, Duration::from_millis(100));
        assert_eq!(tree.scroll_log(), &[hit.target]);
        assert_eq!(flashing(&tree), vec![hit.target]);

        timers.advance(&mut tree, Duration::from_millis(2900));
        assert!(flashing(&tree).is_empty());
    }

    #[test]
    fn test_stale_index_falls_back_to_marker_text() {
        let issues = vec![issue("위험요소 설명")];
        let mut tree = highlighted(&["위험요소 설명 부분"], &issues);
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();

        let hit = nav.navigate_to(&mut tree, &mut timers, &issues[0], 7).unwrap();
        assert!(matches!(hit.source, HitSource::MarkerText(Tier::Raw)));
        assert_eq!(marker_issue_index(&tree, &hit.target), Some(0));
    }

    #[test]
    fn test_unhighlighted_span_located_in_document() {
        let mut tree = MemoryTree::from_paragraphs(&["증권신고서 요약", "모집 또는 매출에 관한 사항"]);
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();

        let hit = nav
            .navigate_to(&mut tree, &mut timers, &issue("매출에 관한"), 0)
            .unwrap();
        assert!(matches!(hit.source, HitSource::Located(_)));
        assert_eq!(tree.tag(hit.target), Some("p"));
        assert_eq!(flashing(&tree), vec![hit.target]);
    }

    #[test]
    fn test_prefix_scan_skips_unrendered_nodes() {
        let mut tree = MemoryTree::new();
        let body = tree.body();
        let hidden = tree.append_element(body, "div");
        tree.append_text(hidden, "0123456789abcdefghij hidden copy");
        tree.hide(hidden);
        let visible = tree.append_element(body, "p");
        tree.append_text(visible, "0123456789abcdefghij visible copy");

        let nav: Navigator<NodeId, TimerId> = Navigator::default();
        let hit = nav
            .prefix_scan(&tree, "0123456789abcdefghij nowhere else")
            .unwrap();
        assert_eq!(hit.target, visible);
        assert_eq!(hit.source, HitSource::PrefixScan);
    }

    #[test]
    fn test_unresolvable_issue_changes_nothing() {
        let issues = vec![issue("첫 문장")];
        let mut tree = highlighted(&["첫 문장입니다"], &issues);
        let before = tree.render();
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();

        assert!(nav
            .navigate_to(&mut tree, &mut timers, &issue("전혀 다른 내용"), 3)
            .is_none());
        assert_eq!(tree.render(), before);
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_cancel_flash_removes_class_and_timers() {
        let issues = vec![issue("abc def")];
        let mut tree = highlighted(&["abc def ghi"], &issues);
        let mut timers = ManualTimers::new();
        let mut nav: Navigator<NodeId, TimerId> = Navigator::default();
        nav.navigate_to(&mut tree, &mut timers, &issues[0], 0).unwrap();
        assert!(nav.active_target().is_some());

        nav.cancel_flash(&mut tree, &mut timers);
        assert!(nav.active_target().is_none());
        assert!(flashing(&tree).is_empty());
        assert_eq!(timers.pending_count(), 0);
        nav.cancel_flash(&mut tree, &mut timers);
    }

    #[test]
    fn test_either_contains_guards_empty() {
        assert!(either_contains("공모가격", "공모가격 결정"));
        assert!(either_contains("공모가격 결정", "가격"));
        assert!(!either_contains("", "가격"));
        assert!(!either_contains("가격", ""));
    }
}
