//! End-to-end anchoring scenarios over the in-memory tree

use pretty_assertions::assert_eq;
use shared_types::{Decision, Issue, QualityScores, Severity, ValidationResult};
use span_anchor::tree::marker_issue_index;
use span_anchor::{
    AnchorConfig, Highlighter, HitSource, ManualTimers, MemoryTree, Navigator, NodeId, TextTree,
    Tier, TimerId, ValidationSession,
};
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn issue(span: &str, severity: Severity) -> Issue {
    Issue {
        span: span.to_string(),
        reason: "기재 내용 확인 필요".to_string(),
        rule_id: Some("R-001".to_string()),
        evidence: None,
        suggestion: "내용을 보완하세요".to_string(),
        severity,
    }
}

fn validation(issues: Vec<Issue>) -> ValidationResult {
    ValidationResult {
        quality_scores: QualityScores::default(),
        decision: Decision::Revise,
        issues,
        notes: None,
    }
}

fn filing() -> MemoryTree {
    MemoryTree::from_paragraphs(&[
        "본 문서는 초안입니다",
        "제1부 모집 또는 매출에 관한 사항",
        "공모가격은 수요예측 결과를 반영하여 결정합니다.",
        "투자위험요소: 사업위험, 회사위험, 기타위험",
    ])
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn draft_notice_becomes_three_siblings() {
    let mut tree = MemoryTree::new();
    let body = tree.body();
    let p = tree.append_element(body, "p");
    tree.append_text(p, "본 문서는 초안입니다 (2024년 3월)");

    let report = Highlighter::default()
        .highlight_issues(&mut tree, &[issue("본 문서는 초안입니다", Severity::High)]);
    assert_eq!(report.marker_count(), 1);
    assert_eq!(report.markers[0].tier, Tier::Raw);

    let children = tree.children(p).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], report.markers[0].node);
    assert_eq!(tree.text_content(&children[0]), "본 문서는 초안입니다");

    let mut tree = MemoryTree::new();
    let body = tree.body();
    let p = tree.append_element(body, "p");
    tree.append_text(p, "[안내] 본 문서는 초안입니다 (2024년 3월)");
    Highlighter::default()
        .highlight_issues(&mut tree, &[issue("본 문서는 초안입니다", Severity::High)]);
    let children = tree.children(p).to_vec();
    assert_eq!(children.len(), 3);
    assert!(tree.is_text(children[0]));
    assert!(!tree.is_text(children[1]));
    assert!(tree.is_text(children[2]));
    assert_eq!(tree.text_content(&children[1]), "본 문서는 초안입니다");
}

#[test]
fn formatted_span_matches_through_whitespace_tiers() {
    let mut tree = filing();
    let report = Highlighter::default().highlight_issues(
        &mut tree,
        &[issue("공모가격은\n\n\t수요예측 결과를   반영하여", Severity::Medium)],
    );
    assert_eq!(report.marker_count(), 1);
    assert!(matches!(
        report.markers[0].tier,
        Tier::CollapsedWhitespace | Tier::LineBreaks
    ));
}

#[test]
fn truncated_span_matches_by_prefix() {
    let mut tree = filing();
    // the validator appended text that is not in the document
    let span = "공모가격은 수요예측 결과를 반영하여 결정합니다. 다만 시장 상황에 따라 변경될 수 있습니다.";
    let report = Highlighter::default().highlight_issues(&mut tree, &[issue(span, Severity::Low)]);
    assert_eq!(report.marker_count(), 1);
    assert!(matches!(report.markers[0].tier, Tier::Prefix(_)));
}

#[test]
fn unmatched_issue_is_skipped_without_error() {
    let mut tree = filing();
    let issues = vec![
        issue("본 문서는 초안입니다", Severity::High),
        issue("존재하지 않는 문장입니다만", Severity::Medium),
        issue("사업위험, 회사위험", Severity::Low),
    ];
    let report = Highlighter::default().highlight_issues(&mut tree, &issues);
    assert_eq!(report.marker_count(), 2);
    assert_eq!(report.unmatched, vec![1]);
    assert!(report.failed.is_empty());
}

#[test]
fn navigation_flashes_exactly_one_marker() {
    let issues = vec![
        issue("본 문서는 초안입니다", Severity::High),
        issue("모집 또는 매출", Severity::Medium),
        issue("수요예측 결과", Severity::Low),
    ];
    let mut tree = filing();
    Highlighter::default().highlight_issues(&mut tree, &issues);

    let mut timers = ManualTimers::new();
    let mut navigator: Navigator<NodeId, TimerId> = Navigator::default();
    for index in [0, 1] {
        navigator.navigate_to(&mut tree, &mut timers, &issues[index], index);
    }
    let hit = navigator
        .navigate_to(&mut tree, &mut timers, &issues[2], 2)
        .unwrap();

    assert_eq!(hit.source, HitSource::Marker);
    let flashing = tree.elements_with_class("flash-animation");
    assert_eq!(flashing, vec![hit.target]);
    assert_eq!(marker_issue_index(&tree, &flashing[0]), Some(2));

    timers.advance(&mut tree, Duration::from_secs(3));
    assert_eq!(tree.scroll_log(), &[hit.target]);
    assert!(tree.elements_with_class("flash-animation").is_empty());
}

#[test]
fn overlapping_navigation_does_not_clear_new_flash() {
    let issues = vec![
        issue("본 문서는 초안입니다", Severity::High),
        issue("모집 또는 매출", Severity::Medium),
    ];
    let mut tree = filing();
    Highlighter::default().highlight_issues(&mut tree, &issues);

    let mut timers = ManualTimers::new();
    let mut navigator: Navigator<NodeId, TimerId> = Navigator::default();
    navigator.navigate_to(&mut tree, &mut timers, &issues[0], 0);
    timers.advance(&mut tree, Duration::from_millis(2000));
    let second = navigator
        .navigate_to(&mut tree, &mut timers, &issues[1], 1)
        .unwrap();

    // the first flash would have expired here
    timers.advance(&mut tree, Duration::from_millis(1500));
    assert_eq!(tree.elements_with_class("flash-animation"), vec![second.target]);
}

#[test]
fn locked_subtree_failure_does_not_abort_pass() {
    let mut tree = filing();
    let first = tree.children(tree.body())[0];
    tree.lock(first);
    let before = tree.plain_text();

    let issues = vec![
        issue("본 문서는 초안입니다", Severity::High),
        issue("모집 또는 매출", Severity::Medium),
    ];
    let report = Highlighter::default().highlight_issues(&mut tree, &issues);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].issue_index, 0);
    assert_eq!(report.marker_count(), 1);
    assert_eq!(tree.plain_text(), before);
}

#[test]
fn session_run_highlights_then_next_run_clears() {
    let mut tree = filing();
    let original = tree.render();
    let mut session = ValidationSession::default();

    let ticket = session.begin(&mut tree);
    let report = session
        .complete(
            ticket,
            validation(vec![
                issue("제1부 모집", Severity::High),
                issue("기타위험", Severity::Low),
            ]),
            &mut tree,
        )
        .unwrap();
    assert_eq!(report.marker_count(), 2);
    assert_ne!(tree.render(), original);

    session.begin(&mut tree);
    assert_eq!(tree.render(), original);
}

#[test]
fn custom_marker_class_from_config() {
    let config = AnchorConfig::from_json(r#"{"marker_class": "issue-mark"}"#).unwrap();
    let mut tree = filing();
    Highlighter::new(config.clone())
        .highlight_issues(&mut tree, &[issue("기타위험", Severity::Low)]);
    assert_eq!(tree.elements_with_class("issue-mark").len(), 1);
    assert!(tree.elements_with_class("validation-highlight").is_empty());

    let mut navigator: Navigator<NodeId, TimerId> = Navigator::new(config);
    let mut timers = ManualTimers::new();
    let hit = navigator
        .navigate_to(&mut tree, &mut timers, &issue("기타위험", Severity::Low), 0)
        .unwrap();
    assert_eq!(hit.source, HitSource::Marker);
}
