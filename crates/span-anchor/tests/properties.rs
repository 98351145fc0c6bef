//! Property tests for candidate generation, locating and marker round trips

use proptest::prelude::*;
use shared_types::{Issue, Severity};
use span_anchor::{candidates, locate_span, Highlighter, MemoryTree, Normalizer, TextTree};

fn issue(span: String) -> Issue {
    Issue {
        span,
        reason: "r".to_string(),
        rule_id: None,
        evidence: None,
        suggestion: "s".to_string(),
        severity: Severity::Medium,
    }
}

/// Lowercase text so first-occurrence expectations need no case folding
fn paragraphs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e가나다 ]{0,40}", 1..6)
}

fn tree_of(paragraphs: &[String]) -> MemoryTree {
    let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    MemoryTree::from_paragraphs(&refs)
}

proptest! {
    /// Property: candidate generation never panics and never yields short
    /// or duplicate candidates
    #[test]
    fn candidates_are_long_enough_and_unique(span in "\\PC{0,120}") {
        let list = candidates(&span);
        for (i, candidate) in list.iter().enumerate() {
            prop_assert!(candidate.chars().count() >= 3);
            prop_assert!(!candidate.trim().is_empty());
            prop_assert!(!list[..i].contains(candidate));
        }
    }

    /// Property: spans shorter than three characters never match
    #[test]
    fn short_spans_never_match(
        paras in paragraphs(),
        span in "[a-e가나다 ]{0,2}"
    ) {
        let tree = tree_of(&paras);
        prop_assert!(locate_span(&tree, &Normalizer::default(), &span).is_none());
    }

    /// Property: a verbatim substring locates to its first occurrence in
    /// document order
    #[test]
    fn verbatim_span_locates_first_occurrence(
        paras in paragraphs(),
        pick in any::<prop::sample::Index>(),
        start in 0usize..40,
        len in 3usize..20
    ) {
        let source = &paras[pick.index(paras.len())];
        let chars: Vec<char> = source.chars().collect();
        prop_assume!(start < chars.len());
        let end = (start + len).min(chars.len());
        let span: String = chars[start..end].iter().collect();
        let trimmed = span.trim();
        prop_assume!(trimmed.chars().count() >= 3);

        let tree = tree_of(&paras);
        let position = locate_span(&tree, &Normalizer::default(), &span);
        prop_assert!(position.is_some());
        let position = position.unwrap();

        let expected_node = paras.iter().position(|p| p.contains(trimmed)).unwrap();
        prop_assert_eq!(position.node, tree.text_nodes()[expected_node]);
        prop_assert_eq!(position.start, paras[expected_node].find(trimmed).unwrap());
        prop_assert_eq!(position.len(), trimmed.len());
    }

    /// Property: highlighting preserves plain text and clearing restores
    /// the original markup
    #[test]
    fn clear_after_highlight_restores_document(
        paras in paragraphs(),
        spans in prop::collection::vec("[a-e가나다 ]{0,12}", 0..6)
    ) {
        let mut tree = tree_of(&paras);
        let text = tree.plain_text();
        let markup = tree.render();
        let highlighter = Highlighter::default();

        let issues: Vec<Issue> = spans.into_iter().map(issue).collect();
        highlighter.highlight_issues(&mut tree, &issues);
        prop_assert_eq!(tree.plain_text(), text.clone());

        highlighter.clear_highlights(&mut tree);
        prop_assert_eq!(tree.plain_text(), text);
        prop_assert_eq!(tree.render(), markup);
    }

    /// Property: a second pass with the same issues produces the same
    /// document as one pass
    #[test]
    fn repeated_pass_matches_single_pass(
        paras in paragraphs(),
        spans in prop::collection::vec("[a-e가나다 ]{3,12}", 0..6)
    ) {
        let issues: Vec<Issue> = spans.into_iter().map(issue).collect();
        let highlighter = Highlighter::default();

        let mut tree = tree_of(&paras);
        let once = highlighter.highlight_issues(&mut tree, &issues);
        let after_once = (tree.plain_text(), tree.render());

        let twice = highlighter.highlight_issues(&mut tree, &issues);
        prop_assert_eq!(once.marker_count(), twice.marker_count());
        prop_assert_eq!((tree.plain_text(), tree.render()), after_once);
    }
}
