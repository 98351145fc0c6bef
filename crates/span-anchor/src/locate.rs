//! Span Locator: greedy first-match search over text nodes
//!
//! Candidates are tried in priority order. A candidate is first checked
//! against the whole document text (cheap rejection), then text nodes are
//! walked in document order and the first node containing it wins. There
//! is no similarity scoring: candidate order, then document order, decide.
//!
//! A match must lie inside a single text node. Text split by inline markup
//! (`<em>`, `<b>`, ...) is present in the document text but is not matched.

use crate::normalize::{Candidate, Normalizer};
use crate::tree::TextTree;
use std::ops::Range;
use tracing::debug;

/// A located occurrence: byte range `start..end` inside `node`'s text
#[derive(Debug, Clone, PartialEq)]
pub struct Position<N> {
    pub node: N,
    pub start: usize,
    pub end: usize,
    /// The candidate that produced the hit
    pub candidate: Candidate,
}

impl<N> Position<N> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy)]
struct FoldedChar {
    ch: char,
    start: usize,
    end: usize,
    first: bool,
    last: bool,
}

/// Lowercased text that remembers which original character each folded
/// character came from, so matches map back to original byte offsets even
/// when lowercasing changes lengths.
#[derive(Debug, Clone)]
pub struct FoldedText {
    chars: Vec<FoldedChar>,
}

impl FoldedText {
    pub fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        for (start, original) in text.char_indices() {
            let end = start + original.len_utf8();
            let lower: Vec<char> = original.to_lowercase().collect();
            let count = lower.len();
            for (i, ch) in lower.into_iter().enumerate() {
                chars.push(FoldedChar {
                    ch,
                    start,
                    end,
                    first: i == 0,
                    last: i + 1 == count,
                });
            }
        }
        Self { chars }
    }

    /// Byte range of the first occurrence of an already-folded needle.
    /// Matches never start or end inside a multi-char lowercase expansion.
    pub fn find(&self, needle: &[char]) -> Option<Range<usize>> {
        if needle.is_empty() || needle.len() > self.chars.len() {
            return None;
        }
        'outer: for i in 0..=self.chars.len() - needle.len() {
            if !self.chars[i].first {
                continue;
            }
            for (j, &ch) in needle.iter().enumerate() {
                if self.chars[i + j].ch != ch {
                    continue 'outer;
                }
            }
            let last = self.chars[i + needle.len() - 1];
            if !last.last {
                continue;
            }
            return Some(self.chars[i].start..last.end);
        }
        None
    }

    pub fn contains(&self, needle: &[char]) -> bool {
        self.find(needle).is_some()
    }
}

pub fn fold(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Case-insensitive search returning a byte range in `haystack`
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    FoldedText::new(haystack).find(&fold(needle))
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    find_ignore_case(haystack, needle).is_some()
}

/// Find the first candidate that occurs inside a single text node
pub fn locate<T: TextTree>(tree: &T, candidates: &[Candidate]) -> Option<Position<T::Node>> {
    locate_where(tree, candidates, |_| true)
}

/// Like [`locate`], but ignores text already wrapped in an element carrying
/// `marker_class`, so one occurrence is never marked twice
pub fn locate_unmarked<T: TextTree>(
    tree: &T,
    candidates: &[Candidate],
    marker_class: &str,
) -> Option<Position<T::Node>> {
    locate_where(tree, candidates, |node| !inside_class(tree, node, marker_class))
}

/// Whether any ancestor of `node` carries `class`
pub fn inside_class<T: TextTree>(tree: &T, node: &T::Node, class: &str) -> bool {
    let mut current = tree.parent_element(node);
    while let Some(element) = current {
        if tree.has_class(&element, class) {
            return true;
        }
        current = tree.parent_element(&element);
    }
    false
}

fn locate_where<T, F>(tree: &T, candidates: &[Candidate], eligible: F) -> Option<Position<T::Node>>
where
    T: TextTree,
    F: Fn(&T::Node) -> bool,
{
    if candidates.is_empty() {
        return None;
    }

    let document = FoldedText::new(&tree.plain_text());
    let mut nodes: Option<Vec<(T::Node, bool, FoldedText)>> = None;

    for candidate in candidates {
        let needle = fold(&candidate.text);
        if !document.contains(&needle) {
            continue;
        }

        let nodes = nodes.get_or_insert_with(|| {
            tree.text_nodes()
                .into_iter()
                .filter(|node| eligible(node))
                .map(|node| {
                    let text = tree.text_content(&node);
                    let blank = text.trim().is_empty();
                    (node, blank, FoldedText::new(&text))
                })
                .collect()
        });

        for (node, blank, folded) in nodes.iter() {
            if *blank {
                continue;
            }
            if let Some(range) = folded.find(&needle) {
                debug!(
                    tier = %candidate.tier,
                    start = range.start,
                    end = range.end,
                    "span located"
                );
                return Some(Position {
                    node: node.clone(),
                    start: range.start,
                    end: range.end,
                    candidate: candidate.clone(),
                });
            }
        }

        debug!(
            tier = %candidate.tier,
            "candidate occurs in document text but in no eligible single text node"
        );
    }

    None
}

/// Normalize `span` and locate it
pub fn locate_span<T: TextTree>(
    tree: &T,
    normalizer: &Normalizer,
    span: &str,
) -> Option<Position<T::Node>> {
    locate(tree, &normalizer.candidates(span))
}
