//! Candidate search strings for a reported span
//!
//! The validator's span and the rendered document drift apart through
//! whitespace/markup normalization and truncation. Each tier below trades
//! precision for recall; tiers are emitted most literal first so an exact
//! match always wins when one exists.

use crate::config::AnchorConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref LINE_BREAK_RUN: Regex = Regex::new(r"[\r\n\t]+").unwrap();
    /// Anything that is not a letter (any script), digit, underscore or whitespace
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"[(){}\[\]]").unwrap();
}

/// Which rewrite produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Raw,
    CollapsedWhitespace,
    LineBreaks,
    WordCharacters,
    Prefix(usize),
    Suffix(usize),
    FirstLine,
    LastLine,
    FirstWords(usize),
    LastWords(usize),
    NoDigits,
    NoBrackets,
    Middle,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Raw => write!(f, "raw"),
            Tier::CollapsedWhitespace => write!(f, "collapsed-whitespace"),
            Tier::LineBreaks => write!(f, "line-breaks"),
            Tier::WordCharacters => write!(f, "word-characters"),
            Tier::Prefix(n) => write!(f, "prefix-{}", n),
            Tier::Suffix(n) => write!(f, "suffix-{}", n),
            Tier::FirstLine => write!(f, "first-line"),
            Tier::LastLine => write!(f, "last-line"),
            Tier::FirstWords(n) => write!(f, "first-{}-words", n),
            Tier::LastWords(n) => write!(f, "last-{}-words", n),
            Tier::NoDigits => write!(f, "no-digits"),
            Tier::NoBrackets => write!(f, "no-brackets"),
            Tier::Middle => write!(f, "middle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: AnchorConfig,
}

impl Normalizer {
    pub fn new(config: AnchorConfig) -> Self {
        Self { config }
    }

    /// Ranked candidates for `span`.
    ///
    /// Pure function of the span: blank or too-short rewrites are dropped,
    /// and a rewrite identical to an earlier one keeps the earlier tier.
    pub fn candidates(&self, span: &str) -> Vec<Candidate> {
        let span = span.trim();
        if span.is_empty() {
            return Vec::new();
        }

        let mut raw: Vec<(Tier, String)> = vec![
            (Tier::Raw, span.to_string()),
            (
                Tier::CollapsedWhitespace,
                WHITESPACE_RUN.replace_all(span, " ").into_owned(),
            ),
            (
                Tier::LineBreaks,
                LINE_BREAK_RUN.replace_all(span, " ").trim().to_string(),
            ),
            (
                Tier::WordCharacters,
                NON_WORD.replace_all(span, "").trim().to_string(),
            ),
        ];

        for &len in &self.config.edge_lengths {
            raw.push((Tier::Prefix(len), char_prefix(span, len)));
        }
        for &len in &self.config.edge_lengths {
            raw.push((Tier::Suffix(len), char_suffix(span, len)));
        }

        let lines: Vec<&str> = span.split('\n').collect();
        if let Some(first) = lines.first() {
            raw.push((Tier::FirstLine, first.trim().to_string()));
        }
        if let Some(last) = lines.last() {
            raw.push((Tier::LastLine, last.trim().to_string()));
        }

        let words: Vec<&str> = span.split(' ').collect();
        for &count in &self.config.word_counts {
            raw.push((Tier::FirstWords(count), first_words(&words, count)));
            raw.push((Tier::LastWords(count), last_words(&words, count)));
        }

        raw.push((
            Tier::NoDigits,
            DIGIT_RUN.replace_all(span, "").trim().to_string(),
        ));
        raw.push((
            Tier::NoBrackets,
            BRACKETS.replace_all(span, "").trim().to_string(),
        ));
        raw.push((Tier::Middle, middle(span, self.config.middle_trim)));

        let mut out: Vec<Candidate> = Vec::with_capacity(raw.len());
        for (tier, text) in raw {
            if text.trim().is_empty() || text.chars().count() < self.config.min_candidate_len {
                continue;
            }
            if out.iter().any(|c| c.text == text) {
                continue;
            }
            out.push(Candidate { text, tier });
        }
        out
    }
}

/// Candidate strings for `span` under the default configuration
pub fn candidates(span: &str) -> Vec<String> {
    Normalizer::default()
        .candidates(span)
        .into_iter()
        .map(|c| c.text)
        .collect()
}

/// Collapse whitespace runs and trim; the form sent to the validation service
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// First `len` characters of `text`
pub fn char_prefix(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

/// Last `len` characters of `text`
pub fn char_suffix(text: &str, len: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(len)).collect()
}

fn first_words(words: &[&str], count: usize) -> String {
    words[..count.min(words.len())].join(" ")
}

fn last_words(words: &[&str], count: usize) -> String {
    words[words.len().saturating_sub(count)..].join(" ")
}

fn middle(text: &str, trim: usize) -> String {
    let total = text.chars().count();
    if total <= trim * 2 {
        return String::new();
    }
    text.chars().skip(trim).take(total - trim * 2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tiers(span: &str) -> Vec<(Tier, String)> {
        Normalizer::default()
            .candidates(span)
            .into_iter()
            .map(|c| (c.tier, c.text))
            .collect()
    }

    #[test]
    fn test_empty_span_has_no_candidates() {
        assert!(candidates("").is_empty());
        assert!(candidates("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_span_has_no_candidates() {
        assert!(candidates("ab").is_empty());
        assert!(candidates(" 가나 ").is_empty());
    }

    #[test]
    fn test_raw_span_comes_first() {
        let list = candidates("  본 문서는 초안입니다  ");
        assert_eq!(list[0], "본 문서는 초안입니다");
    }

    #[test]
    fn test_whitespace_tiers() {
        let list = tiers("공모가격은\n\n\t확정되지  않았습니다");
        assert_eq!(list[0].0, Tier::Raw);
        assert_eq!(
            list[1],
            (
                Tier::CollapsedWhitespace,
                "공모가격은 확정되지 않았습니다".to_string()
            )
        );
        assert_eq!(
            list[2],
            (
                Tier::LineBreaks,
                "공모가격은 확정되지  않았습니다".to_string()
            )
        );
    }

    #[test]
    fn test_word_character_tier_keeps_hangul_and_digits() {
        let list = tiers("매출액(2023년)은 1,200억원입니다!");
        let word = list
            .iter()
            .find(|(tier, _)| *tier == Tier::WordCharacters)
            .unwrap();
        assert_eq!(word.1, "매출액2023년은 1200억원입니다");
    }

    #[test]
    fn test_edges_counted_in_characters() {
        let span = "가".repeat(40);
        let list = tiers(&span);
        let prefix = list
            .iter()
            .find(|(tier, _)| *tier == Tier::Prefix(30))
            .unwrap();
        assert_eq!(prefix.1.chars().count(), 30);
        // 50-char prefix and suffix equal the raw span and are dropped as duplicates
        assert!(!list.iter().any(|(tier, _)| *tier == Tier::Prefix(50)));
        assert!(!list.iter().any(|(tier, _)| *tier == Tier::Suffix(50)));
    }

    #[test]
    fn test_suffix_and_middle() {
        let span = "0123456789abcdefghijKLMNOPQRSTUVWXYZ";
        let list = tiers(span);
        let suffix = list
            .iter()
            .find(|(tier, _)| *tier == Tier::Suffix(15))
            .unwrap();
        assert_eq!(suffix.1, "LMNOPQRSTUVWXYZ");
        let middle = list.iter().find(|(tier, _)| *tier == Tier::Middle).unwrap();
        assert_eq!(middle.1, "abcdefghijKLMNOP");
    }

    #[test]
    fn test_middle_skipped_for_short_spans() {
        assert!(!tiers("twenty characters!!").iter().any(|(t, _)| *t == Tier::Middle));
    }

    #[test]
    fn test_lines_and_words() {
        let list = tiers("the first line\nsecond line\nthe final line of text");
        assert!(list.contains(&(Tier::FirstLine, "the first line".to_string())));
        assert!(list.contains(&(Tier::LastLine, "the final line of text".to_string())));
        let words = tiers("one two three four five six seven");
        assert!(words.contains(&(Tier::FirstWords(5), "one two three four five".to_string())));
        assert!(words.contains(&(Tier::LastWords(3), "five six seven".to_string())));
    }

    #[test]
    fn test_digit_and_bracket_tiers() {
        let list = tiers("제 3 조 [공모방법] (2024).");
        assert!(list.contains(&(Tier::NoDigits, "제  조 [공모방법] ().".to_string())));
        assert!(list.contains(&(Tier::NoBrackets, "제 3 조 공모방법 2024.".to_string())));
    }

    #[test]
    fn test_candidates_are_unique_and_ordered() {
        let list = candidates("short span");
        let mut seen = std::collections::HashSet::new();
        assert!(list.iter().all(|c| seen.insert(c.clone())));
        assert_eq!(list[0], "short span");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\t c  "), "a b c");
    }

    #[test]
    fn test_char_helpers() {
        assert_eq!(char_prefix("가나다라", 2), "가나");
        assert_eq!(char_suffix("가나다라", 3), "나다라");
        assert_eq!(char_suffix("가나", 10), "가나");
    }
}
