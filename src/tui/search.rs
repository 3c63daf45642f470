//! Fuzzy ticket filter using nucleo, followed by column grouping.
//!
//! Query and ticket fields are normalized the same way (lowercase, only
//! letters, digits, spaces and hyphens) before matching. Whitespace splits
//! the query into terms which must ALL match (AND semantics).

use crate::data::grouping::group_order;
use crate::data::{StatusCategory, Ticket};
use nucleo::{
    pattern::{CaseMatching, Normalization, Pattern},
    Config, Matcher, Utf32Str,
};

/// Fuzzy searcher holding the matcher and a reusable haystack buffer.
pub struct FuzzySearch {
    matcher: Matcher,
    buf: Vec<char>,
}

impl Default for FuzzySearch {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzySearch {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::new(),
        }
    }

    /// Compile a (normalized) query. `None` when there is nothing to match.
    pub fn compile(query: &str) -> Option<Pattern> {
        if query.trim().is_empty() {
            return None;
        }
        Some(Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart))
    }

    /// Positive score when every term of `pattern` matches `haystack`.
    pub fn score(&mut self, pattern: &Pattern, haystack: &str) -> Option<u32> {
        if haystack.is_empty() {
            return None;
        }
        let haystack = Utf32Str::new(haystack, &mut self.buf);
        pattern
            .score(haystack, &mut self.matcher)
            .filter(|score| *score > 0)
    }

    /// Multi-term search: split query on whitespace, ALL terms must match.
    pub fn multi_term_match(&mut self, query: &str, haystack: &str) -> Option<u32> {
        let pattern = Self::compile(query)?;
        self.score(&pattern, haystack)
    }

    /// Best of the key and summary scores, both normalized.
    pub fn score_ticket(&mut self, pattern: &Pattern, ticket: &Ticket) -> Option<u32> {
        let key = self.score(pattern, &normalize_search_text(&ticket.key));
        let summary = self.score(pattern, &normalize_search_text(&ticket.summary));
        key.max(summary)
    }
}

/// Lowercase and drop everything except letters, digits, spaces and hyphens.
pub fn normalize_search_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Derive a column's displayed list from its raw list and the filter text.
///
/// With a filter, non-matching tickets are dropped and survivors are ranked by
/// descending score; ties keep their raw order. Grouping runs last in both
/// cases.
pub fn filter_and_group(category: StatusCategory, tickets: &[Ticket], filter: &str) -> Vec<Ticket> {
    let query = normalize_search_text(filter);
    let Some(pattern) = FuzzySearch::compile(&query) else {
        return group_order(category, tickets)
            .into_iter()
            .map(|i| tickets[i].clone())
            .collect();
    };

    let mut search = FuzzySearch::new();
    let mut scored: Vec<(u32, &Ticket)> = tickets
        .iter()
        .filter_map(|t| search.score_ticket(&pattern, t).map(|s| (s, t)))
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let ranked: Vec<&Ticket> = scored.into_iter().map(|(_, t)| t).collect();
    group_order(category, &ranked)
        .into_iter()
        .map(|i| ranked[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(key: &str, summary: &str) -> Ticket {
        Ticket {
            key: key.to_string(),
            summary: summary.to_string(),
            status: "In Progress".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_term_match() {
        let mut search = FuzzySearch::new();
        assert!(search.multi_term_match("test", "this is a test").is_some());
        assert!(search.multi_term_match("xyz", "this is a test").is_none());
    }

    #[test]
    fn test_multi_term_match() {
        let mut search = FuzzySearch::new();
        assert!(search
            .multi_term_match("login bug", "fix login bug")
            .is_some());
        assert!(search
            .multi_term_match("login xyz", "fix login bug")
            .is_none());
    }

    #[test]
    fn test_subsequence_match() {
        let mut search = FuzzySearch::new();
        assert!(search.multi_term_match("bg", "fix login bug").is_some());
        assert!(search.multi_term_match("gb", "bug").is_none());
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize_search_text("PROJ-12: Fix (urgent)!"), "proj-12 fix urgent");
        assert_eq!(normalize_search_text("!!!"), "");
    }

    #[test]
    fn test_punctuation_only_filter_is_no_filter() {
        let tickets = vec![ticket("A-1", "one"), ticket("A-2", "two")];
        let out = filter_and_group(StatusCategory::Done, &tickets, "?!");
        assert_eq!(out, tickets);
    }

    #[test]
    fn test_key_match_counts() {
        let tickets = vec![ticket("WEB-42", "unrelated"), ticket("API-1", "other")];
        let out = filter_and_group(StatusCategory::Done, &tickets, "web");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "WEB-42");
    }
}
