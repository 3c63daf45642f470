//! Tests for the fuzzy filter feeding the column grouping.
//!
//! These tests verify:
//! 1. Subsequence queries match keys or summaries and drop non-matches
//! 2. Ranking is by score with raw order breaking ties
//! 3. Punctuation and case in the query are ignored
//! 4. Filtering then grouping is deterministic and idempotent

mod test_utils;

use branchboard::data::{StatusCategory, Ticket};
use branchboard::tui::search::{filter_and_group, normalize_search_text, FuzzySearch};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_utils::{active, backlog, keys, subtask_of, ticket};

mod matching {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bg_matches_login_bug_only() {
        let raw = vec![ticket("PROJ-1", "Fix login bug"), ticket("PROJ-2", "Update docs")];
        let out = filter_and_group(StatusCategory::InProgress, &raw, "bg");
        assert_eq!(keys(&out), vec!["PROJ-1"]);
    }

    #[test]
    fn key_match_counts() {
        let raw = vec![ticket("WEB-42", "Something"), ticket("API-7", "Other")];
        let out = filter_and_group(StatusCategory::Done, &raw, "web42");
        assert_eq!(keys(&out), vec!["WEB-42"]);
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let raw = vec![ticket("WEB-1", "Fix (Safari) login!"), ticket("WEB-2", "Docs")];
        let out = filter_and_group(StatusCategory::Done, &raw, "SAFARI, LOGIN?");
        assert_eq!(keys(&out), vec!["WEB-1"]);
    }

    #[test]
    fn every_term_must_match() {
        let raw = vec![
            ticket("A-1", "login page broken"),
            ticket("A-2", "login api"),
        ];
        let out = filter_and_group(StatusCategory::Done, &raw, "login page");
        assert_eq!(keys(&out), vec!["A-1"]);
    }

    #[test]
    fn punctuation_only_filter_is_no_filter() {
        let raw = vec![ticket("A-1", "one"), ticket("A-2", "two")];
        let out = filter_and_group(StatusCategory::Done, &raw, "?!.");
        assert_eq!(keys(&out), vec!["A-1", "A-2"]);
    }

    #[test]
    fn nothing_matches() {
        let raw = vec![ticket("A-1", "one")];
        assert!(filter_and_group(StatusCategory::Done, &raw, "zzzz").is_empty());
    }
}

mod ranking {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn better_match_ranks_first() {
        let raw = vec![
            ticket("A-1", "a lot of unrelated words then b and g"),
            ticket("A-2", "bug"),
        ];
        let out = filter_and_group(StatusCategory::Done, &raw, "bug");
        assert_eq!(out[0].key, "A-2");
    }

    #[test]
    fn equal_scores_keep_raw_order() {
        let raw = vec![
            ticket("X-3", "deploy"),
            ticket("X-1", "deploy"),
            ticket("X-2", "deploy"),
        ];
        let out = filter_and_group(StatusCategory::Done, &raw, "deploy");
        assert_eq!(keys(&out), vec!["X-3", "X-1", "X-2"]);
    }

    #[test]
    fn grouping_runs_after_ranking() {
        let parent = ticket("P-1", "payment flow");
        let child = subtask_of(ticket("P-2", "payment retries"), "P-1");
        let out = filter_and_group(StatusCategory::ToDo, &[child, parent], "payment");
        assert_eq!(keys(&out), vec!["P-1", "P-2"]);
    }

    #[test]
    fn backlog_still_sinks_when_filtered() {
        let raw = vec![backlog("B-1"), active("B-2")];
        let out = filter_and_group(StatusCategory::ToDo, &raw, "summary");
        assert_eq!(keys(&out), vec!["B-2", "B-1"]);
    }
}

mod normalize {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_letters_digits_spaces_hyphens() {
        assert_eq!(normalize_search_text("WEB-12: Fix (login)!"), "web-12 fix login");
    }

    #[test]
    fn scorer_rejects_blank_patterns() {
        assert!(FuzzySearch::compile("   ").is_none());
    }
}

fn arb_ticket() -> impl Strategy<Value = Ticket> {
    ("[A-C]-[0-9]{1,2}", "[a-z ]{0,20}", any::<bool>()).prop_map(|(key, summary, is_backlog)| {
        let t = ticket(&key, &summary);
        if is_backlog {
            Ticket {
                status: "Backlog".to_string(),
                ..t
            }
        } else {
            t
        }
    })
}

/// Unique keys; subtasks only point at earlier tickets, so there are no cycles.
fn arb_column() -> impl Strategy<Value = Vec<Ticket>> {
    proptest::collection::vec(
        ("[a-z ]{0,16}", any::<bool>(), proptest::option::of(any::<usize>())),
        0..25,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (summary, is_backlog, parent))| {
                let mut t = ticket(&format!("T-{}", i), &summary);
                if is_backlog {
                    t.status = "Backlog".to_string();
                }
                match parent {
                    Some(p) if i > 0 => subtask_of(t, &format!("T-{}", p % i)),
                    _ => t,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn filtering_its_own_output_changes_nothing(
        raw in arb_column(),
        filter in "[a-z ]{0,4}",
    ) {
        let once = filter_and_group(StatusCategory::ToDo, &raw, &filter);
        let twice = filter_and_group(StatusCategory::ToDo, &once, &filter);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn filtering_is_deterministic(
        raw in proptest::collection::vec(arb_ticket(), 0..30),
        filter in "[a-z ]{0,4}",
    ) {
        let once = filter_and_group(StatusCategory::ToDo, &raw, &filter);
        let again = filter_and_group(StatusCategory::ToDo, &raw, &filter);
        prop_assert_eq!(&once, &again);
    }

    #[test]
    fn output_is_drawn_from_input(
        raw in proptest::collection::vec(arb_ticket(), 0..30),
        filter in "[a-z]{0,3}",
    ) {
        let out = filter_and_group(StatusCategory::InProgress, &raw, &filter);
        prop_assert!(out.len() <= raw.len());
        for t in &out {
            prop_assert!(raw.contains(t));
        }
    }
}
