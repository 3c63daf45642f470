//! Parent/subtask grouping for a single board column.
//!
//! Subtasks are pulled up to sit directly under their parent when the parent
//! is in the same list. The To Do column is additionally split into an active
//! group followed by a backlog group; a backlog parent of an active subtask is
//! promoted into the active group so the pair stays together.
//!
//! Everything here iterates the input slice in order, so the output is a pure
//! function of the input order.

use super::{StatusCategory, Ticket};
use std::borrow::Borrow;
use std::collections::HashMap;

/// Reorder `tickets` for display in `category`'s column.
pub fn reorder_and_group(category: StatusCategory, tickets: &[Ticket]) -> Vec<Ticket> {
    group_order(category, tickets)
        .into_iter()
        .map(|i| tickets[i].clone())
        .collect()
}

/// Display order as indices into `tickets`. Every index appears exactly once.
pub fn group_order<T: Borrow<Ticket>>(category: StatusCategory, tickets: &[T]) -> Vec<usize> {
    let n = tickets.len();
    if n == 0 {
        return Vec::new();
    }

    // First occurrence wins for duplicate keys
    let mut index_by_key: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, t) in tickets.iter().enumerate() {
        index_by_key.entry(t.borrow().key.as_str()).or_insert(i);
    }

    let parent_of: Vec<Option<usize>> = tickets
        .iter()
        .enumerate()
        .map(|(i, t)| {
            t.borrow()
                .parent_key()
                .and_then(|p| index_by_key.get(p).copied())
                .filter(|&p| p != i)
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(p) = parent {
            children[*p].push(i);
        }
    }

    let active = partition(category, tickets, &parent_of);

    let mut seen = vec![false; n];
    let mut out = Vec::with_capacity(n);
    for group in [true, false] {
        let in_group = |i: usize| active[i] == group;

        for i in 0..n {
            if seen[i] || !in_group(i) {
                continue;
            }
            if parent_of[i].is_some_and(in_group) {
                continue; // emitted under its parent
            }
            emit_with_children(i, &in_group, &children, &mut seen, &mut out);
        }

        // Parent cycles leave members that never became roots
        for i in 0..n {
            if !seen[i] && in_group(i) {
                emit_with_children(i, &in_group, &children, &mut seen, &mut out);
            }
        }
    }

    out
}

/// `true` for tickets in the leading (active) group.
///
/// Promotion is decided from the initial partition only: a backlog ticket is
/// lifted when one of its direct subtasks is active, never transitively.
fn partition<T: Borrow<Ticket>>(
    category: StatusCategory,
    tickets: &[T],
    parent_of: &[Option<usize>],
) -> Vec<bool> {
    if category != StatusCategory::ToDo {
        return vec![true; tickets.len()];
    }

    let initially_active: Vec<bool> = tickets.iter().map(|t| !t.borrow().is_backlog()).collect();
    let mut active = initially_active.clone();
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(p) = parent {
            if initially_active[i] {
                active[*p] = true;
            }
        }
    }
    active
}

fn emit_with_children(
    root: usize,
    in_group: &impl Fn(usize) -> bool,
    children: &[Vec<usize>],
    seen: &mut [bool],
    out: &mut Vec<usize>,
) {
    let mut stack = vec![root];
    while let Some(i) = stack.pop() {
        if seen[i] {
            continue;
        }
        seen[i] = true;
        out.push(i);
        for &c in children[i].iter().rev() {
            if !seen[c] && in_group(c) {
                stack.push(c);
            }
        }
    }
}

/// Whether a To Do list mixes backlog and active tickets.
pub fn has_backlog_mix(tickets: &[Ticket]) -> bool {
    let mut backlog = false;
    let mut active = false;
    for t in tickets {
        if t.is_backlog() {
            backlog = true;
        } else {
            active = true;
        }
        if backlog && active {
            return true;
        }
    }
    false
}
