//! Test utilities and fixtures for branchboard tests

#![allow(dead_code)]

use async_trait::async_trait;
use branchboard::data::{Scope, StatusCategory, Ticket};
use branchboard::integrations::{FetchError, TicketFetcher};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Active (non-backlog) top-level ticket
pub fn ticket(key: &str, summary: &str) -> Ticket {
    Ticket {
        key: key.to_string(),
        summary: summary.to_string(),
        status: "Selected for Development".to_string(),
        category: Some(StatusCategory::ToDo),
        issue_type: "Task".to_string(),
        project: key.split('-').next().unwrap_or_default().to_string(),
        ..Default::default()
    }
}

pub fn active(key: &str) -> Ticket {
    ticket(key, &format!("Summary of {}", key))
}

pub fn backlog(key: &str) -> Ticket {
    Ticket {
        status: "Backlog".to_string(),
        ..active(key)
    }
}

pub fn subtask_of(mut child: Ticket, parent: &str) -> Ticket {
    child.is_subtask = true;
    child.issue_type = "Sub-task".to_string();
    child.parent = Some(parent.to_string());
    child
}

/// `n` active tickets keyed `PREFIX-0 .. PREFIX-{n-1}`
pub fn tickets(prefix: &str, n: usize) -> Vec<Ticket> {
    (0..n).map(|i| active(&format!("{}-{}", prefix, i))).collect()
}

pub fn keys(tickets: &[Ticket]) -> Vec<&str> {
    tickets.iter().map(|t| t.key.as_str()).collect()
}

/// Decrements the in-flight counter even when the fetch future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted `TicketFetcher` that records calls and peak concurrency.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<(StatusCategory, Scope), Vec<Ticket>>,
    failures: HashSet<StatusCategory>,
    delays: HashMap<StatusCategory, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<(StatusCategory, Scope)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: StatusCategory, scope: Scope, tickets: Vec<Ticket>) -> Self {
        self.responses.insert((category, scope), tickets);
        self
    }

    /// Fetches for `category` fail with a 500 after their delay.
    pub fn failing(mut self, category: StatusCategory) -> Self {
        self.failures.insert(category);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn delay_for(mut self, category: StatusCategory, delay: Duration) -> Self {
        self.delays.insert(category, delay);
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(StatusCategory, Scope)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TicketFetcher for FakeFetcher {
    async fn fetch(
        &self,
        category: StatusCategory,
        scope: Scope,
        _max_results: u32,
    ) -> Result<Vec<Ticket>, FetchError> {
        self.calls.lock().unwrap().push((category, scope));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self.delays.get(&category).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failures.contains(&category) {
            return Err(FetchError::Status {
                status: 500,
                body: format!("{} is down", category.title()),
            });
        }
        Ok(self.responses.get(&(category, scope)).cloned().unwrap_or_default())
    }
}
