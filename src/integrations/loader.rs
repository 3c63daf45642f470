//! Bounded fan-out of ticket fetches.
//!
//! A run launches every task but admits at most `max_in_flight` at once and
//! stops waiting at the deadline. Whatever finished by then is returned; the
//! rest is abandoned by dropping the stream, which drops the request futures.

use super::{FetchError, TicketFetcher};
use crate::data::{Scope, StatusCategory, Ticket};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

pub const MAX_IN_FLIGHT: usize = 3;
pub const PRIMARY_DEADLINE: Duration = Duration::from_secs(30);
pub const PREFETCH_DEADLINE: Duration = Duration::from_secs(20);
pub const MAX_RESULTS: u32 = 100;

/// One column's worth of tickets to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTask {
    pub column: usize,
    pub category: StatusCategory,
    pub scope: Scope,
}

impl FetchTask {
    /// One task per board column for `scope`.
    pub fn all_columns(scope: Scope) -> Vec<FetchTask> {
        Self::for_columns(scope, &[0, 1, 2])
    }

    pub fn for_columns(scope: Scope, columns: &[usize]) -> Vec<FetchTask> {
        columns
            .iter()
            .filter_map(|&column| {
                StatusCategory::ALL.get(column).map(|&category| FetchTask {
                    column,
                    category,
                    scope,
                })
            })
            .collect()
    }
}

/// How task failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Foreground load: the first failure aborts the run.
    Primary,
    /// Background load: failures are logged and dropped.
    Prefetch,
}

/// Columns that completed, keyed by column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub results: BTreeMap<usize, Vec<Ticket>>,
    /// Some tasks were still running at the deadline.
    pub timed_out: bool,
}

#[derive(Debug, Error)]
#[error("loading column {column} failed: {source}")]
pub struct FanOutError {
    pub column: usize,
    #[source]
    pub source: FetchError,
    /// Columns that completed before the failure.
    pub partial: LoadReport,
}

#[derive(Debug, Clone)]
pub struct FanOut {
    pub mode: LoadMode,
    pub max_in_flight: usize,
    pub deadline: Duration,
    span: tracing::Span,
}

impl FanOut {
    pub fn primary() -> Self {
        Self::new(LoadMode::Primary, PRIMARY_DEADLINE)
    }

    pub fn prefetch() -> Self {
        Self::new(LoadMode::Prefetch, PREFETCH_DEADLINE)
    }

    pub fn new(mode: LoadMode, deadline: Duration) -> Self {
        Self {
            mode,
            max_in_flight: MAX_IN_FLIGHT,
            deadline,
            span: tracing::Span::none(),
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Parent span for this run's log records.
    pub fn in_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub async fn run(
        &self,
        fetcher: &dyn TicketFetcher,
        tasks: Vec<FetchTask>,
    ) -> Result<LoadReport, FanOutError> {
        let span = tracing::debug_span!(
            parent: &self.span,
            "fan_out",
            mode = ?self.mode,
            tasks = tasks.len()
        );
        self.collect(fetcher, tasks).instrument(span).await
    }

    async fn collect(
        &self,
        fetcher: &dyn TicketFetcher,
        tasks: Vec<FetchTask>,
    ) -> Result<LoadReport, FanOutError> {
        let mut report = LoadReport::default();
        if tasks.is_empty() {
            return Ok(report);
        }

        let deadline = tokio::time::Instant::now() + self.deadline;
        let mut pending = stream::iter(tasks)
            .map(|task| async move {
                let result = fetcher.fetch(task.category, task.scope, MAX_RESULTS).await;
                (task, result)
            })
            .buffer_unordered(self.max_in_flight.max(1));

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((task, Ok(tickets)))) => {
                    tracing::debug!(
                        column = task.column,
                        scope = task.scope.config_key(),
                        count = tickets.len(),
                        "column loaded"
                    );
                    report.results.insert(task.column, tickets);
                }
                Ok(Some((task, Err(err)))) => match self.mode {
                    LoadMode::Primary => {
                        tracing::warn!(column = task.column, "primary load failed: {}", err);
                        return Err(FanOutError {
                            column: task.column,
                            source: err,
                            partial: report,
                        });
                    }
                    LoadMode::Prefetch => {
                        tracing::debug!(column = task.column, "prefetch dropped: {}", err);
                    }
                },
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        completed = report.results.len(),
                        "deadline reached, keeping partial results"
                    );
                    report.timed_out = true;
                    break;
                }
            }
        }

        Ok(report)
    }
}
