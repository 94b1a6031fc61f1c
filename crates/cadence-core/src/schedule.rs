//! Merged schedule view for one athlete.
//!
//! A user's schedule is the union of their personal assignments and the
//! assignments of every group they belong to. The store only answers "any of"
//! queries for a handful of group ids at a time, so group ids are split into
//! batches and every batch is queried concurrently alongside the personal query.

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::fanout::guarded;
use crate::models::{Assignment, SchedulingConfig};
use crate::repository::{AssignmentRepository, GroupDirectory};

/// Which sub-query produced a result or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Personal,
    GroupBatch { index: usize, group_ids: Vec<Uuid> },
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySource::Personal => write!(f, "personal assignments"),
            QuerySource::GroupBatch { index, group_ids } => {
                write!(f, "group batch {} ({} groups)", index + 1, group_ids.len())
            }
        }
    }
}

/// A sub-query that failed without failing the load.
#[derive(Debug)]
pub struct PartialError {
    pub source: QuerySource,
    pub error: CoreError,
}

impl fmt::Display for PartialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

#[derive(Debug, Default)]
pub struct Schedule {
    /// Unique by id, ordered by date then id
    pub assignments: Vec<Assignment>,
    pub partial_errors: Vec<PartialError>,
    /// Sub-queries issued: one personal plus one per group batch
    pub query_count: usize,
}

impl Schedule {
    pub fn is_complete(&self) -> bool {
        self.partial_errors.is_empty()
    }
}

/// Splits `ids` into consecutive chunks of at most `size` (treated as 1 when 0).
pub fn partition_batches(ids: &[Uuid], size: usize) -> Vec<Vec<Uuid>> {
    ids.chunks(size.max(1)).map(|chunk| chunk.to_vec()).collect()
}

/// Folds `batch` into `merged`, keyed by id. Merging the same batch twice
/// leaves `merged` unchanged.
pub fn merge_assignments(merged: &mut HashMap<Uuid, Assignment>, batch: Vec<Assignment>) {
    for assignment in batch {
        merged.entry(assignment.id).or_insert(assignment);
    }
}

/// ScheduleAggregator: reconstitutes what one user should see in a date window.
pub struct ScheduleAggregator<'a, R: ?Sized, G: ?Sized> {
    store: &'a R,
    directory: &'a G,
    batch_size: usize,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<'a, R, G> ScheduleAggregator<'a, R, G>
where
    R: AssignmentRepository + ?Sized,
    G: GroupDirectory + ?Sized,
{
    pub fn new(store: &'a R, directory: &'a G, config: &SchedulingConfig) -> Self {
        Self {
            store,
            directory,
            batch_size: config.batch_size(),
            timeout: config.store_timeout(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Loads the merged schedule for `user_id` within `[start, end]`.
    ///
    /// # Behavior
    /// - The membership lookup runs first; its failure fails the call
    /// - One personal query and one query per batch of group ids then run concurrently
    /// - A failed or timed-out sub-query becomes a [`PartialError`] and its
    ///   results are left out; the others are still merged
    /// - Cancellation fails the call with `CoreError::Cancelled`
    pub async fn load(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Schedule, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let memberships = guarded(
            self.directory.memberships_for(user_id),
            self.timeout,
            &self.cancel,
        )
        .await?;

        let mut group_ids: Vec<Uuid> = memberships.into_iter().collect();
        group_ids.sort();

        let sources: Vec<QuerySource> = std::iter::once(QuerySource::Personal)
            .chain(
                partition_batches(&group_ids, self.batch_size)
                    .into_iter()
                    .enumerate()
                    .map(|(index, group_ids)| QuerySource::GroupBatch { index, group_ids }),
            )
            .collect();
        let query_count = sources.len();

        debug!(
            %user_id,
            groups = group_ids.len(),
            queries = query_count,
            "loading schedule"
        );

        let mut pending: FuturesUnordered<_> = sources
            .into_iter()
            .map(|source| async move {
                let result = match &source {
                    QuerySource::Personal => {
                        guarded(
                            self.store.find_personal_assignments(user_id, start, end),
                            self.timeout,
                            &self.cancel,
                        )
                        .await
                    }
                    QuerySource::GroupBatch { group_ids, .. } => {
                        guarded(
                            self.store.find_group_assignments(group_ids, start, end),
                            self.timeout,
                            &self.cancel,
                        )
                        .await
                    }
                };
                (source, result)
            })
            .collect();

        let mut merged = HashMap::new();
        let mut partial_errors = Vec::new();
        while let Some((source, result)) = pending.next().await {
            match result {
                Ok(batch) => merge_assignments(&mut merged, batch),
                Err(error) => {
                    warn!(%user_id, %source, %error, "schedule sub-query failed");
                    partial_errors.push(PartialError { source, error });
                }
            }
            debug!(%user_id, outstanding = pending.len(), "schedule sub-query completed");
        }

        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let mut assignments: Vec<Assignment> = merged.into_values().collect();
        assignments.sort_by_key(|a| (a.date, a.id));

        info!(
            %user_id,
            assignments = assignments.len(),
            failed_queries = partial_errors.len(),
            "schedule loaded"
        );

        Ok(Schedule {
            assignments,
            partial_errors,
            query_count,
        })
    }
}
