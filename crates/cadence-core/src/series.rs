use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::fanout::guarded;
use crate::models::{Assignment, NewAssignment, SchedulingConfig};
use crate::recurrence::{RecurrenceExpander, SeriesRequest};
use crate::repository::AssignmentRepository;

/// Overall shape of a write, for callers deciding what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The rule produced no occurrences; nothing was attempted.
    NoDates,
    Complete,
    Partial,
    Failed,
}

/// Result of fanning out one create per date.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// Shared by every instance; None for one-off writes and when no dates were given.
    pub series_id: Option<Uuid>,
    /// Created assignments, ordered by date
    pub succeeded: Vec<Assignment>,
    /// Dates whose create failed, ordered by date
    pub failed: Vec<(NaiveDate, CoreError)>,
}

impl WriteOutcome {
    pub fn status(&self) -> WriteStatus {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (true, true) => WriteStatus::NoDates,
            (false, true) => WriteStatus::Complete,
            (false, false) => WriteStatus::Partial,
            (true, false) => WriteStatus::Failed,
        }
    }

    pub fn no_dates_generated(&self) -> bool {
        self.status() == WriteStatus::NoDates
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Expansion and write results for one series request.
#[derive(Debug)]
pub struct SeriesOutcome {
    /// The instance cap stopped expansion before the end date
    pub truncated: bool,
    pub outcome: WriteOutcome,
}

/// Result of a best-effort series delete.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<(Uuid, CoreError)>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// SeriesWriter: persists one assignment per expanded date.
///
/// Creates are independent: all of them start together, none waits on another,
/// and the call returns once every create has succeeded or failed. This is a
/// scatter/gather, not a transaction; committed creates stay committed.
pub struct SeriesWriter<'a, R: ?Sized> {
    store: &'a R,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<'a, R: AssignmentRepository + ?Sized> SeriesWriter<'a, R> {
    pub fn new(store: &'a R, config: &SchedulingConfig) -> Self {
        Self {
            store,
            timeout: config.store_timeout(),
            cancel: CancellationToken::new(),
        }
    }

    /// Outstanding creates and deletes resolve to `Cancelled` once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Writes one instance of `template` per date under a fresh series id.
    ///
    /// # Returns
    /// * `Ok(WriteOutcome)` - per-date successes and failures; empty with
    ///   `WriteStatus::NoDates` when `dates` is empty
    /// * `Err(CoreError)` - only when `template` is invalid, before any write starts
    pub async fn write(
        &self,
        template: &NewAssignment,
        dates: &[NaiveDate],
    ) -> Result<WriteOutcome, CoreError> {
        if dates.is_empty() {
            info!("recurrence produced no dates; nothing to write");
            return Ok(WriteOutcome::default());
        }
        self.write_instances(template, dates, Some(Uuid::now_v7()))
            .await
    }

    /// Expands `request` and writes the resulting dates. Non-recurring rules
    /// create a single one-off assignment without a series id.
    pub async fn schedule(
        &self,
        template: &NewAssignment,
        request: &SeriesRequest,
    ) -> Result<SeriesOutcome, CoreError> {
        template.validate()?;
        let expansion = RecurrenceExpander::expand(request);
        if expansion.truncated {
            warn!(
                cap = request.instance_cap(),
                end = %request.end(),
                "series truncated at instance cap"
            );
        }

        let outcome = if expansion.is_empty() {
            info!(rule = %request.rule(), "recurrence produced no dates; nothing to write");
            WriteOutcome::default()
        } else if request.rule().is_recurring() {
            self.write_instances(template, &expansion.dates, Some(Uuid::now_v7()))
                .await?
        } else {
            self.write_instances(template, &expansion.dates, None).await?
        };

        Ok(SeriesOutcome {
            truncated: expansion.truncated,
            outcome,
        })
    }

    /// Creates a single assignment exactly as given.
    pub async fn create_one_off(&self, data: NewAssignment) -> Result<Assignment, CoreError> {
        data.validate()?;
        guarded(self.store.create_assignment(data), self.timeout, &self.cancel).await
    }

    pub async fn delete_assignment(&self, id: Uuid) -> Result<(), CoreError> {
        guarded(self.store.delete_assignment(id), self.timeout, &self.cancel).await?;
        info!(%id, "assignment deleted");
        Ok(())
    }

    /// Deletes every instance sharing `series_id`, fanned out like `write`.
    ///
    /// Finding the instances is a prerequisite and fails the whole call;
    /// individual deletes fail independently.
    pub async fn delete_series(&self, series_id: Uuid) -> Result<DeleteOutcome, CoreError> {
        let instances = guarded(
            self.store.find_assignments_by_series(series_id),
            self.timeout,
            &self.cancel,
        )
        .await?;

        if instances.is_empty() {
            return Err(CoreError::NotFound(format!(
                "Series with id {} not found",
                series_id
            )));
        }

        let mut pending: FuturesUnordered<_> = instances
            .iter()
            .map(|assignment| {
                let id = assignment.id;
                async move {
                    let result =
                        guarded(self.store.delete_assignment(id), self.timeout, &self.cancel).await;
                    (id, result)
                }
            })
            .collect();

        let mut outcome = DeleteOutcome::default();
        while let Some((id, result)) = pending.next().await {
            match result {
                Ok(()) => outcome.deleted.push(id),
                Err(error) => {
                    warn!(%series_id, %id, %error, "series instance delete failed");
                    outcome.failed.push((id, error));
                }
            }
            debug!(%series_id, outstanding = pending.len(), "series delete completed");
        }

        info!(
            %series_id,
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            "series delete finished"
        );
        Ok(outcome)
    }

    async fn write_instances(
        &self,
        template: &NewAssignment,
        dates: &[NaiveDate],
        series_id: Option<Uuid>,
    ) -> Result<WriteOutcome, CoreError> {
        template.validate()?;

        let mut pending: FuturesUnordered<_> = dates
            .iter()
            .map(|&date| {
                let mut data = template.clone();
                data.date = date;
                data.series_id = series_id;
                async move {
                    let result = guarded(
                        self.store.create_assignment(data),
                        self.timeout,
                        &self.cancel,
                    )
                    .await;
                    (date, result)
                }
            })
            .collect();

        let mut outcome = WriteOutcome {
            series_id,
            ..Default::default()
        };
        while let Some((date, result)) = pending.next().await {
            match result {
                Ok(assignment) => outcome.succeeded.push(assignment),
                Err(error) => {
                    warn!(?series_id, %date, %error, "series instance create failed");
                    outcome.failed.push((date, error));
                }
            }
            debug!(?series_id, outstanding = pending.len(), "series create completed");
        }

        outcome.succeeded.sort_by_key(|a| (a.date, a.id));
        outcome.failed.sort_by_key(|(date, _)| *date);

        info!(
            ?series_id,
            created = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "series write finished"
        );
        Ok(outcome)
    }
}
