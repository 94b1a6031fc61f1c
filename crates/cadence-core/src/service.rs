use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::error::CoreError;
use crate::fanout::guarded;
use crate::models::{
    Assignment, NewAssignment, SchedulingConfig, UpdateAssignmentData, WorkoutGroup,
};
use crate::recurrence::{Expansion, RecurrenceExpander, RecurrenceRule, SeriesRequest};
use crate::repository::Repository;
use crate::schedule::{Schedule, ScheduleAggregator};
use crate::series::{DeleteOutcome, SeriesOutcome, SeriesWriter, WriteOutcome};

/// Scheduler: the public entry point tying expansion, series writes and
/// schedule loads to one repository and one configuration.
///
/// Responsibilities:
/// 1. Build series requests with configured defaults
/// 2. Hand writes to [`SeriesWriter`] and reads to [`ScheduleAggregator`]
/// 3. Scope cancellation to a single call: the `*_with_cancellation` variants
///    take the caller's token, the plain ones run with a token nobody cancels
pub struct Scheduler<R: Repository> {
    repo: R,
    config: SchedulingConfig,
}

impl<R: Repository> Scheduler<R> {
    pub fn new(repo: R, config: SchedulingConfig) -> Self {
        Self { repo, config }
    }

    pub fn with_defaults(repo: R) -> Self {
        Self::new(repo, SchedulingConfig::default())
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Builds a request, filling missing bounds from the configuration.
    pub fn request(
        &self,
        anchor: NaiveDate,
        rule: RecurrenceRule,
        end: Option<NaiveDate>,
        instance_cap: Option<usize>,
    ) -> Result<SeriesRequest, CoreError> {
        SeriesRequest::from_config(anchor, rule, end, instance_cap, &self.config)
    }

    /// Pure preview of the dates a request produces.
    pub fn expand(&self, request: &SeriesRequest) -> Expansion {
        RecurrenceExpander::expand(request)
    }

    pub async fn write_series(
        &self,
        template: &NewAssignment,
        dates: &[NaiveDate],
    ) -> Result<WriteOutcome, CoreError> {
        self.write_series_with_cancellation(template, dates, CancellationToken::new())
            .await
    }

    pub async fn write_series_with_cancellation(
        &self,
        template: &NewAssignment,
        dates: &[NaiveDate],
        cancel: CancellationToken,
    ) -> Result<WriteOutcome, CoreError> {
        self.writer(cancel).write(template, dates).await
    }

    pub async fn schedule_series(
        &self,
        template: &NewAssignment,
        request: &SeriesRequest,
    ) -> Result<SeriesOutcome, CoreError> {
        self.schedule_series_with_cancellation(template, request, CancellationToken::new())
            .await
    }

    pub async fn schedule_series_with_cancellation(
        &self,
        template: &NewAssignment,
        request: &SeriesRequest,
        cancel: CancellationToken,
    ) -> Result<SeriesOutcome, CoreError> {
        self.writer(cancel).schedule(template, request).await
    }

    pub async fn load_schedule(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Schedule, CoreError> {
        self.load_schedule_with_cancellation(user_id, start, end, CancellationToken::new())
            .await
    }

    pub async fn load_schedule_with_cancellation(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<Schedule, CoreError> {
        ScheduleAggregator::new(&self.repo, &self.repo, &self.config)
            .with_cancellation(cancel)
            .load(user_id, start, end)
            .await
    }

    /// Looks up one assignment under the configured store timeout.
    pub async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, CoreError> {
        self.find_assignment_with_cancellation(id, CancellationToken::new())
            .await
    }

    pub async fn find_assignment_with_cancellation(
        &self,
        id: Uuid,
        cancel: CancellationToken,
    ) -> Result<Option<Assignment>, CoreError> {
        guarded(
            self.repo.find_assignment_by_id(id),
            self.config.store_timeout(),
            &cancel,
        )
        .await
    }

    /// Every group, for labelling schedule rows.
    pub async fn groups_with_cancellation(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<WorkoutGroup>, CoreError> {
        guarded(self.repo.find_groups(), self.config.store_timeout(), &cancel).await
    }

    pub async fn update_assignment(
        &self,
        id: Uuid,
        data: UpdateAssignmentData,
    ) -> Result<Assignment, CoreError> {
        self.update_assignment_with_cancellation(id, data, CancellationToken::new())
            .await
    }

    pub async fn update_assignment_with_cancellation(
        &self,
        id: Uuid,
        data: UpdateAssignmentData,
        cancel: CancellationToken,
    ) -> Result<Assignment, CoreError> {
        let assignment = guarded(
            self.repo.update_assignment(id, data),
            self.config.store_timeout(),
            &cancel,
        )
        .await?;
        info!(%id, "assignment updated");
        Ok(assignment)
    }

    pub async fn delete_assignment(&self, id: Uuid) -> Result<(), CoreError> {
        self.delete_assignment_with_cancellation(id, CancellationToken::new())
            .await
    }

    pub async fn delete_assignment_with_cancellation(
        &self,
        id: Uuid,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        self.writer(cancel).delete_assignment(id).await
    }

    pub async fn delete_series(&self, series_id: Uuid) -> Result<DeleteOutcome, CoreError> {
        self.delete_series_with_cancellation(series_id, CancellationToken::new())
            .await
    }

    pub async fn delete_series_with_cancellation(
        &self,
        series_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<DeleteOutcome, CoreError> {
        self.writer(cancel).delete_series(series_id).await
    }

    fn writer(&self, cancel: CancellationToken) -> SeriesWriter<'_, R> {
        SeriesWriter::new(&self.repo, &self.config).with_cancellation(cancel)
    }
}
