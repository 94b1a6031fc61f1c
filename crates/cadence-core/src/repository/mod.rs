use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Assignment, NewAssignment, UpdateAssignmentData, WorkoutGroup, MAX_IDS_PER_QUERY,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

pub mod assignments;
pub mod groups;
pub mod memory;

/// Persistence for assignments. Every operation is single-document; there are no
/// cross-operation transactions.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create_assignment(&self, data: NewAssignment) -> Result<Assignment, CoreError>;
    async fn find_assignment_by_id(&self, id: Uuid) -> Result<Option<Assignment>, CoreError>;
    /// Assignments whose id, written as hex without dashes, starts with `prefix`.
    async fn find_assignments_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<Assignment>, CoreError>;
    async fn update_assignment(
        &self,
        id: Uuid,
        data: UpdateAssignmentData,
    ) -> Result<Assignment, CoreError>;
    async fn delete_assignment(&self, id: Uuid) -> Result<(), CoreError>;
    async fn find_assignments_by_series(
        &self,
        series_id: Uuid,
    ) -> Result<Vec<Assignment>, CoreError>;
    /// Owner's assignments with no group, dated within `[start, end]`.
    async fn find_personal_assignments(
        &self,
        owner_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError>;
    /// Assignments posted to any of `group_ids` within `[start, end]`.
    /// Fails with `BatchTooLarge` for more than [`MAX_IDS_PER_QUERY`] ids.
    async fn find_group_assignments(
        &self,
        group_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError>;
}

/// Read side of group membership.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn memberships_for(&self, user_id: Uuid) -> Result<HashSet<Uuid>, CoreError>;
}

/// Write side of group membership, used by administration tooling.
#[async_trait]
pub trait GroupRepository: GroupDirectory {
    async fn add_group(&self, name: String) -> Result<WorkoutGroup, CoreError>;
    async fn find_group_by_name(&self, name: &str) -> Result<Option<WorkoutGroup>, CoreError>;
    async fn find_groups(&self) -> Result<Vec<WorkoutGroup>, CoreError>;
    async fn add_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError>;
    async fn remove_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError>;
}

/// Main repository trait that composes the domain traits
pub trait Repository: AssignmentRepository + GroupRepository {}

impl<T: AssignmentRepository + GroupRepository> Repository for T {}

/// Rejects "match any of" lists the store cannot serve in one query.
pub fn ensure_batch_within_limit(ids: &[Uuid]) -> Result<(), CoreError> {
    if ids.len() > MAX_IDS_PER_QUERY {
        return Err(CoreError::BatchTooLarge {
            given: ids.len(),
            limit: MAX_IDS_PER_QUERY,
        });
    }
    Ok(())
}

/// SQLite implementation of the repository pattern
#[derive(Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
