use crate::error::CoreError;
use crate::models::WorkoutGroup;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

#[async_trait]
impl super::GroupDirectory for SqliteRepository {
    async fn memberships_for(&self, user_id: Uuid) -> Result<HashSet<Uuid>, CoreError> {
        let group_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT group_id FROM group_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;
        Ok(group_ids.into_iter().collect())
    }
}

#[async_trait]
impl super::GroupRepository for SqliteRepository {
    async fn add_group(&self, name: String) -> Result<WorkoutGroup, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidInput("group name must not be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;

        let existing: Option<WorkoutGroup> =
            sqlx::query_as("SELECT * FROM workout_groups WHERE name = $1")
                .bind(&name)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(CoreError::InvalidInput(format!("Group '{}' already exists", name)));
        }

        let group = WorkoutGroup {
            id: Uuid::now_v7(),
            name,
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO workout_groups (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(group.id)
            .bind(&group.name)
            .bind(group.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(group)
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<WorkoutGroup>, CoreError> {
        let group = sqlx::query_as("SELECT * FROM workout_groups WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(group)
    }

    async fn find_groups(&self) -> Result<Vec<WorkoutGroup>, CoreError> {
        let groups = sqlx::query_as("SELECT * FROM workout_groups ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(groups)
    }

    async fn add_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let group: Option<WorkoutGroup> =
            sqlx::query_as("SELECT * FROM workout_groups WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&mut *tx)
                .await?;
        if group.is_none() {
            return Err(CoreError::NotFound(format!("Group with id {} not found", group_id)));
        }

        sqlx::query("INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            )));
        }
        Ok(())
    }
}
