use crate::error::CoreError;
use crate::models::{Assignment, NewAssignment, UpdateAssignmentData};
use crate::repository::{ensure_batch_within_limit, SqliteRepository};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

#[async_trait]
impl super::AssignmentRepository for SqliteRepository {
    async fn create_assignment(&self, data: NewAssignment) -> Result<Assignment, CoreError> {
        data.validate()?;

        let now = Utc::now();
        let assignment = Assignment {
            id: Uuid::now_v7(),
            series_id: data.series_id,
            title: data.title,
            description: data.description,
            workout_type: data.workout_type,
            template_id: data.template_id,
            date: data.date,
            owner_id: data.owner_id,
            group_id: data.group_id,
            hide_details: data.hide_details,
            reveal_date: data.reveal_date,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO assignments (id, series_id, title, description, workout_type, template_id, date, owner_id, group_id, hide_details, reveal_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(assignment.id)
        .bind(assignment.series_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.workout_type)
        .bind(assignment.template_id)
        .bind(assignment.date)
        .bind(assignment.owner_id)
        .bind(assignment.group_id)
        .bind(assignment.hide_details)
        .bind(assignment.reveal_date)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(self.pool())
        .await?;

        Ok(assignment)
    }

    async fn find_assignment_by_id(&self, id: Uuid) -> Result<Option<Assignment>, CoreError> {
        let assignment = sqlx::query_as("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(assignment)
    }

    async fn find_assignments_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<Assignment>, CoreError> {
        let pattern = format!("{}%", prefix.replace('-', "").to_lowercase());
        let assignments = sqlx::query_as(
            "SELECT * FROM assignments WHERE lower(hex(id)) LIKE $1 ORDER BY date, id",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(assignments)
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        data: UpdateAssignmentData,
    ) -> Result<Assignment, CoreError> {
        let mut tx = self.pool().begin().await?;

        let mut assignment: Assignment = sqlx::query_as("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Assignment with id {} not found", id)))?;

        if data.is_empty() {
            return Ok(assignment);
        }
        if matches!(&data.title, Some(title) if title.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "assignment title must not be empty".to_string(),
            ));
        }

        data.apply_to(&mut assignment);

        sqlx::query(
            r#"UPDATE assignments
            SET title = $1, description = $2, workout_type = $3, template_id = $4, date = $5,
                group_id = $6, hide_details = $7, reveal_date = $8, updated_at = $9
            WHERE id = $10"#,
        )
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.workout_type)
        .bind(assignment.template_id)
        .bind(assignment.date)
        .bind(assignment.group_id)
        .bind(assignment.hide_details)
        .bind(assignment.reveal_date)
        .bind(assignment.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Assignment with id {} not found", id)));
        }
        Ok(())
    }

    async fn find_assignments_by_series(
        &self,
        series_id: Uuid,
    ) -> Result<Vec<Assignment>, CoreError> {
        let assignments = sqlx::query_as(
            "SELECT * FROM assignments WHERE series_id = $1 ORDER BY date, id",
        )
        .bind(series_id)
        .fetch_all(self.pool())
        .await?;
        Ok(assignments)
    }

    async fn find_personal_assignments(
        &self,
        owner_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError> {
        let assignments = sqlx::query_as(
            r#"SELECT * FROM assignments
            WHERE owner_id = $1
            AND group_id IS NULL
            AND date BETWEEN $2 AND $3
            ORDER BY date, id"#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;
        Ok(assignments)
    }

    async fn find_group_assignments(
        &self,
        group_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError> {
        ensure_batch_within_limit(group_ids)?;
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM assignments WHERE group_id IN (");
        let mut separated = qb.separated(", ");
        for group_id in group_ids {
            separated.push_bind(*group_id);
        }
        separated.push_unseparated(") AND date BETWEEN ");
        qb.push_bind(start);
        qb.push(" AND ");
        qb.push_bind(end);
        qb.push(" ORDER BY date, id");

        let assignments = qb
            .build_query_as::<Assignment>()
            .fetch_all(self.pool())
            .await?;
        Ok(assignments)
    }
}
