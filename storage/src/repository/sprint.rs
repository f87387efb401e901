use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::sprint::CreateSprintRequest;
use crate::error::{Result, StorageError};
use crate::models::{Sprint, SprintStatus};

const SPRINT_COLUMNS: &str = "sprint_id, project_id, sprint_number, name, goal, \
     start_date, end_date, status, completed_at, created_at";

/// Repository for Sprint database operations
pub struct SprintRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SprintRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Sprint> {
        let sprint = sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE sprint_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("sprint"))?;

        Ok(sprint)
    }

    pub async fn exists_by_number(&self, project_id: Uuid, sprint_number: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sprints WHERE project_id = $1 AND sprint_number = $2)",
        )
        .bind(project_id)
        .bind(sprint_number)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn create(&self, project_id: Uuid, req: &CreateSprintRequest) -> Result<Sprint> {
        let sprint = sqlx::query_as::<_, Sprint>(&format!(
            r#"
            INSERT INTO sprints (project_id, sprint_number, name, goal, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PLANNED')
            RETURNING {SPRINT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(req.sprint_number)
        .bind(&req.name)
        .bind(&req.goal)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(format!(
                    "sprint number {} already exists in this project",
                    req.sprint_number
                ))
            } else {
                err
            }
        })?;

        Ok(sprint)
    }

    /// Persist a lifecycle transition already applied to the model.
    pub async fn save_status(&self, sprint: &Sprint) -> Result<()> {
        let result = sqlx::query(
            "UPDATE sprints SET status = $2, completed_at = $3 WHERE sprint_id = $1",
        )
        .bind(sprint.sprint_id)
        .bind(sprint.status)
        .bind(sprint.completed_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("sprint"));
        }
        Ok(())
    }

    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Sprint>> {
        let sprints = sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE project_id = $1 ORDER BY sprint_number"
        ))
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(sprints)
    }

    pub async fn list_by_status(&self, status: SprintStatus) -> Result<Vec<Sprint>> {
        let sprints = sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE status = $1 ORDER BY start_date"
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(sprints)
    }

    /// IN_PROGRESS sprints whose end date has passed. Read-only; feeds the
    /// overdue sweep.
    pub async fn list_overdue(&self, today: NaiveDate) -> Result<Vec<Sprint>> {
        let sprints = sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints \
             WHERE status = 'IN_PROGRESS' AND end_date < $1 ORDER BY end_date"
        ))
        .bind(today)
        .fetch_all(self.pool)
        .await?;

        Ok(sprints)
    }

    pub async fn achievement_count(&self, sprint_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM achievements WHERE sprint_id = $1",
        )
        .bind(sprint_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn metric_count(&self, sprint_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM progress_metrics WHERE sprint_id = $1",
        )
        .bind(sprint_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM sprints WHERE sprint_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("sprint"));
        }
        Ok(())
    }

    /// True when the project has sprints and every one of them was
    /// completed on or before its planned end date.
    pub async fn all_sprints_on_time(&self, project_id: Uuid) -> Result<bool> {
        let on_time = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM sprints WHERE project_id = $1)
               AND NOT EXISTS(
                   SELECT 1 FROM sprints
                   WHERE project_id = $1
                     AND (status <> 'COMPLETED' OR completed_at > end_date)
               )
            "#,
        )
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(on_time)
    }
}
