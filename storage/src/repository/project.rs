use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Project;

const PROJECT_COLUMNS: &str = "project_id, name, description, start_date, end_date, status, \
     progress, course_id, created_at";

/// Repository for Project database operations
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("project"))?;

        Ok(project)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Refresh the cached progress percentage. Called synchronously from
    /// every story mutation path.
    pub async fn update_progress(&self, id: Uuid, progress: Decimal) -> Result<()> {
        let result = sqlx::query("UPDATE projects SET progress = $2 WHERE project_id = $1")
            .bind(id)
            .bind(progress)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("project"));
        }
        Ok(())
    }
}
