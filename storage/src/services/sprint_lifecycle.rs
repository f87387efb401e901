use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::sprint::CreateSprintRequest;
use crate::error::{Result, StorageError};
use crate::models::{Sprint, SprintStatus};
use crate::repository::{ProjectRepository, SprintRepository};
use crate::services::scoring;

pub async fn create_sprint(
    pool: &PgPool,
    project_id: Uuid,
    req: &CreateSprintRequest,
) -> Result<Sprint> {
    req.validate()?;

    if !ProjectRepository::new(pool).exists(project_id).await? {
        return Err(StorageError::NotFound("project"));
    }

    let repo = SprintRepository::new(pool);
    if repo.exists_by_number(project_id, req.sprint_number).await? {
        return Err(StorageError::Conflict(format!(
            "sprint number {} already exists in this project",
            req.sprint_number
        )));
    }

    repo.create(project_id, req).await
}

pub async fn start_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<Sprint> {
    let repo = SprintRepository::new(pool);
    let mut sprint = repo.find_by_id(sprint_id).await?;

    sprint.start(Utc::now().date_naive())?;
    repo.save_status(&sprint).await?;

    tracing::info!(%sprint_id, sprint_number = sprint.sprint_number, "sprint started");
    Ok(sprint)
}

/// Complete a sprint and run automatic team-badge evaluation for every
/// team on the sprint's project.
pub async fn complete_sprint(
    pool: &PgPool,
    sprint_id: Uuid,
    completion_date: Option<NaiveDate>,
) -> Result<Sprint> {
    let repo = SprintRepository::new(pool);
    let mut sprint = repo.find_by_id(sprint_id).await?;

    sprint.complete(Utc::now().date_naive(), completion_date)?;
    repo.save_status(&sprint).await?;

    let awarded = scoring::check_automatic_badges_on_sprint_completion(pool, &sprint).await?;
    tracing::info!(%sprint_id, sprint_number = sprint.sprint_number, badges_awarded = awarded,
        "sprint completed");

    Ok(sprint)
}

pub async fn cancel_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<Sprint> {
    let repo = SprintRepository::new(pool);
    let mut sprint = repo.find_by_id(sprint_id).await?;

    sprint.cancel()?;
    repo.save_status(&sprint).await?;

    tracing::info!(%sprint_id, sprint_number = sprint.sprint_number, "sprint cancelled");
    Ok(sprint)
}

/// A sprint with achievements or recorded metrics is part of the course
/// history; it can only be cancelled, never deleted.
pub async fn delete_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<()> {
    let repo = SprintRepository::new(pool);
    repo.find_by_id(sprint_id).await?;

    if repo.achievement_count(sprint_id).await? > 0 {
        return Err(StorageError::Conflict(
            "sprint has achievements and cannot be deleted; cancel it instead".to_string(),
        ));
    }
    if repo.metric_count(sprint_id).await? > 0 {
        return Err(StorageError::Conflict(
            "sprint has progress metrics and cannot be deleted; cancel it instead".to_string(),
        ));
    }

    repo.delete(sprint_id).await
}

pub async fn get_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Sprint>> {
    SprintRepository::new(pool).list_by_project(project_id).await
}

pub async fn get_by_status(pool: &PgPool, status: SprintStatus) -> Result<Vec<Sprint>> {
    SprintRepository::new(pool).list_by_status(status).await
}

/// Read-only sweep for sprints running past their end date. Logs each
/// finding and mutates nothing, so repeated runs are harmless. Scheduling
/// is the caller's concern.
pub async fn log_overdue_sprints(pool: &PgPool) -> Result<Vec<Sprint>> {
    let today = Utc::now().date_naive();
    let overdue = SprintRepository::new(pool).list_overdue(today).await?;

    for sprint in &overdue {
        tracing::warn!(
            sprint_id = %sprint.sprint_id,
            sprint_number = sprint.sprint_number,
            project_id = %sprint.project_id,
            end_date = %sprint.end_date,
            "sprint is overdue"
        );
    }

    Ok(overdue)
}
