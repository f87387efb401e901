use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::user_story::{CreateUserStoryRequest, UpdateUserStoryRequest};
use crate::error::{Result, StorageError};
use crate::models::{StoryStatus, UserStory};

const STORY_COLUMNS: &str = "story_id, sprint_id, team_id, title, description, story_points, \
     status, priority, assigned_to, created_by, created_at, updated_at";

/// Task/story-point counts for one (sprint, team), derived from the current
/// set of user stories.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StoryRollup {
    pub completed_tasks: i64,
    pub total_tasks: i64,
    pub story_points_completed: i64,
    pub total_story_points: i64,
}

/// Repository for UserStory database operations
pub struct UserStoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<UserStory> {
        let story = sqlx::query_as::<_, UserStory>(&format!(
            "SELECT {STORY_COLUMNS} FROM user_stories WHERE story_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("user story"))?;

        Ok(story)
    }

    pub async fn exists_by_title(&self, sprint_id: Uuid, title: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_stories WHERE sprint_id = $1 AND title = $2)",
        )
        .bind(sprint_id)
        .bind(title)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn create(&self, req: &CreateUserStoryRequest) -> Result<UserStory> {
        let story = sqlx::query_as::<_, UserStory>(&format!(
            r#"
            INSERT INTO user_stories
                (sprint_id, team_id, title, description, story_points, status, priority, created_by)
            VALUES ($1, $2, $3, $4, $5, 'TODO', $6, $7)
            RETURNING {STORY_COLUMNS}
            "#
        ))
        .bind(req.sprint_id)
        .bind(req.team_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.story_points)
        .bind(req.priority)
        .bind(req.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(format!(
                    "a story titled '{}' already exists in this sprint",
                    req.title
                ))
            } else {
                err
            }
        })?;

        Ok(story)
    }

    pub async fn update(&self, existing: &UserStory, req: &UpdateUserStoryRequest) -> Result<UserStory> {
        let title = req.title.as_ref().unwrap_or(&existing.title);
        let description = req.description.as_ref().or(existing.description.as_ref());
        let story_points = req.story_points.unwrap_or(existing.story_points);
        let priority = req.priority.unwrap_or(existing.priority);

        let story = sqlx::query_as::<_, UserStory>(&format!(
            r#"
            UPDATE user_stories
            SET title = $2, description = $3, story_points = $4, priority = $5, updated_at = NOW()
            WHERE story_id = $1
            RETURNING {STORY_COLUMNS}
            "#
        ))
        .bind(existing.story_id)
        .bind(title)
        .bind(description)
        .bind(story_points)
        .bind(priority)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(format!(
                    "a story titled '{title}' already exists in this sprint"
                ))
            } else {
                err
            }
        })?
        .ok_or(StorageError::NotFound("user story"))?;

        Ok(story)
    }

    pub async fn save_status(&self, story: &UserStory) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_stories SET status = $2, updated_at = NOW() WHERE story_id = $1",
        )
        .bind(story.story_id)
        .bind(story.status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("user story"));
        }
        Ok(())
    }

    pub async fn save_assignment(&self, story_id: Uuid, assigned_to: Option<Uuid>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_stories SET assigned_to = $2, updated_at = NOW() WHERE story_id = $1",
        )
        .bind(story_id)
        .bind(assigned_to)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("user story"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM user_stories WHERE story_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("user story"));
        }
        Ok(())
    }

    pub async fn list_by_sprint(&self, sprint_id: Uuid) -> Result<Vec<UserStory>> {
        let stories = sqlx::query_as::<_, UserStory>(&format!(
            "SELECT {STORY_COLUMNS} FROM user_stories WHERE sprint_id = $1 ORDER BY priority DESC, created_at"
        ))
        .bind(sprint_id)
        .fetch_all(self.pool)
        .await?;

        Ok(stories)
    }

    /// Current task and story-point counts for one (sprint, team).
    pub async fn rollup(&self, sprint_id: Uuid, team_id: Uuid) -> Result<StoryRollup> {
        let rollup = sqlx::query_as::<_, StoryRollup>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'DONE') AS completed_tasks,
                COUNT(*) AS total_tasks,
                COALESCE(SUM(story_points) FILTER (WHERE status = 'DONE'), 0)::bigint AS story_points_completed,
                COALESCE(SUM(story_points), 0)::bigint AS total_story_points
            FROM user_stories
            WHERE sprint_id = $1 AND team_id = $2
            "#,
        )
        .bind(sprint_id)
        .bind(team_id)
        .fetch_one(self.pool)
        .await?;

        Ok(rollup)
    }

    pub async fn total_points_by_sprint(&self, sprint_id: Uuid) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(story_points), 0)::bigint FROM user_stories WHERE sprint_id = $1",
        )
        .bind(sprint_id)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    pub async fn completed_points_by_sprint(&self, sprint_id: Uuid) -> Result<i64> {
        let completed = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(story_points), 0)::bigint FROM user_stories \
             WHERE sprint_id = $1 AND status = 'DONE'",
        )
        .bind(sprint_id)
        .fetch_one(self.pool)
        .await?;

        Ok(completed)
    }

    /// Completed vs. total story points across every sprint of a project;
    /// feeds the project's cached progress percentage.
    pub async fn project_point_totals(&self, project_id: Uuid) -> Result<(i64, i64)> {
        let (completed, total) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(us.story_points) FILTER (WHERE us.status = 'DONE'), 0)::bigint,
                COALESCE(SUM(us.story_points), 0)::bigint
            FROM user_stories us
            JOIN sprints s ON us.sprint_id = s.sprint_id
            WHERE s.project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok((completed, total))
    }

    /// DONE stories assigned to a user within a project; feeds user-level
    /// automatic badge evaluation.
    pub async fn completed_assigned_count(&self, user_id: Uuid, project_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_stories us
            JOIN sprints s ON us.sprint_id = s.sprint_id
            WHERE us.assigned_to = $1 AND s.project_id = $2 AND us.status = $3
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(StoryStatus::Done)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
