use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_story::{CreateUserStoryRequest, SprintStoryStats, UpdateUserStoryRequest};
use crate::error::{Result, StorageError};
use crate::models::{Project, UserStory};
use crate::repository::{
    ProjectRepository, SprintRepository, TeamRepository, UserStoryRepository,
};
use crate::services::{progress_analytics, scoring};

pub async fn create_story(pool: &PgPool, req: &CreateUserStoryRequest) -> Result<UserStory> {
    req.validate()?;

    let sprint = SprintRepository::new(pool).find_by_id(req.sprint_id).await?;
    TeamRepository::new(pool).find_by_id(req.team_id).await?;

    let stories = UserStoryRepository::new(pool);
    if stories.exists_by_title(req.sprint_id, &req.title).await? {
        return Err(StorageError::Conflict(format!(
            "a story titled '{}' already exists in this sprint",
            req.title
        )));
    }

    let story = stories.create(req).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;
    Ok(story)
}

pub async fn update_story(
    pool: &PgPool,
    story_id: Uuid,
    req: &UpdateUserStoryRequest,
) -> Result<UserStory> {
    req.validate()?;

    let stories = UserStoryRepository::new(pool);
    let existing = stories.find_by_id(story_id).await?;

    if let Some(title) = &req.title {
        if title != &existing.title && stories.exists_by_title(existing.sprint_id, title).await? {
            return Err(StorageError::Conflict(format!(
                "a story titled '{title}' already exists in this sprint"
            )));
        }
    }

    let story = stories.update(&existing, req).await?;
    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;
    Ok(story)
}

/// Assignment is restricted to active members of the story's team.
pub async fn assign_story(pool: &PgPool, story_id: Uuid, user_id: Uuid) -> Result<UserStory> {
    let stories = UserStoryRepository::new(pool);
    let mut story = stories.find_by_id(story_id).await?;

    if !TeamRepository::new(pool)
        .is_active_member(story.team_id, user_id)
        .await?
    {
        return Err(StorageError::Validation(
            "assignee must be an active member of the story's team".to_string(),
        ));
    }

    stories.save_assignment(story_id, Some(user_id)).await?;
    story.assigned_to = Some(user_id);

    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;
    Ok(story)
}

pub async fn unassign_story(pool: &PgPool, story_id: Uuid) -> Result<UserStory> {
    let stories = UserStoryRepository::new(pool);
    let mut story = stories.find_by_id(story_id).await?;

    stories.save_assignment(story_id, None).await?;
    story.assigned_to = None;

    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;
    Ok(story)
}

/// Advance the story one workflow step. A transition into DONE runs
/// automatic badge evaluation for the story's sprint on top of the usual
/// progress recomputation.
pub async fn move_story_next(pool: &PgPool, story_id: Uuid) -> Result<UserStory> {
    let stories = UserStoryRepository::new(pool);
    let mut story = stories.find_by_id(story_id).await?;

    story.move_to_next_status()?;
    stories.save_status(&story).await?;

    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;

    if story.is_done() {
        let awarded = scoring::check_automatic_badges_on_story_completion(pool, &story).await?;
        tracing::info!(%story_id, badges_awarded = awarded, "story completed");
    }

    Ok(story)
}

pub async fn move_story_previous(pool: &PgPool, story_id: Uuid) -> Result<UserStory> {
    let stories = UserStoryRepository::new(pool);
    let mut story = stories.find_by_id(story_id).await?;

    story.move_to_previous_status()?;
    stories.save_status(&story).await?;

    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await?;
    Ok(story)
}

pub async fn delete_story(pool: &PgPool, story_id: Uuid) -> Result<()> {
    let stories = UserStoryRepository::new(pool);
    let story = stories.find_by_id(story_id).await?;
    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;

    stories.delete(story_id).await?;
    refresh_progress(pool, sprint.project_id, story.sprint_id, story.team_id).await
}

pub async fn total_points_by_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<i64> {
    UserStoryRepository::new(pool).total_points_by_sprint(sprint_id).await
}

pub async fn completed_points_by_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<i64> {
    UserStoryRepository::new(pool)
        .completed_points_by_sprint(sprint_id)
        .await
}

pub async fn sprint_story_stats(pool: &PgPool, sprint_id: Uuid) -> Result<SprintStoryStats> {
    SprintRepository::new(pool).find_by_id(sprint_id).await?;

    let stories = UserStoryRepository::new(pool);
    let total_points = stories.total_points_by_sprint(sprint_id).await?;
    let completed_points = stories.completed_points_by_sprint(sprint_id).await?;

    Ok(SprintStoryStats {
        sprint_id,
        total_points,
        completed_points,
        completion_percentage: Project::progress_from_points(completed_points, total_points),
    })
}

/// Every story mutation ends here: refresh the owning project's cached
/// progress and today's (sprint, team) analytics row, in the same
/// operation that changed the story.
async fn refresh_progress(
    pool: &PgPool,
    project_id: Uuid,
    sprint_id: Uuid,
    team_id: Uuid,
) -> Result<()> {
    let (completed, total) = UserStoryRepository::new(pool)
        .project_point_totals(project_id)
        .await?;
    ProjectRepository::new(pool)
        .update_progress(project_id, Project::progress_from_points(completed, total))
        .await?;

    progress_analytics::update_daily_analytic(pool, sprint_id, team_id).await?;
    Ok(())
}
