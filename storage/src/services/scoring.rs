use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::achievement::{AwardAchievementRequest, GlobalScoreResponse};
use crate::error::{Result, StorageError};
use crate::models::{
    Achievement, Badge, Recipient, RecipientType, Sprint, TriggerContext, UserStory,
};
use crate::repository::{
    AchievementRepository, BadgeRepository, ProgressMetricRepository, ProjectRepository,
    SprintRepository, TeamRepository, UserRepository, UserStoryRepository,
};

/// Award a badge to a user or a team.
///
/// Enforced, in order: exactly one recipient; the badge exists, is active
/// and matches the recipient kind; referenced entities exist; the recipient
/// does not already hold the badge (per project for users, globally for
/// teams). The partial unique indexes repeat the last check, so a
/// concurrent duplicate surfaces as `Conflict` instead of a double award.
pub async fn award_achievement(
    pool: &PgPool,
    req: &AwardAchievementRequest,
) -> Result<Achievement> {
    req.validate()?;
    let recipient = Recipient::from_ids(req.user_id, req.team_id)?;

    let badge = BadgeRepository::new(pool).find_by_id(req.badge_id).await?;
    if !badge.can_be_awarded() {
        return Err(StorageError::Validation(format!(
            "badge '{}' is not active",
            badge.name
        )));
    }
    match (recipient, badge.recipient_type) {
        (Recipient::User(_), RecipientType::User) | (Recipient::Team(_), RecipientType::Team) => {}
        (Recipient::User(_), RecipientType::Team) => {
            return Err(StorageError::Validation(format!(
                "badge '{}' can only be awarded to a team",
                badge.name
            )));
        }
        (Recipient::Team(_), RecipientType::User) => {
            return Err(StorageError::Validation(format!(
                "badge '{}' can only be awarded to a user",
                badge.name
            )));
        }
    }

    if !ProjectRepository::new(pool).exists(req.project_id).await? {
        return Err(StorageError::NotFound("project"));
    }
    match recipient {
        Recipient::User(user_id) => {
            UserRepository::new(pool).find_by_id(user_id).await?;
        }
        Recipient::Team(team_id) => {
            TeamRepository::new(pool).find_by_id(team_id).await?;
        }
    }
    if let Some(sprint_id) = req.sprint_id {
        SprintRepository::new(pool).find_by_id(sprint_id).await?;
    }

    let achievements = AchievementRepository::new(pool);
    if achievements
        .holds_badge(recipient, badge.badge_id, req.project_id)
        .await?
    {
        return Err(StorageError::Conflict(
            "recipient already has this badge".to_string(),
        ));
    }

    achievements
        .insert(
            badge.badge_id,
            recipient,
            req.project_id,
            req.sprint_id,
            req.awarded_by,
            req.reason.as_deref(),
        )
        .await
}

pub async fn delete_achievement(pool: &PgPool, achievement_id: Uuid) -> Result<()> {
    AchievementRepository::new(pool).delete(achievement_id).await
}

/// Points from badges a user earned individually, optionally scoped to a
/// project.
pub async fn individual_points(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Option<Uuid>,
) -> Result<i64> {
    AchievementRepository::new(pool)
        .user_individual_points(user_id, project_id)
        .await
}

/// One member's share of a team's achievement points: integer division,
/// truncated. Teams without achievements or active members contribute
/// nothing.
pub fn team_share_of(team_points: i64, active_member_count: i64) -> i64 {
    if active_member_count <= 0 || team_points <= 0 {
        return 0;
    }
    team_points / active_member_count
}

/// Sum of the user's per-team shares across all teams they are an active
/// member of. Truncation happens per team, before summing.
pub async fn team_share(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let teams = TeamRepository::new(pool);
    let achievements = AchievementRepository::new(pool);

    let mut total = 0i64;
    for membership in teams.active_memberships_for_user(user_id).await? {
        let points = achievements.team_points(membership.team_id).await?;
        let members = teams.active_member_count(membership.team_id).await?;
        total += team_share_of(points, members);
    }
    Ok(total)
}

/// The canonical leaderboard value: individual points across all projects
/// plus the per-membership team share. Recomputed on every call.
pub async fn global_score(pool: &PgPool, user_id: Uuid) -> Result<GlobalScoreResponse> {
    UserRepository::new(pool).find_by_id(user_id).await?;

    let individual = individual_points(pool, user_id, None).await?;
    let share = team_share(pool, user_id).await?;

    Ok(GlobalScoreResponse {
        user_id,
        individual_points: individual,
        team_share: share,
        global_score: individual + share,
    })
}

pub async fn user_total_points(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    UserRepository::new(pool).find_by_id(user_id).await?;
    individual_points(pool, user_id, None).await
}

pub async fn team_total_points(pool: &PgPool, team_id: Uuid) -> Result<i64> {
    TeamRepository::new(pool).find_by_id(team_id).await?;
    AchievementRepository::new(pool).team_points(team_id).await
}

/// Evaluate automatic team badges for every team attached to the completed
/// sprint's project. Returns the number of achievements created.
pub async fn check_automatic_badges_on_sprint_completion(
    pool: &PgPool,
    sprint: &Sprint,
) -> Result<u64> {
    let badges = BadgeRepository::new(pool).list_active_automatic().await?;
    if badges.is_empty() {
        return Ok(0);
    }

    let teams = TeamRepository::new(pool)
        .teams_for_project(sprint.project_id)
        .await?;

    let mut awarded = 0;
    for team in teams {
        awarded += evaluate_badges_for_team(
            pool,
            &badges,
            team.team_id,
            sprint.project_id,
            Some(sprint.sprint_id),
        )
        .await;
    }
    Ok(awarded)
}

/// Evaluate automatic badges when a story reaches DONE: team badges for the
/// story's team, user badges for the assignee (when there is one).
pub async fn check_automatic_badges_on_story_completion(
    pool: &PgPool,
    story: &UserStory,
) -> Result<u64> {
    let badges = BadgeRepository::new(pool).list_active_automatic().await?;
    if badges.is_empty() {
        return Ok(0);
    }

    let sprint = SprintRepository::new(pool).find_by_id(story.sprint_id).await?;

    let mut awarded = evaluate_badges_for_team(
        pool,
        &badges,
        story.team_id,
        sprint.project_id,
        Some(sprint.sprint_id),
    )
    .await;

    if let Some(user_id) = story.assigned_to {
        awarded += evaluate_badges_for_user(
            pool,
            &badges,
            user_id,
            story.team_id,
            sprint.project_id,
            Some(sprint.sprint_id),
        )
        .await;
    }
    Ok(awarded)
}

async fn evaluate_badges_for_team(
    pool: &PgPool,
    badges: &[Badge],
    team_id: Uuid,
    project_id: Uuid,
    sprint_id: Option<Uuid>,
) -> u64 {
    let ctx = match team_trigger_context(pool, team_id, project_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(%team_id, error = %e, "failed to build team trigger context");
            return 0;
        }
    };

    let mut awarded = 0;
    for badge in badges.iter().filter(|b| b.recipient_type == RecipientType::Team) {
        match award_if_triggered(pool, badge, Recipient::Team(team_id), project_id, sprint_id, &ctx)
            .await
        {
            Ok(true) => awarded += 1,
            Ok(false) => {}
            // One badge failing must not stop the rest.
            Err(e) => {
                tracing::error!(badge = %badge.name, %team_id, error = %e,
                    "automatic badge evaluation failed");
            }
        }
    }
    awarded
}

async fn evaluate_badges_for_user(
    pool: &PgPool,
    badges: &[Badge],
    user_id: Uuid,
    team_id: Uuid,
    project_id: Uuid,
    sprint_id: Option<Uuid>,
) -> u64 {
    let ctx = match user_trigger_context(pool, user_id, team_id, project_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(%user_id, error = %e, "failed to build user trigger context");
            return 0;
        }
    };

    let mut awarded = 0;
    for badge in badges.iter().filter(|b| b.recipient_type == RecipientType::User) {
        match award_if_triggered(pool, badge, Recipient::User(user_id), project_id, sprint_id, &ctx)
            .await
        {
            Ok(true) => awarded += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(badge = %badge.name, %user_id, error = %e,
                    "automatic badge evaluation failed");
            }
        }
    }
    awarded
}

async fn award_if_triggered(
    pool: &PgPool,
    badge: &Badge,
    recipient: Recipient,
    project_id: Uuid,
    sprint_id: Option<Uuid>,
    ctx: &TriggerContext,
) -> Result<bool> {
    // An automatic badge without a trigger predicate is never awarded by
    // evaluation.
    let Some(condition) = badge.trigger_condition.as_ref() else {
        return Ok(false);
    };
    if !condition.0.evaluate(ctx) {
        return Ok(false);
    }

    let achievements = AchievementRepository::new(pool);
    // Re-check uniqueness immediately before insert: evaluation can fire
    // repeatedly for the same recipient.
    if achievements
        .holds_badge(recipient, badge.badge_id, project_id)
        .await?
    {
        return Ok(false);
    }

    let reason = format!("Automatically awarded: {}", badge.name);
    match achievements
        .insert(badge.badge_id, recipient, project_id, sprint_id, None, Some(&reason))
        .await
    {
        Ok(achievement) => {
            tracing::info!(badge = %badge.name, achievement_id = %achievement.achievement_id,
                "automatic badge awarded");
            Ok(true)
        }
        // Lost the race to a concurrent award; the badge is already held.
        Err(StorageError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

async fn team_trigger_context(
    pool: &PgPool,
    team_id: Uuid,
    project_id: Uuid,
) -> Result<TriggerContext> {
    let score = AchievementRepository::new(pool).team_points(team_id).await?;
    let all_sprints_on_time = SprintRepository::new(pool)
        .all_sprints_on_time(project_id)
        .await?;
    let latest = ProgressMetricRepository::new(pool)
        .latest_for_team(team_id)
        .await?;

    let (tasks_completed, velocity, all_tasks_completed) = latest
        .map(|m| (m.completed_tasks as i64, m.velocity, m.all_tasks_completed()))
        .unwrap_or((0, Decimal::ZERO, false));

    Ok(TriggerContext {
        tasks_completed,
        score,
        velocity,
        all_tasks_completed,
        all_sprints_on_time,
    })
}

async fn user_trigger_context(
    pool: &PgPool,
    user_id: Uuid,
    team_id: Uuid,
    project_id: Uuid,
) -> Result<TriggerContext> {
    let tasks_completed = UserStoryRepository::new(pool)
        .completed_assigned_count(user_id, project_id)
        .await?;
    let score = global_score(pool, user_id).await?.global_score;
    let all_sprints_on_time = SprintRepository::new(pool)
        .all_sprints_on_time(project_id)
        .await?;
    // Velocity and full completion are team-level measures; the user
    // inherits them from the team the completed story belongs to.
    let latest = ProgressMetricRepository::new(pool)
        .latest_for_team(team_id)
        .await?;
    let (velocity, all_tasks_completed) = latest
        .map(|m| (m.velocity, m.all_tasks_completed()))
        .unwrap_or((Decimal::ZERO, false));

    Ok(TriggerContext {
        tasks_completed,
        score,
        velocity,
        all_tasks_completed,
        all_sprints_on_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_share_truncates_per_team() {
        assert_eq!(team_share_of(80, 2), 40);
        assert_eq!(team_share_of(80, 3), 26);
        assert_eq!(team_share_of(1, 2), 0);
    }

    #[test]
    fn team_share_guards_degenerate_teams() {
        assert_eq!(team_share_of(0, 3), 0);
        assert_eq!(team_share_of(80, 0), 0);
        assert_eq!(team_share_of(-10, 2), 0);
    }

    #[test]
    fn global_score_is_individual_plus_shares() {
        // Team with 80 points and 2 active members contributes 40 to each;
        // 20 individual points on top gives 60.
        let share = team_share_of(80, 2);
        let individual = 20;
        assert_eq!(individual + share, 60);
    }
}
