use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request payload for awarding a badge to a user or a team.
///
/// Exactly one of `user_id`/`team_id` must be set; that invariant is
/// checked by the scoring service, not by field validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AwardAchievementRequest {
    pub badge_id: Uuid,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub project_id: Uuid,
    pub sprint_id: Option<Uuid>,

    /// Awarding teacher; None marks an automatic award.
    pub awarded_by: Option<Uuid>,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// A user's leaderboard standing. Computed on demand, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlobalScoreResponse {
    pub user_id: Uuid,
    pub individual_points: i64,
    pub team_share: i64,
    pub global_score: i64,
}
