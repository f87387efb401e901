use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::StoryPriority;

/// Request payload for creating a user story
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserStoryRequest {
    pub sprint_id: Uuid,
    pub team_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Story points must be >= 0"))]
    pub story_points: i32,

    pub priority: StoryPriority,
    pub created_by: Uuid,
}

/// Request payload for updating a user story; omitted fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub story_points: Option<i32>,

    pub priority: Option<StoryPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignStoryRequest {
    pub user_id: Uuid,
}

/// Point totals for one sprint, as consumed by dashboards
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SprintStoryStats {
    pub sprint_id: Uuid,
    pub total_points: i64,
    pub completed_points: i64,
    pub completion_percentage: Decimal,
}
