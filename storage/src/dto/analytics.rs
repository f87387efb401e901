use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::ProgressMetric;

/// Optional qualitative fields recorded alongside a daily metric
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordTeamMoodRequest {
    #[validate(length(max = 50))]
    pub team_mood: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// A daily metric enriched with its derived percentages
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgressMetricResponse {
    pub metric_id: Uuid,
    pub sprint_id: Uuid,
    pub team_id: Uuid,
    pub recorded_date: NaiveDate,
    pub completed_tasks: i32,
    pub total_tasks: i32,
    pub story_points_completed: i32,
    pub total_story_points: i32,
    pub velocity: Decimal,
    pub completion_percentage: Decimal,
    pub story_points_completion: Decimal,
    pub is_on_track: bool,
    pub team_mood: Option<String>,
    pub notes: Option<String>,
}

impl ProgressMetricResponse {
    /// `time_progress` is the owning sprint's elapsed-time percentage on
    /// the metric's recorded date.
    pub fn from_metric(metric: ProgressMetric, time_progress: Decimal) -> Self {
        Self {
            completion_percentage: metric.completion_percentage(),
            story_points_completion: metric.story_points_completion(),
            is_on_track: metric.is_on_track(time_progress),
            metric_id: metric.metric_id,
            sprint_id: metric.sprint_id,
            team_id: metric.team_id,
            recorded_date: metric.recorded_date,
            completed_tasks: metric.completed_tasks,
            total_tasks: metric.total_tasks,
            story_points_completed: metric.story_points_completed,
            total_story_points: metric.total_story_points,
            velocity: metric.velocity,
            team_mood: metric.team_mood,
            notes: metric.notes,
        }
    }
}
