use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Sprint, SprintStatus};

/// Request payload for creating a sprint within a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_sprint_dates"))]
pub struct CreateSprintRequest {
    #[validate(range(min = 1, message = "Sprint number must be >= 1"))]
    pub sprint_number: i32,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub goal: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn validate_sprint_dates(req: &CreateSprintRequest) -> Result<(), validator::ValidationError> {
    if req.end_date < req.start_date {
        return Err(validator::ValidationError::new("end_date_before_start_date"));
    }
    Ok(())
}

/// Request payload for completing a sprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompleteSprintRequest {
    /// Effective completion date; defaults to today when omitted.
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SprintResponse {
    pub sprint_id: Uuid,
    pub project_id: Uuid,
    pub sprint_number: i32,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    pub completed_at: Option<NaiveDate>,
    pub duration_days: i64,
}

impl From<Sprint> for SprintResponse {
    fn from(sprint: Sprint) -> Self {
        let duration_days = sprint.duration_days();
        Self {
            sprint_id: sprint.sprint_id,
            project_id: sprint.project_id,
            sprint_number: sprint.sprint_number,
            name: sprint.name,
            goal: sprint.goal,
            start_date: sprint.start_date,
            end_date: sprint.end_date,
            status: sprint.status,
            completed_at: sprint.completed_at,
            duration_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_must_not_precede_start_date() {
        let req = CreateSprintRequest {
            sprint_number: 1,
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: NaiveDate::from_ymd_opt(2025, 9, 22).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 8).unwrap(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn single_day_sprint_is_valid() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 8).unwrap();
        let req = CreateSprintRequest {
            sprint_number: 1,
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: day,
            end_date: day,
        };
        assert!(req.validate().is_ok());
    }
}
