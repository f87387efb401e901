use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "story_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    Todo,
    InProgress,
    InReview,
    Done,
}

impl StoryStatus {
    pub fn next(&self) -> Option<StoryStatus> {
        match self {
            StoryStatus::Todo => Some(StoryStatus::InProgress),
            StoryStatus::InProgress => Some(StoryStatus::InReview),
            StoryStatus::InReview => Some(StoryStatus::Done),
            StoryStatus::Done => None,
        }
    }

    pub fn previous(&self) -> Option<StoryStatus> {
        match self {
            StoryStatus::Todo => None,
            StoryStatus::InProgress => Some(StoryStatus::Todo),
            StoryStatus::InReview => Some(StoryStatus::InProgress),
            StoryStatus::Done => Some(StoryStatus::InReview),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "story_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A work item moving through the linear workflow
/// TODO ⇄ IN_PROGRESS ⇄ IN_REVIEW ⇄ DONE, one step at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserStory {
    pub story_id: Uuid,
    pub sprint_id: Uuid,
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub story_points: i32,
    pub status: StoryStatus,
    pub priority: StoryPriority,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserStory {
    pub fn is_done(&self) -> bool {
        self.status == StoryStatus::Done
    }

    /// Advance exactly one workflow step.
    pub fn move_to_next_status(&mut self) -> Result<StoryStatus> {
        let next = self.status.next().ok_or_else(|| {
            StorageError::InvalidState(format!("story '{}' is already done", self.title))
        })?;
        self.status = next;
        Ok(next)
    }

    /// Step back exactly one workflow step.
    pub fn move_to_previous_status(&mut self) -> Result<StoryStatus> {
        let previous = self.status.previous().ok_or_else(|| {
            StorageError::InvalidState(format!("story '{}' is still in TODO", self.title))
        })?;
        self.status = previous;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(status: StoryStatus) -> UserStory {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        UserStory {
            story_id: Uuid::new_v4(),
            sprint_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            title: "Implement login".to_string(),
            description: None,
            story_points: 5,
            status,
            priority: StoryPriority::Medium,
            assigned_to: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn three_steps_from_todo_reach_done() {
        let mut s = story(StoryStatus::Todo);
        assert_eq!(s.move_to_next_status().unwrap(), StoryStatus::InProgress);
        assert_eq!(s.move_to_next_status().unwrap(), StoryStatus::InReview);
        assert_eq!(s.move_to_next_status().unwrap(), StoryStatus::Done);
        assert!(s.is_done());
    }

    #[test]
    fn forward_from_done_fails() {
        let mut s = story(StoryStatus::Done);
        assert!(s.move_to_next_status().is_err());
        assert_eq!(s.status, StoryStatus::Done);
    }

    #[test]
    fn backward_from_todo_fails() {
        let mut s = story(StoryStatus::Todo);
        assert!(s.move_to_previous_status().is_err());
        assert_eq!(s.status, StoryStatus::Todo);
    }

    #[test]
    fn backward_steps_one_at_a_time() {
        let mut s = story(StoryStatus::Done);
        assert_eq!(s.move_to_previous_status().unwrap(), StoryStatus::InReview);
        assert_eq!(s.move_to_previous_status().unwrap(), StoryStatus::InProgress);
        assert_eq!(s.move_to_previous_status().unwrap(), StoryStatus::Todo);
    }
}
