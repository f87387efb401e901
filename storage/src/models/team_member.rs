use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "team_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    ScrumMaster,
    ProductOwner,
    Developer,
}

impl TeamRole {
    /// SCRUM_MASTER and PRODUCT_OWNER may be held by at most one active
    /// member per team.
    pub fn is_single_seat(&self) -> bool {
        matches!(self, TeamRole::ScrumMaster | TeamRole::ProductOwner)
    }
}

/// Membership of a user in a team. Never hard-deleted; leaving a team is a
/// soft delete so historical achievements keep a valid reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeamMember {
    pub team_member_id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub is_active: bool,
    pub joined_at: NaiveDateTime,
    pub left_at: Option<NaiveDateTime>,
}

impl TeamMember {
    pub fn leave(&mut self, now: NaiveDateTime) -> Result<()> {
        if !self.is_active {
            return Err(StorageError::InvalidState(
                "member has already left the team".to_string(),
            ));
        }
        self.is_active = false;
        self.left_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn member(role: TeamRole) -> TeamMember {
        let joined = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        TeamMember {
            team_member_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role,
            is_active: true,
            joined_at: joined,
            left_at: None,
        }
    }

    #[test]
    fn leave_is_a_soft_delete() {
        let mut m = member(TeamRole::Developer);
        let now = m.joined_at + chrono::Duration::days(30);
        m.leave(now).unwrap();
        assert!(!m.is_active);
        assert_eq!(m.left_at, Some(now));
    }

    #[test]
    fn leaving_twice_fails() {
        let mut m = member(TeamRole::Developer);
        let now = m.joined_at;
        m.leave(now).unwrap();
        assert!(m.leave(now).is_err());
    }

    #[test]
    fn single_seat_roles() {
        assert!(TeamRole::ScrumMaster.is_single_seat());
        assert!(TeamRole::ProductOwner.is_single_seat());
        assert!(!TeamRole::Developer.is_single_seat());
    }
}
