use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

/// Who an achievement was awarded to: exactly one of a user or a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    User(Uuid),
    Team(Uuid),
}

impl Recipient {
    /// Enforces the exactly-one-recipient invariant on a raw pair of
    /// optional ids.
    pub fn from_ids(user_id: Option<Uuid>, team_id: Option<Uuid>) -> Result<Self> {
        match (user_id, team_id) {
            (Some(user), None) => Ok(Recipient::User(user)),
            (None, Some(team)) => Ok(Recipient::Team(team)),
            (None, None) => Err(StorageError::Validation(
                "achievement must have a recipient (user or team)".to_string(),
            )),
            (Some(_), Some(_)) => Err(StorageError::Validation(
                "achievement cannot be awarded to both a user and a team".to_string(),
            )),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Recipient::User(id) => Some(*id),
            Recipient::Team(_) => None,
        }
    }

    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            Recipient::Team(id) => Some(*id),
            Recipient::User(_) => None,
        }
    }
}

/// A recorded award of a badge to a user or team within a project. This is
/// a historical record: `awarded_at` is set once at insert and never
/// mutated, and existing achievements block hard deletion of the badge,
/// sprint and team they reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Achievement {
    pub achievement_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_to_user: Option<Uuid>,
    pub awarded_to_team: Option<Uuid>,
    pub project_id: Uuid,
    pub sprint_id: Option<Uuid>,
    /// None means the badge was awarded automatically by rule evaluation.
    pub awarded_by: Option<Uuid>,
    pub reason: Option<String>,
    pub awarded_at: NaiveDateTime,
}

impl Achievement {
    pub fn is_automatic(&self) -> bool {
        self.awarded_by.is_none()
    }

    pub fn recipient(&self) -> Result<Recipient> {
        Recipient::from_ids(self.awarded_to_user, self.awarded_to_team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_is_exactly_one_of_user_or_team() {
        let user = Uuid::new_v4();
        let team = Uuid::new_v4();

        assert_eq!(
            Recipient::from_ids(Some(user), None).unwrap(),
            Recipient::User(user)
        );
        assert_eq!(
            Recipient::from_ids(None, Some(team)).unwrap(),
            Recipient::Team(team)
        );
        assert!(Recipient::from_ids(None, None).is_err());
        assert!(Recipient::from_ids(Some(user), Some(team)).is_err());
    }
}
