use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::trigger::TriggerCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "badge_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeType {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "recipient_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    User,
    Team,
}

/// Definition of an awardable recognition. Once achievements reference a
/// badge only the activation flag may change; deletion is refused while
/// achievements exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Badge {
    pub badge_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub badge_type: BadgeType,
    pub recipient_type: RecipientType,
    #[schema(value_type = Option<Object>)]
    pub trigger_condition: Option<sqlx::types::Json<TriggerCondition>>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Badge {
    pub fn is_automatic(&self) -> bool {
        self.badge_type == BadgeType::Automatic
    }

    /// Only active badges can be awarded.
    pub fn can_be_awarded(&self) -> bool {
        self.is_active
    }
}
