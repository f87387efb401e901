use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{BadgeType, RecipientType, TriggerCondition};

/// Request payload for creating a badge definition
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBadgeRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Points must be >= 0"))]
    pub points: i32,

    pub badge_type: BadgeType,
    pub recipient_type: RecipientType,

    /// Required in practice for AUTOMATIC badges; an automatic badge
    /// without a trigger is never awarded by evaluation.
    #[schema(value_type = Option<Object>)]
    pub trigger_condition: Option<TriggerCondition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_points_are_rejected() {
        let req = CreateBadgeRequest {
            name: "Gold Star".to_string(),
            description: None,
            points: -5,
            badge_type: BadgeType::Manual,
            recipient_type: RecipientType::User,
            trigger_condition: None,
        };
        assert!(req.validate().is_err());
    }
}
