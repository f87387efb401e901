use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const KEY_MIN_TASKS_COMPLETED: &str = "min_tasks_completed";
const KEY_MIN_SCORE: &str = "min_score";
const KEY_MIN_VELOCITY: &str = "min_velocity";
const KEY_ALL_TASKS_COMPLETED: &str = "all_tasks_completed";
const KEY_ALL_SPRINTS_ON_TIME: &str = "all_sprints_on_time";

/// Structured trigger predicate of an automatic badge.
///
/// Persisted as a single-key JSON object (`{"min_velocity": 2.5}`).
/// Conditions that don't parse into a recognized predicate deserialize to
/// [`TriggerCondition::Unknown`], which keeps the raw payload for exact
/// round-tripping and always evaluates to true: badges created before a
/// predicate kind existed must keep firing rather than silently go dead.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerCondition {
    MinTasksCompleted { min: i64 },
    MinScore { min: i64 },
    MinVelocity { min: Decimal },
    AllTasksCompleted,
    AllSprintsOnTime,
    Unknown { raw: Map<String, Value> },
}

/// Snapshot of the candidate recipient's state against which a trigger
/// predicate is evaluated.
#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    pub tasks_completed: i64,
    pub score: i64,
    pub velocity: Decimal,
    pub all_tasks_completed: bool,
    pub all_sprints_on_time: bool,
}

impl TriggerCondition {
    pub fn evaluate(&self, ctx: &TriggerContext) -> bool {
        match self {
            TriggerCondition::MinTasksCompleted { min } => ctx.tasks_completed >= *min,
            TriggerCondition::MinScore { min } => ctx.score >= *min,
            TriggerCondition::MinVelocity { min } => ctx.velocity >= *min,
            TriggerCondition::AllTasksCompleted => ctx.all_tasks_completed,
            TriggerCondition::AllSprintsOnTime => ctx.all_sprints_on_time,
            // Fail-open for unrecognized predicates.
            TriggerCondition::Unknown { .. } => true,
        }
    }

    fn from_raw(raw: Map<String, Value>) -> Self {
        if raw.len() == 1 {
            let (key, value) = match raw.iter().next() {
                Some(entry) => entry,
                None => return TriggerCondition::Unknown { raw },
            };
            match key.as_str() {
                KEY_MIN_TASKS_COMPLETED => {
                    if let Some(min) = value.as_i64() {
                        return TriggerCondition::MinTasksCompleted { min };
                    }
                }
                KEY_MIN_SCORE => {
                    if let Some(min) = value.as_i64() {
                        return TriggerCondition::MinScore { min };
                    }
                }
                KEY_MIN_VELOCITY => {
                    // Numeric payloads only; anything else stays Unknown so
                    // the stored payload survives a rewrite byte for byte.
                    if value.is_number() {
                        if let Ok(min) = serde_json::from_value::<Decimal>(value.clone()) {
                            return TriggerCondition::MinVelocity { min };
                        }
                    }
                }
                KEY_ALL_TASKS_COMPLETED => {
                    if value.as_bool() == Some(true) {
                        return TriggerCondition::AllTasksCompleted;
                    }
                }
                KEY_ALL_SPRINTS_ON_TIME => {
                    if value.as_bool() == Some(true) {
                        return TriggerCondition::AllSprintsOnTime;
                    }
                }
                _ => {}
            }
        }
        TriggerCondition::Unknown { raw }
    }

    /// Velocity thresholds are stored as JSON numbers, matching the form
    /// they arrive in. Decimals too large for an f64 don't occur for
    /// realistic velocities; if one ever does we fall back to string form.
    fn velocity_number(min: &Decimal) -> Option<serde_json::Number> {
        if min.is_integer() {
            min.to_i64().map(serde_json::Number::from)
        } else {
            min.to_f64().and_then(serde_json::Number::from_f64)
        }
    }
}

impl Serialize for TriggerCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TriggerCondition::MinTasksCompleted { min } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(KEY_MIN_TASKS_COMPLETED, min)?;
                map.end()
            }
            TriggerCondition::MinScore { min } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(KEY_MIN_SCORE, min)?;
                map.end()
            }
            TriggerCondition::MinVelocity { min } => {
                let mut map = serializer.serialize_map(Some(1))?;
                match TriggerCondition::velocity_number(min) {
                    Some(number) => map.serialize_entry(KEY_MIN_VELOCITY, &number)?,
                    None => map.serialize_entry(KEY_MIN_VELOCITY, min)?,
                }
                map.end()
            }
            TriggerCondition::AllTasksCompleted => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(KEY_ALL_TASKS_COMPLETED, &true)?;
                map.end()
            }
            TriggerCondition::AllSprintsOnTime => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(KEY_ALL_SPRINTS_ON_TIME, &true)?;
                map.end()
            }
            TriggerCondition::Unknown { raw } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TriggerCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::deserialize(deserializer)?;
        Ok(TriggerCondition::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> TriggerCondition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn recognized_keys_parse_to_variants() {
        assert_eq!(
            parse(json!({"min_tasks_completed": 10})),
            TriggerCondition::MinTasksCompleted { min: 10 }
        );
        assert_eq!(
            parse(json!({"min_score": 100})),
            TriggerCondition::MinScore { min: 100 }
        );
        assert_eq!(
            parse(json!({"min_velocity": 2.5})),
            TriggerCondition::MinVelocity {
                min: Decimal::new(25, 1)
            }
        );
        assert_eq!(
            parse(json!({"all_tasks_completed": true})),
            TriggerCondition::AllTasksCompleted
        );
        assert_eq!(
            parse(json!({"all_sprints_on_time": true})),
            TriggerCondition::AllSprintsOnTime
        );
    }

    #[test]
    fn integer_velocity_also_parses() {
        assert_eq!(
            parse(json!({"min_velocity": 3})),
            TriggerCondition::MinVelocity { min: Decimal::from(3) }
        );
    }

    #[test]
    fn string_velocity_stays_unknown_and_round_trips() {
        let original = json!({"min_velocity": "2.5"});
        let condition: TriggerCondition = serde_json::from_value(original.clone()).unwrap();
        assert!(matches!(condition, TriggerCondition::Unknown { .. }));
        assert_eq!(serde_json::to_value(&condition).unwrap(), original);
    }

    #[test]
    fn unknown_key_is_fail_open() {
        let condition = parse(json!({"min_streak_weeks": 4}));
        assert!(matches!(condition, TriggerCondition::Unknown { .. }));
        assert!(condition.evaluate(&TriggerContext::default()));
    }

    #[test]
    fn unknown_payload_round_trips_exactly() {
        let original = json!({"min_streak_weeks": 4, "scope": "project"});
        let condition: TriggerCondition = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&condition).unwrap(), original);
    }

    #[test]
    fn recognized_predicates_round_trip() {
        for value in [
            json!({"min_tasks_completed": 10}),
            json!({"min_score": 100}),
            json!({"min_velocity": 5}),
            json!({"min_velocity": 2.5}),
            json!({"all_tasks_completed": true}),
            json!({"all_sprints_on_time": true}),
        ] {
            let condition: TriggerCondition = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(serde_json::to_value(&condition).unwrap(), value);
        }
    }

    #[test]
    fn thresholds_evaluate_against_context() {
        let ctx = TriggerContext {
            tasks_completed: 12,
            score: 80,
            velocity: Decimal::new(25, 1),
            all_tasks_completed: false,
            all_sprints_on_time: true,
        };

        assert!(TriggerCondition::MinTasksCompleted { min: 10 }.evaluate(&ctx));
        assert!(!TriggerCondition::MinTasksCompleted { min: 13 }.evaluate(&ctx));
        assert!(TriggerCondition::MinScore { min: 80 }.evaluate(&ctx));
        assert!(!TriggerCondition::MinScore { min: 81 }.evaluate(&ctx));
        assert!(TriggerCondition::MinVelocity { min: Decimal::from(2) }.evaluate(&ctx));
        assert!(!TriggerCondition::MinVelocity { min: Decimal::from(3) }.evaluate(&ctx));
        assert!(!TriggerCondition::AllTasksCompleted.evaluate(&ctx));
        assert!(TriggerCondition::AllSprintsOnTime.evaluate(&ctx));
    }
}
