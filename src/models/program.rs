use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::user_profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Warmup,
    Main,
    Cooldown,
    Superset,
    Circuit,
    Standard,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Warmup => "warmup",
            BlockType::Main => "main",
            BlockType::Cooldown => "cooldown",
            BlockType::Superset => "superset",
            BlockType::Circuit => "circuit",
            BlockType::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightLevel {
    NoWeight,
    Light,
    Medium,
    Heavy,
}

impl WeightLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightLevel::NoWeight => "no_weight",
            WeightLevel::Light => "light",
            WeightLevel::Medium => "medium",
            WeightLevel::Heavy => "heavy",
        }
    }
}

/// A validated multi-week program, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProgram {
    pub program: ProgramHeader,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramHeader {
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: u32,
    pub difficulty_level: Option<DifficultyLevel>,
    pub program_type: Option<String>,
}

/// Optional scalars and counts are read leniently: the normalizer leaves
/// values it cannot repair and the validator does not judge them, so an
/// unreadable optional becomes `None` and an oversized count saturates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub week_number: Option<u32>,
    #[serde(deserialize_with = "lenient::count")]
    pub workout_order: u32,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub day_of_week: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub estimated_duration_minutes: Option<u32>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub block_type: Option<BlockType>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub sets: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub rest_between_exercises: Option<u32>,
    pub exercises: Vec<BlockExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockExercise {
    pub exercise_id: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub reps: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub exercise_order: u32,
    pub weight_level: Option<WeightLevel>,
}

mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Floors a number or numeric string into `u32`; float casts saturate
    fn to_count(value: &Value) -> Option<u32> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then(|| number.floor() as u32)
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        to_count(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
    }

    pub fn optional_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?
            .as_ref()
            .and_then(to_count))
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(text)) => Some(text),
            _ => None,
        })
    }
}

impl ProgramHeader {
    /// Header for a new draft. The model only generates workouts; the header
    /// is derived from the profile.
    pub fn for_profile(profile: &UserProfile, duration_weeks: u32) -> Self {
        let goal = profile.primary_goal().unwrap_or("general_fitness");
        let description = if profile.goals.is_empty() {
            format!("{}-week {} training program", duration_weeks, profile.fitness_level)
        } else {
            format!(
                "{}-week {} training program focused on {}",
                duration_weeks,
                profile.fitness_level,
                profile.goals.join(", ")
            )
        };

        Self {
            name: format!("{}-Week {} Program", duration_weeks, title_case(goal)),
            description: Some(description),
            duration_weeks,
            difficulty_level: Some(profile.fitness_level),
            program_type: Some(goal.to_string()),
        }
    }

    /// Empty draft document carrying this header
    pub fn into_draft(self) -> Value {
        json!({
            "program": {
                "name": self.name,
                "description": self.description,
                "duration_weeks": self.duration_weeks,
                "difficulty_level": self.difficulty_level.map(|level| level.as_str()),
                "program_type": self.program_type,
            },
            "workouts": [],
        })
    }
}

impl GeneratedProgram {
    /// Converts a validated draft into its typed form
    pub fn from_draft(draft: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(draft)
    }

    pub fn exercise_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.workouts
            .iter()
            .flat_map(|w| w.blocks.iter())
            .flat_map(|b| b.exercises.iter())
            .map(|e| e.exercise_id)
    }
}

fn title_case(tag: &str) -> String {
    tag.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_for_profile() {
        let profile = UserProfile::new(
            DifficultyLevel::Beginner,
            vec!["fat_loss".to_string(), "mobility".to_string()],
        );
        let header = ProgramHeader::for_profile(&profile, 12);

        assert_eq!(header.name, "12-Week Fat Loss Program");
        assert_eq!(header.duration_weeks, 12);
        assert_eq!(header.difficulty_level, Some(DifficultyLevel::Beginner));
        assert_eq!(header.program_type.as_deref(), Some("fat_loss"));
        assert!(header.description.unwrap().contains("fat_loss, mobility"));
    }

    #[test]
    fn test_header_without_goals() {
        let profile = UserProfile::new(DifficultyLevel::Advanced, vec![]);
        let draft = ProgramHeader::for_profile(&profile, 4).into_draft();

        assert_eq!(draft["program"]["name"], "4-Week General Fitness Program");
        assert_eq!(draft["program"]["difficulty_level"], "advanced");
        assert_eq!(draft["workouts"], json!([]));
    }

    #[test]
    fn test_from_draft_reads_typed_program() {
        let draft = json!({
            "program": {"name": "P", "duration_weeks": 1, "difficulty_level": "beginner"},
            "workouts": [{
                "name": "Day 1",
                "week_number": 1,
                "workout_order": 1,
                "day_of_week": 1,
                "blocks": [{
                    "name": "Mobility",
                    "block_type": "warmup",
                    "sets": 2,
                    "rest_between_exercises": 30,
                    "exercises": [{"exercise_id": 4, "reps": 10, "exercise_order": 1, "weight_level": "no_weight"}]
                }]
            }]
        });

        let program = GeneratedProgram::from_draft(draft).unwrap();
        assert_eq!(program.workouts[0].blocks[0].block_type, Some(BlockType::Warmup));
        assert_eq!(program.workouts[0].blocks[0].exercises[0].weight_level, Some(WeightLevel::NoWeight));
        assert_eq!(program.exercise_ids().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_from_draft_tolerates_unjudged_scalars() {
        let draft = json!({
            "program": {"name": "P", "duration_weeks": 1},
            "workouts": [{
                "name": "Day 1",
                "description": 42,
                "workout_order": 1,
                "estimated_duration_minutes": "about 45",
                "day_of_week": null,
                "blocks": [{
                    "name": "Main",
                    "sets": 3,
                    "rest_between_exercises": "lots",
                    "exercises": [{"exercise_id": 4, "reps": 9_999_999_999i64, "exercise_order": 1}]
                }]
            }]
        });

        let program = GeneratedProgram::from_draft(draft).unwrap();
        let workout = &program.workouts[0];
        assert_eq!(workout.description, None);
        assert_eq!(workout.estimated_duration_minutes, None);
        assert_eq!(workout.day_of_week, None);
        assert_eq!(workout.blocks[0].sets, Some(3));
        assert_eq!(workout.blocks[0].rest_between_exercises, None);
        assert_eq!(workout.blocks[0].exercises[0].reps, u32::MAX);
    }

    #[test]
    fn test_from_draft_still_requires_numeric_order() {
        let draft = json!({
            "program": {"name": "P", "duration_weeks": 1},
            "workouts": [{"name": "Day 1", "workout_order": "first", "blocks": []}]
        });

        assert!(GeneratedProgram::from_draft(draft).is_err());
    }
}
