use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An exercise the generator may reference by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExerciseRef {
    pub exercise_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub muscle_groups: Option<Vec<String>>,
    pub difficulty_level: Option<String>,
    pub equipment_needed: Option<Vec<String>>,
}

impl ExerciseRef {
    pub fn new(exercise_id: i64, name: impl Into<String>) -> Self {
        Self {
            exercise_id,
            name: name.into(),
            category: None,
            muscle_groups: None,
            difficulty_level: None,
            equipment_needed: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_muscle_groups(mut self, muscles: &[&str]) -> Self {
        self.muscle_groups = Some(muscles.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty_level = Some(difficulty.into());
        self
    }

    /// Compact `id:name|category|muscles|difficulty` line used in prompts
    pub fn catalog_line(&self) -> String {
        let muscles = self
            .muscle_groups
            .as_ref()
            .map(|groups| groups.join(","))
            .unwrap_or_default();

        format!(
            "{}:{}|{}|{}|{}",
            self.exercise_id,
            self.name,
            self.category.as_deref().unwrap_or(""),
            muscles,
            self.difficulty_level.as_deref().unwrap_or("")
        )
    }
}
