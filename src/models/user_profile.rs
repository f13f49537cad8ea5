use serde::{Deserialize, Serialize};

use super::program::DifficultyLevel;

/// Profile of the user a program is generated for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub fitness_level: DifficultyLevel,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub physical: Option<PhysicalAttributes>,
    #[serde(default)]
    pub preferences: Option<TrainingPreferences>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalAttributes {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub weight_goal_kg: Option<f64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingPreferences {
    #[serde(default)]
    pub equipment_available: Vec<String>,
    pub sessions_per_week: Option<u32>,
    pub session_length_minutes: Option<u32>,
}

impl UserProfile {
    pub fn new(fitness_level: DifficultyLevel, goals: Vec<String>) -> Self {
        Self {
            fitness_level,
            goals,
            physical: None,
            preferences: None,
        }
    }

    /// First goal tag, used as the program type
    pub fn primary_goal(&self) -> Option<&str> {
        self.goals.first().map(String::as_str)
    }
}
