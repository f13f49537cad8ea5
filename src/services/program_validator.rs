use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::config::GenerationConfig;
use crate::models::validation::{
    as_whole_number, is_non_empty_string, is_one_of, present, BLOCK_TYPES, DIFFICULTY_LEVELS,
    WEIGHT_LEVELS,
};

/// Outcome of whole-program validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The draft itself, passed through unchanged
    Valid(Value),
    /// First violated rule
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(message) => Some(message),
        }
    }
}

/// Workouts per declared week number; week 0 collects workouts without one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekBreakdown(BTreeMap<i64, usize>);

impl WeekBreakdown {
    pub fn from_workouts(workouts: &[Value]) -> Self {
        let mut counts = BTreeMap::new();
        for workout in workouts {
            let week = present(workout.get("week_number"))
                .and_then(as_whole_number)
                .unwrap_or(0);
            *counts.entry(week).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn count(&self, week: i64) -> usize {
        self.0.get(&week).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for WeekBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(week, count)| match week {
                0 => format!("unspecified: {}", count),
                _ => format!("week {}: {}", week, count),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Checks a normalized draft against the full program schema.
///
/// Rules run in a fixed order and stop at the first violation.
#[derive(Debug, Clone)]
pub struct ProgramValidator {
    duration_weeks: u32,
    workouts_per_week: u32,
}

type Check = Result<(), String>;

impl ProgramValidator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            duration_weeks: config.duration_weeks,
            workouts_per_week: config.workouts_per_week,
        }
    }

    pub fn validate(&self, draft: Value, valid_exercise_ids: &HashSet<i64>) -> ValidationResult {
        match self.check(&draft, valid_exercise_ids) {
            Ok(()) => ValidationResult::Valid(draft),
            Err(message) => ValidationResult::Invalid(message),
        }
    }

    fn check(&self, draft: &Value, valid_ids: &HashSet<i64>) -> Check {
        let program = draft
            .get("program")
            .and_then(Value::as_object)
            .ok_or("Missing \"program\" object")?;
        let workouts = draft
            .get("workouts")
            .and_then(Value::as_array)
            .ok_or("Missing \"workouts\" array")?;

        self.check_program(program)?;
        self.check_counts(workouts)?;

        for (index, workout) in workouts.iter().enumerate() {
            self.check_workout(workout, index + 1, valid_ids)?;
        }
        Ok(())
    }

    fn check_program(&self, program: &Map<String, Value>) -> Check {
        if !is_non_empty_string(program.get("name")) {
            return Err("Program name must be a non-empty string".to_string());
        }

        let duration = program.get("duration_weeks").and_then(as_whole_number);
        if duration != Some(i64::from(self.duration_weeks)) {
            return Err(format!(
                "Program duration_weeks must be {}, got {}",
                self.duration_weeks,
                program.get("duration_weeks").map_or("nothing".to_string(), Value::to_string)
            ));
        }

        if let Some(level) = present(program.get("difficulty_level")) {
            if !is_one_of(level, DIFFICULTY_LEVELS) {
                return Err(format!(
                    "Program difficulty_level {} must be one of: {}",
                    level,
                    DIFFICULTY_LEVELS.join(", ")
                ));
            }
        }
        Ok(())
    }

    fn check_counts(&self, workouts: &[Value]) -> Check {
        let expected = self.duration_weeks as usize * self.workouts_per_week as usize;
        let breakdown = WeekBreakdown::from_workouts(workouts);

        if workouts.len() != expected {
            return Err(format!(
                "Program must have exactly {} workouts ({} weeks x {} per week), got {}. Per-week breakdown: {}",
                expected,
                self.duration_weeks,
                self.workouts_per_week,
                workouts.len(),
                breakdown
            ));
        }

        for week in 1..=i64::from(self.duration_weeks) {
            let count = breakdown.count(week);
            if count != self.workouts_per_week as usize {
                return Err(format!(
                    "Week {} must have exactly {} workouts, got {}. Per-week breakdown: {}",
                    week, self.workouts_per_week, count, breakdown
                ));
            }
        }
        Ok(())
    }

    fn check_workout(&self, workout: &Value, number: usize, valid_ids: &HashSet<i64>) -> Check {
        let workout = workout
            .as_object()
            .ok_or_else(|| format!("Workout {} must be an object", number))?;

        if !is_non_empty_string(workout.get("name")) {
            return Err(format!("Workout {} must have a non-empty name", number));
        }

        let order = workout.get("workout_order").and_then(Value::as_f64);
        if !order.map_or(false, |o| o >= 1.0) {
            return Err(format!("Workout {} workout_order must be at least 1", number));
        }

        if let Some(level) = present(workout.get("difficulty_level")) {
            if !is_one_of(level, DIFFICULTY_LEVELS) {
                return Err(format!(
                    "Workout {} difficulty_level {} must be one of: {}",
                    number,
                    level,
                    DIFFICULTY_LEVELS.join(", ")
                ));
            }
        }

        if let Some(day) = present(workout.get("day_of_week")) {
            if !in_range(day, 1, 7) {
                return Err(format!("Workout {} day_of_week must be between 1 and 7, got {}", number, day));
            }
        }

        if let Some(week) = present(workout.get("week_number")) {
            if !in_range(week, 1, i64::from(self.duration_weeks)) {
                return Err(format!(
                    "Workout {} week_number must be between 1 and {}, got {}",
                    number, self.duration_weeks, week
                ));
            }
        }

        let blocks = workout
            .get("blocks")
            .and_then(Value::as_array)
            .filter(|blocks| !blocks.is_empty())
            .ok_or_else(|| format!("Workout {} must have a non-empty blocks array", number))?;

        for (index, block) in blocks.iter().enumerate() {
            let location = format!("Workout {} block {}", number, index + 1);
            check_block(block, &location, valid_ids)?;
        }
        Ok(())
    }
}

fn check_block(block: &Value, location: &str, valid_ids: &HashSet<i64>) -> Check {
    let block = block
        .as_object()
        .ok_or_else(|| format!("{} must be an object", location))?;

    if !is_non_empty_string(block.get("name")) {
        return Err(format!("{} must have a non-empty name", location));
    }

    if let Some(block_type) = present(block.get("block_type")) {
        if !is_one_of(block_type, BLOCK_TYPES) {
            return Err(format!(
                "{} block_type {} must be one of: {}",
                location,
                block_type,
                BLOCK_TYPES.join(", ")
            ));
        }
    }

    if let Some(sets) = present(block.get("sets")) {
        if !sets.is_number() {
            return Err(format!("{} sets must be numeric, got {}", location, sets));
        }
    }

    let exercises = block
        .get("exercises")
        .and_then(Value::as_array)
        .filter(|exercises| !exercises.is_empty())
        .ok_or_else(|| format!("{} must have a non-empty exercises array", location))?;

    for (index, exercise) in exercises.iter().enumerate() {
        let location = format!("{} exercise {}", location, index + 1);
        check_exercise(exercise, &location, valid_ids)?;
    }
    Ok(())
}

fn check_exercise(exercise: &Value, location: &str, valid_ids: &HashSet<i64>) -> Check {
    let exercise_id = exercise.get("exercise_id").filter(|id| id.is_number());
    let Some(exercise_id) = exercise_id else {
        return Err(format!("{}: exercise_id must be numeric", location));
    };

    let known = as_whole_number(exercise_id).map_or(false, |id| valid_ids.contains(&id));
    if !known {
        return Err(format!(
            "{}: exercise_id {} does not exist in the exercise catalog",
            location, exercise_id
        ));
    }

    if !exercise.get("reps").map_or(false, Value::is_number) {
        return Err(format!("{}: reps must be numeric", location));
    }

    if !exercise.get("exercise_order").map_or(false, Value::is_number) {
        return Err(format!("{}: exercise_order must be numeric", location));
    }

    if let Some(weight) = present(exercise.get("weight_level")) {
        if !is_one_of(weight, WEIGHT_LEVELS) {
            return Err(format!(
                "{}: weight_level {} must be one of: {}",
                location,
                weight,
                WEIGHT_LEVELS.join(", ")
            ));
        }
    }
    Ok(())
}

fn in_range(value: &Value, min: i64, max: i64) -> bool {
    value
        .as_f64()
        .map_or(false, |v| v >= min as f64 && v <= max as f64)
}
