use serde_json::{json, Map, Value};

use crate::config::GenerationConfig;

/// Coerces loosely typed generated fields into storage-valid ranges.
///
/// Never rejects a draft: anything it cannot repair is left for the
/// validator to judge. Applying it twice gives the same result as once.
#[derive(Debug, Clone)]
pub struct ProgramNormalizer {
    duration_weeks: i64,
    default_reps: i64,
    default_rest_seconds: i64,
}

impl ProgramNormalizer {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            duration_weeks: i64::from(config.duration_weeks),
            default_reps: config.default_reps,
            default_rest_seconds: config.default_rest_seconds,
        }
    }

    pub fn normalize(&self, draft: &mut Value) {
        if let Some(program) = draft.get_mut("program").and_then(Value::as_object_mut) {
            program.insert("duration_weeks".to_string(), json!(self.duration_weeks));
        }

        let Some(workouts) = draft.get_mut("workouts").and_then(Value::as_array_mut) else {
            return;
        };

        for (index, workout) in workouts.iter_mut().enumerate() {
            if let Some(workout) = workout.as_object_mut() {
                self.normalize_workout(workout, index);
            }
        }
    }

    fn normalize_workout(&self, workout: &mut Map<String, Value>, index: usize) {
        let order = workout
            .get("workout_order")
            .and_then(as_number)
            .map(|n| floor_at_least(n, 1))
            .unwrap_or(index as i64 + 1);
        workout.insert("workout_order".to_string(), json!(order));

        clamp_field(workout, "estimated_duration_minutes", 1, i64::MAX);
        clamp_field(workout, "week_number", 1, self.duration_weeks);
        clamp_field(workout, "day_of_week", 1, 7);

        if let Some(blocks) = workout.get_mut("blocks").and_then(Value::as_array_mut) {
            for block in blocks.iter_mut().filter_map(Value::as_object_mut) {
                self.normalize_block(block);
            }
        }
    }

    fn normalize_block(&self, block: &mut Map<String, Value>) {
        clamp_field(block, "sets", 1, i64::MAX);

        if has_value(block, "rest_between_exercises") {
            clamp_field(block, "rest_between_exercises", 0, i64::MAX);
        } else {
            block.insert(
                "rest_between_exercises".to_string(),
                json!(self.default_rest_seconds),
            );
        }

        if let Some(exercises) = block.get_mut("exercises").and_then(Value::as_array_mut) {
            for (position, exercise) in exercises.iter_mut().enumerate() {
                self.normalize_exercise(exercise, position);
            }
        }
    }

    fn normalize_exercise(&self, exercise: &mut Value, position: usize) {
        let order = position as i64 + 1;

        match exercise {
            Value::Object(fields) => {
                if let Some(id) = fields.get("exercise_id").and_then(as_number) {
                    fields.insert("exercise_id".to_string(), json!(id.floor() as i64));
                }

                let reps = fields
                    .get("reps")
                    .and_then(as_number)
                    .map(|n| floor_at_least(n, 1))
                    .unwrap_or(self.default_reps);
                fields.insert("reps".to_string(), json!(reps));
                fields.insert("exercise_order".to_string(), json!(order));
            }
            scalar => {
                if let Some(id) = as_number(scalar) {
                    *scalar = json!({
                        "exercise_id": id.floor() as i64,
                        "reps": self.default_reps,
                        "exercise_order": order,
                    });
                }
            }
        }
    }
}

/// Numeric value of a JSON number or numeric string
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn floor_at_least(value: f64, min: i64) -> i64 {
    (value.floor() as i64).max(min)
}

fn has_value(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).map_or(false, |v| !v.is_null())
}

/// Floors and clamps a numeric field when present; leaves anything else alone
fn clamp_field(fields: &mut Map<String, Value>, key: &str, min: i64, max: i64) {
    if let Some(number) = fields.get(key).and_then(as_number) {
        let clamped = (number.floor() as i64).clamp(min, max);
        fields.insert(key.to_string(), json!(clamped));
    }
}
