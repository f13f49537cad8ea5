use serde_json::Value;

pub const DIFFICULTY_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

pub const BLOCK_TYPES: &[&str] = &["warmup", "main", "cooldown", "superset", "circuit", "standard"];

pub const WEIGHT_LEVELS: &[&str] = &["no_weight", "light", "medium", "heavy"];

/// Whether `value` is a string from `allowed`
pub fn is_one_of(value: &Value, allowed: &[&str]) -> bool {
    value.as_str().map_or(false, |s| allowed.contains(&s))
}

/// Non-empty after trimming
pub fn is_non_empty_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(false, |s| !s.trim().is_empty())
}

/// Present and not JSON null
pub fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Integer value of a JSON number, if it is one and holds a whole number
pub fn as_whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}
