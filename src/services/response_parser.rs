use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

use crate::errors::GenerationError;

/// Shapes a week response may take
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// `{"workouts": [...]}`
    Workouts(Vec<Value>),
    /// `{"program": {...}, "workouts": [...]}`; the unsolicited header is dropped
    ProgramWithWorkouts(Vec<Value>),
    Unrecognized(String),
}

impl ResponseShape {
    pub fn detect(object: Map<String, Value>) -> Self {
        let has_program = object.contains_key("program");
        match object.into_iter().find(|(key, _)| key == "workouts") {
            Some((_, Value::Array(workouts))) if has_program => {
                ResponseShape::ProgramWithWorkouts(workouts)
            }
            Some((_, Value::Array(workouts))) => ResponseShape::Workouts(workouts),
            Some((_, other)) => ResponseShape::Unrecognized(format!(
                "\"workouts\" must be an array, got {}",
                json_type(&other)
            )),
            None => ResponseShape::Unrecognized("response has no \"workouts\" field".to_string()),
        }
    }
}

/// Workouts of one generated week
#[derive(Debug, Clone, PartialEq)]
pub struct WeekResponse {
    pub workouts: Vec<Value>,
    pub dropped_program_header: bool,
}

/// Extracts and checks the JSON returned for one week
#[derive(Debug, Clone)]
pub struct ResponseParser {
    workouts_per_week: usize,
}

impl ResponseParser {
    pub fn new(workouts_per_week: u32) -> Self {
        Self {
            workouts_per_week: workouts_per_week as usize,
        }
    }

    pub fn parse_week_response(&self, text: &str, week: u32) -> Result<WeekResponse, GenerationError> {
        let object = parse_json_object(text)?;

        let response = match ResponseShape::detect(object) {
            ResponseShape::Workouts(workouts) => WeekResponse {
                workouts,
                dropped_program_header: false,
            },
            ResponseShape::ProgramWithWorkouts(workouts) => {
                debug!("Week {} response carried a program header, keeping only workouts", week);
                WeekResponse {
                    workouts,
                    dropped_program_header: true,
                }
            }
            ResponseShape::Unrecognized(reason) => {
                return Err(GenerationError::Structure(format!("week {}: {}", week, reason)));
            }
        };

        if response.workouts.len() != self.workouts_per_week {
            return Err(GenerationError::WorkoutCount {
                week,
                expected: self.workouts_per_week,
                actual: response.workouts.len(),
            });
        }

        Ok(response)
    }
}

/// Extracts the first JSON object from raw completion text
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::malformed("empty response", text, None));
    }

    // Truncated output rarely ends on a closing brace; reject before parsing.
    let body = strip_closing_fence(trimmed);
    match body.chars().last() {
        Some('}') | Some(']') => {}
        _ => {
            let offset = text.len() - text.trim_start().len() + body.len();
            return Err(GenerationError::malformed(
                "response does not end with a closing brace or bracket, output looks truncated",
                text,
                Some(offset),
            ));
        }
    }

    let candidate = extract_candidate(trimmed)
        .ok_or_else(|| GenerationError::malformed("no JSON object found in response", text, None))?;

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        let offset = byte_offset(candidate, e.line(), e.column());
        GenerationError::malformed(format!("invalid JSON: {}", e), candidate, Some(offset))
    })?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(GenerationError::malformed(
            format!("expected a JSON object, got {}", json_type(&other)),
            candidate,
            None,
        )),
    }
}

/// Direct object, then a fenced block, then the outermost brace span
fn extract_candidate(text: &str) -> Option<&str> {
    if text.starts_with('{') {
        return Some(text);
    }

    if let Some(captures) = fenced_block().captures(text) {
        if let Some(body) = captures.get(1) {
            return Some(body.as_str());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn fenced_block() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```(?:json|JSON)?\s*(\{[\s\S]*\})\s*```").expect("fence pattern is valid")
    })
}

fn strip_closing_fence(text: &str) -> &str {
    text.strip_suffix("```").map(str::trim_end).unwrap_or(text)
}

fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let preceding: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (preceding + column.saturating_sub(1)).min(text.len())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
