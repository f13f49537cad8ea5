use anyhow::{Context, Result};
use std::env;
use std::fs;

use super::env_or;
use crate::errors::GenerationError;

pub const DEFAULT_DURATION_WEEKS: u32 = 12;
pub const DEFAULT_WORKOUTS_PER_WEEK: u32 = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_REPS: i64 = 10;
pub const DEFAULT_REST_SECONDS: i64 = 60;
pub const DEFAULT_PRIOR_EXERCISE_SAMPLE: usize = 10;

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert strength and conditioning coach. You answer with a single JSON object and nothing else.";

const DEFAULT_METHODOLOGY_RULES: &str = "\
- Every workout trains the whole body.
- Warmup blocks use light or no load; main blocks progress load week over week.
- Prefer exercises matching the athlete's level and available equipment.
- Repeating an exercise across weeks is allowed when it supports progression.";

/// Settings for the multi-week program generation pipeline
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub duration_weeks: u32,
    pub workouts_per_week: u32,
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * retry_backoff_ms` before the next one.
    pub retry_backoff_ms: u64,
    pub default_reps: i64,
    pub default_rest_seconds: i64,
    pub prior_exercise_sample: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub json_mode: bool,
    pub system_prompt: String,
    pub methodology_rules: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            duration_weeks: DEFAULT_DURATION_WEEKS,
            workouts_per_week: DEFAULT_WORKOUTS_PER_WEEK,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            default_reps: DEFAULT_REPS,
            default_rest_seconds: DEFAULT_REST_SECONDS,
            prior_exercise_sample: DEFAULT_PRIOR_EXERCISE_SAMPLE,
            temperature: 0.7,
            max_output_tokens: 8192,
            json_mode: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            methodology_rules: DEFAULT_METHODOLOGY_RULES.to_string(),
        }
    }
}

impl GenerationConfig {
    /// Create configuration from `PROGRAM_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let methodology_rules = match env::var("PROGRAM_RULES_PATH") {
            Ok(path) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read methodology rules from {}", path))?,
            Err(_) => defaults.methodology_rules,
        };

        let config = Self {
            duration_weeks: env_or("PROGRAM_WEEKS", defaults.duration_weeks)?,
            workouts_per_week: env_or("PROGRAM_WORKOUTS_PER_WEEK", defaults.workouts_per_week)?,
            max_attempts: env_or("PROGRAM_MAX_ATTEMPTS", defaults.max_attempts)?,
            retry_backoff_ms: env_or("PROGRAM_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            default_reps: env_or("PROGRAM_DEFAULT_REPS", defaults.default_reps)?,
            default_rest_seconds: env_or("PROGRAM_DEFAULT_REST_SECONDS", defaults.default_rest_seconds)?,
            prior_exercise_sample: env_or("PROGRAM_PRIOR_EXERCISE_SAMPLE", defaults.prior_exercise_sample)?,
            temperature: env_or("PROGRAM_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: env_or("PROGRAM_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            json_mode: env_or("PROGRAM_JSON_MODE", defaults.json_mode)?,
            system_prompt: env::var("PROGRAM_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            methodology_rules,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.duration_weeks == 0 {
            return Err(GenerationError::Configuration("duration_weeks must be at least 1".to_string()));
        }
        if self.workouts_per_week == 0 {
            return Err(GenerationError::Configuration("workouts_per_week must be at least 1".to_string()));
        }
        if self.duration_weeks.checked_mul(self.workouts_per_week).is_none() {
            return Err(GenerationError::Configuration(format!(
                "{} weeks of {} workouts is more than a program can hold",
                self.duration_weeks, self.workouts_per_week
            )));
        }
        if self.max_attempts == 0 {
            return Err(GenerationError::Configuration("max_attempts must be at least 1".to_string()));
        }
        if self.default_reps < 1 {
            return Err(GenerationError::Configuration("default_reps must be at least 1".to_string()));
        }
        if self.default_rest_seconds < 0 {
            return Err(GenerationError::Configuration("default_rest_seconds cannot be negative".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenerationError::Configuration("temperature must be between 0.0 and 2.0".to_string()));
        }
        Ok(())
    }

    pub fn total_workouts(&self) -> usize {
        self.duration_weeks as usize * self.workouts_per_week as usize
    }
}
