use thiserror::Error;

/// Errors raised while generating a workout program.
///
/// Whole-program validation failures are not errors: they are reported as
/// [`crate::services::ValidationResult::Invalid`] and, once retries run out,
/// as [`crate::services::GenerationOutcome::Exhausted`].
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Exercise catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("Completion service error: {0}")]
    Upstream(String),
    #[error("Malformed completion response: {reason}")]
    MalformedResponse {
        reason: String,
        preview: String,
        offset: Option<usize>,
    },
    #[error("Week {week} returned {actual} workouts, expected {expected}")]
    WorkoutCount {
        week: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Unexpected response structure: {0}")]
    Structure(String),
    #[error("Failed to persist program: {0}")]
    Persistence(#[source] anyhow::Error),
    #[error("Invalid generation configuration: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Whether the orchestrator may start another attempt after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Upstream(_)
                | GenerationError::MalformedResponse { .. }
                | GenerationError::WorkoutCount { .. }
                | GenerationError::Structure(_)
        )
    }

    /// Structure errors are the per-week shape and count violations.
    pub fn is_structure_error(&self) -> bool {
        matches!(
            self,
            GenerationError::WorkoutCount { .. } | GenerationError::Structure(_)
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>, text: &str, offset: Option<usize>) -> Self {
        GenerationError::MalformedResponse {
            reason: reason.into(),
            preview: preview(text),
            offset,
        }
    }
}

const PREVIEW_CHARS: usize = 200;

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GenerationError::Upstream("timeout".to_string()).is_retryable());
        assert!(GenerationError::Structure("no workouts".to_string()).is_retryable());
        assert!(GenerationError::WorkoutCount { week: 1, expected: 3, actual: 2 }.is_retryable());
        assert!(!GenerationError::CatalogUnavailable("db down".to_string()).is_retryable());
        assert!(!GenerationError::Configuration("weeks".to_string()).is_retryable());
    }

    #[test]
    fn test_workout_count_message_names_both_counts() {
        let error = GenerationError::WorkoutCount { week: 1, expected: 3, actual: 2 };
        assert_eq!(error.to_string(), "Week 1 returned 2 workouts, expected 3");
    }

    #[test]
    fn test_malformed_preview_is_bounded() {
        let text = "x".repeat(500);
        match GenerationError::malformed("bad", &text, Some(499)) {
            GenerationError::MalformedResponse { preview, offset, .. } => {
                assert_eq!(preview.len(), PREVIEW_CHARS + 3);
                assert_eq!(offset, Some(499));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
