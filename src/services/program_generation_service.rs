use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::models::validation::as_whole_number;
use crate::models::{ExerciseRef, GeneratedProgram, ProgramHeader, UserProfile};

use super::completion_client::{CompletionClient, CompletionOptions};
use super::exercise_catalog_service::{catalog_ids, ExerciseCatalog};
use super::program_normalizer::ProgramNormalizer;
use super::program_persistence_service::ProgramPersister;
use super::program_validator::{ProgramValidator, ValidationResult};
use super::prompt_service::{PromptService, WeekPromptContext};
use super::response_parser::ResponseParser;
use super::retry::RetryPolicy;

/// Details of a successful generation
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub program_id: Uuid,
    pub program: GeneratedProgram,
    pub attempts: u32,
    /// Errors of the failed attempts before the successful one
    pub error_history: Vec<String>,
    pub completion_tokens: Option<u64>,
}

/// Result of a generation request that did not hit a fatal error
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Completed(GenerationReport),
    /// Every attempt failed; the last one failed whole-program validation
    Exhausted {
        attempts: u32,
        last_error: String,
        error_history: Vec<String>,
    },
}

impl GenerationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, GenerationOutcome::Completed(_))
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Completed(_) => None,
            GenerationOutcome::Exhausted { last_error, .. } => Some(last_error),
        }
    }
}

/// Draft produced by one attempt, before whole-program validation
struct AttemptDraft {
    draft: Value,
    completion_tokens: Option<u64>,
}

/// Drives week-by-week generation and retries the whole pipeline on failure.
///
/// Any failure discards the draft and the next attempt starts again at
/// week 1, with the previous error included in every prompt.
pub struct ProgramGenerationService {
    config: GenerationConfig,
    retry: RetryPolicy,
    options: CompletionOptions,
    catalog: Arc<dyn ExerciseCatalog>,
    completion_client: Arc<dyn CompletionClient>,
    persister: Arc<dyn ProgramPersister>,
    prompt_service: PromptService,
    parser: ResponseParser,
    normalizer: ProgramNormalizer,
    validator: ProgramValidator,
}

impl std::fmt::Debug for ProgramGenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramGenerationService").finish_non_exhaustive()
    }
}

impl ProgramGenerationService {
    pub fn new(
        config: GenerationConfig,
        catalog: Arc<dyn ExerciseCatalog>,
        completion_client: Arc<dyn CompletionClient>,
        persister: Arc<dyn ProgramPersister>,
    ) -> Result<Self, GenerationError> {
        config.validate()?;

        Ok(Self {
            retry: RetryPolicy::from_config(&config),
            options: CompletionOptions::from_config(&config),
            prompt_service: PromptService::new(&config),
            parser: ResponseParser::new(config.workouts_per_week),
            normalizer: ProgramNormalizer::new(&config),
            validator: ProgramValidator::new(&config),
            config,
            catalog,
            completion_client,
            persister,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates, validates and persists a program for `user_id`.
    ///
    /// `Err` is returned for fatal errors (catalog, persistence) and for a
    /// generation error on the final attempt. Running out of attempts on
    /// validation failures yields [`GenerationOutcome::Exhausted`].
    pub async fn generate_program(
        &self,
        user_id: Uuid,
        profile: &UserProfile,
    ) -> Result<GenerationOutcome, GenerationError> {
        let mut last_error: Option<String> = None;
        let mut error_history = Vec::new();

        for attempt in self.retry.attempts() {
            info!(
                "Generating {}-week program for user {} (attempt {}/{})",
                self.config.duration_weeks, user_id, attempt, self.retry.max_attempts
            );

            let catalog = self.catalog.list_exercises().await?;
            let valid_ids = catalog_ids(&catalog);

            let failure = match self.generate_draft(profile, &catalog, last_error.as_deref()).await {
                Ok(attempt_draft) => match self.validator.validate(attempt_draft.draft, &valid_ids) {
                    ValidationResult::Valid(data) => match GeneratedProgram::from_draft(data) {
                        Ok(program) => {
                            let program_id = self
                                .persister
                                .persist(user_id, &program)
                                .await
                                .map_err(GenerationError::Persistence)?;

                            info!(
                                "Program {} generated for user {} after {} attempt(s)",
                                program_id, user_id, attempt
                            );
                            return Ok(GenerationOutcome::Completed(GenerationReport {
                                program_id,
                                program,
                                attempts: attempt,
                                error_history,
                                completion_tokens: attempt_draft.completion_tokens,
                            }));
                        }
                        Err(e) => format!("Program does not match the storage schema: {}", e),
                    },
                    ValidationResult::Invalid(message) => {
                        warn!("Attempt {} failed validation: {}", attempt, message);
                        message
                    }
                },
                Err(e) => {
                    if self.retry.is_last(attempt) {
                        error!("Final attempt {} failed: {}", attempt, e);
                        return Err(e);
                    }
                    warn!("Attempt {} failed during generation: {}", attempt, e);
                    e.to_string()
                }
            };

            error_history.push(failure.clone());
            last_error = Some(failure);

            if !self.retry.is_last(attempt) {
                self.retry.wait_after(attempt).await;
            }
        }

        let last_error = last_error.unwrap_or_default();
        error!(
            "Program generation for user {} exhausted {} attempts: {}",
            user_id, self.retry.max_attempts, last_error
        );
        Ok(GenerationOutcome::Exhausted {
            attempts: self.retry.max_attempts,
            last_error,
            error_history,
        })
    }

    /// Generates every week in order and accumulates them into one draft
    async fn generate_draft(
        &self,
        profile: &UserProfile,
        catalog: &[ExerciseRef],
        previous_error: Option<&str>,
    ) -> Result<AttemptDraft, GenerationError> {
        let mut draft = ProgramHeader::for_profile(profile, self.config.duration_weeks).into_draft();
        let mut used_exercise_ids: Vec<i64> = Vec::new();
        let mut completion_tokens: Option<u64> = None;

        for week in 1..=self.config.duration_weeks {
            let prompt = self.prompt_service.assemble_week_prompt(&WeekPromptContext {
                week,
                profile,
                catalog,
                prior_exercise_ids: &used_exercise_ids,
                previous_error,
            });

            let completion = self.completion_client.complete(&prompt, &self.options).await?;
            if let Some(usage) = completion.usage {
                *completion_tokens.get_or_insert(0) += u64::from(usage.completion_tokens);
            }

            if completion.truncated {
                return Err(GenerationError::malformed(
                    format!("week {} output was cut off at the output token limit", week),
                    &completion.text,
                    Some(completion.text.len()),
                ));
            }

            let week_response = self.parser.parse_week_response(&completion.text, week)?;

            let Some(workouts) = draft.get_mut("workouts").and_then(Value::as_array_mut) else {
                return Err(GenerationError::Structure("draft lost its workouts array".to_string()));
            };
            let first_new = workouts.len();
            workouts.extend(week_response.workouts);

            self.normalizer.normalize(&mut draft);

            if let Some(workouts) = draft.get("workouts").and_then(Value::as_array) {
                collect_exercise_ids(&workouts[first_new..], &mut used_exercise_ids);
            }

            debug!(
                "Week {}/{} generated, {} distinct exercises used so far",
                week,
                self.config.duration_weeks,
                used_exercise_ids.len()
            );
        }

        Ok(AttemptDraft {
            draft,
            completion_tokens,
        })
    }
}

/// Appends ids not seen before, keeping first-use order
fn collect_exercise_ids(workouts: &[Value], used: &mut Vec<i64>) {
    let ids = workouts
        .iter()
        .filter_map(|w| w.get("blocks").and_then(Value::as_array))
        .flatten()
        .filter_map(|b| b.get("exercises").and_then(Value::as_array))
        .flatten()
        .filter_map(|e| e.get("exercise_id").and_then(as_whole_number));

    for id in ids {
        if !used.contains(&id) {
            used.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_exercise_ids_keeps_first_use_order() {
        let workouts = vec![
            json!({"blocks": [{"exercises": [{"exercise_id": 3}, {"exercise_id": 1}]}]}),
            json!({"blocks": [{"exercises": [{"exercise_id": 1}, {"exercise_id": 7}]}, {"exercises": "bad"}]}),
            json!("not a workout"),
        ];
        let mut used = vec![7];
        collect_exercise_ids(&workouts, &mut used);
        assert_eq!(used, vec![7, 3, 1]);
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = GenerationOutcome::Exhausted {
            attempts: 3,
            last_error: "Week 1 must have exactly 3 workouts".to_string(),
            error_history: vec![],
        };
        assert!(!outcome.is_completed());
        assert_eq!(outcome.last_error(), Some("Week 1 must have exactly 3 workouts"));
    }
}
