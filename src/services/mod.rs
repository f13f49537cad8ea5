// Program generation services

pub mod completion_client;
pub mod exercise_catalog_service;
pub mod program_generation_service;
pub mod program_normalizer;
pub mod program_persistence_service;
pub mod program_validator;
pub mod prompt_service;
pub mod response_parser;
pub mod retry;

pub use completion_client::{
    Completion, CompletionClient, CompletionOptions, OpenAiCompatibleClient, TokenUsage,
};
pub use exercise_catalog_service::{
    catalog_ids, ExerciseCatalog, ExerciseCatalogService, InMemoryExerciseCatalog,
};
pub use program_generation_service::{
    GenerationOutcome, GenerationReport, ProgramGenerationService,
};
pub use program_normalizer::ProgramNormalizer;
pub use program_persistence_service::{ProgramPersistenceService, ProgramPersister};
pub use program_validator::{ProgramValidator, ValidationResult, WeekBreakdown};
pub use prompt_service::{PromptService, TrainingPhase, WeekPromptContext, CORRECTION_MARKER};
pub use response_parser::{parse_json_object, ResponseParser, ResponseShape, WeekResponse};
pub use retry::RetryPolicy;
