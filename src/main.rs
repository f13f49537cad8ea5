use ai_coach_programs::config::{run_migrations, DatabaseConfig, GenerationConfig, LlmConfig};
use ai_coach_programs::models::{GeneratedProgram, UserProfile};
use ai_coach_programs::services::{
    ExerciseCatalog, ExerciseCatalogService, GenerationOutcome, InMemoryExerciseCatalog,
    OpenAiCompatibleClient, ProgramGenerationService, ProgramPersistenceService, ProgramPersister,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "generate-program")]
#[command(about = "Generate a multi-week workout program with a language model", long_about = None)]
#[command(version)]
struct Cli {
    /// User the program is generated for
    #[arg(long, env = "PROGRAM_USER_ID")]
    user_id: Uuid,

    /// JSON file holding the user profile
    #[arg(long)]
    profile: PathBuf,

    /// JSON export of the exercise catalog (defaults to the database)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the program length in weeks
    #[arg(long)]
    weeks: Option<u32>,

    /// Override the number of workouts per week
    #[arg(long)]
    workouts_per_week: Option<u32>,

    /// Print the program instead of storing it
    #[arg(long)]
    dry_run: bool,

    /// Apply database migrations before generating
    #[arg(long)]
    migrate: bool,
}

/// Prints the program as JSON instead of writing it to the database
struct DryRunPersister;

#[async_trait]
impl ProgramPersister for DryRunPersister {
    async fn persist(&self, _user_id: Uuid, program: &GeneratedProgram) -> Result<Uuid> {
        println!("{}", serde_json::to_string_pretty(program)?);
        Ok(Uuid::new_v4())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = GenerationConfig::from_env()?;
    if let Some(weeks) = cli.weeks {
        config.duration_weeks = weeks;
    }
    if let Some(per_week) = cli.workouts_per_week {
        config.workouts_per_week = per_week;
    }

    let profile_json = tokio::fs::read_to_string(&cli.profile)
        .await
        .with_context(|| format!("Failed to read profile {}", cli.profile.display()))?;
    let profile: UserProfile = serde_json::from_str(&profile_json).context("Invalid user profile")?;

    // A database is needed unless both the catalog and the output stay local
    let pool = if cli.catalog.is_none() || !cli.dry_run {
        let pool = DatabaseConfig::from_env()?.create_pool().await?;
        if cli.migrate {
            run_migrations(&pool).await?;
            info!("Database migrations applied");
        }
        Some(pool)
    } else {
        None
    };

    let catalog: Arc<dyn ExerciseCatalog> = match (&cli.catalog, &pool) {
        (Some(path), _) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read catalog {}", path.display()))?;
            Arc::new(InMemoryExerciseCatalog::from_json(&json)?)
        }
        (None, Some(pool)) => Arc::new(ExerciseCatalogService::new(pool.clone())),
        (None, None) => bail!("No exercise catalog source available"),
    };

    let persister: Arc<dyn ProgramPersister> = match (cli.dry_run, &pool) {
        (true, _) => Arc::new(DryRunPersister),
        (false, Some(pool)) => Arc::new(ProgramPersistenceService::new(pool.clone())),
        (false, None) => bail!("Persisting a program requires a database"),
    };

    let client = Arc::new(OpenAiCompatibleClient::new(&LlmConfig::from_env()?)?);
    let service = ProgramGenerationService::new(config, catalog, client, persister)?;

    match service.generate_program(cli.user_id, &profile).await? {
        GenerationOutcome::Completed(report) => {
            info!(
                "Program {} ({}) ready after {} attempt(s), {} workouts",
                report.program_id,
                report.program.program.name,
                report.attempts,
                report.program.workouts.len()
            );
            if let Some(tokens) = report.completion_tokens {
                info!("Completion tokens used: {}", tokens);
            }
            Ok(())
        }
        GenerationOutcome::Exhausted {
            attempts,
            last_error,
            ..
        } => {
            error!("No valid program after {} attempts", attempts);
            bail!("Program generation failed: {}", last_error)
        }
    }
}
