use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::{Block, GeneratedProgram, Workout};

/// Receives a fully validated program. Returns the stored program id.
#[async_trait]
pub trait ProgramPersister: Send + Sync {
    async fn persist(&self, user_id: Uuid, program: &GeneratedProgram) -> Result<Uuid>;
}

/// Writes a program and its workouts, blocks and block exercises in one transaction
#[derive(Clone)]
pub struct ProgramPersistenceService {
    db: PgPool,
}

impl ProgramPersistenceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn insert_workout(
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        workout: &Workout,
    ) -> Result<()> {
        let workout_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO workouts (
                id, program_id, name, description, week_number, workout_order,
                day_of_week, estimated_duration_minutes, difficulty_level, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(workout_id)
        .bind(program_id)
        .bind(&workout.name)
        .bind(&workout.description)
        .bind(workout.week_number.map(to_i32))
        .bind(to_i32(workout.workout_order))
        .bind(workout.day_of_week.map(to_i32))
        .bind(workout.estimated_duration_minutes.map(to_i32))
        .bind(workout.difficulty_level.map(|level| level.as_str()))
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert workout {}", workout.workout_order))?;

        for (index, block) in workout.blocks.iter().enumerate() {
            Self::insert_block(tx, workout_id, index as i32 + 1, block).await?;
        }

        Ok(())
    }

    async fn insert_block(
        tx: &mut Transaction<'_, Postgres>,
        workout_id: Uuid,
        block_order: i32,
        block: &Block,
    ) -> Result<()> {
        let block_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO workout_blocks (
                id, workout_id, name, block_type, block_order, sets, rest_between_exercises
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(block_id)
        .bind(workout_id)
        .bind(&block.name)
        .bind(block.block_type.map(|t| t.as_str()))
        .bind(block_order)
        .bind(block.sets.map(to_i32))
        .bind(block.rest_between_exercises.map(to_i32))
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert block {}", block.name))?;

        for exercise in &block.exercises {
            sqlx::query(
                r#"
                INSERT INTO block_exercises (
                    id, block_id, exercise_id, reps, exercise_order, weight_level
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(block_id)
            .bind(exercise.exercise_id)
            .bind(to_i32(exercise.reps))
            .bind(to_i32(exercise.exercise_order))
            .bind(exercise.weight_level.map(|w| w.as_str()))
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert exercise {}", exercise.exercise_id))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ProgramPersister for ProgramPersistenceService {
    async fn persist(&self, user_id: Uuid, program: &GeneratedProgram) -> Result<Uuid> {
        let program_id = Uuid::new_v4();
        let mut tx = self.db.begin().await.context("Failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO programs (
                id, user_id, name, description, duration_weeks, difficulty_level,
                program_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(program_id)
        .bind(user_id)
        .bind(&program.program.name)
        .bind(&program.program.description)
        .bind(to_i32(program.program.duration_weeks))
        .bind(program.program.difficulty_level.map(|level| level.as_str()))
        .bind(&program.program.program_type)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to insert program")?;

        for workout in &program.workouts {
            Self::insert_workout(&mut tx, program_id, workout).await?;
        }

        tx.commit().await.context("Failed to commit program")?;

        info!(
            "Persisted program {} for user {} ({} workouts)",
            program_id,
            user_id,
            program.workouts.len()
        );
        Ok(program_id)
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
