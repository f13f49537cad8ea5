use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, error};

use crate::errors::GenerationError;
use crate::models::ExerciseRef;

/// Read access to the exercises the generator may reference
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    async fn list_exercises(&self) -> Result<Vec<ExerciseRef>, GenerationError>;
}

/// Ids of a catalog snapshot, used for referential checks
pub fn catalog_ids(exercises: &[ExerciseRef]) -> HashSet<i64> {
    exercises.iter().map(|e| e.exercise_id).collect()
}

/// A catalog with no exercises cannot back a program
fn require_exercises(exercises: Vec<ExerciseRef>, source: &str) -> Result<Vec<ExerciseRef>, GenerationError> {
    if exercises.is_empty() {
        return Err(GenerationError::CatalogUnavailable(format!("{} is empty", source)));
    }
    Ok(exercises)
}

/// Catalog backed by the `exercises` table
#[derive(Clone)]
pub struct ExerciseCatalogService {
    db: PgPool,
}

impl ExerciseCatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExerciseCatalog for ExerciseCatalogService {
    async fn list_exercises(&self) -> Result<Vec<ExerciseRef>, GenerationError> {
        let exercises = sqlx::query_as::<_, ExerciseRef>(
            r#"
            SELECT
                id AS exercise_id, name, category, muscle_groups,
                difficulty_level, equipment_needed
            FROM exercises
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!("Failed to load exercise catalog: {}", e);
            GenerationError::CatalogUnavailable(e.to_string())
        })?;

        debug!("Loaded {} exercises from catalog", exercises.len());
        require_exercises(exercises, "exercises table")
    }
}

/// Fixed catalog snapshot, loaded from a JSON export of the `exercises` table
#[derive(Debug, Clone, Default)]
pub struct InMemoryExerciseCatalog {
    exercises: Vec<ExerciseRef>,
}

impl InMemoryExerciseCatalog {
    pub fn new(exercises: Vec<ExerciseRef>) -> Self {
        Self { exercises }
    }

    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        let exercises: Vec<ExerciseRef> = serde_json::from_str(json)
            .map_err(|e| GenerationError::CatalogUnavailable(format!("invalid catalog export: {}", e)))?;
        Ok(Self::new(exercises))
    }
}

#[async_trait]
impl ExerciseCatalog for InMemoryExerciseCatalog {
    async fn list_exercises(&self) -> Result<Vec<ExerciseRef>, GenerationError> {
        require_exercises(self.exercises.clone(), "catalog snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_in_memory_catalog_from_export() {
        let catalog = InMemoryExerciseCatalog::from_json(
            r#"[
                {"exercise_id": 1, "name": "Push-up", "category": "strength", "muscle_groups": ["chest"]},
                {"exercise_id": 2, "name": "Cat-Cow", "category": "mobility"}
            ]"#,
        )
        .unwrap();

        let exercises = catalog.list_exercises().await.unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(catalog_ids(&exercises), HashSet::from([1, 2]));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_unavailable() {
        let catalog = InMemoryExerciseCatalog::default();
        assert_matches!(
            catalog.list_exercises().await,
            Err(GenerationError::CatalogUnavailable(_))
        );
    }

    #[test]
    fn test_empty_result_is_unavailable() {
        assert_matches!(
            require_exercises(Vec::new(), "exercises table"),
            Err(GenerationError::CatalogUnavailable(message)) if message == "exercises table is empty"
        );
        assert_eq!(require_exercises(vec![ExerciseRef::new(1, "Plank")], "exercises table").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_export_is_rejected() {
        assert_matches!(
            InMemoryExerciseCatalog::from_json("[{\"name\": \"no id\"}]"),
            Err(GenerationError::CatalogUnavailable(_))
        );
    }
}
