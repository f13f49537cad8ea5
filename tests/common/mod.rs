#![allow(dead_code)]

use ai_coach_programs::config::GenerationConfig;
use ai_coach_programs::errors::GenerationError;
use ai_coach_programs::models::{DifficultyLevel, ExerciseRef, GeneratedProgram, UserProfile};
use ai_coach_programs::services::{
    Completion, CompletionClient, CompletionOptions, ExerciseCatalog, InMemoryExerciseCatalog,
    ProgramPersister,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Responder = dyn Fn(usize, &str) -> Result<Completion, GenerationError> + Send + Sync;

/// Completion client answering from a closure of (call index, prompt)
pub struct StubCompletionClient {
    responder: Box<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletionClient {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(usize, &str) -> Result<Completion, GenerationError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Answers every week with a valid response built from the prompt
    pub fn always_valid(workouts_per_week: u32) -> Arc<Self> {
        Self::new(move |_, prompt| {
            Ok(Completion::new(week_response(week_from_prompt(prompt), workouts_per_week, &[1, 2])))
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, GenerationError> {
        let index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        (self.responder)(index, prompt)
    }
}

/// Keeps every persisted program in memory
#[derive(Default)]
pub struct RecordingPersister {
    programs: Mutex<Vec<(Uuid, Uuid, GeneratedProgram)>>,
    fail: bool,
}

impl RecordingPersister {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn saved(&self) -> Vec<(Uuid, Uuid, GeneratedProgram)> {
        self.programs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgramPersister for RecordingPersister {
    async fn persist(&self, user_id: Uuid, program: &GeneratedProgram) -> Result<Uuid> {
        if self.fail {
            return Err(anyhow!("connection reset by peer"));
        }
        let program_id = Uuid::new_v4();
        self.programs
            .lock()
            .unwrap()
            .push((program_id, user_id, program.clone()));
        Ok(program_id)
    }
}

/// Catalog returning the next snapshot on every fetch, then repeating the last
pub struct SnapshotCatalog {
    snapshots: Vec<Vec<ExerciseRef>>,
    fetches: AtomicUsize,
}

impl SnapshotCatalog {
    pub fn new(snapshots: Vec<Vec<ExerciseRef>>) -> Arc<Self> {
        Arc::new(Self {
            snapshots,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExerciseCatalog for SnapshotCatalog {
    async fn list_exercises(&self) -> Result<Vec<ExerciseRef>, GenerationError> {
        let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
        let index = fetch.min(self.snapshots.len() - 1);
        Ok(self.snapshots[index].clone())
    }
}

pub fn config(weeks: u32, workouts_per_week: u32) -> GenerationConfig {
    GenerationConfig {
        duration_weeks: weeks,
        workouts_per_week,
        ..Default::default()
    }
}

/// Catalog holding exercise ids 1 and 2
pub fn catalog() -> Arc<InMemoryExerciseCatalog> {
    Arc::new(InMemoryExerciseCatalog::new(exercises()))
}

pub fn exercises() -> Vec<ExerciseRef> {
    vec![
        ExerciseRef::new(1, "Goblet Squat")
            .with_category("strength")
            .with_muscle_groups(&["quadriceps", "glutes"])
            .with_difficulty("beginner"),
        ExerciseRef::new(2, "Cat-Cow")
            .with_category("mobility")
            .with_muscle_groups(&["spine"])
            .with_difficulty("beginner"),
    ]
}

pub fn profile() -> UserProfile {
    UserProfile::new(DifficultyLevel::Beginner, vec!["strength".to_string()])
}

pub fn week_from_prompt(prompt: &str) -> u32 {
    let pattern = Regex::new(r"Generate week (\d+) of").unwrap();
    pattern
        .captures(prompt)
        .and_then(|caps| caps[1].parse().ok())
        .expect("prompt names its week")
}

pub fn workout(week: u32, order: u32, exercise_ids: &[i64]) -> Value {
    let exercises: Vec<Value> = exercise_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            json!({"exercise_id": id, "reps": 10, "exercise_order": index + 1, "weight_level": "light"})
        })
        .collect();

    json!({
        "name": format!("Week {} Session {}", week, order),
        "description": "Full body",
        "week_number": week,
        "workout_order": order,
        "day_of_week": order.min(7),
        "estimated_duration_minutes": 45,
        "difficulty_level": "beginner",
        "blocks": [{
            "name": "Compound Bilateral",
            "block_type": "main",
            "sets": 3,
            "rest_between_exercises": 90,
            "exercises": exercises
        }]
    })
}

pub fn week_workouts(week: u32, count: u32, exercise_ids: &[i64]) -> Vec<Value> {
    (1..=count)
        .map(|n| workout(week, (week - 1) * count + n, exercise_ids))
        .collect()
}

/// `{"workouts": [...]}` text for one week
pub fn week_response(week: u32, count: u32, exercise_ids: &[i64]) -> String {
    json!({ "workouts": week_workouts(week, count, exercise_ids) }).to_string()
}
