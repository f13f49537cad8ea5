use std::collections::BTreeSet;

use crate::config::GenerationConfig;
use crate::models::{ExerciseRef, UserProfile};

/// Marker placed in front of the previous attempt's validation error
pub const CORRECTION_MARKER: &str = "PREVIOUS ATTEMPT FAILED VALIDATION:";

/// One slot of the fixed six-block workout template
struct BlockSlot {
    name: &'static str,
    block_type: &'static str,
    category_keywords: &'static [&'static str],
}

const BLOCK_TEMPLATE: [BlockSlot; 6] = [
    BlockSlot {
        name: "Mobility",
        block_type: "warmup",
        category_keywords: &["mobility", "stretch", "warm"],
    },
    BlockSlot {
        name: "Core & Stability",
        block_type: "warmup",
        category_keywords: &["core", "stability", "balance"],
    },
    BlockSlot {
        name: "Explosive / Speed",
        block_type: "main",
        category_keywords: &["plyo", "explosive", "power", "speed", "agility"],
    },
    BlockSlot {
        name: "Compound Bilateral (lower + upper)",
        block_type: "main",
        category_keywords: &["compound", "bilateral", "strength", "lower", "upper"],
    },
    BlockSlot {
        name: "Compound Unilateral",
        block_type: "main",
        category_keywords: &["unilateral", "single"],
    },
    BlockSlot {
        name: "Accessories",
        block_type: "main",
        category_keywords: &["accessory", "accessories", "isolation", "hypertrophy"],
    },
];

/// Inputs for one week's prompt
pub struct WeekPromptContext<'a> {
    pub week: u32,
    pub profile: &'a UserProfile,
    pub catalog: &'a [ExerciseRef],
    /// Exercise ids used by earlier weeks, in order of first use
    pub prior_exercise_ids: &'a [i64],
    pub previous_error: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    BaseTechnique,
    ProgressiveOverload,
}

impl TrainingPhase {
    /// First third of the program builds the base, the rest overloads
    pub fn for_week(week: u32, duration_weeks: u32) -> Self {
        let base_weeks = (duration_weeks + 2) / 3;
        if week <= base_weeks {
            TrainingPhase::BaseTechnique
        } else {
            TrainingPhase::ProgressiveOverload
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainingPhase::BaseTechnique => "Base / technique",
            TrainingPhase::ProgressiveOverload => "Progressive overload",
        }
    }
}

/// Builds the per-week generation prompt. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct PromptService {
    duration_weeks: u32,
    workouts_per_week: u32,
    prior_exercise_sample: usize,
    methodology_rules: String,
}

impl PromptService {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            duration_weeks: config.duration_weeks,
            workouts_per_week: config.workouts_per_week,
            prior_exercise_sample: config.prior_exercise_sample,
            methodology_rules: config.methodology_rules.clone(),
        }
    }

    pub fn assemble_week_prompt(&self, ctx: &WeekPromptContext<'_>) -> String {
        let first_order = (ctx.week - 1) * self.workouts_per_week + 1;
        let last_order = ctx.week * self.workouts_per_week;
        let phase = TrainingPhase::for_week(ctx.week, self.duration_weeks);

        let mut sections = vec![
            format!("METHODOLOGY RULES:\n{}", self.methodology_rules.trim()),
            format!("USER PROFILE:\n{}", describe_profile(ctx.profile)),
            format!(
                "TASK:\nGenerate week {} of a {}-week program.\n\
                 Phase for week {}: {}\n\
                 Return exactly {} workouts for this week.\n\
                 Every workout must have \"week_number\": {}.\n\
                 Use \"workout_order\" values {} to {} (one per workout, in order).\n\
                 \"day_of_week\" is 1 (Monday) to 7 (Sunday).",
                ctx.week,
                self.duration_weeks,
                ctx.week,
                phase.label(),
                self.workouts_per_week,
                ctx.week,
                first_order,
                last_order
            ),
            block_structure(ctx.catalog),
            format!(
                "EXERCISE CATALOG ({} exercises, format id:name|category|muscles|difficulty). \
                 Use ONLY these exercise_id values:\n{}",
                ctx.catalog.len(),
                ctx.catalog
                    .iter()
                    .map(ExerciseRef::catalog_line)
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        ];

        if let Some(summary) = self.prior_weeks_summary(ctx.week, ctx.prior_exercise_ids) {
            sections.push(format!("PREVIOUS WEEKS:\n{}", summary));
        }

        if let Some(error) = ctx.previous_error {
            sections.push(format!(
                "{}\n{}\nFix this problem in your answer.",
                CORRECTION_MARKER, error
            ));
        }

        sections.push(format!(
            "OUTPUT FORMAT:\n\
             {{\"workouts\": [{{\"name\": string, \"week_number\": {}, \"workout_order\": int, \"day_of_week\": int, \
             \"estimated_duration_minutes\": int, \"difficulty_level\": \"beginner|intermediate|advanced\", \
             \"blocks\": [{{\"name\": string, \"block_type\": \"warmup|main\", \"sets\": int, \"rest_between_exercises\": int, \
             \"exercises\": [{{\"exercise_id\": int, \"reps\": int, \"exercise_order\": int, \
             \"weight_level\": \"no_weight|light|medium|heavy\"}}]}}]}}]}}\n\
             Return only the JSON object with exactly {} workouts.",
            ctx.week, self.workouts_per_week
        ));

        sections.join("\n\n")
    }

    /// Short hint about exercises used so far, capped to the most recent ids
    fn prior_weeks_summary(&self, week: u32, prior_ids: &[i64]) -> Option<String> {
        if week <= 1 || prior_ids.is_empty() {
            return None;
        }

        let skip = prior_ids.len().saturating_sub(self.prior_exercise_sample);
        let sample: Vec<String> = prior_ids[skip..].iter().map(|id| id.to_string()).collect();

        Some(format!(
            "Weeks 1-{} used {} distinct exercises, recently: {}. \
             Keep key lifts for progression and vary accessories.",
            week - 1,
            prior_ids.len(),
            sample.join(", ")
        ))
    }
}

fn describe_profile(profile: &UserProfile) -> String {
    let mut lines = vec![format!("- Fitness level: {}", profile.fitness_level)];

    if profile.goals.is_empty() {
        lines.push("- Goals: general fitness".to_string());
    } else {
        lines.push(format!("- Goals: {}", profile.goals.join(", ")));
    }

    if let Some(physical) = &profile.physical {
        if let Some(height) = physical.height_cm {
            lines.push(format!("- Height: {} cm", height));
        }
        if let Some(weight) = physical.weight_kg {
            lines.push(format!("- Weight: {} kg", weight));
        }
        if let Some(goal) = physical.weight_goal_kg {
            lines.push(format!("- Weight goal: {} kg", goal));
        }
        if let Some(gender) = &physical.gender {
            lines.push(format!("- Gender: {}", gender));
        }
    }

    if let Some(preferences) = &profile.preferences {
        if !preferences.equipment_available.is_empty() {
            lines.push(format!("- Equipment: {}", preferences.equipment_available.join(", ")));
        }
        if let Some(sessions) = preferences.sessions_per_week {
            lines.push(format!("- Preferred sessions per week: {}", sessions));
        }
        if let Some(minutes) = preferences.session_length_minutes {
            lines.push(format!("- Preferred session length: {} minutes", minutes));
        }
    }

    lines.join("\n")
}

/// Numbered six-slot template with category hints from the catalog
fn block_structure(catalog: &[ExerciseRef]) -> String {
    let categories = catalog_categories(catalog);
    let mut lines = vec![format!(
        "BLOCK STRUCTURE (exactly {} blocks per workout, in this order):",
        BLOCK_TEMPLATE.len()
    )];
    lines.extend(BLOCK_TEMPLATE.iter().enumerate().map(|(index, slot)| {
        format!(
            "{}. \"{}\" (block_type \"{}\") - categories: {}",
            index + 1,
            slot.name,
            slot.block_type,
            category_hint(slot, &categories)
        )
    }));
    lines.join("\n")
}

fn catalog_categories(catalog: &[ExerciseRef]) -> BTreeSet<&str> {
    catalog
        .iter()
        .filter_map(|e| e.category.as_deref())
        .filter(|c| !c.trim().is_empty())
        .collect()
}

fn category_hint(slot: &BlockSlot, categories: &BTreeSet<&str>) -> String {
    let matching: Vec<&str> = categories
        .iter()
        .copied()
        .filter(|category| {
            let lower = category.to_lowercase();
            slot.category_keywords.iter().any(|keyword| lower.contains(keyword))
        })
        .collect();

    if matching.is_empty() {
        "any".to_string()
    } else {
        matching.join(", ")
    }
}
