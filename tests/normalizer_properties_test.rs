use ai_coach_programs::config::GenerationConfig;
use ai_coach_programs::services::ProgramNormalizer;
use proptest::prelude::*;
use serde_json::{json, Value};

fn normalizer(weeks: u32) -> ProgramNormalizer {
    ProgramNormalizer::new(&GenerationConfig {
        duration_weeks: weeks,
        ..Default::default()
    })
}

/// Loosely typed numbers the way a model tends to emit them
fn loose_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-50i64..200).prop_map(|n| json!(n)),
        (-50.0f64..200.0).prop_map(|n| json!(n)),
        (0i64..200).prop_map(|n| json!(n.to_string())),
        Just(json!("several")),
        Just(Value::Null),
    ]
}

fn exercise() -> impl Strategy<Value = Value> {
    prop_oneof![
        (1i64..500).prop_map(|id| json!(id)),
        (1i64..500).prop_map(|id| json!(id.to_string())),
        (1i64..500, loose_number(), loose_number()).prop_map(|(id, reps, order)| {
            json!({"exercise_id": id, "reps": reps, "exercise_order": order})
        }),
    ]
}

fn workout() -> impl Strategy<Value = Value> {
    (
        loose_number(),
        loose_number(),
        loose_number(),
        loose_number(),
        loose_number(),
        prop::collection::vec(exercise(), 1..6),
    )
        .prop_map(|(order, week, day, sets, rest, exercises)| {
            json!({
                "name": "Session",
                "workout_order": order,
                "week_number": week,
                "day_of_week": day,
                "blocks": [{"name": "Main", "sets": sets, "rest_between_exercises": rest, "exercises": exercises}]
            })
        })
}

fn draft() -> impl Strategy<Value = Value> {
    prop::collection::vec(workout(), 0..8).prop_map(|workouts| {
        json!({"program": {"name": "P", "duration_weeks": 99}, "workouts": workouts})
    })
}

proptest! {
    #[test]
    fn normalizing_twice_equals_normalizing_once(mut value in draft(), weeks in 1u32..16) {
        let normalizer = normalizer(weeks);
        normalizer.normalize(&mut value);
        let once = value.clone();
        normalizer.normalize(&mut value);
        prop_assert_eq!(once, value);
    }

    #[test]
    fn exercise_order_follows_position(mut value in draft()) {
        normalizer(4).normalize(&mut value);

        for workout in value["workouts"].as_array().unwrap() {
            let exercises = workout["blocks"][0]["exercises"].as_array().unwrap();
            for (index, exercise) in exercises.iter().enumerate() {
                prop_assert!(exercise.is_object());
                prop_assert_eq!(&exercise["exercise_order"], &json!(index + 1));
                prop_assert!(exercise["reps"].as_i64().unwrap() >= 1);
                prop_assert!(exercise["exercise_id"].is_i64());
            }
        }
    }

    #[test]
    fn numeric_fields_land_in_range(mut value in draft(), weeks in 1u32..16) {
        normalizer(weeks).normalize(&mut value);

        prop_assert_eq!(&value["program"]["duration_weeks"], &json!(weeks));
        for workout in value["workouts"].as_array().unwrap() {
            prop_assert!(workout["workout_order"].as_i64().unwrap() >= 1);
            if let Some(week) = workout["week_number"].as_i64() {
                prop_assert!((1..=i64::from(weeks)).contains(&week));
            }
            if let Some(day) = workout["day_of_week"].as_i64() {
                prop_assert!((1..=7).contains(&day));
            }
            let block = &workout["blocks"][0];
            if let Some(sets) = block["sets"].as_i64() {
                prop_assert!(sets >= 1);
            }
            prop_assert!(!block["rest_between_exercises"].is_null());
        }
    }
}
