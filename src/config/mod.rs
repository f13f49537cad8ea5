// Configuration loaded from the environment

pub mod database;
pub mod generation;
pub mod llm;

pub use database::{run_migrations, DatabaseConfig};
pub use generation::GenerationConfig;
pub use llm::LlmConfig;

use anyhow::Result;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Reads `key` when set, failing on values that do not parse
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}
