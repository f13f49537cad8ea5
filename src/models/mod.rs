// Program generation data models

pub mod exercise;
pub mod program;
pub mod user_profile;
pub mod validation;

pub use exercise::*;
pub use program::*;
pub use user_profile::*;
