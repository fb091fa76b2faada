//! Wayline CLI support: configuration and plan loading.

pub mod config;
pub mod plan;

pub use config::Config;
pub use plan::{load_plan, LoadedPlan};
