//! CLI configuration from environment.

use std::env;
use std::path::PathBuf;

use wayline_zones::ZoneConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub author: String,
    pub zones: ZoneConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            output_dir: env::var("WAYLINE_OUTPUT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            author: env::var("WAYLINE_AUTHOR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "wayline".to_string()),
            zones: ZoneConfig::from_env(),
        }
    }
}
