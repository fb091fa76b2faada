//! Zone lookup configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ZoneConfig {
    /// Live zone service base URL; `None` disables the live source
    pub zone_url: Option<String>,
    pub api_key: Option<String>,
    /// Deadline applied to each source attempt
    pub timeout: Duration,
    /// Radius around the reference point for static filtering
    pub check_radius_m: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_url: None,
            api_key: None,
            timeout: Duration::from_millis(5000),
            check_radius_m: 20_000.0,
        }
    }
}

impl ZoneConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            zone_url: non_empty(env::var("WAYLINE_ZONE_URL").ok()),
            api_key: non_empty(env::var("WAYLINE_ZONE_API_KEY").ok()),
            timeout: env::var("WAYLINE_ZONE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            check_radius_m: env::var("WAYLINE_CHECK_RADIUS_M")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|radius| radius.is_finite() && *radius >= 0.0)
                .unwrap_or(defaults.check_radius_m),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_treated_as_unset() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(
            non_empty(Some(" https://zones.local ".to_string())).as_deref(),
            Some("https://zones.local")
        );
    }

    #[test]
    fn defaults() {
        let config = ZoneConfig::default();
        assert!(config.zone_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.check_radius_m, 20_000.0);
    }
}
