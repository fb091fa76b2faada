//! Ordered zone-source fallback.

use std::future::Future;
use std::time::Duration;

use wayline_core::geofence::dedup_zones;
use wayline_core::FlyZone;

use crate::config::ZoneConfig;
use crate::error::ZoneLookupError;
use crate::live::LiveZoneSource;
use crate::source::{ZoneQuery, ZoneSource};
use crate::static_zones::StaticZoneSource;

/// Tries each source in turn, one request outstanding at a time.
pub struct ZoneResolver {
    sources: Vec<Box<dyn ZoneSource>>,
    timeout: Duration,
}

impl ZoneResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            timeout,
        }
    }

    /// Live source first when a service URL is configured, then the static dataset.
    pub fn from_config(config: &ZoneConfig) -> Self {
        let mut resolver = Self::new(config.timeout);
        if let Some(url) = &config.zone_url {
            match LiveZoneSource::new(url.clone(), config.api_key.clone(), config.timeout) {
                Ok(live) => resolver = resolver.with_source(live),
                Err(err) => tracing::warn!("Live zone source disabled: {}", err),
            }
        }
        resolver.with_source(StaticZoneSource::new())
    }

    pub fn with_source(mut self, source: impl ZoneSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Zones around `query.reference`, deduplicated by id.
    ///
    /// Never fails: when every source errors or comes back empty the result is empty.
    pub async fn resolve(&self, query: &ZoneQuery) -> Vec<FlyZone> {
        self.resolve_until(query, std::future::pending::<()>()).await
    }

    /// Like [`resolve`](Self::resolve), but `cancel` completing abandons the
    /// in-flight attempt and moves on to the remaining sources without waiting
    /// for it.
    pub async fn resolve_until<C>(&self, query: &ZoneQuery, cancel: C) -> Vec<FlyZone>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let mut cancelled = false;

        for source in &self.sources {
            let attempt = tokio::time::timeout(self.timeout, source.fetch(query));

            let outcome = if cancelled {
                attempt.await.unwrap_or(Err(ZoneLookupError::Timeout(self.timeout)))
            } else {
                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        cancelled = true;
                        Err(ZoneLookupError::Cancelled)
                    }
                    result = attempt => result.unwrap_or(Err(ZoneLookupError::Timeout(self.timeout))),
                }
            };

            match outcome {
                Ok(zones) if !zones.is_empty() => {
                    let zones = dedup_zones(zones);
                    tracing::debug!(source = source.name(), zones = zones.len(), "zones resolved");
                    return zones;
                }
                Ok(_) => {
                    tracing::warn!(source = source.name(), "zone source returned no zones, trying next");
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), "zone lookup failed, trying next: {}", err);
                }
            }
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{BoxFuture, FutureExt};
    use wayline_core::{GeoPoint, ZoneCategory, ZoneGeometry, ZoneSourceKind};

    struct Failing;

    impl ZoneSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch<'a>(&'a self, _query: &'a ZoneQuery) -> BoxFuture<'a, Result<Vec<FlyZone>, ZoneLookupError>> {
            async { Err(ZoneLookupError::Status(503)) }.boxed()
        }
    }

    fn zone(id: &str, category: ZoneCategory) -> FlyZone {
        FlyZone {
            id: id.to_string(),
            name: id.to_string(),
            category,
            geometry: ZoneGeometry::Circle {
                center: GeoPoint::new(33.70, 73.05),
                radius_m: 500.0,
            },
            source: ZoneSourceKind::StaticFallback,
        }
    }

    fn query() -> ZoneQuery {
        ZoneQuery::new(GeoPoint::new(33.70, 73.05), 20_000.0)
    }

    #[tokio::test]
    async fn error_falls_through_to_next_source() {
        let resolver = ZoneResolver::new(Duration::from_secs(1))
            .with_source(Failing)
            .with_source(StaticZoneSource::with_zones(vec![zone("a", ZoneCategory::Warning)]));

        let zones = resolver.resolve(&query()).await;
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "a");
    }

    #[tokio::test]
    async fn duplicate_ids_are_collapsed() {
        let resolver = ZoneResolver::new(Duration::from_secs(1)).with_source(
            StaticZoneSource::with_zones(vec![
                zone("dup", ZoneCategory::Restricted),
                zone("dup", ZoneCategory::Warning),
            ]),
        );

        let zones = resolver.resolve(&query()).await;
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].category, ZoneCategory::Restricted);
    }

    #[tokio::test]
    async fn all_sources_failing_yields_empty() {
        let resolver = ZoneResolver::new(Duration::from_secs(1)).with_source(Failing);
        assert!(resolver.resolve(&query()).await.is_empty());
    }

    #[test]
    fn config_without_url_uses_static_only() {
        let resolver = ZoneResolver::from_config(&ZoneConfig::default());
        assert_eq!(resolver.source_names(), vec!["static"]);
    }

    #[test]
    fn config_with_url_puts_live_first() {
        let config = ZoneConfig {
            zone_url: Some("http://127.0.0.1:9".to_string()),
            ..ZoneConfig::default()
        };
        let resolver = ZoneResolver::from_config(&config);
        assert_eq!(resolver.source_names(), vec!["live", "static"]);
    }
}
