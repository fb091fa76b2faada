//! Built-in static zone dataset, used when no live answer is available.

use futures::future::{self, BoxFuture, FutureExt};
use wayline_core::geofence::within_check_radius;
use wayline_core::{FlyZone, GeoPoint, ZoneCategory, ZoneGeometry, ZoneSourceKind};

use crate::error::ZoneLookupError;
use crate::source::{ZoneQuery, ZoneSource};

fn circle(id: &str, name: &str, lat: f64, lon: f64, radius_m: f64, category: ZoneCategory) -> FlyZone {
    FlyZone {
        id: id.to_string(),
        name: name.to_string(),
        category,
        geometry: ZoneGeometry::Circle {
            center: GeoPoint::new(lat, lon),
            radius_m,
        },
        source: ZoneSourceKind::StaticFallback,
    }
}

/// Known sensitive sites around the Islamabad / Rawalpindi operating area.
pub fn default_zones() -> Vec<FlyZone> {
    vec![
        circle(
            "static-isb-airport",
            "Islamabad International Airport",
            33.549,
            72.825,
            8000.0,
            ZoneCategory::Restricted,
        ),
        circle(
            "static-pm-house",
            "PM House",
            33.7296,
            73.0990,
            2000.0,
            ZoneCategory::Restricted,
        ),
        circle(
            "static-nur-khan",
            "PAF Base Nur Khan",
            33.6166,
            73.0993,
            5000.0,
            ZoneCategory::Restricted,
        ),
        circle(
            "static-ghq",
            "GHQ Rawalpindi",
            33.5972,
            73.0479,
            3000.0,
            ZoneCategory::Authorization,
        ),
        circle(
            "static-faisal-mosque",
            "Faisal Mosque",
            33.7295,
            73.0372,
            1000.0,
            ZoneCategory::Warning,
        ),
        circle(
            "static-diplomatic-enclave",
            "Diplomatic Enclave",
            33.7215,
            73.1067,
            1500.0,
            ZoneCategory::EnhancedWarning,
        ),
    ]
}

/// Zones from a fixed table, filtered to the query's check radius.
pub struct StaticZoneSource {
    zones: Vec<FlyZone>,
}

impl StaticZoneSource {
    pub fn new() -> Self {
        Self::with_zones(default_zones())
    }

    pub fn with_zones(zones: Vec<FlyZone>) -> Self {
        Self { zones }
    }

    pub fn nearby(&self, query: &ZoneQuery) -> Vec<FlyZone> {
        self.zones
            .iter()
            .filter(|zone| within_check_radius(zone, query.reference, query.check_radius_m))
            .cloned()
            .collect()
    }
}

impl Default for StaticZoneSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneSource for StaticZoneSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch<'a>(&'a self, query: &'a ZoneQuery) -> BoxFuture<'a, Result<Vec<FlyZone>, ZoneLookupError>> {
        future::ready(Ok(self.nearby(query))).boxed()
    }
}
