//! Vendor zone records to [`FlyZone`].
//!
//! Schema version 1 fields, all required unless noted:
//!
//! | field       | meaning                                              |
//! |-------------|------------------------------------------------------|
//! | `id`        | vendor zone id                                       |
//! | `name`      | display name                                         |
//! | `category`  | 0 warning, 1 authorization, 2 restricted, 3 enhanced warning, other unknown |
//! | `shape`     | 0 circle, 1 polygon                                  |
//! | `lat`/`lon` | zone center                                          |
//! | `radius_m`  | circle radius (optional, default 0)                  |
//! | `sub_areas` | optional list of `{ id, shape, lat, lon, radius_m, points }`, `points` as `[lat, lon]` pairs |
//!
//! A zone with sub-areas is represented only by its sub-areas, each becoming
//! one zone with id `"{zone}-{sub}"`.

use serde::Deserialize;
use wayline_core::{FlyZone, GeoPoint, ZoneCategory, ZoneGeometry, ZoneSourceKind};

use crate::error::ZoneLookupError;

pub const ADAPTER_SCHEMA_VERSION: u32 = 1;

const SHAPE_CIRCLE: i32 = 0;
const SHAPE_POLYGON: i32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct VendorZoneResponse {
    pub version: u32,
    #[serde(default)]
    pub zones: Vec<VendorZoneV1>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorZoneV1 {
    pub id: String,
    pub name: String,
    pub category: i32,
    pub shape: i32,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub radius_m: f64,
    #[serde(default)]
    pub sub_areas: Vec<VendorSubArea>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorSubArea {
    pub id: String,
    pub shape: i32,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub radius_m: f64,
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
}

pub fn category_from_code(code: i32) -> ZoneCategory {
    match code {
        0 => ZoneCategory::Warning,
        1 => ZoneCategory::Authorization,
        2 => ZoneCategory::Restricted,
        3 => ZoneCategory::EnhancedWarning,
        _ => ZoneCategory::Unknown,
    }
}

/// Translate a whole response, rejecting schema versions this adapter does not know.
pub fn translate(response: VendorZoneResponse) -> Result<Vec<FlyZone>, ZoneLookupError> {
    if response.version != ADAPTER_SCHEMA_VERSION {
        return Err(ZoneLookupError::UnsupportedSchema(response.version));
    }
    Ok(response.zones.iter().flat_map(translate_zone).collect())
}

/// One vendor zone may expand into several zones, or none if its shape is unusable.
pub fn translate_zone(zone: &VendorZoneV1) -> Vec<FlyZone> {
    let category = category_from_code(zone.category);

    if !zone.sub_areas.is_empty() {
        return zone
            .sub_areas
            .iter()
            .filter_map(|sub| {
                let geometry = geometry_for(sub.shape, sub.lat, sub.lon, sub.radius_m, &sub.points)?;
                Some(FlyZone {
                    id: format!("{}-{}", zone.id, sub.id),
                    name: zone.name.clone(),
                    category,
                    geometry,
                    source: ZoneSourceKind::Live,
                })
            })
            .collect();
    }

    match geometry_for(zone.shape, zone.lat, zone.lon, zone.radius_m, &[]) {
        Some(geometry) => vec![FlyZone {
            id: zone.id.clone(),
            name: zone.name.clone(),
            category,
            geometry,
            source: ZoneSourceKind::Live,
        }],
        None => {
            tracing::debug!(zone = %zone.id, shape = zone.shape, "skipping zone without usable geometry");
            Vec::new()
        }
    }
}

fn geometry_for(shape: i32, lat: f64, lon: f64, radius_m: f64, points: &[[f64; 2]]) -> Option<ZoneGeometry> {
    match shape {
        SHAPE_CIRCLE if radius_m > 0.0 => Some(ZoneGeometry::Circle {
            center: GeoPoint::new(lat, lon),
            radius_m,
        }),
        SHAPE_POLYGON if !points.is_empty() => Some(ZoneGeometry::Polygon {
            vertices: points
                .iter()
                .map(|[lat, lon]| GeoPoint::new(*lat, *lon))
                .collect(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> VendorZoneResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn circle_zone_maps_directly() {
        let zones = translate(response(serde_json::json!({
            "version": 1,
            "zones": [{
                "id": "isb", "name": "Islamabad Intl", "category": 2, "shape": 0,
                "lat": 33.549, "lon": 72.825, "radius_m": 8000.0
            }]
        })))
        .unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "isb");
        assert_eq!(zones[0].category, ZoneCategory::Restricted);
        assert_eq!(zones[0].source, ZoneSourceKind::Live);
        assert!(zones[0].contains(GeoPoint::new(33.549, 72.825)));
    }

    #[test]
    fn sub_areas_become_separate_zones() {
        let zones = translate(response(serde_json::json!({
            "version": 1,
            "zones": [{
                "id": "z7", "name": "Stadium", "category": 9, "shape": 1,
                "lat": 33.70, "lon": 73.05,
                "sub_areas": [
                    { "id": "a", "shape": 1, "points": [[33.70, 73.05], [33.70, 73.06], [33.71, 73.06], [33.71, 73.05]] },
                    { "id": "b", "shape": 0, "lat": 33.72, "lon": 73.05, "radius_m": 300.0 },
                    { "id": "c", "shape": 1, "points": [] }
                ]
            }]
        })))
        .unwrap();

        let ids: Vec<&str> = zones.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["z7-a", "z7-b"]);
        assert!(zones.iter().all(|z| z.category == ZoneCategory::Unknown));
        assert!(zones[0].contains(GeoPoint::new(33.705, 73.055)));
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let err = translate(response(serde_json::json!({ "version": 2, "zones": [] }))).unwrap_err();
        assert!(matches!(err, ZoneLookupError::UnsupportedSchema(2)));
    }

    #[test]
    fn category_codes() {
        assert_eq!(category_from_code(0), ZoneCategory::Warning);
        assert_eq!(category_from_code(1), ZoneCategory::Authorization);
        assert_eq!(category_from_code(3), ZoneCategory::EnhancedWarning);
        assert_eq!(category_from_code(-1), ZoneCategory::Unknown);
    }
}
