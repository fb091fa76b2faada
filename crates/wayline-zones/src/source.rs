//! Zone source contract.

use futures::future::BoxFuture;
use wayline_core::{FlyZone, GeoPoint};

use crate::error::ZoneLookupError;

/// Area a zone lookup covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneQuery {
    pub reference: GeoPoint,
    pub check_radius_m: f64,
}

impl ZoneQuery {
    pub fn new(reference: GeoPoint, check_radius_m: f64) -> Self {
        Self {
            reference,
            check_radius_m,
        }
    }
}

/// One strategy for finding fly zones around a reference point.
///
/// An empty `Ok` means "nothing known here" and lets the resolver move on.
pub trait ZoneSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch<'a>(&'a self, query: &'a ZoneQuery) -> BoxFuture<'a, Result<Vec<FlyZone>, ZoneLookupError>>;
}
