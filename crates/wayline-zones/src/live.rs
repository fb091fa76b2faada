//! Live zone lookup against the vendor fly-zone service.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use wayline_core::FlyZone;

use crate::adapter::{self, VendorZoneResponse};
use crate::error::ZoneLookupError;
use crate::source::{ZoneQuery, ZoneSource};

/// HTTP client for the fly-zone service.
pub struct LiveZoneSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LiveZoneSource {
    /// `timeout` bounds each HTTP request on its own; the resolver applies its
    /// own deadline on top.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ZoneLookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    async fn fetch_zones(&self, query: &ZoneQuery) -> Result<Vec<FlyZone>, ZoneLookupError> {
        let url = format!("{}/v1/fly-zones", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("lat", query.reference.lat.to_string()),
            ("lon", query.reference.lon.to_string()),
            ("radius", query.check_radius_m.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ZoneLookupError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        let payload: VendorZoneResponse = serde_json::from_slice(&body)?;
        let zones = adapter::translate(payload)?;

        tracing::debug!(url = %url, zones = zones.len(), "live zone lookup complete");
        Ok(zones)
    }
}

impl ZoneSource for LiveZoneSource {
    fn name(&self) -> &str {
        "live"
    }

    fn fetch<'a>(&'a self, query: &'a ZoneQuery) -> BoxFuture<'a, Result<Vec<FlyZone>, ZoneLookupError>> {
        self.fetch_zones(query).boxed()
    }
}
