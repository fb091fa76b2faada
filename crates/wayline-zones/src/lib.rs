//! Wayline zones - fly-zone resolution
//!
//! Zone sources are tried in order; the first non-empty answer wins and every
//! failure falls through to the next source.

pub mod adapter;
pub mod config;
pub mod error;
pub mod live;
pub mod resolver;
pub mod source;
pub mod static_zones;

pub use adapter::{VendorZoneResponse, VendorZoneV1, ADAPTER_SCHEMA_VERSION};
pub use config::ZoneConfig;
pub use error::ZoneLookupError;
pub use live::LiveZoneSource;
pub use resolver::ZoneResolver;
pub use source::{ZoneQuery, ZoneSource};
pub use static_zones::StaticZoneSource;
