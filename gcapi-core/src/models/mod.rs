//! Response and payload records.
//!
//! Every field is optional because the server only returns what the
//! `fields` selector asked for. Payload types skip `None` fields when
//! serialized.

use serde::{Deserialize, Serialize};

use crate::codec::ApiDate;
use crate::query::Coordinates;

mod geocache;
mod list;
mod log;
mod trackable;
mod user;
mod waypoint;

pub use geocache::*;
pub use list::*;
pub use log::*;
pub use trackable::*;
pub use user::*;
pub use waypoint::*;

/// A position as the API encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinatesModel {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for CoordinatesModel {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl From<CoordinatesModel> for Coordinates {
    fn from(c: CoordinatesModel) -> Self {
        Coordinates::new(c.latitude, c.longitude)
    }
}

/// Country and state of a geocache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationModel {
    pub country_id: Option<i64>,
    pub country: Option<String>,
    pub state_id: Option<i64>,
    pub state: Option<String>,
}

/// An image attached to a geocache, log or trackable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageModel {
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub large_url: Option<String>,
    pub reference_code: Option<String>,
    pub created_date: Option<ApiDate>,
    pub captured_date: Option<ApiDate>,
    pub description: Option<String>,
    pub guid: Option<String>,
}

/// Result of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponseModel {
    #[serde(default)]
    pub successes: Vec<String>,
    #[serde(default)]
    pub failures: Vec<BulkFailureModel>,
}

/// One rejected item of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailureModel {
    pub reference_code: Option<String>,
    pub message: Option<String>,
    pub status_code: Option<u16>,
}
