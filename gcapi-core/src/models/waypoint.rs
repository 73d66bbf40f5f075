use serde::{Deserialize, Serialize};

use super::CoordinatesModel;

/// A waypoint the user attached to a geocache.
///
/// Also the payload of the corrected coordinates endpoint, which stores the
/// user's solved position as a waypoint flagged `is_corrected_coordinates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct UserWaypointModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_corrected_coordinates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinatesModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_code: Option<String>,
}

impl UserWaypointModel {
    pub fn new(geocache_code: impl Into<String>, coordinates: CoordinatesModel) -> Self {
        Self {
            geocache_code: Some(geocache_code.into()),
            coordinates: Some(coordinates),
            ..Default::default()
        }
    }

    /// Waypoint recording solved coordinates.
    pub fn corrected(geocache_code: impl Into<String>, coordinates: CoordinatesModel) -> Self {
        Self {
            is_corrected_coordinates: Some(true),
            ..Self::new(geocache_code, coordinates)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
