use serde::{Deserialize, Serialize};

use super::{CoordinatesModel, ImageModel, UserModel};
use crate::codec::ApiDate;
use crate::fields::code_enum;

code_enum! {
    /// Which of the user's trackables to list.
    TrackableGetType {
        UsersInventory = 1,
        UsersCollection = 2,
        UsersOwned = 3,
    }
}

code_enum! {
    /// Kind of trackable log.
    TrackableLogType {
        WriteNote = 4,
        RetrieveItFromACache = 13,
        DroppedOff = 14,
        Transfer = 15,
        MarkMissing = 16,
        GrabIt = 19,
        DiscoveredIt = 48,
        MoveToCollection = 69,
        MoveToInventory = 70,
        Visited = 75,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackableTypeModel {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// A travel bug, geocoin or other trackable item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackableModel {
    pub reference_code: Option<String>,
    pub icon_url: Option<String>,
    pub name: Option<String>,
    pub goal: Option<String>,
    pub description: Option<String>,
    pub released_date: Option<ApiDate>,
    pub origin_country: Option<String>,
    pub allowed_to_be_collected: Option<bool>,
    pub owner_code: Option<String>,
    pub holder_code: Option<String>,
    pub in_holder_collection: Option<bool>,
    /// Geocache the trackable currently sits in, if any.
    pub current_geocache_code: Option<String>,
    pub current_geocache_name: Option<String>,
    pub is_missing: Option<bool>,
    pub type_name: Option<String>,
    pub tracking_number: Option<String>,
    pub kilometers_traveled: Option<f64>,
    pub miles_traveled: Option<f64>,
    pub trackable_type: Option<TrackableTypeModel>,
    pub owner: Option<UserModel>,
    pub holder: Option<UserModel>,
    pub images: Option<Vec<ImageModel>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackableLogTypeModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TrackableLogType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<TrackableLogType> for TrackableLogTypeModel {
    fn from(id: TrackableLogType) -> Self {
        Self {
            id: Some(id),
            name: None,
            image_url: None,
        }
    }
}

/// A trackable log, as returned and as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TrackableLogModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackable_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackable_name: Option<String>,
    /// Geocache involved in drop-off, retrieve or visit logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_date: Option<ApiDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rot13_encoded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackable_log_type: Option<TrackableLogTypeModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinatesModel>,
    /// Required when logging a trackable the user does not hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserModel>,
}

impl TrackableLogModel {
    pub fn new(
        trackable_code: impl Into<String>,
        log_type: TrackableLogType,
        logged_date: ApiDate,
        text: impl Into<String>,
    ) -> Self {
        Self {
            trackable_code: Some(trackable_code.into()),
            trackable_log_type: Some(log_type.into()),
            logged_date: Some(logged_date),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn in_geocache(mut self, geocache_code: impl Into<String>) -> Self {
        self.geocache_code = Some(geocache_code.into());
        self
    }

    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }
}
