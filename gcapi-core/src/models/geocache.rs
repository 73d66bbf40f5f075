use serde::{Deserialize, Serialize};

use super::{CoordinatesModel, GeocacheLogModel, ImageModel, LocationModel, TrackableModel};
use super::{UserModel, UserWaypointModel};
use crate::codec::ApiDate;
use crate::fields::code_enum;

code_enum! {
    /// Kind of geocache.
    GeocacheType {
        Traditional = 2,
        Multicache = 3,
        Virtual = 4,
        LetterboxHybrid = 5,
        Event = 6,
        Mystery = 8,
        ProjectApe = 9,
        Webcam = 11,
        Locationless = 12,
        CacheInTrashOutEvent = 13,
        Earthcache = 137,
        MegaEvent = 453,
        GpsAdventuresExhibit = 1304,
        Wherigo = 1858,
        CommunityCelebrationEvent = 3653,
        GeocachingHq = 3773,
        GeocachingHqCelebration = 3774,
        GeocachingHqBlockParty = 4738,
        GigaEvent = 7005,
    }
}

code_enum! {
    /// Container size.
    CacheSize {
        NotChosen = 1,
        Micro = 2,
        Small = 8,
        Regular = 3,
        Large = 4,
        Virtual = 5,
        Other = 6,
    }
}

code_enum! {
    /// Kind of additional waypoint.
    WaypointType {
        ParkingArea = 217,
        VirtualStage = 218,
        PhysicalStage = 219,
        FinalLocation = 220,
        Trailhead = 221,
        ReferencePoint = 452,
    }
}

/// Publication status of a geocache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeocacheStatus {
    Unpublished,
    Active,
    Disabled,
    Locked,
    Archived,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocacheTypeModel {
    pub id: Option<GeocacheType>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocacheSizeModel {
    pub id: Option<CacheSize>,
    pub name: Option<String>,
}

/// The calling user's relation to a geocache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataModel {
    /// Personal note only visible to the user.
    pub note: Option<String>,
    pub is_favorited: Option<bool>,
    /// In the geocache's timezone; absent if not found.
    pub found_date: Option<ApiDate>,
    pub dnf_date: Option<ApiDate>,
    /// The user's solved coordinates.
    pub corrected_coordinates: Option<CoordinatesModel>,
}

/// An attribute set on a geocache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeModel {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Positive or negative form (e.g. "available 24/7" vs "not available 24/7").
    pub is_on: Option<bool>,
    pub image_url: Option<String>,
}

/// An attribute the server knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeTypeModel {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub has_yes_option: Option<bool>,
    pub has_no_option: Option<bool>,
    pub yes_icon_url: Option<String>,
    pub no_icon_url: Option<String>,
    pub not_chosen_icon_url: Option<String>,
}

/// A waypoint published by the geocache owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalWaypointModel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub type_id: Option<WaypointType>,
    pub type_name: Option<String>,
    pub prefix: Option<String>,
    pub url: Option<String>,
    pub coordinates: Option<CoordinatesModel>,
}

/// Body of the personal note endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocacheNoteModel {
    pub note: Option<String>,
}

impl GeocacheNoteModel {
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocacheModel {
    pub reference_code: Option<String>,
    pub name: Option<String>,
    pub difficulty: Option<f64>,
    pub terrain: Option<f64>,
    pub favorite_points: Option<i64>,
    pub trackable_count: Option<i64>,
    pub placed_date: Option<ApiDate>,
    pub published_date: Option<ApiDate>,
    pub geocache_type: Option<GeocacheTypeModel>,
    pub geocache_size: Option<GeocacheSizeModel>,
    pub user_data: Option<UserDataModel>,
    pub status: Option<GeocacheStatus>,
    pub location: Option<LocationModel>,
    pub posted_coordinates: Option<CoordinatesModel>,
    pub last_visited_date: Option<ApiDate>,
    pub owner_code: Option<String>,
    pub owner_alias: Option<String>,
    pub is_premium_only: Option<bool>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub hints: Option<String>,
    pub attributes: Option<Vec<AttributeModel>>,
    pub iana_timezone_id: Option<String>,
    pub related_web_page: Option<String>,
    pub url: Option<String>,
    pub contains_html: Option<bool>,
    pub owner: Option<UserModel>,
    pub additional_waypoints: Option<Vec<AdditionalWaypointModel>>,
    pub user_waypoints: Option<Vec<UserWaypointModel>>,
    pub trackables: Option<Vec<TrackableModel>>,
    pub geocache_logs: Option<Vec<GeocacheLogModel>>,
    pub images: Option<Vec<ImageModel>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;

    #[test]
    fn test_decode_partial_geocache() {
        let body = br#"{
            "referenceCode": "GC12345",
            "name": "Under the bridge",
            "difficulty": 1.5,
            "placedDate": "2000-06-17T00:00:00",
            "geocacheType": {"id": 424242, "name": "Something new"},
            "geocacheSize": {"id": 2, "name": "Micro"},
            "status": "Active",
            "postedCoordinates": {"latitude": 65.02, "longitude": 25.48},
            "attributes": [{"id": 1, "isOn": true}]
        }"#;

        let cache: GeocacheModel = decode(body).unwrap();

        assert_eq!(cache.reference_code.as_deref(), Some("GC12345"));
        assert_eq!(cache.placed_date, ApiDate::from_ymd(2000, 6, 17));
        assert_eq!(
            cache.geocache_type.unwrap().id,
            Some(GeocacheType::Unknown(424242))
        );
        assert_eq!(cache.geocache_size.unwrap().id, Some(CacheSize::Micro));
        assert_eq!(cache.status, Some(GeocacheStatus::Active));
        assert!(cache.owner.is_none());
        assert_eq!(cache.attributes.unwrap()[0].is_on, Some(true));
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let cache: GeocacheModel = decode(br#"{"status": "Hibernating"}"#).unwrap();
        assert_eq!(cache.status, Some(GeocacheStatus::Unknown));
    }
}
