use serde::{Deserialize, Serialize};

use super::{CoordinatesModel, UserModel};
use crate::codec::ApiDate;
use crate::fields::code_enum;

code_enum! {
    /// Kind of geocache log.
    GeocacheLogType {
        FoundIt = 2,
        DidntFindIt = 3,
        WriteNote = 4,
        Archive = 5,
        PermanentlyArchived = 6,
        NeedsArchived = 7,
        WillAttend = 9,
        Attended = 10,
        WebcamPhotoTaken = 11,
        Unarchive = 12,
        PostReviewerNoteLegacy = 18,
        TemporarilyDisableListing = 22,
        EnableListing = 23,
        PublishListing = 24,
        RetractListing = 25,
        NeedsMaintenance = 45,
        OwnerMaintenance = 46,
        UpdateCoordinates = 47,
        PostReviewerNote = 68,
        Announcement = 74,
    }
}

/// Log type as embedded in logs. Only `id` is needed when creating one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocacheLogTypeModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GeocacheLogType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<GeocacheLogType> for GeocacheLogTypeModel {
    fn from(id: GeocacheLogType) -> Self {
        Self {
            id: Some(id),
            name: None,
            image_url: None,
        }
    }
}

/// A geocache log, as returned and as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct GeocacheLogModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<i64>,
    /// When the user logged the geocache, in the geocache's timezone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_date: Option<ApiDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_log_type: Option<GeocacheLogTypeModel>,
    /// Only used with [`GeocacheLogType::UpdateCoordinates`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_coordinates: Option<CoordinatesModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iana_timezone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_favorite_point: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_encoded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserModel>,
}

impl GeocacheLogModel {
    /// A new log ready to submit.
    pub fn new(
        geocache_code: impl Into<String>,
        log_type: GeocacheLogType,
        logged_date: ApiDate,
        text: impl Into<String>,
    ) -> Self {
        Self {
            geocache_code: Some(geocache_code.into()),
            geocache_log_type: Some(log_type.into()),
            logged_date: Some(logged_date),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_updated_coordinates(mut self, coordinates: CoordinatesModel) -> Self {
        self.updated_coordinates = Some(coordinates);
        self
    }

    pub fn with_favorite_point(mut self, used: bool) -> Self {
        self.used_favorite_point = Some(used);
        self
    }
}

/// A log the user started but has not published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct LogDraftModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocache_log_type: Option<GeocacheLogTypeModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Defaults to now on the server when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_date: Option<ApiDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_favorite_point: Option<bool>,
}

impl LogDraftModel {
    pub fn new(geocache_code: impl Into<String>, log_type: GeocacheLogType) -> Self {
        Self {
            geocache_code: Some(geocache_code.into()),
            geocache_log_type: Some(log_type.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn test_new_log_payload_omits_unset_fields() {
        let date = ApiDate::parse("2024-05-01T12:00:00").unwrap();
        let log = GeocacheLogModel::new("GC1", GeocacheLogType::FoundIt, date, "TFTC");

        let json: serde_json::Value = serde_json::from_slice(&encode(&log).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "loggedDate": "2024-05-01T12:00:00.000",
                "text": "TFTC",
                "geocacheLogType": {"id": 2},
                "geocacheCode": "GC1"
            })
        );
    }

    #[test]
    fn test_unknown_log_type_decodes() {
        let log: GeocacheLogModel =
            decode(br#"{"geocacheLogType": {"id": 1234, "name": "Future"}}"#).unwrap();
        assert_eq!(
            log.geocache_log_type.unwrap().id,
            Some(GeocacheLogType::Unknown(1234))
        );
    }

    #[test]
    fn test_log_type_without_id_decodes() {
        let types: Vec<GeocacheLogTypeModel> = decode(br#"[{"name": "Found it"}]"#).unwrap();
        assert_eq!(types[0].id, None);
        assert_eq!(types[0].name.as_deref(), Some("Found it"));
    }
}
