use serde::{Deserialize, Serialize};

use super::CoordinatesModel;
use crate::fields::code_enum;

code_enum! {
    /// Membership tier of an account.
    MembershipLevel {
        Unspecified = 0,
        Basic = 1,
        Charter = 2,
        Premium = 3,
    }
}

/// Remaining call quota of the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocacheLimitsModel {
    pub lite_calls_remaining: Option<i64>,
    pub lite_calls_seconds_to_live: Option<i64>,
    pub full_calls_remaining: Option<i64>,
    pub full_calls_seconds_to_live: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    pub reference_code: Option<String>,
    pub find_count: Option<i64>,
    pub hide_count: Option<i64>,
    pub favorite_points: Option<i64>,
    pub username: Option<String>,
    pub membership_level_id: Option<MembershipLevel>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub url: Option<String>,
    pub profile_text: Option<String>,
    /// Only returned for the current user.
    pub home_coordinates: Option<CoordinatesModel>,
    pub geocache_limits: Option<GeocacheLimitsModel>,
}

impl UserModel {
    pub fn is_premium(&self) -> bool {
        matches!(
            self.membership_level_id,
            Some(MembershipLevel::Premium | MembershipLevel::Charter)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipLevelModel {
    pub id: Option<MembershipLevel>,
    pub name: Option<String>,
}
