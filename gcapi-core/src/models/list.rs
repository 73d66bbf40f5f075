use serde::{Deserialize, Serialize};

use crate::codec::ApiDate;
use crate::fields::code_enum;

code_enum! {
    /// Kind of user list.
    ListType {
        PocketQuery = 1,
        Bookmark = 2,
        Ignore = 3,
        Watch = 4,
        Favorites = 5,
    }
}

/// A pocket query, bookmark list, or other user list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModel {
    pub reference_code: Option<String>,
    pub last_updated_date_utc: Option<ApiDate>,
    pub created_date_utc: Option<ApiDate>,
    pub count: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub type_id: Option<ListType>,
    pub is_public: Option<bool>,
    pub is_shared: Option<bool>,
    pub url: Option<String>,
}
