//! Field selectors and integer-coded enumerations.
//!
//! The API lets callers pick the response fields through the `fields` query
//! parameter. Every selector type implements [`QueryToken`], which is the only
//! thing [`QueryBuilder`](crate::query::QueryBuilder) needs to serialize it.

/// A value that can appear in a comma-separated query parameter.
pub trait QueryToken {
    /// Stable token sent to the server.
    fn query_token(&self) -> String;
}

impl QueryToken for &str {
    fn query_token(&self) -> String {
        (*self).to_string()
    }
}

impl QueryToken for String {
    fn query_token(&self) -> String {
        self.clone()
    }
}

/// Join tokens with commas.
pub fn join_tokens<T: QueryToken>(values: &[T]) -> String {
    values
        .iter()
        .map(QueryToken::query_token)
        .collect::<Vec<_>>()
        .join(",")
}

/// Declares a field selector enum whose tokens are fixed strings.
macro_rules! field_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every selector, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl $crate::fields::QueryToken for $name {
            fn query_token(&self) -> String {
                self.as_str().to_string()
            }
        }
    };
}

/// Declares an integer-coded enum.
///
/// Codes the client does not know decode to `Unknown(code)` instead of
/// failing, so new server-side values do not break older clients.
macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown(i64),
        }

        impl $name {
            /// Every known value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(&self) -> i64 {
                match self {
                    $($name::$variant => $code,)+
                    $name::Unknown(code) => *code,
                }
            }

            pub fn from_code(code: i64) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(self.code())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = <i64 as serde::Deserialize>::deserialize(deserializer)?;
                Ok($name::from_code(code))
            }
        }

        impl $crate::fields::QueryToken for $name {
            fn query_token(&self) -> String {
                self.code().to_string()
            }
        }
    };
}

pub(crate) use code_enum;

field_enum! {
    /// Selectable fields of a geocache.
    GeocacheField {
        ReferenceCode => "referenceCode",
        Name => "name",
        Difficulty => "difficulty",
        Terrain => "terrain",
        FavoritePoints => "favoritePoints",
        TrackableCount => "trackableCount",
        PlacedDate => "placedDate",
        PublishedDate => "publishedDate",
        GeocacheType => "geocacheType",
        GeocacheSize => "geocacheSize",
        UserData => "userData",
        Status => "status",
        Location => "location",
        PostedCoordinates => "postedCoordinates",
        LastVisitedDate => "lastVisitedDate",
        OwnerCode => "ownerCode",
        OwnerAlias => "ownerAlias",
        IsPremiumOnly => "isPremiumOnly",
        ShortDescription => "shortDescription",
        LongDescription => "longDescription",
        Hints => "hints",
        Attributes => "attributes",
        IanaTimezoneId => "ianaTimezoneId",
        RelatedWebPage => "relatedWebPage",
        Url => "url",
        ContainsHtml => "containsHtml",
        Owner => "owner",
        AdditionalWaypoints => "additionalWaypoints",
        UserWaypoints => "userWaypoints",
    }
}

field_enum! {
    /// Selectable fields of a geocache log.
    LogField {
        ReferenceCode => "referenceCode",
        OwnerCode => "ownerCode",
        ImageCount => "imageCount",
        LoggedDate => "loggedDate",
        Text => "text",
        GeocacheLogType => "geocacheLogType",
        UpdatedCoordinates => "updatedCoordinates",
        GeocacheCode => "geocacheCode",
        GeocacheName => "geocacheName",
        IanaTimezoneId => "ianaTimezoneId",
        UsedFavoritePoint => "usedFavoritePoint",
        IsEncoded => "isEncoded",
        IsArchived => "isArchived",
        Url => "url",
        Owner => "owner",
    }
}

field_enum! {
    /// Selectable fields of a log draft.
    LogDraftField {
        ReferenceCode => "referenceCode",
        GeocacheCode => "geocacheCode",
        GeocacheLogType => "geocacheLogType",
        Note => "note",
        LoggedDateUtc => "loggedDateUtc",
        ImageCount => "imageCount",
        UseFavoritePoint => "useFavoritePoint",
    }
}

field_enum! {
    /// Selectable fields of a trackable.
    TrackableField {
        ReferenceCode => "referenceCode",
        IconUrl => "iconUrl",
        Name => "name",
        ImageCount => "imageCount",
        Goal => "goal",
        Description => "description",
        ReleasedDate => "releasedDate",
        OriginCountry => "originCountry",
        OwnerCode => "ownerCode",
        HolderCode => "holderCode",
        InHolderCollection => "inHolderCollection",
        CurrentGeocacheCode => "currentGeocacheCode",
        CurrentGeocacheName => "currentGeocacheName",
        IsMissing => "isMissing",
        TrackingNumber => "trackingNumber",
        KilometersTraveled => "kilometersTraveled",
        MilesTraveled => "milesTraveled",
        TrackableType => "trackableType",
        Url => "url",
        Owner => "owner",
        Holder => "holder",
    }
}

field_enum! {
    /// Selectable fields of a trackable log. The tracking number cannot be requested.
    TrackableLogField {
        ReferenceCode => "referenceCode",
        OwnerCode => "ownerCode",
        TrackableCode => "trackableCode",
        GeocacheCode => "geocacheCode",
        GeocacheName => "geocacheName",
        LoggedDate => "loggedDate",
        Text => "text",
        ImageCount => "imageCount",
        IsRot13Encoded => "isRot13Encoded",
        TrackableLogType => "trackableLogType",
        Coordinates => "coordinates",
        Url => "url",
        Owner => "owner",
    }
}

field_enum! {
    /// Selectable fields of a list.
    ListField {
        ReferenceCode => "referenceCode",
        LastUpdatedDateUtc => "lastUpdatedDateUtc",
        CreatedDateUtc => "createdDateUtc",
        Name => "name",
        Count => "count",
        FindCount => "findCount",
        OwnerCode => "ownerCode",
        Description => "description",
        TypeId => "typeId",
        IsShared => "isShared",
        IsPublic => "isPublic",
        Url => "url",
    }
}

field_enum! {
    /// List kinds accepted by the `types` filter of a user's lists.
    ListTypeName {
        PocketQuery => "pq",
        Bookmark => "bm",
        Ignore => "il",
        Watch => "wl",
        Favorites => "fl",
    }
}

field_enum! {
    /// Selectable fields of a user.
    UserField {
        ReferenceCode => "referenceCode",
        FindCount => "findCount",
        HideCount => "hideCount",
        FavoritePoints => "favoritePoints",
        Username => "username",
        MembershipLevelId => "membershipLevelId",
        AvatarUrl => "avatarUrl",
        BannerUrl => "bannerUrl",
        Url => "url",
        ProfileText => "profileText",
        HomeCoordinates => "homeCoordinates",
        GeocacheLimits => "geocacheLimits",
    }
}

field_enum! {
    /// Selectable fields of a user waypoint.
    UserWaypointField {
        ReferenceCode => "referenceCode",
        Description => "description",
        IsCorrectedCoordinates => "isCorrectedCoordinates",
        Coordinates => "coordinates",
        GeocacheCode => "geocacheCode",
    }
}

field_enum! {
    /// Sub-fields of `additionalWaypoints`.
    AdditionalWaypointField {
        Name => "name",
        Description => "description",
        TypeId => "typeId",
        TypeName => "typeName",
        Prefix => "prefix",
        Coordinates => "coordinates",
    }
}

field_enum! {
    /// Sub-fields of `attributes`.
    AttributeField {
        Id => "id",
        Name => "name",
        IsOn => "isOn",
        ImageUrl => "imageUrl",
    }
}

field_enum! {
    /// Sub-fields of `images`.
    ImageField {
        Url => "url",
        ThumbnailUrl => "thumbnailUrl",
        LargeUrl => "largeUrl",
        ReferenceCode => "referenceCode",
        CreatedDate => "createdDate",
        CapturedDate => "capturedDate",
        Description => "description",
        Guid => "guid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    code_enum! {
        Sample { One = 1, Two = 2 }
    }

    #[test]
    fn test_join_tokens() {
        assert_eq!(
            join_tokens(&[GeocacheField::ReferenceCode, GeocacheField::Name]),
            "referenceCode,name"
        );
        assert_eq!(join_tokens(&[Sample::Two, Sample::One]), "2,1");
        assert_eq!(join_tokens::<&str>(&[]), "");
    }

    #[test]
    fn test_code_enum_unknown_fallback() {
        let decoded: Sample = serde_json::from_str("424242").unwrap();
        assert_eq!(decoded, Sample::Unknown(424242));
        assert_eq!(serde_json::to_string(&decoded).unwrap(), "424242");

        let known: Sample = serde_json::from_str("2").unwrap();
        assert_eq!(known, Sample::Two);
    }

    #[test]
    fn test_all_lists_known_values_only() {
        assert_eq!(Sample::ALL, &[Sample::One, Sample::Two]);
        assert_eq!(GeocacheField::ALL.len(), 29);
        assert_eq!(ListTypeName::PocketQuery.as_str(), "pq");
    }
}
