use reqwest::Method;

use super::{Expansion, query};
use crate::error::ApiError;
use crate::fields::{GeocacheField, UserWaypointField};
use crate::gateway::HttpGateway;
use crate::models::{
    AttributeTypeModel, CacheSize, CoordinatesModel, GeocacheModel, GeocacheNoteModel,
    GeocacheType, GeocacheTypeModel, UserWaypointModel,
};
use crate::query::{Coordinates, QueryBuilder, path_segment};

/// Optional restrictions for geocache searches.
///
/// `None` leaves the corresponding filter out. A `take` of zero lets the
/// server pick the page size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub types: Option<Vec<GeocacheType>>,
    pub sizes: Option<Vec<CacheSize>>,
    pub terrain: Option<(u8, u8)>,
    pub difficulty: Option<(u8, u8)>,
    pub min_favorite_points: Option<u32>,
    pub exclude_found_by: Option<String>,
    pub skip: u32,
    pub take: u32,
    pub lite: bool,
}

impl SearchFilter {
    fn apply(&self, mut builder: QueryBuilder) -> QueryBuilder {
        builder = builder.lite(self.lite);
        if let Some(types) = &self.types {
            builder = builder.types(types.as_slice());
        }
        if let Some(username) = &self.exclude_found_by {
            builder = builder.exclude_found_by(username);
        }
        if let Some((from, to)) = self.terrain {
            builder = builder.terrain(from, to);
        }
        if let Some((from, to)) = self.difficulty {
            builder = builder.difficulty(from, to);
        }
        if let Some(sizes) = &self.sizes {
            builder = builder.sizes(sizes.as_slice());
        }
        if let Some(points) = self.min_favorite_points.filter(|p| *p > 0) {
            builder = builder.min_favorite_points(points);
        }
        builder.paging(self.skip, self.take)
    }
}

/// Geocache lookups, searches and per-user geocache data.
#[derive(Debug, Clone, Copy)]
pub struct Geocaches<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Geocaches<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    /// Fetch one geocache with full details.
    pub async fn get(
        &self,
        code: &str,
        fields: &[GeocacheField],
        expansion: &Expansion,
    ) -> Result<GeocacheModel, ApiError> {
        let target = expand(
            query(self.gateway, &format!("geocaches/{}", path_segment(code)))
                .lite(false)
                .fields(fields),
            expansion,
        )?
        .build();
        self.gateway.get(&target).await
    }

    /// Fetch several geocaches by reference code.
    pub async fn get_many<T: AsRef<str>>(
        &self,
        codes: &[T],
        fields: &[GeocacheField],
        expansion: &Expansion,
        lite: bool,
    ) -> Result<Vec<GeocacheModel>, ApiError> {
        let target = expand(
            query(self.gateway, "geocaches")
                .reference_codes(codes)
                .lite(lite)
                .fields(fields),
            expansion,
        )?
        .build();
        self.gateway.get(&target).await
    }

    /// Geocaches within `miles` of `center`.
    pub async fn search_radius(
        &self,
        center: Coordinates,
        miles: u32,
        fields: &[GeocacheField],
        filter: &SearchFilter,
        expansion: &Expansion,
    ) -> Result<Vec<GeocacheModel>, ApiError> {
        let builder = query(self.gateway, "geocaches/search").radius(center, miles);
        let target = expand(filter.apply(builder).fields(fields), expansion)?.build();
        self.gateway.get(&target).await
    }

    /// Geocaches inside the box spanned by `upper_left` and `lower_right`.
    pub async fn search_box(
        &self,
        upper_left: Coordinates,
        lower_right: Coordinates,
        fields: &[GeocacheField],
        filter: &SearchFilter,
        expansion: &Expansion,
    ) -> Result<Vec<GeocacheModel>, ApiError> {
        let builder =
            query(self.gateway, "geocaches/search").bounding_box(upper_left, lower_right);
        let target = expand(filter.apply(builder).fields(fields), expansion)?.build();
        self.gateway.get(&target).await
    }

    /// Check a solution against the final coordinates of a mystery cache.
    pub async fn verify_final_coordinates(
        &self,
        code: &str,
        coordinates: CoordinatesModel,
    ) -> Result<bool, ApiError> {
        let path = format!("geocaches/{}/finalcoordinates", path_segment(code));
        let target = query(self.gateway, &path).build();
        self.gateway
            .send_json(Method::POST, &target, &coordinates)
            .await
    }

    /// Store the user's solved coordinates for a geocache.
    pub async fn update_corrected_coordinates(
        &self,
        code: &str,
        coordinates: CoordinatesModel,
        fields: &[UserWaypointField],
    ) -> Result<UserWaypointModel, ApiError> {
        let path = format!("geocaches/{}/correctedcoordinates", path_segment(code));
        let target = query(self.gateway, &path)
            .fields(fields)
            .build();
        self.gateway
            .send_json(Method::PUT, &target, &coordinates)
            .await
    }

    /// The user's own waypoints on a geocache.
    pub async fn user_waypoints(&self, code: &str) -> Result<Vec<UserWaypointModel>, ApiError> {
        let path = format!("geocaches/{}/userwaypoints", path_segment(code));
        let target = query(self.gateway, &path)
            .fields(UserWaypointField::ALL)
            .build();
        self.gateway.get(&target).await
    }

    /// Replace the user's personal note on a geocache.
    pub async fn put_note(&self, code: &str, note: &str) -> Result<GeocacheNoteModel, ApiError> {
        let path = format!("geocaches/{}/notes", path_segment(code));
        let target = query(self.gateway, &path).build();
        self.gateway
            .send_json(Method::PUT, &target, &GeocacheNoteModel::new(note))
            .await
    }

    pub async fn geocache_types(&self) -> Result<Vec<GeocacheTypeModel>, ApiError> {
        self.gateway
            .get(&query(self.gateway, "geocachetypes").build())
            .await
    }

    pub async fn attribute_types(&self) -> Result<Vec<AttributeTypeModel>, ApiError> {
        self.gateway
            .get(&query(self.gateway, "attributes").build())
            .await
    }
}

fn expand(builder: QueryBuilder, expansion: &Expansion) -> Result<QueryBuilder, ApiError> {
    Ok(builder.expansion(
        expansion.logs,
        &expansion.log_fields,
        expansion.trackables,
        &expansion.trackable_fields,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_only_adds_what_is_set() {
        let target = SearchFilter::default()
            .apply(QueryBuilder::new("https", "api.example", "geocaches/search"))
            .build();

        assert_eq!(target.param("lite"), Some("false"));
        assert_eq!(target.param("q"), None);
        assert_eq!(target.param("skip"), None);
        assert_eq!(target.param("take"), None);
    }

    #[test]
    fn test_filter_clauses() {
        let filter = SearchFilter {
            types: Some(vec![GeocacheType::Traditional, GeocacheType::Mystery]),
            sizes: Some(vec![CacheSize::Micro]),
            terrain: Some((1, 3)),
            difficulty: Some((2, 5)),
            min_favorite_points: Some(0),
            exclude_found_by: Some("cacher".to_string()),
            skip: 0,
            take: 50,
            lite: true,
        };

        let target = filter
            .apply(QueryBuilder::new("https", "api.example", "geocaches/search"))
            .build();

        assert_eq!(target.param("type"), Some("2,8"));
        assert_eq!(
            target.param("q"),
            Some("+fby:not(cacher)+terr:1-3+diff:2-5+size:2")
        );
        assert_eq!(target.param("take"), Some("50"));
        assert_eq!(target.param("lite"), Some("true"));
    }
}
