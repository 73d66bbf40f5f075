use reqwest::Method;

use super::query;
use crate::query::path_segment;
use crate::error::ApiError;
use crate::fields::UserWaypointField;
use crate::gateway::HttpGateway;
use crate::models::UserWaypointModel;

/// User waypoints attached to geocaches.
#[derive(Debug, Clone, Copy)]
pub struct Waypoints<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Waypoints<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    /// Create a waypoint. The response carries every waypoint field.
    pub async fn create(
        &self,
        waypoint: &UserWaypointModel,
    ) -> Result<UserWaypointModel, ApiError> {
        let target = query(self.gateway, "userwaypoints")
            .fields(UserWaypointField::ALL)
            .build();
        self.gateway.send_json(Method::POST, &target, waypoint).await
    }

    pub async fn update(
        &self,
        reference: &str,
        waypoint: &UserWaypointModel,
    ) -> Result<UserWaypointModel, ApiError> {
        let path = format!("userwaypoints/{}", path_segment(reference));
        let target = query(self.gateway, &path)
            .fields(UserWaypointField::ALL)
            .build();
        self.gateway.send_json(Method::PUT, &target, waypoint).await
    }

    /// Delete a waypoint. The server answers 204, reported as `true`.
    pub async fn delete(&self, reference: &str) -> Result<bool, ApiError> {
        let path = format!("userwaypoints/{}", path_segment(reference));
        let target = query(self.gateway, &path).build();
        self.gateway.delete(&target).await
    }
}
