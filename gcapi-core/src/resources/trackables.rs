use reqwest::Method;

use super::query;
use crate::query::path_segment;
use crate::error::ApiError;
use crate::fields::{TrackableField, TrackableLogField};
use crate::gateway::HttpGateway;
use crate::models::{TrackableGetType, TrackableLogModel, TrackableModel};

/// Trackables and their logs.
#[derive(Debug, Clone, Copy)]
pub struct Trackables<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Trackables<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    /// Trackables currently in a geocache.
    pub async fn geocache_trackables(
        &self,
        code: &str,
        fields: &[TrackableField],
        skip: u32,
        take: u32,
    ) -> Result<Vec<TrackableModel>, ApiError> {
        let path = format!("geocaches/{}/trackables", path_segment(code));
        let target = query(self.gateway, &path)
            .fields(fields)
            .paging(skip, take)
            .build();
        self.gateway.get(&target).await
    }

    /// Inventory, collection or owned trackables of `user`, or of the caller
    /// when `user` is `None`.
    pub async fn user_trackables(
        &self,
        user: Option<&str>,
        kind: TrackableGetType,
        fields: &[TrackableField],
        skip: u32,
        take: u32,
    ) -> Result<Vec<TrackableModel>, ApiError> {
        let path = match user {
            Some(user) => format!("trackables/{}", path_segment(user)),
            None => "trackables".to_string(),
        };
        let target = query(self.gateway, &path)
            .types(&[kind])
            .fields(fields)
            .paging(skip, take)
            .build();
        self.gateway.get(&target).await
    }

    pub async fn get_many<T: AsRef<str>>(
        &self,
        codes: &[T],
        fields: &[TrackableField],
    ) -> Result<Vec<TrackableModel>, ApiError> {
        let target = query(self.gateway, "trackables")
            .fields(fields)
            .reference_codes(codes)
            .build();
        self.gateway.get(&target).await
    }

    pub async fn create_log(
        &self,
        log: &TrackableLogModel,
        fields: &[TrackableLogField],
    ) -> Result<TrackableLogModel, ApiError> {
        let target = query(self.gateway, "trackablelogs").fields(fields).build();
        self.gateway.send_json(Method::POST, &target, log).await
    }
}
