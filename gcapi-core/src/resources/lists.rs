use reqwest::Method;

use super::query;
use crate::query::path_segment;
use crate::error::ApiError;
use crate::fields::{GeocacheField, ListField, ListTypeName};
use crate::gateway::HttpGateway;
use crate::models::{BulkResponseModel, GeocacheModel, ListModel};

/// Pocket queries, bookmark lists and the like.
#[derive(Debug, Clone, Copy)]
pub struct Lists<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Lists<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    pub async fn get(&self, reference: &str, fields: &[ListField]) -> Result<ListModel, ApiError> {
        let path = format!("lists/{}", path_segment(reference));
        let target = query(self.gateway, &path)
            .fields(fields)
            .build();
        self.gateway.get(&target).await
    }

    /// Lists owned by a user, filtered by kind.
    pub async fn user_lists(
        &self,
        user: &str,
        types: &[ListTypeName],
        fields: &[ListField],
        skip: u32,
        take: u32,
    ) -> Result<Vec<ListModel>, ApiError> {
        let path = format!("users/{}/lists", path_segment(user));
        let target = query(self.gateway, &path)
            .list_types(types)
            .fields(fields)
            .paging(skip, take)
            .build();
        self.gateway.get(&target).await
    }

    /// Geocaches in a pocket query or bookmark list.
    pub async fn pocket_query(
        &self,
        reference: &str,
        fields: &[GeocacheField],
        skip: u32,
        take: u32,
    ) -> Result<Vec<GeocacheModel>, ApiError> {
        let path = format!("lists/{}/geocaches", path_segment(reference));
        let target = query(self.gateway, &path)
            .fields(fields)
            .paging(skip, take)
            .build();
        self.gateway.get(&target).await
    }

    /// The generated GPX archive of a pocket query, as raw zip bytes.
    pub async fn pocket_query_zipped(&self, reference: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("lists/{}/geocaches/zipped", path_segment(reference));
        let target = query(self.gateway, &path).build();
        self.gateway.fetch_bytes(&target).await
    }

    /// Add geocaches to a list. Per-item failures are reported in the response.
    pub async fn add_geocaches<T: AsRef<str>>(
        &self,
        reference: &str,
        codes: &[T],
    ) -> Result<BulkResponseModel, ApiError> {
        let path = format!("lists/{}/bulkgeocaches", path_segment(reference));
        let target = query(self.gateway, &path).build();
        let codes: Vec<&str> = codes.iter().map(AsRef::as_ref).collect();
        self.gateway.send_json(Method::POST, &target, &codes).await
    }
}
