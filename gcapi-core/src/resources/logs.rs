use reqwest::Method;

use super::query;
use crate::query::path_segment;
use crate::error::ApiError;
use crate::fields::{LogDraftField, LogField};
use crate::gateway::HttpGateway;
use crate::models::{GeocacheLogModel, GeocacheLogTypeModel, LogDraftModel};

/// Geocache logs and log drafts.
#[derive(Debug, Clone, Copy)]
pub struct Logs<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Logs<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    /// Publish a log. The server echoes it back with the requested fields.
    pub async fn create_log(
        &self,
        log: &GeocacheLogModel,
        fields: &[LogField],
    ) -> Result<GeocacheLogModel, ApiError> {
        let target = query(self.gateway, "geocachelogs").fields(fields).build();
        self.gateway.send_json(Method::POST, &target, log).await
    }

    /// A page of logs on a geocache, newest first.
    pub async fn geocache_logs(
        &self,
        code: &str,
        fields: &[LogField],
        skip: u32,
        take: u32,
    ) -> Result<Vec<GeocacheLogModel>, ApiError> {
        let path = format!("geocaches/{}/geocachelogs", path_segment(code));
        let target = query(self.gateway, &path)
            .fields(fields)
            .paging(skip, take)
            .build();
        self.gateway.get(&target).await
    }

    pub async fn create_draft(
        &self,
        draft: &LogDraftModel,
        fields: &[LogDraftField],
    ) -> Result<LogDraftModel, ApiError> {
        let target = query(self.gateway, "logdrafts").fields(fields).build();
        self.gateway.send_json(Method::POST, &target, draft).await
    }

    /// The user's unpublished drafts.
    pub async fn drafts(&self, fields: &[LogDraftField]) -> Result<Vec<LogDraftModel>, ApiError> {
        let target = query(self.gateway, "logdrafts").fields(fields).build();
        self.gateway.get(&target).await
    }

    pub async fn log_types(&self) -> Result<Vec<GeocacheLogTypeModel>, ApiError> {
        self.gateway
            .get(&query(self.gateway, "geocachelogtypes").build())
            .await
    }
}
