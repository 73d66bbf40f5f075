use super::query;
use crate::query::path_segment;
use crate::error::ApiError;
use crate::fields::UserField;
use crate::gateway::HttpGateway;
use crate::models::{MembershipLevelModel, UserModel};

#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    gateway: &'a HttpGateway,
}

impl<'a> Users<'a> {
    pub fn new(gateway: &'a HttpGateway) -> Self {
        Self { gateway }
    }

    /// One user; pass [`CURRENT_USER`](super::CURRENT_USER) for the caller.
    pub async fn get(&self, reference: &str, fields: &[UserField]) -> Result<UserModel, ApiError> {
        let path = format!("users/{}", path_segment(reference));
        let target = query(self.gateway, &path)
            .fields(fields)
            .build();
        self.gateway.get(&target).await
    }

    /// Several users by reference code and/or username. Empty lists are left out.
    pub async fn get_many<R: AsRef<str>, N: AsRef<str>>(
        &self,
        references: &[R],
        usernames: &[N],
        fields: &[UserField],
    ) -> Result<Vec<UserModel>, ApiError> {
        let mut builder = query(self.gateway, "users").fields(fields);
        if !references.is_empty() {
            builder = builder.reference_codes(references);
        }
        if !usernames.is_empty() {
            builder = builder.usernames(usernames);
        }
        self.gateway.get(&builder.build()).await
    }

    pub async fn membership_levels(&self) -> Result<Vec<MembershipLevelModel>, ApiError> {
        self.gateway
            .get(&query(self.gateway, "membershiplevels").build())
            .await
    }
}
