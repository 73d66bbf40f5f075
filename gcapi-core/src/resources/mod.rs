//! Resource clients.
//!
//! One family per API resource. Each method assembles a [`QueryBuilder`] and
//! hands the target to the [`HttpGateway`]; none of them keep state.

use crate::fields::{LogField, TrackableField};
use crate::gateway::HttpGateway;
use crate::query::QueryBuilder;

mod geocaches;
mod lists;
mod logs;
mod trackables;
mod users;
mod waypoints;

pub use geocaches::{Geocaches, SearchFilter};
pub use lists::Lists;
pub use logs::Logs;
pub use trackables::Trackables;
pub use users::Users;
pub use waypoints::Waypoints;

/// Reference code the server resolves to the calling user.
pub const CURRENT_USER: &str = "me";

/// Logs and trackables to inline in geocache responses.
///
/// The default inlines nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub logs: u32,
    pub log_fields: Vec<LogField>,
    pub trackables: u32,
    pub trackable_fields: Vec<TrackableField>,
}

impl Expansion {
    /// Inline the newest `count` logs with the given fields.
    pub fn logs(mut self, count: u32, fields: &[LogField]) -> Self {
        self.logs = count;
        self.log_fields = fields.to_vec();
        self
    }

    /// Inline up to `count` trackables with the given fields.
    pub fn trackables(mut self, count: u32, fields: &[TrackableField]) -> Self {
        self.trackables = count;
        self.trackable_fields = fields.to_vec();
        self
    }
}

fn query(gateway: &HttpGateway, path: &str) -> QueryBuilder {
    QueryBuilder::create(gateway.tokens().config(), path)
}
