//! # gcapi core
//!
//! Client library for the Geocaching REST API.
//!
//! This crate provides:
//! - [`QueryBuilder`] to assemble request targets with field selectors,
//!   expansions, paging and the structured `q` filter
//! - [`TokenStore`] to own the OAuth2 session: authorize, refresh, persist
//! - [`HttpGateway`] to run authorized calls and map status codes to [`ApiError`]
//! - Typed response records in [`models`] and one client family per resource
//!   in [`resources`]
//! - In-memory, file and (optionally) keyring-based session storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gcapi_core::{GeocachingClient, fields::UserField, resources::CURRENT_USER};
//!
//! async fn whoami(client: &GeocachingClient) -> Result<(), gcapi_core::ApiError> {
//!     let me = client.users().get(CURRENT_USER, UserField::ALL).await?;
//!     println!("{:?} has {:?} finds", me.username, me.find_count);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod models;
pub mod oauth;
pub mod query;
pub mod resources;
pub mod session;
pub mod store;
pub mod token_store;

// Re-export commonly used types at crate root
pub use client::GeocachingClient;

pub use codec::ApiDate;

pub use config::{
    ApiEndpointConfig,
    ApiEnvironment,
    ConfigError,
    OAuthCredentials,
};

pub use error::{
    ApiError,
    NetworkError,
    UnmappedError,
};

pub use gateway::HttpGateway;

pub use query::{
    Coordinates,
    QueryBuilder,
    QueryError,
    RequestTarget,
};

pub use session::{
    AuthSession,
    TokenError,
    TokenState,
};

pub use store::{
    FileStore,
    MemoryStore,
    Secret,
    SecretStore,
    StoreBackend,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use token_store::TokenStore;
