//! API environment and OAuth endpoint configuration.
//!
//! This module provides:
//! - [`ApiEnvironment`] - Staging or production
//! - [`OAuthCredentials`] - Client identifiers supplied by the embedding application
//! - [`ApiEndpointConfig`] - The resolved, immutable endpoint set for one environment
//!
//! Credentials come from a TOML key file or from `GCAPI_*` environment
//! variables. Missing credentials are reported as
//! [`ConfigError::Missing`] so the caller decides how loudly to fail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::store::Secret;

/// Name of the key file looked up in the platform config directory.
pub const KEY_FILE_NAME: &str = "GcApiKeys.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value was not provided.
    #[error("missing configuration value: {field}")]
    Missing { field: &'static str },

    /// A configured URL could not be parsed.
    #[error("invalid {field} URL {value:?}: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The key file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file is not valid TOML.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No key file, no environment variables, and no config directory.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// Which deployment of the API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiEnvironment {
    Staging,
    Production,
}

impl ApiEnvironment {
    /// Host serving the REST API.
    pub fn api_host(&self) -> &'static str {
        match self {
            Self::Staging => "staging.api.groundspeak.com",
            Self::Production => "api.groundspeak.com",
        }
    }

    /// OAuth authorization endpoint.
    pub fn authorize_url(&self) -> &'static str {
        match self {
            Self::Staging => "https://staging.geocaching.com/oauth/authorize.aspx",
            Self::Production => "https://www.geocaching.com/oauth/authorize.aspx",
        }
    }

    /// OAuth token endpoint.
    pub fn token_url(&self) -> &'static str {
        match self {
            Self::Staging => "https://oauth-staging.geocaching.com/token",
            Self::Production => "https://oauth.geocaching.com/token",
        }
    }
}

impl fmt::Display for ApiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// OAuth client identifiers for both environments plus the shared redirect URL.
///
/// Key file layout:
///
/// ```toml
/// client_id = "..."
/// client_secret = "..."
/// client_id_staging = "..."
/// client_secret_staging = "..."
/// redirect_uri = "http://localhost:8765/callback"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCredentials {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<Secret>,
    #[serde(default)]
    pub client_id_staging: Option<String>,
    #[serde(default)]
    pub client_secret_staging: Option<Secret>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

impl OAuthCredentials {
    /// Platform-specific default location of the key file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = directories::ProjectDirs::from("com", "mustcode", "gcapi")
            .ok_or(ConfigError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join(KEY_FILE_NAME))
    }

    /// Read credentials from a TOML key file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read credentials from `GCAPI_*` environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            client_id: var("GCAPI_CLIENT_ID"),
            client_secret: var("GCAPI_CLIENT_SECRET").map(Secret::new),
            client_id_staging: var("GCAPI_CLIENT_ID_STAGING"),
            client_secret_staging: var("GCAPI_CLIENT_SECRET_STAGING").map(Secret::new),
            redirect_uri: var("GCAPI_REDIRECT_URI"),
        }
    }

    /// Load credentials: an explicit key file wins, then the default key file
    /// if it exists, and environment variables fill any remaining gaps.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_file = match explicit {
            Some(path) => Some(Self::from_file(path)?),
            None => match Self::default_path() {
                Ok(path) if path.exists() => {
                    tracing::debug!("Loading API keys from {:?}", path);
                    Some(Self::from_file(&path)?)
                }
                _ => None,
            },
        };

        let env = Self::from_env();
        Ok(match from_file {
            Some(file) => file.or(env),
            None => env,
        })
    }

    /// Fill unset fields from `other`.
    fn or(self, other: Self) -> Self {
        Self {
            client_id: self.client_id.or(other.client_id),
            client_secret: self.client_secret.or(other.client_secret),
            client_id_staging: self.client_id_staging.or(other.client_id_staging),
            client_secret_staging: self.client_secret_staging.or(other.client_secret_staging),
            redirect_uri: self.redirect_uri.or(other.redirect_uri),
        }
    }
}

/// Resolved endpoints and client identity for one environment.
///
/// Built once at startup via [`for_environment`](Self::for_environment) and
/// never changed afterwards.
#[derive(Debug, Clone)]
pub struct ApiEndpointConfig {
    /// The environment this configuration was built for.
    pub environment: ApiEnvironment,

    /// URL scheme of the REST API (always `https` outside tests).
    pub api_scheme: String,

    /// Host (and optional port) of the REST API.
    pub api_host: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: Secret,

    /// Redirect URL registered with the provider.
    pub redirect_url: Url,

    /// OAuth authorization endpoint.
    pub authorize_url: Url,

    /// OAuth token endpoint.
    pub token_url: Url,
}

impl ApiEndpointConfig {
    /// Build the configuration for `environment` from the supplied credentials.
    pub fn for_environment(
        environment: ApiEnvironment,
        credentials: &OAuthCredentials,
    ) -> Result<Self, ConfigError> {
        let (client_id, client_secret) = match environment {
            ApiEnvironment::Production => (
                credentials
                    .client_id
                    .clone()
                    .ok_or(ConfigError::Missing { field: "client_id" })?,
                credentials
                    .client_secret
                    .clone()
                    .ok_or(ConfigError::Missing { field: "client_secret" })?,
            ),
            ApiEnvironment::Staging => (
                credentials
                    .client_id_staging
                    .clone()
                    .ok_or(ConfigError::Missing { field: "client_id_staging" })?,
                credentials
                    .client_secret_staging
                    .clone()
                    .ok_or(ConfigError::Missing { field: "client_secret_staging" })?,
            ),
        };

        let redirect = credentials
            .redirect_uri
            .as_deref()
            .ok_or(ConfigError::Missing { field: "redirect_uri" })?;

        Ok(Self {
            environment,
            api_scheme: "https".to_string(),
            api_host: environment.api_host().to_string(),
            client_id,
            client_secret,
            redirect_url: parse_url("redirect", redirect)?,
            authorize_url: parse_url("authorize", environment.authorize_url())?,
            token_url: parse_url("token", environment.token_url())?,
        })
    }

    /// Point the REST calls at a different origin (local mock servers).
    pub fn with_api_origin(mut self, scheme: impl Into<String>, host: impl Into<String>) -> Self {
        self.api_scheme = scheme.into();
        self.api_host = host.into();
        self
    }

    /// Point the OAuth flow at different endpoints (local mock servers).
    pub fn with_oauth_endpoints(
        mut self,
        authorize_url: &str,
        token_url: &str,
    ) -> Result<Self, ConfigError> {
        self.authorize_url = parse_url("authorize", authorize_url)?;
        self.token_url = parse_url("token", token_url)?;
        Ok(self)
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}
