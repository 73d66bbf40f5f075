//! Authorized HTTP calls and response classification.
//!
//! Every API call goes through [`HttpGateway`]:
//!
//! 1. validate the target URL
//! 2. make sure the user is authorized, running the authorization flow once if not
//! 3. obtain a fresh access token
//! 4. send the request with bearer and JSON headers
//! 5. map the status code to a result
//!
//! Nothing is retried. A 401 surfaces as [`ApiError::MissingToken`] so the
//! caller decides whether to authorize again.

use parking_lot::Mutex;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::codec;
use crate::error::{ApiError, NetworkError, UnmappedError};
use crate::oauth::AuthorizationPresenter;
use crate::query::RequestTarget;
use crate::token_store::TokenStore;

/// Fixed request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Header carrying the seconds until the rate limit resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Retry hint used when the rate limit header is missing or malformed.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome of a call that reached the server and got a 2xx.
enum Success {
    NoContent,
    Body(Vec<u8>),
}

/// Removes a call from the in-flight registry when it finishes.
struct InFlightGuard<'a> {
    registry: &'a Mutex<HashMap<Uuid, CancellationToken>>,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

/// Executes API calls for one client.
pub struct HttpGateway {
    tokens: Arc<TokenStore>,
    presenter: Option<Arc<dyn AuthorizationPresenter>>,
    http: reqwest::Client,
    in_flight: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl HttpGateway {
    /// Create a gateway.
    ///
    /// Without a presenter, calls made while unauthorized fail with
    /// [`ApiError::ConfigurationMissing`].
    pub fn new(
        tokens: Arc<TokenStore>,
        presenter: Option<Arc<dyn AuthorizationPresenter>>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(NetworkError::Transport(e)))?;

        Ok(Self {
            tokens,
            presenter,
            http,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// The token store backing this gateway.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// GET a resource and decode it.
    pub async fn get<T: DeserializeOwned>(&self, target: &RequestTarget) -> Result<T, ApiError> {
        self.send(Method::GET, target, None).await
    }

    /// Send a JSON payload and decode the response.
    pub async fn send_json<T, B>(
        &self,
        method: Method,
        target: &RequestTarget,
        payload: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = codec::encode(payload).map_err(ApiError::Encode)?;
        self.send(method, target, Some(body)).await
    }

    /// DELETE a resource.
    pub async fn delete<T: DeserializeOwned>(&self, target: &RequestTarget) -> Result<T, ApiError> {
        self.send(Method::DELETE, target, None).await
    }

    /// GET a resource and return the raw body (zip archives and the like).
    pub async fn fetch_bytes(&self, target: &RequestTarget) -> Result<Vec<u8>, ApiError> {
        match self.execute(Method::GET, target, None).await? {
            Success::NoContent => Ok(Vec::new()),
            Success::Body(bytes) => Ok(bytes),
        }
    }

    /// Cancel every call currently in flight. Returns how many were cancelled.
    ///
    /// Calls started after this returns are not affected.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.in_flight.lock().drain().collect();
        for (_, token) in &drained {
            token.cancel();
        }
        if !drained.is_empty() {
            tracing::info!("Cancelled {} in-flight request(s)", drained.len());
        }
        drained.len()
    }

    /// Number of calls currently registered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        target: &RequestTarget,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        match self.execute(method, target, body).await? {
            Success::NoContent => no_content_value(),
            Success::Body(bytes) => codec::decode(&bytes).map_err(|e| {
                tracing::warn!("Failed to decode response from {}: {}", target.path(), e);
                ApiError::Parsing(e)
            }),
        }
    }

    async fn execute(
        &self,
        method: Method,
        target: &RequestTarget,
        body: Option<Vec<u8>>,
    ) -> Result<Success, ApiError> {
        let url = target.to_url()?;

        self.ensure_authorized().await?;

        let token = self
            .tokens
            .with_fresh_access_token(|result| {
                result.map_err(|e| {
                    tracing::warn!("No fresh access token: {}", e);
                    ApiError::MissingToken
                })
            })
            .await?;

        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("bearer {}", token.expose()))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.in_flight.lock().insert(id, cancel.clone());
        let _guard = InFlightGuard {
            registry: &self.in_flight,
            id,
        };

        let call = async {
            let response = request.send().await.map_err(NetworkError::Transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = match response.bytes().await {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    tracing::warn!("Failed to read response body: {}", e);
                    None
                }
            };
            Ok::<_, ApiError>((status, headers, body))
        };

        let (status, headers, body) = tokio::select! {
            _ = cancel.cancelled() => return Err(NetworkError::Cancelled.into()),
            result = call => result?,
        };

        classify(status, &headers, body)
    }

    async fn ensure_authorized(&self) -> Result<(), ApiError> {
        if self.tokens.is_authorized().await {
            return Ok(());
        }

        let presenter = self.presenter.as_ref().ok_or_else(|| {
            ApiError::ConfigurationMissing("no authorization presenter configured".to_string())
        })?;

        self.tokens
            .authorize(presenter.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!("Authorization before call failed: {}", e);
                ApiError::MissingToken
            })
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("tokens", &self.tokens)
            .field("has_presenter", &self.presenter.is_some())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: Option<Vec<u8>>,
) -> Result<Success, ApiError> {
    match status {
        StatusCode::NO_CONTENT => Ok(Success::NoContent),
        s if s.is_success() => body.map(Success::Body).ok_or(ApiError::NoResponse),
        StatusCode::UNAUTHORIZED => Err(ApiError::MissingToken),
        StatusCode::FORBIDDEN => Err(ApiError::UserOptedOut),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::TooManyRequests {
            retry_after: retry_after(headers),
        }),
        other => {
            let error = body
                .and_then(|b| codec::decode::<UnmappedError>(&b).ok())
                .unwrap_or_else(|| UnmappedError::unknown(other.as_u16()));
            tracing::warn!("Unmapped HTTP error: {}", error);
            Err(ApiError::UnmappedHttp(error))
        }
    }
}

fn retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Value handed back for a 204: `true` for boolean results, `null` otherwise.
fn no_content_value<T: DeserializeOwned>() -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::Bool(true))
        .or_else(|_| serde_json::from_value(serde_json::Value::Null))
        .map_err(ApiError::Parsing)
}
