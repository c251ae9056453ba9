//! Backend API client using reqwest.
//!
//! This adapter implements the `BackendApi` port. Every request it sends
//! first goes through the `RequestAuthInterceptor`, so the stored credential
//! is attached (or stripped) at dispatch time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use beetime_application::auth::RequestAuthInterceptor;
use beetime_application::ports::{BackendApi, BackendError};
use beetime_domain::request::CONTENT_TYPE;
use beetime_domain::{
    ApiEnvelope, AuthProviderCapabilities, AuthRequest, AuthResponse, Header, Headers,
    MicrosoftAuthSettings, SessionProfile,
};

/// Path prefix of every backend endpoint.
pub const API_PREFIX: &str = "/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend client implementation using reqwest.
///
/// Replies are expected in the `{Status, Timestamp, Message, Error, Data}`
/// envelope; `Data` is returned on success.
pub struct ReqwestBackendClient {
    client: Client,
    api_root: String,
    interceptor: RequestAuthInterceptor,
    default_headers: Headers,
}

impl ReqwestBackendClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - User-Agent: "BeeTime/0.1.0"
    /// - `Content-Type: application/json` on every request
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, interceptor: RequestAuthInterceptor) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent("BeeTime/0.1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::InvalidConfiguration(e.to_string()))?;

        Self::with_client(client, base_url, interceptor)
    }

    /// Creates a client around an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn with_client(
        client: Client,
        base_url: &str,
        interceptor: RequestAuthInterceptor,
    ) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| {
                BackendError::InvalidConfiguration(format!("invalid base URL {base_url}: {e}"))
            })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BackendError::InvalidConfiguration(format!(
                "unsupported scheme in base URL {base_url}"
            )));
        }

        let mut default_headers = Headers::new();
        default_headers.add(Header::new(CONTENT_TYPE, "application/json"));

        Ok(Self {
            client,
            api_root: format!("{}{API_PREFIX}", base.as_str().trim_end_matches('/')),
            interceptor,
            default_headers,
        })
    }

    /// Full URL of an endpoint path such as `/user/me`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL does not parse.
    pub fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let url = format!("{}/{}", self.api_root, path.trim_start_matches('/'));
        Url::parse(&url).map_err(|e| BackendError::InvalidConfiguration(format!("{e}: {url}")))
    }

    /// Headers for the next request: defaults plus whatever the
    /// interceptor attaches right now.
    #[must_use]
    pub fn request_headers(&self) -> Headers {
        let mut headers = self.default_headers.clone();
        self.interceptor.apply(&mut headers);
        headers
    }

    /// `GET` any envelope endpoint and returns its `Data`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status or an
    /// undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        self.get(path, None::<&()>).await
    }

    async fn get<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut url = self.endpoint(path)?;
        if let Some(query) = query {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| BackendError::InvalidResponse(format!("query encoding: {e}")))?;
            url.set_query(Some(&encoded));
        }

        debug!(path, "GET");

        let mut builder = self.client.get(url);
        for header in self.request_headers().enabled() {
            builder = builder.header(&header.name, &header.value);
        }

        let response = builder.send().await.map_err(Self::map_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(Self::map_error)?;

        Self::decode(path, status, &body)
    }

    fn decode<T: DeserializeOwned>(
        path: &str,
        status: StatusCode,
        body: &[u8],
    ) -> Result<T, BackendError> {
        if !status.is_success() {
            let message = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(body)
                .ok()
                .and_then(|envelope| envelope.error_message())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            warn!(path, status = status.as_u16(), %message, "backend request failed");

            return Err(if status == StatusCode::UNAUTHORIZED {
                BackendError::Unauthorized { message }
            } else {
                BackendError::Status {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_slice(body)
            .map_err(|e| BackendError::InvalidResponse(format!("{path}: {e}")))?;

        if !envelope.is_success() {
            let message = envelope
                .error_message()
                .unwrap_or_else(|| format!("status {}", envelope.status));
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        envelope
            .data
            .ok_or_else(|| BackendError::InvalidResponse(format!("{path}: missing Data")))
    }

    /// Maps reqwest errors to `BackendError`.
    fn map_error(error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            return BackendError::Transport(format!("timed out: {error}"));
        }
        if error.is_decode() {
            return BackendError::InvalidResponse(error.to_string());
        }
        BackendError::Transport(error.to_string())
    }
}

impl std::fmt::Debug for ReqwestBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestBackendClient")
            .field("api_root", &self.api_root)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BackendApi for ReqwestBackendClient {
    async fn auth_providers(&self) -> Result<AuthProviderCapabilities, BackendError> {
        self.get_json("/auth/providers").await
    }

    async fn microsoft_settings(&self) -> Result<MicrosoftAuthSettings, BackendError> {
        self.get_json("/auth/microsoft").await
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, BackendError> {
        self.get("/auth", Some(request)).await
    }

    async fn current_user(&self) -> Result<SessionProfile, BackendError> {
        self.get_json("/user/me").await
    }
}
