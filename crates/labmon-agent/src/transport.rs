//! HTTP transport to the scheduler service.
//!
//! The trait seam exists so the poll client and collector can be
//! exercised against fake schedulers in tests; [`HttpTransport`] is the
//! production implementation backed by reqwest.

use labmon_core::types::InstrumentState;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Login credentials for the scheduler service.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub domain: String,
}

/// A raw HTTP exchange result: status plus the response body.
///
/// The transport deliberately does not interpret the body; the poll
/// client decides what a given status means for its token.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the scheduler rejected our credentials or token.
    pub fn is_rejected(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to scheduler failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Body of a successful login response.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

/// One instrument as reported by the scheduler.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDto {
    pub name: String,
    pub state: StateDto,
    pub current_run: Option<CurrentRunDto>,
    pub workload: Option<WorkloadDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateDto {
    pub state: InstrumentState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRunDto {
    pub sample_name: Option<String>,
    pub full_user_name: Option<String>,
    pub acquisition_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDto {
    pub total_queued_analyses: Option<u32>,
}

/// Wire operations the poll client needs from the scheduler.
#[allow(async_fn_in_trait)]
pub trait SchedulerTransport {
    /// `POST /login` with the given credentials.
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, TransportError>;

    /// `GET /instruments` authenticated with `token`.
    async fn instruments(&self, token: &str) -> Result<ApiResponse, TransportError>;
}

/// Production transport over HTTP(S).
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `base_url` (no trailing slash).
    ///
    /// `accept_invalid_certs` disables TLS certificate verification for
    /// schedulers running with self-signed certificates on a lab
    /// network. It must never be enabled for endpoints reachable from
    /// outside that network.
    pub fn new(base_url: &str, accept_invalid_certs: bool) -> Result<Self, TransportError> {
        if accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled");
        }
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_response(response: reqwest::Response) -> Result<ApiResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

impl SchedulerTransport for HttpTransport {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, TransportError> {
        let url = format!("{}/login", self.base_url);
        let response = self.client.post(&url).json(credentials).send().await?;
        Self::read_response(response).await
    }

    async fn instruments(&self, token: &str) -> Result<ApiResponse, TransportError> {
        let url = format!("{}/instruments", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        Self::read_response(response).await
    }
}
