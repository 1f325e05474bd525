//! Authenticated poll client.
//!
//! Owns the session token for the scheduler service. The token has no
//! expiry timer; it is cleared reactively, on a rejected request or a
//! transport error, and re-acquired on the next call that needs it.

use thiserror::Error;

use crate::transport::{ApiResponse, Credentials, InstrumentDto, LoginResponse, SchedulerTransport, TransportError};

/// A rejected authenticated request is retried after exactly one
/// re-login; a second consecutive rejection is surfaced.
const MAX_REAUTH_RETRIES: u32 = 1;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed (status {status})")]
    Authentication { status: u16 },
    #[error("authorization expired and re-login did not restore access")]
    AuthorizationExpired,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("scheduler returned status {status}")]
    Api { status: u16 },
    #[error("failed to decode scheduler response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Poll client holding the single mutable session token.
pub struct PollClient<T> {
    transport: T,
    credentials: Credentials,
    token: Option<String>,
}

impl<T: SchedulerTransport> PollClient<T> {
    pub fn new(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            token: None,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Drop the held token; the next request will re-authenticate.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Authenticate if no token is held. Idempotent: holding a token
    /// means success without a round trip.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        if self.token.is_some() {
            return Ok(());
        }
        let response = self.authenticate().await?;
        self.store_token(&response)
    }

    /// Fetch the current instrument list, authenticating transparently.
    pub async fn fetch_instruments(&mut self) -> Result<Vec<InstrumentDto>, ClientError> {
        self.login().await?;

        let mut retries = 0;
        loop {
            let token = match self.token.as_deref() {
                Some(token) => token.to_string(),
                None => {
                    self.login().await?;
                    continue;
                }
            };

            let response = match self.transport.instruments(&token).await {
                Ok(response) => response,
                Err(err) => {
                    self.token = None;
                    return Err(err.into());
                }
            };

            if response.is_rejected() {
                self.token = None;
                if retries >= MAX_REAUTH_RETRIES {
                    return Err(ClientError::AuthorizationExpired);
                }
                retries += 1;
                tracing::debug!("token rejected, re-authenticating");
                self.login().await?;
                continue;
            }

            if !response.is_success() {
                return Err(ClientError::Api {
                    status: response.status,
                });
            }

            let instruments: Vec<InstrumentDto> = serde_json::from_str(&response.body)?;
            return Ok(instruments);
        }
    }

    async fn authenticate(&mut self) -> Result<ApiResponse, ClientError> {
        match self.transport.login(&self.credentials).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.token = None;
                Err(err.into())
            }
        }
    }

    fn store_token(&mut self, response: &ApiResponse) -> Result<(), ClientError> {
        if !response.is_success() {
            self.token = None;
            return Err(ClientError::Authentication {
                status: response.status,
            });
        }
        let parsed: LoginResponse = serde_json::from_str(&response.body)?;
        match parsed.token {
            Some(token) => {
                self.token = Some(token);
                Ok(())
            }
            None => {
                self.token = None;
                Err(ClientError::Authentication {
                    status: response.status,
                })
            }
        }
    }
}
