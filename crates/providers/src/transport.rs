//! HTTP transport seam.
//!
//! Everything that talks to a provider or a downstream gateway goes through
//! [`CatalogueTransport`], so tests can swap in an in-process mock.

use std::time::Duration;

use crate::util::from_reqwest;

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

/// A minimal GET client.
#[async_trait::async_trait]
pub trait CatalogueTransport: Send + Sync {
    /// Issue `GET url`, sending `Authorization: Bearer {credential}` when a
    /// credential is given. The whole exchange must finish within `timeout`.
    async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// reqwest implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("uniload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl CatalogueTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut req = self.client.get(url).timeout(timeout);
        if let Some(key) = credential {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(from_reqwest)?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
