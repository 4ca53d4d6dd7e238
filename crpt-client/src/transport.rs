use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::ClientError;
use crate::Envelope;

/// Status and body of an HTTP exchange, before success is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// A response the API accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// 200 and 201 are success; anything else is a hard failure.
    pub fn into_result(self) -> Result<Accepted, ClientError> {
        match self.status {
            200 | 201 => Ok(Accepted {
                status: self.status,
                body: self.body,
            }),
            status => {
                tracing::warn!(status, "document rejected");
                Err(ClientError::Http {
                    status,
                    body: self.body,
                })
            }
        }
    }
}

/// Delivers an envelope to the API.
///
/// Called only after the limiter has admitted the call, and never while its
/// lock is held.
pub trait Transport: Send + Sync {
    fn send(&self, envelope: &Envelope) -> Result<RawResponse, ClientError>;
}

/// JSON POST to a fixed endpoint over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(&self, envelope: &Envelope) -> Result<RawResponse, ClientError> {
        let body = serde_json::to_string(envelope)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        tracing::debug!(status, endpoint = %self.endpoint, "document sent");
        Ok(RawResponse { status, body })
    }
}
