use gate_limit::GateError;

/// Errors produced by the document client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The rate limiter refused or abandoned the call before it was sent.
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode document payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The request never produced an HTTP response.
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with anything other than 200 or 201.
    #[error("API request failed: {status}, body: {body}")]
    Http { status: u16, body: String },
}
