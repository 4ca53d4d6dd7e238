use std::time::Duration;

use gate_limit::CancelToken;
use gate_limit::SlidingWindowLimiter;

use crate::Accepted;
use crate::ClientConfig;
use crate::ClientError;
use crate::Document;
use crate::Envelope;
use crate::HttpTransport;
use crate::Transport;

/// Creates documents through the API, never more than the limiter allows.
///
/// The client is `Sync`; share one instance (or clones of its limiter)
/// between threads so they all count against the same window.
#[derive(Debug)]
pub struct DocumentClient<T = HttpTransport> {
    limiter: SlidingWindowLimiter,
    transport: T,
}

impl DocumentClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let limiter = SlidingWindowLimiter::from_config(&config.gate)?;
        let transport = HttpTransport::new(config.endpoint.clone(), config.request_timeout)?;
        Ok(Self::new(limiter, transport))
    }
}

impl<T: Transport> DocumentClient<T> {
    pub fn new(limiter: SlidingWindowLimiter, transport: T) -> Self {
        Self { limiter, transport }
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Waits for a slot, then submits `document`.
    pub fn create_document(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<Accepted, ClientError> {
        self.limiter.acquire();
        self.submit(document, signature)
    }

    /// As [`create_document`](Self::create_document), giving up if `token`
    /// fires before a slot opens.
    pub fn create_document_cancellable(
        &self,
        document: &Document,
        signature: &str,
        token: &CancelToken,
    ) -> Result<Accepted, ClientError> {
        self.limiter.acquire_cancellable(token)?;
        self.submit(document, signature)
    }

    /// As [`create_document`](Self::create_document), waiting at most
    /// `max_wait` for a slot. The request itself is bounded by the transport.
    pub fn create_document_timeout(
        &self,
        document: &Document,
        signature: &str,
        max_wait: Duration,
    ) -> Result<Accepted, ClientError> {
        self.limiter.acquire_timeout(max_wait)?;
        self.submit(document, signature)
    }

    fn submit(&self, document: &Document, signature: &str) -> Result<Accepted, ClientError> {
        let envelope = Envelope::wrap(document, signature)?;
        tracing::debug!(doc_id = ?document.doc_id, "submitting document");
        self.transport.send(&envelope)?.into_result()
    }
}
