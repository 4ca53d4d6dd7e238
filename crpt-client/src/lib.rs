//! # crpt-client
//!
//! A thread-safe client for the CRPT "introduce goods" document API, gated by a
//! [`gate_limit::SlidingWindowLimiter`].
//!
//! Each call waits for admission, then serializes the document, base64-wraps it
//! into an [`Envelope`] and POSTs it. The limiter counts admissions, not
//! responses: no more than `limit` requests are *started* in any trailing
//! `window`, and network latency never holds the limiter's lock.
//!
//! ```no_run
//! use crpt_client::ClientConfig;
//! use crpt_client::DocumentClient;
//! use gate_limit::GateConfig;
//!
//! # fn run(document: crpt_client::Document) -> Result<(), crpt_client::ClientError> {
//! let client = DocumentClient::from_config(&ClientConfig::new(GateConfig::per_second(5)))?;
//! let accepted = client.create_document(&document, "signature")?;
//! println!("{}", accepted.body);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod envelope;
mod error;
mod model;
mod transport;

pub use client::DocumentClient;
pub use config::ClientConfig;
pub use config::DEFAULT_ENDPOINT;
pub use envelope::DOCUMENT_FORMAT;
pub use envelope::DOCUMENT_TYPE;
pub use envelope::Envelope;
pub use error::ClientError;
pub use model::Description;
pub use model::Document;
pub use model::Product;
pub use transport::Accepted;
pub use transport::HttpTransport;
pub use transport::RawResponse;
pub use transport::Transport;
