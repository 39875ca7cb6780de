//! HTTP client for the payment gateway.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod gateway;

pub use gateway::{GatewayClient, GatewayConfig};

use reqwest::StatusCode;

use crate::limits::LimitError;

/// Errors produced by the gateway HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The client-side request budget for the current window is spent.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Input rejected before any network call.
    #[error("validation error: {0}")]
    Limit(#[from] LimitError),
}
