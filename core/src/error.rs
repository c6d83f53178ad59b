//! Error types for the matzip client.
//!
//! # Design
//! The facade only ever fails with `Transport`: a response with a non-success
//! status is still a response. Status interpretation happens in the opt-in
//! `parse_*` helpers, which is where `NotFound`, `Http` and `Decode` come from.

/// Errors returned by `MatzipClient` and `MatzipApi`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// A JSON payload could not be hydrated into a DTO.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode {entity}: {source}")]
pub struct DecodeError {
    pub entity: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn new(entity: &'static str, source: serde_json::Error) -> Self {
        Self { entity, source }
    }
}

/// Errors raised by the route parameter loaders.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("missing route parameter `{0}`")]
    MissingParam(&'static str),

    #[error("route parameter `{name}` has invalid value {value:?}")]
    InvalidParam { name: &'static str, value: String },
}
